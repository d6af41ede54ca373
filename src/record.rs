use crate::{
    directory::TgEntry,
    groups::{Groups, MatchMode},
};
use std::{fmt, ops::RangeInclusive};

/// Id of the synthesized multimode record.
pub const MULTIMODE_ID: i64 = 2140;
pub const MULTIMODE_NAME: &str = "MULTIMODE SPAIN";

/// Ids at or below this never get a group count.
const LOCAL_ID_LIMIT: i64 = 90;
const REFLECTOR_IDS: RangeInclusive<i64> = 4000..=5000;
const PARROT_ID: i64 = 9990;

/// Accented characters replaced in names: the JSON escape as it appears in the raw download,
/// the decoded character, and the replacement.
const ACCENTS: &[(&str, char, &str)] = &[
    ("\\u00e9", '\u{e9}', "e"),
    ("\\u00fa", '\u{fa}', "u"),
    ("\\u00ed", '\u{ed}', "i"),
    ("\\u00f4", '\u{f4}', "o"),
    ("\\u00e4", '\u{e4}', "a"),
    ("\\u00e1", '\u{e1}', "a"),
    ("\\u00f3", '\u{f3}', "o"),
    ("\\u00f6", '\u{f6}', "o"),
    ("\\u00f1", '\u{f1}', "n"),
    ("\\u2019", '\u{2019}', " "),
    ("\\u00e8", '\u{e8}', "e"),
];

/// Second field of a TG list record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlag {
    Normal,
    /// 4000 to 5000 inclusive.
    Reflector,
    /// 9990
    Parrot,
}

impl ModeFlag {
    pub fn classify(id: i64) -> Self {
        if id == PARROT_ID {
            ModeFlag::Parrot
        } else if REFLECTOR_IDS.contains(&id) {
            ModeFlag::Reflector
        } else {
            ModeFlag::Normal
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ModeFlag::Normal => 0,
            ModeFlag::Reflector => 1,
            ModeFlag::Parrot => 2,
        }
    }
}

impl fmt::Display for ModeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Whether a talkgroup gets a group count at all. The reflector bounds and the parrot are
/// excluded, the rest of the reflector range is not.
pub fn is_counted(id: i64) -> bool {
    id > LOCAL_ID_LIMIT && id != *REFLECTOR_IDS.start() && id != *REFLECTOR_IDS.end() && id != PARROT_ID
}

/// Clean a talkgroup name for the TG list. Each step works on the output of the previous one.
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.replace("\\/", " ").replace('/', " ");
    for (escape, accented, plain) in ACCENTS {
        name = name.replace(escape, plain).replace(*accented, plain);
    }
    name = name.replace("Provincial", "").replace("Regional", "Reg-");
    name.retain(|c| !matches!(c, '\n' | '\r' | '"' | ','));
    name
}

/// One line of the TG list: `id;mode;count;name;name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgRecord {
    pub id: i64,
    /// The first field: the id as written in the directory (`0091` stays `0091`).
    pub label: String,
    pub mode: ModeFlag,
    pub count: usize,
    pub name: String,
}

impl TgRecord {
    /// Build the record for a directory entry. The name is cleaned here.
    pub fn new(entry: &TgEntry, groups: &Groups, match_mode: MatchMode) -> Self {
        let id = entry.id;
        let count = if is_counted(id) { groups.count(id, match_mode) } else { 0 };
        Self {
            id,
            label: entry.label.clone(),
            mode: ModeFlag::classify(id),
            count,
            name: clean_name(&entry.name),
        }
    }

    /// The synthesized multimode record. Its count is always looked up.
    pub fn multimode(groups: &Groups, match_mode: MatchMode) -> Self {
        Self {
            id: MULTIMODE_ID,
            label: MULTIMODE_ID.to_string(),
            mode: ModeFlag::Normal,
            count: groups.count(MULTIMODE_ID, match_mode),
            name: MULTIMODE_NAME.to_owned(),
        }
    }

    /// The five output fields. Spaces are stripped everywhere, including inside the name, which
    /// is how existing TG lists look (`MULTIMODESPAIN`).
    pub fn fields(&self) -> [String; 5] {
        let name: String = self.name.chars().filter(|&c| c != ' ').collect();
        [self.label.replace(' ', ""), self.mode.to_string(), self.count.to_string(), name.clone(), name]
    }
}

impl fmt::Display for TgRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields().join(";"))
    }
}
