use crate::TgListError;
use lazy_static::lazy_static;
use regex::Regex;
use std::{fs, path::Path};

/// Separator between the membership fragments of one group line.
pub const FRAGMENT_SEPARATOR: &str = "},";

lazy_static! {
    static ref FIELD_SEPARATOR: Regex = Regex::new(r#"[,\[\]{}:"]+"#).unwrap();
}

/// How a talkgroup id is matched against a group fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchMode {
    /// The fragment contains `,<id>,` and its first occurrence is not at the very start of the
    /// fragment. This is what existing TG lists were generated with.
    #[default]
    Substring,
    /// One of the fragment's fields is exactly `<id>`.
    Token,
}

/// The group file, held as raw lines.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    lines: Vec<String>,
}

impl Groups {
    /// Read every line of the group file. Invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TgListError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| TgListError::read(path, source))?;
        Ok(Self::from_lines(String::from_utf8_lossy(&bytes).lines()))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Count the fragments, across all group lines, that mention `tg_id`.
    /// A fragment counts at most once.
    pub fn count(&self, tg_id: i64, mode: MatchMode) -> usize {
        match mode {
            MatchMode::Substring => {
                let needle = format!(",{},", tg_id);
                self.fragments()
                    .filter(|fragment| matches!(fragment.find(&needle), Some(offset) if offset > 0))
                    .count()
            }
            MatchMode::Token => {
                let id = tg_id.to_string();
                self.fragments()
                    .filter(|fragment| FIELD_SEPARATOR.split(fragment).any(|field| field.trim() == id))
                    .count()
            }
        }
    }

    fn fragments(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flat_map(|line| line.split(FRAGMENT_SEPARATOR))
    }
}
