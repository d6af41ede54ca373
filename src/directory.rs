use crate::TgListError;
use json::JsonValue;

/// One talkgroup of the downloaded directory, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgEntry {
    pub id: i64,
    /// The id as written in the directory, which is what goes into the TG list.
    pub label: String,
    pub name: String,
}

impl TgEntry {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            label: id.to_string(),
            name: name.into(),
        }
    }
}

/// Parse a talkgroup directory.
///
/// Accepts an object mapping ids to names (`{"91": "Worldwide"}`), an array of such single-pair
/// objects, or an array of objects with `id` and `name` members. Document order is kept, and an
/// id that appears twice gives two entries.
///
/// The outer `Result` fails when the document is not JSON or has none of these layouts. Each
/// inner `Result` is one entry, so a malformed entry can be reported without losing the others.
pub fn parse(text: &str) -> Result<Vec<Result<TgEntry, TgListError>>, TgListError> {
    match json::parse(text)? {
        // A parsed object keeps one value per key, so members are taken from the text instead
        JsonValue::Object(_) => object_members(text)
            .into_iter()
            .enumerate()
            .map(|(index, member)| -> Result<_, TgListError> {
                let member = json::parse(&format!("{{{}}}", member))?;
                Ok(entry_from_member(index + 1, &member))
            })
            .collect(),
        JsonValue::Array(entries) => Ok(entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_from_member(index + 1, entry))
            .collect()),
        other => Err(TgListError::Layout(format!(
            "expected an object or an array at the top level, found {}",
            kind(&other)
        ))),
    }
}

/// Split the text of a valid top-level JSON object into its `"key": value` members.
fn object_members(text: &str) -> Vec<&str> {
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = None;
    for (offset, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => {
                depth += 1;
                if depth == 1 {
                    start = Some(offset + 1);
                }
            }
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = start.take() {
                        push_member(&mut members, &text[start..offset]);
                    }
                }
            }
            ',' if depth == 1 => {
                if let Some(begin) = start {
                    push_member(&mut members, &text[begin..offset]);
                }
                start = Some(offset + 1);
            }
            _ => {}
        }
    }
    members
}

fn push_member<'a>(members: &mut Vec<&'a str>, member: &'a str) {
    if !member.trim().is_empty() {
        members.push(member);
    }
}

fn entry_from_member(entry: usize, member: &JsonValue) -> Result<TgEntry, TgListError> {
    match member {
        JsonValue::Object(object) => {
            if let Some(id) = object.get("id") {
                return entry_from_pair(entry, id, &object["name"]);
            }
            let mut members = object.iter();
            match (members.next(), members.next()) {
                (Some((id, name)), None) => entry_from_pair(entry, &JsonValue::from(id), name),
                _ => Err(TgListError::record(
                    entry,
                    format!("expected a single \"id\": \"name\" pair, found {} members", object.len()),
                )),
            }
        }
        other => Err(TgListError::record(entry, format!("expected an object, found {}", kind(other)))),
    }
}

fn entry_from_pair(entry: usize, id: &JsonValue, name: &JsonValue) -> Result<TgEntry, TgListError> {
    let (id, label) = if let Some(label) = id.as_str() {
        let label = label.trim();
        let id = label
            .parse::<i64>()
            .map_err(|_| TgListError::record(entry, format!("talkgroup id {:?} is not an integer", label)))?;
        (id, label.to_owned())
    } else if let Some(number) = id.as_f64().filter(|n| n.fract() == 0.0).and(id.as_i64()) {
        (number, number.to_string())
    } else {
        return Err(TgListError::record(entry, format!("talkgroup id {} is not an integer", id)));
    };
    let name = name
        .as_str()
        .ok_or_else(|| TgListError::record(entry, format!("name of talkgroup {} is {}", label, kind(name))))?;
    Ok(TgEntry {
        id,
        label,
        name: name.to_owned(),
    })
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Short(_) | JsonValue::String(_) => "a string",
        JsonValue::Number(_) => "a number",
        JsonValue::Boolean(_) => "a boolean",
        JsonValue::Object(_) => "an object",
        JsonValue::Array(_) => "an array",
    }
}
