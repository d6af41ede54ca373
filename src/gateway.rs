//! Reads a TG list back the way the YSF2DMR gateway loads it for the Wires-X directory, so a
//! generated file can be checked before it is deployed.

use crate::TgListError;
use std::{fmt, fs, path::Path};

/// The gateway reads lines with a 100 byte buffer, so 99 bytes at a time including the newline.
pub const READ_CHUNK: usize = 99;
pub const NAME_WIDTH: usize = 16;
pub const DESCRIPTION_WIDTH: usize = 14;
const ID_WIDTH: usize = 7;

/// A talkgroup as the gateway holds it: zero padded id and count, fixed width name and
/// description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEntry {
    pub id: String,
    pub mode: String,
    pub count: String,
    pub name: String,
    pub description: String,
}

/// Something in a TG list line that the gateway will not show as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// The line is longer than one read, so it is cut and the rest is read as another line.
    LineTooLong { length: usize },
    /// Fewer than five fields, the line is ignored.
    MissingFields,
    NameTruncated { name: String },
    DescriptionTruncated { description: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::LineTooLong { length } => {
                write!(f, "line is {} bytes, the gateway reads at most {}", length, READ_CHUNK)
            }
            Issue::MissingFields => write!(f, "fewer than five fields"),
            Issue::NameTruncated { name } => write!(f, "name {:?} is cut to {} bytes", name, NAME_WIDTH),
            Issue::DescriptionTruncated { description } => {
                write!(f, "description {:?} is cut to {} bytes", description, DESCRIPTION_WIDTH)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Verification {
    pub entries: Vec<GatewayEntry>,
    /// Line number (1-based) and what is wrong with it.
    pub issues: Vec<(usize, Issue)>,
}

/// Load a TG list with the gateway's rules. `make_upper` mirrors the gateway's upper-case option.
pub fn read(path: impl AsRef<Path>, make_upper: bool) -> Result<Vec<GatewayEntry>, TgListError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| TgListError::read(path, source))?;
    Ok(parse(&bytes, make_upper))
}

/// Parse TG list contents. Each read chunk is handled on its own, like the gateway does.
pub fn parse(bytes: &[u8], make_upper: bool) -> Vec<GatewayEntry> {
    bytes
        .split_inclusive(|&b| b == b'\n')
        .flat_map(|line| line.chunks(READ_CHUNK))
        .filter_map(|chunk| parse_chunk(&String::from_utf8_lossy(chunk), make_upper))
        .collect()
}

fn parse_chunk(chunk: &str, make_upper: bool) -> Option<GatewayEntry> {
    if chunk.starts_with('#') {
        return None;
    }
    let mut rest = chunk;
    let id = next_token(&mut rest, &[';', '\r', '\n'])?;
    let mode = next_token(&mut rest, &[';', '\r', '\n'])?;
    let count = next_token(&mut rest, &[';', '\r', '\n'])?;
    let name = next_token(&mut rest, &[';', '\r', '\n'])?;
    let description = next_token(&mut rest, &['\r', '\n'])?;

    let (mut name, mut description) = (name.to_owned(), description.to_owned());
    if make_upper {
        name = name.to_uppercase();
        description = description.to_uppercase();
    }
    Some(GatewayEntry {
        id: format!("{:0>width$}", id, width = ID_WIDTH),
        mode: mode.to_owned(),
        count: format!("{:03}", leading_integer(count)),
        name: fit(&name, NAME_WIDTH),
        description: fit(&description, DESCRIPTION_WIDTH),
    })
}

/// Split off the next token. Runs of delimiters count as one and empty tokens do not exist.
fn next_token<'a>(rest: &mut &'a str, delimiters: &[char]) -> Option<&'a str> {
    let start = rest.trim_start_matches(delimiters);
    if start.is_empty() {
        *rest = start;
        return None;
    }
    match start.find(delimiters) {
        Some(end) => {
            // Delimiters are all ASCII
            *rest = &start[end + 1..];
            Some(&start[..end])
        }
        None => {
            *rest = "";
            Some(start)
        }
    }
}

/// The integer at the start of `s`, or zero.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(digits) => (-1, digits),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Cut or pad to `width` bytes. A multi-byte character split at the edge becomes U+FFFD.
fn fit(s: &str, width: usize) -> String {
    let mut bytes = s.as_bytes().to_vec();
    bytes.resize(width, b' ');
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Check each line of a TG list for things the gateway would drop or cut.
pub fn lint(text: &str) -> Vec<(usize, Issue)> {
    let mut issues = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        if line.len() > READ_CHUNK {
            issues.push((number, Issue::LineTooLong { length: line.len() }));
            continue;
        }
        let fields: Vec<&str> = line.splitn(5, ';').collect();
        if fields.len() < 5 || fields.iter().any(|field| field.is_empty()) {
            issues.push((number, Issue::MissingFields));
            continue;
        }
        if fields[3].len() > NAME_WIDTH {
            issues.push((
                number,
                Issue::NameTruncated {
                    name: fields[3].to_owned(),
                },
            ));
        }
        if fields[4].len() > DESCRIPTION_WIDTH {
            issues.push((
                number,
                Issue::DescriptionTruncated {
                    description: fields[4].to_owned(),
                },
            ));
        }
    }
    issues
}

/// Load a written TG list and lint it.
pub fn verify(path: impl AsRef<Path>) -> Result<Verification, TgListError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| TgListError::read(path, source))?;
    Ok(Verification {
        entries: parse(&bytes, false),
        issues: lint(&String::from_utf8_lossy(&bytes)),
    })
}
