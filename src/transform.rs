use crate::{
    directory::TgEntry,
    groups::{Groups, MatchMode},
    record::{TgRecord, MULTIMODE_ID},
    TgListError,
};
use log::{debug, warn};
use std::{collections::HashSet, io::Write, path::Path};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub match_mode: MatchMode,
    /// Abort on the first malformed entry instead of skipping it.
    pub strict: bool,
}

/// Whether the multimode record has been written yet. Only ever moves from `Pending` to `Emitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multimode {
    Pending,
    Emitted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped: usize,
    pub multimode_emitted: bool,
}

#[derive(Debug, Clone)]
pub struct Transformed {
    pub records: Vec<TgRecord>,
    pub summary: Summary,
}

/// Turn directory entries into TG list records.
///
/// The multimode record goes right before the first talkgroup above 2140. Malformed entries are
/// logged and skipped, or returned as the error when `options.strict` is set. An id that appears
/// more than once is logged and written each time.
pub fn transform<I>(groups: &Groups, entries: I, options: Options) -> Result<Transformed, TgListError>
where
    I: IntoIterator<Item = Result<TgEntry, TgListError>>,
{
    let mut records = Vec::new();
    let mut skipped = 0;
    let mut multimode = Multimode::Pending;
    let mut seen = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if options.strict => return Err(error),
            Err(error) => {
                warn!("skipping {}", error);
                skipped += 1;
                continue;
            }
        };
        if !seen.insert(entry.id) {
            warn!("entry {}: talkgroup {} appears more than once", index + 1, entry.label);
        }
        if multimode == Multimode::Pending && entry.id > MULTIMODE_ID {
            let record = TgRecord::multimode(groups, options.match_mode);
            debug!("{}", record);
            records.push(record);
            multimode = Multimode::Emitted;
        }
        let record = TgRecord::new(&entry, groups, options.match_mode);
        debug!("{}", record);
        records.push(record);
    }
    let summary = Summary {
        written: records.len(),
        skipped,
        multimode_emitted: multimode == Multimode::Emitted,
    };
    Ok(Transformed { records, summary })
}

/// Write records as a `;` separated TG list, one per line, no header.
pub fn write_records<W: Write>(writer: W, records: &[TgRecord]) -> Result<(), TgListError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for record in records {
        writer.write_record(&record.fields())?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write records to `path` through a temporary file in the same directory, so a failed run never
/// leaves a truncated TG list behind.
pub fn write_atomic(path: impl AsRef<Path>, records: &[TgRecord]) -> Result<(), TgListError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| TgListError::write(path, source))?;
    write_records(&mut tmp, records)?;
    tmp.as_file().sync_all().map_err(|source| TgListError::write(path, source))?;
    tmp.persist(path).map_err(|error| TgListError::write(path, error.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory;
    use std::fs;

    fn entries(pairs: &[(i64, &str)]) -> Vec<Result<TgEntry, TgListError>> {
        pairs.iter().map(|&(id, name)| Ok(TgEntry::new(id, name))).collect()
    }

    fn lines(transformed: &Transformed) -> Vec<String> {
        transformed.records.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn inserts_multimode_before_first_id_above_2140() {
        let groups = Groups::from_lines(vec!["{A,2150,B},{A,2150,B},{X,2140,Y}"]);
        let transformed = transform(
            &groups,
            entries(&[(91, "Worldwide"), (214, "Spain"), (2150, "Test Group"), (4000, "Unlink"), (9990, "Parrot"), (3100, "USA")]),
            Options::default(),
        )
        .unwrap();
        assert_eq!(
            lines(&transformed),
            vec![
                "91;0;0;Worldwide;Worldwide",
                "214;0;0;Spain;Spain",
                "2140;0;1;MULTIMODESPAIN;MULTIMODESPAIN",
                "2150;0;2;TestGroup;TestGroup",
                "4000;1;0;Unlink;Unlink",
                "9990;2;0;Parrot;Parrot",
                "3100;0;0;USA;USA",
            ]
        );
        assert_eq!(
            transformed.summary,
            Summary {
                written: 7,
                skipped: 0,
                multimode_emitted: true
            }
        );
    }

    #[test]
    fn multimode_first_when_first_id_is_above_2140() {
        let groups = Groups::from_lines(vec!["{A,2150,B},{A,2150,B}"]);
        let transformed = transform(&groups, entries(&[(2150, "Test Group")]), Options::default()).unwrap();
        assert_eq!(
            lines(&transformed),
            vec!["2140;0;0;MULTIMODESPAIN;MULTIMODESPAIN", "2150;0;2;TestGroup;TestGroup"]
        );
    }

    #[test]
    fn no_multimode_without_ids_above_2140() {
        let transformed = transform(
            &Groups::default(),
            entries(&[(91, "Worldwide"), (2140, "Spain Multi")]),
            Options::default(),
        )
        .unwrap();
        assert_eq!(lines(&transformed), vec!["91;0;0;Worldwide;Worldwide", "2140;0;0;SpainMulti;SpainMulti"]);
        assert!(!transformed.summary.multimode_emitted);
    }

    #[test]
    fn counts_follow_match_mode() {
        let groups = Groups::from_lines(vec!["[2150,7]},{a,2150,b}"]);
        let counts = |match_mode| {
            let options = Options {
                match_mode,
                strict: false,
            };
            transform(&groups, entries(&[(2150, "Test")]), options).unwrap().records[1].count
        };
        assert_eq!(counts(MatchMode::Substring), 1);
        assert_eq!(counts(MatchMode::Token), 2);
    }

    #[test]
    fn writes_repeated_ids_every_time() {
        let text = r#"{"91": "Worldwide", "214": "Spain", "91": "Again"}"#;
        let transformed = transform(&Groups::default(), directory::parse(text).unwrap(), Options::default()).unwrap();
        assert_eq!(
            lines(&transformed),
            vec!["91;0;0;Worldwide;Worldwide", "214;0;0;Spain;Spain", "91;0;0;Again;Again"]
        );
        assert_eq!(transformed.summary.written, 3);
        assert_eq!(transformed.summary.skipped, 0);
    }

    #[test]
    fn keeps_id_text_from_the_directory() {
        let text = r#"{"0091": "Worldwide", "-5": "Negative"}"#;
        let transformed = transform(&Groups::default(), directory::parse(text).unwrap(), Options::default()).unwrap();
        assert_eq!(lines(&transformed), vec!["0091;0;0;Worldwide;Worldwide", "-5;0;0;Negative;Negative"]);
        assert_eq!(transformed.summary.skipped, 0);
    }

    #[test]
    fn skips_malformed_entries_unless_strict() {
        let groups = Groups::default();
        let text = r#"{"91": "Worldwide", "x1": "Broken", "92": "Europe"}"#;

        let transformed = transform(&groups, directory::parse(text).unwrap(), Options::default()).unwrap();
        assert_eq!(lines(&transformed), vec!["91;0;0;Worldwide;Worldwide", "92;0;0;Europe;Europe"]);
        assert_eq!(transformed.summary.skipped, 1);

        let options = Options {
            strict: true,
            ..Options::default()
        };
        let error = transform(&groups, directory::parse(text).unwrap(), options).unwrap_err();
        assert!(matches!(error, TgListError::Record { entry: 2, .. }));
    }

    #[test]
    fn writes_semicolon_lines() {
        let groups = Groups::from_lines(vec!["{X,2140,Y}"]);
        let transformed = transform(&groups, entries(&[(2150, "Test Group"), (9990, "Parrot")]), Options::default())
            .unwrap();
        let mut out = Vec::new();
        write_records(&mut out, &transformed.records).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2140;0;1;MULTIMODESPAIN;MULTIMODESPAIN\n2150;0;0;TestGroup;TestGroup\n9990;2;0;Parrot;Parrot\n"
        );
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TGList.txt");
        fs::write(&path, "stale\n").unwrap();
        let transformed = transform(&Groups::default(), entries(&[(91, "Worldwide")]), Options::default()).unwrap();
        write_atomic(&path, &transformed.records).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "91;0;0;Worldwide;Worldwide\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_atomic_write_keeps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("TGList.txt");
        let error = write_atomic(&path, &[]).unwrap_err();
        assert!(matches!(error, TgListError::Write { .. }));
        assert!(!path.exists());
    }
}
