use log::info;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub mod directory;
pub mod gateway;
pub mod groups;
pub mod record;
pub mod transform;

pub use directory::TgEntry;
pub use groups::{Groups, MatchMode};
pub use record::{ModeFlag, TgRecord};
pub use transform::{Options, Summary};

#[derive(Debug, Error)]
pub enum TgListError {
    #[error("failed to read {}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("talkgroup directory is not valid JSON: {0}")]
    Json(#[from] json::Error),
    #[error("unexpected talkgroup directory layout: {0}")]
    Layout(String),
    #[error("entry {entry}: {reason}")]
    Record { entry: usize, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl TgListError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        TgListError::Read {
            path: path.to_owned(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        TgListError::Write {
            path: path.to_owned(),
            source,
        }
    }

    pub(crate) fn record(entry: usize, reason: impl Into<String>) -> Self {
        TgListError::Record {
            entry,
            reason: reason.into(),
        }
    }
}

/// Where to read from and write to, and how.
#[derive(Debug, Clone)]
pub struct Config {
    pub groups: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: Options,
}

/// Build the TG list: load the group file, convert the talkgroup directory and write the result.
/// The output file is only replaced once every record has been written.
pub fn generate(config: &Config) -> Result<Summary, TgListError> {
    let groups = Groups::load(&config.groups)?;
    info!("Loaded {} group lines from {}", groups.len(), config.groups.display());

    let bytes = fs::read(&config.input).map_err(|source| TgListError::read(&config.input, source))?;
    let entries = directory::parse(&String::from_utf8_lossy(&bytes))?;
    info!("Read {} talkgroups from {}", entries.len(), config.input.display());

    let transformed = transform::transform(&groups, entries, config.options)?;
    transform::write_atomic(&config.output, &transformed.records)?;
    info!(
        "Wrote {} records to {} ({} skipped)",
        transformed.summary.written,
        config.output.display(),
        transformed.summary.skipped
    );
    Ok(transformed.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path, groups: &str, directory: &str) -> Config {
        fs::write(dir.join("group.txt"), groups).unwrap();
        fs::write(dir.join("data.json"), directory).unwrap();
        Config {
            groups: dir.join("group.txt"),
            input: dir.join("data.json"),
            output: dir.join("TGList.txt"),
            options: Options::default(),
        }
    }

    const DIRECTORY: &str = r#"{
    "91": "Worldwide",
    "214": "Spain",
    "2150": "Test Group",
    "2141": "Cataluña Regional",
    "4001": "Link A",
    "9990": "Parrot"
}
"#;

    #[test]
    fn generates_tg_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "{A,2150,B},{A,2150,B},{X,2140,4001,Y}\n{Z,91,214,W}\n", DIRECTORY);
        let summary = generate(&config).unwrap();
        assert_eq!(
            summary,
            Summary {
                written: 7,
                skipped: 0,
                multimode_emitted: true
            }
        );
        assert_eq!(
            fs::read_to_string(&config.output).unwrap(),
            "91;0;1;Worldwide;Worldwide\n\
             214;0;1;Spain;Spain\n\
             2140;0;1;MULTIMODESPAIN;MULTIMODESPAIN\n\
             2150;0;2;TestGroup;TestGroup\n\
             2141;0;0;CatalunaReg-;CatalunaReg-\n\
             4001;1;1;LinkA;LinkA\n\
             9990;2;0;Parrot;Parrot\n"
        );
    }

    #[test]
    fn output_is_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "{A,2150,B}\n", DIRECTORY);
        generate(&config).unwrap();
        let first = fs::read(&config.output).unwrap();
        generate(&config).unwrap();
        assert_eq!(fs::read(&config.output).unwrap(), first);
    }

    #[test]
    fn failed_run_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "", r#"{"91": "Worldwide", "oops": "Broken"}"#);
        config.options.strict = true;
        fs::write(&config.output, "91;0;0;Worldwide;Worldwide\n").unwrap();
        let error = generate(&config).unwrap_err();
        assert!(matches!(error, TgListError::Record { entry: 2, .. }));
        assert_eq!(fs::read_to_string(&config.output).unwrap(), "91;0;0;Worldwide;Worldwide\n");
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "", "{}");
        config.input = dir.path().join("absent.json");
        assert!(matches!(generate(&config), Err(TgListError::Read { .. })));
        assert!(!config.output.exists());
    }
}
