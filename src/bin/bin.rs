use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;
use tglist::{gateway, Config, MatchMode, Options as TransformOptions};

/// Convert a downloaded talkgroup directory into a TG list for the YSF2DMR gateway
#[derive(StructOpt)]
struct Options {
    /// Group file, used to count how often each talkgroup is referenced
    #[structopt(short, long, parse(from_os_str), default_value = "/tmp/group.txt")]
    groups: PathBuf,
    /// Talkgroup directory (JSON)
    #[structopt(short, long, parse(from_os_str), default_value = "/tmp/data.json")]
    input: PathBuf,
    #[structopt(short, long, parse(from_os_str), default_value = "/tmp/TGList.txt")]
    output: PathBuf,
    /// Count only exact id fields instead of `,<id>,` substrings
    #[structopt(short = "x", long)]
    exact_match: bool,
    /// Stop at the first malformed talkgroup instead of skipping it
    #[structopt(short, long)]
    strict: bool,
    /// Read the written file back with the gateway's rules and report problems
    #[structopt(long)]
    verify: bool,
}

fn main() -> Result<()> {
    // Load from .env file if it is present
    dotenv::dotenv().ok();
    // Initialize logging
    env_logger::init();
    // Get command line arguments
    let options = Options::from_args();
    let config = Config {
        groups: options.groups,
        input: options.input,
        output: options.output,
        options: TransformOptions {
            match_mode: if options.exact_match {
                MatchMode::Token
            } else {
                MatchMode::Substring
            },
            strict: options.strict,
        },
    };

    let summary =
        tglist::generate(&config).with_context(|| format!("failed to generate {}", config.output.display()))?;
    if summary.skipped > 0 {
        warn!("{} talkgroups were skipped", summary.skipped);
    }

    if options.verify {
        let verification = gateway::verify(&config.output)?;
        for (line, issue) in &verification.issues {
            warn!("{} line {}: {}", config.output.display(), line, issue);
        }
        info!("Loaded {} TGs in the TGId lookup table", verification.entries.len());
    }

    Ok(())
}
