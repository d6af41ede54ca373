use anyhow::{anyhow, Context, Result};
use log::info;
use std::cmp::Reverse;
use tglist::{Groups, MatchMode};

/// Takes a group file and talkgroup ids, and prints how many group fragments mention each id,
/// with substring and with exact matching
fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or_else(|| anyhow!("usage: count_groups <group file> <talkgroup id>..."))?;
    let groups = Groups::load(&path)?;
    info!("Loaded {} group lines from {}", groups.len(), path);
    let mut results = Vec::new();
    for arg in args {
        let id: i64 = arg.parse().with_context(|| format!("invalid talkgroup id {}", arg))?;
        results.push((id, groups.count(id, MatchMode::Substring), groups.count(id, MatchMode::Token)));
    }
    results.sort_by_key(|&(_, substring, _)| Reverse(substring));
    for (id, substring, token) in results {
        println!("{}: {} ({} exact)", id, substring, token);
    }
    Ok(())
}
