//! Result formatting for the command line

use crate::db::Match;
use crate::index::Fingerprint;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// One image location as reported by `find`
#[derive(Debug, Serialize)]
pub struct ImageInfo<'a> {
    pub hash: Fingerprint,
    pub location: &'a str,
}

/// Print search matches, closest first
pub fn print_matches(matches: &[Match], json: bool) -> io::Result<()> {
    let mut sorted: Vec<&Match> = matches.iter().collect();
    sorted.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.location.cmp(&b.location)));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &sorted)?;
        writeln!(out)?;
        return Ok(());
    }

    for m in sorted {
        writeln!(out, "{}  {:>2}  {}", m.hash, m.distance, m.location)?;
    }
    Ok(())
}

/// Print the locations stored under one fingerprint, in insertion order
pub fn print_locations(hash: Fingerprint, locations: &[String], json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let infos: Vec<ImageInfo> = locations
            .iter()
            .map(|location| ImageInfo { hash, location })
            .collect();
        serde_json::to_writer_pretty(&mut out, &infos)?;
        writeln!(out)?;
        return Ok(());
    }

    for location in locations {
        writeln!(out, "{}  {}", hash, location)?;
    }
    Ok(())
}

/// Print one computed fingerprint per file
pub fn print_hash(path: &Path, hash: Fingerprint) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}  {}", hash, path.display())
}
