//! CLI command implementations
//!
//! Output is one JSON document per line on the given writer. Logs go to
//! stderr through the structured logger, never to the output writer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::location::{classify_os_name, LoadReport};
use crate::observability::{log_event, Event, Logger};
use crate::store::Store;
use crate::volume::{VolumeDescriptor, VolumeId};

/// Parse arguments and run the selected command against stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command, &mut io::stdout().lock())
}

/// Run one command, writing results to `out`
pub fn run_command<W: Write>(command: Command, out: &mut W) -> CliResult<()> {
    match command {
        Command::Load { config } => load(&config, out),
        Command::List { config } => list(&config, out),
        Command::Check { dir } => check(&dir, out),
    }
}

#[derive(Debug, Serialize)]
struct LoadSummary {
    locations: Vec<LoadReport>,
    volume_count: usize,
    max_volume_count: usize,
}

#[derive(Debug, Serialize)]
struct VolumeLine<'a> {
    directory: &'a Path,
    #[serde(flatten)]
    volume: VolumeDescriptor,
}

#[derive(Debug, Serialize)]
struct CheckLine {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume_id: Option<VolumeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<String>,
}

fn open_store(config_path: &Path) -> CliResult<(Config, Store)> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event(
        Event::ConfigLoaded,
        &[
            ("path", &config_path.display().to_string()),
            ("locations", &config.locations.len().to_string()),
        ],
    );
    let store = Store::open(&config.locations);
    Ok((config, store))
}

/// Load every location and print the summary report
pub fn load<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let (config, store) = open_store(config_path)?;
    let reports = store.load_all(&config.load_options())?;

    write_json(
        out,
        &LoadSummary {
            locations: reports,
            volume_count: store.volume_count(),
            max_volume_count: store.max_volume_count(),
        },
    )
}

/// Load every location and print one line per volume
pub fn list<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let (config, store) = open_store(config_path)?;
    store.load_all(&config.load_options())?;

    for location in store.locations() {
        for volume in location.descriptors() {
            write_json(
                out,
                &VolumeLine {
                    directory: location.directory(),
                    volume,
                },
            )?;
        }
    }
    Ok(())
}

/// Classify every entry of `dir` by name, in name order
pub fn check<W: Write>(dir: &Path, out: &mut W) -> CliResult<()> {
    let mut entries: Vec<(PathBuf, bool)> = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| CliError::io_error(format!("Cannot list {}: {}", dir.display(), e)))?
    {
        let entry = entry?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(true);
        entries.push((PathBuf::from(entry.file_name()), is_dir));
    }
    entries.sort();

    for (name, is_dir) in entries {
        let line = match classify_os_name(name.as_os_str(), is_dir) {
            Ok(file) => CheckLine {
                file: name.to_string_lossy().into_owned(),
                volume_id: Some(file.id),
                collection: Some(file.collection),
                skipped: None,
            },
            Err(reason) => CheckLine {
                file: name.to_string_lossy().into_owned(),
                volume_id: None,
                collection: None,
                skipped: Some(reason.to_string()),
            },
        };
        write_json(out, &line)?;
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{create_volume_file, SuperBlock};
    use serde_json::Value;
    use tempfile::TempDir;

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn write_config(dir: &TempDir, data: &Path) -> PathBuf {
        let path = dir.path().join("bitstore.json");
        let config = serde_json::json!({
            "locations": [{ "directory": data, "max_volume_count": 5 }],
            "concurrency": 3,
        });
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_prints_summary() {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");
        fs::create_dir(&data).unwrap();
        create_volume_file(&data, "", VolumeId::new(1), &SuperBlock::default()).unwrap();
        create_volume_file(&data, "pics", VolumeId::new(2), &SuperBlock::default()).unwrap();
        let config = write_config(&root, &data);

        let mut out = Vec::new();
        run_command(Command::Load { config }, &mut out).unwrap();

        let lines = lines(out);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["volume_count"], 2);
        assert_eq!(lines[0]["max_volume_count"], 5);
        assert_eq!(lines[0]["locations"][0]["stats"]["loaded"], 2);
    }

    #[test]
    fn test_list_prints_each_volume() {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");
        fs::create_dir(&data).unwrap();
        create_volume_file(&data, "pics", VolumeId::new(4), &SuperBlock::default()).unwrap();
        create_volume_file(&data, "", VolumeId::new(2), &SuperBlock::default()).unwrap();
        let config = write_config(&root, &data);

        let mut out = Vec::new();
        run_command(Command::List { config }, &mut out).unwrap();

        let lines = lines(out);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.get("event").is_none()));
        assert_eq!(lines[0]["id"], 2);
        assert_eq!(lines[1]["id"], 4);
        assert_eq!(lines[1]["collection"], "pics");
        assert_eq!(lines[1]["replica_placement"], "000");
    }

    #[test]
    fn test_load_fails_on_missing_directory() {
        let root = TempDir::new().unwrap();
        let config = write_config(&root, &root.path().join("absent"));

        let mut out = Vec::new();
        let err = run_command(Command::Load { config }, &mut out).unwrap_err();
        assert_eq!(err.code(), super::super::errors::CliErrorCode::LoadFailed);
        assert!(out.is_empty());
    }

    #[test]
    fn test_check_classifies_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("3.dat"), b"").unwrap();
        fs::write(dir.path().join("orders_7.dat"), b"").unwrap();
        fs::write(dir.path().join("README.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("tmp")).unwrap();

        let mut out = Vec::new();
        check(dir.path(), &mut out).unwrap();

        let lines = lines(out);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["file"], "3.dat");
        assert_eq!(lines[0]["volume_id"], 3);
        assert_eq!(lines[0]["collection"], "");
        assert_eq!(lines[1]["file"], "README.txt");
        assert!(lines[1]["skipped"].is_string());
        assert_eq!(lines[2]["volume_id"], 7);
        assert_eq!(lines[2]["collection"], "orders");
        assert_eq!(lines[3]["file"], "tmp");
        assert!(lines[3].get("volume_id").is_none());
    }
}
