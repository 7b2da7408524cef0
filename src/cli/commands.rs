//! CLI command implementations
//!
//! Both commands are read-only: they never create a store that is not
//! already there and never open the store file for writing.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::StateConfig;
use crate::store::{Envelope, FileStore, STORE_DIR, STORE_FILE};

use super::args::{Command, StoreLocation};
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_response};

/// Run a parsed command, writing its output to `out`
pub fn run_command<W: Write>(command: Command, out: &mut W) -> CliResult<()> {
    match command {
        Command::Inspect { location } => inspect(&resolve_data_dir(&location)?, out),
        Command::Verify { location } => verify(&resolve_data_dir(&location)?, out),
    }
}

/// Pick the data directory from the flags, falling back to the config file
pub fn resolve_data_dir(location: &StoreLocation) -> CliResult<PathBuf> {
    if let Some(dir) = &location.data_dir {
        return Ok(dir.clone());
    }
    let config_path = location
        .config
        .as_ref()
        .ok_or_else(|| CliError::config_error("pass --data-dir or --config"))?;
    let config = StateConfig::load(config_path)?;
    config
        .data_path()
        .map(Path::to_path_buf)
        .ok_or_else(|| CliError::config_error("config has no data_dir"))
}

fn require_store(data_dir: &Path) -> CliResult<()> {
    let path = data_dir.join(STORE_DIR).join(STORE_FILE);
    if !path.is_file() {
        return Err(CliError::not_initialized(&path));
    }
    Ok(())
}

/// Print the latest envelope of every key, sorted by key
pub fn inspect<W: Write>(data_dir: &Path, out: &mut W) -> CliResult<()> {
    require_store(data_dir)?;

    for (key, bytes) in FileStore::read_entries(data_dir)? {
        let envelope = Envelope::decode_untyped(&key, &bytes)?;
        write_json(
            out,
            &json!({
                "key": key.to_string(),
                "tag": envelope.tag,
                "txid": envelope.txid,
                "value": envelope.value,
            }),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Scan every record and report counts
pub fn verify<W: Write>(data_dir: &Path, out: &mut W) -> CliResult<()> {
    require_store(data_dir)?;
    let report = FileStore::verify(data_dir)?;
    write_response(out, serde_json::to_value(report)?)
}
