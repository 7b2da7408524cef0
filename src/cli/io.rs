//! JSON output for the CLI
//!
//! - One JSON object per line
//! - Success: `{"status": "ok", "data": ...}`
//! - Failure: `{"status": "error", "code": ..., "message": ...}`

use std::io::Write;

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::CliResult;

/// Write one serializable value as a JSON line
pub fn write_json<W: Write, S: Serialize>(out: &mut W, value: &S) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_json(out, &json!({ "status": "ok", "data": data }))?;
    out.flush()?;
    Ok(())
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_json(
        out,
        &json!({ "status": "error", "code": code, "message": message }),
    )?;
    out.flush()?;
    Ok(())
}
