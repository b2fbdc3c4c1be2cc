//! Output formatting utilities for the CLI.
//!
//! Command results go to stdout, either human-readable or as pretty JSON.
//! Streams of records are written as one compact JSON document per line.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Write `value` as a single JSON line and flush, so pipes see it at once.
pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("Failed to encode output line")?;
    out.write_all(b"\n").context("Failed to write output line")?;
    out.flush().context("Failed to flush output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_line() {
        let mut buf = Vec::new();
        write_json_line(&mut buf, &serde_json::json!({"id": 1})).unwrap();
        write_json_line(&mut buf, &serde_json::json!({"id": 2})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"id\":1}\n{\"id\":2}\n");
    }
}
