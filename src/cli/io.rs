//! JSON I/O for the CLI
//!
//! - Documents come from files, or from stdin for `-`
//! - Every result is one JSON line on stdout

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads one JSON document from a file, or stdin for `-`.
pub fn read_document(path: &Path) -> CliResult<Value> {
    let source = path.display().to_string();
    let content = if source == "-" {
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| CliError::invalid_document(&source, e.to_string()))?
    };

    if content.trim().is_empty() {
        return Err(CliError::invalid_document(&source, "empty input"));
    }
    serde_json::from_str(&content).map_err(|e| CliError::invalid_document(&source, e.to_string()))
}

/// Writes one JSON line to stdout.
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_document() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.json");
        let bad = temp_dir.path().join("bad.json");
        let empty = temp_dir.path().join("empty.json");
        fs::write(&good, r#"{"name": "jay"}"#).unwrap();
        fs::write(&bad, "{ nope").unwrap();
        fs::write(&empty, "  \n").unwrap();

        assert_eq!(read_document(&good).unwrap()["name"], "jay");

        let err = read_document(&bad).unwrap_err();
        assert_eq!(err.code_str(), "DOCRULE_CLI_INVALID_DOCUMENT");
        assert!(err.message().contains("bad.json"));

        assert!(read_document(&empty).is_err());
        assert!(read_document(&temp_dir.path().join("missing.json")).is_err());
    }
}
