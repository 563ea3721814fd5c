//! JSON-lines event input shared by `run` and `eval`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use contracts::LogEvent;
use tokio::io::AsyncBufRead;

use crate::error::CliError;

/// Parse one input line; blank lines yield `None`
pub fn parse_event(line_no: u64, line: &str) -> Result<Option<LogEvent>, CliError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| CliError::invalid_event(line_no, e.to_string()))
}

/// Blocking reader over a file, or stdin when no path is given
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Async reader over a file, or stdin when no path is given
pub async fn open_async_input(
    path: Option<&Path>,
) -> io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match path {
        Some(path) => Box::new(tokio::io::BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(tokio::io::BufReader::new(tokio::io::stdin())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LogLevel;

    #[test]
    fn test_parse_event() {
        let line = r#"{"timestamp":"2024-05-01T13:30:00Z","level":"Warning","message_template":"Disk {Drive} low","properties":{"Drive":"C"}}"#;
        let event = parse_event(1, line).unwrap().unwrap();
        assert_eq!(event.level, LogLevel::Warning);
        assert_eq!(event.render_message(), "Disk C low");
    }

    #[test]
    fn test_blank_and_invalid_lines() {
        assert!(parse_event(1, "   ").unwrap().is_none());
        let err = parse_event(7, "{ nope").unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }
}
