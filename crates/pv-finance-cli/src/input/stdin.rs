use serde::de::DeserializeOwned;
use std::io::{self, Read};

use super::file::parse_document;

/// Read a piped input document from stdin.
///
/// Returns `None` when stdin is a terminal or the pipe is empty. A document
/// opening with `{` is read as JSON, anything else as YAML.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(
    buffer: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let is_yaml = !trimmed.starts_with('{');
    parse_document(trimmed, is_yaml, "stdin").map(Some)
}
