use crate::error::FileError;
use std::path::{Path, PathBuf};

/// Separator between a line number and the line text
const LINE_NUMBER_SEPARATOR: &str = ": ";

/// Resolve a finding's file against the source root
///
/// Leading separators are dropped so an absolute path still lands under `base`.
pub fn source_path(base: &Path, relative: &str) -> PathBuf {
    base.join(relative.trim_start_matches(['/', '\\']))
}

/// Prefix every line with its 1-based line number
///
/// Splits on `\n` only, so a trailing newline produces a final empty
/// numbered line and `\r` stays attached to its line.
pub fn number_lines(text: &str) -> String {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| format!("{}{}{}", idx + 1, LINE_NUMBER_SEPARATOR, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`number_lines`]
#[cfg(test)]
pub fn strip_line_numbers(numbered: &str) -> String {
    numbered
        .split('\n')
        .map(|line| {
            line.split_once(LINE_NUMBER_SEPARATOR)
                .filter(|(number, _)| {
                    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
                })
                .map(|(_, rest)| rest)
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a file and return its line-numbered text
pub async fn read_numbered(base: &Path, relative: &str) -> Result<String, FileError> {
    let path = source_path(base, relative);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| FileError::Read { path, source })?;
    Ok(number_lines(&content))
}

/// Replace the whole content of a file
pub async fn write_all(base: &Path, relative: &str, content: &str) -> Result<(), FileError> {
    let path = source_path(base, relative);
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| FileError::Write { path, source })
}
