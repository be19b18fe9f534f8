//! Scope file codec.
//!
//! The same textual shape is used two ways:
//! - **load**: each line is a gitignore pattern evaluated against the file tree
//! - **export**: each line is the root-relative path of a marked file, written
//!   as an anchored, escaped pattern
//!
//! Exported files re-load as patterns that select exactly the exported files.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use thiserror::Error;

use super::fs::FileSystem;

#[derive(Error, Debug)]
pub enum ScopeFileError {
    #[error("Failed to read scope file {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write scope file {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Split scope file text into pattern lines, dropping blank lines.
///
/// Accepts both `\n` and `\r\n` terminators.
pub fn decode_patterns(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Join root-relative paths into scope file text, one per line, always with
/// forward slashes.
///
/// Each line is written as a pattern matching only that path: anchored to
/// the root with a leading `/`, glob metacharacters and trailing spaces
/// escaped with `\`.
pub fn encode_marked<S: AsRef<str>>(paths: &[S]) -> String {
    paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            if cfg!(windows) {
                literal_pattern(&p.replace('\\', "/"))
            } else {
                literal_pattern(p)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gitignore pattern selecting exactly the root-relative `path`
fn literal_pattern(path: &str) -> String {
    let body = path.trim_end_matches(' ');
    let trailing_spaces = path.len() - body.len();

    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('/');
    for c in body.chars() {
        if matches!(c, '\\' | '*' | '?' | '[' | ']' | '{' | '}') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    for _ in 0..trailing_spaces {
        pattern.push_str("\\ ");
    }
    pattern
}

/// Read the pattern lines of a scope file.
///
/// A missing file is `Ok(None)`: nothing to load, not an error.
pub async fn read_patterns(
    fs: &dyn FileSystem,
    path: &Utf8Path,
) -> Result<Option<Vec<String>>, ScopeFileError> {
    if !fs.exists(path).await {
        return Ok(None);
    }

    let text = fs
        .read_to_string(path)
        .await
        .map_err(|source| ScopeFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(decode_patterns(&text)))
}

/// Overwrite `path` with the encoded list of marked paths.
pub async fn write_marked<S: AsRef<str> + Sync>(
    fs: &dyn FileSystem,
    path: &Utf8Path,
    relative_paths: &[S],
) -> Result<(), ScopeFileError> {
    fs.write(path, &encode_marked(relative_paths))
        .await
        .map_err(|source| ScopeFileError::Write {
            path: path.to_path_buf(),
            source,
        })
}
