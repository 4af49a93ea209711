//! Remote source backed by a JSON-lines export dump

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::remote::{EntryStream, RemoteEntry, RemoteSource};
use crate::{Error, Result};

/// Reads remote listings exported as one JSON object per line:
///
/// ```text
/// {"key": "0", "parent_key": "", "name": "export"}
/// {"key": "1", "parent_key": "0", "name": "movies"}
/// ```
///
/// If `location` is a directory, the listing for root `media/movies` is read
/// from `media_movies.jsonl` inside it; otherwise the file is used for every root.
#[derive(Debug, Clone)]
pub struct ExportFileSource {
    location: PathBuf,
}

impl ExportFileSource {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// File holding the listing for `root`.
    pub fn listing_path(&self, root: &str) -> PathBuf {
        if !self.location.is_dir() {
            return self.location.clone();
        }
        let trimmed = root.trim_matches(['/', '\\']);
        let stem = if trimmed.is_empty() {
            "root".to_string()
        } else {
            trimmed.replace(['/', '\\'], "_")
        };
        self.location.join(format!("{stem}.jsonl"))
    }
}

impl RemoteSource for ExportFileSource {
    fn list_entries<'a>(&'a self, root: &str) -> Result<EntryStream<'a>> {
        let path = self.listing_path(root);
        let file = File::open(&path)
            .map_err(|e| Error::remote(format!("cannot open {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), root, "Reading remote export");
        Ok(Box::new(parse_lines(BufReader::new(file), path)))
    }
}

fn parse_lines(
    reader: impl BufRead,
    path: PathBuf,
) -> impl Iterator<Item = Result<RemoteEntry>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(idx, line)| parse_line(&path, idx + 1, line))
}

fn parse_line(
    path: &Path,
    line_no: usize,
    line: std::io::Result<String>,
) -> Option<Result<RemoteEntry>> {
    let line = match line {
        Ok(line) => line,
        Err(e) => {
            return Some(Err(Error::remote(format!(
                "{}:{}: read failed: {}",
                path.display(),
                line_no,
                e
            ))));
        }
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&line).map_err(|e| {
        Error::remote(format!("{}:{}: {}", path.display(), line_no, e))
    }))
}
