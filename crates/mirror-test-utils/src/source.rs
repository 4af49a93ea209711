//! Scripted remote listings.

use mirror_core::tree::{EntryStream, RemoteEntry, RemoteSource};
use mirror_core::{Error, Result};

/// A remote listing held in memory.
///
/// Entries are yielded in insertion order. A failure can be scripted to
/// happen before the stream starts or after a given number of entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<RemoteEntry>,
    fail_to_start: Option<String>,
    fail_after: Option<(usize, String)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing shaped like a drive export of `root`: a synthetic anchor,
    /// the root directory itself, then `files` with their parent directories.
    ///
    /// `files` are paths relative to the root directory, e.g. `"extras/a.srt"`.
    pub fn export_of(root_name: &str, files: &[&str]) -> Self {
        let mut source = Self::new().entry("anchor", "", "export");
        let mut next = 0usize;
        let mut dirs: Vec<(String, String)> = Vec::new();
        source = source.entry("root", "anchor", root_name);

        for file in files {
            let mut parent_key = "root".to_string();
            let mut prefix = String::new();
            let segments: Vec<&str> = file.split('/').collect();
            let (name, folders) = segments.split_last().unwrap();
            for folder in folders {
                prefix = if prefix.is_empty() {
                    folder.to_string()
                } else {
                    format!("{prefix}/{folder}")
                };
                if let Some((_, key)) = dirs.iter().find(|(path, _)| *path == prefix) {
                    parent_key = key.clone();
                    continue;
                }
                next += 1;
                let key = format!("d{next}");
                source = source.entry(&key, &parent_key, folder);
                dirs.push((prefix.clone(), key.clone()));
                parent_key = key;
            }
            next += 1;
            source = source.entry(&format!("f{next}"), &parent_key, name);
        }
        source
    }

    pub fn entry(mut self, key: &str, parent_key: &str, name: &str) -> Self {
        self.entries.push(RemoteEntry::new(key, parent_key, name));
        self
    }

    /// Refuse to start listing at all.
    pub fn unreachable(mut self, message: &str) -> Self {
        self.fail_to_start = Some(message.to_string());
        self
    }

    /// Break the stream after `count` entries.
    pub fn fail_after(mut self, count: usize, message: &str) -> Self {
        self.fail_after = Some((count, message.to_string()));
        self
    }
}

impl RemoteSource for MemorySource {
    fn list_entries<'a>(&'a self, _root: &str) -> Result<EntryStream<'a>> {
        if let Some(message) = &self.fail_to_start {
            return Err(Error::remote(message.clone()));
        }
        let limit = self.fail_after.as_ref().map(|(count, _)| *count);
        let entries = self
            .entries
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .map(Ok);
        let failure = self
            .fail_after
            .iter()
            .map(|(_, message)| Err(Error::remote(message.clone())));
        Ok(Box::new(entries.chain(failure)))
    }
}
