//! Rule and method types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How a remote file is represented in the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Not mirrored
    Ignore,
    /// Full byte-for-byte copy
    Copy,
    /// Symbolic link to the mounted source file
    Symlink,
    /// `.strm` pointer file holding a playback reference
    Strm,
    /// Zero-length placeholder
    Virtual,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Copy => "copy",
            Self::Symlink => "symlink",
            Self::Strm => "strm",
            Self::Virtual => "virtual",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named group of extensions sharing one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    /// Exact-match extensions including the leading dot (`.mp4`)
    pub extensions: BTreeSet<String>,
    pub method: Method,
}

impl Rule {
    pub fn new<I, S>(name: impl Into<String>, extensions: I, method: Method) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            method,
        }
    }

    pub fn matches(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}
