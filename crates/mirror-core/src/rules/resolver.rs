//! Extension lookup over a validated rule table

use std::collections::HashMap;

use mirror_fs::NormalizedPath;

use super::rule::{Method, Rule};
use crate::error::ConfigurationError;

/// Suffix appended to files mirrored with [`Method::Strm`]
pub const STRM_SUFFIX: &str = ".strm";

/// Maps file extensions to materialization methods.
///
/// Built once per task from its ordered rule table. Construction validates
/// the table, so lookups never re-check for conflicts.
#[derive(Debug, Clone, Default)]
pub struct RuleResolver {
    by_extension: HashMap<String, Method>,
}

impl RuleResolver {
    /// Validate `rules` and index them by extension.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateExtensionMapping` if an extension is claimed by two
    /// rules with different methods, or `InvalidExtension` for entries that
    /// can never match a file name.
    pub fn new(rules: &[Rule]) -> Result<Self, ConfigurationError> {
        Self::validate(rules)?;

        let mut by_extension = HashMap::new();
        for rule in rules {
            for extension in &rule.extensions {
                // First rule wins; validation guarantees any repeat agrees
                by_extension.entry(extension.clone()).or_insert(rule.method);
            }
        }
        Ok(Self { by_extension })
    }

    /// Check a rule table without building a resolver.
    pub fn validate(rules: &[Rule]) -> Result<(), ConfigurationError> {
        let mut seen: HashMap<&str, Method> = HashMap::new();
        for rule in rules {
            for extension in &rule.extensions {
                if !is_valid_extension(extension) {
                    return Err(ConfigurationError::InvalidExtension {
                        rule: rule.name.clone(),
                        extension: extension.clone(),
                    });
                }
                match seen.get(extension.as_str()) {
                    Some(&first) if first != rule.method => {
                        return Err(ConfigurationError::DuplicateExtensionMapping {
                            extension: extension.clone(),
                            first,
                            second: rule.method,
                        });
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(extension, rule.method);
                    }
                }
            }
        }
        Ok(())
    }

    /// Method for a source-side path, `Ignore` when no rule claims its extension.
    pub fn resolve(&self, path: &NormalizedPath) -> Method {
        path.extension()
            .and_then(|ext| self.by_extension.get(ext))
            .copied()
            .unwrap_or(Method::Ignore)
    }

    /// Method for a mirror-side path, plus the source path it stands for.
    ///
    /// A `.strm` file whose stem resolves to [`Method::Strm`] is attributed to
    /// that stem, so both diff passes read the same rule table.
    pub fn resolve_mirrored(&self, path: &NormalizedPath) -> (Method, NormalizedPath) {
        if let Some(stem) = path.strip_suffix(STRM_SUFFIX)
            && self.resolve(&stem) == Method::Strm
        {
            return (Method::Strm, stem);
        }
        (self.resolve(path), path.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

fn is_valid_extension(extension: &str) -> bool {
    extension.len() > 1
        && extension.starts_with('.')
        && !extension[1..].contains(['.', '/', '\\'])
}
