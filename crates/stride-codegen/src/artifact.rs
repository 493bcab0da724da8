//! The per-framework generated artifact.
//!
//! What a builder hands to its external build step: one source text per
//! domain plus the link and include lists accumulated across all domains.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Generated output for one framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Domain id → generated source text, in first-use order.
    pub sources: IndexMap<String, String>,
    /// Libraries for the external linker.
    pub link_targets: Vec<String>,
    /// Linker search directories.
    pub link_dirs: Vec<String>,
    /// Generated include files.
    pub include_files: Vec<String>,
    /// Include search directories.
    pub include_dirs: Vec<String>,
}

impl GeneratedArtifact {
    /// True when no domain produced any source.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Apply per-framework key/value substitutions to every source text.
    ///
    /// Substitution keys appear in generated text as `%key%`.
    pub fn substitute(&mut self, substitutions: &IndexMap<String, String>) {
        if substitutions.is_empty() {
            return;
        }
        for source in self.sources.values_mut() {
            for (key, value) in substitutions {
                let needle = format!("%{key}%");
                if source.contains(&needle) {
                    *source = source.replace(&needle, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution() {
        let mut artifact = GeneratedArtifact::default();
        artifact
            .sources
            .insert("audio".to_string(), "rate = %sample_rate%;".to_string());

        let mut subs = IndexMap::new();
        subs.insert("sample_rate".to_string(), "48000".to_string());
        artifact.substitute(&subs);

        assert_eq!(artifact.sources["audio"], "rate = 48000;");
    }

    #[test]
    fn test_substitution_ignores_missing_keys() {
        let mut artifact = GeneratedArtifact::default();
        artifact
            .sources
            .insert("audio".to_string(), "plain text".to_string());

        let mut subs = IndexMap::new();
        subs.insert("unused".to_string(), "x".to_string());
        artifact.substitute(&subs);

        assert_eq!(artifact.sources["audio"], "plain text");
    }
}
