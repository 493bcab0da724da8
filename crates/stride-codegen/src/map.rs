//! Routing merges to the right domain.
//!
//! A [`DomainCodeMap`] keys accumulators by domain id and lazily creates
//! an empty accumulator on first use, so visitors can treat "merge this
//! fragment into its domain" as one call without pre-registering domains.

use crate::artifact::GeneratedArtifact;
use crate::domain::DomainCode;
use indexmap::IndexMap;

/// Domain-id → accumulator map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainCodeMap {
    domains: IndexMap<String, DomainCode>,
}

impl DomainCodeMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment into the addressed domain's accumulator.
    pub fn append(&mut self, domain_id: &str, code: DomainCode) {
        self.entry(domain_id).append(code);
    }

    /// Prepend a fragment into the addressed domain's accumulator.
    pub fn prepend(&mut self, domain_id: &str, code: DomainCode) {
        self.entry(domain_id).prepend(code);
    }

    /// The accumulator for a domain, created empty on first use.
    pub fn entry(&mut self, domain_id: &str) -> &mut DomainCode {
        self.domains.entry(domain_id.to_string()).or_default()
    }

    /// Read access to a domain's accumulator.
    pub fn get(&self, domain_id: &str) -> Option<&DomainCode> {
        self.domains.get(domain_id)
    }

    /// Domain ids in first-use order.
    pub fn domain_ids(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Number of domains touched so far.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// True when no domain has been touched.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Merge a whole map into this one, domain by domain.
    pub fn merge(&mut self, other: DomainCodeMap) {
        for (domain_id, code) in other.domains {
            self.entry(&domain_id).append(code);
        }
    }

    /// Emit the final artifact: one source text per domain plus the
    /// accumulated link/include lists. Consumes the map - accumulators
    /// are read once and discarded.
    pub fn into_artifact(self) -> GeneratedArtifact {
        let mut artifact = GeneratedArtifact::default();

        for (domain_id, code) in self.domains {
            let mut source = String::new();
            source.push_str(&code.header_code);
            source.push_str(&code.init_code);
            source.push_str(&code.processing_code);
            for fragment in &code.post_processing {
                source.push_str(fragment);
            }
            source.push_str(&code.cleanup_code);

            artifact.sources.insert(domain_id, source);
            artifact.link_targets.extend(code.link_targets);
            artifact.link_dirs.extend(code.link_dirs);
            artifact.include_files.extend(code.include_files);
            artifact.include_dirs.extend(code.include_dirs);
        }

        artifact
    }
}
