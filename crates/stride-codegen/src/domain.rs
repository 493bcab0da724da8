//! One domain's code accumulator and its merge rules.
//!
//! # Merge semantics
//!
//! `append(other)` merges field by field:
//!
//! - header/init/processing/cleanup text: concatenated in call order,
//!   never reordered
//! - post-processing fragments: appended, de-duplicated by exact text
//! - link targets/dirs and include files/dirs: concatenated, duplicates
//!   permitted
//! - global declaration references: de-duplicated by declaration name,
//!   first occurrence wins
//! - port-property tokens: keyed by (property name, port name), first
//!   occurrence wins
//! - pending output tokens: queued, consumed by the next synthesis stage
//!
//! `prepend(other)` mirrors the rule for header text, the declared-entity
//! list, and the link/include lists - structurally "outer" fragments
//! surface first in emitted headers - but **still appends** init,
//! processing, and cleanup text: executable statement order must track
//! the original left-to-right stream evaluation order no matter which
//! subtree contributed the surrounding declarations.
//!
//! Append is associative on the concatenable text fields, which is what
//! lets visitors merge bottom-up or top-down and land on the same code.

use indexmap::IndexMap;
use std::collections::VecDeque;
use stride_ast::Declaration;

/// Accumulated code fragments for one execution domain.
///
/// Lives only inside one generate pass: created empty on a domain's
/// first write, mutated through append/prepend, read once at emission,
/// then discarded. The serializable product is the emitted
/// [`GeneratedArtifact`](crate::GeneratedArtifact), not this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainCode {
    /// Declarations, includes, and forward declarations.
    pub header_code: String,
    /// One-time initialization statements.
    pub init_code: String,
    /// Per-tick processing statements.
    pub processing_code: String,
    /// Teardown statements.
    pub cleanup_code: String,
    /// Deferred fragments emitted after processing; exact-text unique.
    pub post_processing: Vec<String>,
    /// Library names handed to the linker.
    pub link_targets: Vec<String>,
    /// Linker search directories.
    pub link_dirs: Vec<String>,
    /// Files to include from generated sources.
    pub include_files: Vec<String>,
    /// Include search directories.
    pub include_dirs: Vec<String>,
    /// Referenced global declarations, keyed by declaration name.
    pub global_references: IndexMap<String, Declaration>,
    /// Resolved port-property tokens, keyed by (property name, port name).
    pub port_properties: IndexMap<(String, String), String>,
    /// Tokens queued for the next synthesis stage.
    pub pending_tokens: VecDeque<String>,
}

impl DomainCode {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a referenced global declaration; the first reference under
    /// a given name wins and later duplicates are dropped.
    pub fn add_global_reference(&mut self, decl: Declaration) {
        self.global_references.entry(decl.name.clone()).or_insert(decl);
    }

    /// Record a resolved port-property token; first occurrence wins.
    pub fn add_port_property(
        &mut self,
        property: impl Into<String>,
        port: impl Into<String>,
        token: impl Into<String>,
    ) {
        self.port_properties
            .entry((property.into(), port.into()))
            .or_insert_with(|| token.into());
    }

    /// Merge `other` after this accumulator's contents.
    pub fn append(&mut self, other: DomainCode) {
        self.header_code.push_str(&other.header_code);
        self.init_code.push_str(&other.init_code);
        self.processing_code.push_str(&other.processing_code);
        self.cleanup_code.push_str(&other.cleanup_code);

        for fragment in other.post_processing {
            if !self.post_processing.contains(&fragment) {
                self.post_processing.push(fragment);
            }
        }

        self.link_targets.extend(other.link_targets);
        self.link_dirs.extend(other.link_dirs);
        self.include_files.extend(other.include_files);
        self.include_dirs.extend(other.include_dirs);

        for (name, decl) in other.global_references {
            self.global_references.entry(name).or_insert(decl);
        }
        for (key, token) in other.port_properties {
            self.port_properties.entry(key).or_insert(token);
        }

        self.pending_tokens.extend(other.pending_tokens);
    }

    /// Merge `other` *before* this accumulator's declarative content.
    ///
    /// Header text and the declared-entity/link lists surface first;
    /// init/processing/cleanup are still appended (statement order is
    /// stream order, not nesting order).
    pub fn prepend(&mut self, other: DomainCode) {
        self.header_code = format!("{}{}", other.header_code, self.header_code);
        self.init_code.push_str(&other.init_code);
        self.processing_code.push_str(&other.processing_code);
        self.cleanup_code.push_str(&other.cleanup_code);

        let mut post = other.post_processing;
        for fragment in std::mem::take(&mut self.post_processing) {
            if !post.contains(&fragment) {
                post.push(fragment);
            }
        }
        self.post_processing = post;

        self.link_targets = prepend_list(other.link_targets, std::mem::take(&mut self.link_targets));
        self.link_dirs = prepend_list(other.link_dirs, std::mem::take(&mut self.link_dirs));
        self.include_files =
            prepend_list(other.include_files, std::mem::take(&mut self.include_files));
        self.include_dirs =
            prepend_list(other.include_dirs, std::mem::take(&mut self.include_dirs));

        let mut globals = other.global_references;
        for (name, decl) in std::mem::take(&mut self.global_references) {
            globals.entry(name).or_insert(decl);
        }
        self.global_references = globals;

        let mut port_props = other.port_properties;
        for (key, token) in std::mem::take(&mut self.port_properties) {
            port_props.entry(key).or_insert(token);
        }
        self.port_properties = port_props;

        self.pending_tokens.extend(other.pending_tokens);
    }
}

fn prepend_list(mut head: Vec<String>, mut tail: Vec<String>) -> Vec<String> {
    head.append(&mut tail);
    head
}
