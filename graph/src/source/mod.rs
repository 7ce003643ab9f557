//! Commit sources: where the builder gets history from.
//!
//! A source lists the references of a repository and walks the history
//! behind each one, newest commit first. [`GitWalker`](crate::git_backend::GitWalker)
//! reads a git repository; [`MemorySource`] serves a hand-written history.

pub mod memory;

pub use memory::MemorySource;

use crate::core::CommitId;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One commit as reported by a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: CommitId,
    /// Parent ids in declaration order
    pub parents: Vec<CommitId>,
}

impl CommitRecord {
    pub fn new(id: impl Into<CommitId>, parents: impl IntoIterator<Item = CommitId>) -> Self {
        Self {
            id: id.into(),
            parents: parents.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    LocalBranch,
    RemoteBranch,
    /// Symbolic `refs/remotes/<remote>/HEAD` alias
    RemoteHead,
    Tag,
    Other,
}

/// A named reference whose history can be walked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    /// Full name, e.g. `refs/heads/main`
    pub name: String,
    pub kind: RefKind,
}

impl BranchRef {
    pub fn from_full_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = if name.starts_with("refs/heads/") {
            RefKind::LocalBranch
        } else if name.starts_with("refs/tags/") {
            RefKind::Tag
        } else if let Some(rest) = name.strip_prefix("refs/remotes/") {
            if rest.ends_with("/HEAD") {
                RefKind::RemoteHead
            } else {
                RefKind::RemoteBranch
            }
        } else {
            RefKind::Other
        };
        Self { name, kind }
    }

    /// Name without the `refs/<namespace>/` prefix
    pub fn shorthand(&self) -> &str {
        ["refs/heads/", "refs/remotes/", "refs/tags/", "refs/"]
            .iter()
            .find_map(|prefix| self.name.strip_prefix(*prefix))
            .unwrap_or(&self.name)
    }
}

/// Supplies commit history to the graph builder.
pub trait CommitSource {
    /// Every reference in the repository, unfiltered
    fn references(&self) -> Result<Vec<BranchRef>>;

    /// Commits reachable from `reference`, newest first
    fn iter_commits<'a>(
        &'a self,
        reference: &BranchRef,
    ) -> Result<Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>>;

    /// Look up a single commit; `Ok(None)` when the source does not have it
    fn find_commit(&self, id: &CommitId) -> Result<Option<CommitRecord>>;
}

/// Decides which references the builder walks.
///
/// Tags and remote HEAD aliases point at commits some branch already
/// covers, so both are skipped by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefFilter {
    pub exclude_tags: bool,
    pub exclude_remote_head: bool,
    /// Full names, shorthands, or prefixes ending in `/`
    pub exclude: Vec<String>,
}

impl Default for RefFilter {
    fn default() -> Self {
        Self {
            exclude_tags: true,
            exclude_remote_head: true,
            exclude: Vec::new(),
        }
    }
}

impl RefFilter {
    pub fn accepts(&self, reference: &BranchRef) -> bool {
        match reference.kind {
            RefKind::Tag if self.exclude_tags => return false,
            RefKind::RemoteHead if self.exclude_remote_head => return false,
            _ => {}
        }

        !self.exclude.iter().any(|pattern| {
            if pattern.ends_with('/') {
                reference.name.starts_with(pattern.as_str())
                    || reference.shorthand().starts_with(pattern.as_str())
            } else {
                reference.name == *pattern || reference.shorthand() == pattern.as_str()
            }
        })
    }

    /// Filter and sort references by name
    pub fn select(&self, references: Vec<BranchRef>) -> Vec<BranchRef> {
        let mut selected: Vec<BranchRef> = references
            .into_iter()
            .filter(|reference| {
                let keep = self.accepts(reference);
                if !keep {
                    tracing::debug!(reference = %reference.name, "skipping reference");
                }
                keep
            })
            .collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name));
        selected.dedup_by(|a, b| a.name == b.name);
        selected
    }
}
