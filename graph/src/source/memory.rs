use super::{BranchRef, CommitRecord, CommitSource};
use crate::core::CommitId;
use crate::error::Result;
use std::collections::{HashMap, HashSet};

/// In-memory history, for synthetic graphs and tests.
///
/// ```
/// use commit_graph::source::MemorySource;
///
/// let source = MemorySource::new()
///     .commit("A", &[])
///     .commit("B", &["A"])
///     .branch("main", "B");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    commits: HashMap<CommitId, Vec<CommitId>>,
    refs: Vec<(BranchRef, CommitId)>,
    depth: Option<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with its parents
    pub fn commit(mut self, id: &str, parents: &[&str]) -> Self {
        self.commits.insert(
            CommitId::from(id),
            parents.iter().map(|parent| CommitId::from(*parent)).collect(),
        );
        self
    }

    /// Add a local branch pointing at `tip`
    pub fn branch(self, name: &str, tip: &str) -> Self {
        self.reference(&format!("refs/heads/{name}"), tip)
    }

    /// Add a reference by full name (`refs/tags/...`, `refs/remotes/...`)
    pub fn reference(mut self, full_name: &str, tip: &str) -> Self {
        self.refs
            .push((BranchRef::from_full_name(full_name), CommitId::from(tip)));
        self
    }

    /// Same history with references listed in reverse order
    pub fn reversed_refs(mut self) -> Self {
        self.refs.reverse();
        self
    }

    /// Stop every walk after `depth` commits, like a shallow clone. The rest
    /// of the history stays reachable through `find_commit`.
    pub fn shallow(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    fn record(&self, id: &CommitId) -> Option<CommitRecord> {
        self.commits
            .get(id)
            .map(|parents| CommitRecord::new(id.clone(), parents.iter().cloned()))
    }
}

impl CommitSource for MemorySource {
    fn references(&self) -> Result<Vec<BranchRef>> {
        Ok(self.refs.iter().map(|(reference, _)| reference.clone()).collect())
    }

    fn iter_commits<'a>(
        &'a self,
        reference: &BranchRef,
    ) -> Result<Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>> {
        let tips = self
            .refs
            .iter()
            .filter(|(candidate, _)| candidate.name == reference.name)
            .map(|(_, tip)| tip.clone())
            .collect();

        let walk = MemoryWalk {
            source: self,
            stack: tips,
            seen: HashSet::new(),
        };
        Ok(match self.depth {
            Some(depth) => Box::new(walk.take(depth)),
            None => Box::new(walk),
        })
    }

    fn find_commit(&self, id: &CommitId) -> Result<Option<CommitRecord>> {
        Ok(self.record(id))
    }
}

/// Depth-first walk from a tip towards the roots. Commits unknown to the
/// source end the walk along that path.
struct MemoryWalk<'a> {
    source: &'a MemorySource,
    stack: Vec<CommitId>,
    seen: HashSet<CommitId>,
}

impl Iterator for MemoryWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if !self.seen.insert(id.clone()) {
                continue;
            }
            let Some(record) = self.source.record(&id) else {
                continue;
            };
            self.stack.extend(record.parents.iter().rev().cloned());
            return Some(Ok(record));
        }
        None
    }
}
