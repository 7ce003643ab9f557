use crate::core::CommitId;
use crate::error::{GraphError, Result};
use crate::source::{BranchRef, CommitRecord, CommitSource};
use git2::{Commit, ErrorCode, Oid, Repository, Sort};
use std::path::Path;

/// Reads commit history out of a git repository
pub struct GitWalker {
    repo: Repository,
}

impl GitWalker {
    /// Open the repository at `repo_path`, or discover it from the
    /// environment when no path is given
    pub fn new(repo_path: Option<&Path>) -> Result<Self> {
        let repo = match repo_path {
            Some(path) => Repository::open(path),
            None => Repository::open_from_env(),
        }?;

        Ok(Self { repo })
    }

    /// Convert a git2::Commit to a CommitRecord
    fn commit_to_record(commit: &Commit) -> CommitRecord {
        CommitRecord::new(commit.id(), commit.parent_ids().map(CommitId::from))
    }

    fn tip_of(&self, reference: &BranchRef) -> Result<Oid> {
        let found = self.repo.find_reference(&reference.name)?;
        let commit = found.peel_to_commit().map_err(|err| GraphError::Source {
            reference: reference.name.clone(),
            message: err.message().to_string(),
        })?;
        Ok(commit.id())
    }
}

impl CommitSource for GitWalker {
    fn references(&self) -> Result<Vec<BranchRef>> {
        let mut refs = Vec::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            match reference.name() {
                // HEAD itself aliases a branch
                Some(name) if !name.starts_with("refs/") => continue,
                Some(name) => refs.push(BranchRef::from_full_name(name)),
                None => tracing::warn!("skipping reference with a non UTF-8 name"),
            }
        }
        Ok(refs)
    }

    fn iter_commits<'a>(
        &'a self,
        reference: &BranchRef,
    ) -> Result<Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>> {
        let tip = self.tip_of(reference)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip)?;

        let repo = &self.repo;
        Ok(Box::new(revwalk.map(move |oid| -> Result<CommitRecord> {
            let commit = repo.find_commit(oid?)?;
            Ok(Self::commit_to_record(&commit))
        })))
    }

    fn find_commit(&self, id: &CommitId) -> Result<Option<CommitRecord>> {
        let Ok(oid) = Oid::from_str(id.as_str()) else {
            return Ok(None);
        };
        match self.repo.find_commit(oid) {
            Ok(commit) => Ok(Some(Self::commit_to_record(&commit))),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::source::RefKind;
    use anyhow::Result;
    use git2::Signature;
    use tempfile::TempDir;

    fn create_test_repo() -> Result<(TempDir, Repository)> {
        let dir = TempDir::new()?;
        let repo = Repository::init(dir.path())?;

        // Configure repo
        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok((dir, repo))
    }

    fn commit_to_repo(repo: &Repository, message: &str, parents: &[&Commit], update_ref: Option<&str>) -> Result<Oid> {
        let sig = Signature::now("Test User", "test@example.com")?;
        let tree_id = {
            let mut index = repo.index()?;
            index.write_tree()?
        };
        let tree = repo.find_tree(tree_id)?;

        Ok(repo.commit(
            update_ref,
            &sig,
            &sig,
            message,
            &tree,
            parents,
        )?)
    }

    fn open(dir: &TempDir) -> Result<GitWalker> {
        Ok(GitWalker::new(Some(dir.path()))?)
    }

    #[test]
    fn test_single_commit_dag() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        commit_to_repo(&repo, "Initial commit", &[], Some("HEAD"))?;

        let dag = GraphBuilder::new().build(&open(&dir)?)?;

        assert_eq!(dag.node_count(), 1);
        assert_eq!(dag.edge_count(), 0);
        assert_eq!(dag.roots().len(), 1);

        Ok(())
    }

    #[test]
    fn test_linear_history() -> Result<()> {
        let (dir, repo) = create_test_repo()?;

        let oid1 = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let commit1 = repo.find_commit(oid1)?;

        let oid2 = commit_to_repo(&repo, "Second commit", &[&commit1], Some("HEAD"))?;
        let commit2 = repo.find_commit(oid2)?;

        let _oid3 = commit_to_repo(&repo, "Third commit", &[&commit2], Some("HEAD"))?;

        let dag = GraphBuilder::new().build(&open(&dir)?)?;

        assert_eq!(dag.node_count(), 3);
        assert_eq!(dag.edge_count(), 2);
        assert_eq!(dag.roots().len(), 1);

        Ok(())
    }

    #[test]
    fn test_merge_across_branches() -> Result<()> {
        let (dir, repo) = create_test_repo()?;

        let base_oid = commit_to_repo(&repo, "Base commit", &[], Some("HEAD"))?;
        let base_commit = repo.find_commit(base_oid)?;

        // Side branch keeps its own tip, HEAD moves on
        let side_oid = commit_to_repo(&repo, "Side", &[&base_commit], None)?;
        let side_commit = repo.find_commit(side_oid)?;
        repo.branch("side", &side_commit, false)?;

        let main_oid = commit_to_repo(&repo, "Main", &[&base_commit], Some("HEAD"))?;
        let main_commit = repo.find_commit(main_oid)?;

        let merge_oid = commit_to_repo(&repo, "Merge", &[&main_commit, &side_commit], Some("HEAD"))?;

        let dag = GraphBuilder::new().build(&open(&dir)?)?;

        assert_eq!(dag.node_count(), 4);
        assert_eq!(dag.edge_count(), 4);

        let stats = dag.stats();
        assert_eq!(stats.merge_commits, 1);
        assert_eq!(stats.root_commits, 1);

        let base = dag.get(&base_oid.to_string()).expect("base node");
        assert_eq!(base.children.len(), 2);
        let merge = dag.get(&merge_oid.to_string()).expect("merge node");
        assert_eq!(merge.parents.len(), 2);

        Ok(())
    }

    #[test]
    fn test_tags_are_listed_but_not_walked() -> Result<()> {
        let (dir, repo) = create_test_repo()?;

        let base_oid = commit_to_repo(&repo, "Base", &[], Some("HEAD"))?;
        let base_commit = repo.find_commit(base_oid)?;
        // Tag a commit that no branch reaches
        let dangling_oid = commit_to_repo(&repo, "Dangling", &[&base_commit], None)?;
        let dangling = repo.find_commit(dangling_oid)?;
        repo.tag_lightweight("v1", dangling.as_object(), false)?;

        let walker = open(&dir)?;
        let refs = walker.references()?;
        assert!(refs.iter().any(|r| r.kind == RefKind::Tag));

        let dag = GraphBuilder::new().build(&walker)?;
        assert_eq!(dag.node_count(), 1);
        assert!(!dag.contains(&dangling_oid.to_string()));

        Ok(())
    }

    #[test]
    fn test_find_commit_missing() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        commit_to_repo(&repo, "Initial commit", &[], Some("HEAD"))?;

        let walker = open(&dir)?;
        let missing = CommitId::from("0000000000000000000000000000000000000001");
        assert!(walker.find_commit(&missing)?.is_none());
        assert!(walker.find_commit(&CommitId::from("not-a-sha"))?.is_none());

        Ok(())
    }

    #[test]
    fn test_empty_repository() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;

        let dag = GraphBuilder::new().build(&open(&dir)?)?;
        assert!(dag.is_empty());

        Ok(())
    }
}
