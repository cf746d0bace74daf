// src/merge_base.rs

use crate::error::Result;
use crate::model::Commit;
use crate::repository::RepositoryQuery;
use std::cmp::Reverse;
use tracing::debug;

/// Youngest merge base between HEAD and any remote branch.
///
/// Branches already at HEAD, and merge bases equal to HEAD, say nothing about
/// where the current line of work forked and are skipped. On equal commit
/// times the branch listed first wins.
pub fn merge_base_commit(repo: &dyn RepositoryQuery) -> Result<Option<Commit>> {
    let head = repo.head()?;
    let mut bases = Vec::new();
    for branch in repo.list_remote_branches()? {
        if branch.target == head.id {
            continue;
        }
        if let Some(base) = merge_base(repo, &head.id, &branch.target)? {
            if base.id != head.id {
                debug!(branch = %branch.name, base = %base.id, "merge base candidate");
                bases.push(base);
            }
        }
    }
    Ok(bases.into_iter().min_by_key(|base| Reverse(base.time)))
}

/// Lowest common ancestor of two commits; unrelated histories yield `None`.
pub fn merge_base(repo: &dyn RepositoryQuery, a: &str, b: &str) -> Result<Option<Commit>> {
    repo.merge_base(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::TagFilter;
    use crate::model::{BranchRef, CommitId, DescribedTag, HeadRef, Tag};
    use crate::repository::{CommitIter, WalkQuery};
    use std::collections::HashMap;

    struct Branches {
        head: CommitId,
        branches: Vec<BranchRef>,
        bases: HashMap<CommitId, Commit>,
    }

    fn commit(id: &str, time: i64) -> Commit {
        Commit {
            id: id.into(),
            parents: Vec::new(),
            time,
            summary: String::new(),
            body: String::new(),
        }
    }

    fn branch(name: &str, target: &str) -> BranchRef {
        BranchRef {
            name: name.into(),
            target: target.into(),
        }
    }

    impl RepositoryQuery for Branches {
        fn resolve_ref(&self, _: &str) -> Result<Option<CommitId>> {
            unimplemented!()
        }

        fn head(&self) -> Result<HeadRef> {
            Ok(HeadRef {
                id: self.head.clone(),
                branch: Some("main".into()),
            })
        }

        fn find_commit(&self, _: &str) -> Result<Commit> {
            unimplemented!()
        }

        fn walk<'r>(&'r self, _: &WalkQuery) -> Result<CommitIter<'r>> {
            unimplemented!()
        }

        fn list_tags(&self) -> Result<Vec<Tag>> {
            Ok(Vec::new())
        }

        fn list_remote_branches(&self) -> Result<Vec<BranchRef>> {
            Ok(self.branches.clone())
        }

        fn merge_base(&self, a: &str, b: &str) -> Result<Option<Commit>> {
            assert_eq!(a, self.head);
            Ok(self.bases.get(b).cloned())
        }

        fn describe_nearest_tag(&self, _: &TagFilter) -> Result<Option<DescribedTag>> {
            Ok(None)
        }
    }

    #[test]
    fn picks_the_youngest_merge_base() {
        let repo = Branches {
            head: "head".into(),
            branches: vec![branch("origin/old", "old"), branch("origin/new", "new")],
            bases: HashMap::from([
                ("old".to_string(), commit("base-old", 100)),
                ("new".to_string(), commit("base-new", 200)),
            ]),
        };
        assert_eq!(merge_base_commit(&repo).unwrap().unwrap().id, "base-new");
    }

    #[test]
    fn ignores_branches_at_head_and_bases_equal_to_head() {
        let repo = Branches {
            head: "head".into(),
            branches: vec![
                branch("origin/main", "head"),
                branch("origin/behind", "behind"),
                branch("origin/other", "other"),
            ],
            bases: HashMap::from([
                ("behind".to_string(), commit("head", 900)),
                ("other".to_string(), commit("base", 10)),
            ]),
        };
        assert_eq!(merge_base_commit(&repo).unwrap().unwrap().id, "base");
    }

    #[test]
    fn equal_times_keep_the_first_branch() {
        let repo = Branches {
            head: "head".into(),
            branches: vec![branch("origin/a", "a"), branch("origin/b", "b")],
            bases: HashMap::from([
                ("a".to_string(), commit("base-a", 50)),
                ("b".to_string(), commit("base-b", 50)),
            ]),
        };
        assert_eq!(merge_base_commit(&repo).unwrap().unwrap().id, "base-a");
    }

    #[test]
    fn no_qualifying_branch_means_no_merge_base() {
        let repo = Branches {
            head: "head".into(),
            branches: vec![branch("origin/main", "head"), branch("origin/orphan", "orphan")],
            bases: HashMap::new(),
        };
        assert!(merge_base_commit(&repo).unwrap().is_none());
    }
}
