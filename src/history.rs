// src/history.rs

use crate::error::Result;
use crate::model::{Commit, CommitId};
use crate::repository::{CommitIter, RepositoryQuery, WalkQuery};

/// Optional narrowing of a history walk
#[derive(Debug, Clone, Default)]
pub struct LogScope {
    /// Keep only commits touching this repository-relative path
    pub path_filter: Option<String>,
    /// Drop commits whose changes all sit inside these subtrees
    pub exclude_paths: Vec<String>,
    /// Additionally drop everything reachable from this commit
    pub exclude_ancestors_of: Option<CommitId>,
}

/// Commits from `start` (inclusive) up to `end`, youngest first.
///
/// Everything reachable from a parent of `start` is hidden, so passing a
/// tagged commit yields that tag and everything built on top of it. A root
/// `start` hides nothing.
pub fn commit_log<'r>(repo: &'r dyn RepositoryQuery, start: &Commit, end: &str, scope: &LogScope) -> Result<CommitIter<'r>> {
    let mut hide = start.parents.clone();
    hide.extend(scope.exclude_ancestors_of.iter().cloned());

    repo.walk(&WalkQuery {
        include: vec![end.to_string()],
        hide,
        path_filter: scope.path_filter.clone(),
        exclude_paths: scope.exclude_paths.clone(),
    })
}

/// The oldest commit reachable from HEAD.
pub fn first_commit(repo: &dyn RepositoryQuery) -> Result<Option<Commit>> {
    let head = repo.head()?;
    let mut oldest = None;
    for commit in repo.walk(&WalkQuery {
        include: vec![head.id],
        ..WalkQuery::default()
    })? {
        oldest = Some(commit?);
    }
    Ok(oldest)
}
