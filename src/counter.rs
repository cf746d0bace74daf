// src/counter.rs

use crate::error::{Error, Result};
use crate::history::{self, LogScope};
use crate::repository::{self, RepositoryQuery};
use crate::resolver::CommitCountProvider;
use tracing::warn;

/// Counts the commits that belong to one project of a multi-project
/// repository: those touching its own directory but not a nested subproject.
#[derive(Debug, Clone, Default)]
pub struct SubprojectCounter {
    project_path: String,
    subproject_paths: Vec<String>,
}

impl SubprojectCounter {
    pub fn new(project_path: impl Into<String>, subproject_paths: Vec<String>) -> Self {
        SubprojectCounter {
            project_path: project_path.into(),
            subproject_paths,
        }
    }

    /// Commits after `tag` within the project's scope.
    ///
    /// An unknown tag counts from the first commit of the repository. `None`
    /// means there is no scope to count in, or the scoped walk came back empty.
    pub fn count(&self, repo: &dyn RepositoryQuery, tag: &str) -> Result<Option<usize>> {
        if self.project_path.is_empty() && self.subproject_paths.is_empty() {
            return Ok(None);
        }

        let start = match repository::tag_to_commit_map(repo, None)?.get(tag) {
            Some(id) => repo.find_commit(id)?,
            None => history::first_commit(repo)?.ok_or(Error::UnbornHead)?,
        };
        let head = repo.head()?;
        let scope = LogScope {
            path_filter: Some(self.project_path.clone()).filter(|p| !p.is_empty()),
            exclude_paths: self.subproject_paths.clone(),
            exclude_ancestors_of: None,
        };

        let mut walked = 0usize;
        let mut after_start = 0usize;
        for commit in history::commit_log(repo, &start, &head.id, &scope)? {
            walked += 1;
            if commit?.id != start.id {
                after_start += 1;
            }
        }

        if walked == 0 {
            warn!(tag, "failed to count commits for tag");
            return Ok(None);
        }
        Ok(Some(after_start))
    }

    /// [`count`](Self::count) with failures folded into `-1`.
    pub fn count_or_sentinel(&self, repo: &dyn RepositoryQuery, tag: &str) -> i64 {
        match self.count(repo, tag) {
            Ok(Some(count)) => count as i64,
            Ok(None) => -1,
            Err(err) => {
                warn!(tag, %err, "subproject commit count failed");
                -1
            }
        }
    }
}

impl CommitCountProvider for SubprojectCounter {
    fn commit_count(&self, repo: &dyn RepositoryQuery, tag: &str) -> Result<Option<usize>> {
        self.count(repo, tag)
    }
}
