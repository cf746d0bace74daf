// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while deriving versions from a repository.
#[derive(Error, Debug)]
pub enum Error {
    /// Any libgit2 failure: opening the repository, walking, resolving refs.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scanning the project tree for subprojects failed.
    #[error("failed to scan for subprojects: {0}")]
    Walk(#[from] walkdir::Error),

    /// A tag match filter is not a valid glob.
    #[error("invalid tag filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// No tag reachable from HEAD satisfies the prefix and glob filters.
    #[error("no tag matches (tag prefix: '{prefix}', glob filters: [{filters}])")]
    NoMatchingTag { prefix: String, filters: String },

    #[error(
        "project directory {} must be inside the repository root {}",
        .project.display(),
        .root.display()
    )]
    ProjectOutsideRoot { root: PathBuf, project: PathBuf },

    /// HEAD points at a branch without commits.
    #[error("HEAD does not point to a commit")]
    UnbornHead,
}

pub type Result<T> = std::result::Result<T, Error>;
