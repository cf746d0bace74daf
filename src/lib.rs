// src/lib.rs

//! Derives reproducible version numbers for the projects of a git repository
//! from its tags and commit history.
//!
//! [`GitVersion`] is the entry point for a single project; the [`mapper`],
//! [`prefix`] and [`changelog`] modules cover batch work over a whole history.

pub mod changelog;
pub mod counter;
pub mod describe;
pub mod error;
pub mod history;
pub mod mapper;
pub mod merge_base;
pub mod message;
pub mod model;
pub mod prefix;
pub mod project;
pub mod repository;
pub mod resolver;
pub mod subprojects;

pub use error::{Error, Result};
pub use model::{Commit, VersionRecord};
pub use project::{GitVersion, VersionConfig};
pub use repository::{GitRepository, RepositoryQuery, SessionOptions};
