// src/project.rs

use crate::counter::SubprojectCounter;
use crate::error::{Error, Result};
use crate::model::VersionRecord;
use crate::repository::{GitRepository, RepositoryQuery, SessionOptions};
use crate::resolver::VersionResolver;
use crate::subprojects::{self, MarkerLocator, SubprojectLocator, DEFAULT_IGNORE_FILE};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Everything needed to derive the version of one project
#[derive(Debug, Clone)]
pub struct VersionConfig {
    /// Repository root; found by searching upwards for `.git` when unset
    pub root: Option<PathBuf>,
    pub project: PathBuf,
    /// File names that mark a directory as its own project
    pub markers: Vec<String>,
    /// File names that stop a marked directory from counting as a project
    pub ignore_files: Vec<String>,
    pub ignore_dirs: Vec<String>,
    /// Defaults to the project's path inside the repository
    pub tag_prefix: Option<String>,
    pub match_filters: Vec<String>,
    pub session: SessionOptions,
}

impl VersionConfig {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        VersionConfig {
            root: None,
            project: project.into(),
            markers: Vec::new(),
            ignore_files: vec![DEFAULT_IGNORE_FILE.to_string()],
            ignore_dirs: Vec::new(),
            tag_prefix: None,
            match_filters: Vec::new(),
            session: SessionOptions::default(),
        }
    }

    pub fn locator(&self) -> MarkerLocator {
        MarkerLocator {
            markers: self.markers.clone(),
            ignore_files: self.ignore_files.clone(),
            ignore_dirs: self.ignore_dirs.clone(),
        }
    }
}

/// Version information for a project inside a (possibly shared) repository.
///
/// The record is computed on first access and cached until the tag prefix or
/// the match filters change.
#[derive(Debug)]
pub struct GitVersion {
    root: PathBuf,
    project: PathBuf,
    local_path: String,
    subprojects: Vec<String>,
    resolver: VersionResolver,
    session: SessionOptions,
    info: Option<VersionRecord>,
}

impl GitVersion {
    pub fn new(config: VersionConfig) -> Result<Self> {
        let locator = config.locator();
        Self::with_locator(config, &locator)
    }

    pub fn with_locator(config: VersionConfig, locator: &dyn SubprojectLocator) -> Result<Self> {
        let project = config.project.canonicalize()?;
        let root = match &config.root {
            Some(root) => root.canonicalize()?,
            None => subprojects::find_git_root(&project),
        };
        if !project.starts_with(&root) {
            return Err(Error::ProjectOutsideRoot { root, project });
        }

        let local_path = subprojects::local_path(&root, &project);
        let subprojects = locator.locate(&root, &project)?;
        let tag_prefix = config.tag_prefix.as_deref().unwrap_or(&local_path);
        let resolver = VersionResolver::new(Some(tag_prefix), config.match_filters);
        debug!(
            root = %root.display(),
            local_path = %local_path,
            tag_prefix = resolver.tag_prefix(),
            ?subprojects,
            "configured project"
        );

        Ok(GitVersion {
            root,
            project,
            local_path,
            subprojects,
            resolver,
            session: config.session,
            info: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    /// The project's path inside the repository, empty for the root project.
    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    pub fn subproject_paths(&self) -> &[String] {
        &self.subprojects
    }

    pub fn tag_prefix(&self) -> &str {
        self.resolver.tag_prefix()
    }

    pub fn match_filters(&self) -> &[String] {
        self.resolver.match_filters()
    }

    pub fn set_tag_prefix(&mut self, tag_prefix: Option<&str>) {
        self.resolver = VersionResolver::new(tag_prefix, self.resolver.match_filters().to_vec());
        self.info = None;
    }

    pub fn set_match_filters(&mut self, match_filters: Vec<String>) {
        self.resolver = VersionResolver::new(Some(self.resolver.tag_prefix()), match_filters);
        self.info = None;
    }

    /// Counter limited to this project's directory minus its subprojects.
    pub fn counter(&self) -> SubprojectCounter {
        SubprojectCounter::new(self.local_path.clone(), self.subprojects.clone())
    }

    /// Commits of this project since its nearest tag, counted inside its own
    /// directory and outside its subprojects; `-1` when there is nothing to
    /// scope or the count fails.
    pub fn scoped_commit_count(&self) -> i64 {
        let repo = match self.open() {
            Ok(repo) => repo,
            Err(err) => {
                warn!(root = %self.root.display(), %err, "failed to open repository");
                return -1;
            }
        };
        // no eligible tag counts from the first commit
        let described = self
            .resolver
            .tag_filter()
            .and_then(|filter| repo.describe_nearest_tag(&filter));
        let tag = match described {
            Ok(described) => described.map(|d| d.tag).unwrap_or_default(),
            Err(err) => {
                warn!(%err, "failed to describe HEAD for counting");
                return -1;
            }
        };
        self.counter().count_or_sentinel(&repo, &tag)
    }

    pub fn open(&self) -> Result<GitRepository> {
        GitRepository::open_with(&self.root, self.session)
    }

    /// The cached [`VersionRecord`], [`VersionRecord::empty`] when the
    /// repository cannot be read.
    pub fn info(&mut self) -> &VersionRecord {
        let record = match self.info.take() {
            Some(record) => record,
            None => self.compute(),
        };
        self.info.insert(record)
    }

    fn compute(&self) -> VersionRecord {
        match self.open() {
            Ok(repo) => self.resolver.resolve(&repo, &self.counter()),
            Err(err) => {
                error!(root = %self.root.display(), %err, "failed to open repository");
                VersionRecord::empty()
            }
        }
    }
}
