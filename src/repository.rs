// src/repository.rs

use crate::describe::{self, TagFilter};
use crate::error::{Error, Result};
use crate::model::*;
use git2::{BranchType, Config, ConfigLevel, Diff, ErrorCode, Oid, Repository, Revwalk, Sort};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lazy, newest-first sequence of commits produced by a walk
pub type CommitIter<'r> = Box<dyn Iterator<Item = Result<Commit>> + 'r>;

/// Boundaries and path filters for a history walk
#[derive(Debug, Clone, Default)]
pub struct WalkQuery {
    /// Commits whose ancestry is walked
    pub include: Vec<CommitId>,
    /// Commits whose ancestry (themselves included) is left out
    pub hide: Vec<CommitId>,
    /// Only commits touching this repository-relative path
    pub path_filter: Option<String>,
    /// Commits that only touch these subtrees are dropped
    pub exclude_paths: Vec<String>,
}

/// Everything the version engine needs to know about a repository.
///
/// The engine never reads repository storage itself; [`GitRepository`] is the
/// libgit2 backed implementation and tests substitute their own.
pub trait RepositoryQuery {
    /// Resolves a revision (ref name, tag, hex id) to the commit it points at.
    fn resolve_ref(&self, name: &str) -> Result<Option<CommitId>>;

    fn head(&self) -> Result<HeadRef>;

    fn find_commit(&self, id: &str) -> Result<Commit>;

    fn head_commit(&self) -> Result<Commit> {
        let head = self.head()?;
        self.find_commit(&head.id)
    }

    fn walk<'r>(&'r self, query: &WalkQuery) -> Result<CommitIter<'r>>;

    /// All tags, peeled to commits, ordered by name.
    fn list_tags(&self) -> Result<Vec<Tag>>;

    fn list_remote_branches(&self) -> Result<Vec<BranchRef>>;

    /// Best common ancestor of two commits, `None` when the histories are unrelated.
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<Commit>>;

    /// Nearest tag reachable from HEAD that passes `filter`.
    fn describe_nearest_tag(&self, filter: &TagFilter) -> Result<Option<DescribedTag>>;
}

/// Per-session settings for a repository handle
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Build the session config without the system-wide gitconfig
    pub ignore_system_config: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            ignore_system_config: true,
        }
    }
}

/// A libgit2 repository plus the configuration snapshot of this session.
pub struct GitRepository {
    repo: Repository,
    config: Config,
}

impl GitRepository {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, SessionOptions::default())
    }

    pub fn open_with(path: &Path, options: SessionOptions) -> Result<Self> {
        let repo = Repository::open(path)?;
        let config = session_config(&repo, options)?;
        debug!(path = %path.display(), ?options, "opened repository");
        Ok(GitRepository { repo, config })
    }

    /// The underlying libgit2 handle, for callers needing more than
    /// [`RepositoryQuery`] offers.
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// The session config the handle reads settings such as `core.abbrev` from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Minimum length of abbreviated object ids (`core.abbrev`, default 7).
    pub fn abbrev_len(&self) -> usize {
        self.config
            .get_i32("core.abbrev")
            .ok()
            .map(|len| len.clamp(4, 40) as usize)
            .unwrap_or(7)
    }

    fn head_oid(&self) -> Result<Oid> {
        match self.repo.head() {
            Ok(head) => Ok(head.peel_to_commit()?.id()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Err(Error::UnbornHead),
            Err(e) => Err(e.into()),
        }
    }
}

/// Scopes each session to its own config instead of touching libgit2's
/// process-wide search paths.
fn session_config(repo: &Repository, options: SessionOptions) -> Result<Config> {
    if !options.ignore_system_config {
        return Ok(repo.config()?);
    }

    let mut config = Config::new()?;
    if let Ok(path) = Config::find_xdg() {
        config.add_file(&path, ConfigLevel::XDG, false)?;
    }
    if let Ok(path) = Config::find_global() {
        config.add_file(&path, ConfigLevel::Global, false)?;
    }
    let local = repo.path().join("config");
    if local.exists() {
        config.add_file(&local, ConfigLevel::Local, false)?;
    }
    Ok(config)
}

impl RepositoryQuery for GitRepository {
    fn resolve_ref(&self, name: &str) -> Result<Option<CommitId>> {
        match self.repo.revparse_single(name) {
            Ok(object) => Ok(Some(object.peel_to_commit()?.id().to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn head(&self) -> Result<HeadRef> {
        let id = self.head_oid()?.to_string();
        let head = self.repo.find_reference("HEAD")?;
        let branch = head.symbolic_target().map(shorten_ref_name);
        Ok(HeadRef { id, branch })
    }

    fn find_commit(&self, id: &str) -> Result<Commit> {
        let commit = self.repo.find_commit(Oid::from_str(id)?)?;
        Ok(to_commit(&commit))
    }

    fn walk<'r>(&'r self, query: &WalkQuery) -> Result<CommitIter<'r>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        for id in &query.include {
            revwalk.push(Oid::from_str(id)?)?;
        }
        for id in &query.hide {
            revwalk.hide(Oid::from_str(id)?)?;
        }

        Ok(Box::new(CommitWalk {
            repo: &self.repo,
            revwalk,
            scope: PathScope::new(query.path_filter.as_deref(), &query.exclude_paths),
        }))
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = Vec::new();
        let names = self.repo.tag_names(None)?;
        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{name}"))?;
            let target = match reference.peel_to_commit() {
                Ok(commit) => commit.id().to_string(),
                Err(e) => {
                    debug!(tag = name, error = %e, "skipping tag that does not point at a commit");
                    continue;
                }
            };
            let annotated = reference.peel_to_tag().ok();
            tags.push(Tag {
                name: name.to_string(),
                target,
                annotated: annotated.is_some(),
                tagger_time: annotated
                    .as_ref()
                    .and_then(|tag| tag.tagger())
                    .map(|sig| sig.when().seconds()),
            });
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn list_remote_branches(&self) -> Result<Vec<BranchRef>> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else { continue };
            let target = match branch.get().resolve() {
                Ok(resolved) => resolved.target(),
                Err(e) if e.code() == ErrorCode::NotFound => None,
                Err(e) => return Err(e.into()),
            };
            if let Some(target) = target {
                branches.push(BranchRef {
                    name: name.to_string(),
                    target: target.to_string(),
                });
            }
        }
        Ok(branches)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<Commit>> {
        let (a, b) = (Oid::from_str(a)?, Oid::from_str(b)?);
        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(to_commit(&self.repo.find_commit(oid)?))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn describe_nearest_tag(&self, filter: &TagFilter) -> Result<Option<DescribedTag>> {
        let head = self.head_oid()?;
        let tags = self.list_tags()?;
        describe::nearest_tag(&self.repo, head, &tags, filter, self.abbrev_len())
    }
}

/// Strips the `refs/heads/`, `refs/tags/` or `refs/remotes/` namespace.
pub fn shorten_ref_name(name: &str) -> String {
    ["refs/heads/", "refs/tags/", "refs/remotes/"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
        .to_string()
}

fn to_commit(commit: &git2::Commit) -> Commit {
    Commit {
        id: commit.id().to_string(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        time: commit.time().seconds(),
        summary: commit.summary().unwrap_or_default().to_string(),
        body: commit.body().unwrap_or_default().to_string(),
    }
}

struct CommitWalk<'r> {
    repo: &'r Repository,
    revwalk: Revwalk<'r>,
    scope: Option<PathScope>,
}

impl CommitWalk<'_> {
    fn visit(&self, oid: Oid) -> Result<Option<Commit>> {
        let commit = self.repo.find_commit(oid)?;
        if let Some(scope) = &self.scope {
            if !scope.is_touched_by(self.repo, &commit)? {
                return Ok(None);
            }
        }
        Ok(Some(to_commit(&commit)))
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = match self.revwalk.next()? {
                Ok(oid) => oid,
                Err(e) => return Some(Err(e.into())),
            };
            match self.visit(oid) {
                Ok(Some(commit)) => return Some(Ok(commit)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Decides whether a commit changed anything inside the include path and
/// outside every excluded subtree.
struct PathScope {
    include: Option<PathBuf>,
    exclude: Vec<PathBuf>,
}

impl PathScope {
    fn new(include: Option<&str>, exclude: &[String]) -> Option<Self> {
        let include = include.filter(|p| !p.is_empty()).map(PathBuf::from);
        let exclude: Vec<PathBuf> = exclude
            .iter()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if include.is_none() && exclude.is_empty() {
            return None;
        }
        Some(PathScope { include, exclude })
    }

    fn accepts(&self, path: &Path) -> bool {
        self.include.as_ref().map_or(true, |inc| path.starts_with(inc))
            && !self.exclude.iter().any(|ex| path.starts_with(ex))
    }

    fn diff_touches(&self, diff: &Diff) -> bool {
        diff.deltas().any(|delta| {
            [delta.old_file().path(), delta.new_file().path()]
                .into_iter()
                .flatten()
                .any(|path| self.accepts(path))
        })
    }

    /// Root commits are compared with the empty tree. A merge that matches any
    /// of its parents inside the scope brought nothing new and is skipped.
    fn is_touched_by(&self, repo: &Repository, commit: &git2::Commit) -> Result<bool> {
        let tree = commit.tree()?;
        if commit.parent_count() == 0 {
            let diff = repo.diff_tree_to_tree(None, Some(&tree), None)?;
            return Ok(self.diff_touches(&diff));
        }

        for parent in commit.parents() {
            let parent_tree = parent.tree()?;
            let diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?;
            if !self.diff_touches(&diff) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Maps each tagged commit to a tag name. When several tags share a commit the
/// greatest name wins.
pub fn commit_to_tag_map(repo: &dyn RepositoryQuery, prefix: Option<&str>) -> Result<HashMap<CommitId, String>> {
    let mut map = HashMap::new();
    for tag in filtered_tags(repo, prefix)? {
        map.insert(tag.target, tag.name);
    }
    Ok(map)
}

pub fn tag_to_commit_map(repo: &dyn RepositoryQuery, prefix: Option<&str>) -> Result<HashMap<String, CommitId>> {
    Ok(filtered_tags(repo, prefix)?
        .into_iter()
        .map(|tag| (tag.name, tag.target))
        .collect())
}

fn filtered_tags(repo: &dyn RepositoryQuery, prefix: Option<&str>) -> Result<Vec<Tag>> {
    let mut tags = repo.list_tags()?;
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        tags.retain(|tag| tag.name.starts_with(prefix));
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}
