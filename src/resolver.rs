// src/resolver.rs

use crate::describe::TagFilter;
use crate::error::{Error, Result};
use crate::model::VersionRecord;
use crate::repository::RepositoryQuery;
use tracing::{debug, error};

/// Supplies the offset part of a version for the tag HEAD was described from.
pub trait CommitCountProvider {
    /// Commits since `tag`, or `None` when this provider has nothing to say.
    fn commit_count(&self, repo: &dyn RepositoryQuery, tag: &str) -> Result<Option<usize>>;

    /// The count as text, or `fallback` when counting fails or yields nothing positive.
    fn offset_or(&self, repo: &dyn RepositoryQuery, tag: &str, fallback: &str) -> String {
        match self.commit_count(repo, tag) {
            Ok(Some(count)) if count > 0 => count.to_string(),
            Ok(_) => fallback.to_string(),
            Err(err) => {
                debug!(tag, %err, "commit count failed, using describe offset");
                fallback.to_string()
            }
        }
    }
}

/// Keeps the offset reported by the describe lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeOffset;

impl CommitCountProvider for DescribeOffset {
    fn commit_count(&self, _: &dyn RepositoryQuery, _: &str) -> Result<Option<usize>> {
        Ok(None)
    }
}

/// Empty stays empty; anything else ends with exactly the `-` it was given or
/// one appended.
pub fn normalize_tag_prefix(prefix: Option<&str>) -> String {
    match prefix {
        None | Some("") => String::new(),
        Some(prefix) if prefix.ends_with('-') => prefix.to_string(),
        Some(prefix) => format!("{prefix}-"),
    }
}

/// Turns a tag name into a version: the prefix goes, and so does a `v` that
/// directly precedes a digit.
pub fn tag_version(tag_name: &str, prefix: &str) -> String {
    let tag = tag_name.strip_prefix(prefix).unwrap_or(tag_name);
    let mut chars = tag.chars();
    match (chars.next(), chars.next()) {
        (Some('v'), Some(c)) if c.is_ascii_digit() => tag[1..].to_string(),
        _ => tag.to_string(),
    }
}

/// Resolves HEAD to a [`VersionRecord`] the way `git describe --tags --long` would.
#[derive(Debug, Clone, Default)]
pub struct VersionResolver {
    tag_prefix: String,
    match_filters: Vec<String>,
}

impl VersionResolver {
    pub fn new(tag_prefix: Option<&str>, match_filters: Vec<String>) -> Self {
        VersionResolver {
            tag_prefix: normalize_tag_prefix(tag_prefix),
            match_filters,
        }
    }

    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    pub fn match_filters(&self) -> &[String] {
        &self.match_filters
    }

    pub fn tag_filter(&self) -> Result<TagFilter> {
        TagFilter::for_prefix(&self.tag_prefix, &self.match_filters)
    }

    /// Best-effort resolution: any failure is logged and yields
    /// [`VersionRecord::empty`] so a build can always carry on.
    pub fn resolve(&self, repo: &dyn RepositoryQuery, counter: &dyn CommitCountProvider) -> VersionRecord {
        match self.try_resolve(repo, counter) {
            Ok(record) => record,
            Err(err) => {
                error!(%err, "failed to describe git info");
                VersionRecord::empty()
            }
        }
    }

    pub fn try_resolve(&self, repo: &dyn RepositoryQuery, counter: &dyn CommitCountProvider) -> Result<VersionRecord> {
        let described = repo
            .describe_nearest_tag(&self.tag_filter()?)?
            .ok_or_else(|| Error::NoMatchingTag {
                prefix: self.tag_prefix.clone(),
                filters: self.match_filters.join(", "),
            })?;
        debug!(described = %described, "nearest tag");

        let head = repo.head()?;
        let offset = counter.offset_or(repo, &described.tag, &described.offset.to_string());

        Ok(VersionRecord {
            tag: tag_version(&described.tag, &self.tag_prefix),
            offset,
            hash: described.hash(),
            branch: head
                .branch
                .unwrap_or_else(|| VersionRecord::DEFAULT_BRANCH.to_string()),
            abbreviated_id: head.id.chars().take(8).collect(),
            commit: head.id,
        })
    }
}
