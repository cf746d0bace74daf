// src/mapper.rs
//
// Version numbers are `<tag version>.<commits since tag>`; commits that predate
// the first tag become `<first version>-pre-<n>`. All inputs are ordered
// youngest to oldest, the order a history walk produces.

use crate::model::TagVersions;
use std::collections::HashMap;

/// Baseline used before any tag exists.
pub const INITIAL_VERSION: &str = "1.0";

/// The oldest tagged version in `commits`, or [`INITIAL_VERSION`].
pub fn first_released_version<C: AsRef<str>>(commits: &[C], tags: &TagVersions) -> String {
    commits
        .iter()
        .filter_map(|commit| tags.get(commit.as_ref()))
        .last()
        .cloned()
        .unwrap_or_else(|| INITIAL_VERSION.to_string())
}

/// Assigns every commit its full version.
///
/// A tagged commit is `<version>.0`, each following commit bumps the last
/// component until the next tag.
pub fn build_version_map<C: AsRef<str>>(commits: &[C], tags: &TagVersions) -> HashMap<String, String> {
    let prerelease_target = first_released_version(commits, tags);

    let mut current_version: Option<&str> = None;
    let mut offset = 0usize;
    let mut versions = HashMap::with_capacity(commits.len());

    for commit in commits.iter().rev() {
        let hash = commit.as_ref();
        match tags.get(hash) {
            Some(version) => {
                current_version = Some(version.as_str());
                offset = 0;
            }
            None => offset += 1,
        }

        let version = match current_version {
            Some(current) => format!("{current}.{offset}"),
            None => format!("{prerelease_target}-pre-{offset}"),
        };
        versions.insert(hash.to_string(), version);
    }

    versions
}

/// Assigns every commit the version of the release window it belongs to.
///
/// Commits are collected until a tagged commit closes the window; the window
/// (tag included) takes the tag's version. Commits older than the oldest tag
/// become `<oldest version>-pre`, or `1.0-pre` when there are no tags at all.
pub fn primary_version_map<C: AsRef<str>>(commits: &[C], tags: &TagVersions) -> HashMap<String, String> {
    let mut last_version: Option<&str> = None;
    let mut pending: Vec<&str> = Vec::new();
    let mut primary = HashMap::with_capacity(commits.len());

    for commit in commits {
        let hash = commit.as_ref();
        pending.push(hash);
        if let Some(version) = tags.get(hash) {
            for hash in pending.drain(..) {
                primary.insert(hash.to_string(), version.clone());
            }
            last_version = Some(version.as_str());
        }
    }

    // A non-empty tag map whose tags are all outside `commits` closes no
    // window; those commits stay unassigned.
    if tags.is_empty() {
        last_version = Some(INITIAL_VERSION);
    }
    if let Some(last) = last_version {
        for hash in pending {
            primary.insert(hash.to_string(), format!("{last}-pre"));
        }
    }

    primary
}
