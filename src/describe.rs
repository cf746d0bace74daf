// src/describe.rs

use crate::error::{Error, Result};
use crate::model::{DescribedTag, Tag};
use git2::{ErrorCode, Oid, Repository, Sort};
use glob::Pattern;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Same limit as `git describe --candidates`.
const MAX_CANDIDATES: usize = 10;

/// Which tag names may be used for a describe lookup.
///
/// A name is eligible when it matches any `matches` glob, or when it matches
/// none of the `excludes` globs. A filter with neither accepts every name.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    matches: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl TagFilter {
    pub fn new(matches: &[String], excludes: &[String]) -> Result<Self> {
        Ok(TagFilter {
            matches: matches.iter().map(|p| compile(p)).collect::<Result<_>>()?,
            excludes: excludes.iter().map(|p| compile(p)).collect::<Result<_>>()?,
        })
    }

    /// Filter for a normalized tag prefix plus any explicit globs.
    ///
    /// With a prefix only `<prefix>*` tags qualify, extended by the globs.
    /// Without one, dashed names (`*-*`) belong to other modules and only
    /// qualify through an explicit glob.
    pub fn for_prefix(prefix: &str, filters: &[String]) -> Result<Self> {
        let mut matches = Vec::new();
        let mut excludes = Vec::new();
        if prefix.is_empty() {
            excludes.push("*-*".to_string());
        } else {
            matches.push(format!("{}*", Pattern::escape(prefix)));
        }
        matches.extend(filters.iter().cloned());
        Self::new(&matches, &excludes)
    }

    pub fn accepts(&self, name: &str) -> bool {
        if self.matches.is_empty() && self.excludes.is_empty() {
            return true;
        }
        self.matches.iter().any(|p| p.matches(name))
            || (!self.excludes.is_empty() && !self.excludes.iter().any(|p| p.matches(name)))
    }
}

// `*` already crosses `/` under the default match options, so `**` is folded
// into it; the glob crate rejects `**` inside a component.
fn compile(pattern: &str) -> Result<Pattern> {
    let mut folded = pattern.to_string();
    while folded.contains("**") {
        folded = folded.replace("**", "*");
    }
    Pattern::new(&folded).map_err(|source| Error::InvalidFilter {
        pattern: pattern.to_string(),
        source,
    })
}

/// Orders tags sharing one commit: annotated first, then newest, then by name.
fn preference(tag: &Tag) -> (bool, Option<i64>, &str) {
    (tag.annotated, tag.tagger_time, tag.name.as_str())
}

/// Finds the eligible tag closest to `head` in commit distance.
pub(crate) fn nearest_tag(
    repo: &Repository,
    head: Oid,
    tags: &[Tag],
    filter: &TagFilter,
    abbrev_len: usize,
) -> Result<Option<DescribedTag>> {
    let mut by_commit: HashMap<Oid, &Tag> = HashMap::new();
    for tag in tags.iter().filter(|tag| filter.accepts(&tag.name)) {
        match by_commit.entry(Oid::from_str(&tag.target)?) {
            Entry::Occupied(mut slot) => {
                if preference(tag) > preference(slot.get()) {
                    slot.insert(tag);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(tag);
            }
        }
    }
    if by_commit.is_empty() {
        debug!("no tag passes the describe filter");
        return Ok(None);
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(head)?;

    let mut candidates = Vec::new();
    for oid in revwalk {
        let oid = oid?;
        if let Some(tag) = by_commit.get(&oid) {
            candidates.push((oid, *tag));
            if candidates.len() >= MAX_CANDIDATES {
                break;
            }
        }
    }

    let mut best: Option<(usize, &Tag)> = None;
    for (oid, tag) in candidates {
        let depth = distance(repo, head, oid)?;
        debug!(tag = %tag.name, depth, "describe candidate");
        if best.map_or(true, |(best_depth, _)| depth < best_depth) {
            best = Some((depth, tag));
        }
    }

    let Some((offset, tag)) = best else {
        return Ok(None);
    };
    Ok(Some(DescribedTag {
        tag: tag.name.clone(),
        offset,
        abbrev: abbreviate(repo, head, abbrev_len)?,
    }))
}

/// Number of commits reachable from `from` but not from `tagged`.
fn distance(repo: &Repository, from: Oid, tagged: Oid) -> Result<usize> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(from)?;
    revwalk.hide(tagged)?;
    let mut count = 0;
    for oid in revwalk {
        oid?;
        count += 1;
    }
    Ok(count)
}

/// Shortest prefix of `oid`, at least `min_len` long, that is unambiguous.
fn abbreviate(repo: &Repository, oid: Oid, min_len: usize) -> Result<String> {
    let hex = oid.to_string();
    let mut len = min_len.clamp(4, hex.len());
    while len < hex.len() {
        match repo.revparse_single(&hex[..len]) {
            Ok(_) => break,
            Err(e) if e.code() == ErrorCode::Ambiguous => len += 1,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(hex[..len].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(globs: &[&str]) -> Vec<String> {
        globs.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn prefix_limits_tags_to_that_module() {
        let filter = TagFilter::for_prefix("core-", &[]).unwrap();
        assert!(filter.accepts("core-1.0"));
        assert!(filter.accepts("core-v2.3"));
        assert!(!filter.accepts("1.0"));
        assert!(!filter.accepts("api-1.0"));
    }

    #[test]
    fn no_prefix_rejects_dashed_tags() {
        let filter = TagFilter::for_prefix("", &[]).unwrap();
        assert!(filter.accepts("1.0"));
        assert!(filter.accepts("v2.3"));
        assert!(!filter.accepts("core-1.0"));
        assert!(!filter.accepts("1.0-rc1"));
    }

    #[test]
    fn explicit_globs_admit_dashed_tags_alongside_plain_ones() {
        let filter = TagFilter::for_prefix("", &filters(&["api-*"])).unwrap();
        assert!(filter.accepts("api-1.0"));
        assert!(filter.accepts("1.0"));
        assert!(!filter.accepts("core-1.0"));
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = TagFilter::new(&[], &[]).unwrap();
        assert!(filter.accepts("core-1.0"));
        assert!(filter.accepts("1.0"));
    }

    #[test]
    fn explicit_globs_extend_a_prefix() {
        let filter = TagFilter::for_prefix("core-", &filters(&["legacy/*"])).unwrap();
        assert!(filter.accepts("core-1.0"));
        assert!(filter.accepts("legacy/0.9"));
        assert!(!filter.accepts("api-1.0"));
    }

    #[test]
    fn double_star_is_accepted_inside_a_name() {
        let filter = TagFilter::new(&filters(&["release/**"]), &[]).unwrap();
        assert!(filter.accepts("release/1.0"));
        assert!(filter.accepts("release/mod/1.0"));
    }

    #[test]
    fn prefix_glob_characters_are_literal() {
        let filter = TagFilter::for_prefix("mod[x]-", &[]).unwrap();
        assert!(filter.accepts("mod[x]-1.0"));
        assert!(!filter.accepts("modx-1.0"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = TagFilter::new(&filters(&["[unclosed"]), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn annotated_tags_win_over_lightweight() {
        let light = Tag {
            name: "z-light".into(),
            target: "a".into(),
            annotated: false,
            tagger_time: None,
        };
        let annotated = Tag {
            name: "a-annotated".into(),
            target: "a".into(),
            annotated: true,
            tagger_time: Some(10),
        };
        assert!(preference(&annotated) > preference(&light));
    }
}
