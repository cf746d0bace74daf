// src/changelog.rs

use crate::describe::TagFilter;
use crate::error::{Error, Result};
use crate::history;
use crate::mapper;
use crate::merge_base;
use crate::message::process_commit_body;
use crate::model::{Commit, TagVersions};
use crate::prefix::prefix_length_per_primary_version;
use crate::repository::RepositoryQuery;
use crate::resolver::tag_version;
use chrono::TimeZone;
use std::collections::HashMap;
use tracing::debug;

/// Where the changelog history begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogStart {
    /// A revision such as a tag or commit id
    Ref(String),
    /// The youngest merge base with any remote branch, else the first commit
    MergeBase,
    FirstCommit,
}

/// Resolves `start` to the oldest commit the changelog covers.
pub fn start_commit(repo: &dyn RepositoryQuery, start: &ChangelogStart) -> Result<Commit> {
    let commit = match start {
        ChangelogStart::Ref(name) => match repo.resolve_ref(name)? {
            Some(id) => Some(repo.find_commit(&id)?),
            None => {
                debug!(start = %name, "unknown changelog start, using first commit");
                history::first_commit(repo)?
            }
        },
        ChangelogStart::MergeBase => match merge_base::merge_base_commit(repo)? {
            Some(base) => Some(base),
            None => history::first_commit(repo)?,
        },
        ChangelogStart::FirstCommit => history::first_commit(repo)?,
    };
    commit.ok_or(Error::UnbornHead)
}

/// Maps each commit tagged with an eligible tag to the version the tag names.
pub fn tag_versions(repo: &dyn RepositoryQuery, filter: &TagFilter, prefix: &str) -> Result<TagVersions> {
    let mut versions = TagVersions::new();
    for tag in repo.list_tags()? {
        if filter.accepts(&tag.name) {
            versions.insert(tag.target, tag_version(&tag.name, prefix));
        }
    }
    Ok(versions)
}

/// One commit line of the changelog
#[derive(Debug, Clone)]
pub struct ChangelogEntry {
    pub version: String,
    pub time: i64,
    pub summary: String,
    pub body: String,
}

/// Commits grouped by the release window they belong to
#[derive(Debug, Clone)]
pub struct ChangelogSection {
    /// `None` for commits no window claimed
    pub primary_version: Option<String>,
    /// Column width for the version strings of this section
    pub width: usize,
    pub entries: Vec<ChangelogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Changelog {
    pub sections: Vec<ChangelogSection>,
}

impl Changelog {
    /// Builds the changelog of `commits`, ordered youngest to oldest.
    pub fn build(commits: &[Commit], tags: &TagVersions) -> Self {
        let versions = mapper::build_version_map(commits, tags);
        let primaries = mapper::primary_version_map(commits, tags);
        let widths = prefix_length_per_primary_version(versions.values(), primaries.values());

        let mut sections: Vec<ChangelogSection> = Vec::new();
        let mut index: HashMap<Option<String>, usize> = HashMap::new();
        for commit in commits {
            let primary = primaries.get(&commit.id).cloned();
            let version = versions.get(&commit.id).cloned().unwrap_or_default();
            let slot = *index.entry(primary.clone()).or_insert_with(|| {
                sections.push(ChangelogSection {
                    width: primary.as_ref().and_then(|p| widths.get(p)).copied().unwrap_or(0),
                    primary_version: primary.clone(),
                    entries: Vec::new(),
                });
                sections.len() - 1
            });

            let section = &mut sections[slot];
            section.width = section.width.max(version.chars().count());
            section.entries.push(ChangelogEntry {
                version,
                time: commit.time,
                summary: commit.summary.clone(),
                body: process_commit_body(&commit.body),
            });
        }

        Changelog { sections }
    }

    /// Markdown rendering: one `##` heading per window, one aligned bullet per commit.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let title = section.primary_version.as_deref().unwrap_or("Unversioned");
            out.push_str(&format!("## {title}\n\n"));
            for entry in &section.entries {
                out.push_str(&format!(
                    "- {:<width$} {} {}\n",
                    entry.version,
                    format_date(entry.time),
                    entry.summary,
                    width = section.width
                ));
                let indent = " ".repeat(section.width + 3);
                for line in entry.body.lines() {
                    out.push_str(&format!("{indent}{line}\n"));
                }
            }
            out.push('\n');
        }
        out
    }
}

fn format_date(time: i64) -> String {
    chrono::Utc
        .timestamp_opt(time, 0)
        .single()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(id: &str, time: i64, summary: &str, body: &str) -> Commit {
        Commit {
            id: id.into(),
            parents: Vec::new(),
            time,
            summary: summary.into(),
            body: body.into(),
        }
    }

    fn history() -> (Vec<Commit>, TagVersions) {
        let commits = vec![
            commit("c4", 86_400 * 3, "Add feature", "Details\n\nSigned-off-by: Dev <d@e>"),
            commit("c3", 86_400 * 2, "Release 2.0", ""),
            commit("c2", 86_400, "Fix bug", ""),
            commit("c1", 0, "Initial", ""),
        ];
        let tags = TagVersions::from([
            ("c1".to_string(), "1.0".to_string()),
            ("c3".to_string(), "2.0".to_string()),
        ]);
        (commits, tags)
    }

    #[test]
    fn sections_follow_release_windows_youngest_first() {
        let (commits, tags) = history();
        let changelog = Changelog::build(&commits, &tags);
        let titles: Vec<_> = changelog
            .sections
            .iter()
            .map(|s| s.primary_version.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["2.0", "1.0"]);

        let versions: Vec<_> = changelog.sections[0].entries.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["2.0.1", "2.0.0"]);
        assert_eq!(changelog.sections[0].entries[0].body, "Details");
    }

    #[test]
    fn rendering_aligns_versions_and_indents_bodies() {
        let (commits, tags) = history();
        let rendered = Changelog::build(&commits, &tags).render();
        assert!(rendered.starts_with("## 2.0\n\n- 2.0.1 1970-01-04 Add feature\n        Details\n"));
        assert!(rendered.contains("- 1.0.1 1970-01-02 Fix bug\n"));
        assert!(rendered.contains("- 1.0.0 1970-01-01 Initial\n"));
    }

    #[test]
    fn untagged_history_is_a_single_prerelease_section() {
        let commits = vec![commit("b", 10, "Second", ""), commit("a", 0, "First", "")];
        let changelog = Changelog::build(&commits, &TagVersions::new());
        assert_eq!(changelog.sections.len(), 1);
        assert_eq!(changelog.sections[0].primary_version.as_deref(), Some("1.0-pre"));
        assert_eq!(changelog.sections[0].width, "1.0-pre-2".len());
    }
}
