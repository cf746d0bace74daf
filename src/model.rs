// src/model.rs

use std::collections::HashMap;
use std::fmt;

/// Full hexadecimal object id of a commit
pub type CommitId = String;

/// Maps a commit id to the version name of the tag pointing at it
pub type TagVersions = HashMap<CommitId, String>;

/// A single commit as seen by the version engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    /// Committer time, seconds since the epoch
    pub time: i64,
    /// First line of the message
    pub summary: String,
    /// Message without the summary line
    pub body: String,
}

impl AsRef<str> for Commit {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

/// A tag, already peeled to the commit it ultimately points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Short name, without `refs/tags/`
    pub name: String,
    pub target: CommitId,
    pub annotated: bool,
    pub tagger_time: Option<i64>,
}

/// A branch name together with the commit at its tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub target: CommitId,
}

/// Where HEAD currently points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadRef {
    pub id: CommitId,
    /// Short branch name, `None` when HEAD is detached
    pub branch: Option<String>,
}

/// Result of a nearest-tag lookup from HEAD, the pieces of `<tag>-<offset>-g<abbrev>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedTag {
    pub tag: String,
    pub offset: usize,
    pub abbrev: String,
}

impl DescribedTag {
    /// The disambiguation suffix as `git describe --long` prints it.
    pub fn hash(&self) -> String {
        format!("g{}", self.abbrev)
    }
}

impl fmt::Display for DescribedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tag, self.offset, self.hash())
    }
}

/// The version information derived for one project at HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub tag: String,
    pub offset: String,
    pub hash: String,
    pub branch: String,
    pub commit: String,
    pub abbreviated_id: String,
}

impl VersionRecord {
    pub const DEFAULT_BRANCH: &'static str = "master";

    /// Stand-in used whenever no git information is available.
    pub fn empty() -> Self {
        VersionRecord {
            tag: "0.0".to_string(),
            offset: "0".to_string(),
            hash: "00000000".to_string(),
            branch: Self::DEFAULT_BRANCH.to_string(),
            commit: "0".repeat(40),
            abbreviated_id: "00000000".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Substitutes `{tag}`, `{offset}`, `{hash}`, `{branch}`, `{commit}` and
    /// `{abbreviated_id}` in `template`.
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{tag}", &self.tag)
            .replace("{offset}", &self.offset)
            .replace("{hash}", &self.hash)
            .replace("{branch}", &self.branch)
            .replace("{commit}", &self.commit)
            .replace("{abbreviated_id}", &self.abbreviated_id)
    }

    /// `(key, value)` pairs in declaration order.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("tag", self.tag.as_str()),
            ("offset", self.offset.as_str()),
            ("hash", self.hash.as_str()),
            ("branch", self.branch.as_str()),
            ("commit", self.commit.as_str()),
            ("abbreviated_id", self.abbreviated_id.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_uses_placeholder_values() {
        let empty = VersionRecord::empty();
        assert_eq!(empty.tag, "0.0");
        assert_eq!(empty.offset, "0");
        assert_eq!(empty.hash, "00000000");
        assert_eq!(empty.branch, "master");
        assert!(empty.commit.chars().all(|c| c == '0'));
        assert_eq!(empty.abbreviated_id, "00000000");
        assert!(empty.is_empty());
    }

    #[test]
    fn format_replaces_every_placeholder() {
        let record = VersionRecord {
            tag: "1.2".into(),
            offset: "7".into(),
            hash: "gabc1234".into(),
            branch: "main".into(),
            commit: "abc1234def".into(),
            abbreviated_id: "abc1234d".into(),
        };
        assert_eq!(record.format("{tag}.{offset}"), "1.2.7");
        assert_eq!(
            record.format("{branch}/{abbreviated_id}-{hash}+{commit}"),
            "main/abc1234d-gabc1234+abc1234def"
        );
    }

    #[test]
    fn described_tag_renders_long_form() {
        let described = DescribedTag {
            tag: "v1.0".into(),
            offset: 3,
            abbrev: "1a2b3c4".into(),
        };
        assert_eq!(described.to_string(), "v1.0-3-g1a2b3c4");
    }
}
