// src/cli.rs

use clap::{Parser, Subcommand};
use git_version::{SessionOptions, VersionConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project directory to derive the version for
    #[arg(short, long, default_value = ".")]
    pub working: PathBuf,

    /// Repository root, instead of searching upwards for `.git`
    #[arg(long)]
    pub gitdir: Option<PathBuf>,

    /// Only consider tags starting with this prefix (a trailing '-' is always added).
    /// Defaults to the project's path inside the repository
    #[arg(long)]
    pub tag_prefix: Option<String>,

    /// Glob the tag must match, may be repeated
    #[arg(long = "match")]
    pub match_filters: Vec<String>,

    /// File name marking the root of a subproject, may be repeated
    #[arg(long = "marker")]
    pub markers: Vec<String>,

    /// File name that stops a marked directory from being a subproject
    #[arg(long = "ignore-file", default_value = ".gitversion.ignore")]
    pub ignore_files: Vec<String>,

    /// Directory never treated as or searched for subprojects
    #[arg(long = "ignore-dir")]
    pub ignore_dirs: Vec<String>,

    /// Read the system-wide gitconfig as well
    #[arg(long)]
    pub with_system_config: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the version of the project
    Describe {
        /// Output template, placeholders: {tag} {offset} {hash} {branch} {commit} {abbreviated_id}
        #[arg(long, default_value = "{tag}.{offset}")]
        format: String,
    },
    /// Print every field of the version record and the scoped commit count
    Info,
    /// List subprojects together with their own versions
    Subprojects,
    /// Print the changelog from a start point up to HEAD
    Changelog {
        /// Revision to start from, defaults to the first commit
        #[arg(long, conflicts_with = "since_merge_base")]
        since: Option<String>,

        /// Start from the youngest merge base with a remote branch
        #[arg(long)]
        since_merge_base: bool,
    },
    /// Print the youngest merge base between HEAD and the remote branches
    MergeBase,
}

impl Args {
    pub fn version_config(&self) -> VersionConfig {
        VersionConfig {
            root: self.gitdir.clone(),
            project: self.working.clone(),
            markers: self.markers.clone(),
            ignore_files: self.ignore_files.clone(),
            ignore_dirs: self.ignore_dirs.clone(),
            tag_prefix: self.tag_prefix.clone(),
            match_filters: self.match_filters.clone(),
            session: SessionOptions {
                ignore_system_config: !self.with_system_config,
            },
        }
    }
}
