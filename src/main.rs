// src/main.rs

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Command};
use git_version::changelog::{self, Changelog, ChangelogStart};
use git_version::describe::TagFilter;
use git_version::history::{self, LogScope};
use git_version::{merge_base, GitVersion, RepositoryQuery, VersionConfig};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use rayon::prelude::*;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut project = GitVersion::new(args.version_config()).context("failed to set up project")?;
    let command = args.command.clone().unwrap_or(Command::Describe {
        format: "{tag}.{offset}".to_string(),
    });

    match command {
        Command::Describe { format } => println!("{}", project.info().format(&format)),
        Command::Info => {
            for (key, value) in project.info().fields() {
                println!("{key}={value}");
            }
            println!("scoped_commits={}", project.scoped_commit_count());
        }
        Command::Subprojects => print_subprojects(args, &project),
        Command::Changelog {
            since,
            since_merge_base,
        } => {
            let start = match since {
                Some(name) => ChangelogStart::Ref(name),
                None if since_merge_base => ChangelogStart::MergeBase,
                None => ChangelogStart::FirstCommit,
            };
            print_changelog(&project, &start)?;
        }
        Command::MergeBase => {
            let repo = project.open()?;
            if let Some(base) = merge_base::merge_base_commit(&repo)? {
                println!("{}", base.id);
            }
        }
    }
    Ok(())
}

/// Each subproject gets its own repository session, so they resolve in parallel.
fn print_subprojects(args: &Args, project: &GitVersion) {
    let start_time = Instant::now();
    let paths = project.subproject_paths();
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_message("Resolving subprojects");

    let results: Vec<(String, String)> = paths
        .par_iter()
        .progress_with(bar)
        .map(|path| {
            let config = VersionConfig {
                root: Some(project.root().to_path_buf()),
                project: project.root().join(path),
                tag_prefix: None,
                ..args.version_config()
            };
            let version = match GitVersion::new(config) {
                Ok(mut sub) => sub.info().format("{tag}.{offset}"),
                Err(e) => format!("error: {e}"),
            };
            (path.clone(), version)
        })
        .collect();

    for (path, version) in results {
        println!("{path}\t{version}");
    }
    tracing::debug!("resolved {} subprojects in {:.2?}", paths.len(), start_time.elapsed());
}

fn print_changelog(project: &GitVersion, start: &ChangelogStart) -> anyhow::Result<()> {
    let repo = project.open()?;
    let start = changelog::start_commit(&repo, start)?;
    let head = repo.head()?;
    let scope = LogScope {
        path_filter: Some(project.local_path().to_string()).filter(|p| !p.is_empty()),
        exclude_paths: project.subproject_paths().to_vec(),
        exclude_ancestors_of: None,
    };

    let bar = ProgressBar::new_spinner();
    bar.set_message("Walking history");
    let commits = history::commit_log(&repo, &start, &head.id, &scope)?
        .progress_with(bar.clone())
        .collect::<Result<Vec<_>, _>>()?;
    bar.finish_and_clear();

    let filter = TagFilter::for_prefix(project.tag_prefix(), project.match_filters())?;
    let tags = changelog::tag_versions(&repo, &filter, project.tag_prefix())?;
    print!("{}", Changelog::build(&commits, &tags).render());
    Ok(())
}
