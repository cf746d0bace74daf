//! Throwaway git repositories for integration tests.

#![allow(dead_code)]

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
    clock: i64,
}

impl TestRepo {
    /// An empty repository whose HEAD points at `main`.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &options).unwrap();
        TestRepo {
            dir,
            repo,
            clock: 1_700_000_000,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn signature(&mut self) -> Signature<'static> {
        self.clock += 60;
        Signature::new("Test", "test@example.com", &Time::new(self.clock, 0)).unwrap()
    }

    pub fn write(&self, path: &str, contents: &str) {
        let full = self.dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }

    /// Writes each `(path, contents)` pair and commits them on HEAD.
    pub fn commit_files(&mut self, files: &[(&str, &str)], message: &str) -> Oid {
        self.commit_on_head(files, &[], message)
    }

    /// Commits `files` on HEAD with `other` as a second parent.
    pub fn merge(&mut self, other: Oid, files: &[(&str, &str)], message: &str) -> Oid {
        self.commit_on_head(files, &[other], message)
    }

    fn commit_on_head(&mut self, files: &[(&str, &str)], extra_parents: &[Oid], message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().unwrap();
        for (path, contents) in files {
            self.write(path, contents);
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        let mut parents = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        for id in extra_parents {
            parents.push(self.repo.find_commit(*id).unwrap());
        }
        let parents: Vec<&git2::Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    pub fn commit(&mut self, path: &str, message: &str) -> Oid {
        let contents = format!("{message}\n");
        self.commit_files(&[(path, &contents)], message)
    }

    /// A commit on top of `parent` that HEAD does not see, e.g. for remote branches.
    pub fn commit_beside(&mut self, parent: Oid, message: &str) -> Oid {
        let sig = self.signature();
        let parent = self.repo.find_commit(parent).unwrap();
        let tree = parent.tree().unwrap();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &[&parent])
            .unwrap()
    }

    /// Like [`commit_beside`](Self::commit_beside), but also sets the
    /// top-level `file` to `contents`.
    pub fn commit_beside_with(&mut self, parent: Oid, file: &str, contents: &str, message: &str) -> Oid {
        let sig = self.signature();
        let parent = self.repo.find_commit(parent).unwrap();
        let blob = self.repo.blob(contents.as_bytes()).unwrap();
        let mut builder = self.repo.treebuilder(Some(&parent.tree().unwrap())).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &[&parent])
            .unwrap()
    }

    pub fn tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn tag_annotated(&mut self, name: &str, target: Oid) {
        let sig = self.signature();
        let object = self.repo.find_object(target, None).unwrap();
        self.repo.tag(name, &object, &sig, name, false).unwrap();
    }

    pub fn remote_branch(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/remotes/{name}"), target, true, "test")
            .unwrap();
    }

    pub fn detach_head(&self, target: Oid) {
        self.repo.set_head_detached(target).unwrap();
    }
}
