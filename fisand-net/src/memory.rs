// fisand-net/src/memory.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use fisand_common::error::{FisandError, Result};
use fisand_common::model::{EntryKind, FetchTarget, TreeEntry};

use crate::remote::RemoteRepository;

/// A remote call observed by [`MemoryRemote`], in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    ListTree { path: String, reference: String },
    FetchFile { path: String, reference: String },
}

/// An in-memory implementation of `RemoteRepository`, intended primarily for testing.
///
/// Paths are full repository paths (`packages/ui/index.ts`). Adding a file
/// registers all of its parent directories. Listings return directories
/// first, then files, each sorted by name, like the GitLab tree API.
#[derive(Default)]
pub struct MemoryRemote {
    dirs: RwLock<BTreeSet<String>>,
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    odd_entries: RwLock<BTreeMap<String, String>>,
    failures: RwLock<HashMap<String, FisandError>>,
    calls: RwLock<Vec<RemoteCall>>,
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn leaf_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, leaf)| leaf).unwrap_or(path)
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory and all of its ancestors.
    pub fn with_dir(self, path: &str) -> Self {
        {
            let mut dirs = self.dirs.write().unwrap();
            let mut current = path.trim_matches('/');
            while !current.is_empty() {
                dirs.insert(current.to_string());
                current = parent_of(current);
            }
        }
        self
    }

    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let path = path.trim_matches('/');
        let this = self.with_dir(parent_of(path));
        this.files
            .write()
            .unwrap()
            .insert(path.to_string(), content.into());
        this
    }

    /// Adds an entry of a kind other than tree or blob (e.g. a submodule `commit`).
    pub fn with_entry(self, path: &str, kind: &str) -> Self {
        let path = path.trim_matches('/');
        let this = self.with_dir(parent_of(path));
        this.odd_entries
            .write()
            .unwrap()
            .insert(path.to_string(), kind.to_string());
        this
    }

    /// Makes every call for `path` (tree listing or file fetch) fail with `error`.
    pub fn with_failure(self, path: &str, error: FisandError) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(path.trim_matches('/').to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.read().unwrap().clone()
    }

    /// Paths of the files fetched so far.
    pub fn fetched_files(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::FetchFile { path, .. } => Some(path),
                RemoteCall::ListTree { .. } => None,
            })
            .collect()
    }

    /// References at which the tree at `path` was listed.
    pub fn listed_references(&self, path: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::ListTree { path: p, reference } if p == path => Some(reference),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.write().unwrap().push(call);
    }

    fn failure_for(&self, path: &str) -> Option<FisandError> {
        self.failures.read().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl RemoteRepository for MemoryRemote {
    async fn list_tree(&self, target: &FetchTarget) -> Result<Vec<TreeEntry>> {
        let path = target.remote_path();
        self.record(RemoteCall::ListTree {
            path: path.clone(),
            reference: target.reference.clone(),
        });
        if let Some(error) = self.failure_for(&path) {
            return Err(error);
        }
        if !self.dirs.read().unwrap().contains(&path) {
            return Err(FisandError::RemoteNotFound(format!("tree {path}")));
        }

        let mut entries: Vec<TreeEntry> = self
            .dirs
            .read()
            .unwrap()
            .iter()
            .filter(|d| parent_of(d) == path)
            .map(|d| TreeEntry::tree(leaf_of(d), d.as_str()))
            .collect();
        entries.extend(
            self.files
                .read()
                .unwrap()
                .keys()
                .filter(|f| parent_of(f) == path)
                .map(|f| TreeEntry::blob(leaf_of(f), f.as_str())),
        );
        entries.extend(
            self.odd_entries
                .read()
                .unwrap()
                .iter()
                .filter(|(p, _)| parent_of(p) == path)
                .map(|(p, kind)| TreeEntry {
                    name: leaf_of(p).to_string(),
                    path: p.clone(),
                    kind: EntryKind::from(kind.clone()),
                }),
        );
        Ok(entries)
    }

    async fn fetch_file(&self, file_path: &str, reference: &str) -> Result<Vec<u8>> {
        self.record(RemoteCall::FetchFile {
            path: file_path.to_string(),
            reference: reference.to_string(),
        });
        if let Some(error) = self.failure_for(file_path) {
            return Err(error);
        }
        self.files
            .read()
            .unwrap()
            .get(file_path)
            .cloned()
            .ok_or_else(|| FisandError::RemoteNotFound(format!("file {file_path}")))
    }
}
