// fisand-core/src/materialize.rs
//! Recursive, depth-first materialization of a remote module tree.

use std::path::Path;

use async_recursion::async_recursion;
use fisand_aio::{create_dir_all_async, write_file_async};
use fisand_common::dependency::{parse_manifest, DependencyMap};
use fisand_common::error::{FisandError, Result};
use fisand_common::model::{EntryKind, FetchTarget, TreeEntry};
use fisand_net::RemoteRepository;
use tracing::{debug, warn};

use crate::exclusion::{ExclusionPolicy, FileAction};
use crate::report::{EntryAction, Materialization};

/// Walk state shared by every level of one materialization.
#[derive(Default)]
struct Walk {
    /// Last manifest seen in traversal order; later manifests replace earlier ones.
    manifest: Option<DependencyMap>,
    report: Materialization,
}

pub struct TreeMaterializer<'a, R: RemoteRepository> {
    remote: &'a R,
    policy: &'a ExclusionPolicy,
}

/// Leaf names that are safe to join onto a local directory.
fn is_safe_leaf(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

impl<'a, R: RemoteRepository> TreeMaterializer<'a, R> {
    pub fn new(remote: &'a R, policy: &'a ExclusionPolicy) -> Self {
        Self { remote, policy }
    }

    /// Materializes `target` into `dest` and returns the declared dependencies.
    ///
    /// Only the listing of `target` itself can fail the call. Everything
    /// below it is best effort: a failing file or subtree is recorded in the
    /// report and its siblings are still processed. `dest` is created after
    /// the listing succeeds, so a module that does not exist remotely leaves
    /// nothing behind.
    pub async fn materialize(
        &self,
        target: &FetchTarget,
        dest: &Path,
    ) -> Result<Materialization> {
        let entries = self.remote.list_tree(target).await?;
        create_dir_all_async(dest).await?;

        let mut walk = Walk::default();
        self.visit_entries(target, dest, entries, &mut walk).await;

        let mut report = walk.report;
        report.dependencies = walk.manifest.unwrap_or_default();
        debug!(
            "[{}] Materialized: {} written, {} failed, {} dependencies declared",
            target,
            report.written_count(),
            report.failed_count(),
            report.dependencies.len()
        );
        Ok(report)
    }

    #[async_recursion]
    async fn visit_entries(
        &self,
        target: &FetchTarget,
        dest: &Path,
        entries: Vec<TreeEntry>,
        walk: &mut Walk,
    ) {
        for entry in entries {
            let local = dest.join(&entry.name);
            if !is_safe_leaf(&entry.name) {
                warn!(
                    "[{}] Refusing entry with unsafe name '{}'",
                    target, entry.path
                );
                walk.report.record(
                    entry.path.clone(),
                    dest,
                    EntryAction::Failed(FisandError::Validation(format!(
                        "Unsafe entry name '{}'",
                        entry.name
                    ))),
                );
                continue;
            }

            match &entry.kind {
                EntryKind::Tree => {
                    if let Err(e) = create_dir_all_async(&local).await {
                        warn!("[{}] Could not create {}: {}", target, local.display(), e);
                        walk.report.record(entry.path, local, EntryAction::Failed(e));
                        continue;
                    }
                    walk.report
                        .record(entry.path.clone(), local.clone(), EntryAction::Created);

                    let child = target.child(&entry.name);
                    match self.remote.list_tree(&child).await {
                        Ok(children) => self.visit_entries(&child, &local, children, walk).await,
                        Err(e) => {
                            warn!("[{}] Could not list {}: {}", target, entry.path, e);
                            walk.report.record(entry.path, local, EntryAction::Failed(e));
                        }
                    }
                }
                EntryKind::Blob => self.visit_blob(target, &entry, &local, walk).await,
                EntryKind::Unknown(kind) => {
                    warn!(
                        "[{}] Ignoring entry {} of unknown type '{}'",
                        target, entry.path, kind
                    );
                    walk.report.record(entry.path, local, EntryAction::Ignored);
                }
            }
        }
    }

    async fn visit_blob(
        &self,
        target: &FetchTarget,
        entry: &TreeEntry,
        local: &Path,
        walk: &mut Walk,
    ) {
        let action = match self.policy.should_materialize(&entry.name) {
            FileAction::Skip => {
                debug!("[{}] Skipping {}", target, entry.path);
                EntryAction::Skipped
            }
            FileAction::InspectOnly => self.inspect_manifest(target, entry, walk).await,
            FileAction::Write => {
                match self.remote.fetch_file(&entry.path, &target.reference).await {
                    Ok(content) => match write_file_async(local, content).await {
                        Ok(()) => {
                            debug!("[{}] Wrote {}", target, local.display());
                            EntryAction::Written
                        }
                        Err(e) => {
                            warn!("[{}] Could not write {}: {}", target, local.display(), e);
                            EntryAction::Failed(e)
                        }
                    },
                    Err(e) => {
                        warn!("[{}] Could not fetch {}: {}", target, entry.path, e);
                        EntryAction::Failed(e)
                    }
                }
            }
        };
        walk.report.record(entry.path.clone(), local, action);
    }

    async fn inspect_manifest(
        &self,
        target: &FetchTarget,
        entry: &TreeEntry,
        walk: &mut Walk,
    ) -> EntryAction {
        match self
            .remote
            .fetch_file_text(&entry.path, &target.reference)
            .await
        {
            Ok(text) => {
                let dependencies = parse_manifest(&text);
                debug!(
                    "[{}] Manifest {} declares {} dependencies",
                    target,
                    entry.path,
                    dependencies.len()
                );
                walk.manifest = Some(dependencies);
                EntryAction::Inspected
            }
            Err(e @ FisandError::Decode(..)) => {
                warn!(
                    "[{}] Manifest {} is unreadable, assuming no dependencies: {}",
                    target, entry.path, e
                );
                walk.manifest = Some(DependencyMap::new());
                EntryAction::Inspected
            }
            Err(e) => {
                warn!(
                    "[{}] Could not fetch manifest {}: {}",
                    target, entry.path, e
                );
                EntryAction::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use fisand_common::model::DEFAULT_REFERENCE;
    use fisand_net::MemoryRemote;
    use tempfile::TempDir;

    use super::*;

    async fn run(
        remote: &MemoryRemote,
        policy: &ExclusionPolicy,
        module: &str,
    ) -> (TempDir, Materialization) {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join(module);
        let report = TreeMaterializer::new(remote, policy)
            .materialize(&FetchTarget::new(module, None), &dest)
            .await
            .unwrap();
        (temp, report)
    }

    fn files_under(path: &Path) -> Vec<String> {
        let mut found = Vec::new();
        for entry in fs::read_dir(path).unwrap() {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                found.extend(files_under(&entry.path()));
            } else {
                found.push(entry.path().display().to_string());
            }
        }
        found
    }

    #[tokio::test]
    async fn empty_tree_yields_no_dependencies_and_no_files() {
        let remote = MemoryRemote::new().with_dir("packages/empty");
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "empty").await;

        assert!(report.dependencies.is_empty());
        assert!(report.outcomes.is_empty());
        assert!(files_under(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn nested_directories_are_created_before_their_files() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/index.ts", "export * from './src'")
            .with_file("packages/ui/src/button/button.ts", "button")
            .with_file("packages/ui/src/button/style.css", ".btn {}");
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        assert!(!report.has_failures());
        assert_eq!(report.written_count(), 3);
        let dest = temp.path().join("ui");
        assert_eq!(
            fs::read_to_string(dest.join("src/button/style.css")).unwrap(),
            ".btn {}"
        );

        let created = |p: &Path| {
            report
                .outcomes
                .iter()
                .position(|o| matches!(o.action, EntryAction::Created) && o.local_path == p)
                .unwrap()
        };
        let written = |p: &Path| {
            report
                .outcomes
                .iter()
                .position(|o| matches!(o.action, EntryAction::Written) && o.local_path == p)
                .unwrap()
        };
        let src = created(&dest.join("src"));
        let button_dir = created(&dest.join("src/button"));
        assert!(src < button_dir);
        assert!(button_dir < written(&dest.join("src/button/button.ts")));
    }

    #[tokio::test]
    async fn default_policy_inspects_manifest_and_skips_build_config() {
        let remote = MemoryRemote::new()
            .with_file(
                "packages/ui/package.json",
                r#"{"fisand": {"fisand/core": null}}"#,
            )
            .with_file("packages/ui/tsconfig.json", "{}")
            .with_file("packages/ui/index.ts", "export {}");
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        let dest = temp.path().join("ui");
        assert!(!dest.join("package.json").exists());
        assert!(!dest.join("tsconfig.json").exists());
        assert!(dest.join("index.ts").exists());
        assert_eq!(
            report.dependencies.reference_for("fisand/core"),
            Some(DEFAULT_REFERENCE)
        );
        assert_eq!(report.inspected_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert!(!remote
            .fetched_files()
            .contains(&"packages/ui/tsconfig.json".to_string()));
    }

    #[tokio::test]
    async fn configured_excludes_write_manifest_verbatim() {
        let manifest = r#"{"fisand": {"fisand/core": "v1"}}"#;
        let remote = MemoryRemote::new()
            .with_file("packages/ui/README.md", "# ui")
            .with_file("packages/ui/package.json", manifest);
        let policy = ExclusionPolicy::new(Some(vec!["README.md".to_string()]));
        let (temp, report) = run(&remote, &policy, "ui").await;

        let dest = temp.path().join("ui");
        assert!(!dest.join("README.md").exists());
        assert_eq!(
            fs::read_to_string(dest.join("package.json")).unwrap(),
            manifest
        );
        assert!(report.dependencies.is_empty());
    }

    #[tokio::test]
    async fn one_failing_file_does_not_stop_its_siblings() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/a.ts", "a")
            .with_file("packages/ui/b.ts", "b")
            .with_file("packages/ui/c.ts", "c")
            .with_failure(
                "packages/ui/b.ts",
                FisandError::RemoteNotFound("packages/ui/b.ts".into()),
            );
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        let dest = temp.path().join("ui");
        assert!(dest.join("a.ts").exists());
        assert!(!dest.join("b.ts").exists());
        assert!(dest.join("c.ts").exists());
        let failures: Vec<_> = report
            .failures()
            .map(|(o, _)| o.remote_path.clone())
            .collect();
        assert_eq!(failures, ["packages/ui/b.ts"]);
    }

    #[tokio::test]
    async fn failing_subtree_listing_is_recorded() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/src/a.ts", "a")
            .with_file("packages/ui/index.ts", "i")
            .with_failure(
                "packages/ui/src",
                FisandError::RemoteUnavailable("reset".into()),
            );
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        assert!(temp.path().join("ui/index.ts").exists());
        assert!(temp.path().join("ui/src").is_dir());
        assert_eq!(report.failed_count(), 1);
    }

    #[tokio::test]
    async fn missing_module_fails_and_creates_nothing() {
        let remote = MemoryRemote::new().with_dir("packages/ui");
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("absent");

        let result = TreeMaterializer::new(&remote, &ExclusionPolicy::default())
            .materialize(&FetchTarget::new("absent", None), &dest)
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn last_visited_manifest_wins() {
        // "nested" is a directory, so it is visited before the root manifest blob.
        let remote = MemoryRemote::new()
            .with_file(
                "packages/ui/package.json",
                r#"{"fisand": {"fisand/root": null}}"#,
            )
            .with_file(
                "packages/ui/nested/package.json",
                r#"{"fisand": {"fisand/nested": null}}"#,
            );
        let (_temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        assert!(report.dependencies.contains("fisand/root"));
        assert!(!report.dependencies.contains("fisand/nested"));
    }

    #[tokio::test]
    async fn nested_manifest_propagates_when_visited_last() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/index.ts", "i")
            .with_file(
                "packages/ui/nested/package.json",
                r#"{"fisand": {"fisand/nested": "v3"}}"#,
            );
        let (_temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        assert_eq!(
            report.dependencies.reference_for("fisand/nested"),
            Some("v3")
        );
    }

    #[tokio::test]
    async fn unreadable_manifest_means_no_dependencies() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/package.json", vec![0xff, 0x00, 0xfe])
            .with_entry("packages/ui/vendor", "commit");
        let (_temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        assert!(report.dependencies.is_empty());
        assert!(!report.has_failures());
        assert_eq!(report.inspected_count(), 1);
        assert_eq!(report.skipped_count(), 1);
    }

    #[tokio::test]
    async fn unsafe_entry_names_are_refused() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/..", "parent")
            .with_file("packages/ui/a\\b.ts", "backslash")
            .with_file("packages/ui/ok.ts", "ok");
        let (temp, report) = run(&remote, &ExclusionPolicy::default(), "ui").await;

        let refused: Vec<_> = report
            .failures()
            .map(|(o, e)| (o.remote_path.as_str(), matches!(e, FisandError::Validation(_))))
            .collect();
        assert_eq!(
            refused,
            [("packages/ui/..", true), ("packages/ui/a\\b.ts", true)]
        );
        assert_eq!(remote.fetched_files(), ["packages/ui/ok.ts"]);

        let top: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(top, ["ui"]);
        assert_eq!(files_under(temp.path()).len(), 1);
        assert!(temp.path().join("ui/ok.ts").exists());
    }

    #[tokio::test]
    async fn files_are_fetched_at_the_target_reference() {
        let remote = MemoryRemote::new().with_file("packages/ui/src/a.ts", "a");
        let temp = TempDir::new().unwrap();

        TreeMaterializer::new(&remote, &ExclusionPolicy::default())
            .materialize(
                &FetchTarget::new("ui", Some("v2")),
                &temp.path().join("ui"),
            )
            .await
            .unwrap();

        assert_eq!(remote.listed_references("packages/ui/src"), ["v2"]);
        assert!(remote.calls().iter().all(|call| match call {
            fisand_net::RemoteCall::ListTree { reference, .. }
            | fisand_net::RemoteCall::FetchFile { reference, .. } => reference == "v2",
        }));
    }
}
