// fisand-core/src/resolver.rs
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use fisand_aio::is_directory_async;
use fisand_common::dependency::DependencyMap;
use fisand_common::error::{FisandError, Result};
use fisand_common::model::FetchTarget;
use fisand_net::RemoteRepository;
use tracing::{debug, info, warn};

use crate::fetcher::ModuleFetcher;
use crate::report::Materialization;

/// What a resolution pass did with each declared dependency.
#[derive(Debug, Default)]
pub struct Resolution {
    pub fetched: Vec<FetchTarget>,
    /// Bare names skipped because a directory for them already exists.
    pub already_present: Vec<String>,
    /// Declared names outside the active workspace.
    pub ignored: Vec<String>,
    /// Dependencies whose own fetch failed, with the fetch's own error.
    pub failed: Vec<(FetchTarget, FisandError)>,
    /// Outcomes of every nested fetch, in order.
    pub report: Materialization,
}

/// Fetches the workspace dependencies that are missing under a destination root.
///
/// A dependency belongs to the workspace when its name starts with
/// `<workspace>/`; the remainder is the module name and the directory name
/// under the root. Resolution is transitive, and each module is fetched at
/// most once per resolver.
pub struct DependencyResolver {
    workspace_prefix: String,
    dest_root: PathBuf,
    visited: HashSet<String>,
}

/// Module names that stay inside the destination root when joined onto it.
fn is_safe_module_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && name
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

impl DependencyResolver {
    pub fn new(workspace_prefix: &str, dest_root: &Path) -> Self {
        Self {
            workspace_prefix: workspace_prefix.to_string(),
            dest_root: dest_root.to_path_buf(),
            visited: HashSet::new(),
        }
    }

    /// Marks a module fetched outside the resolver so it is not fetched again.
    pub fn mark_visited(&mut self, module_name: &str) {
        self.visited.insert(module_name.to_string());
    }

    /// Bare module name for a declared dependency, or `None` if it is not
    /// part of the active workspace.
    pub fn bare_name<'k>(&self, dependency: &'k str) -> Option<&'k str> {
        if self.workspace_prefix.is_empty() {
            return None;
        }
        dependency
            .strip_prefix(self.workspace_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| is_safe_module_name(name))
    }

    pub async fn resolve<R: RemoteRepository>(
        &mut self,
        fetcher: &ModuleFetcher<'_, R>,
        dependencies: &DependencyMap,
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let mut pending: VecDeque<(String, Option<String>)> = dependencies
            .iter()
            .map(|(name, reference)| (name.to_string(), reference.map(str::to_string)))
            .collect();

        while let Some((dependency, reference)) = pending.pop_front() {
            let Some(name) = self.bare_name(&dependency) else {
                debug!(
                    "Ignoring dependency '{}' outside workspace '{}'",
                    dependency, self.workspace_prefix
                );
                resolution.ignored.push(dependency);
                continue;
            };
            if self.visited.contains(name) {
                debug!("Dependency '{}' already handled in this run", name);
                continue;
            }
            self.visited.insert(name.to_string());

            let dest = self.dest_root.join(name);
            if is_directory_async(&dest).await {
                info!(
                    "Dependency '{}' already present at {}",
                    name,
                    dest.display()
                );
                resolution.already_present.push(name.to_string());
                continue;
            }

            info!("Resolving missing dependency '{}'", name);
            let target = FetchTarget::new(name, reference.as_deref());
            let report = match fetcher.fetch(name, &dest, reference.as_deref()).await {
                Ok(report) => report,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Could not fetch dependency {}: {}", target, e);
                    resolution.failed.push((target, e));
                    continue;
                }
            };
            if let Some((_, e)) = report.failures().find(|(_, e)| e.is_fatal()) {
                return Err(e.clone());
            }
            if report.has_failures() {
                warn!(
                    "Dependency '{}' was fetched with {} failed entries",
                    name,
                    report.failed_count()
                );
            }
            pending.extend(
                report
                    .dependencies
                    .iter()
                    .map(|(n, r)| (n.to_string(), r.map(str::to_string))),
            );
            resolution.fetched.push(target);
            resolution.report.merge_outcomes(report);
        }

        Ok(resolution)
    }
}
