// fisand-core/src/session.rs
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fisand_common::error::Result;
use fisand_common::model::FetchTarget;
use fisand_net::RemoteRepository;
use tracing::{info, warn};

use crate::exclusion::ExclusionPolicy;
use crate::fetcher::ModuleFetcher;
use crate::progress::FetchObserver;
use crate::report::Materialization;
use crate::resolver::{DependencyResolver, Resolution};

/// Outcome of importing one top-level module.
#[derive(Debug)]
pub struct ImportOutcome {
    pub target: FetchTarget,
    pub dest: PathBuf,
    pub report: Materialization,
    pub resolution: Resolution,
    /// The module had already been fetched earlier in the session and was not fetched again.
    pub already_fetched: bool,
}

impl ImportOutcome {
    pub fn has_failures(&self) -> bool {
        self.report.has_failures()
            || self.resolution.report.has_failures()
            || !self.resolution.failed.is_empty()
    }
}

/// Imports modules under one destination root, sharing the resolver's
/// visited set across every import in the session.
pub struct ImportSession<'a, R: RemoteRepository> {
    fetcher: ModuleFetcher<'a, R>,
    resolver: DependencyResolver,
    dest_root: PathBuf,
    fetched: HashSet<String>,
}

impl<'a, R: RemoteRepository> ImportSession<'a, R> {
    pub fn new(
        remote: &'a R,
        policy: &'a ExclusionPolicy,
        observer: &'a dyn FetchObserver,
        workspace_prefix: &str,
        dest_root: &Path,
    ) -> Self {
        Self {
            fetcher: ModuleFetcher::new(remote, policy, observer),
            resolver: DependencyResolver::new(workspace_prefix, dest_root),
            dest_root: dest_root.to_path_buf(),
            fetched: HashSet::new(),
        }
    }

    /// Fetches `module_name` into `<root>/<module_name>`, then resolves its
    /// missing workspace dependencies.
    ///
    /// A module already fetched earlier in the session, at top level or as a
    /// dependency, is not fetched again.
    pub async fn import(
        &mut self,
        module_name: &str,
        reference: Option<&str>,
    ) -> Result<ImportOutcome> {
        let target = FetchTarget::new(module_name, reference);
        let dest = self.dest_root.join(module_name);

        if self.fetched.contains(module_name) {
            info!("{} was already fetched in this session", target);
            return Ok(ImportOutcome {
                target,
                dest,
                report: Materialization::default(),
                resolution: Resolution::default(),
                already_fetched: true,
            });
        }

        self.resolver.mark_visited(module_name);
        let report = self.fetcher.fetch(module_name, &dest, reference).await?;
        if let Some((_, e)) = report.failures().find(|(_, e)| e.is_fatal()) {
            return Err(e.clone());
        }
        if report.has_failures() {
            warn!(
                "{} finished with {} failed entries",
                target,
                report.failed_count()
            );
        }

        self.fetched.insert(module_name.to_string());

        let resolution = self
            .resolver
            .resolve(&self.fetcher, &report.dependencies)
            .await?;
        for dependency in &resolution.fetched {
            self.fetched.insert(dependency.module_name.clone());
        }
        info!(
            "Imported {} ({} files, {} dependencies fetched)",
            target,
            report.written_count(),
            resolution.fetched.len()
        );

        Ok(ImportOutcome {
            target,
            dest,
            report,
            resolution,
            already_fetched: false,
        })
    }
}
