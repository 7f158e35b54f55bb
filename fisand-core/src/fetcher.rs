// fisand-core/src/fetcher.rs
use std::path::Path;

use fisand_common::error::Result;
use fisand_common::model::FetchTarget;
use fisand_net::RemoteRepository;
use tracing::{info, instrument};

use crate::exclusion::ExclusionPolicy;
use crate::materialize::TreeMaterializer;
use crate::progress::FetchObserver;
use crate::report::Materialization;

/// Entry point for fetching one module.
///
/// Returns the dependencies declared by the module without resolving them;
/// the caller hands them to a [`crate::DependencyResolver`] once it is ready.
pub struct ModuleFetcher<'a, R: RemoteRepository> {
    materializer: TreeMaterializer<'a, R>,
    observer: &'a dyn FetchObserver,
}

impl<'a, R: RemoteRepository> ModuleFetcher<'a, R> {
    pub fn new(
        remote: &'a R,
        policy: &'a ExclusionPolicy,
        observer: &'a dyn FetchObserver,
    ) -> Self {
        Self {
            materializer: TreeMaterializer::new(remote, policy),
            observer,
        }
    }

    /// Fetches `module_name` at `reference` (mainline when `None`) into `dest`.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn fetch(
        &self,
        module_name: &str,
        dest: &Path,
        reference: Option<&str>,
    ) -> Result<Materialization> {
        let target = FetchTarget::new(module_name, reference);
        info!("Fetching {} into {}", target, dest.display());
        self.observer.fetch_started(&target);

        match self.materializer.materialize(&target, dest).await {
            Ok(report) => {
                self.observer.fetch_finished(&target, &report);
                Ok(report)
            }
            Err(e) => {
                self.observer.fetch_failed(&target, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use fisand_common::error::FisandError;
    use fisand_net::MemoryRemote;
    use tempfile::TempDir;

    use super::*;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl FetchObserver for RecordingObserver {
        fn fetch_started(&self, target: &FetchTarget) {
            self.events.lock().unwrap().push(format!("start {target}"));
        }
        fn fetch_finished(&self, target: &FetchTarget, report: &Materialization) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {target} {}", report.written_count()));
        }
        fn fetch_failed(&self, target: &FetchTarget, _error: &FisandError) {
            self.events.lock().unwrap().push(format!("fail {target}"));
        }
    }

    #[tokio::test]
    async fn reports_start_and_success() {
        let remote = MemoryRemote::new()
            .with_file("packages/ui/index.ts", "export {}")
            .with_file(
                "packages/ui/package.json",
                r#"{"fisand": {"fisand/core": "v1"}}"#,
            );
        let policy = ExclusionPolicy::default();
        let observer = RecordingObserver::default();
        let temp = TempDir::new().unwrap();

        let report = ModuleFetcher::new(&remote, &policy, &observer)
            .fetch("ui", &temp.path().join("ui"), None)
            .await
            .unwrap();

        assert_eq!(report.dependencies.reference_for("fisand/core"), Some("v1"));
        assert_eq!(
            *observer.events.lock().unwrap(),
            ["start ui@master", "done ui@master 1"]
        );
    }

    #[tokio::test]
    async fn reports_failure_for_missing_module() {
        let remote = MemoryRemote::new().with_dir("packages");
        let policy = ExclusionPolicy::default();
        let observer = RecordingObserver::default();
        let temp = TempDir::new().unwrap();

        let result = ModuleFetcher::new(&remote, &policy, &observer)
            .fetch("ghost", &temp.path().join("ghost"), Some("v9"))
            .await;

        assert!(result.is_err());
        assert_eq!(
            *observer.events.lock().unwrap(),
            ["start ghost@v9", "fail ghost@v9"]
        );
    }
}
