// fisand-core/src/progress.rs
use fisand_common::error::FisandError;
use fisand_common::model::FetchTarget;

use crate::report::Materialization;

/// Receives start/finish notifications for each module fetch.
pub trait FetchObserver: Send + Sync {
    fn fetch_started(&self, target: &FetchTarget);
    fn fetch_finished(&self, target: &FetchTarget, report: &Materialization);
    fn fetch_failed(&self, target: &FetchTarget, error: &FisandError);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn fetch_started(&self, _target: &FetchTarget) {}
    fn fetch_finished(&self, _target: &FetchTarget, _report: &Materialization) {}
    fn fetch_failed(&self, _target: &FetchTarget, _error: &FisandError) {}
}
