// fisand-core/src/exclusion.rs
use std::collections::HashSet;

use fisand_common::config::Config;
use fisand_common::dependency::{BUILD_CONFIG_FILE_NAME, MANIFEST_FILE_NAME};

/// What the materializer does with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Fetch raw and write to the destination.
    Write,
    /// Fetch decoded and read its dependency section; never written.
    InspectOnly,
    /// Do nothing.
    Skip,
}

/// Decides per file name whether it is written, inspected or skipped.
///
/// Without a configured exclusion list, names containing `package.json` are
/// inspected and names containing `tsconfig.json` are skipped. Once a list is
/// configured (even an empty one) membership alone decides, and the manifest
/// is written like any other file.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    excludes: Option<HashSet<String>>,
}

impl ExclusionPolicy {
    pub fn new(excludes: Option<Vec<String>>) -> Self {
        Self {
            excludes: excludes.map(|list| list.into_iter().collect()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.excludes.clone())
    }

    pub fn should_materialize(&self, file_name: &str) -> FileAction {
        match &self.excludes {
            None if file_name.contains(MANIFEST_FILE_NAME) => FileAction::InspectOnly,
            None if file_name.contains(BUILD_CONFIG_FILE_NAME) => FileAction::Skip,
            None => FileAction::Write,
            Some(excludes) if excludes.contains(file_name) => FileAction::Skip,
            Some(_) => FileAction::Write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_special_cases_manifest_and_build_config() {
        let policy = ExclusionPolicy::default();
        assert_eq!(
            policy.should_materialize("package.json"),
            FileAction::InspectOnly
        );
        assert_eq!(policy.should_materialize("tsconfig.json"), FileAction::Skip);
        assert_eq!(policy.should_materialize("README.md"), FileAction::Write);
        assert_eq!(policy.should_materialize("index.ts"), FileAction::Write);
    }

    #[test]
    fn default_policy_matches_by_containment() {
        let policy = ExclusionPolicy::default();
        assert_eq!(
            policy.should_materialize("old.package.json"),
            FileAction::InspectOnly
        );
        assert_eq!(
            policy.should_materialize("tsconfig.json.bak"),
            FileAction::Skip
        );
    }

    #[test]
    fn configured_list_disables_manifest_special_case() {
        let policy = ExclusionPolicy::new(Some(vec!["README.md".to_string()]));
        assert_eq!(policy.should_materialize("README.md"), FileAction::Skip);
        assert_eq!(policy.should_materialize("package.json"), FileAction::Write);
        assert_eq!(
            policy.should_materialize("tsconfig.json"),
            FileAction::Write
        );
    }

    #[test]
    fn configured_list_matches_exact_names_only() {
        let policy = ExclusionPolicy::new(Some(vec!["README.md".to_string()]));
        assert_eq!(
            policy.should_materialize("README.md.orig"),
            FileAction::Write
        );

        let empty = ExclusionPolicy::new(Some(Vec::new()));
        assert_eq!(empty.should_materialize("package.json"), FileAction::Write);
    }
}
