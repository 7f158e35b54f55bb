// fisand-common/src/dependency/manifest.rs
//! Extraction of the dependency section from a module manifest (`package.json`).

use serde_json::Value;
use tracing::{debug, warn};

use super::definition::DependencyMap;

/// File name that marks a module manifest.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// File name of the build configuration that is never materialized by default.
pub const BUILD_CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Top-level manifest key holding the declared dependencies.
pub const DEPENDENCY_SECTION: &str = "fisand";

/// Parses manifest text and returns its dependency section.
///
/// Never fails: malformed JSON, a missing section or a section that is not an
/// object all yield an empty map. Values that are not strings count as "no
/// reference declared".
pub fn parse_manifest(content: &str) -> DependencyMap {
    let manifest: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Manifest is not valid JSON, assuming no dependencies: {}",
                e
            );
            return DependencyMap::new();
        }
    };

    let Some(section) = manifest.get(DEPENDENCY_SECTION) else {
        debug!("Manifest has no '{}' section", DEPENDENCY_SECTION);
        return DependencyMap::new();
    };

    let Some(entries) = section.as_object() else {
        warn!(
            "Manifest '{}' section is not an object, assuming no dependencies",
            DEPENDENCY_SECTION
        );
        return DependencyMap::new();
    };

    entries
        .iter()
        .map(|(name, reference)| (name.clone(), reference.as_str().map(str::to_string)))
        .collect()
}
