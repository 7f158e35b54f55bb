pub mod definition;
pub mod manifest;

pub use definition::DependencyMap;
pub use manifest::{
    parse_manifest, BUILD_CONFIG_FILE_NAME, DEPENDENCY_SECTION, MANIFEST_FILE_NAME,
};
