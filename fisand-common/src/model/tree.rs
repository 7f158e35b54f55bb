// fisand-common/src/model/tree.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference used when neither the caller nor a manifest names one.
pub const DEFAULT_REFERENCE: &str = "master";

/// Directory in the source repository under which every module lives.
pub const PACKAGES_ROOT: &str = "packages";

/// Kind of an entry in a remote directory listing.
///
/// Anything other than `tree` or `blob` is kept as `Unknown` so a single odd
/// entry (e.g. a submodule `commit`) never fails the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryKind {
    Tree,
    Blob,
    Unknown(String),
}

impl From<String> for EntryKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tree" => EntryKind::Tree,
            "blob" => EntryKind::Blob,
            _ => EntryKind::Unknown(value),
        }
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Tree => "tree".to_string(),
            EntryKind::Blob => "blob".to_string(),
            EntryKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Tree => f.write_str("tree"),
            EntryKind::Blob => f.write_str("blob"),
            EntryKind::Unknown(other) => f.write_str(other),
        }
    }
}

/// One item of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Leaf name.
    pub name: String,
    /// Full path inside the source repository; the lookup key for file fetches.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn tree(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Tree,
        }
    }

    pub fn blob(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Blob,
        }
    }
}

/// The unit addressed by a tree query: a module path plus a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    pub module_name: String,
    pub reference: String,
}

impl FetchTarget {
    pub fn new(module_name: impl Into<String>, reference: Option<&str>) -> Self {
        Self {
            module_name: module_name.into(),
            reference: reference
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_REFERENCE)
                .to_string(),
        }
    }

    /// Target for a subdirectory of this module, at the same reference.
    pub fn child(&self, name: &str) -> Self {
        let module_name = if self.module_name.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.module_name, name)
        };
        Self {
            module_name,
            reference: self.reference.clone(),
        }
    }

    /// Path of this target inside the source repository, e.g. `packages/ui/src`.
    pub fn remote_path(&self) -> String {
        if self.module_name.is_empty() {
            PACKAGES_ROOT.to_string()
        } else {
            format!("{}/{}", PACKAGES_ROOT, self.module_name)
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.module_name, self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_keeps_unrecognized_types() {
        let entries: Vec<TreeEntry> = serde_json::from_str(
            r#"[
                {"name": "src", "type": "tree", "path": "packages/ui/src"},
                {"name": "index.ts", "type": "blob", "path": "packages/ui/index.ts"},
                {"name": "vendor", "type": "commit", "path": "packages/ui/vendor"}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries[0].kind, EntryKind::Tree);
        assert_eq!(entries[1].kind, EntryKind::Blob);
        assert_eq!(entries[2].kind, EntryKind::Unknown("commit".to_string()));
    }

    #[test]
    fn target_defaults_to_mainline_reference() {
        assert_eq!(FetchTarget::new("ui", None).reference, DEFAULT_REFERENCE);
        let blank = FetchTarget::new("ui", Some(""));
        assert_eq!(blank.reference, DEFAULT_REFERENCE);
        assert_eq!(FetchTarget::new("ui", Some("v2")).reference, "v2");
    }

    #[test]
    fn child_target_nests_module_path() {
        let target = FetchTarget::new("ui", Some("v2"));
        let child = target.child("src").child("button");
        assert_eq!(child.module_name, "ui/src/button");
        assert_eq!(child.reference, "v2");
        assert_eq!(child.remote_path(), "packages/ui/src/button");
        assert_eq!(FetchTarget::new("", None).remote_path(), "packages");
    }
}
