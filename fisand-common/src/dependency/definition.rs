// fisand-common/src/dependency/definition.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_REFERENCE;

/// Dependencies declared by a module manifest: name (possibly prefixed with a
/// workspace, e.g. `fisand/ui`) to a branch, tag or commit.
///
/// A `None` reference means the mainline default. Built once per module and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyMap(BTreeMap<String, Option<String>>);

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Declared reference for `name`, falling back to the mainline default.
    pub fn reference_for(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|r| r.as_deref().unwrap_or(DEFAULT_REFERENCE))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for DependencyMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_falls_back_to_mainline() {
        let deps: DependencyMap = [("fisand/ui", Some("v2")), ("fisand/core", None::<&str>)]
            .into_iter()
            .collect();

        assert_eq!(deps.reference_for("fisand/ui"), Some("v2"));
        assert_eq!(deps.reference_for("fisand/core"), Some(DEFAULT_REFERENCE));
        assert_eq!(deps.reference_for("fisand/absent"), None);
    }
}
