use serde::{Deserialize, Serialize};

/// A project of the configured group; each one is a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Project {
    pub fn label(&self) -> String {
        match self.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!("{}({})", self.name, description),
            None => self.name.clone(),
        }
    }
}
