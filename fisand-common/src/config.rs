// fisand-common/src/config.rs
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::{FisandError, Result};

pub const CONFIG_FILE_NAME: &str = "fisand.json";
pub const DEFAULT_HOST: &str = "https://gitlab.com";
/// Destination directory used when neither `-d` nor a workspace is set.
pub const DEFAULT_MODULES_DIR: &str = "fisand-modules";

const TOKEN_ENV: &str = "FISAND_GITLAB_TOKEN";
const HOST_ENV: &str = "FISAND_GITLAB_HOST";
const GROUP_ENV: &str = "FISAND_GITLAB_GROUP";

/// The `config` object of `fisand.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// On-disk layout of `fisand.json`.
///
/// Top-level keys other than `config` and `excludes` record imported modules
/// and the reference they were imported at. Unknown values are kept verbatim
/// so rewriting the file never loses data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
    #[serde(flatten)]
    pub modules: BTreeMap<String, Value>,
}

impl LocalConfig {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FisandError::Config(format!("{CONFIG_FILE_NAME} is malformed: {e}")))
    }

    /// Reads the file at `path`; `Ok(None)` when it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FisandError::Config(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn workspace(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.workspace.as_deref())
            .filter(|w| !w.is_empty())
    }

    pub fn set_workspace(&mut self, workspace: &str) {
        self.config.get_or_insert_with(Settings::default).workspace = Some(workspace.to_string());
    }

    /// Reference recorded for a previously imported module.
    pub fn module_reference(&self, module: &str) -> Option<&str> {
        self.modules.get(module).and_then(Value::as_str)
    }

    /// Records `module` at `reference` unless a reference is already recorded.
    /// Returns `true` when the file content changed.
    pub fn record_module(&mut self, module: &str, reference: &str) -> bool {
        if self.module_reference(module).is_some() {
            return false;
        }
        self.modules
            .insert(module.to_string(), Value::String(reference.to_string()));
        true
    }
}

/// Immutable configuration snapshot for one invocation.
///
/// Built once before any remote call and passed by reference to every
/// component; nothing mutates it while a fetch is running.
#[derive(Debug, Clone)]
pub struct Config {
    pub cwd: PathBuf,
    pub config_path: PathBuf,
    pub host: String,
    pub token: Option<String>,
    pub group_id: Option<String>,
    pub workspace: Option<String>,
    pub project_id: Option<u64>,
    pub excludes: Option<Vec<String>>,
}

impl Config {
    /// Snapshot with defaults and no credentials, rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        Self {
            config_path: cwd.join(CONFIG_FILE_NAME),
            cwd,
            host: DEFAULT_HOST.to_string(),
            token: None,
            group_id: None,
            workspace: None,
            project_id: None,
            excludes: None,
        }
    }

    /// Loads `fisand.json` from `cwd`, applying environment overrides.
    ///
    /// A missing file is a configuration error: every command that talks to
    /// the remote needs the credentials it holds.
    pub fn load(cwd: &Path) -> Result<Self> {
        let (config, local) = Self::load_with_local(cwd)?;
        if local.is_none() {
            return Err(FisandError::Config(format!(
                "{CONFIG_FILE_NAME} does not exist, use `fisand workspace` to initialize it"
            )));
        }
        Ok(config)
    }

    /// Like [`Config::load`], but tolerates a missing `fisand.json` and also
    /// returns the parsed file so it can be rewritten.
    pub fn load_with_local(cwd: &Path) -> Result<(Self, Option<LocalConfig>)> {
        debug!("Loading fisand configuration from {}", cwd.display());
        let mut config = Self::new(cwd);

        let local = LocalConfig::read(&config.config_path)?;
        if let Some(local) = &local {
            config.apply_local(local);
        } else {
            debug!("{} not found in {}", CONFIG_FILE_NAME, cwd.display());
        }

        if let Ok(token) = env::var(TOKEN_ENV) {
            if !token.is_empty() {
                debug!("Using token from {}", TOKEN_ENV);
                config.token = Some(token);
            }
        }
        if let Ok(host) = env::var(HOST_ENV) {
            if !host.is_empty() {
                debug!("Using host from {}: {}", HOST_ENV, host);
                config.host = host;
            }
        }
        if let Ok(group_id) = env::var(GROUP_ENV) {
            if !group_id.is_empty() {
                debug!("Using group id from {}: {}", GROUP_ENV, group_id);
                config.group_id = Some(group_id);
            }
        }
        config.host = config.host.trim_end_matches('/').to_string();

        debug!("Configuration loaded successfully.");
        Ok((config, local))
    }

    fn apply_local(&mut self, local: &LocalConfig) {
        if let Some(settings) = &local.config {
            self.workspace = settings.workspace.clone().filter(|w| !w.is_empty());
            self.token = settings.token.clone().filter(|t| !t.is_empty());
            self.group_id = settings.group_id.clone().filter(|g| !g.is_empty());
            if let Some(host) = settings.host.as_deref().filter(|h| !h.is_empty()) {
                self.host = host.to_string();
            }
        }
        self.excludes = local.excludes.clone();
    }

    pub fn with_project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            FisandError::Config(format!(
                "Please set your gitlab token in {CONFIG_FILE_NAME} or {TOKEN_ENV}"
            ))
        })
    }

    pub fn group_id(&self) -> Result<&str> {
        self.group_id.as_deref().ok_or_else(|| {
            FisandError::Config(format!(
                "Please set your repo group_id in {CONFIG_FILE_NAME} or {GROUP_ENV}"
            ))
        })
    }

    pub fn project_id(&self) -> Result<u64> {
        self.project_id.ok_or_else(|| {
            FisandError::Config("Workspace project has not been resolved".to_string())
        })
    }

    /// Prefix that marks a dependency as belonging to this workspace; empty if unset.
    pub fn workspace_prefix(&self) -> &str {
        self.workspace.as_deref().unwrap_or("")
    }

    /// Default destination root: `./<workspace>` or `./fisand-modules`.
    pub fn default_root(&self) -> PathBuf {
        match self.workspace.as_deref() {
            Some(workspace) => self.cwd.join(workspace),
            None => self.cwd.join(DEFAULT_MODULES_DIR),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
