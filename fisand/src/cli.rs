// fisand/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::Path;

use clap::{ArgAction, Parser, Subcommand};
use fisand_common::config::Config;
use fisand_common::error::{FisandError, Result};
use fisand_net::GitLabClient;
use tracing::debug;

pub mod import;
pub mod list;
pub mod workspace;

use crate::cli::import::ImportArgs;
use crate::cli::list::List;
use crate::cli::workspace::WorkspaceArgs;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    name = "fisand",
    bin_name = "fisand"
)]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the modules available in the workspace
    List(List),
    /// Select the workspace project and record it in fisand.json
    Workspace(WorkspaceArgs),
    /// Download modules and their missing workspace dependencies
    Import(ImportArgs),
}

impl Command {
    pub async fn run(&self, cwd: &Path) -> Result<()> {
        match self {
            // The workspace command is how fisand.json gets created.
            Self::Workspace(command) => {
                let (config, local) = Config::load_with_local(cwd)?;
                command.run(&config, local).await
            }
            Self::List(command) => command.run(&Config::load(cwd)?).await,
            Self::Import(command) => command.run(&Config::load(cwd)?).await,
        }
    }
}

/// Builds a client bound to the project of the configured workspace.
pub(crate) async fn connect_workspace(config: &Config) -> Result<GitLabClient> {
    let client = GitLabClient::new(config)?;
    let group_id = config.group_id()?;
    let workspace = config.workspace.as_deref().ok_or_else(|| {
        FisandError::Config(
            "No workspace selected, use `fisand workspace` to choose one".to_string(),
        )
    })?;

    let project_id = client.resolve_project_id(group_id, workspace).await?;
    debug!(
        "Workspace '{}' resolved to project {}",
        workspace, project_id
    );
    Ok(client.with_project(project_id))
}
