// fisand/src/cli/workspace.rs
use clap::Args;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use fisand_aio::write_json_async;
use fisand_common::config::{Config, LocalConfig};
use fisand_common::error::{FisandError, Result};
use fisand_common::model::Project;
use fisand_net::GitLabClient;
use tracing::debug;

use crate::ui::create_spinner;

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Name of the group project to use; prompts when omitted
    pub name: Option<String>,
}

impl WorkspaceArgs {
    pub async fn run(&self, config: &Config, local: Option<LocalConfig>) -> Result<()> {
        let client = GitLabClient::new(config)?;
        let group_id = config.group_id()?;

        let spinner = create_spinner("Loading workspaces...");
        let projects = client.list_group_projects(group_id).await;
        spinner.finish_and_clear();
        let projects = projects?;

        if projects.is_empty() {
            return Err(FisandError::Config(format!(
                "Group {group_id} has no projects to use as a workspace"
            )));
        }

        let chosen = match self.name.as_deref() {
            Some(name) if projects.iter().any(|p| p.name == name) => name.to_string(),
            Some(name) => {
                println!(
                    "{} '{}' is not a project of group {}",
                    "Warning:".yellow().bold(),
                    name,
                    group_id
                );
                prompt_for_workspace(&projects)?
            }
            None => prompt_for_workspace(&projects)?,
        };

        let mut local = local.unwrap_or_default();
        local.set_workspace(&chosen);
        write_json_async(&config.config_path, &local).await?;
        debug!(
            "Wrote workspace '{}' to {}",
            chosen,
            config.config_path.display()
        );

        println!("{} Workspace set to {}", "✓".green().bold(), chosen.bold());
        Ok(())
    }
}

fn prompt_for_workspace(projects: &[Project]) -> Result<String> {
    let labels: Vec<String> = projects.iter().map(Project::label).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a workspace")
        .items(&labels)
        .default(0)
        .interact_opt()
        .map_err(|e| FisandError::Generic(format!("Workspace prompt failed: {e}")))?;

    selection
        .map(|index| projects[index].name.clone())
        .ok_or_else(|| FisandError::Generic("No workspace selected".to_string()))
}
