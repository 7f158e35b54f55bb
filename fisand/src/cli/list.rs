// fisand/src/cli/list.rs
use clap::Args;
use colored::Colorize;
use fisand_common::config::{Config, LocalConfig};
use fisand_common::error::Result;
use fisand_common::model::DEFAULT_REFERENCE;

use crate::cli::connect_workspace;
use crate::ui::create_spinner;

#[derive(Args, Debug)]
pub struct List {
    /// Branch or tag to list modules at
    #[arg(short, long, default_value = DEFAULT_REFERENCE)]
    pub reference: String,
}

impl List {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let client = connect_workspace(config).await?;

        let spinner = create_spinner("Loading modules...");
        let modules = client.list_modules(&self.reference).await;
        spinner.finish_and_clear();
        let modules = modules?;

        if modules.is_empty() {
            let message = format!("No modules found at {}", self.reference);
            println!("{}", message.yellow());
            return Ok(());
        }

        let local = LocalConfig::read(&config.config_path)?.unwrap_or_default();
        println!(
            "{}",
            format!("{} modules available at {}:", modules.len(), self.reference).bold()
        );
        for module in &modules {
            match local.module_reference(module) {
                Some(reference) => println!(
                    "  {} {}",
                    module.green(),
                    format!("(imported at {reference})").dimmed()
                ),
                None => println!("  {module}"),
            }
        }
        Ok(())
    }
}
