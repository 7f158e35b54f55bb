// fisand/src/cli/import.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use fisand_aio::{create_dir_all_async, write_json_async};
use fisand_common::config::{Config, LocalConfig};
use fisand_common::error::{FisandError, Result};
use fisand_common::model::DEFAULT_REFERENCE;
use fisand_core::{ExclusionPolicy, ImportOutcome, ImportSession, Materialization};
use tracing::{debug, info};

use crate::cli::connect_workspace;
use crate::ui::{create_spinner, SpinnerObserver};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Modules to download
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Destination root; defaults to ./<workspace> or ./fisand-modules
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Branch or tag for modules not yet recorded in fisand.json
    #[arg(short, long, default_value = DEFAULT_REFERENCE)]
    pub reference: String,
}

impl ImportArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let client = connect_workspace(config).await?;

        let spinner = create_spinner("Checking available modules...");
        let available = client.list_modules(&self.reference).await;
        spinner.finish_and_clear();
        let available = available?;

        let unknown: Vec<&str> = self
            .names
            .iter()
            .filter(|name| !available.contains(*name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(FisandError::Validation(format!(
                "Unknown module(s): {}. Use `fisand list` to see the available modules",
                unknown.join(", ")
            )));
        }

        let imports = self.record_references(config).await?;

        let root = match &self.dir {
            Some(dir) => config.cwd.join(dir),
            None => config.default_root(),
        };
        create_dir_all_async(&root).await?;
        info!("Importing into {}", root.display());

        let policy = ExclusionPolicy::from_config(config);
        let observer = SpinnerObserver::new();
        let mut session = ImportSession::new(
            &client,
            &policy,
            &observer,
            config.workspace_prefix(),
            &root,
        );

        let mut outcomes = Vec::with_capacity(imports.len());
        for (name, reference) in &imports {
            outcomes.push(session.import(name, Some(reference.as_str())).await?);
        }

        print_summary(&outcomes);
        Ok(())
    }

    /// Picks the reference for each requested module and records new ones in
    /// `fisand.json`. A reference already recorded there wins over `-r`.
    async fn record_references(&self, config: &Config) -> Result<Vec<(String, String)>> {
        let mut local = LocalConfig::read(&config.config_path)?.unwrap_or_default();
        let mut imports: Vec<(String, String)> = Vec::new();
        let mut changed = false;

        for name in &self.names {
            if imports.iter().any(|(seen, _)| seen == name) {
                continue;
            }
            let reference = local
                .module_reference(name)
                .unwrap_or(&self.reference)
                .to_string();
            changed |= local.record_module(name, &reference);
            imports.push((name.clone(), reference));
        }

        if changed {
            debug!(
                "Recording module references in {}",
                config.config_path.display()
            );
            write_json_async(&config.config_path, &local).await?;
        }
        Ok(imports)
    }
}

fn counts(report: &Materialization) -> String {
    format!(
        "{} written, {} inspected, {} skipped, {} failed",
        report.written_count(),
        report.inspected_count(),
        report.skipped_count(),
        report.failed_count()
    )
}

fn print_failures(report: &Materialization) {
    for (outcome, error) in report.failures() {
        println!("    {} {}: {}", "✗".red(), outcome.remote_path, error);
    }
}

fn print_summary(outcomes: &[ImportOutcome]) {
    println!();
    for outcome in outcomes {
        if outcome.already_fetched {
            println!(
                "{}{} {}",
                "==> ".bold().blue(),
                outcome.target.to_string().bold(),
                "already fetched as a dependency".dimmed()
            );
            continue;
        }
        println!(
            "{}{} {}",
            "==> ".bold().blue(),
            outcome.target.to_string().bold(),
            format!("-> {}", outcome.dest.display()).dimmed()
        );
        println!("    {}", counts(&outcome.report));
        print_failures(&outcome.report);

        let resolution = &outcome.resolution;
        if !resolution.fetched.is_empty() {
            let fetched: Vec<String> = resolution
                .fetched
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("    dependencies fetched: {}", fetched.join(", "));
            println!("    {}", counts(&resolution.report));
            print_failures(&resolution.report);
        }
        for (target, error) in &resolution.failed {
            println!("    {} dependency {}: {}", "✗".red(), target, error);
        }
        if !resolution.already_present.is_empty() {
            println!(
                "    already present: {}",
                resolution.already_present.join(", ").dimmed()
            );
        }
        if !resolution.ignored.is_empty() {
            println!(
                "    outside workspace: {}",
                resolution.ignored.join(", ").dimmed()
            );
        }
    }

    let failed = outcomes.iter().filter(|o| o.has_failures()).count();
    if failed == 0 {
        println!(
            "{} Imported {} module(s)",
            "✓".green().bold(),
            outcomes.len()
        );
    } else {
        println!(
            "{} Imported {} module(s), {} with failed entries",
            "!".yellow().bold(),
            outcomes.len(),
            failed
        );
    }
}
