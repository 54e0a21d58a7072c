//! The command line interface for the program.
use crate::chp::Technology;
use crate::input::load_study;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Skip drawing plots
    #[arg(long)]
    pub no_plots: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a study.
    Run {
        /// Path to the study directory.
        study_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example studies.
    Example {
        /// The available subcommands for managing example studies.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a study.
    Validate {
        /// The path to the study directory.
        study_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
    /// List the catalogued CHP systems.
    ChpCatalogue,
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { study_dir, opts } => handle_run_command(&study_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { study_dir } => handle_validate_command(&study_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
            Self::ChpCatalogue => {
                print!("{}", chp_catalogue_table());
                Ok(())
            }
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ dg_valprop --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    study_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(study_path)?;
        &pathbuf
    };

    let overwritten = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwritten {
        warn!("Output folder was overwritten");
    }

    // Load the study to run
    let study = load_study(study_path).context("Failed to load study.")?;
    info!("Loaded study from {}", study_path.display());
    info!("Output folder: {}", output_path.display());
    write_metadata(output_path, study_path).context("Failed to save metadata.")?;

    crate::analysis::run(&study, output_path, settings.plots && !opts.no_plots)?;
    info!("Study complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(study_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the study
    let study = load_study(study_path).context("Failed to validate study.")?;
    info!(
        "Study validation successful: {} market contexts, {} grid points each",
        study.market.contexts().count(),
        study.market.sweep.len()
    );

    Ok(())
}

/// A table of the catalogued CHP systems
fn chp_catalogue_table() -> String {
    let mut out = format!(
        "{:<14}{:>12}{:>24}{:>24}{:>28}\n",
        "technology",
        "power (kW)",
        "electric_efficiency",
        "installed_price ($/W)",
        "maintenance_cost ($/kWh)"
    );
    for technology in Technology::iter() {
        for system in technology.systems() {
            out.push_str(&format!(
                "{:<14}{:>12}{:>24.2}{:>24.3}{:>28.3}\n",
                technology.to_string(),
                system.power_kw,
                system.electric_efficiency.0,
                system.installed_price.value(),
                system.maintenance_cost.value()
            ));
        }
    }

    out
}
