//! The command line interface for the harness.
use crate::discretize::DEFAULT_MAX_STEP;
use crate::experiment::{
    ExperimentGrid, ExperimentRange, SolveOptions, run_experiments, solve_instance,
};
use crate::input::read_instance;
use crate::log;
use crate::model::{BiasWeights, Encoding, ModelOptions};
use crate::output::metadata::write_metadata;
use crate::output::{SOLUTION_FILE_NAME, create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::solution::DEFAULT_TOLERANCE;
use crate::solver::{Annealer, BruteForce, Sampler};
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use strum::Display;

pub mod example;
pub mod settings;
use example::ExampleSubcommands;
use settings::SettingsSubcommands;

/// The command line interface for the harness.
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

/// The sampler used to draw solutions from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SamplerChoice {
    /// Exhaustive enumeration (exact, small instances only)
    BruteForce,
    /// Local simulated annealing (heuristic, any size)
    Anneal,
}

impl SamplerChoice {
    /// Construct the chosen sampler.
    fn create(self, opts: &SolveOpts, settings: &Settings) -> Box<dyn Sampler> {
        match self {
            Self::BruteForce => Box::new(BruteForce::new(settings.state_limit)),
            Self::Anneal => {
                let mut annealer = Annealer::new(opts.seed);
                if let Some(sweeps) = opts.sweeps {
                    annealer = annealer.with_sweeps(sweeps);
                }
                Box::new(annealer)
            }
        }
    }
}

/// Options shared by the solve and experiment commands
#[derive(Args)]
pub struct SolveOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// The model representation to build
    #[arg(long, value_enum, default_value_t = Encoding::MultiValued)]
    pub encoding: Encoding,
    /// The sampler to draw solutions with
    #[arg(long, value_enum, default_value_t = SamplerChoice::Anneal)]
    pub sampler: SamplerChoice,
    /// Maximum spacing between adjacent non-zero power levels
    #[arg(long, default_value_t = DEFAULT_MAX_STEP)]
    pub max_step: f64,
    /// Weight of the fuel cost terms
    #[arg(long, default_value_t = 1.0)]
    pub cost_weight: f64,
    /// Weight of the startup and shutdown cost terms
    #[arg(long, default_value_t = 1.0)]
    pub transition_weight: f64,
    /// Weight of the demand penalty terms
    #[arg(long, default_value_t = 1.0)]
    pub demand_weight: f64,
    /// Weight of the one-hot exclusivity penalty
    #[arg(long, default_value_t = 1.0)]
    pub exclusivity_weight: f64,
    /// Keep the decoded power values instead of repairing them to meet demand
    #[arg(long)]
    pub no_repair: bool,
    /// Seed for the annealer
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Number of annealing sweeps (moves per variable)
    #[arg(long)]
    pub sweeps: Option<usize>,
}

impl Default for SolveOpts {
    fn default() -> Self {
        Self {
            output_dir: None,
            overwrite: false,
            encoding: Encoding::MultiValued,
            sampler: SamplerChoice::Anneal,
            max_step: DEFAULT_MAX_STEP,
            cost_weight: 1.0,
            transition_weight: 1.0,
            demand_weight: 1.0,
            exclusivity_weight: 1.0,
            no_repair: false,
            seed: 1,
            sweeps: None,
        }
    }
}

impl SolveOpts {
    /// The solve options implied by the command line arguments
    fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            model: ModelOptions {
                encoding: self.encoding,
                weights: BiasWeights {
                    cost: self.cost_weight,
                    transition: self.transition_weight,
                    demand: self.demand_weight,
                    exclusivity: self.exclusivity_weight,
                },
                max_step: self.max_step,
            },
            repair: !self.no_repair,
        }
    }
}

/// Options for the experiment grid
#[derive(Args)]
pub struct GridOpts {
    /// Smallest number of time steps (inclusive)
    #[arg(long, default_value_t = 1)]
    pub periods_start: usize,
    /// Largest number of time steps (inclusive)
    #[arg(long, default_value_t = 1)]
    pub periods_end: usize,
    /// Step between successive time step counts
    #[arg(long, default_value_t = 1)]
    pub periods_step: usize,
    /// Smallest number of units (inclusive)
    #[arg(long, default_value_t = 1)]
    pub units_start: usize,
    /// Largest number of units (inclusive)
    #[arg(long, default_value_t = 1)]
    pub units_end: usize,
    /// Step between successive unit counts
    #[arg(long, default_value_t = 1)]
    pub units_step: usize,
    /// Offset into the source demand series
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Collapse both ranges to their lower bounds
    #[arg(long)]
    pub one_shot: bool,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            periods_start: 1,
            periods_end: 1,
            periods_step: 1,
            units_start: 1,
            units_end: 1,
            units_step: 1,
            offset: 0,
            one_shot: false,
        }
    }
}

impl GridOpts {
    /// The experiment grid implied by the command line arguments
    fn to_grid(&self, seed: u64) -> ExperimentGrid {
        let mut periods = ExperimentRange {
            start: self.periods_start,
            end: self.periods_end,
            step: self.periods_step,
        };
        let mut units = ExperimentRange {
            start: self.units_start,
            end: self.units_end,
            step: self.units_step,
        };
        if self.one_shot {
            periods = periods.one_shot();
            units = units.one_shot();
        }

        ExperimentGrid {
            periods,
            units,
            offset: self.offset,
            seed,
        }
    }
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Solve a UCP instance.
    Solve {
        /// Path to the instance directory.
        instance_dir: PathBuf,
        /// Other solve options
        #[command(flatten)]
        opts: SolveOpts,
    },
    /// Run a grid of solves over instances synthesized from source data.
    Experiment {
        /// Path to the source instance directory.
        instance_dir: PathBuf,
        /// The experiment grid
        #[command(flatten)]
        grid: GridOpts,
        /// Other solve options
        #[command(flatten)]
        opts: SolveOpts,
    },
    /// Manage example instances.
    Example {
        /// The available subcommands for managing example instances.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
    /// Validate a UCP instance.
    Validate {
        /// The path to the instance directory.
        instance_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Solve { instance_dir, opts } => handle_solve_command(&instance_dir, &opts, None),
            Self::Experiment {
                instance_dir,
                grid,
                opts,
            } => handle_experiment_command(&instance_dir, &grid, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
            Self::Validate { instance_dir } => handle_validate_command(&instance_dir, None),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ ucdm --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings unless the caller has already provided them
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    if let Some(settings) = settings {
        return Ok(settings);
    }

    Settings::load().context("Failed to load settings.")
}

/// Prepare the output directory and start logging into it
fn set_up_output(instance_dir: &Path, opts: &SolveOpts, settings: &Settings) -> Result<PathBuf> {
    let output_path = if let Some(p) = opts.output_dir.clone() {
        p
    } else {
        get_output_dir(instance_dir)?
    };

    let overwrite = create_output_directory(&output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(&output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }
    info!("Output folder: {}", output_path.display());

    Ok(output_path)
}

/// Handle the `solve` command.
pub fn handle_solve_command(
    instance_dir: &Path,
    opts: &SolveOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let output_path = set_up_output(instance_dir, opts, &settings)?;

    let instance = read_instance(instance_dir).context("Failed to load instance.")?;
    info!("Loaded instance from {}", instance_dir.display());
    write_metadata(&output_path, instance_dir)?;

    let mut sampler = opts.sampler.create(opts, &settings);
    let solution = solve_instance(&instance, &opts.solve_options(), sampler.as_mut())?;
    if !solution.check(DEFAULT_TOLERANCE) {
        warn!("Solution violates power balance or capacity bounds");
    }
    info!(
        "Objective {:.3} after {:.3} seconds of sampling",
        solution.objective, solution.time
    );

    solution.save(&output_path.join(SOLUTION_FILE_NAME))?;
    info!("Solve complete!");

    Ok(())
}

/// Handle the `experiment` command.
pub fn handle_experiment_command(
    instance_dir: &Path,
    grid: &GridOpts,
    opts: &SolveOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let output_path = set_up_output(instance_dir, opts, &settings)?;

    let source = read_instance(instance_dir).context("Failed to load instance.")?;
    info!("Loaded source instance from {}", instance_dir.display());
    write_metadata(&output_path, instance_dir)?;

    let mut sampler = opts.sampler.create(opts, &settings);
    run_experiments(
        &source,
        &grid.to_grid(opts.seed),
        &opts.solve_options(),
        sampler.as_mut(),
        &output_path,
    )?;
    info!("Experiment complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(instance_dir: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    // Load/validate the instance
    let instance = read_instance(instance_dir).context("Failed to validate instance.")?;
    info!(
        "Instance validation successful ({} units, {} time steps)",
        instance.num_units(),
        instance.num_periods()
    );

    Ok(())
}
