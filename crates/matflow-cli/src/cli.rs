use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "matflow - build LAMMPS and VASP workflows, rewrite them with powerups, and replay them locally.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build LAMMPS workflows.
    Lammps(LammpsArgs),
    /// Apply a pipeline of powerups (described in TOML) to a workflow.
    Powerup(PowerupArgs),
    /// Show the fireworks of a workflow and the VASP run tasks powerups would match.
    Inspect(InspectArgs),
    /// Run a workflow on the local replay backend.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct LammpsArgs {
    #[command(subcommand)]
    pub command: LammpsCommands,
}

#[derive(Subcommand, Debug)]
pub enum LammpsCommands {
    /// Constant-volume, constant-temperature run from the built-in template.
    Nvt(NvtArgs),
    /// Run whose input commands come from a template file (JSON or TOML).
    Template(TemplateArgs),
}

/// Options shared by every LAMMPS workflow.
#[derive(Args, Debug)]
pub struct LammpsCommonArgs {
    /// LAMMPS data file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub data: PathBuf,

    /// Embed the data file contents in the workflow instead of its path.
    #[arg(long)]
    pub inline: bool,

    /// Name of the data file in the launch directory.
    #[arg(long, value_name = "NAME")]
    pub data_filename: Option<String>,

    /// Name of the input file in the launch directory.
    #[arg(long, value_name = "NAME")]
    pub input_filename: Option<String>,

    /// LAMMPS binary.
    #[arg(long = "bin", value_name = "BIN")]
    pub lammps_bin: Option<String>,

    /// The data file already contains force-field coefficients.
    #[arg(long)]
    pub forcefield: bool,

    /// Override or add an input command. Can be used multiple times.
    /// Example: -S run=5000 -S 'fix=["1 all nvt temp 300 300 100"]'
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Path for the workflow JSON.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct NvtArgs {
    #[command(flatten)]
    pub common: LammpsCommonArgs,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Job name recorded in the rendered input.
    #[arg(long, required = true, value_name = "NAME")]
    pub job_name: String,

    /// Template file with the ordered input commands.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub template: PathBuf,

    #[command(flatten)]
    pub common: LammpsCommonArgs,
}

#[derive(Args, Debug)]
pub struct PowerupArgs {
    /// Workflow JSON to rewrite.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Powerup pipeline in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the rewritten workflow JSON.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Workflow JSON to inspect.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow JSON to run.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory under which every launch gets its own `launcher_NNNN` directory.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub launch_dir: PathBuf,

    /// Worker environment entry, read by `>>key<<` task parameters.
    /// Can be used multiple times. Example: --env 'incar_update={"NCORE":4}'
    #[arg(short, long = "env", value_name = "KEY=VALUE", num_args(0..))]
    pub env_values: Vec<String>,

    /// Worker name.
    #[arg(long, value_name = "NAME")]
    pub worker_name: Option<String>,

    /// Stop after this many launches.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_loops: Option<usize>,
}
