use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "portaxe", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// More log output; repeat for more. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file instead of `~/.portaxe/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "c", name = "convert", about = "Extract an installer into a portable layout")]
    Convert(ConvertArg),
    #[command(name = "classify", about = "Report the installer technology of a file")]
    Classify(FileArg),
    #[command(alias = "i", name = "inspect", about = "Show architecture, subsystem and imports of an executable")]
    Inspect(FileArg),
    #[command(name = "verify", about = "Check a portable layout against its manifest")]
    Verify(VerifyArg),
    #[command(name = "tools", about = "List external extraction tools and whether they can be used")]
    Tools,
}

#[derive(Clone, Debug, Args)]
pub struct ConvertArg {
    pub input: PathBuf,

    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Application name; defaults to the input file stem.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Per-attempt timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub no_7zip: bool,

    #[arg(long)]
    pub no_innoextract: bool,

    #[arg(long)]
    pub no_msi_extract: bool,

    /// Do not stage redistributables into App/Dependencies.
    #[arg(long)]
    pub no_dependencies: bool,

    #[arg(long)]
    pub backup_registry: bool,

    #[arg(long, value_name = "DIR")]
    pub redist_dir: Option<PathBuf>,

    /// Keep extraction attempts in this directory instead of a temporary one.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Keep the temporary work directory after the job.
    #[arg(long)]
    pub keep_work_dir: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Args)]
pub struct FileArg {
    pub path: PathBuf,

    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Args)]
pub struct VerifyArg {
    /// Root of a portable layout, the directory holding `manifest.json`.
    pub layout: PathBuf,
}
