use std::path::PathBuf;

/// Boundary lookup and census apportionment CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "civicmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Directory of layer GeoJSON files
    #[arg(long, default_value = "data/standard", value_hint = clap::ValueHint::DirPath)]
    pub data_dir: PathBuf,

    /// Load layers over HTTP from this base URL instead of the data directory
    #[arg(long)]
    pub base_url: Option<String>,

    /// Layer catalog JSON overriding the built-in one
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Look up which boundary of each layer contains a point
    Lookup(LookupArgs),

    /// Apportion census block demographics to a target layer
    Apportion(ApportionArgs),

    /// Validate an apportionment output against source totals
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

#[derive(clap::Args, Debug)]
pub struct ApportionArgs {
    /// Target layer name, e.g. lapd_divisions
    #[arg(long)]
    pub layer: String,

    /// Census blocks GeoJSON file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub blocks: PathBuf,

    /// Output CSV, defaults to "<layer>_demographics.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Target layer name, e.g. lapd_divisions
    #[arg(long)]
    pub layer: String,

    /// Census blocks GeoJSON file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub blocks: PathBuf,

    /// Apportionment CSV to check, defaults to "<layer>_demographics.csv"
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub demographics: Option<PathBuf>,

    /// Conservation tolerance, percent
    #[arg(long, default_value_t = 1.0)]
    pub tolerance: f64,

    /// Also write the per-column report as CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub report_output: Option<PathBuf>,
}
