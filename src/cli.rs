use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use wo_governance::types::WorkTypeCategory;

#[derive(Parser, Debug)]
#[command(
    name = "wo-governance",
    version,
    about = "Work order classification and governance reporting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify, summarize and export every governance table.
    Report(ReportArgs),
    /// Classify only and write the classified records.
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    pub input: PathBuf,

    /// Reference date for overdue checks (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "outputs/reports")]
    pub out_dir: PathBuf,

    #[arg(long, value_enum)]
    pub work_type: Option<WorkTypeArg>,

    #[arg(long, default_value_t = 3)]
    pub preview_rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    pub input: PathBuf,

    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "outputs/classified_work_orders.csv")]
    pub output: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum WorkTypeArg {
    Pm,
    Ca,
    Rql,
    Other,
}

impl From<WorkTypeArg> for WorkTypeCategory {
    fn from(arg: WorkTypeArg) -> Self {
        match arg {
            WorkTypeArg::Pm => WorkTypeCategory::Pm,
            WorkTypeArg::Ca => WorkTypeCategory::Ca,
            WorkTypeArg::Rql => WorkTypeCategory::Rql,
            WorkTypeArg::Other => WorkTypeCategory::Other,
        }
    }
}
