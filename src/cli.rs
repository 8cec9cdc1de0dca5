use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_ANNOTATION_TYPE: &str = "- Concerns/Observations";
pub const DEFAULT_TABLE: &str = "uhri_incidents";

#[derive(Parser, Debug)]
#[command(
    name = "uhri-import",
    version,
    about = "Load UHRI annotation exports into a hosted table store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    Types(TypesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = "export-full-en.json")]
    pub input: PathBuf,

    #[arg(long, default_value = DEFAULT_ANNOTATION_TYPE)]
    pub annotation_type: String,

    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    #[arg(long, value_enum, default_value_t = SinkKind::Rest)]
    pub sink: SinkKind,

    #[arg(long, default_value = "uhri_incidents.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, default_value = ".env.local")]
    pub env_file: PathBuf,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SinkKind {
    Rest,
    Sqlite,
}

impl SinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TypesArgs {
    #[arg(long, default_value = "export-full-en.json")]
    pub input: PathBuf,
}
