//! CLI argument parsing using clap.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// CteScope - extract runnable SQL from a CTE at a cursor position
#[derive(Parser, Debug)]
#[command(name = "ctescope")]
#[command(
    about = "Extract the runnable query for the CTE under a cursor",
    long_about = None
)]
#[command(version)]
#[command(group(ArgGroup::new("position").required(true).args(["cursor", "line"])))]
pub struct Args {
    /// SQL file to read (reads from stdin if omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Cursor position as a byte offset into the SQL text
    #[arg(long, value_name = "OFFSET")]
    pub cursor: Option<usize>,

    /// Cursor line (1-based, requires --column)
    #[arg(long, value_name = "LINE", requires = "column")]
    pub line: Option<usize>,

    /// Cursor column in characters (1-based, requires --line)
    #[arg(long, value_name = "COLUMN", requires = "line")]
    pub column: Option<usize>,

    /// How the runnable SQL and highlight spans are assembled
    #[arg(short, long, default_value = "full", value_enum)]
    pub mode: ModeArg,

    /// Order in which required CTEs are emitted
    #[arg(long, default_value = "document", value_enum)]
    pub ordering: OrderingArg,

    /// SQL dialect
    #[arg(short, long, default_value = "generic", value_enum)]
    pub dialect: DialectArg,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Log analysis steps to stderr (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Postgresql,
    Redshift,
    Snowflake,
    Sqlite,
}

impl From<DialectArg> for ctescope_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => ctescope_core::Dialect::Generic,
            DialectArg::Ansi => ctescope_core::Dialect::Ansi,
            DialectArg::Bigquery => ctescope_core::Dialect::Bigquery,
            DialectArg::Clickhouse => ctescope_core::Dialect::Clickhouse,
            DialectArg::Databricks => ctescope_core::Dialect::Databricks,
            DialectArg::Duckdb => ctescope_core::Dialect::Duckdb,
            DialectArg::Hive => ctescope_core::Dialect::Hive,
            DialectArg::Mssql => ctescope_core::Dialect::Mssql,
            DialectArg::Mysql => ctescope_core::Dialect::Mysql,
            DialectArg::Postgres | DialectArg::Postgresql => ctescope_core::Dialect::Postgres,
            DialectArg::Redshift => ctescope_core::Dialect::Redshift,
            DialectArg::Snowflake => ctescope_core::Dialect::Snowflake,
            DialectArg::Sqlite => ctescope_core::Dialect::Sqlite,
        }
    }
}

/// Text assembly and highlight policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// WITH + every required CTE + the target query
    Full,
    /// Same SQL as full; the last CTE is highlighted by its body only
    Progressive,
    /// Body of the last CTE only
    Inner,
    /// Dependencies, with the target CTE's body as the final statement
    Deps,
}

impl From<ModeArg> for ctescope_core::BuildMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Full => ctescope_core::BuildMode::FullCte,
            ModeArg::Progressive => ctescope_core::BuildMode::ProgressiveCte,
            ModeArg::Inner => ctescope_core::BuildMode::SingleCteInner,
            ModeArg::Deps => ctescope_core::BuildMode::DependenciesWithTargetInner,
        }
    }
}

/// CTE emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingArg {
    /// Keep CTEs in the order they are written
    Document,
    /// Emit dependencies before the CTEs that use them
    Dependency,
}

impl From<OrderingArg> for ctescope_core::CteOrdering {
    fn from(o: OrderingArg) -> Self {
        match o {
            OrderingArg::Document => ctescope_core::CteOrdering::DocumentOrder,
            OrderingArg::Dependency => ctescope_core::CteOrdering::DependencyOrder,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with highlighted ranges
    Text,
    /// The extraction result as JSON
    Json,
    /// Runnable SQL only
    Sql,
}
