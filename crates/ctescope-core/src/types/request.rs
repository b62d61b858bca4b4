//! Request types for the CTE extraction API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A request to extract a runnable query at a cursor position.
///
/// The document may contain several statements and several `WITH` scopes; only
/// the scope nearest to `cursor_offset` is considered.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// The SQL document (UTF-8 string, multi-statement supported)
    pub sql: String,

    /// SQL dialect used for tokenization
    #[serde(default)]
    pub dialect: Dialect,

    /// Byte offset of the cursor in the SQL string
    pub cursor_offset: usize,

    /// How the runnable SQL and highlight spans are assembled
    #[serde(default)]
    pub mode: BuildMode,

    /// Optional extraction options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ExtractOptions>,
}

impl ExtractRequest {
    /// Convenience constructor using the generic dialect and default options.
    pub fn new(sql: impl Into<String>, cursor_offset: usize, mode: BuildMode) -> Self {
        Self {
            sql: sql.into(),
            dialect: Dialect::Generic,
            cursor_offset,
            mode,
            options: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Options controlling dependency resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Order in which required CTEs are emitted
    #[serde(default)]
    pub ordering: CteOrdering,
}

/// Order in which resolved CTE dependencies are emitted.
///
/// `DocumentOrder` keeps the CTEs in the order they are written, which is only
/// executable when every CTE is defined before the CTEs that use it.
/// `DependencyOrder` emits dependencies first, falling back to document order
/// between unrelated CTEs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum CteOrdering {
    #[default]
    DocumentOrder,
    DependencyOrder,
}

/// Text assembly and highlight policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum BuildMode {
    /// `WITH` + every CTE + the target query; full spans for every part.
    #[default]
    FullCte,
    /// Same text as `FullCte`; the last CTE is highlighted by its inner body only.
    ProgressiveCte,
    /// Inner body highlight for each CTE.
    SingleCteInner,
    /// `WITH` + dependencies, with the target CTE's inner body as the final statement.
    DependenciesWithTargetInner,
}

/// SQL dialect for tokenization.
///
/// Dialects differ in quoting and comment rules, which affects where token
/// boundaries fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
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
    Redshift,
    Snowflake,
    Sqlite,
}

impl Dialect {
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            AnsiDialect, BigQueryDialect, ClickHouseDialect, DatabricksDialect, DuckDbDialect,
            GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
            RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
        };
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::Ansi => Box::new(AnsiDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Clickhouse => Box::new(ClickHouseDialect {}),
            Self::Databricks => Box::new(DatabricksDialect {}),
            Self::Duckdb => Box::new(DuckDbDialect {}),
            Self::Hive => Box::new(HiveDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Redshift => Box::new(RedshiftSqlDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}
