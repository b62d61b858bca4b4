//! CteScope CLI - runnable SQL for the CTE under a cursor

use ctescope_cli::cli;
use ctescope_cli::input;
use ctescope_cli::output;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ctescope_core::{
    cursor_offset_from_line_col, extract_cte_query, ExtractOptions, ExtractRequest, ExtractResult,
    ExtractStatus, Severity,
};
use is_terminal::IsTerminal;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Args, OutputFormat};
use output::{format_json, format_text, offset_to_line_col};

/// Nothing to extract at the cursor, or the document could not be analyzed.
const EXIT_FAILURE: u8 = 1;
/// Configuration error (unreadable input, cursor outside the document).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(ready) => {
            if ready {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
        Err(e) => {
            eprintln!("ctescope: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ctescope_core=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .with(filter)
        .init();
}

/// Returns whether a runnable query was produced.
fn run(args: Args) -> Result<bool> {
    let source = input::read_input(args.file.as_ref())?;
    let cursor_offset = resolve_cursor(&args, &source.content)?;

    tracing::debug!(
        source = %source.name,
        cursor_offset,
        mode = ?args.mode,
        "extracting"
    );

    let request = ExtractRequest::new(source.content.clone(), cursor_offset, args.mode.into())
        .with_dialect(args.dialect.into())
        .with_options(ExtractOptions {
            ordering: args.ordering.into(),
        });
    let result = extract_cte_query(&request);

    let rendered = match args.format {
        OutputFormat::Text => {
            let colored = args.output.is_none() && io::stdout().is_terminal();
            format_text(&result, &source.name, &source.content, args.quiet, colored)
        }
        OutputFormat::Json => format_json(&result, args.compact),
        OutputFormat::Sql => result.sql.clone().unwrap_or_default(),
    };

    if args.format != OutputFormat::Text && !args.quiet {
        print_issues_to_stderr(&result, &source.content);
    }

    if !rendered.is_empty() {
        write_output(&args.output, &rendered)?;
    }

    Ok(result.status == ExtractStatus::Ready)
}

fn resolve_cursor(args: &Args, sql: &str) -> Result<usize> {
    if let Some(offset) = args.cursor {
        return Ok(offset);
    }

    match (args.line, args.column) {
        (Some(line), Some(column)) => cursor_offset_from_line_col(sql, line, column)
            .ok_or_else(|| anyhow!("position {line}:{column} is outside the document")),
        _ => Err(anyhow!("a cursor position is required (--cursor or --line/--column)")),
    }
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn print_issues_to_stderr(result: &ExtractResult, sql: &str) {
    for issue in &result.issues {
        let level = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };

        let location = issue
            .span
            .map(|span| {
                let (line, col) = offset_to_line_col(sql, span.start);
                format!(" ({line}:{col})")
            })
            .unwrap_or_default();

        eprintln!("ctescope: {level}:{location} {}", issue.message);
    }
}
