//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A SQL document and the name it was read from.
#[derive(Debug, Clone)]
pub struct SqlSource {
    pub name: String,
    pub content: String,
}

/// Read the SQL document from a file, or from stdin if no file is given.
pub fn read_input(file: Option<&PathBuf>) -> Result<SqlSource> {
    match file {
        Some(path) => read_from_file(path),
        None => read_from_stdin(),
    }
}

/// Read SQL from stdin
fn read_from_stdin() -> Result<SqlSource> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(SqlSource {
        name: "<stdin>".to_string(),
        content,
    })
}

/// Read SQL from a single file
fn read_from_file(path: &Path) -> Result<SqlSource> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(SqlSource {
        name: path.display().to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "WITH a AS (SELECT 1) SELECT * FROM a").unwrap();

        let source = read_input(Some(&file.path().to_path_buf())).unwrap();
        assert!(source.content.contains("WITH a AS"));
        assert_eq!(source.name, file.path().display().to_string());
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_from_file(Path::new("/nonexistent/file.sql"));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read file"));
    }
}
