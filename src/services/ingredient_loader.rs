//! Reads the two-column ingredient CSV (`name,measurement_unit`, no header).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sea_orm::{DbConn, DbErr};
use tracing::info;

use crate::db::services::replace_all_ingredients;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Line {line}: expected 2 columns, found {found}")]
    Malformed { line: u64, found: usize },
    #[error("Line {line}: ingredient name is empty")]
    EmptyName { line: u64 },
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Parses every row up front so a bad file never touches the database.
pub fn read_ingredient_rows<R: Read>(reader: R) -> Result<Vec<(String, String)>, LoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() != 2 {
            return Err(LoaderError::Malformed {
                line,
                found: record.len(),
            });
        }
        if record[0].is_empty() {
            return Err(LoaderError::EmptyName { line });
        }
        rows.push((record[0].to_string(), record[1].to_string()));
    }
    Ok(rows)
}

/// Replaces the whole ingredient table with the contents of `path`.
pub async fn load_ingredients_file(db: &DbConn, path: &Path) -> Result<u64, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let rows = read_ingredient_rows(file)?;
    info!(path = %path.display(), rows = rows.len(), "Parsed ingredient file.");

    let inserted = replace_all_ingredients(db, rows).await?;
    info!(inserted, "Ingredients fully loaded.");
    Ok(inserted)
}
