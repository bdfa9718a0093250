// Review import — loads raw review records from JSON or CSV files.
//
// JSON files hold either a bare array of reviews or an object with a
// `reviews` array (plus optional app metadata). CSV files need a header row
// with `rating` and `review_content` columns; `review_date` is optional.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::topics::Review;

/// Reviews read from a file, with any app metadata it carried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportBatch {
    pub app_name: Option<String>,
    pub download_count: Option<u64>,
    pub reviews: Vec<Review>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonImport {
    Bare(Vec<Review>),
    Wrapped {
        app_name: Option<String>,
        download_count: Option<u64>,
        reviews: Vec<Review>,
    },
}

/// Load a review file, picking the format from its extension.
pub fn load_reviews(path: &Path) -> Result<ImportBatch> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let batch = match extension.as_deref() {
        Some("json") => parse_json(file),
        Some("csv") => parse_csv(file),
        _ => anyhow::bail!(
            "Unsupported review file {}: expected a .json or .csv extension",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!(path = %path.display(), reviews = batch.reviews.len(), "Loaded review file");
    Ok(batch)
}

pub fn parse_json<R: Read>(reader: R) -> Result<ImportBatch> {
    let parsed: JsonImport =
        serde_json::from_reader(reader).context("Expected an array of reviews or {\"reviews\": [...]}")?;
    Ok(match parsed {
        JsonImport::Bare(reviews) => ImportBatch {
            reviews,
            ..ImportBatch::default()
        },
        JsonImport::Wrapped {
            app_name,
            download_count,
            reviews,
        } => ImportBatch {
            app_name,
            download_count,
            reviews,
        },
    })
}

pub fn parse_csv<R: Read>(reader: R) -> Result<ImportBatch> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut reviews = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let review: Review = result.with_context(|| format!("Invalid review on line {}", line + 2))?;
        reviews.push(review);
    }
    Ok(ImportBatch {
        reviews,
        ..ImportBatch::default()
    })
}
