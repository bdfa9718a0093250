// System status display — DB stats and availability of the optional
// tagger lexicon and chart font.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::topics::chart;

/// Display system status to the terminal.
pub async fn show(db: Option<&Arc<dyn Database>>, config: &Config) -> Result<()> {
    match db {
        Some(db) if Path::new(&config.db_path).exists() => {
            let file_size = std::fs::metadata(&config.db_path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            println!("Database: {} ({})", config.db_path, file_size);

            let apps = db.list_apps().await?;
            let reviews = db.count_reviews().await?;
            println!("Stored apps: {}, reviews: {}", apps.len(), reviews);
            if let Some(latest) = apps.first() {
                println!("Latest app: {} ({})", latest.app_name, latest.created_at);
            }
        }
        _ => {
            println!("Database: not initialized");
            println!("  Run `reviewlens init` to set up the database.");
        }
    }

    if config.lexicon_present() {
        println!("POS lexicon: {}", config.lexicon_path.display());
    } else {
        println!(
            "POS lexicon: not found at {} (heuristic adjective extraction)",
            config.lexicon_path.display()
        );
    }

    match chart::locate_font(config.chart_font.as_deref()) {
        Some(font) => println!("Chart font: {}", font.display()),
        None => {
            println!("Chart font: none found (charts disabled)");
            println!("  Set REVIEWLENS_CHART_FONT to a .ttf file to enable them");
        }
    }

    println!(
        "Defaults: {} topics, {} top words",
        config.n_topics, config.n_top_words
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
