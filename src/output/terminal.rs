// Colored terminal output for app listings, reviews and topic reports.
//
// main.rs display paths delegate here; nothing in this module touches the
// database or the pipeline.

use colored::Colorize;

use crate::db::models::{AppInfo, StoredReview};
use crate::topics::TopicModelingResult;

/// Display the stored apps as a table.
pub fn display_app_list(apps: &[AppInfo]) {
    if apps.is_empty() {
        println!("No apps stored yet. Run `reviewlens import <app_id> <file>` first.");
        return;
    }

    println!("\n{}", format!("=== Apps ({}) ===", apps.len()).bold());
    println!();
    println!(
        "  {:<36} {:<28} {:>8} {:>7}",
        "App id".dimmed(),
        "Name".dimmed(),
        "Reviews".dimmed(),
        "Rating".dimmed(),
    );
    println!("  {}", "-".repeat(82).dimmed());

    for app in apps {
        println!(
            "  {:<36} {:<28} {:>8} {:>7}",
            super::truncate_chars(&app.app_id, 33),
            super::truncate_chars(&app.app_name, 25),
            app.review_count,
            colorize_rating(app.rating),
        );
    }
    println!();
}

/// Display one app with a sample of its reviews.
pub fn display_app_detail(app: &AppInfo, reviews: &[StoredReview]) {
    println!("\n{}", format!("=== {} ===", app.app_name).bold());
    println!("  App id: {}", app.app_id);
    println!("  Reviews: {}", app.review_count);
    println!("  Downloads: {}", app.download_count);
    println!("  Rating: {}", colorize_rating(app.rating));
    println!("  Added: {}", app.created_at);

    if let Some(analysis) = &app.overall_analysis {
        println!("\n  Analysis: {analysis}");
    }

    if reviews.is_empty() {
        return;
    }

    println!("\n  {} reviews:", reviews.len());
    for review in reviews {
        println!(
            "    [{}] {} {}",
            colorize_rating(Some(review.rating)),
            review.review_date.dimmed(),
            super::truncate_chars(&review.review_content, 100),
        );
    }
}

/// Display a topic-modeling report: topics with their top words, then how
/// reviews are spread across topics.
pub fn display_topic_report(app_name: &str, result: &TopicModelingResult) {
    println!(
        "\n{}",
        format!(
            "=== Topics for {} ({} reviews, {} topics) ===",
            app_name, result.total_reviews, result.n_topics
        )
        .bold()
    );

    let sizes = result.topic_sizes();
    for topic in &result.topics {
        let size = sizes.get(topic.id - 1).copied().unwrap_or(0);
        println!(
            "\n  {} {}",
            format!("Topic {}", topic.id).cyan().bold(),
            format!("({size} reviews)").dimmed()
        );
        if topic.words.is_empty() {
            println!("    {}", "no words".dimmed());
            continue;
        }
        let words: Vec<String> = topic
            .words
            .iter()
            .zip(&topic.weights)
            .map(|(word, weight)| format!("{word} {}", format!("{weight:.2}").dimmed()))
            .collect();
        println!("    {}", words.join(", "));
    }

    println!("\n  {}", "Most confident assignments:".bold());
    let mut ranked: Vec<_> = result.doc_topics.iter().collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    for assignment in ranked.iter().take(5) {
        println!(
            "    Topic {} [{:.2}] {}",
            assignment.main_topic,
            assignment.confidence,
            assignment.preview.dimmed()
        );
    }

    println!();
    match (&result.chart, result.projection.is_empty()) {
        (Some(_), _) => println!("  Chart: rendered ({} points)", result.projection.len()),
        (None, false) => println!("  Chart: {}", "no font available, projection only".yellow()),
        (None, true) => println!("  Chart: {}", "skipped (fewer than 5 reviews)".dimmed()),
    }
}

/// Colorize a star rating.
fn colorize_rating(rating: Option<f64>) -> colored::ColoredString {
    match rating {
        Some(r) if r >= 4.0 => format!("{r:.1}").green(),
        Some(r) if r >= 3.0 => format!("{r:.1}").yellow(),
        Some(r) => format!("{r:.1}").red(),
        None => "-".dimmed(),
    }
}
