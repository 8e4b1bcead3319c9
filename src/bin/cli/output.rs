//! Output Formatting and Display Functions
//!
//! Tables for terminals and JSON/YAML serialization of results.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use scrivener_rs::core::profile::ProfileFidelity;
use scrivener_rs::transfer::ComparisonReport;
use scrivener_rs::{StyleAnalysis, StyleChange, StyleComparison, StyleDimension, TransferSession};

use crate::cli::args::OutputFormat;

/// Longest span shown in a change table cell.
const SPAN_PREVIEW_CHARS: usize = 36;

/// Serialize `value` for the machine-readable formats.
///
/// Returns `None` for [`OutputFormat::Table`].
pub fn render_structured<T: Serialize>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<Option<String>> {
    Ok(match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
        OutputFormat::Table => None,
    })
}

#[derive(Tabled)]
struct ScoreRow {
    dimension: String,
    score: String,
    bar: String,
}

#[derive(Tabled)]
struct GapRow {
    dimension: String,
    first: String,
    second: String,
    gap: String,
}

#[derive(Tabled)]
struct UnitRow {
    text: String,
    role: String,
    importance: u8,
    sentiment: String,
}

#[derive(Tabled)]
struct ChangeRow {
    id: String,
    kind: String,
    original: String,
    proposed: String,
    status: String,
}

/// Print an analysis as tables.
pub fn display_analysis(analysis: &StyleAnalysis, show_units: bool) {
    let profile = &analysis.profile;
    println!(
        "{} {}",
        "📝 Style profile:".bright_blue().bold(),
        profile.name().cyan()
    );
    println!(
        "   Label: {}",
        profile.label().to_string().bright_green().bold()
    );
    display_fidelity(profile.fidelity());
    println!(
        "   {} units, {} clusters, {:.2}s",
        analysis.statistics.unit_count, analysis.statistics.cluster_count, analysis.processing_time
    );
    println!();

    let rows: Vec<ScoreRow> = profile
        .scores()
        .iter()
        .map(|(dimension, score)| ScoreRow {
            dimension: dimension.to_string(),
            score: format!("{score:.3}"),
            bar: score_bar(score),
        })
        .collect();
    print_table(rows);

    if show_units && !analysis.units.units.is_empty() {
        println!();
        println!("{}", "🔎 Semantic units".bright_blue().bold());
        let rows: Vec<UnitRow> = analysis
            .units
            .units
            .iter()
            .map(|unit| UnitRow {
                text: unit.text().to_string(),
                role: unit.role().to_string(),
                importance: unit.importance(),
                sentiment: format!(
                    "{:?} ({})",
                    unit.sentiment_polarity(),
                    unit.sentiment_intensity()
                ),
            })
            .collect();
        print_table(rows);
    }
}

/// Print a comparison as tables.
pub fn display_comparison(comparison: &StyleComparison) {
    println!(
        "{} {} vs {}",
        "⚖️  Style comparison:".bright_blue().bold(),
        comparison.first.profile.label().to_string().cyan(),
        comparison.second.profile.label().to_string().cyan()
    );
    display_report_header(&comparison.report);
    println!();

    let first = comparison.first.profile.scores();
    let second = comparison.second.profile.scores();
    let rows: Vec<GapRow> = StyleDimension::ALL
        .iter()
        .map(|&dimension| GapRow {
            dimension: dimension.to_string(),
            first: format!("{:.3}", first.get(dimension)),
            second: format!("{:.3}", second.get(dimension)),
            gap: format!("{:+.3}", comparison.report.gap(dimension)),
        })
        .collect();
    print_table(rows);
}

/// Print the changes proposed by a transfer.
pub fn display_transfer(session: &TransferSession) {
    let outcome = &session.outcome;
    println!(
        "{} {} ({} → {})",
        "✍️  Transfer:".bright_blue().bold(),
        outcome.strategy.to_string().cyan(),
        session.source_profile.label(),
        outcome.target.label()
    );
    println!("   Session: {}", session.session_id().dimmed());
    if !outcome.targeted_dimensions.is_empty() {
        let names: Vec<String> = outcome
            .targeted_dimensions
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("   Targeted: {}", names.join(", "));
    }
    println!(
        "   Steps: {}/{}{}",
        outcome.steps_completed,
        outcome.steps_planned,
        if outcome.cancelled { " (cancelled)" } else { "" }
    );
    println!();

    if outcome.changes.is_empty() {
        println!("{}", "No changes proposed.".dimmed());
        return;
    }
    print_table(outcome.changes.iter().map(change_row).collect::<Vec<_>>());
}

fn display_fidelity(fidelity: &ProfileFidelity) {
    if let ProfileFidelity::Degraded {
        failed_subcalls,
        recovered_subcalls,
        total_subcalls,
        notes,
    } = fidelity
    {
        println!(
            "   {} {failed_subcalls}/{total_subcalls} model sub-calls fell back, {recovered_subcalls} recovered",
            "⚠️".yellow()
        );
        for note in notes {
            println!("     • {}", note.dimmed());
        }
    }
}

fn display_report_header(report: &ComparisonReport) {
    println!(
        "   Similarity ({}): {}",
        report.method.as_str(),
        format!("{:.3}", report.similarity).bright_green().bold()
    );
    println!(
        "   cosine {:.3} · euclidean {:.3} · weighted {:.3}",
        report.cosine, report.euclidean, report.weighted
    );
}

fn change_row(change: &StyleChange) -> ChangeRow {
    ChangeRow {
        id: change.id.clone(),
        kind: format!("{:?}", change.change_type),
        original: preview(&change.original_span),
        proposed: preview(&change.proposed_span),
        status: format!("{:?}", change.status),
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
}

/// Ten-cell bar for a score in [0, 1].
fn score_bar(score: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Single-line, char-bounded preview of a span.
fn preview(span: &str) -> String {
    let flat = span.replace(['\n', '\r'], " ");
    if flat.chars().count() <= SPAN_PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(SPAN_PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bar_is_ten_cells() {
        assert_eq!(score_bar(0.0), "░".repeat(10));
        assert_eq!(score_bar(1.0), "█".repeat(10));
        assert_eq!(score_bar(0.44).chars().filter(|c| *c == '█').count(), 4);
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        let long = "很".repeat(50);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), SPAN_PREVIEW_CHARS);
        assert!(cut.ends_with('…'));
        assert_eq!(preview("a\nb"), "a b");
    }

    #[test]
    fn table_format_is_not_structured() {
        assert!(render_structured(&1, OutputFormat::Table).unwrap().is_none());
        assert_eq!(
            render_structured(&[1, 2], OutputFormat::Json).unwrap().as_deref(),
            Some("[\n  1,\n  2\n]")
        );
    }
}
