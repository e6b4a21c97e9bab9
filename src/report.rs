use std::fmt::Write;

use chrono::{Datelike, Duration, NaiveDate};
use serde_json::{json, Value};

use crate::models::{CategorySummary, ScoreRun, ScoredRecord};

/// Monday-to-Sunday week containing `date`, e.g. `Aug 18–24, 2025`.
pub fn week_label(date: NaiveDate) -> String {
    let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let end = start + Duration::days(6);

    if start.month() == end.month() {
        format!(
            "{} {}–{}, {}",
            start.format("%b"),
            start.day(),
            end.day(),
            end.year()
        )
    } else {
        format!(
            "{} {} – {} {}, {}",
            start.format("%b"),
            start.day(),
            end.format("%b"),
            end.day(),
            end.year()
        )
    }
}

pub fn summarize_by_category(run: &ScoreRun) -> Vec<CategorySummary> {
    let Some(baselines) = run.baselines.as_ref() else {
        return Vec::new();
    };

    let mut summaries: Vec<CategorySummary> = baselines
        .categories
        .iter()
        .map(|(category, entry)| {
            let total_iq: i64 = run
                .records
                .iter()
                .filter(|item| &item.record.category == category)
                .map(|item| i64::from(item.iq))
                .sum();
            CategorySummary {
                category: category.clone(),
                count: entry.members,
                avg_iq: if entry.members == 0 {
                    0.0
                } else {
                    total_iq as f64 / entry.members as f64
                },
                mean_rate: entry.baseline.mean_rate,
                std_dev_rate: entry.baseline.std_dev_rate,
                uses_facility: entry.uses_facility,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    summaries
}

/// Records ordered by IQ, highest first; ties keep input order.
pub fn ranked_by_iq(run: &ScoreRun) -> Vec<&ScoredRecord> {
    let mut ranked: Vec<&ScoredRecord> = run.records.iter().collect();
    ranked.sort_by(|a, b| b.iq.cmp(&a.iq));
    ranked
}

/// Records ordered by absolute IQ movement, largest first.
pub fn biggest_movers(run: &ScoreRun) -> Vec<&ScoredRecord> {
    let mut movers: Vec<&ScoredRecord> = run
        .records
        .iter()
        .filter(|item| item.delta_iq != 0)
        .collect();
    movers.sort_by(|a, b| b.delta_iq.abs().cmp(&a.delta_iq.abs()));
    movers
}

fn display_name(item: &ScoredRecord) -> &str {
    item.record.name.as_deref().unwrap_or(&item.record.id)
}

fn write_record_line(output: &mut String, item: &ScoredRecord) {
    let _ = writeln!(
        output,
        "- {} ({}) IQ {} ({:+} pts), {:.2} min/hr",
        display_name(item),
        item.record.category,
        item.iq,
        item.delta_iq,
        item.current_rate
    );
}

pub fn build_report(run: &ScoreRun, week: &str, limit: usize) -> String {
    let summaries = summarize_by_category(run);
    let ranked = ranked_by_iq(run);

    let mut output = String::new();

    let _ = writeln!(output, "# Floor IQ Report");
    let _ = writeln!(output, "Week of {week}");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Facility IQ: {} ({}) across {} machines",
        run.facility.score,
        run.facility.band,
        run.records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Baselines");

    if summaries.is_empty() {
        let _ = writeln!(output, "No equipment recorded for this period.");
    } else {
        for summary in summaries.iter() {
            let source = if summary.uses_facility {
                "facility baseline"
            } else {
                "own baseline"
            };
            let _ = writeln!(
                output,
                "- {}: {} machines, avg IQ {:.1} (mean {:.2} min/hr, sd {:.2}, {})",
                summary.category,
                summary.count,
                summary.avg_iq,
                summary.mean_rate,
                summary.std_dev_rate,
                source
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest IQ Equipment");
    if ranked.is_empty() {
        let _ = writeln!(output, "No equipment recorded for this period.");
    } else {
        for item in ranked.iter().take(limit) {
            write_record_line(&mut output, item);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest IQ Equipment");
    if ranked.is_empty() {
        let _ = writeln!(output, "No equipment recorded for this period.");
    } else {
        for item in ranked.iter().rev().take(limit) {
            write_record_line(&mut output, item);
        }
    }

    let movers = biggest_movers(run);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Biggest Movers");
    if movers.is_empty() {
        let _ = writeln!(output, "No IQ movement versus the prior period.");
    } else {
        for item in movers.iter().take(limit) {
            write_record_line(&mut output, item);
        }
    }

    output
}

pub fn equipment_payload(run: &ScoreRun) -> Value {
    json!({
        "success": true,
        "equipment": run.records,
        "total_count": run.records.len(),
    })
}

pub fn summary_payload(run: &ScoreRun, week: &str) -> Value {
    json!({
        "success": true,
        "stats": {
            "facility_iq": run.facility.score,
            "facility_band": run.facility.band,
            "week_label": week,
        }
    })
}
