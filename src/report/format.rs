//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use crate::app::registry::RunRecord;
use crate::domain::{IngestionConfig, IngestionResult, ParsedRecord};
use crate::features::bin_price;

/// Format the summary of a finished ingestion run.
pub fn format_ingestion_summary(result: &IngestionResult, config: &IngestionConfig) -> String {
    let mut out = String::new();

    out.push_str("=== fare - Data Ingestion ===\n");
    out.push_str(&format!("Source: {}\n", config.source_url));
    out.push_str(&format!(
        "Split: test_fraction={:.2} seed={}\n",
        config.split.test_fraction, config.split.seed
    ));
    out.push_str(&format!(
        "Train: n={} -> {}\n",
        result.train_records.len(),
        result.train_file_path.display()
    ));
    out.push_str(&format!(
        "Test:  n={} -> {}\n",
        result.test_records.len(),
        result.test_file_path.display()
    ));

    out.push_str("\nPrice strata (train / test):\n");
    let train = stratum_counts(&result.train_records);
    let test = stratum_counts(&result.test_records);
    for (i, (tr, te)) in train.iter().zip(test.iter()).enumerate() {
        out.push_str(format!("  {} {:>8} / {:<8}\n", i + 1, tr, te).trim_end());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&result.message);
    out.push('\n');
    out
}

/// Format the run history table, newest first.
pub fn format_history(runs: &[RunRecord]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>4} {:<19} {:<19} {:<11} {:<7} {}\n",
            "id", "started", "finished", "stage", "ok", "message"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<19} {:-<19} {:-<11} {:-<7} {:-<7}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for run in runs.iter().rev() {
        let finished = run
            .finished_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:>4} {:<19} {:<19} {:<11} {:<7} {}\n",
                run.id,
                run.started_at.format("%Y-%m-%d %H:%M:%S"),
                finished,
                run.stage.to_string(),
                if run.succeeded { "yes" } else { "no" },
                truncate(&run.message, 80),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn stratum_counts(records: &[ParsedRecord]) -> [usize; 5] {
    let mut counts = [0usize; 5];
    for r in records {
        counts[bin_price(r.price).index()] += 1;
    }
    counts
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
