use std::fmt::Write;

use chrono::DateTime;

use tsod_compute::DetectionReport;

/// RFC 3339 rendering of an epoch timestamp, or the raw number when out of range.
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

fn format_list(timestamps: &[i64]) -> String {
    timestamps
        .iter()
        .map(|&ts| format_timestamp(ts))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable report.
pub fn render_text(report: &DetectionReport) -> String {
    let mut out = String::new();
    let name = if report.name.is_empty() { "(unnamed)" } else { &report.name };
    let _ = writeln!(out, "Run {} {} at {}s resolution", report.run_id, name, report.resolution);
    let _ = writeln!(
        out,
        "Analyzers: {}/{} completed, {} active{}",
        report.summary.completed,
        report.summary.dispatched,
        report.summary.active,
        if report.summary.timed_out { " (deadline expired)" } else { "" }
    );

    let _ = writeln!(out, "\nSeries:");
    for s in &report.series {
        let _ = write!(
            out,
            "  {:<16} {} points (train {}, classify {})",
            s.name, s.points, s.train_points, s.classify_points
        );
        if let Some(stats) = &s.stats {
            let _ = write!(out, " avg {:.3} stddev {:.3}", stats.avg, stats.stddev);
        }
        if s.sanitized > 0 {
            let _ = write!(out, " [{} sanitized]", s.sanitized);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\nOutliers (min score {}): {}",
        report.min_score,
        report.outliers.len()
    );
    for v in &report.outliers {
        let _ = writeln!(out, "  {}  score {:.2}", format_timestamp(v.timestamp), v.score);
        for o in &v.details.outliers {
            let _ = write!(out, "    {:<18} {:<12} value {:.3}", o.analyzer.name, o.series, o.value);
            if let Some(f) = o.forecast {
                let _ = write!(out, " forecast {:.3}", f);
            }
            let _ = writeln!(
                out,
                " band [{:.3}, {:.3}] magnitude {:.2}",
                o.lower_bound, o.upper_bound, o.magnitude
            );
        }
    }

    if !report.missed_expected.is_empty() {
        let _ = writeln!(out, "\nMissed expected errors: {}", format_list(&report.missed_expected));
    }
    if !report.metrics.incomplete.is_empty() {
        let _ = writeln!(out, "\nIncomplete analyzers: {}", report.metrics.incomplete.join(", "));
    }
    out
}
