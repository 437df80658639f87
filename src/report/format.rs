//! Formatted terminal output for the `summary` command.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::aggregate::{DistributionStats, GroupSummary};
use crate::app::pipeline::ViewOutput;
use crate::filter::SeriesSelection;

/// Format the full summary: headline stats, group tables, distributions.
pub fn format_summary(out: &ViewOutput<'_>) -> String {
    let mut s = String::new();
    let dataset = out.view.dataset();

    s.push_str("=== polls - Generic Ballot Dashboard ===\n");
    s.push_str(&format!(
        "Source: {} ({} rows)\n",
        dataset.source.display(),
        dataset.rows_read
    ));

    let Some(stats) = &out.stats else {
        s.push_str("\nNo polls match the current filters.\n");
        return s;
    };

    s.push_str(&format!(
        "Polls: n={} | dates=[{}, {}]\n",
        stats.rows, stats.first_date, stats.last_date
    ));
    s.push_str(&format!(
        "Margin: mean={} | latest 7-poll avg={}\n",
        fmt_opt(stats.mean_margin),
        fmt_opt(stats.latest_margin_roll7),
    ));
    if dataset.has_predicted_margin {
        s.push_str(&format!(
            "Predicted margin (latest): {}\n",
            fmt_opt(stats.latest_predicted_margin)
        ));
    }

    s.push_str("\nBy pollster (ascending mean margin):\n");
    s.push_str(&format_groups(&out.pollsters, |k| k.clone()));

    s.push_str("\nBy methodology (ascending mean margin):\n");
    s.push_str(&format_groups(&out.methodologies, |k| k.to_string()));

    s.push_str("\nSupport distribution:\n");
    match &out.series {
        SeriesSelection::NoneSelected => s.push_str("No party selected.\n"),
        SeriesSelection::Selected(_) => s.push_str(&format_distributions(&out.distributions)),
    }

    s
}

fn format_groups<K>(rows: &[GroupSummary<K>], label: impl Fn(&K) -> String) -> String {
    let mut s = String::new();
    s.push_str(format!("{:<28} {:>6} {:>12}\n", "group", "n", "mean_margin").trim_end());
    s.push('\n');
    s.push_str(format!("{:-<28} {:-<6} {:-<12}\n", "", "", "").trim_end());
    s.push('\n');

    for g in rows {
        s.push_str(
            format!(
                "{:<28} {:>6} {:>12}\n",
                truncate(&label(&g.key), 28),
                g.count,
                fmt_opt(g.mean_margin),
            )
            .trim_end(),
        );
        s.push('\n');
    }
    s
}

fn format_distributions(rows: &[DistributionStats]) -> String {
    let mut s = String::new();
    s.push_str(format!("{:<6} {:>6} {:>10} {:>10} {:>10} {:>10}\n", "party", "n", "mean", "std", "-1 std", "+1 std").trim_end());
    s.push('\n');
    for d in rows {
        let (lo, hi) = d.band().map(|(lo, _, hi)| (Some(lo), Some(hi))).unwrap_or((None, None));
        s.push_str(
            format!(
                "{:<6} {:>6} {:>10} {:>10} {:>10} {:>10}\n",
                d.party.label(),
                d.n,
                fmt_opt(d.mean),
                fmt_opt(d.std),
                fmt_opt(lo),
                fmt_opt(hi),
            )
            .trim_end(),
        );
        s.push('\n');
    }
    s
}

pub(crate) fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:+.2}"),
        _ => "-".to_string(),
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
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
