//! Console table of scenario results.

use crate::summary::{ScenarioOutcome, ScenarioResult};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

/// Render one row per measurement (or per failed scenario).
pub fn render_results_table(outcomes: &[ScenarioOutcome]) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Scenario", "Metric", "Samples", "Fastest", "Average", "Slowest", "Status",
    ]);

    for outcome in outcomes {
        match &outcome.result {
            ScenarioResult::Passed { measurements } => {
                for m in measurements {
                    table.add_row(vec![
                        Cell::new(outcome.description()),
                        Cell::new(&m.metric_name),
                        Cell::new(m.samples.len()),
                        Cell::new(format_secs(m.smallest())),
                        Cell::new(format_secs(m.average())),
                        Cell::new(format_secs(m.largest())),
                        Cell::new("OK").fg(Color::Green),
                    ]);
                }
            }
            ScenarioResult::Failed { .. } => {
                table.add_row(vec![
                    Cell::new(outcome.description()),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("FAILED").fg(Color::Red),
                ]);
            }
        }
    }

    output.push_str(&table.to_string());
    output.push('\n');

    let failures: Vec<&ScenarioOutcome> = outcomes.iter().filter(|o| o.is_failed()).collect();
    if !failures.is_empty() {
        output.push_str("\nFailed Scenarios:\n");
        for outcome in failures {
            if let ScenarioResult::Failed { message } = &outcome.result {
                output.push_str(&format!("  {}: {}\n", outcome.description(), message));
            }
        }
    }

    output
}

fn format_secs(value: Option<f64>) -> String {
    match value {
        Some(secs) if secs < 1.0 => format!("{:.1}ms", secs * 1000.0),
        Some(secs) => format!("{secs:.3}s"),
        None => "-".to_string(),
    }
}
