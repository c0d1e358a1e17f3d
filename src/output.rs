//! Rendering of batch results for the terminal.

use certexpiry::{CheckResult, Status};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use strum_macros::{Display, EnumString};

const BAR_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    Text,
    Json,
    Summary,
}

pub fn render(results: &[CheckResult], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(text_table(results)),
        OutputFormat::Json => serde_json::to_string_pretty(results),
        OutputFormat::Summary => Ok(summary(results)),
    }
}

fn status_cell(result: &CheckResult) -> Cell {
    let cell = Cell::new(result.status_label());
    match result.status() {
        Some(Status::Valid) => cell.fg(Color::Green),
        Some(Status::ExpiringSoon) => cell.fg(Color::Yellow).add_attribute(Attribute::Bold),
        None => cell.fg(Color::Red),
    }
}

/// `█████░░░░░  45%`
fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{}{} {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        percent
    )
}

fn text_table(results: &[CheckResult]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        ["Host", "Status", "Days Left", "Expires", "Issuer", "Lifetime Used"]
            .iter()
            .map(|header| Cell::new(header).add_attribute(Attribute::Bold)),
    );

    for result in results {
        match result {
            CheckResult::Success { .. } => {
                table.add_row(vec![
                    Cell::new(result.hostname()),
                    status_cell(result),
                    Cell::new(result.days_display()),
                    Cell::new(result.expiry_display()),
                    Cell::new(result.issuer_display()),
                    Cell::new(progress_bar(result.progress())),
                ]);
            }
            CheckResult::Failure { error_message, .. } => {
                table.add_row(vec![
                    Cell::new(result.hostname()),
                    status_cell(result),
                    Cell::new(result.days_display()),
                    Cell::new(error_message).fg(Color::Red),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }
    table.to_string()
}

fn summary(results: &[CheckResult]) -> String {
    let count = |wanted: Option<Status>| {
        results
            .iter()
            .filter(|result| result.status() == wanted)
            .count()
    };
    let mut lines = vec![format!(
        "Checked {} host(s): {} valid, {} expiring soon, {} failed",
        results.len(),
        count(Some(Status::Valid)),
        count(Some(Status::ExpiringSoon)),
        count(None)
    )];
    for result in results {
        match result {
            CheckResult::Success {
                status: Status::ExpiringSoon,
                days_until_expiry,
                ..
            } => lines.push(format!(
                "  ! {} expires in {} day(s)",
                result.hostname(),
                days_until_expiry
            )),
            CheckResult::Failure { error_message, .. } => {
                lines.push(format!("  x {}: {}", result.hostname(), error_message))
            }
            CheckResult::Success { .. } => {}
        }
    }
    lines.join("\n")
}
