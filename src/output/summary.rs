use std::fmt::Write;
use std::path::Path;

use crate::state::DownloadState;
use crate::sync::SyncSummary;

use super::styling::{detail, fetched, heading};
use super::tables::{build_cell, create_table, cyan_header, status_cell};

/// Prints the per-resource results of a run to stdout.
///
/// One row per resource: definition, selected build, previously recorded
/// build, what happened and a link to the build. Resources dropped from the
/// manifest since the last run are listed below the table.
pub fn print_summary(summary: &SyncSummary) {
    println!("{}", render_summary(summary));
}

/// Prints the recorded state file as a table.
pub fn print_state(state: &DownloadState, state_file: &Path) {
    println!("{}", render_state(state, state_file));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", heading(emoji), heading(title).underlined());
}

pub(super) fn render_summary(summary: &SyncSummary) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📋", "Resources");

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Resource",
        "Definition",
        "Build",
        "Previous",
        "Status",
        "Link",
    ]));

    for outcome in &summary.outcomes {
        table.add_row(vec![
            comfy_table::Cell::new(&outcome.resource),
            comfy_table::Cell::new(&outcome.definition),
            build_cell(Some(outcome.build_id)),
            build_cell(outcome.previous),
            status_cell(&outcome.status),
            comfy_table::Cell::new(&outcome.link),
        ]);
    }
    let _ = writeln!(output, "{table}");

    let removed: Vec<_> = summary
        .changes
        .iter()
        .filter(|change| change.current.is_none())
        .map(|change| change.resource.as_str())
        .collect();
    if !removed.is_empty() {
        let _ = writeln!(
            output,
            "{}",
            detail(format!("No longer in manifest: {}", removed.join(", ")))
        );
    }

    let state_line = if summary.state_written {
        "State file updated"
    } else {
        "State file unchanged"
    };
    let _ = writeln!(output, "{}", detail(state_line));

    if summary.is_up_to_date() {
        let _ = write!(output, "\n{}", heading(" ------- No new builds found -------"));
    } else {
        let _ = write!(output, "\n{}", fetched("Created artifacts successfully"));
    }

    output
}

pub(super) fn render_state(state: &DownloadState, state_file: &Path) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🗂", "Recorded builds");

    if state.is_empty() {
        let _ = write!(
            output,
            "{}",
            detail(format!("Nothing recorded in {}", state_file.display()))
        );
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Resource", "Build"]));
    for (resource, build_id) in state.iter() {
        table.add_row(vec![comfy_table::Cell::new(resource), build_cell(Some(build_id))]);
    }
    let _ = write!(output, "{table}\n{}", detail(state_file.display()));

    output
}
