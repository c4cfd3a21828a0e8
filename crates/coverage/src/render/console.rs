//! Terminal rendering: bar rows and summary tables

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

use crate::istanbul::{FileSummary, SourceTotals};
use crate::summary::Threshold;

/// Width of the textual progress bar in cells
pub const BAR_WIDTH: usize = 20;

/// Longest path shown before it is shortened from the left
const MAX_PATH: usize = 48;

/// `█` for every 5%, `░` for the rest
pub fn progress_bar(pct: f64) -> String {
    let filled = if pct.is_finite() {
        ((pct / 5.0).round().max(0.0) as usize).min(BAR_WIDTH)
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// One report row: bar, percentage and label
pub fn bar_line(pct: f64, label: &str) -> String {
    format!("{} {:>5.1}%  {}", progress_bar(pct), pct, label)
}

/// Percentage colored by its threshold band
pub fn colored_pct(pct: f64) -> ColoredString {
    let text = format!("{:.1}%", pct);
    match Threshold::classify(pct) {
        Threshold::High => text.green(),
        Threshold::Medium => text.yellow(),
        Threshold::Low => text.red(),
    }
}

pub fn rule(ch: char, width: usize) -> String {
    ch.to_string().repeat(width)
}

/// Shorten long paths to their trailing characters
pub fn display_path(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() > MAX_PATH {
        let tail: String = chars[chars.len() - (MAX_PATH - 3)..].iter().collect();
        format!("...{}", tail)
    } else {
        path.to_string()
    }
}

fn pct_cell(pct: f64) -> Cell {
    Cell::new(format!("{:.1}%", pct)).set_alignment(CellAlignment::Right)
}

/// Statements/branches/functions table with a trailing total row
pub fn source_table(files: &[FileSummary], totals: &SourceTotals) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["File", "Stmts", "Branch", "Funcs"]);
    for file in files {
        table.add_row(vec![
            Cell::new(display_path(&file.path)),
            pct_cell(file.statements.pct()),
            pct_cell(file.branches.pct()),
            pct_cell(file.functions.pct()),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        pct_cell(totals.statements.pct()),
        pct_cell(totals.branches.pct()),
        pct_cell(totals.functions.pct()),
    ]);

    table
}
