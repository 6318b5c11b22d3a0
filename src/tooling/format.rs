//! Format reconciliation reports and plans as text.

use crate::backend::Mutation;
use crate::reconcile::ReconcileReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn counts_table(report: &ReconcileReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Change", "Nodes"]);
    table.add_row(vec!["Kept".to_string(), report.matched.to_string()]);
    table.add_row(vec!["Created".to_string(), report.created.to_string()]);
    table.add_row(vec!["Renamed".to_string(), report.updated.to_string()]);
    table.add_row(vec![
        "Deleted".to_string(),
        (report.deleted + report.deleted_with_ancestor).to_string(),
    ]);
    table
}

/// Format the outcome of an import.
pub fn format_report_text(report: &ReconcileReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Import")));
    out.push_str(&format!("  Indexed bookmarks: {}\n\n", report.indexed));
    out.push_str(&format!("{}\n\n", counts_table(report)));
    out.push_str(&format!(
        "{}\n",
        "Import successful. Restart Chrome to see the changes.".green()
    ));
    out
}

fn describe(mutation: &Mutation) -> (String, String, String) {
    match mutation {
        Mutation::Create {
            parent_id,
            index,
            name,
            url,
        } => (
            "create".to_string(),
            format!("{}[{}]", parent_id, index),
            match url {
                Some(url) => format!("{} <{}>", name, url),
                None => format!("{}/", name),
            },
        ),
        Mutation::Update { id, name, url } => (
            "update".to_string(),
            id.to_string(),
            match (name, url) {
                (Some(name), Some(url)) => format!("{} <{}>", name, url),
                (Some(name), None) => name.clone(),
                (None, Some(url)) => format!("<{}>", url),
                (None, None) => String::new(),
            },
        ),
        Mutation::Move {
            id,
            parent_id,
            index,
        } => (
            "move".to_string(),
            id.to_string(),
            format!("-> {}[{}]", parent_id, index),
        ),
        Mutation::Delete { id } => ("delete".to_string(), id.to_string(), String::new()),
    }
}

/// Format a dry run: every call the import would make, then the counts.
///
/// Moves are listed only with `include_moves`, since every kept node gets one.
pub fn format_plan_text(
    journal: &[Mutation],
    report: &ReconcileReport,
    include_moves: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Plan")));

    let rows: Vec<&Mutation> = journal
        .iter()
        .filter(|m| include_moves || !matches!(m, Mutation::Move { .. }))
        .collect();
    if rows.is_empty() {
        out.push_str("  No structural changes.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Op", "Target", "Detail"]);
        for mutation in rows {
            let (op, target, detail) = describe(mutation);
            table.add_row(vec![op, target, detail]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n\n", counts_table(report)));
    out.push_str("Nothing was written. Run `marksync import` to apply.\n");
    out
}
