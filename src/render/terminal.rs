//! Human-readable tables for stdout.

use crate::pipeline::Comparison;
use crate::utils::format_with_commas;
use console::style;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// File table, token totals and the ranked model table.
pub fn render_terminal(comparison: &Comparison, exchange_rate: Option<f64>) -> String {
    let summary = &comparison.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", style("Files").bold());
    let file_rows: Vec<Vec<String>> = summary
        .files
        .iter()
        .map(|file| {
            vec![
                file.file_name.clone(),
                file.file_type.to_string(),
                format!("{:.2} MB", file.file_size_mb),
                format_with_commas(file.tokens.count),
                file.tokens.error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    out.push_str(&layout(
        &["File", "Type", "Size", "Tokens", "Error"],
        &[Align::Left, Align::Left, Align::Right, Align::Right, Align::Left],
        &file_rows,
        |_| false,
    ));

    let _ = writeln!(out);
    let _ = writeln!(out, "Input tokens:  {}", format_with_commas(summary.total_input_tokens));
    let _ = writeln!(
        out,
        "Output tokens: {} ({})",
        format_with_commas(summary.estimated_output_tokens),
        summary.policy
    );
    let _ = writeln!(out, "Total tokens:  {}", format_with_commas(summary.total_tokens()));
    let _ = writeln!(out);

    if comparison.estimates.is_empty() {
        let _ = writeln!(out, "{}", style("No known models selected.").yellow());
        return out;
    }

    let _ = writeln!(out, "{}", style("Models (cheapest first)").bold());
    let mut headers = vec!["#", "Provider", "Model", "Input $", "Output $", "Total $"];
    if exchange_rate.is_some() {
        headers.push("Total (local)");
    }
    headers.push("Context");

    let mut aligns =
        vec![Align::Right, Align::Left, Align::Left, Align::Right, Align::Right, Align::Right];
    if exchange_rate.is_some() {
        aligns.push(Align::Right);
    }
    aligns.push(Align::Left);

    let model_rows: Vec<Vec<String>> = comparison
        .estimates
        .iter()
        .enumerate()
        .map(|(rank, estimate)| {
            let mut row = vec![
                (rank + 1).to_string(),
                estimate.model.provider.clone(),
                estimate.model.display_name.clone(),
                format!("{:.6}", estimate.input_cost),
                format!("{:.6}", estimate.output_cost),
                format!("{:.6}", estimate.total_cost()),
            ];
            if let Some(rate) = exchange_rate {
                row.push(format!("{:.2}", estimate.total_cost() * rate));
            }
            row.push(if estimate.fits_context_window() {
                format_with_commas(estimate.model.context_window)
            } else {
                format!("exceeds {}", format_with_commas(estimate.model.context_window))
            });
            row
        })
        .collect();
    out.push_str(&layout(&headers, &aligns, &model_rows, |index| index == 0));

    if let Some(cheapest) = comparison.cheapest() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Cheapest: {} ({}) at ${:.6}",
            style(&cheapest.model.display_name).green().bold(),
            cheapest.model.provider,
            cheapest.total_cost()
        );
    }
    out
}

fn layout(
    headers: &[&str],
    aligns: &[Align],
    rows: &[Vec<String>],
    highlight: impl Fn(usize) -> bool,
) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    let header_line = join_cells(headers.iter().copied(), &widths, aligns);
    let _ = writeln!(out, "{}", style(header_line.trim_end()).bold());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for (index, row) in rows.iter().enumerate() {
        let line = join_cells(row.iter().map(String::as_str), &widths, aligns);
        let line = line.trim_end();
        if highlight(index) {
            let _ = writeln!(out, "{}", style(line).green());
        } else {
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

fn join_cells<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    aligns: &[Align],
) -> String {
    cells
        .enumerate()
        .map(|(i, cell)| {
            let pad = " ".repeat(widths[i].saturating_sub(cell.width()));
            match aligns[i] {
                Align::Left => format!("{}{}", cell, pad),
                Align::Right => format!("{}{}", pad, cell),
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
