use clap::ValueEnum;
use serde_json::json;

use crate::fx::CurrencyNormalizer;
use crate::sources::{CostRecord, PlanReport, QuotaReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text table
    Table,
    /// Pretty-printed JSON, raw payloads included
    Json,
    /// Markdown table
    Markdown,
    /// Single converted grand total
    Total,
}

/// Minimal column-aligned table writer. Widths track the widest cell per
/// column, cells are left-aligned.
struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(headers: &[&str]) -> Self {
        TextTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if index < widths.len() {
                    widths[index] = widths[index].max(cell.len());
                }
            }
        }
        widths
    }

    fn render_plain(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        out.push_str(&Self::format_row(&self.headers, &widths, "  "));
        out.push('\n');
        out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&Self::format_row(row, &widths, "  "));
            out.push('\n');
        }
        out
    }

    fn render_markdown(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", Self::format_row(&self.headers, &widths, " | ")));
        out.push_str(&format!(
            "| {} |\n",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
        for row in &self.rows {
            out.push_str(&format!("| {} |\n", Self::format_row(row, &widths, " | ")));
        }
        out
    }

    fn format_row(cells: &[String], widths: &[usize], separator: &str) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(separator)
            .trim_end()
            .to_string()
    }
}

fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format!("{:.2}", value),
        None => "N/A".to_string(),
    }
}

fn json_string<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        json!({"error": err.to_string()}).to_string()
    })
}

/// Renders balance records. Table and markdown variants close with a
/// grand-total row in the target currency; `Total` prints only that.
pub fn render_balances(
    records: &[CostRecord],
    normalizer: &CurrencyNormalizer,
    target: &str,
    format: OutputFormat,
) -> String {
    if format == OutputFormat::Json {
        return json_string(&records);
    }

    let mut balance_total = 0.0_f64;
    let mut spent_total = 0.0_f64;
    let mut table = TextTable::new(&[
        "Platform",
        "Balance",
        "Currency",
        "Spent",
        &format!("Total ({})", target),
    ]);
    for record in records {
        let converted = record
            .amount
            .filter(|amount| amount.is_finite())
            .map(|amount| normalizer.convert(amount, &record.currency, target));
        if let Some(value) = converted.filter(|value| *value > 0.0) {
            balance_total += value;
        }
        if let Some(spent) = record.spent.filter(|spent| spent.is_finite() && *spent > 0.0) {
            let spent_currency = record
                .spent_currency
                .as_deref()
                .unwrap_or(&record.currency);
            spent_total += normalizer.convert(spent, spent_currency, target);
        }
        let spent_cell = match record.spent {
            Some(spent) => format!(
                "{:.2} {}",
                spent,
                record.spent_currency.as_deref().unwrap_or(&record.currency)
            ),
            None => "-".to_string(),
        };
        table.push(vec![
            record.source_id.clone(),
            format_amount(record.amount),
            record.currency.clone(),
            spent_cell,
            format_amount(converted),
        ]);
    }

    if format == OutputFormat::Total {
        return format!(
            "Total balance: {:.2} {}\nTotal spent:   {:.2} {}\n",
            balance_total, target, spent_total, target
        );
    }

    table.push(vec![
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        format!("{:.2} {}", spent_total, target),
        format!("{:.2}", balance_total),
    ]);
    match format {
        OutputFormat::Markdown => table.render_markdown(),
        _ => table.render_plain(),
    }
}

pub fn render_quotas(reports: &[QuotaReport], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return json_string(&reports);
    }
    let mut table = TextTable::new(&[
        "Platform",
        "Package",
        "Used",
        "Total",
        "Remaining",
        "Status",
    ]);
    for report in reports {
        for entry in &report.entries {
            let mut status = entry.status.clone();
            if let Some(reset) = &entry.reset_info {
                status = format!("{} ({})", status, reset);
            }
            table.push(vec![
                report.source_id.clone(),
                entry.label.clone(),
                format_amount(entry.used),
                format_amount(entry.total),
                format_amount(entry.remaining),
                status,
            ]);
        }
    }
    match format {
        OutputFormat::Markdown => table.render_markdown(),
        _ => table.render_plain(),
    }
}

pub fn render_plans(reports: &[PlanReport], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return json_string(&reports);
    }
    let mut table = TextTable::new(&["Platform", "Status", "Window", "Used", "Resets"]);
    for report in reports {
        if report.windows.is_empty() {
            table.push(vec![
                report.source_id.clone(),
                report.status.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ]);
            continue;
        }
        for window in &report.windows {
            table.push(vec![
                report.source_id.clone(),
                report.status.clone(),
                window.level.clone(),
                format!("{:.1}%", window.percent),
                window.reset_time.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
    }
    match format {
        OutputFormat::Markdown => table.render_markdown(),
        _ => table.render_plain(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::RateTable;
    use serde_json::json;

    fn normalizer() -> CurrencyNormalizer {
        CurrencyNormalizer::new(RateTable::with_defaults())
    }

    fn record(name: &str, amount: Option<f64>, currency: &str) -> CostRecord {
        CostRecord {
            source_id: name.to_string(),
            amount,
            currency: currency.to_string(),
            spent: None,
            spent_currency: None,
            raw: json!({}),
        }
    }

    #[test]
    fn test_table_totals_in_target_currency() {
        let records = vec![record("A", Some(50.0), "CNY"), record("B", Some(10.0), "USD")];
        let out = render_balances(&records, &normalizer(), "CNY", OutputFormat::Table);
        assert!(out.contains("Platform"));
        assert!(out.contains("122.00"));
    }

    #[test]
    fn test_total_format_is_two_lines() {
        let records = vec![record("A", Some(10.0), "USD")];
        let out = render_balances(&records, &normalizer(), "CNY", OutputFormat::Total);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("Total balance: 72.00 CNY"));
    }

    #[test]
    fn test_sentinel_amount_renders_na_and_skips_total() {
        let records = vec![record("A", None, "USD"), record("B", Some(7.2), "CNY")];
        let out = render_balances(&records, &normalizer(), "CNY", OutputFormat::Table);
        assert!(out.contains("N/A"));
        assert!(out.contains("7.20"));
    }

    #[test]
    fn test_markdown_rows_are_piped() {
        let records = vec![record("A", Some(1.0), "CNY")];
        let out = render_balances(&records, &normalizer(), "CNY", OutputFormat::Markdown);
        assert!(out.starts_with("| Platform"));
        assert!(out.lines().all(|line| line.starts_with('|')));
    }

    #[test]
    fn test_json_format_serializes_records() {
        let records = vec![record("A", Some(1.0), "CNY")];
        let out = render_balances(&records, &normalizer(), "CNY", OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["source_id"], "A");
    }

    #[test]
    fn test_quota_table_one_row_per_entry() {
        let reports = vec![QuotaReport {
            source_id: "PackyCode".to_string(),
            entries: vec![
                crate::sources::QuotaEntry {
                    label: "basic".to_string(),
                    used: Some(10.0),
                    total: Some(100.0),
                    remaining: Some(90.0),
                    status: "active".to_string(),
                    expiry: None,
                    reset_info: Some("daily".to_string()),
                },
                crate::sources::QuotaEntry {
                    label: "bonus".to_string(),
                    used: None,
                    total: None,
                    remaining: None,
                    status: "expired".to_string(),
                    expiry: None,
                    reset_info: None,
                },
            ],
            raw: json!({}),
        }];
        let out = render_quotas(&reports, OutputFormat::Table);
        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("active (daily)"));
    }

    #[test]
    fn test_plan_without_windows_still_renders() {
        let reports = vec![PlanReport {
            source_id: "X".to_string(),
            status: "inactive".to_string(),
            windows: vec![],
            update_time: None,
            raw: json!({}),
        }];
        let out = render_plans(&reports, OutputFormat::Table);
        assert!(out.contains("inactive"));
    }
}
