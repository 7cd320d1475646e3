use chrono::NaiveDate;
use serde::Serialize;

use crate::core::periods::format_period;
use crate::indicators::registry::Registry;
use crate::models::TimeSeries;

pub const RECENT_PERIODS: usize = 13;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableRow {
    pub name: String,
    pub title: String,
    /// One cell per column; empty string when the period has no value.
    pub cells: Vec<String>,
}

/// Latest periods per indicator, newest column first.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentTable {
    pub periods: Vec<NaiveDate>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl RecentTable {
    /// Columns come from the first selected indicator that has data; every
    /// row is looked up by date against those columns.
    pub fn build(registry: &Registry, resolved: &[(String, TimeSeries)], periods: usize) -> Self {
        let dates: Vec<NaiveDate> = resolved
            .iter()
            .find(|(_, series)| !series.is_empty())
            .map(|(_, series)| series.latest(periods).into_iter().map(|(d, _)| d).collect())
            .unwrap_or_default();

        let rows = resolved
            .iter()
            .map(|(name, series)| TableRow {
                name: name.clone(),
                title: registry
                    .get(name)
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| name.clone()),
                cells: dates
                    .iter()
                    .map(|d| series.get(d).map(|v| format!("{:.2}", v)).unwrap_or_default())
                    .collect(),
            })
            .collect();

        Self {
            columns: dates.iter().map(format_period).collect(),
            periods: dates,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Plain-text rendering with right-aligned value columns.
    pub fn render(&self) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|r| r.title.chars().count())
            .chain(std::iter::once("Indikator".len()))
            .max()
            .unwrap_or(0);

        let col_widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.cells.get(i))
                    .map(|c| c.len())
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&pad_right("Indikator", label_width));
        for (header, width) in self.columns.iter().zip(&col_widths) {
            out.push_str(&format!(" | {:>w$}", header, w = width));
        }
        out.push('\n');

        let rule_len = label_width + col_widths.iter().map(|w| w + 3).sum::<usize>();
        out.push_str(&"-".repeat(rule_len));
        out.push('\n');

        for row in &self.rows {
            out.push_str(&pad_right(&row.title, label_width));
            for (cell, width) in row.cells.iter().zip(&col_widths) {
                out.push_str(&format!(" | {:>w$}", cell, w = width));
            }
            out.push('\n');
        }

        out
    }
}

/// `{:<w$}` pads by chars, which keeps umlauts aligned.
fn pad_right(s: &str, width: usize) -> String {
    format!("{:<w$}", s, w = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn two_years() -> TimeSeries {
        (0..24)
            .map(|i| (d(2023 + i / 12, (i % 12) as u32 + 1), 100.0 + i as f64 * 0.5))
            .collect()
    }

    #[test]
    fn test_thirteen_newest_columns() {
        let registry = Registry::builtin();
        let resolved = vec![("cpi".to_string(), two_years())];
        let table = RecentTable::build(&registry, &resolved, RECENT_PERIODS);

        assert_eq!(table.columns.len(), 13);
        assert_eq!(table.columns[0], "Dec 2024");
        assert_eq!(table.columns[12], "Dec 2023");
        assert_eq!(table.rows[0].cells[0], "111.50");
    }

    #[test]
    fn test_blank_cells_for_missing_and_empty_rows() {
        let registry = Registry::builtin();
        let mut sparse: TimeSeries = vec![(d(2024, 12), 1.234)].into_iter().collect();
        sparse.insert(d(2024, 11), None);

        let resolved = vec![
            ("cpi".to_string(), two_years()),
            ("eur_usd".to_string(), sparse),
            ("hicp_index".to_string(), TimeSeries::new()),
        ];
        let table = RecentTable::build(&registry, &resolved, RECENT_PERIODS);

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].cells[0], "1.23");
        assert_eq!(table.rows[1].cells[1], "");
        assert_eq!(table.rows[1].cells[5], "");
        assert!(table.rows[2].cells.iter().all(|c| c.is_empty()));
        assert_eq!(table.rows[2].cells.len(), 13);
    }

    #[test]
    fn test_columns_from_first_indicator_with_data() {
        let registry = Registry::builtin();
        let resolved = vec![
            ("hicp_index".to_string(), TimeSeries::new()),
            ("cpi".to_string(), two_years()),
        ];
        let table = RecentTable::build(&registry, &resolved, 3);
        assert_eq!(table.columns, vec!["Dec 2024", "Nov 2024", "Oct 2024"]);
    }

    #[test]
    fn test_nothing_resolved() {
        let registry = Registry::builtin();
        let table = RecentTable::build(&registry, &[("cpi".to_string(), TimeSeries::new())], 13);
        assert!(table.is_empty());
        assert_eq!(table.rows[0].cells.len(), 0);
    }

    #[test]
    fn test_render_alignment() {
        let registry = Registry::builtin();
        let resolved = vec![("cpi".to_string(), two_years())];
        let rendered = RecentTable::build(&registry, &resolved, 2).render();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Indikator"));
        assert!(lines[0].contains("Dec 2024"));
        assert!(lines[2].ends_with("111.00"));
    }
}
