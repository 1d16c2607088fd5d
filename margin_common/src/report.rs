//! Fixed-width text report.
//!
//! The same text is written to the output file and echoed to the console.
//! Rendering is pure: the generation time is passed in, so identical inputs
//! give byte-identical output.
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::margin::within_threshold;
use crate::quote::{MarginRow, SkipNote};

const REPORT_WIDTH: usize = 120;
const TITLE: &str = "FYERS LTP AND MARGIN CALCULATOR RESULTS";

const SYMBOL_WIDTH: usize = 15;
const SPOT_WIDTH: usize = 14;
const CONTRACT_WIDTH: usize = 15;
const PREMIUM_WIDTH: usize = 12;
const MARGIN_WIDTH: usize = 12;

/// Rows under the budget plus the notes explaining what is missing.
#[derive(Debug, Clone)]
pub struct Report {
    threshold: Decimal,
    generated_at: NaiveDateTime,
    rows: Vec<MarginRow>,
    notes: Vec<SkipNote>,
}

impl Report {
    /// Empty report for a budget of `threshold`.
    pub fn new(threshold: Decimal, generated_at: NaiveDateTime) -> Self {
        Report {
            threshold,
            generated_at,
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds `row` if its margin is strictly under the threshold.
    ///
    /// Returns whether the row was kept.
    pub fn add_row(&mut self, row: MarginRow) -> bool {
        if within_threshold(row.margin, self.threshold) {
            self.rows.push(row);
            true
        } else {
            false
        }
    }

    /// Records a skipped symbol or side.
    pub fn add_note(&mut self, note: SkipNote) {
        self.notes.push(note);
    }

    /// Kept rows in insertion order.
    pub fn rows(&self) -> &[MarginRow] {
        &self.rows
    }

    /// Number of symbols skipped entirely.
    pub fn skipped(&self) -> usize {
        self.notes.iter().filter(|n| n.side.is_none()).count()
    }

    /// Renders the full report, one trailing newline included.
    pub fn render(&self) -> String {
        let banner = "=".repeat(REPORT_WIDTH);
        let rule = "-".repeat(REPORT_WIDTH);
        let mut lines = vec![
            banner.clone(),
            TITLE.to_string(),
            format!(
                "Margin Filter: Under ₹{} | Margin = LTP × Lot Size",
                grouped(self.threshold)
            ),
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            banner,
            String::new(),
            format!(
                "{:<sw$} {:>pw$} {:>cw$} {:>qw$} {:>mw$}",
                "Symbol",
                "Underlying LTP",
                "ATM Contract",
                "Contract LTP",
                "Margin",
                sw = SYMBOL_WIDTH,
                pw = SPOT_WIDTH,
                cw = CONTRACT_WIDTH,
                qw = PREMIUM_WIDTH,
                mw = MARGIN_WIDTH,
            ),
            rule.clone(),
        ];

        if self.rows.is_empty() {
            lines.push(format!(
                "No symbols found with margin under ₹{}",
                grouped(self.threshold)
            ));
        }
        for row in &self.rows {
            lines.push(format!(
                "{:<sw$} {} {:>cw$} {} {}",
                row.symbol,
                money_cell(row.spot, SPOT_WIDTH),
                row.contract_label(),
                money_cell(row.premium, PREMIUM_WIDTH),
                money_cell(row.margin, MARGIN_WIDTH),
                sw = SYMBOL_WIDTH,
                cw = CONTRACT_WIDTH,
            ));
        }
        lines.push(rule);

        lines.push(format!("Rows: {} | Skipped: {}", self.rows.len(), self.skipped()));
        for note in &self.notes {
            match note.side {
                None => lines.push(format!("Skipped {}: {}", note.symbol, note.reason)),
                Some(side) => lines.push(format!("Note {} {}: {}", note.symbol, side, note.reason)),
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Two-decimal currency amount; rounding applies to display only.
fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// `₹` followed by the amount right-aligned so the cell is `width` wide.
fn money_cell(value: Decimal, width: usize) -> String {
    format!("₹{:>w$}", money(value), w = width - 1)
}

/// Amount with thousands separators, e.g. `20,000.00`.
fn grouped(value: Decimal) -> String {
    let text = money(value);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{}{}.{}", sign, out, frac_part)
}
