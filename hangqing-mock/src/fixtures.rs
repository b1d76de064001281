//! Deterministic daily-bar frames in the shapes real upstreams produce.

use chrono::{Datelike, Days, NaiveDate};

use hangqing_core::{RawFrame, RawValue};

/// Consecutive weekdays starting at `start`.
fn trading_days(start: NaiveDate, rows: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(rows);
    let mut current = start;
    while days.len() < rows {
        if current.weekday().num_days_from_monday() < 5 {
            days.push(current);
        }
        current = current.checked_add_days(Days::new(1)).expect("date overflow");
    }
    days
}

fn price(row: usize, offset: f64) -> String {
    format!("{:.2}", 10.0 + row as f64 * 0.1 + offset)
}

/// A frame with English canonical column names and string cells, the shape
/// the Sina/Tencent upstreams produce.
#[must_use]
pub fn daily_frame(start: NaiveDate, rows: usize) -> RawFrame {
    build(start, rows, &["date", "open", "close", "high", "low", "volume"], "%Y-%m-%d")
}

/// A frame with Chinese column names, the shape the Eastmoney upstream
/// produces.
#[must_use]
pub fn daily_frame_cn(start: NaiveDate, rows: usize) -> RawFrame {
    build(start, rows, &["日期", "开盘", "收盘", "最高", "最低", "成交量"], "%Y-%m-%d")
}

/// A frame with columns but zero rows — the "valid-looking empty" payload the
/// orchestrator must treat as a failure.
#[must_use]
pub fn empty_frame() -> RawFrame {
    let mut frame = RawFrame::new();
    for name in ["date", "open", "close", "high", "low", "volume"] {
        frame.push_column(name, Vec::new()).expect("columns are empty");
    }
    frame
}

fn build(start: NaiveDate, rows: usize, columns: &[&str; 6], date_format: &str) -> RawFrame {
    let days = trading_days(start, rows);
    let mut frame = RawFrame::new();
    let col = |f: &dyn Fn(usize) -> RawValue| (0..rows).map(f).collect::<Vec<_>>();
    let pushes = [
        col(&|i| RawValue::text(days[i].format(date_format).to_string())),
        col(&|i| RawValue::text(price(i, 0.0))),  // open
        col(&|i| RawValue::text(price(i, 0.2))),  // close
        col(&|i| RawValue::text(price(i, 0.5))),  // high
        col(&|i| RawValue::text(price(i, -0.5))), // low
        col(&|i| RawValue::Number(1000.0 + i as f64)),
    ];
    for (name, values) in columns.iter().zip(pushes) {
        frame.push_column(*name, values).expect("equal column lengths");
    }
    frame
}
