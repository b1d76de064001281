//! Provider-native tabular payloads.
//!
//! Every source returns its rows in whatever shape its upstream uses: column
//! names may be Chinese or English, dates may be a column or a timestamp, and
//! numbers frequently arrive as strings. `RawFrame` carries that shape
//! verbatim so the normalizer can reconcile it centrally.

use serde::{Deserialize, Serialize};

use crate::HangqingError;

/// One cell of a raw frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// A string cell, kept verbatim (prices often arrive as strings and are
    /// parsed losslessly during normalization).
    Text(String),
    /// A numeric cell.
    Number(f64),
    /// A missing cell.
    Null,
}

impl RawValue {
    /// Convenience constructor for a text cell.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// The cell as a string slice, when textual.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The cell coerced to a float: numbers pass through, text is parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Whether the cell is missing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A named column of equal length with its frame's other columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    /// Provider-native column name.
    pub name: String,
    /// Column cells, one per row.
    pub values: Vec<RawValue>,
}

/// A column-major, provider-native frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFrame {
    columns: Vec<RawColumn>,
}

impl RawFrame {
    /// An empty frame with no columns.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Append a column.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the column length differs from the frame's
    /// existing columns.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<RawValue>,
    ) -> Result<(), HangqingError> {
        if let Some(first) = self.columns.first() {
            if first.values.len() != values.len() {
                return Err(HangqingError::invalid_arg(format!(
                    "column length mismatch: {} vs {}",
                    first.values.len(),
                    values.len()
                )));
            }
        }
        self.columns.push(RawColumn {
            name: name.into(),
            values,
        });
        Ok(())
    }

    /// All columns in insertion order.
    #[must_use]
    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    /// Look up a column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Whether the frame holds no rows (a frame with columns but zero rows is
    /// empty too).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_column_rejects_length_mismatch() {
        let mut frame = RawFrame::new();
        frame
            .push_column("a", vec![RawValue::Number(1.0), RawValue::Number(2.0)])
            .unwrap();
        assert!(frame.push_column("b", vec![RawValue::Number(1.0)]).is_err());
    }

    #[test]
    fn empty_means_no_rows() {
        let mut frame = RawFrame::new();
        assert!(frame.is_empty());
        frame.push_column("a", vec![]).unwrap();
        assert!(frame.is_empty());
        frame.push_column("b", vec![]).unwrap();
        assert_eq!(frame.row_count(), 0);
    }

    #[test]
    fn text_cells_coerce_to_float() {
        assert_eq!(RawValue::text(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(RawValue::text("n/a").as_f64(), None);
        assert_eq!(RawValue::Null.as_f64(), None);
    }
}
