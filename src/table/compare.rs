//! Structural and value comparison of a produced table against the reference.
//!
//! Exact by default: same columns in the same order, same row count, equal
//! cells in the same row order. Order insensitivity and numeric tolerance are
//! opt-in through `ComparisonConfig`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Table;
use crate::config::ComparisonConfig;

/// What kind of difference was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Row or column counts differ
    Shape,
    /// Column names or their order differ
    Columns,
    /// At least one aligned cell differs
    Values,
    /// Same rows, different order
    RowOrder,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::Shape => "shape mismatch",
            MismatchKind::Columns => "column mismatch",
            MismatchKind::Values => "value mismatch",
            MismatchKind::RowOrder => "row order mismatch",
        }
    }
}

/// One differing cell, addressed by reference row index and column name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDiff {
    pub row: usize,
    pub column: String,
    pub expected: String,
    pub actual: String,
}

/// Everything the corrective prompt needs to know about a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchReport {
    pub kinds: Vec<MismatchKind>,
    pub expected_shape: (usize, usize),
    pub actual_shape: (usize, usize),
    pub expected_columns: Vec<String>,
    pub actual_columns: Vec<String>,
    /// First few differing cells
    pub cell_diffs: Vec<CellDiff>,
    pub total_cell_diffs: usize,
    pub expected_preview: String,
    pub actual_preview: String,
}

impl MismatchReport {
    pub fn has(&self, kind: MismatchKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// One-line description
    pub fn headline(&self) -> String {
        let kinds: Vec<_> = self.kinds.iter().map(|k| k.as_str()).collect();
        format!(
            "Output does not match reference ({}): expected {}x{}, got {}x{}",
            kinds.join(", "),
            self.expected_shape.0,
            self.expected_shape.1,
            self.actual_shape.0,
            self.actual_shape.1
        )
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;

        if self.has(MismatchKind::Columns) {
            writeln!(f)?;
            writeln!(f, "Column Mismatch:")?;
            writeln!(f, "Expected Columns: {:?}", self.expected_columns)?;
            writeln!(f, "Actual Columns: {:?}", self.actual_columns)?;
        } else {
            writeln!(f, "Columns match, but data content differs.")?;
        }

        if !self.cell_diffs.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Differing cells (first {} of {}):",
                self.cell_diffs.len(),
                self.total_cell_diffs
            )?;
            for diff in &self.cell_diffs {
                writeln!(
                    f,
                    "- row {}, column '{}': expected '{}', got '{}'",
                    diff.row, diff.column, diff.expected, diff.actual
                )?;
            }
        }

        if self.has(MismatchKind::RowOrder) {
            writeln!(f)?;
            writeln!(
                f,
                "The rows contain the expected values but in a different order; \
                 keep the document's row order."
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Expected Table Head ---")?;
        writeln!(f, "{}", self.expected_preview)?;
        writeln!(f)?;
        writeln!(f, "--- Actual Table Head ---")?;
        writeln!(f, "{}", self.actual_preview)?;
        writeln!(f)?;
        write!(f, "Review your logic for extracting data from the document.")
    }
}

/// Compare `actual` against `expected`. `None` means they match.
pub fn compare(
    actual: &Table,
    expected: &Table,
    config: &ComparisonConfig,
) -> Option<MismatchReport> {
    let mut kinds = Vec::new();

    // For each expected column, where it lives in `actual`
    let mapping: Vec<Option<usize>> = if actual.columns() == expected.columns() {
        (0..expected.columns().len()).map(Some).collect()
    } else {
        let same_set = !config.column_order_sensitive && same_column_set(actual, expected);
        if !same_set {
            kinds.push(MismatchKind::Columns);
        }
        expected
            .columns()
            .iter()
            .map(|name| actual.column_index(name))
            .collect()
    };

    if actual.shape() != expected.shape() {
        kinds.push(MismatchKind::Shape);
    }

    let aligned_actual = align_rows(actual, &mapping);
    let tolerance = config.float_tolerance;

    let (actual_rows, expected_rows) = if config.row_order_sensitive {
        (aligned_actual.clone(), expected.rows().to_vec())
    } else {
        (sorted_rows(&aligned_actual), sorted_rows(expected.rows()))
    };

    let mut cell_diffs = Vec::new();
    let mut total_cell_diffs = 0;
    for (row, (a_row, e_row)) in actual_rows.iter().zip(expected_rows.iter()).enumerate() {
        for (col, name) in expected.columns().iter().enumerate() {
            let Some(a_cell) = a_row.get(col).and_then(|c| c.as_deref()) else {
                continue;
            };
            let e_cell = e_row.get(col).map(String::as_str).unwrap_or("");
            if !cells_equal(a_cell, e_cell, tolerance) {
                total_cell_diffs += 1;
                if cell_diffs.len() < config.max_diffs {
                    cell_diffs.push(CellDiff {
                        row,
                        column: name.clone(),
                        expected: e_cell.to_string(),
                        actual: a_cell.to_string(),
                    });
                }
            }
        }
    }

    if total_cell_diffs > 0 {
        kinds.push(MismatchKind::Values);

        let aligned_complete = mapping.iter().all(Option::is_some);
        if config.row_order_sensitive
            && aligned_complete
            && actual.shape() == expected.shape()
            && same_rows_any_order(&aligned_actual, expected.rows(), tolerance)
        {
            kinds.push(MismatchKind::RowOrder);
        }
    }

    if kinds.is_empty() {
        return None;
    }

    Some(MismatchReport {
        kinds,
        expected_shape: expected.shape(),
        actual_shape: actual.shape(),
        expected_columns: expected.columns().to_vec(),
        actual_columns: actual.columns().to_vec(),
        cell_diffs,
        total_cell_diffs,
        expected_preview: expected.preview_markdown(config.max_diffs),
        actual_preview: actual.preview_markdown(config.max_diffs),
    })
}

/// Cell equality: empty equals empty, numbers compare as numbers, else text.
pub fn cells_equal(actual: &str, expected: &str, tolerance: Option<f64>) -> bool {
    if actual == expected {
        return true;
    }
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(e)) => {
            if a.is_nan() && e.is_nan() {
                return true;
            }
            match tolerance {
                Some(tol) => (a - e).abs() <= tol,
                None => a == e,
            }
        }
        _ => false,
    }
}

fn same_rows_any_order(
    actual: &[Vec<Option<String>>],
    expected: &[Vec<String>],
    tolerance: Option<f64>,
) -> bool {
    let actual = sorted_rows(actual);
    let expected = sorted_rows(expected);
    actual.iter().zip(expected.iter()).all(|(a_row, e_row)| {
        a_row.len() == e_row.len()
            && a_row
                .iter()
                .zip(e_row.iter())
                .all(|(a, e)| cells_equal(a.text(), e, tolerance))
    })
}

fn same_column_set(actual: &Table, expected: &Table) -> bool {
    let mut a: Vec<_> = actual.columns().to_vec();
    let mut e: Vec<_> = expected.columns().to_vec();
    a.sort();
    e.sort();
    a == e
}

/// Reorder `table`'s cells into the expected column order; `None` for columns it lacks.
fn align_rows(table: &Table, mapping: &[Option<usize>]) -> Vec<Vec<Option<String>>> {
    table
        .rows()
        .iter()
        .map(|row| {
            mapping
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i).cloned()))
                .collect()
        })
        .collect()
}

/// Rows sorted by a canonical key so that `100` and `100.0` sort together.
fn sorted_rows<C: Clone + CellText>(rows: &[Vec<C>]) -> Vec<Vec<C>> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_cached_key(|row| row.iter().map(|c| canonical(c.text())).collect::<Vec<_>>());
    sorted
}

fn canonical(cell: &str) -> String {
    match cell.trim().parse::<f64>() {
        Ok(n) if !n.is_nan() => format!("{}", n),
        _ => cell.to_string(),
    }
}

trait CellText {
    fn text(&self) -> &str;
}

impl CellText for String {
    fn text(&self) -> &str {
        self
    }
}

impl CellText for Option<String> {
    fn text(&self) -> &str {
        self.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Table {
        Table::from_rows(
            &["Date", "Description", "Debit Amt", "Credit Amt", "Balance"],
            &[
                &["01-08-2024", "Salary Credit XYZ Pvt Ltd", "", "1935.3", "6864.58"],
                &["02-08-2024", "Salary Credit XYZ Pvt Ltd", "", "1652.61", "8517.19"],
                &["03-08-2024", "IMPS UPI Payment Amazon", "3886.08", "", "4631.11"],
            ],
        )
    }

    #[test]
    fn test_identical_tables_match() {
        let table = reference();
        assert!(compare(&table, &table, &ComparisonConfig::default()).is_none());
    }

    #[test]
    fn test_empty_tables_match() {
        let table = Table::default();
        assert!(compare(&table, &table, &ComparisonConfig::default()).is_none());
    }

    #[test]
    fn test_numeric_formatting_is_not_a_difference() {
        let expected = Table::from_rows(&["n"], &[&["100"], &["2.50"]]);
        let actual = Table::from_rows(&["n"], &[&["100.0"], &["2.5"]]);
        assert!(compare(&actual, &expected, &ComparisonConfig::default()).is_none());
    }

    #[test]
    fn test_single_cell_difference_is_located() {
        let expected = reference();
        let mut rows = expected.rows().to_vec();
        rows[1][4] = "8517.20".to_string();
        let actual = Table::new(expected.columns().to_vec(), rows);

        let report = compare(&actual, &expected, &ComparisonConfig::default()).unwrap();
        assert_eq!(report.kinds, vec![MismatchKind::Values]);
        assert_eq!(report.total_cell_diffs, 1);
        assert_eq!(
            report.cell_diffs[0],
            CellDiff {
                row: 1,
                column: "Balance".to_string(),
                expected: "8517.19".to_string(),
                actual: "8517.20".to_string(),
            }
        );
        let text = report.to_string();
        assert!(text.contains("row 1, column 'Balance': expected '8517.19', got '8517.20'"));
        assert!(text.contains("Columns match, but data content differs."));
    }

    #[test]
    fn test_row_order_difference_fails_by_default() {
        let expected = reference();
        let mut rows = expected.rows().to_vec();
        rows.swap(0, 2);
        let actual = Table::new(expected.columns().to_vec(), rows);

        let report = compare(&actual, &expected, &ComparisonConfig::default()).unwrap();
        assert!(report.has(MismatchKind::Values));
        assert!(report.has(MismatchKind::RowOrder));
        assert!(!report.has(MismatchKind::Shape));
    }

    #[test]
    fn test_row_order_difference_allowed_when_configured() {
        let expected = reference();
        let mut rows = expected.rows().to_vec();
        rows.swap(0, 2);
        let actual = Table::new(expected.columns().to_vec(), rows);

        let config = ComparisonConfig {
            row_order_sensitive: false,
            ..Default::default()
        };
        assert!(compare(&actual, &expected, &config).is_none());
    }

    #[test]
    fn test_column_order_difference() {
        let expected = Table::from_rows(&["a", "b"], &[&["1", "x"]]);
        let actual = Table::from_rows(&["b", "a"], &[&["x", "1"]]);

        let report = compare(&actual, &expected, &ComparisonConfig::default()).unwrap();
        assert!(report.has(MismatchKind::Columns));
        assert!(!report.has(MismatchKind::Values));

        let config = ComparisonConfig {
            column_order_sensitive: false,
            ..Default::default()
        };
        assert!(compare(&actual, &expected, &config).is_none());
    }

    #[test]
    fn test_missing_column_and_shape() {
        let expected = reference();
        let actual = Table::from_rows(
            &["Date", "Description"],
            &[&["01-08-2024", "Salary Credit XYZ Pvt Ltd"]],
        );

        let report = compare(&actual, &expected, &ComparisonConfig::default()).unwrap();
        assert!(report.has(MismatchKind::Columns));
        assert!(report.has(MismatchKind::Shape));
        assert_eq!(report.expected_shape, (3, 5));
        assert_eq!(report.actual_shape, (1, 2));
        assert!(report.to_string().contains("Expected Columns:"));
    }

    #[test]
    fn test_float_tolerance() {
        let expected = Table::from_rows(&["x"], &[&["1.000"]]);
        let actual = Table::from_rows(&["x"], &[&["1.004"]]);

        assert!(compare(&actual, &expected, &ComparisonConfig::default()).is_some());

        let config = ComparisonConfig {
            float_tolerance: Some(0.01),
            ..Default::default()
        };
        assert!(compare(&actual, &expected, &config).is_none());
    }

    #[test]
    fn test_diffs_are_capped() {
        let expected = Table::from_rows(&["x"], &[&["1"], &["2"], &["3"], &["4"]]);
        let actual = Table::from_rows(&["x"], &[&["9"], &["9"], &["9"], &["9"]]);
        let config = ComparisonConfig {
            max_diffs: 2,
            ..Default::default()
        };

        let report = compare(&actual, &expected, &config).unwrap();
        assert_eq!(report.cell_diffs.len(), 2);
        assert_eq!(report.total_cell_diffs, 4);
        assert!(report.expected_preview.contains("more rows"));
    }

    #[test]
    fn test_cells_equal() {
        assert!(cells_equal("", "", None));
        assert!(cells_equal("NaN", "nan", None));
        assert!(cells_equal("3", "3.0", None));
        assert!(!cells_equal("3", "", None));
        assert!(!cells_equal("abc", "ABC", None));
        assert!(cells_equal("10.0", "10.05", Some(0.1)));
    }
}
