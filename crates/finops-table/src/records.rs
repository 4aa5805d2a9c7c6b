//! A normalized batch: header row plus data rows.

/// One row of string cells.
pub type Row = Vec<String>;

/// Header plus data rows. Column positions in the header are the source
/// of truth for every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    header: Row,
    rows: Vec<Row>,
}

impl Records {
    pub fn new(header: Row, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    /// Split a raw row list into header (row 0) and data rows.
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header, compared case-insensitively.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
    }
}
