//! Lenient CSV parsing.

use crate::error::NormalizeResult;
use crate::records::Row;

const BOM: &str = "\u{feff}";

/// Remove UTF-8 byte-order marks from both ends of a payload.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    let bom = BOM.as_bytes();
    let mut data = data;
    while let Some(rest) = data.strip_prefix(bom) {
        data = rest;
    }
    while let Some(rest) = data.strip_suffix(bom) {
        data = rest;
    }
    data
}

/// Parse CSV into raw rows. Rows may have differing lengths and bare
/// quotes inside unquoted fields are kept literally.
pub fn parse_rows(data: &[u8]) -> NormalizeResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_bom() {
        let data = b"\xef\xbb\xbfA,B\n1,2";
        assert_eq!(strip_bom(data), b"A,B\n1,2");
        assert_eq!(strip_bom(b"A,B"), b"A,B");
    }

    #[test]
    fn parses_quoted_fields() {
        let rows = parse_rows(b"Name,Tags\nvm,\"{\"\"env\"\"=\"\"prod\"\"}\"\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], r#"{"env"="prod"}"#);
    }

    #[test]
    fn tolerates_ragged_rows_and_bare_quotes() {
        let rows = parse_rows(b"A,B,C\n1,2\n3,4\"x,5\n").unwrap();
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[2][1], "4\"x");
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse_rows(b"").unwrap().is_empty());
    }
}
