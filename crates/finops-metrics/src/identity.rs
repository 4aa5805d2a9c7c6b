//! Series identity: `name{label="value",...}` with labels sorted by name.

use std::fmt;

use finops_table::LabelSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesIdentity(String);

impl SeriesIdentity {
    pub fn new(name: &str, labels: &LabelSet) -> Self {
        let mut key = String::with_capacity(name.len() + labels.len() * 16);
        key.push_str(name);
        key.push('{');
        for (i, (label, value)) in labels.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(label);
            key.push_str("=\"");
            escape_into(&mut key, value);
            key.push('"');
        }
        key.push('}');
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(header: &[&str], row: &[&str], value_index: usize) -> LabelSet {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        let row: Vec<String> = row.iter().map(|s| s.to_string()).collect();
        LabelSet::from_row(&header, &row, value_index)
    }

    #[test]
    fn canonical_form() {
        let set = labels(&["BilledCost", "ServiceName", "ResourceId"], &["1", "VM", "vm-1"], 0);
        let id = SeriesIdentity::new("billed_cost", &set);
        assert_eq!(id.as_str(), r#"billed_cost{ResourceId="vm-1",ServiceName="VM"}"#);
    }

    #[test]
    fn value_does_not_affect_identity() {
        let a = labels(&["BilledCost", "ServiceName"], &["1", "VM"], 0);
        let b = labels(&["BilledCost", "ServiceName"], &["2", "VM"], 0);
        assert_eq!(
            SeriesIdentity::new("billed_cost", &a),
            SeriesIdentity::new("billed_cost", &b)
        );
    }

    #[test]
    fn column_order_does_not_affect_identity() {
        let a = labels(&["A", "B", "V"], &["1", "2", "0"], 2);
        let b = labels(&["B", "A", "V"], &["2", "1", "0"], 2);
        assert_eq!(SeriesIdentity::new("m", &a), SeriesIdentity::new("m", &b));
    }

    #[test]
    fn quotes_are_escaped() {
        let set = labels(&["A", "V"], &["say \"hi\"", "0"], 1);
        assert_eq!(SeriesIdentity::new("m", &set).as_str(), r#"m{A="say \"hi\""}"#);
    }
}
