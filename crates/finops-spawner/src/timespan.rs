//! Date windows and `%s` path templates for child API paths.

use chrono::{Days, Months, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `start/end` window ending `today`: `day`, `month`, `year`; anything
/// else is treated as `month`. Month arithmetic clamps to the last valid
/// day (2024-03-31 minus one month is 2024-02-29).
pub fn compute_timespan(name: &str, today: NaiveDate) -> String {
    let start = match name {
        "day" => today.checked_sub_days(Days::new(1)),
        "year" => today.checked_sub_months(Months::new(12)),
        _ => today.checked_sub_months(Months::new(1)),
    }
    .unwrap_or(today);
    format!(
        "{}/{}",
        start.format(DATE_FORMAT),
        today.format(DATE_FORMAT)
    )
}

/// Replace successive `%s` placeholders with `args`. Placeholders beyond
/// the supplied arguments become empty; surplus arguments are ignored.
pub fn format_suffix(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut parts = template.split("%s");
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for part in parts {
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        out.push_str(part);
    }
    out
}

/// Query-string escaping with `+` for spaces.
pub fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
