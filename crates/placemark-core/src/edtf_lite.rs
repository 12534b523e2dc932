//! A small, deliberately partial Extended Date/Time Format reader.
//!
//! Supports the subset the filter engine needs: `YYYY`, `YYYY-MM`,
//! `YYYY-MM-DD`, and the "unknown" marker (`uuuu` or an empty string). No
//! crate in this workspace's dependency tree provides a dedicated EDTF
//! parser, so this fills the gap rather than widening the date grammar
//! further than the filter engine requires.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdtfDate {
    Unknown,
    Known(NaiveDate),
}

/// Parses an EDTF-lite string. Returns `Unknown` for an empty string or the
/// literal unknown marker; returns an error only for text that looks like a
/// date attempt but doesn't parse.
pub fn parse(text: &str) -> Result<EdtfDate, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("uuuu") {
        return Ok(EdtfDate::Unknown);
    }

    let parts: Vec<&str> = text.split('-').collect();
    let date = match parts.as_slice() {
        [y] => {
            let year = parse_year(y)?;
            NaiveDate::from_ymd_opt(year, 1, 1)
        }
        [y, m] => {
            let year = parse_year(y)?;
            let month = parse_component(m, "month")?;
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        [y, m, d] => {
            let year = parse_year(y)?;
            let month = parse_component(m, "month")?;
            let day = parse_component(d, "day")?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        _ => return Err(format!("unrecognized EDTF-lite date: {text}")),
    };

    date.map(EdtfDate::Known)
        .ok_or_else(|| format!("invalid calendar date: {text}"))
}

fn parse_year(text: &str) -> Result<i32, String> {
    text.parse().map_err(|_| format!("invalid year: {text}"))
}

fn parse_component(text: &str, what: &str) -> Result<u32, String> {
    text.parse().map_err(|_| format!("invalid {what}: {text}"))
}
