use chrono::{NaiveDate, NaiveDateTime};

use crate::process::ProcessError;

/// One accepted date layout. `year_index` names which of the three
/// separator-delimited tokens must be a four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    pub pattern: &'static str,
    separator: char,
    year_index: usize,
}

/// Tried in order; the first layout that fits wins.
pub const DATE_FORMATS: [DateFormat; 4] = [
    DateFormat {
        pattern: "%Y-%m-%d",
        separator: '-',
        year_index: 0,
    },
    DateFormat {
        pattern: "%m/%d/%Y",
        separator: '/',
        year_index: 2,
    },
    DateFormat {
        pattern: "%Y/%m/%d",
        separator: '/',
        year_index: 0,
    },
    DateFormat {
        pattern: "%d-%m-%Y",
        separator: '-',
        year_index: 2,
    },
];

impl DateFormat {
    /// Token-shape gate before handing the string to chrono, which would
    /// otherwise accept a 1-3 digit `%Y`.
    fn fits(&self, s: &str) -> bool {
        let tokens: Vec<&str> = s.split(self.separator).collect();
        if tokens.len() != 3 {
            return false;
        }
        tokens.iter().enumerate().all(|(i, tok)| {
            let width_ok = if i == self.year_index {
                tok.len() == 4
            } else {
                (1..=2).contains(&tok.len())
            };
            width_ok && tok.bytes().all(|b| b.is_ascii_digit())
        })
    }

    fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        if !self.fits(s) {
            return None;
        }
        NaiveDate::parse_from_str(s, self.pattern)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// Parse `raw` against [`DATE_FORMATS`] and report which layout matched.
pub fn parse_date_with_format(raw: &str) -> Result<(NaiveDateTime, DateFormat), ProcessError> {
    let s = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| fmt.parse(s).map(|dt| (dt, *fmt)))
        .ok_or_else(|| ProcessError::UnparseableDate(raw.to_string()))
}

/// Midnight of the calendar date in `raw`.
pub fn parse_date(raw: &str) -> Result<NaiveDateTime, ProcessError> {
    parse_date_with_format(raw).map(|(dt, _)| dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_15() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn all_layouts_agree_on_the_same_day() {
        for input in ["2024-01-15", "01/15/2024", "2024/01/15", "15-01-2024"] {
            assert_eq!(parse_date(input).unwrap(), jan_15(), "input {input}");
        }
    }

    #[test]
    fn reports_the_matching_layout() {
        let (_, fmt) = parse_date_with_format("15-01-2024").unwrap();
        assert_eq!(fmt.pattern, "%d-%m-%Y");
        let (_, fmt) = parse_date_with_format("2024/01/15").unwrap();
        assert_eq!(fmt.pattern, "%Y/%m/%d");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_date("  2024-01-15\t").unwrap(), jan_15());
    }

    #[test]
    fn unpadded_month_and_day() {
        let dt = parse_date("1/5/2024").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn ambiguous_dash_date_is_day_first() {
        // only %d-%m-%Y has a trailing four-digit year with dashes
        let dt = parse_date("01-02-2024").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn rejects_garbage_and_short_years() {
        for input in ["not-a-date", "", "24-01-15", "2024-13-01", "2024-02-30", "2024-01-15 10:00"] {
            match parse_date(input) {
                Err(ProcessError::UnparseableDate(v)) => assert_eq!(v, input),
                other => panic!("expected failure for {input:?}, got {other:?}"),
            }
        }
    }
}
