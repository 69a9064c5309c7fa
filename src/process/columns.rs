use std::collections::HashMap;

use crate::process::{utils::normalize_header, ProcessError};

/// Normalized candidates for the status column, in priority order.
pub const STATUS_CANDIDATES: [&str; 2] = ["status", "orderstatus"];
/// Normalized candidates for the order date column, in priority order.
pub const DATE_CANDIDATES: [&str; 2] = ["orderdate", "date"];

/// A header the filter reads from: its position and the raw name the file used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub status: Column,
    pub date: Column,
}

/// Normalized header → raw header position. Later duplicates overwrite earlier ones.
pub fn header_map(headers: &[String]) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect()
}

fn pick(
    map: &HashMap<String, usize>,
    headers: &[String],
    candidates: &[&str],
) -> Option<Column> {
    candidates.iter().find_map(|cand| {
        map.get(*cand).map(|&index| Column {
            index,
            name: headers[index].clone(),
        })
    })
}

/// Locate the status and date columns, tolerating case and separator variants.
/// Both are required; a file missing either is rejected before any row is read.
pub fn resolve_columns(headers: &[String]) -> Result<ResolvedColumns, ProcessError> {
    let map = header_map(headers);
    let status = pick(&map, headers, &STATUS_CANDIDATES);
    let date = pick(&map, headers, &DATE_CANDIDATES);

    match (status, date) {
        (Some(status), Some(date)) => Ok(ResolvedColumns { status, date }),
        _ => Err(ProcessError::MissingColumns {
            headers: headers.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn status_variants_resolve() {
        for status in ["Status", "STATUS", "order_status", "OrderStatus", "Order Status"] {
            let h = headers(&["id", status, "OrderDate"]);
            let cols = resolve_columns(&h).unwrap();
            assert_eq!(cols.status.index, 1);
            assert_eq!(cols.status.name, status);
        }
    }

    #[test]
    fn date_variants_resolve() {
        for date in ["OrderDate", "order_date", "ORDER DATE", "date", "Date"] {
            let h = headers(&["Status", date]);
            let cols = resolve_columns(&h).unwrap();
            assert_eq!(cols.date.index, 1);
            assert_eq!(cols.date.name, date);
        }
    }

    #[test]
    fn status_beats_order_status() {
        let h = headers(&["order_status", "status", "date"]);
        let cols = resolve_columns(&h).unwrap();
        assert_eq!(cols.status.name, "status");
    }

    #[test]
    fn order_date_beats_date() {
        let h = headers(&["date", "status", "Order_Date"]);
        let cols = resolve_columns(&h).unwrap();
        assert_eq!(cols.date.name, "Order_Date");
        assert_eq!(cols.date.index, 2);
    }

    #[test]
    fn last_duplicate_wins() {
        let h = headers(&["Status", "date", "status"]);
        let cols = resolve_columns(&h).unwrap();
        assert_eq!(cols.status.index, 2);
        assert_eq!(cols.status.name, "status");
    }

    #[test]
    fn unrelated_status_names_do_not_match() {
        let h = headers(&["state", "shipment_status", "date"]);
        match resolve_columns(&h) {
            Err(ProcessError::MissingColumns { headers }) => assert_eq!(headers, h),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn missing_both_columns() {
        let h = headers(&["id", "amount"]);
        assert!(matches!(
            resolve_columns(&h),
            Err(ProcessError::MissingColumns { .. })
        ));
    }
}
