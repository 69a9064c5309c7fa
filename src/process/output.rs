use anyhow::{Context, Result};
use csv::{StringRecord, Terminator, WriterBuilder};
use tracing::warn;

use crate::process::utils::{file_name_of, stem_of};

/// Serialize `rows` under `headers` as UTF-8 CSV. The header line is always
/// written, even when no rows survived. Rows longer than the header are cut to
/// its width, shorter ones padded with empty fields.
pub fn write_csv(headers: &[String], rows: &[StringRecord]) -> Result<Vec<u8>> {
    let width = headers.len();
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .flexible(false)
        .from_writer(Vec::new());

    wtr.write_record(headers).context("writing CSV header")?;

    for (i, row) in rows.iter().enumerate() {
        if row.len() > width {
            warn!(
                row = i + 1,
                fields = row.len(),
                width,
                "row wider than header, extra fields dropped"
            );
        }
        let fields = (0..width).map(|c| row.get(c).unwrap_or(""));
        wtr.write_record(fields)
            .with_context(|| format!("writing CSV row {}", i + 1))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV buffer: {}", e.error()))
}

/// How a destination key is derived from the decoded source key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationRule {
    /// Replace the first occurrence of `from` with `to`. When `from` is absent
    /// the key comes back unchanged.
    Replace { from: String, to: String },
    /// Substitute `{key}`, `{file_name}` and `{stem}` into a template.
    Template(String),
}

impl Default for DestinationRule {
    fn default() -> Self {
        DestinationRule::Replace {
            from: "raw/".into(),
            to: "processed/".into(),
        }
    }
}

impl DestinationRule {
    pub fn destination_key(&self, source_key: &str) -> String {
        match self {
            DestinationRule::Replace { from, to } => {
                if from.is_empty() {
                    source_key.to_string()
                } else {
                    source_key.replacen(from.as_str(), to, 1)
                }
            }
            DestinationRule::Template(template) => template
                .replace("{key}", source_key)
                .replace("{file_name}", file_name_of(source_key))
                .replace("{stem}", stem_of(source_key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_written_even_without_rows() {
        let out = write_csv(&headers(&["id", "Status", "OrderDate"]), &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,Status,OrderDate\r\n");
    }

    #[test]
    fn quotes_fields_that_need_it() {
        let rows = vec![StringRecord::from(vec!["1", "a,b", "say \"hi\""])];
        let out = write_csv(&headers(&["id", "note", "quote"]), &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,note,quote\r\n1,\"a,b\",\"say \"\"hi\"\"\"\r\n"
        );
    }

    #[test]
    fn ragged_rows_are_fitted_to_header() {
        let rows = vec![
            StringRecord::from(vec!["1"]),
            StringRecord::from(vec!["2", "x", "extra"]),
        ];
        let out = write_csv(&headers(&["id", "v"]), &rows).unwrap();

        let mut rdr = ReaderBuilder::new().from_reader(out.as_slice());
        let parsed: Vec<StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(parsed[0], StringRecord::from(vec!["1", ""]));
        assert_eq!(parsed[1], StringRecord::from(vec!["2", "x"]));
    }

    #[test]
    fn replaces_first_raw_segment_only() {
        let rule = DestinationRule::default();
        assert_eq!(
            rule.destination_key("raw/2024/jan.csv"),
            "processed/2024/jan.csv"
        );
        assert_eq!(
            rule.destination_key("raw/raw/jan.csv"),
            "processed/raw/jan.csv"
        );
        assert_eq!(
            rule.destination_key("landing/raw/jan.csv"),
            "landing/processed/jan.csv"
        );
    }

    #[test]
    fn key_without_raw_segment_is_unchanged() {
        let rule = DestinationRule::default();
        assert_eq!(rule.destination_key("archive/jan.csv"), "archive/jan.csv");
    }

    #[test]
    fn template_placeholders() {
        let rule = DestinationRule::Template("processed/filtered_{file_name}".into());
        assert_eq!(
            rule.destination_key("raw/2024/jan.csv"),
            "processed/filtered_jan.csv"
        );

        let rule = DestinationRule::Template("out/{stem}/{key}".into());
        assert_eq!(
            rule.destination_key("raw/jan.csv"),
            "out/jan/raw/jan.csv"
        );
    }
}
