use crate::dataset::JobDataset;

use chrono::NaiveDateTime;
use serde_json::Value;
use std::borrow::Cow;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// `{timestamp}_{field words joined by _}_linkedin_jobs.csv`
pub fn output_file_name(field: &str, timestamp: NaiveDateTime) -> String {
    let field = field.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "{}_{}_linkedin_jobs.csv",
        timestamp.format("%Y%m%d_%H%M%S"),
        field
    )
}

fn cell(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Writes a header of every column, then one line per row. Columns a row
/// lacks come out as empty cells.
pub fn write_csv<W: Write>(dataset: &JobDataset, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        wtr.write_record(
            dataset
                .columns
                .iter()
                .map(|column| cell(row.get(column)).into_owned()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(dataset: &JobDataset, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, &dataset.rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn dataset() -> JobDataset {
        JobDataset::from_records(vec![
            json!({"title": "A", "job_link": "http://a", "description": "line one, \"quoted\""})
                .as_object()
                .unwrap()
                .clone(),
            json!({"title": "B", "job_link": "http://b", "remote": true, "tags": ["x"], "bonus": null})
                .as_object()
                .unwrap()
                .clone(),
        ])
    }

    #[test]
    fn test_output_file_name() {
        let timestamp = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();

        assert_eq!(
            output_file_name("data  scientist ", timestamp),
            "20261019_080509_data_scientist_linkedin_jobs.csv"
        );
    }

    #[test]
    fn test_write_csv_fills_missing_cells() {
        let mut out = Vec::new();
        write_csv(&dataset(), &mut out).expect("Failed to write CSV");

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "title,job_link,description,remote,tags,bonus");
        assert_eq!(lines[1], r#"A,http://a,"line one, ""quoted""",,,"#);
        assert_eq!(lines[2], r#"B,http://b,,true,"[""x""]","#);
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_write_json_rows() {
        let mut out = Vec::new();
        write_json(&dataset(), &mut out).expect("Failed to write JSON");

        let rows: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["remote"], true);
    }
}
