//! Output shaping and formatting shared by `process` and `batch`.

use serde_json::Value;

use taxform_core::models::FULL_TEXT_KEY;
use taxform_core::{CanonicalRecord, DocumentType, Form1099Document, W2Document};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Shape a record for output: the typed W-2 or 1099 form, or the record itself.
pub fn shape_record(record: CanonicalRecord, doc_type: DocumentType, raw: bool) -> anyhow::Result<Value> {
    if raw {
        return Ok(serde_json::to_value(&record)?);
    }
    let value = match doc_type {
        DocumentType::W2 => serde_json::to_value(W2Document::from_record(record))?,
        t if t.is_1099() => serde_json::to_value(Form1099Document::from_record(record, t)?)?,
        _ => serde_json::to_value(&record)?,
    };
    Ok(value)
}

/// Render a shaped record. CSV and text omit the full OCR text.
pub fn render(value: &Value, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Csv => render_csv(value),
        OutputFormat::Text => Ok(render_text(value)),
    }
}

fn fields(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    value
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter())
        .filter(|(key, _)| key.as_str() != FULL_TEXT_KEY)
}

/// Scalar form of a JSON value for tabular output.
pub fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render_csv(value: &Value) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let (keys, values): (Vec<&str>, Vec<String>) =
        fields(value).map(|(k, v)| (k.as_str(), cell(v))).unzip();

    wtr.write_record(&keys)?;
    wtr.write_record(&values)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn render_text(value: &Value) -> String {
    let width = fields(value).map(|(k, _)| k.len()).max().unwrap_or(0);

    let mut output = String::new();
    for (key, field) in fields(value) {
        let text = cell(field);
        if text.is_empty() {
            continue;
        }
        output.push_str(&format!("{:width$}  {}\n", key, text, width = width));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut record = CanonicalRecord::new();
        record.insert(FULL_TEXT_KEY, "long OCR text");
        record.insert("employeeName", "JANE DOE");
        record.insert("wages", 900.0);
        shape_record(record, DocumentType::W2, false).unwrap()
    }

    #[test]
    fn test_shape_w2_has_fixed_keys() {
        let value = sample();
        assert_eq!(value["documentType"], "W2");
        assert_eq!(value["employeeSSN"], "");
        assert_eq!(value["wages"], 900.0);
    }

    #[test]
    fn test_raw_shape_is_record() {
        let mut record = CanonicalRecord::new();
        record.insert("wages", 900.0);
        let value = shape_record(record, DocumentType::W2, true).unwrap();
        assert!(value.get("employeeSSN").is_none());
    }

    #[test]
    fn test_csv_omits_full_text() {
        let csv = render(&sample(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("employeeName"));
        assert!(!header.contains("fullText"));
        assert!(lines.next().unwrap().contains("JANE DOE"));
    }

    #[test]
    fn test_text_skips_empty_values() {
        let text = render(&sample(), OutputFormat::Text).unwrap();
        assert!(text.contains("JANE DOE"));
        assert!(!text.contains("employeeSSN"));
        assert!(!text.contains("long OCR text"));
    }
}
