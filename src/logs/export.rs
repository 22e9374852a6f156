// Export of a user's log entries as JSON or CSV

use std::str::FromStr;

use crate::logs::models::{LogEntry, DATE_FORMAT};

const CSV_HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Location",
    "Spring Type",
    "Features",
    "Visit Date",
    "Rating",
    "Comment",
    "Created At",
    "Updated At",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "onsen_logs.json",
            ExportFormat::Csv => "onsen_logs.csv",
        }
    }

    pub fn render(&self, entries: &[LogEntry]) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ExportFormat::Json => serde_json::to_vec_pretty(entries),
            ExportFormat::Csv => Ok(to_csv(entries).into_bytes()),
        }
    }
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn to_csv(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push_str("\r\n");

    for entry in entries {
        let features = entry
            .features
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let row = [
            entry.id.to_string(),
            entry.name.clone(),
            entry.location.clone(),
            entry.spring_type.as_str().to_string(),
            features,
            entry.visit_date.format(DATE_FORMAT).to_string(),
            entry.rating.to_string(),
            entry.comment.clone(),
            entry.created_at.to_rfc3339(),
            entry.updated_at.to_rfc3339(),
        ];
        let line = row.iter().map(|v| csv_field(v)).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::models::{Feature, SpringType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn sample() -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Kusatsu".into(),
            location: "Kusatsu, Gunma".into(),
            spring_type: SpringType::Sulfur,
            features: vec![Feature::OutdoorBath, Feature::Sauna],
            visit_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            rating: 5,
            comment: "Said \"best\" ever".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = to_csv(&[sample()]);
        let mut lines = csv.split("\r\n");

        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains(",\"Kusatsu, Gunma\",sulfur,\"outdoor_bath, sauna\",2024-01-10,5,"));
        assert!(row.contains("\"Said \"\"best\"\" ever\""));
    }

    #[test]
    fn test_csv_empty_has_only_header() {
        assert_eq!(to_csv(&[]), format!("{}\r\n", CSV_HEADER.join(",")));
    }

    #[test]
    fn test_json_is_array() {
        let bytes = ExportFormat::Json.render(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["spring_type"], "sulfur");
        assert_eq!(value[0]["visit_date"], "2024-01-10");
    }
}
