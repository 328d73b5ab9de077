use serde::Serialize;

use crate::error::Result;

use super::model::{Field, Opportunity};

/// File name offered for the filtered CSV download.
pub const DEFAULT_DOWNLOAD_NAME: &str = "filtered_contract_opportunities.csv";

/// One exported row, keyed by the source column names.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Notice ID")]
    notice_id: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Current Response Date")]
    response_date: Option<String>,
    #[serde(rename = "Contract Opportunity Type")]
    opportunity_type: Option<&'a str>,
    #[serde(rename = "Active/Inactive")]
    status: Option<&'a str>,
    #[serde(rename = "NAICS")]
    naics: Option<&'a str>,
    #[serde(rename = "Set Aside")]
    set_aside: Option<&'a str>,
}

impl<'a> From<&'a Opportunity> for ExportRow<'a> {
    fn from(r: &'a Opportunity) -> Self {
        ExportRow {
            notice_id: &r.notice_id,
            title: &r.title,
            response_date: r.response_date.map(|d| d.format("%Y-%m-%d").to_string()),
            opportunity_type: r.opportunity_type.as_deref(),
            status: r.status.as_deref(),
            naics: r.naics.as_deref(),
            set_aside: r.set_aside.as_deref(),
        }
    }
}

/// Render records as CSV: header row, no index column, missing values empty.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a Opportunity>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(Field::ALL.iter().map(|f| f.header()))?;
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Render records as a pretty-printed JSON array.
pub fn to_json<'a>(records: impl IntoIterator<Item = &'a Opportunity>) -> Result<String> {
    let rows: Vec<ExportRow<'a>> = records.into_iter().map(ExportRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record() -> Opportunity {
        Opportunity {
            notice_id: "W912".into(),
            title: "Hazmat disposal, base-wide".into(),
            response_date_raw: "2025-02-14T17:00:00-05:00".into(),
            response_date: NaiveDate::from_ymd_opt(2025, 2, 14),
            opportunity_type: Some("Solicitation".into()),
            status: Some("Yes".into()),
            naics: Some("Hazardous Waste Treatment and Disposal".into()),
            set_aside: None,
        }
    }

    #[test]
    fn csv_has_header_and_no_index() {
        let rec = record();
        let text = to_csv([&rec]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Notice ID,Title,Current Response Date,Contract Opportunity Type,Active/Inactive,NAICS,Set Aside")
        );
        assert_eq!(
            lines.next(),
            Some("W912,\"Hazmat disposal, base-wide\",2025-02-14,Solicitation,Yes,Hazardous Waste Treatment and Disposal,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_keeps_non_ascii_text_intact() {
        let mut rec = record();
        rec.title = "Café “phase 2” – Señal".into();
        let text = to_csv([&rec]).unwrap();
        assert!(text.contains("Café “phase 2” – Señal"));
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn empty_result_still_has_header() {
        let text = to_csv(std::iter::empty()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn json_uses_source_column_names() {
        let rec = record();
        let text = to_json([&rec]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["Notice ID"], "W912");
        assert_eq!(value[0]["Current Response Date"], "2025-02-14");
        assert!(value[0]["Set Aside"].is_null());
    }
}
