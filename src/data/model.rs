use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Field – the source columns the dashboard extracts
// ---------------------------------------------------------------------------

/// A required column of the contract opportunities extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    NoticeId,
    Title,
    ResponseDate,
    OpportunityType,
    Status,
    Naics,
    SetAside,
}

impl Field {
    /// All extracted columns, in display order.
    pub const ALL: [Field; 7] = [
        Field::NoticeId,
        Field::Title,
        Field::ResponseDate,
        Field::OpportunityType,
        Field::Status,
        Field::Naics,
        Field::SetAside,
    ];

    /// Header text as it appears in the source CSV.
    pub fn header(self) -> &'static str {
        match self {
            Field::NoticeId => "Notice ID",
            Field::Title => "Title",
            Field::ResponseDate => "Current Response Date",
            Field::OpportunityType => "Contract Opportunity Type",
            Field::Status => "Active/Inactive",
            Field::Naics => "NAICS",
            Field::SetAside => "Set Aside",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Facet – a column the user can filter with a multi-select
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Status,
    Naics,
    SetAside,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Status, Facet::Naics, Facet::SetAside];

    /// Label used for the sidebar control.
    pub fn label(self) -> &'static str {
        match self {
            Facet::Status => "Status",
            Facet::Naics => "NAICS Code",
            Facet::SetAside => "Set-Aside Type",
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunity – one row of the extract
// ---------------------------------------------------------------------------

/// A single contract opportunity.
///
/// Empty categorical cells are stored as `None`; they are never offered as
/// filter options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    pub notice_id: String,
    pub title: String,
    /// Response date text exactly as found in the source.
    pub response_date_raw: String,
    /// `None` when the text is empty or not a recognised date.
    pub response_date: Option<NaiveDate>,
    pub opportunity_type: Option<String>,
    pub status: Option<String>,
    pub naics: Option<String>,
    pub set_aside: Option<String>,
}

impl Opportunity {
    /// Value of a facet column, if present.
    pub fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Status => self.status.as_deref(),
            Facet::Naics => self.naics.as_deref(),
            Facet::SetAside => self.set_aside.as_deref(),
        }
    }

    /// Display text of a column; missing values render as an empty string.
    pub fn display(&self, field: Field) -> String {
        match field {
            Field::NoticeId => self.notice_id.clone(),
            Field::Title => self.title.clone(),
            Field::ResponseDate => self
                .response_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            Field::OpportunityType => self.opportunity_type.clone().unwrap_or_default(),
            Field::Status => self.status.clone().unwrap_or_default(),
            Field::Naics => self.naics.clone().unwrap_or_default(),
            Field::SetAside => self.set_aside.clone().unwrap_or_default(),
        }
    }
}

/// Trim a raw cell and map an empty result to `None`.
pub fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Response date parsing
// ---------------------------------------------------------------------------

// `%y` before `%Y` throughout: chrono's `%Y` would read "02/14/25" as year 25.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

/// Parse a response date cell into a calendar date.
///
/// Timestamps keep the date as written; the time of day and any UTC offset
/// are discarded. Never fails: unrecognised text yields `None`.
pub fn parse_response_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // Anything else that leads with an ISO date, e.g. "2025-02-14 17:00 EST".
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

// ---------------------------------------------------------------------------
// OpportunityTable – the complete loaded extract
// ---------------------------------------------------------------------------

/// The parsed extract; immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct OpportunityTable {
    /// Human-readable origin (path or URL).
    pub origin: String,
    /// All rows in source order.
    pub records: Vec<Opportunity>,
}

impl OpportunityTable {
    pub fn new(origin: impl Into<String>, records: Vec<Opportunity>) -> Self {
        OpportunityTable {
            origin: origin.into(),
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with an unparseable or empty response date.
    pub fn undated_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.response_date.is_none())
            .count()
    }
}
