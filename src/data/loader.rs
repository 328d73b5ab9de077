use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::encoding::TextEncoding;
use super::model::{non_empty, parse_response_date, Field, Opportunity, OpportunityTable};

// ---------------------------------------------------------------------------
// Source – where the CSV comes from
// ---------------------------------------------------------------------------

/// Location of a contract opportunities extract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    /// Interpret a user-supplied string: `http(s)://` is a URL, anything
    /// else a filesystem path.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::Path(PathBuf::from(trimmed))
        }
    }
}

impl From<&Path> for Source {
    fn from(p: &Path) -> Self {
        Source::Path(p.to_path_buf())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => f.write_str(u),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and parse an extract. Any failure aborts the whole load.
pub fn load(source: &Source, encoding: TextEncoding) -> Result<OpportunityTable> {
    let bytes = read_bytes(source)?;
    let location = source.to_string();
    let text = encoding.decode(&bytes).map_err(|e| Error::Decode {
        location: location.clone(),
        encoding: encoding.label(),
        offset: e.offset,
        byte: e.byte,
    })?;
    let table = parse_csv(&location, &text)?;
    log::info!(
        "Loaded {} opportunities from {location} ({} without a usable response date)",
        table.len(),
        table.undated_count()
    );
    Ok(table)
}

/// Parse decoded CSV text into a table.
///
/// The header row must contain every column in [`Field::ALL`]; all missing
/// columns are reported together. Other columns are ignored.
pub fn parse_csv(location: &str, text: &str) -> Result<OpportunityTable> {
    let csv_err = |err| Error::Csv {
        location: location.to_string(),
        err,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut missing = Vec::new();
    let mut index = [0usize; 7];
    for (slot, field) in index.iter_mut().zip(Field::ALL) {
        match headers.iter().position(|h| h == field.header()) {
            Some(i) => *slot = i,
            None => missing.push(field.header().to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            location: location.to_string(),
            columns: missing,
        });
    }
    let [id_idx, title_idx, date_idx, type_idx, status_idx, naics_idx, set_aside_idx] = index;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_err)?;
        // Short rows leave trailing cells missing; long rows cannot be placed.
        if row.len() > headers.len() {
            return Err(Error::RaggedRow {
                location: location.to_string(),
                line: row.position().map_or(0, |p| p.line()),
                fields: row.len(),
                expected: headers.len(),
            });
        }
        let cell = |i: usize| row.get(i).unwrap_or("");
        let date_raw = cell(date_idx);
        records.push(Opportunity {
            notice_id: cell(id_idx).trim().to_string(),
            title: cell(title_idx).trim().to_string(),
            response_date_raw: date_raw.to_string(),
            response_date: parse_response_date(date_raw),
            opportunity_type: non_empty(cell(type_idx)),
            status: non_empty(cell(status_idx)),
            naics: non_empty(cell(naics_idx)),
            set_aside: non_empty(cell(set_aside_idx)),
        });
    }

    Ok(OpportunityTable::new(location, records))
}

fn read_bytes(source: &Source) -> Result<Vec<u8>> {
    match source {
        Source::Path(path) => std::fs::read(path).map_err(|err| Error::Io {
            location: path.display().to_string(),
            err,
        }),
        Source::Url(url) => {
            let fetch_err = |err| Error::Fetch {
                url: url.clone(),
                err,
            };
            log::debug!("GET {url}");
            let response = reqwest::blocking::get(url).map_err(fetch_err)?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::HttpStatus {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            let body = response.bytes().map_err(fetch_err)?;
            Ok(body.to_vec())
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetCache – load once per (source, encoding)
// ---------------------------------------------------------------------------

/// Memoizes loaded tables for the lifetime of the process.
///
/// Failed loads are not cached, so a later attempt retries the source.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<(Source, TextEncoding), Arc<OpportunityTable>>,
    loader: Option<Box<dyn Fn(&Source, TextEncoding) -> Result<OpportunityTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom loader instead of [`load`].
    pub fn with_loader(
        loader: impl Fn(&Source, TextEncoding) -> Result<OpportunityTable> + 'static,
    ) -> Self {
        DatasetCache {
            entries: HashMap::new(),
            loader: Some(Box::new(loader)),
        }
    }

    /// Return the cached table for this key, loading it on first use.
    pub fn get_or_load(
        &mut self,
        source: &Source,
        encoding: TextEncoding,
    ) -> Result<Arc<OpportunityTable>> {
        let key = (source.clone(), encoding);
        if let Some(table) = self.entries.get(&key) {
            log::debug!("Cache hit for {source} ({encoding})");
            return Ok(Arc::clone(table));
        }
        let table = match &self.loader {
            Some(loader) => loader(source, encoding)?,
            None => load(source, encoding)?,
        };
        let table = Arc::new(table);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ErrorKind;

    const HEADER: &str = "Notice ID,Title,Department/Ind.Agency,Current Response Date,Contract Opportunity Type,Active/Inactive,NAICS,Set Aside";

    #[test]
    fn source_parse_distinguishes_urls() {
        assert_eq!(
            Source::parse("https://example.gov/opps.csv"),
            Source::Url("https://example.gov/opps.csv".into())
        );
        assert_eq!(
            Source::parse("data/opps.csv"),
            Source::Path(PathBuf::from("data/opps.csv"))
        );
    }

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let text = format!(
            "{HEADER}\n\
             abc123,\"Lab testing, phase 2\",VA,2025-02-14T17:00:00-05:00,Solicitation,Yes,Testing Laboratories,Total Small Business Set-Aside (FAR 19.5)\n\
             def456,Couriers,GSA,not a date,Sources Sought,Yes,Couriers and Express Delivery Services,\n"
        );
        let table = parse_csv("inline", &text).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records[0];
        assert_eq!(first.title, "Lab testing, phase 2");
        assert_eq!(first.response_date.unwrap().to_string(), "2025-02-14");
        assert_eq!(first.status.as_deref(), Some("Yes"));
        let second = &table.records[1];
        assert_eq!(second.response_date, None);
        assert_eq!(second.response_date_raw, "not a date");
        assert_eq!(second.set_aside, None);
        assert_eq!(table.undated_count(), 1);
    }

    #[test]
    fn reports_every_missing_column() {
        let err = parse_csv("inline", "Notice ID,Title,NAICS\nx,y,z\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        match err {
            Error::MissingColumns { columns, .. } => assert_eq!(
                columns,
                [
                    "Current Response Date",
                    "Contract Opportunity Type",
                    "Active/Inactive",
                    "Set Aside"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_rows_load_with_missing_fields() {
        let text = format!("{HEADER}\nabc,Lab,VA,2025-03-01,Solicitation,Yes\n");
        let table = parse_csv("inline", &text).unwrap();
        assert_eq!(table.len(), 1);
        let rec = &table.records[0];
        assert_eq!(rec.status.as_deref(), Some("Yes"));
        assert_eq!(rec.naics, None);
        assert_eq!(rec.set_aside, None);
    }

    #[test]
    fn long_rows_are_a_load_error() {
        let text = format!("{HEADER}\na,b,c,2025-03-01,Solicitation,Yes,NAICS,SB,extra\n");
        let err = parse_csv("inline", &text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        match err {
            Error::RaggedRow { line, fields, expected, .. } => {
                assert_eq!((line, fields, expected), (2, 9, 8));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let src = Source::parse("/definitely/not/here.csv");
        let err = load(&src, TextEncoding::Latin1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }

    #[test]
    fn cache_loads_each_key_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut cache = DatasetCache::with_loader(move |src, _| {
            counter.set(counter.get() + 1);
            Ok(OpportunityTable::new(src.to_string(), Vec::new()))
        });
        let src = Source::parse("a.csv");
        let first = cache.get_or_load(&src, TextEncoding::Latin1).unwrap();
        let second = cache.get_or_load(&src, TextEncoding::Latin1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);

        // A different encoding is a different key.
        cache.get_or_load(&src, TextEncoding::Cp1252).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_does_not_remember_failures() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut cache = DatasetCache::with_loader(move |_, _| {
            counter.set(counter.get() + 1);
            Err(Error::Config("boom".into()))
        });
        let src = Source::parse("a.csv");
        assert!(cache.get_or_load(&src, TextEncoding::Latin1).is_err());
        assert!(cache.get_or_load(&src, TextEncoding::Latin1).is_err());
        assert_eq!(calls.get(), 2);
        assert!(cache.is_empty());
    }
}
