use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::export;
use crate::data::filter::{self, FacetOptions, FixedFilters, Selection};
use crate::data::loader::{DatasetCache, Source};
use crate::data::model::{Facet, Opportunity, OpportunityTable};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct DashboardState {
    pub config: DashboardConfig,

    /// Business rules derived from `config`.
    fixed: FixedFilters,

    /// Tables already loaded in this process.
    cache: DatasetCache,

    /// Current table (None until a source loads).
    pub table: Option<Arc<OpportunityTable>>,

    /// Date used as "today" by the recency rule.
    pub as_of: NaiveDate,

    /// Rows passing the fixed filters (cached until table or date changes).
    pub fixed_rows: Vec<usize>,

    /// Options offered by the multi-selects.
    pub options: FacetOptions,

    /// Current multi-select values.
    pub selection: Selection,

    /// Rows passing fixed filters and selection.
    pub visible_rows: Vec<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl DashboardState {
    pub fn new(config: DashboardConfig, as_of: NaiveDate) -> Self {
        Self::with_cache(config, as_of, DatasetCache::new())
    }

    pub fn with_cache(config: DashboardConfig, as_of: NaiveDate, cache: DatasetCache) -> Self {
        Self {
            fixed: config.fixed_filters(),
            config,
            cache,
            table: None,
            as_of,
            fixed_rows: Vec::new(),
            options: FacetOptions::default(),
            selection: Selection::default(),
            visible_rows: Vec::new(),
            status_message: None,
        }
    }

    /// Load (or reuse) a source and make it current.
    ///
    /// On failure the previous table stays current and the error is also
    /// recorded as the status message.
    pub fn open(&mut self, source: &Source) -> Result<()> {
        match self.cache.get_or_load(source, self.config.encoding) {
            Ok(table) => {
                self.set_table(table);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a table, recompute the fixed view and select every option.
    pub fn set_table(&mut self, table: Arc<OpportunityTable>) {
        self.table = Some(table);
        self.status_message = None;
        self.rebuild_fixed_view();
    }

    /// Change the recency date. Options change with it, so the selection is
    /// reset to everything.
    pub fn set_as_of(&mut self, date: NaiveDate) {
        if date != self.as_of {
            self.as_of = date;
            self.rebuild_fixed_view();
        }
    }

    fn rebuild_fixed_view(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.fixed_rows = filter::apply_fixed(table, self.as_of, &self.fixed);
        self.options =
            filter::derive_options(table, &self.fixed_rows, self.config.sort_naics_options);
        self.selection = Selection::all(&self.options);
        log::debug!(
            "{} of {} records pass the fixed filters as of {}",
            self.fixed_rows.len(),
            table.len(),
            self.as_of
        );
        self.refilter();
    }

    /// Recompute `visible_rows` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.visible_rows = filter::apply_selection(table, &self.fixed_rows, &self.selection);
        }
    }

    /// Toggle a single value in a facet's selection.
    pub fn toggle(&mut self, facet: Facet, value: &str) {
        self.selection.toggle(facet, value);
        self.refilter();
    }

    /// Select all options of a facet.
    pub fn select_all(&mut self, facet: Facet) {
        let all = self.options.get(facet).iter().cloned().collect();
        self.selection.set(facet, all);
        self.refilter();
    }

    /// Deselect all options of a facet.
    pub fn select_none(&mut self, facet: Facet) {
        self.selection.set(facet, Default::default());
        self.refilter();
    }

    /// Records currently shown, in source order.
    pub fn visible_records(&self) -> impl Iterator<Item = &Opportunity> + '_ {
        let records = self.table.as_deref().map(|t| t.records.as_slice()).unwrap_or(&[]);
        self.visible_rows.iter().map(move |&i| &records[i])
    }

    /// The first raw records of the table, before any filtering.
    pub fn preview_records(&self) -> &[Opportunity] {
        match self.table.as_deref() {
            Some(t) => &t.records[..t.len().min(self.config.preview_rows)],
            None => &[],
        }
    }

    /// The visible records as download-ready CSV.
    pub fn export_csv(&self) -> Result<String> {
        export::to_csv(self.visible_records())
    }

    /// Write the visible records to `path` as CSV.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let text = self.export_csv()?;
        std::fs::write(path, text).map_err(|err| Error::Io {
            location: path.display().to_string(),
            err,
        })?;
        log::info!("Wrote {} records to {}", self.visible_rows.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn rec(id: &str, day: u32, status: &str, naics: &str, set_aside: &str) -> Opportunity {
        Opportunity {
            notice_id: id.into(),
            title: format!("Title {id}"),
            response_date_raw: date(day).to_string(),
            response_date: Some(date(day)),
            opportunity_type: Some("Solicitation".into()),
            status: Some(status.into()),
            naics: Some(naics.into()),
            set_aside: Some(set_aside.into()),
        }
    }

    fn loaded_state() -> DashboardState {
        let cache = DatasetCache::with_loader(|src, _| {
            if src.to_string().contains("missing") {
                return Err(Error::Io {
                    location: src.to_string(),
                    err: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            }
            Ok(OpportunityTable::new(
                src.to_string(),
                vec![
                    rec("1", 2, "Active", "Testing Laboratories", "Small Business"),
                    rec("2", 10, "Active", "Testing Laboratories", "Small Business"),
                    rec("3", 12, "Inactive", "Medical Laboratories", "8(a)"),
                    rec("4", 20, "Active", "Medical Laboratories", "Small Business"),
                ],
            ))
        });
        let config = DashboardConfig {
            preview_rows: 2,
            ..DashboardConfig::default()
        };
        let mut state = DashboardState::with_cache(config, date(3), cache);
        state.open(&Source::parse("mem.csv")).unwrap();
        state
    }

    fn visible_ids(state: &DashboardState) -> Vec<String> {
        state.visible_records().map(|r| r.notice_id.clone()).collect()
    }

    #[test]
    fn open_selects_everything_after_fixed_filters() {
        let state = loaded_state();
        assert_eq!(visible_ids(&state), ["2", "3", "4"]);
        assert_eq!(state.options.status, ["Active", "Inactive"]);
        assert_eq!(state.selection.selected_count(Facet::Naics), 2);
    }

    #[test]
    fn toggling_and_bulk_selection_refilter() {
        let mut state = loaded_state();
        state.toggle(Facet::Status, "Inactive");
        assert_eq!(visible_ids(&state), ["2", "4"]);
        state.select_none(Facet::SetAside);
        assert!(visible_ids(&state).is_empty());
        state.select_all(Facet::SetAside);
        assert_eq!(visible_ids(&state), ["2", "4"]);
    }

    #[test]
    fn moving_as_of_date_rebuilds_options() {
        let mut state = loaded_state();
        state.toggle(Facet::Status, "Active");
        state.set_as_of(date(15));
        assert_eq!(state.options.status, ["Active"]);
        assert_eq!(visible_ids(&state), ["4"]);
    }

    #[test]
    fn preview_shows_raw_head() {
        let state = loaded_state();
        let ids: Vec<&str> = state
            .preview_records()
            .iter()
            .map(|r| r.notice_id.as_str())
            .collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn failed_open_keeps_previous_table() {
        let mut state = loaded_state();
        let err = state.open(&Source::parse("missing.csv")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
        assert_eq!(state.table.as_ref().map(|t| t.origin.as_str()), Some("mem.csv"));
        assert_eq!(visible_ids(&state), ["2", "3", "4"]);
        assert!(state.status_message.as_deref().unwrap_or("").starts_with("Error"));
    }

    #[test]
    fn export_contains_only_visible_rows() {
        let mut state = loaded_state();
        state.toggle(Facet::Naics, "Medical Laboratories");
        let csv = state.export_csv().unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("2,"));
    }
}
