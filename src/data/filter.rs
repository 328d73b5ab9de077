use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use super::model::{Facet, Opportunity, OpportunityTable};

// ---------------------------------------------------------------------------
// Fixed filters: business rules applied before any user selection
// ---------------------------------------------------------------------------

/// Criteria that do not depend on the user's selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFilters {
    /// Opportunity types that are kept.
    pub opportunity_types: BTreeSet<String>,
    /// When set, only these NAICS categories are kept.
    pub naics: Option<BTreeSet<String>>,
}

impl FixedFilters {
    pub fn new<I, S>(opportunity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixedFilters {
            opportunity_types: opportunity_types.into_iter().map(Into::into).collect(),
            naics: None,
        }
    }

    pub fn with_naics<I, S>(mut self, naics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.naics = Some(naics.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a record passes the type, recency and NAICS rules.
    pub fn admits(&self, record: &Opportunity, today: NaiveDate) -> bool {
        let type_ok = record
            .opportunity_type
            .as_ref()
            .is_some_and(|t| self.opportunity_types.contains(t));
        if !type_ok {
            return false;
        }
        // Missing dates never compare as current.
        if !record.response_date.is_some_and(|d| d >= today) {
            return false;
        }
        match &self.naics {
            Some(allowed) => record.naics.as_ref().is_some_and(|n| allowed.contains(n)),
            None => true,
        }
    }
}

/// Return indices of records passing the fixed filters, in table order.
pub fn apply_fixed(table: &OpportunityTable, today: NaiveDate, fixed: &FixedFilters) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| fixed.admits(rec, today))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Facet options: what the multi-selects offer
// ---------------------------------------------------------------------------

/// Distinct non-missing values per facet, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetOptions {
    pub status: Vec<String>,
    pub naics: Vec<String>,
    pub set_aside: Vec<String>,
}

impl FacetOptions {
    pub fn get(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Status => &self.status,
            Facet::Naics => &self.naics,
            Facet::SetAside => &self.set_aside,
        }
    }

    fn get_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Status => &mut self.status,
            Facet::Naics => &mut self.naics,
            Facet::SetAside => &mut self.set_aside,
        }
    }
}

/// Collect the facet options present in `rows`.
///
/// `sort_naics` orders the NAICS options lexicographically; the others keep
/// first-appearance order.
pub fn derive_options(table: &OpportunityTable, rows: &[usize], sort_naics: bool) -> FacetOptions {
    let mut options = FacetOptions::default();
    for facet in Facet::ALL {
        let mut seen: HashSet<&str> = HashSet::new();
        let values = options.get_mut(facet);
        for &i in rows {
            if let Some(v) = table.records[i].facet(facet) {
                if seen.insert(v) {
                    values.push(v.to_string());
                }
            }
        }
    }
    if sort_naics {
        options.naics.sort();
    }
    options
}

// ---------------------------------------------------------------------------
// Selection: which facet values the user keeps
// ---------------------------------------------------------------------------

/// Per-facet selection state: maps facet → set of selected values.
/// A facet absent from the map has nothing selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeMap<Facet, BTreeSet<String>>,
}

impl Selection {
    /// Every offered option selected (the default state of the controls).
    pub fn all(options: &FacetOptions) -> Self {
        let selected: BTreeMap<Facet, BTreeSet<String>> = Facet::ALL
            .iter()
            .map(|&f| (f, options.get(f).iter().cloned().collect()))
            .collect();
        Selection { selected }
    }

    /// Build from explicit value lists.
    pub fn from_values<S: Into<String>>(
        status: impl IntoIterator<Item = S>,
        naics: impl IntoIterator<Item = S>,
        set_aside: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut sel = Selection::default();
        sel.set(Facet::Status, status.into_iter().map(Into::into).collect());
        sel.set(Facet::Naics, naics.into_iter().map(Into::into).collect());
        sel.set(Facet::SetAside, set_aside.into_iter().map(Into::into).collect());
        sel
    }

    pub fn get(&self, facet: Facet) -> Option<&BTreeSet<String>> {
        self.selected.get(&facet)
    }

    pub fn set(&mut self, facet: Facet, values: BTreeSet<String>) {
        self.selected.insert(facet, values);
    }

    pub fn is_selected(&self, facet: Facet, value: &str) -> bool {
        self.selected.get(&facet).is_some_and(|s| s.contains(value))
    }

    /// Flip one value; returns whether it is now selected.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let set = self.selected.entry(facet).or_default();
        if set.remove(value) {
            false
        } else {
            set.insert(value.to_string());
            true
        }
    }

    pub fn selected_count(&self, facet: Facet) -> usize {
        self.selected.get(&facet).map_or(0, BTreeSet::len)
    }

    /// Whether a record's facet values are all selected.
    ///
    /// A missing value is never selectable, so such a record fails.
    pub fn admits(&self, record: &Opportunity) -> bool {
        Facet::ALL.iter().all(|&facet| match record.facet(facet) {
            Some(v) => self.is_selected(facet, v),
            None => false,
        })
    }
}

/// Narrow `rows` to those admitted by `selection`, keeping order.
pub fn apply_selection(table: &OpportunityTable, rows: &[usize], selection: &Selection) -> Vec<usize> {
    rows.iter()
        .copied()
        .filter(|&i| selection.admits(&table.records[i]))
        .collect()
}

// ---------------------------------------------------------------------------
// Whole pipeline
// ---------------------------------------------------------------------------

/// Result of one pass over a table: surviving rows plus the options that seed
/// the selection controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Rows passing the fixed filters.
    pub fixed_rows: Vec<usize>,
    /// Options derived from `fixed_rows`.
    pub options: FacetOptions,
    /// Rows passing both fixed filters and the selection.
    pub rows: Vec<usize>,
}

/// Run the fixed filters, derive options, then apply `selection`.
///
/// With `selection = None` every option is selected.
pub fn run(
    table: &OpportunityTable,
    today: NaiveDate,
    fixed: &FixedFilters,
    selection: Option<&Selection>,
    sort_naics: bool,
) -> FilterOutcome {
    let fixed_rows = apply_fixed(table, today, fixed);
    let options = derive_options(table, &fixed_rows, sort_naics);
    let rows = match selection {
        Some(sel) => apply_selection(table, &fixed_rows, sel),
        None => apply_selection(table, &fixed_rows, &Selection::all(&options)),
    };
    FilterOutcome {
        fixed_rows,
        options,
        rows,
    }
}

/// Filter `records` by the fixed rules and the selection, preserving order.
pub fn filter(
    records: &[Opportunity],
    today: NaiveDate,
    fixed: &FixedFilters,
    selection: &Selection,
) -> Vec<Opportunity> {
    records
        .iter()
        .filter(|rec| fixed.admits(rec, today) && selection.admits(rec))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
    }

    fn rec(
        id: &str,
        kind: &str,
        date: Option<NaiveDate>,
        status: &str,
        naics: &str,
        set_aside: &str,
    ) -> Opportunity {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Opportunity {
            notice_id: id.into(),
            title: format!("Title {id}"),
            response_date_raw: date.map(|d| d.to_string()).unwrap_or_default(),
            response_date: date,
            opportunity_type: opt(kind),
            status: opt(status),
            naics: opt(naics),
            set_aside: opt(set_aside),
        }
    }

    fn fixed() -> FixedFilters {
        FixedFilters::new(["Sources Sought", "Solicitation"])
            .with_naics(["Testing Laboratories", "Medical Laboratories"])
    }

    fn sample() -> OpportunityTable {
        let t = today();
        let tomorrow = t.succ_opt();
        let yesterday = t.pred_opt();
        OpportunityTable::new(
            "memory",
            vec![
                rec("A", "Sources Sought", tomorrow, "Active", "Testing Laboratories", "Small Business"),
                rec("B", "Award Notice", tomorrow, "Active", "Testing Laboratories", "Small Business"),
                rec("C", "Solicitation", yesterday, "Active", "Testing Laboratories", "Small Business"),
                rec("D", "Solicitation", None, "Active", "Testing Laboratories", "Small Business"),
                rec("E", "Solicitation", Some(t), "Inactive", "Medical Laboratories", "8(a) Set-Aside"),
                rec("F", "Solicitation", tomorrow, "Active", "Couriers and Express Delivery Services", "Small Business"),
                rec("G", "Sources Sought", tomorrow, "Active", "Medical Laboratories", ""),
                rec("H", "Solicitation", tomorrow, "Active", "Testing Laboratories", "8(a) Set-Aside"),
            ],
        )
    }

    fn ids(table: &OpportunityTable, rows: &[usize]) -> Vec<String> {
        rows.iter().map(|&i| table.records[i].notice_id.clone()).collect()
    }

    #[test]
    fn fixed_filters_apply_type_date_and_naics() {
        let table = sample();
        let rows = apply_fixed(&table, today(), &fixed());
        assert_eq!(ids(&table, &rows), ["A", "E", "G", "H"]);
    }

    #[test]
    fn without_naics_allow_list_other_categories_pass() {
        let table = sample();
        let rows = apply_fixed(&table, today(), &FixedFilters::new(["Solicitation"]));
        assert_eq!(ids(&table, &rows), ["E", "F", "H"]);
    }

    #[test]
    fn options_come_from_fixed_rows_in_first_seen_order() {
        let table = sample();
        let rows = apply_fixed(&table, today(), &fixed());
        let options = derive_options(&table, &rows, false);
        assert_eq!(options.status, ["Active", "Inactive"]);
        assert_eq!(options.naics, ["Testing Laboratories", "Medical Laboratories"]);
        // G has no set-aside; missing values are not options.
        assert_eq!(options.set_aside, ["Small Business", "8(a) Set-Aside"]);

        let sorted = derive_options(&table, &rows, true);
        assert_eq!(sorted.naics, ["Medical Laboratories", "Testing Laboratories"]);
    }

    #[test]
    fn default_selection_keeps_complete_records() {
        let table = sample();
        let outcome = run(&table, today(), &fixed(), None, false);
        assert_eq!(ids(&table, &outcome.fixed_rows), ["A", "E", "G", "H"]);
        // G is dropped only because its set-aside is missing.
        assert_eq!(ids(&table, &outcome.rows), ["A", "E", "H"]);
    }

    #[test]
    fn excluding_any_single_value_drops_the_record() {
        let table = sample();
        let all = Selection::from_values(
            ["Active"],
            ["Testing Laboratories"],
            ["Small Business"],
        );
        let kept = filter(&table.records, today(), &fixed(), &all);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].notice_id, "A");

        for facet in Facet::ALL {
            let mut sel = all.clone();
            sel.set(facet, BTreeSet::new());
            let kept = filter(&table.records, today(), &fixed(), &sel);
            assert!(kept.iter().all(|r| r.notice_id != "A"), "{facet:?}");
        }
    }

    #[test]
    fn past_and_undated_records_never_survive() {
        let table = sample();
        let everything = Selection::from_values(
            ["Active", "Inactive"],
            ["Testing Laboratories", "Medical Laboratories"],
            ["Small Business", "8(a) Set-Aside"],
        );
        let kept = filter(&table.records, today(), &fixed(), &everything);
        for r in &kept {
            assert!(r.response_date.is_some_and(|d| d >= today()));
            assert_ne!(r.notice_id, "C");
            assert_ne!(r.notice_id, "D");
        }
    }

    #[test]
    fn filtering_is_idempotent_and_stable() {
        let table = sample();
        let first = run(&table, today(), &fixed(), None, false);
        let second = run(&table, today(), &fixed(), None, false);
        assert_eq!(first, second);
        assert!(first.rows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn shrinking_a_selection_never_grows_the_result() {
        let table = sample();
        let outcome = run(&table, today(), &fixed(), None, false);
        let mut sel = Selection::all(&outcome.options);
        let mut previous = apply_selection(&table, &outcome.fixed_rows, &sel).len();
        for (facet, value) in [
            (Facet::SetAside, "8(a) Set-Aside"),
            (Facet::Status, "Inactive"),
            (Facet::Naics, "Testing Laboratories"),
        ] {
            assert!(!sel.toggle(facet, value));
            let now = apply_selection(&table, &outcome.fixed_rows, &sel).len();
            assert!(now <= previous);
            previous = now;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn toggle_round_trips_a_value() {
        let mut sel = Selection::default();
        assert!(sel.toggle(Facet::Status, "Active"));
        assert!(sel.is_selected(Facet::Status, "Active"));
        assert!(!sel.toggle(Facet::Status, "Active"));
        assert_eq!(sel.selected_count(Facet::Status), 0);
    }
}
