use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::models::{
    Gender, GenderFilter, NameRecord, RankingRow, RankingTable, StateFilter, StateTotal,
    TrendPoint, UnisexNameEntry, YearRange,
};

/// Names per trend chart. Enforced by the caller, not by [`name_trend`].
pub const MAX_TREND_NAMES: usize = 3;
pub const TOP_N: usize = 50;
pub const NATIONAL_UNISEX_LIMIT: usize = 50;
pub const STATE_UNISEX_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendQuery {
    pub names: Vec<String>,
    pub years: YearRange,
    pub state: StateFilter,
    pub gender: GenderFilter,
}

/// Yearly counts per selected name from the state table.
///
/// Rows are summed over genders when `gender` is `Both` and over states when
/// `state` is `All`; the result is ordered by name, then year.
pub fn name_trend(dataset: &Dataset, query: &TrendQuery) -> Vec<TrendPoint> {
    let mut totals: BTreeMap<(&str, i32), u64> = BTreeMap::new();

    for record in dataset.state_names().iter().filter(|record| {
        query.years.contains(record.year)
            && query.names.iter().any(|name| *name == record.name)
            && query.gender.matches(record.gender)
            && query.state.matches(record.state.as_deref())
    }) {
        *totals.entry((record.name.as_str(), record.year)).or_insert(0) += record.count;
    }

    let gender = match query.gender.gender() {
        None => GenderFilter::Both.label().to_string(),
        Some(gender) => gender_code(gender).to_string(),
    };

    let points: Vec<TrendPoint> = totals
        .into_iter()
        .map(|((name, year), count)| TrendPoint {
            year,
            name: name.to_string(),
            gender: gender.clone(),
            state: query.state.label().to_string(),
            count,
        })
        .collect();

    log::debug!(
        "trend {:?} {} state={} gender={}: {} points",
        query.names,
        query.years,
        query.state,
        query.gender.label(),
        points.len()
    );
    points
}

/// Total count of one name per state, for the choropleth.
pub fn state_totals(
    dataset: &Dataset,
    name: &str,
    years: YearRange,
    gender: GenderFilter,
) -> Vec<StateTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();

    for record in dataset.state_names() {
        if record.name != name || !years.contains(record.year) || !gender.matches(record.gender) {
            continue;
        }
        // Only `count` is aggregated; year and other numeric columns are not summed.
        if let Some(state) = record.state.as_deref() {
            *totals.entry(state).or_insert(0) += record.count;
        }
    }

    log::debug!(
        "state totals {name} {years} gender={}: {} states",
        gender.label(),
        totals.len()
    );

    totals
        .into_iter()
        .map(|(state, count)| StateTotal {
            state: state.to_string(),
            count,
        })
        .collect()
}

/// Top 50 male and female names nationally for `year`.
pub fn top_names_national(dataset: &Dataset, year: i32) -> RankingTable {
    let rows = rank_by_gender(dataset.national_names().iter().filter(|r| r.year == year));
    log::debug!("national ranking {year}");
    RankingTable {
        year,
        state: None,
        rows,
    }
}

/// Top 50 male and female names in `state` for `year`.
pub fn top_names_in_state(dataset: &Dataset, year: i32, state: &str) -> RankingTable {
    let rows = rank_by_gender(
        dataset
            .state_names()
            .iter()
            .filter(|r| r.year == year && r.state.as_deref() == Some(state)),
    );
    log::debug!("state ranking {state} {year}");
    RankingTable {
        year,
        state: Some(state.to_string()),
        rows,
    }
}

/// Always returns exactly [`TOP_N`] rows; missing entries stay empty.
fn rank_by_gender<'a>(records: impl Iterator<Item = &'a NameRecord>) -> Vec<RankingRow> {
    let (male, female): (Vec<&NameRecord>, Vec<&NameRecord>) =
        records.partition(|record| record.gender == Gender::Male);
    let male = largest(male);
    let female = largest(female);

    (0..TOP_N)
        .map(|index| {
            let male = male.get(index);
            let female = female.get(index);
            RankingRow {
                rank: index + 1,
                male_name: male.map(|r| r.name.clone()),
                male_count: male.map(|r| r.count),
                female_name: female.map(|r| r.name.clone()),
                female_count: female.map(|r| r.count),
            }
        })
        .collect()
}

/// Stable sort, so equal counts keep their input order.
fn largest(mut records: Vec<&NameRecord>) -> Vec<&NameRecord> {
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records.truncate(TOP_N);
    records
}

pub fn unisex_national(dataset: &Dataset, year: i32) -> Vec<&UnisexNameEntry> {
    dataset
        .national_unisex()
        .iter()
        .filter(|entry| entry.year == year)
        .take(NATIONAL_UNISEX_LIMIT)
        .collect()
}

pub fn unisex_in_state<'a>(dataset: &'a Dataset, year: i32, state: &str) -> Vec<&'a UnisexNameEntry> {
    dataset
        .state_unisex()
        .iter()
        .filter(|entry| entry.year == year && entry.state.as_deref() == Some(state))
        .take(STATE_UNISEX_LIMIT)
        .collect()
}

pub fn gender_code(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "M",
        Gender::Female => "F",
    }
}
