use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExplorerError;

/// Sentinel used in place of a state code for national aggregates.
pub const ALL_STATES: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "Male", alias = "m")]
    Male,
    #[serde(rename = "F", alias = "Female", alias = "f")]
    Female,
}

/// One row of a name table. National rows carry no state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NameRecord {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Year", alias = "year", deserialize_with = "deserialize_year")]
    pub year: i32,
    #[serde(rename = "Gender", alias = "gender")]
    pub gender: Gender,
    #[serde(rename = "State", alias = "state", default)]
    pub state: Option<String>,
    #[serde(rename = "Count", alias = "count")]
    pub count: u64,
}

/// Precomputed unisex ranking row. File order is rank order.
///
/// Columns without a typed field are kept verbatim in `extra`, keyed by header.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnisexNameEntry {
    pub rank: Option<u32>,
    pub name: String,
    pub year: i32,
    pub state: Option<String>,
    pub male_count: Option<u64>,
    pub female_count: Option<u64>,
    pub ratio: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Gender selector: one gender, or both summed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderFilter {
    #[default]
    Both,
    Male,
    Female,
}

impl GenderFilter {
    pub fn gender(self) -> Option<Gender> {
        match self {
            GenderFilter::Both => None,
            GenderFilter::Male => Some(Gender::Male),
            GenderFilter::Female => Some(Gender::Female),
        }
    }

    pub fn matches(self, gender: Gender) -> bool {
        self.gender().map_or(true, |wanted| wanted == gender)
    }

    pub fn label(self) -> &'static str {
        match self {
            GenderFilter::Both => "Both",
            GenderFilter::Male => "Male",
            GenderFilter::Female => "Female",
        }
    }
}

/// State selector: a two-letter code, or every state summed together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Code(String),
}

impl StateFilter {
    pub fn matches(&self, state: Option<&str>) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Code(code) => state == Some(code.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StateFilter::All => ALL_STATES,
            StateFilter::Code(code) => code,
        }
    }
}

impl FromStr for StateFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("state must not be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case(ALL_STATES) {
            Ok(StateFilter::All)
        } else {
            Ok(StateFilter::Code(trimmed.to_ascii_uppercase()))
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive span of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, ExplorerError> {
        if start > end {
            return Err(ExplorerError::InvalidYearRange(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

impl FromStr for YearRange {
    type Err = ExplorerError;

    /// Accepts `2005`, `2000-2010` or `2000..2010`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ExplorerError::InvalidYearRange(value.to_string());
        let trimmed = value.trim();
        let (start, end) = match trimmed.split_once("..").or_else(|| trimmed.split_once('-')) {
            Some((start, end)) => (start, end),
            None => (trimmed, trimmed),
        };
        let start = start.trim().parse::<i32>().map_err(|_| invalid())?;
        let end = end.trim().parse::<i32>().map_err(|_| invalid())?;
        YearRange::new(start, end).map_err(|_| invalid())
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// One point of a name's popularity series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub name: String,
    pub gender: String,
    pub state: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTotal {
    pub state: String,
    pub count: u64,
}

/// A row of the top-N table. Male and female columns are ranked independently
/// and only share a row by position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub male_name: Option<String>,
    pub male_count: Option<u64>,
    pub female_name: Option<String>,
    pub female_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingTable {
    pub year: i32,
    pub state: Option<String>,
    pub rows: Vec<RankingRow>,
}

/// Value sets used to populate selectors and sanity-check a data directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub state_year_span: Option<YearRange>,
    pub national_years: Vec<i32>,
    pub states: Vec<String>,
    pub distinct_names: usize,
    pub unisex_years: Vec<i32>,
    pub unisex_states: Vec<String>,
    pub national_rows: usize,
    pub state_rows: usize,
    pub national_unisex_rows: usize,
    pub state_unisex_rows: usize,
}

/// Years are sometimes exported as floats (`2000.0`); integral values are accepted.
fn deserialize_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    whole_number(raw, f64::from(i32::MIN), f64::from(i32::MAX))
        .map(|value| value as i32)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid year {raw}")))
}

/// Parses `500` or `500.0` as a whole number within `[min, max]`.
pub fn parse_whole(raw: &str, min: f64, max: f64) -> Option<i64> {
    raw.trim().parse::<f64>().ok().and_then(|value| whole_number(value, min, max))
}

fn whole_number(value: f64, min: f64, max: f64) -> Option<i64> {
    if value.fract() != 0.0 || value < min || value > max {
        return None;
    }
    Some(value as i64)
}
