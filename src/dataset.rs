use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;

use crate::error::ExplorerError;
use crate::models::{parse_whole, Catalog, NameRecord, UnisexNameEntry, YearRange};

/// Locations of the four source tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub national_names: PathBuf,
    pub state_names: PathBuf,
    pub national_unisex: PathBuf,
    pub state_unisex: PathBuf,
}

/// Immutable in-memory copy of every table. Built once, then shared by
/// reference with the query functions.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    national_names: Vec<NameRecord>,
    state_names: Vec<NameRecord>,
    national_unisex: Vec<UnisexNameEntry>,
    state_unisex: Vec<UnisexNameEntry>,
}

impl Dataset {
    pub fn from_tables(
        national_names: Vec<NameRecord>,
        state_names: Vec<NameRecord>,
        national_unisex: Vec<UnisexNameEntry>,
        state_unisex: Vec<UnisexNameEntry>,
    ) -> Self {
        Self {
            national_names,
            state_names,
            national_unisex,
            state_unisex,
        }
    }

    pub fn load(paths: &DataPaths) -> Result<Self, ExplorerError> {
        let dataset = Self::from_tables(
            read_table(&paths.national_names)?,
            read_table(&paths.state_names)?,
            read_unisex_table(&paths.national_unisex)?,
            read_unisex_table(&paths.state_unisex)?,
        );

        log::info!(
            "loaded {} national rows, {} state rows, {} national unisex rows, {} state unisex rows",
            dataset.national_names.len(),
            dataset.state_names.len(),
            dataset.national_unisex.len(),
            dataset.state_unisex.len()
        );
        dataset.warn_on_future_years();

        Ok(dataset)
    }

    pub fn national_names(&self) -> &[NameRecord] {
        &self.national_names
    }

    pub fn state_names(&self) -> &[NameRecord] {
        &self.state_names
    }

    pub fn national_unisex(&self) -> &[UnisexNameEntry] {
        &self.national_unisex
    }

    pub fn state_unisex(&self) -> &[UnisexNameEntry] {
        &self.state_unisex
    }

    pub fn catalog(&self) -> Catalog {
        let state_year_span = self
            .state_names
            .iter()
            .map(|record| record.year)
            .fold(None, |span: Option<YearRange>, year| {
                Some(match span {
                    None => YearRange { start: year, end: year },
                    Some(span) => YearRange {
                        start: span.start.min(year),
                        end: span.end.max(year),
                    },
                })
            });

        let distinct_names: HashSet<&str> = self
            .state_names
            .iter()
            .chain(self.national_names.iter())
            .map(|record| record.name.as_str())
            .collect();

        Catalog {
            state_year_span,
            national_years: descending_years(self.national_names.iter().map(|r| r.year)),
            states: first_seen(self.state_names.iter().filter_map(|r| r.state.as_deref())),
            distinct_names: distinct_names.len(),
            unisex_years: descending_years(self.national_unisex.iter().map(|e| e.year)),
            unisex_states: first_seen(self.state_unisex.iter().filter_map(|e| e.state.as_deref())),
            national_rows: self.national_names.len(),
            state_rows: self.state_names.len(),
            national_unisex_rows: self.national_unisex.len(),
            state_unisex_rows: self.state_unisex.len(),
        }
    }

    fn warn_on_future_years(&self) {
        let current_year = Utc::now().year();
        let future = self
            .national_names
            .iter()
            .chain(self.state_names.iter())
            .filter(|record| record.year > current_year)
            .count();

        if future > 0 {
            log::warn!("{future} name rows are dated after {current_year}");
        }
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExplorerError> {
    let csv_error = |source| ExplorerError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let mut rows = Vec::new();

    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(csv_error)?);
    }

    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

// Header spellings per typed column, in priority order. Compared after
// lowercasing and dropping everything but letters and digits.
const RANK_HEADERS: &[&str] = &["rank"];
const NAME_HEADERS: &[&str] = &["name"];
const YEAR_HEADERS: &[&str] = &["year"];
const STATE_HEADERS: &[&str] = &["state"];
const MALE_HEADERS: &[&str] = &["malecount", "numberofmales", "males", "male", "m"];
const FEMALE_HEADERS: &[&str] = &["femalecount", "numberoffemales", "females", "female", "f"];
const RATIO_HEADERS: &[&str] = &["ratio", "unisexratio", "genderratio", "unisexscore", "score"];

/// Column positions of one unisex table, resolved from its header row.
#[derive(Debug)]
struct UnisexColumns {
    rank: Option<usize>,
    name: usize,
    year: usize,
    state: Option<usize>,
    male_count: Option<usize>,
    female_count: Option<usize>,
    ratio: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl UnisexColumns {
    /// Each typed field takes the first unclaimed header matching its list;
    /// every header left over is carried through as an extra column.
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let keys: Vec<String> = headers.iter().map(header_key).collect();
        let mut claimed = vec![false; keys.len()];

        let name = claim(&keys, &mut claimed, NAME_HEADERS).ok_or("missing Name column")?;
        let year = claim(&keys, &mut claimed, YEAR_HEADERS).ok_or("missing Year column")?;
        let rank = claim(&keys, &mut claimed, RANK_HEADERS);
        let state = claim(&keys, &mut claimed, STATE_HEADERS);
        let male_count = claim(&keys, &mut claimed, MALE_HEADERS);
        let female_count = claim(&keys, &mut claimed, FEMALE_HEADERS);
        let ratio = claim(&keys, &mut claimed, RATIO_HEADERS);

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !claimed[*index])
            .map(|(index, header)| (index, header.to_string()))
            .collect();

        Ok(Self {
            rank,
            name,
            year,
            state,
            male_count,
            female_count,
            ratio,
            extra,
        })
    }

    fn decode(&self, record: &csv::StringRecord) -> Result<UnisexNameEntry, String> {
        let field = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        let whole = |index: Option<usize>, column: &str, max: f64| {
            field(index)
                .map(|raw| parse_whole(raw, 0.0, max).ok_or_else(|| format!("invalid {column} {raw:?}")))
                .transpose()
        };

        let name = field(Some(self.name)).ok_or("missing name")?.to_string();
        let raw_year = field(Some(self.year)).unwrap_or_default();
        let year = parse_whole(raw_year, f64::from(i32::MIN), f64::from(i32::MAX))
            .ok_or_else(|| format!("invalid year {raw_year:?}"))? as i32;
        let ratio = field(self.ratio)
            .map(|raw| raw.parse::<f64>().map_err(|_| format!("invalid ratio {raw:?}")))
            .transpose()?;

        Ok(UnisexNameEntry {
            rank: whole(self.rank, "rank", f64::from(u32::MAX))?.map(|rank| rank as u32),
            name,
            year,
            state: field(self.state).map(str::to_string),
            male_count: whole(self.male_count, "male count", i64::MAX as f64)?.map(|c| c as u64),
            female_count: whole(self.female_count, "female count", i64::MAX as f64)?
                .map(|c| c as u64),
            ratio,
            extra: self
                .extra
                .iter()
                .map(|(index, header)| {
                    let value = record.get(*index).unwrap_or_default().trim().to_string();
                    (header.clone(), value)
                })
                .collect(),
        })
    }
}

fn claim(keys: &[String], claimed: &mut [bool], candidates: &[&str]) -> Option<usize> {
    let index = candidates
        .iter()
        .find_map(|candidate| (0..keys.len()).find(|&i| !claimed[i] && keys[i] == *candidate))?;
    claimed[index] = true;
    Some(index)
}

fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Unisex tables are decoded by header rather than through serde so that
/// columns with unexpected names are kept instead of dropped.
fn read_unisex_table(path: &Path) -> Result<Vec<UnisexNameEntry>, ExplorerError> {
    let csv_error = |source| ExplorerError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let decode_error = |row: u64, message: String| ExplorerError::Decode {
        path: path.to_path_buf(),
        row,
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = UnisexColumns::from_headers(&headers).map_err(|message| decode_error(1, message))?;

    if !columns.extra.is_empty() {
        let names: Vec<&str> = columns.extra.iter().map(|(_, header)| header.as_str()).collect();
        log::warn!(
            "{}: no typed field for columns {names:?}; keeping them as extra columns",
            path.display()
        );
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let row = record.position().map_or(index as u64 + 2, |position| position.line());
        rows.push(columns.decode(&record).map_err(|message| decode_error(row, message))?);
    }

    log::debug!("read {} unisex rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn descending_years(years: impl Iterator<Item = i32>) -> Vec<i32> {
    let unique: BTreeSet<i32> = years.collect();
    unique.into_iter().rev().collect()
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir) -> DataPaths {
        let paths = DataPaths {
            national_names: dir.path().join("NationalNames.csv"),
            state_names: dir.path().join("StateNames.csv"),
            national_unisex: dir.path().join("Top50_Unisex_National.csv"),
            state_unisex: dir.path().join("Top30_Unisex_State.csv"),
        };

        fs::write(
            &paths.national_names,
            "Id,Name,Year,Gender,Count\n1,Emma,2000,F,200\n2,Jacob,2000.0,M,150\n3,Emma,2001,F,130\n",
        )
        .unwrap();
        fs::write(
            &paths.state_names,
            "Id,Name,Year,Gender,State,Count\n1,Emma,2000,F,CA,120\n2,Emma,2001,F,CA,130\n3,Emma,2000,F,NY,80\n4,Jacob,2000,M,NY,150\n",
        )
        .unwrap();
        fs::write(
            &paths.national_unisex,
            "Rank,Name,Year,Male_Count,Female_Count,Ratio\n1,Riley,2000,500,480,0.96\n2,Jordan,2000,900,700,0.78\n",
        )
        .unwrap();
        fs::write(
            &paths.state_unisex,
            "Name,Year,State,Male_Count,Female_Count\nRiley,2000,CA,50,48\n",
        )
        .unwrap();

        paths
    }

    #[test]
    fn loads_all_four_tables() {
        let dir = TempDir::new().unwrap();
        let dataset = Dataset::load(&write_fixture(&dir)).unwrap();

        assert_eq!(dataset.national_names().len(), 3);
        assert_eq!(dataset.state_names().len(), 4);
        assert_eq!(dataset.national_unisex().len(), 2);
        assert_eq!(dataset.state_unisex().len(), 1);

        let jacob = &dataset.national_names()[1];
        assert_eq!(jacob.year, 2000);
        assert_eq!(jacob.gender, Gender::Male);
        assert_eq!(jacob.state, None);

        let riley = &dataset.national_unisex()[0];
        assert_eq!(riley.rank, Some(1));
        assert_eq!(riley.male_count, Some(500));
        assert_eq!(riley.female_count, Some(480));
        assert_eq!(dataset.state_unisex()[0].state.as_deref(), Some("CA"));
    }

    #[test]
    fn fractional_year_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(&paths.state_names, "Name,Year,Gender,State,Count\nEmma,2000.5,F,CA,1\n").unwrap();

        let err = Dataset::load(&paths).unwrap_err();
        assert!(matches!(err, ExplorerError::Csv { .. }));
        assert!(err.to_string().contains("StateNames.csv"));
    }

    #[test]
    fn missing_table_reports_path() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_fixture(&dir);
        paths.state_unisex = dir.path().join("missing.csv");

        let err = Dataset::load(&paths).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn unisex_columns_outside_known_headers_are_kept() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(
            &paths.national_unisex,
            "Name,Year,Male Count,Female Count,Unisex Score,Balance\nRiley,2000,500,480,0.96,even\n",
        )
        .unwrap();

        let dataset = Dataset::load(&paths).unwrap();
        let riley = &dataset.national_unisex()[0];
        assert_eq!(riley.male_count, Some(500));
        assert_eq!(riley.female_count, Some(480));
        assert_eq!(riley.ratio, Some(0.96));
        assert_eq!(riley.extra.get("Balance").map(String::as_str), Some("even"));
        assert_eq!(riley.extra.len(), 1);
    }

    #[test]
    fn overlapping_count_headers_keep_both_columns() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(
            &paths.national_unisex,
            "Name,Year,Male,Female,Male_Count,Female_Count\nRiley,2000,1,1,500,480\n",
        )
        .unwrap();

        let dataset = Dataset::load(&paths).unwrap();
        let riley = &dataset.national_unisex()[0];
        assert_eq!(riley.male_count, Some(500));
        assert_eq!(riley.female_count, Some(480));
        assert_eq!(riley.extra.get("Male").map(String::as_str), Some("1"));
        assert_eq!(riley.extra.get("Female").map(String::as_str), Some("1"));
    }

    #[test]
    fn unisex_float_exports_are_accepted() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(
            &paths.national_unisex,
            "Rank,Name,Year,Male_Count,Female_Count\n1.0,Riley,2000.0,500.0,480.0\n",
        )
        .unwrap();

        let riley = Dataset::load(&paths).unwrap().national_unisex()[0].clone();
        assert_eq!(riley.rank, Some(1));
        assert_eq!(riley.year, 2000);
        assert_eq!(riley.male_count, Some(500));
        assert_eq!(riley.female_count, Some(480));
        assert!(riley.extra.is_empty());
    }

    #[test]
    fn fractional_unisex_count_names_the_row() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(
            &paths.state_unisex,
            "Name,Year,State,Male_Count\nRiley,2000,CA,50\nJordan,2000,CA,12.5\n",
        )
        .unwrap();

        let err = Dataset::load(&paths).unwrap_err();
        assert!(matches!(err, ExplorerError::Decode { row: 3, .. }));
        assert!(err.to_string().contains("invalid male count"));
    }

    #[test]
    fn unisex_table_without_name_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixture(&dir);
        fs::write(&paths.national_unisex, "Year,Ratio\n2000,0.5\n").unwrap();

        let err = Dataset::load(&paths).unwrap_err();
        assert!(err.to_string().contains("missing Name column"));
    }

    #[test]
    fn catalog_lists_selector_values() {
        let dir = TempDir::new().unwrap();
        let catalog = Dataset::load(&write_fixture(&dir)).unwrap().catalog();

        assert_eq!(catalog.state_year_span, Some(YearRange { start: 2000, end: 2001 }));
        assert_eq!(catalog.national_years, vec![2001, 2000]);
        assert_eq!(catalog.states, vec!["CA".to_string(), "NY".to_string()]);
        assert_eq!(catalog.distinct_names, 2);
        assert_eq!(catalog.unisex_years, vec![2000]);
        assert_eq!(catalog.unisex_states, vec!["CA".to_string()]);
        assert_eq!(catalog.state_rows, 4);
    }

    #[test]
    fn empty_dataset_has_empty_catalog() {
        let catalog = Dataset::default().catalog();
        assert_eq!(catalog.state_year_span, None);
        assert!(catalog.national_years.is_empty());
        assert!(catalog.states.is_empty());
    }
}
