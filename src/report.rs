use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::ExplorerError;
use crate::models::{
    Catalog, GenderFilter, RankingTable, StateTotal, TrendPoint, UnisexNameEntry, YearRange,
};
use crate::query::{TrendQuery, TOP_N};

pub const NO_DATA: &str = "No data available for selected filters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Csv,
}

pub fn render_trend(
    points: &[TrendPoint],
    query: &TrendQuery,
    format: OutputFormat,
) -> Result<String, ExplorerError> {
    match format {
        OutputFormat::Json => to_json(points),
        OutputFormat::Csv => to_csv(points),
        OutputFormat::Markdown => {
            let mut output = header("Name Popularity Over Time");
            let _ = writeln!(
                output,
                "Names: {} | Years: {} | State: {} | Gender: {}",
                query.names.join(", "),
                query.years,
                query.state,
                query.gender.label()
            );
            let _ = writeln!(output);

            if points.is_empty() {
                let _ = writeln!(output, "{NO_DATA}");
                return Ok(output);
            }

            let mut current: Option<&str> = None;
            for point in points {
                if current != Some(point.name.as_str()) {
                    current = Some(point.name.as_str());
                    let _ = writeln!(output, "## {}", point.name);
                    let _ = writeln!(output, "| Year | Count |");
                    let _ = writeln!(output, "|---|---|");
                }
                let _ = writeln!(output, "| {} | {} |", point.year, point.count);
            }
            Ok(output)
        }
    }
}

pub fn render_state_totals(
    totals: &[StateTotal],
    name: &str,
    years: YearRange,
    gender: GenderFilter,
    format: OutputFormat,
) -> Result<String, ExplorerError> {
    match format {
        OutputFormat::Json => to_json(totals),
        OutputFormat::Csv => to_csv(totals),
        OutputFormat::Markdown => {
            let mut output = header(&format!("Popularity of {name} Across States"));
            let _ = writeln!(output, "Years: {years} | Gender: {}", gender.label());
            let _ = writeln!(output);

            if totals.is_empty() {
                let _ = writeln!(output, "{NO_DATA}");
                return Ok(output);
            }

            let _ = writeln!(output, "| State | Count |");
            let _ = writeln!(output, "|---|---|");
            for total in totals {
                let _ = writeln!(output, "| {} | {} |", total.state, total.count);
            }
            Ok(output)
        }
    }
}

pub fn render_ranking(table: &RankingTable, format: OutputFormat) -> Result<String, ExplorerError> {
    match format {
        OutputFormat::Json => to_json(table),
        OutputFormat::Csv => to_csv(&table.rows),
        OutputFormat::Markdown => {
            let (title, caption) = match table.state.as_deref() {
                Some(state) => (
                    format!("Top {TOP_N} State Names"),
                    format!("Top {TOP_N} names for {state} in {}:", table.year),
                ),
                None => (
                    format!("Top {TOP_N} National Names"),
                    format!("Top {TOP_N} names for {}:", table.year),
                ),
            };

            let mut output = header(&title);
            let _ = writeln!(output, "{caption}");
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "| Rank | Male Name | Number of Males | Female Name | Number of Females |"
            );
            let _ = writeln!(output, "|---|---|---|---|---|");
            for row in &table.rows {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} |",
                    row.rank,
                    row.male_name.as_deref().unwrap_or(""),
                    cell(row.male_count),
                    row.female_name.as_deref().unwrap_or(""),
                    cell(row.female_count)
                );
            }
            Ok(output)
        }
    }
}

pub fn render_unisex(
    entries: &[&UnisexNameEntry],
    year: i32,
    state: Option<&str>,
    format: OutputFormat,
) -> Result<String, ExplorerError> {
    match format {
        OutputFormat::Json => to_json(entries),
        OutputFormat::Csv => unisex_csv(entries),
        OutputFormat::Markdown => {
            let extra = extra_columns(entries);
            let mut output = match state {
                Some(state) => header(&format!("Top Unisex Names in {state} for {year}")),
                None => header(&format!("Top Unisex Names for {year}")),
            };

            if entries.is_empty() {
                match state {
                    Some(state) => {
                        let _ = writeln!(output, "No data available for {state} in {year}");
                    }
                    None => {
                        let _ = writeln!(output, "{NO_DATA}");
                    }
                }
                return Ok(output);
            }

            let _ = write!(output, "| Rank | Name | Year | Males | Females | Ratio |");
            for column in &extra {
                let _ = write!(output, " {column} |");
            }
            let _ = writeln!(output);
            let _ = writeln!(output, "|---|---|---|---|---|---|{}", "---|".repeat(extra.len()));
            for (index, entry) in entries.iter().enumerate() {
                let ratio = entry.ratio.map(|r| format!("{r:.2}")).unwrap_or_default();
                let _ = write!(
                    output,
                    "| {} | {} | {} | {} | {} | {} |",
                    entry.rank.map_or(index + 1, |rank| rank as usize),
                    entry.name,
                    entry.year,
                    cell(entry.male_count),
                    cell(entry.female_count),
                    ratio
                );
                for column in &extra {
                    let value = entry.extra.get(*column).map(String::as_str).unwrap_or("");
                    let _ = write!(output, " {value} |");
                }
                let _ = writeln!(output);
            }
            Ok(output)
        }
    }
}

pub fn render_catalog(catalog: &Catalog, format: OutputFormat) -> Result<String, ExplorerError> {
    let span = catalog
        .state_year_span
        .map(|span| span.to_string())
        .unwrap_or_default();
    let lines = [
        ("state_years", span),
        ("national_years", join(&catalog.national_years)),
        ("states", catalog.states.join(" ")),
        ("distinct_names", catalog.distinct_names.to_string()),
        ("unisex_years", join(&catalog.unisex_years)),
        ("unisex_states", catalog.unisex_states.join(" ")),
        ("national_rows", catalog.national_rows.to_string()),
        ("state_rows", catalog.state_rows.to_string()),
        ("national_unisex_rows", catalog.national_unisex_rows.to_string()),
        ("state_unisex_rows", catalog.state_unisex_rows.to_string()),
    ];

    match format {
        OutputFormat::Json => to_json(catalog),
        OutputFormat::Csv => to_csv(lines.iter().map(|(key, value)| (*key, value.as_str()))),
        OutputFormat::Markdown => {
            let mut output = header("Dataset Catalog");
            for (key, value) in &lines {
                let _ = writeln!(output, "- {key}: {value}");
            }
            Ok(output)
        }
    }
}

/// Union of the extra column names across `entries`, sorted.
fn extra_columns<'a>(entries: &[&'a UnisexNameEntry]) -> Vec<&'a str> {
    let columns: BTreeSet<&str> = entries
        .iter()
        .copied()
        .flat_map(|entry| entry.extra.keys().map(String::as_str))
        .collect();
    columns.into_iter().collect()
}

/// The flattened `extra` map rules out `Writer::serialize`, so records are
/// written field by field.
fn unisex_csv(entries: &[&UnisexNameEntry]) -> Result<String, ExplorerError> {
    let extra = extra_columns(entries);
    let mut writer = csv::Writer::from_writer(Vec::new());

    if !entries.is_empty() {
        let mut header = vec!["rank", "name", "year", "state", "male_count", "female_count", "ratio"];
        header.extend(extra.iter().copied());
        writer.write_record(&header)?;
    }

    for entry in entries {
        let mut record = vec![
            entry.rank.map(|rank| rank.to_string()).unwrap_or_default(),
            entry.name.clone(),
            entry.year.to_string(),
            entry.state.clone().unwrap_or_default(),
            cell(entry.male_count),
            cell(entry.female_count),
            entry.ratio.map(|ratio| ratio.to_string()).unwrap_or_default(),
        ];
        record.extend(
            extra
                .iter()
                .map(|column| entry.extra.get(*column).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExplorerError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn header(title: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {title}");
    let _ = writeln!(output, "Generated {}", Utc::now().date_naive());
    let _ = writeln!(output);
    output
}

fn cell(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn join(years: &[i32]) -> String {
    years
        .iter()
        .map(|year| year.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ExplorerError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExplorerError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExplorerError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
