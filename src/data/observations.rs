//! CSV ingest and daily reindexing of the observation table.
//!
//! This module turns a possibly gappy `date,cases,deaths` CSV into a pair of
//! smoothed daily series aligned to one contiguous date index.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no scoring logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::data::smooth::{SMOOTHING_WINDOW, centered_moving_average};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Observed daily series over one contiguous date range, plus their smoothed
/// counterparts.
///
/// Loaded once per calibration run and treated as immutable afterwards; the
/// misfit evaluator and the trial driver receive it by reference.
///
/// Invariants:
/// - the index runs day-by-day from `start` to `end` with no gaps
/// - all four series have length `(end - start) + 1` day
/// - smoothed series are `None` wherever the centered window is incomplete
#[derive(Debug, Clone)]
pub struct Observations {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cases: Vec<f64>,
    pub deaths: Vec<f64>,
    pub smoothed_cases: Vec<Option<f64>>,
    pub smoothed_deaths: Vec<Option<f64>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl Observations {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Offset of `date` into the daily index, if it falls inside the range.
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }

    /// Index range (half-open) covering the intersection of the observation
    /// index with `[start, end]`. Empty when the windows do not overlap.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> std::ops::Range<usize> {
        let lo = start.max(self.start);
        let hi = end.min(self.end);
        if lo > hi {
            return 0..0;
        }
        let a = (lo - self.start).num_days() as usize;
        let b = (hi - self.start).num_days() as usize;
        a..(b + 1)
    }
}

/// Load the observation table and produce smoothed daily series.
///
/// Any date inside the `min..=max` range that is absent from the input gets
/// raw value 0 before smoothing. A duplicate date is a configuration error:
/// the daily index must be unique for the reindex to be well defined.
pub fn load_observations(path: &Path) -> Result<Observations, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open observation CSV '{}': {e}", path.display()),
        )
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for col in ["date", "cases", "deaths"] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{col}`")));
        }
    }

    let mut rows: Vec<(NaiveDate, f64, f64)> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(
            3,
            "No valid observation rows remain after validation.",
        ));
    }

    rows.sort_by_key(|(date, _, _)| *date);
    for pair in rows.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(AppError::new(
                2,
                format!("Duplicate date in observation table: {}", pair[0].0),
            ));
        }
    }

    let start = rows[0].0;
    let end = rows[rows.len() - 1].0;
    let n = (end - start).num_days() as usize + 1;

    // Reindex onto the contiguous daily range, zero-filling absent dates.
    let mut cases = vec![0.0; n];
    let mut deaths = vec![0.0; n];
    for (date, c, d) in &rows {
        let i = (*date - start).num_days() as usize;
        cases[i] = *c;
        deaths[i] = *d;
    }

    let smoothed_cases = centered_moving_average(&cases, SMOOTHING_WINDOW);
    let smoothed_deaths = centered_moving_average(&deaths, SMOOTHING_WINDOW);

    Ok(Observations {
        start,
        end,
        cases,
        deaths,
        smoothed_cases,
        smoothed_deaths,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM;
    // strip it or schema validation will report a missing `date` column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<(NaiveDate, f64, f64), String> {
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let cases = parse_count(get_required(record, header_map, "cases")?, "cases")?;
    let deaths = parse_count(get_required(record, header_map, "deaths")?, "deaths")?;
    Ok((date, cases, deaths))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates are the recommended format, but exports in the wild often use
    // day-first variants. Accept a small fixed set to keep parsing deterministic.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_count(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if !v.is_finite() || v < 0.0 {
        return Err(format!("Invalid `{name}` value '{s}' (must be >= 0)."));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("epi_calib_obs_{name}_{}.csv", std::process::id()));
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reindex_fills_gaps_with_zero() {
        let path = write_temp_csv(
            "gaps",
            "date,cases,deaths\n2020-03-01,3,0\n2020-03-04,7,1\n",
        );
        let obs = load_observations(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // 4 calendar days inclusive, gap days zero-filled.
        assert_eq!(obs.len(), 4);
        assert_eq!(obs.cases, vec![3.0, 0.0, 0.0, 7.0]);
        assert_eq!(obs.deaths, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(obs.smoothed_cases.len(), obs.len());
    }

    #[test]
    fn duplicate_date_is_a_config_error() {
        let path = write_temp_csv(
            "dup",
            "date,cases,deaths\n2020-03-01,3,0\n2020-03-01,4,0\n",
        );
        let err = load_observations(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let path = write_temp_csv(
            "badrow",
            "date,cases,deaths\n2020-03-01,3,0\nnot-a-date,1,0\n2020-03-02,4,0\n",
        );
        let obs = load_observations(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(obs.rows_read, 3);
        assert_eq!(obs.row_errors.len(), 1);
        assert_eq!(obs.row_errors[0].line, 3);
        assert_eq!(obs.len(), 2);
    }

    #[test]
    fn missing_column_is_a_config_error() {
        let path = write_temp_csv("nocol", "date,cases\n2020-03-01,3\n");
        let err = load_observations(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn window_clips_to_observation_range() {
        let path = write_temp_csv(
            "window",
            "date,cases,deaths\n2020-03-01,1,0\n2020-03-10,1,0\n",
        );
        let obs = load_observations(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let w = obs.window(
            NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 5).unwrap(),
        );
        assert_eq!(w, 0..5);

        let empty = obs.window(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
        );
        assert!(empty.is_empty());
    }
}
