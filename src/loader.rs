use crate::types::{ProjectRecord, RawRow, REQUIRED_COLUMNS, UNKNOWN};
use crate::util::{non_empty, parse_f64_safe, parse_year_safe};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

/// kg CO₂ avoided per kg H₂, taken from natural-gas based production and
/// applied to every technology alike.
pub const NATURAL_GAS_EMISSION_FACTOR: f64 = 10.5;

/// Nm³ H₂/y per tonne of H₂ used for the production column.
pub const NM3_PER_TONNE: f64 = 1000.0;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported input format {0:?} (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)")]
    UnsupportedFormat(String),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("missing required column \"{0}\"")]
    MissingColumn(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub blank_capacity: usize,
    pub missing_dates: usize,
}

/// The project table. Built once per load; the records are only handed out
/// by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: PathBuf,
    emission_factor: f64,
    records: Vec<ProjectRecord>,
}

impl Dataset {
    pub fn new(source: impl Into<PathBuf>, emission_factor: f64, records: Vec<ProjectRecord>) -> Self {
        Self { source: source.into(), emission_factor, records }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn emission_factor(&self) -> f64 {
        self.emission_factor
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build a record and its derived columns from one capacity value.
pub fn derive_record(
    project_name: String,
    country: Option<String>,
    technology: Option<String>,
    technology_detail: String,
    date_online: Option<i32>,
    capacity: f64,
    emission_factor: f64,
) -> ProjectRecord {
    let production_tonnes = capacity / NM3_PER_TONNE;
    ProjectRecord {
        project_name,
        country,
        technology,
        technology_detail,
        date_online,
        capacity,
        production_tonnes,
        co2_reduction_tonnes: production_tonnes * emission_factor,
    }
}

/// Read the source file, validate its columns and derive the extra columns.
pub fn load_and_derive(path: &Path, emission_factor: f64) -> Result<(Dataset, LoadReport), LoadError> {
    let (headers, rows) = read_table(path)?;
    check_columns(&headers)?;

    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        report.total_rows += 1;
        // Header is line 1.
        let line = idx + 2;
        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                debug!(line, error = %e, "row does not match the header");
                report.parse_errors += 1;
                continue;
            }
        };

        let capacity = match raw.capacity.as_deref().map(str::trim) {
            None | Some("") => {
                report.blank_capacity += 1;
                0.0
            }
            Some(text) => match parse_f64_safe(Some(text)) {
                Some(v) if v >= 0.0 => v,
                _ => {
                    warn!(line, value = text, "skipping row with invalid capacity");
                    report.parse_errors += 1;
                    continue;
                }
            },
        };

        let date_online = parse_year_safe(raw.date_online.as_deref());
        if date_online.is_none() {
            report.missing_dates += 1;
        }

        records.push(derive_record(
            raw.project_name.unwrap_or_default(),
            non_empty(raw.country),
            non_empty(raw.technology),
            non_empty(raw.technology_detail).unwrap_or_else(|| UNKNOWN.to_string()),
            date_online,
            capacity,
            emission_factor,
        ));
    }
    report.loaded_rows = records.len();
    info!(
        path = %path.display(),
        rows = report.loaded_rows,
        skipped = report.parse_errors,
        "dataset loaded"
    );
    Ok((Dataset::new(path, emission_factor, records), report))
}

fn check_columns(headers: &StringRecord) -> Result<(), LoadError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

fn read_table(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), LoadError> {
    // Surface a missing file as an I/O error naming the path.
    std::fs::metadata(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        _ => Err(LoadError::UnsupportedFormat(ext)),
    }
}

fn read_csv(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(Trim::Headers).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result?);
    }
    Ok((headers, rows))
}

fn read_workbook(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoWorksheet)??;
    let mut rows = range.rows();
    let headers: StringRecord = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => StringRecord::new(),
    };
    let rows = rows
        .map(|cells| cells.iter().map(cell_text).collect::<StringRecord>())
        .collect();
    Ok((headers, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// Lookup result from [`DatasetCache::get_or_load`].
#[derive(Debug, Clone)]
pub struct CachedLoad {
    pub dataset: Arc<Dataset>,
    pub report: LoadReport,
    pub from_cache: bool,
}

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
    report: LoadReport,
}

/// Loaded datasets keyed by canonical path. An entry is reused only while the
/// file's modification time is unchanged.
#[derive(Debug)]
pub struct DatasetCache {
    emission_factor: f64,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl DatasetCache {
    pub fn new(emission_factor: f64) -> Self {
        Self { emission_factor, entries: HashMap::new() }
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<CachedLoad, LoadError> {
        let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };
        let key = path.canonicalize().map_err(io_err)?;
        let modified = std::fs::metadata(&key).and_then(|m| m.modified()).map_err(io_err)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                debug!(path = %key.display(), "dataset cache hit");
                return Ok(CachedLoad {
                    dataset: Arc::clone(&entry.dataset),
                    report: entry.report.clone(),
                    from_cache: true,
                });
            }
            info!(path = %key.display(), "source changed on disk, reloading");
        }

        let (dataset, report) = load_and_derive(&key, self.emission_factor)?;
        let dataset = Arc::new(dataset);
        self.entries.insert(
            key,
            CacheEntry { modified, dataset: Arc::clone(&dataset), report: report.clone() },
        );
        Ok(CachedLoad { dataset, report, from_cache: false })
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key).is_some()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
