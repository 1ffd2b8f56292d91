use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

/// One CSV row per item, headed by the item's serde field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    rows.iter().try_for_each(|r| wtr.serialize(r))?;
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn write_html(path: &Path, page: &str) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, page)?;
    Ok(())
}

/// Markdown preview of the first `max_rows` rows of a view.
pub fn preview_table<T>(view_no: usize, title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("View {}: {}", view_no, title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_preview(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

fn render_preview<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryCapacityRow, MapMarker};

    fn rows() -> Vec<CountryCapacityRow> {
        vec![
            CountryCapacityRow { country: "Chile".into(), capacity: 2500.0 },
            CountryCapacityRow { country: "Colombia".into(), capacity: 1500.5 },
        ]
    }

    #[test]
    fn csv_keeps_unicode_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latam.csv");
        write_csv(&path, &rows()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("País,Capacidad Total (Nm³ H₂/y)"));
        assert_eq!(lines.next(), Some("Chile,2500.0"));
        assert_eq!(lines.next(), Some("Colombia,1500.5"));
    }

    #[test]
    fn map_csv_uses_spanish_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        let marker = MapMarker {
            country: "Peru".into(),
            latitude: -9.1899,
            longitude: -75.0152,
            total_capacity: 1000.0,
            radius: 0.01,
        };
        write_csv(&path, &[marker]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("País,Latitud,Longitud,Capacidad Total (Nm³ H₂/y),Radio")
        );
    }

    #[test]
    fn json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        write_json(&path, &rows()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[1]["País"], "Colombia");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn preview_truncates_rows() {
        let table = render_preview(&rows(), 1).unwrap();
        assert!(table.contains("Chile"));
        assert!(!table.contains("Colombia"));
        assert!(table.contains("2,500.00"));
        assert!(render_preview::<CountryCapacityRow>(&[], 5).is_none());
    }
}
