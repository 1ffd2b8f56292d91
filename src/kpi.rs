// Scalar indicators over the project table.
//
// Every function here is a plain fold over a slice, so an empty or fully
// filtered slice yields 0.0.
use crate::types::{CapacityFigure, CapacityUnit, HeadlineMetrics, ProjectRecord};

/// Countries that make up the LATAM region, matched exactly and case-sensitively.
pub const LATAM_COUNTRIES: [&str; 5] = ["Colombia", "Chile", "Argentina", "Peru", "Brazil"];

pub const COLOMBIA: &str = "Colombia";

/// Nm³ H₂/y to MW.
pub const MW_PER_NM3: f64 = 0.000277778;

pub fn world_total_capacity(data: &[ProjectRecord]) -> f64 {
    data.iter().map(|r| r.capacity).sum()
}

pub fn region_total_capacity(data: &[ProjectRecord], countries: &[&str]) -> f64 {
    data.iter()
        .filter(|r| in_region(r, countries))
        .map(|r| r.capacity)
        .sum()
}

pub fn country_total_capacity(data: &[ProjectRecord], country: &str) -> f64 {
    data.iter()
        .filter(|r| r.country.as_deref() == Some(country))
        .map(|r| r.capacity)
        .sum()
}

pub fn convert_to_megawatts(value: f64) -> f64 {
    value * MW_PER_NM3
}

pub fn region_co2_reduction(data: &[ProjectRecord], countries: &[&str]) -> f64 {
    data.iter()
        .filter(|r| in_region(r, countries))
        .map(|r| r.co2_reduction_tonnes)
        .sum()
}

pub fn in_region(record: &ProjectRecord, countries: &[&str]) -> bool {
    record.country.as_deref().is_some_and(|c| countries.contains(&c))
}

/// The four headline numbers. World and LATAM capacity are carried in both
/// units; the selected units only decide which one is shown first.
pub fn headline_metrics(
    data: &[ProjectRecord],
    world_unit: CapacityUnit,
    latam_unit: CapacityUnit,
) -> HeadlineMetrics {
    HeadlineMetrics {
        world_capacity: CapacityFigure::new(world_total_capacity(data)),
        world_unit,
        latam_capacity: CapacityFigure::new(region_total_capacity(data, &LATAM_COUNTRIES)),
        latam_unit,
        colombia_capacity_mw: convert_to_megawatts(country_total_capacity(data, COLOMBIA)),
        latam_co2_reduction_tonnes: region_co2_reduction(data, &LATAM_COUNTRIES),
    }
}
