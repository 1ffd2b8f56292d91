use crate::kpi::{headline_metrics, in_region, COLOMBIA, LATAM_COUNTRIES};
use crate::loader::Dataset;
use crate::types::{
    CapacityUnit, CategoryCountRow, CountryCapacityRow, CountryCo2Row, HeadlineMetrics,
    LatamProjectsRow, MapMarker, ProjectListingRow, ProjectRecord, YearCapacityRow, UNKNOWN,
};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

pub const TOP_COUNTRIES: usize = 5;
pub const PREVIEW_ROWS: usize = 5;

/// Marker radius per Nm³ H₂/y of country capacity.
pub const MAP_RADIUS_PER_NM3: f64 = 0.00001;
pub const MAP_CENTER: (f64, f64) = (-8.0, -55.0);
pub const MAP_ZOOM: u8 = 4;

/// Marker positions for the LATAM map. Countries not listed get no marker.
pub static COUNTRY_COORDINATES: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("Argentina", (-38.4161, -63.6167)),
        ("Brazil", (-14.2350, -51.9253)),
        ("Chile", (-35.6751, -71.5429)),
        ("Colombia", (4.5709, -74.2973)),
        ("Peru", (-9.1899, -75.0152)),
    ])
});

/// Numeric column summed by [`group_sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Capacity,
    Co2Reduction,
}

impl Measure {
    pub fn of(self, r: &ProjectRecord) -> f64 {
        match self {
            Measure::Capacity => r.capacity,
            Measure::Co2Reduction => r.co2_reduction_tonnes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal<K> {
    pub key: K,
    pub rows: usize,
    pub total: f64,
}

/// Filter, group and sum in one pass.
///
/// Rows rejected by `filter`, or for which `key` returns `None`, are left out.
/// Groups come back in order of first appearance; callers re-sort as the view
/// requires.
pub fn group_sum<K, F, G>(data: &[ProjectRecord], filter: F, key: G, measure: Measure) -> Vec<GroupTotal<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&ProjectRecord) -> bool,
    G: Fn(&ProjectRecord) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal<K>> = Vec::new();
    for r in data {
        if !filter(r) {
            continue;
        }
        let Some(k) = key(r) else { continue };
        let i = match index.get(&k) {
            Some(i) => *i,
            None => {
                groups.push(GroupTotal { key: k.clone(), rows: 0, total: 0.0 });
                index.insert(k, groups.len() - 1);
                groups.len() - 1
            }
        };
        let g = &mut groups[i];
        g.rows += 1;
        g.total += measure.of(r);
    }
    groups
}

fn by_key<K: Ord>(mut groups: Vec<GroupTotal<K>>) -> Vec<GroupTotal<K>> {
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
}

fn all(_: &ProjectRecord) -> bool {
    true
}

fn latam(r: &ProjectRecord) -> bool {
    in_region(r, &LATAM_COUNTRIES)
}

fn country(r: &ProjectRecord) -> Option<String> {
    r.country.clone()
}

/// Project counts per technology detail, leaving out "Unknown".
pub fn technology_detail_counts(data: &[ProjectRecord]) -> Vec<CategoryCountRow> {
    let groups = group_sum(
        data,
        |r| r.technology_detail != UNKNOWN,
        |r| Some(r.technology_detail.clone()),
        Measure::Capacity,
    );
    by_key(groups)
        .into_iter()
        .map(|g| CategoryCountRow { category: g.key, count: g.rows })
        .collect()
}

/// Project counts per technology, most frequent first.
pub fn technology_counts(data: &[ProjectRecord]) -> Vec<CategoryCountRow> {
    let mut groups = group_sum(data, all, |r| r.technology.clone(), Measure::Capacity);
    // Stable: equal counts keep first-appearance order.
    groups.sort_by(|a, b| b.rows.cmp(&a.rows));
    groups
        .into_iter()
        .map(|g| CategoryCountRow { category: g.key, count: g.rows })
        .collect()
}

/// Total capacity per year online, ascending. Rows without a year are left
/// out and years without rows are absent.
pub fn capacity_by_year(data: &[ProjectRecord]) -> Vec<YearCapacityRow> {
    by_key(group_sum(data, all, |r| r.date_online, Measure::Capacity))
        .into_iter()
        .map(|g| YearCapacityRow { year: g.key, capacity: g.total })
        .collect()
}

/// The `n` countries with the highest total capacity. Equal totals are
/// taken in country-name order, including at the cut-off.
pub fn top_countries(data: &[ProjectRecord], n: usize) -> Vec<CountryCapacityRow> {
    let mut groups = by_key(group_sum(data, all, country, Measure::Capacity));
    groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    groups
        .into_iter()
        .take(n)
        .map(|g| CountryCapacityRow { country: g.key, capacity: g.total })
        .collect()
}

fn latam_groups(data: &[ProjectRecord]) -> Vec<GroupTotal<String>> {
    by_key(group_sum(data, latam, country, Measure::Capacity))
}

/// Project count and capacity per LATAM country. `share_pct` is the
/// country's share of LATAM projects by count.
pub fn latam_projects(data: &[ProjectRecord]) -> Vec<LatamProjectsRow> {
    let groups = latam_groups(data);
    let total_projects: usize = groups.iter().map(|g| g.rows).sum();
    groups
        .into_iter()
        .map(|g| LatamProjectsRow {
            share_pct: if total_projects == 0 {
                0.0
            } else {
                g.rows as f64 / total_projects as f64 * 100.0
            },
            country: g.key,
            projects: g.rows,
            total_capacity: g.total,
        })
        .collect()
}

pub fn latam_capacity(data: &[ProjectRecord]) -> Vec<CountryCapacityRow> {
    latam_groups(data)
        .into_iter()
        .map(|g| CountryCapacityRow { country: g.key, capacity: g.total })
        .collect()
}

/// One marker per country with known coordinates.
pub fn latam_map_markers(data: &[ProjectRecord]) -> Vec<MapMarker> {
    let groups = by_key(group_sum(
        data,
        |r| r.country.as_deref().is_some_and(|c| COUNTRY_COORDINATES.contains_key(c)),
        country,
        Measure::Capacity,
    ));
    groups
        .into_iter()
        .filter_map(|g| {
            let (latitude, longitude) = *COUNTRY_COORDINATES.get(g.key.as_str())?;
            Some(MapMarker {
                latitude,
                longitude,
                radius: g.total * MAP_RADIUS_PER_NM3,
                total_capacity: g.total,
                country: g.key,
            })
        })
        .collect()
}

pub fn latam_co2_reduction(data: &[ProjectRecord]) -> Vec<CountryCo2Row> {
    by_key(group_sum(data, latam, country, Measure::Co2Reduction))
        .into_iter()
        .map(|g| CountryCo2Row { country: g.key, co2_reduction_tonnes: g.total })
        .collect()
}

/// Colombian projects in source order.
pub fn colombia_projects(data: &[ProjectRecord]) -> Vec<ProjectListingRow> {
    data.iter()
        .filter(|r| r.country.as_deref() == Some(COLOMBIA))
        .map(|r| ProjectListingRow {
            project_name: r.project_name.clone(),
            technology: r.technology.clone(),
            date_online: r.date_online,
            capacity: r.capacity,
        })
        .collect()
}

/// First `n` rows followed by the last `n` rows. Short tables show
/// overlapping rows twice.
pub fn data_preview(data: &[ProjectRecord], n: usize) -> Vec<ProjectRecord> {
    let head = data.iter().take(n);
    let tail = data.iter().skip(data.len().saturating_sub(n));
    head.chain(tail).cloned().collect()
}

/// Everything the page shows, computed from one dataset.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub source: String,
    pub total_rows: usize,
    pub emission_factor: f64,
    pub metrics: HeadlineMetrics,
    pub preview: Vec<ProjectRecord>,
    pub technology_details: Vec<CategoryCountRow>,
    pub technologies: Vec<CategoryCountRow>,
    pub capacity_by_year: Vec<YearCapacityRow>,
    pub top_countries: Vec<CountryCapacityRow>,
    pub latam_projects: Vec<LatamProjectsRow>,
    pub latam_capacity: Vec<CountryCapacityRow>,
    pub map_markers: Vec<MapMarker>,
    pub latam_co2: Vec<CountryCo2Row>,
    pub colombia_projects: Vec<ProjectListingRow>,
}

pub fn build_dashboard(dataset: &Dataset, world_unit: CapacityUnit, latam_unit: CapacityUnit) -> Dashboard {
    let data = dataset.records();
    Dashboard {
        source: dataset.source().display().to_string(),
        total_rows: dataset.len(),
        emission_factor: dataset.emission_factor(),
        metrics: headline_metrics(data, world_unit, latam_unit),
        preview: data_preview(data, PREVIEW_ROWS),
        technology_details: technology_detail_counts(data),
        technologies: technology_counts(data),
        capacity_by_year: capacity_by_year(data),
        top_countries: top_countries(data, TOP_COUNTRIES),
        latam_projects: latam_projects(data),
        latam_capacity: latam_capacity(data),
        map_markers: latam_map_markers(data),
        latam_co2: latam_co2_reduction(data),
        colombia_projects: colombia_projects(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{derive_record, NATURAL_GAS_EMISSION_FACTOR};

    fn rec(name: &str, country: &str, tech: &str, detail: &str, year: Option<i32>, cap: f64) -> ProjectRecord {
        derive_record(
            name.into(),
            Some(country.into()),
            Some(tech.into()),
            detail.into(),
            year,
            cap,
            NATURAL_GAS_EMISSION_FACTOR,
        )
    }

    fn sample() -> Vec<ProjectRecord> {
        vec![
            rec("Puerto Bahía", "Colombia", "Power to H2", "Grid", Some(2023), 100.0),
            rec("Haru Oni", "Chile", "Power to H2", "Wind", Some(2022), 200.0),
            rec("Cartagena", "Colombia", "ALK", "Unknown", Some(2023), 300.0),
            rec("Hamburg", "Germany", "PEM", "Solar", Some(2020), 900.0),
            rec("Lleida", "Spain", "PEM", "Unknown", None, 50.0),
            rec("Neuquén", "Argentina", "PEM", "Wind", Some(2020), 400.0),
            rec("Texas", "United States", "ALK", "Grid", Some(2021), 700.0),
            rec("Osaka", "Japan", "SOEC", "Grid", Some(2021), 700.0),
        ]
    }

    #[test]
    fn group_sum_filters_and_sums() {
        let data = sample();
        let groups = group_sum(&data, latam, country, Measure::Capacity);
        assert_eq!(
            groups,
            vec![
                GroupTotal { key: "Colombia".to_string(), rows: 2, total: 400.0 },
                GroupTotal { key: "Chile".to_string(), rows: 1, total: 200.0 },
                GroupTotal { key: "Argentina".to_string(), rows: 1, total: 400.0 },
            ]
        );
        let co2 = group_sum(&data, |r| r.country.as_deref() == Some("Chile"), country, Measure::Co2Reduction);
        assert_eq!(co2.len(), 1);
        assert_eq!(co2[0].total, 0.2 * 10.5);
    }

    #[test]
    fn technology_detail_partitions_unknown() {
        let data = sample();
        let rows = technology_detail_counts(&data);
        assert!(rows.iter().all(|r| r.category != "Unknown"));
        let shown: usize = rows.iter().map(|r| r.count).sum();
        let unknown = data.iter().filter(|r| r.technology_detail == "Unknown").count();
        assert_eq!(shown + unknown, data.len());
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, ["Grid", "Solar", "Wind"]);
    }

    #[test]
    fn technology_counts_most_frequent_first() {
        let rows = technology_counts(&sample());
        assert_eq!(rows[0], CategoryCountRow { category: "PEM".into(), count: 3 });
        // Two each for Power to H2 and ALK; Power to H2 appears first.
        assert_eq!(rows[1].category, "Power to H2");
        assert_eq!(rows[2].category, "ALK");
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 8);
    }

    #[test]
    fn capacity_by_year_is_ascending_and_sparse() {
        let rows = capacity_by_year(&sample());
        assert_eq!(
            rows,
            vec![
                YearCapacityRow { year: 2020, capacity: 1300.0 },
                YearCapacityRow { year: 2021, capacity: 1400.0 },
                YearCapacityRow { year: 2022, capacity: 200.0 },
                YearCapacityRow { year: 2023, capacity: 400.0 },
            ]
        );
    }

    #[test]
    fn top_countries_bounded_and_descending() {
        let data = sample();
        let rows = top_countries(&data, TOP_COUNTRIES);
        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].capacity >= w[1].capacity));
        assert!(rows
            .iter()
            .all(|r| data.iter().any(|d| d.country.as_deref() == Some(r.country.as_str()))));
        assert_eq!(rows[0].country, "Germany");
        // United States and Japan tie at 700.
        assert_eq!(rows[1].country, "Japan");
        assert_eq!(rows[2].country, "United States");
        // Colombia and Argentina tie at 400 for the last places.
        assert_eq!(rows[3].country, "Argentina");
        assert_eq!(rows[4].country, "Colombia");

        assert_eq!(top_countries(&data[..2], TOP_COUNTRIES).len(), 2);
    }

    #[test]
    fn top_countries_cutoff_tie_goes_to_first_name() {
        let data: Vec<ProjectRecord> = [
            ("Zambia", 100.0),
            ("Germany", 500.0),
            ("France", 400.0),
            ("Spain", 300.0),
            ("Italy", 200.0),
            ("Austria", 100.0),
        ]
        .into_iter()
        .map(|(c, cap)| rec(c, c, "PEM", "Grid", Some(2024), cap))
        .collect();
        let names: Vec<String> = top_countries(&data, TOP_COUNTRIES).into_iter().map(|r| r.country).collect();
        assert_eq!(names, ["Germany", "France", "Spain", "Italy", "Austria"]);
    }

    #[test]
    fn blank_keys_are_left_out_of_views() {
        let mut data = sample();
        let mut blank = rec("Sin país", "Chile", "PEM", "Grid", Some(2021), 5_000.0);
        blank.country = None;
        blank.technology = None;
        data.push(blank);
        let top = top_countries(&data, TOP_COUNTRIES);
        assert_eq!(top[0].country, "Germany");
        assert_eq!(top[0].capacity, 900.0);
        let techs = technology_counts(&data);
        assert_eq!(techs.iter().map(|r| r.count).sum::<usize>(), 8);
        assert_eq!(latam_projects(&data).iter().map(|r| r.projects).sum::<usize>(), 4);
        // Still counted by year.
        let y2021 = capacity_by_year(&data).into_iter().find(|r| r.year == 2021).unwrap();
        assert_eq!(y2021.capacity, 6_400.0);
    }

    #[test]
    fn latam_shares_come_from_counts() {
        let rows = latam_projects(&sample());
        let names: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, ["Argentina", "Chile", "Colombia"]);
        assert_eq!(rows[2].projects, 2);
        assert_eq!(rows[2].total_capacity, 400.0);
        assert_eq!(rows[2].share_pct, 50.0);
        assert_eq!(rows[0].share_pct, 25.0);
        let total: f64 = rows.iter().map(|r| r.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);

        let cap = latam_capacity(&sample());
        assert_eq!(cap.len(), 3);
        assert_eq!(cap[2], CountryCapacityRow { country: "Colombia".into(), capacity: 400.0 });
    }

    #[test]
    fn map_skips_countries_without_coordinates() {
        let mut data = sample();
        data.push(rec("Lima", "Peru", "PEM", "Solar", Some(2025), 1_000_000.0));
        data.push(rec("Quito", "Ecuador", "PEM", "Solar", Some(2025), 5.0));
        let markers = latam_map_markers(&data);
        let names: Vec<&str> = markers.iter().map(|m| m.country.as_str()).collect();
        assert_eq!(names, ["Argentina", "Chile", "Colombia", "Peru"]);
        let peru = &markers[3];
        assert_eq!((peru.latitude, peru.longitude), (-9.1899, -75.0152));
        assert_eq!(peru.radius, 1_000_000.0 * 0.00001);
    }

    #[test]
    fn co2_per_latam_country() {
        let rows = latam_co2_reduction(&sample());
        let colombia = rows.iter().find(|r| r.country == "Colombia").unwrap();
        assert!((colombia.co2_reduction_tonnes - 4.2).abs() < 1e-12);
        assert!(rows.iter().all(|r| r.country != "Germany"));
    }

    #[test]
    fn colombia_listing_keeps_source_order() {
        let rows = colombia_projects(&sample());
        let names: Vec<&str> = rows.iter().map(|r| r.project_name.as_str()).collect();
        assert_eq!(names, ["Puerto Bahía", "Cartagena"]);
        assert_eq!(rows[1].date_online, Some(2023));
    }

    #[test]
    fn preview_is_head_then_tail() {
        let data = sample();
        let p = data_preview(&data, 2);
        let names: Vec<&str> = p.iter().map(|r| r.project_name.as_str()).collect();
        assert_eq!(names, ["Puerto Bahía", "Haru Oni", "Texas", "Osaka"]);
        assert_eq!(data_preview(&data[..1], 5).len(), 2);
    }

    #[test]
    fn empty_dataset_gives_empty_views() {
        let ds = Dataset::new("empty.csv", NATURAL_GAS_EMISSION_FACTOR, Vec::new());
        let d = build_dashboard(&ds, CapacityUnit::Nm3PerYear, CapacityUnit::Megawatts);
        assert_eq!(d.total_rows, 0);
        assert_eq!(d.metrics.world_capacity.nm3_per_year, 0.0);
        assert!(d.preview.is_empty());
        assert!(d.technology_details.is_empty());
        assert!(d.technologies.is_empty());
        assert!(d.capacity_by_year.is_empty());
        assert!(d.top_countries.is_empty());
        assert!(d.latam_projects.is_empty());
        assert!(d.latam_capacity.is_empty());
        assert!(d.map_markers.is_empty());
        assert!(d.latam_co2.is_empty());
        assert!(d.colombia_projects.is_empty());
    }
}
