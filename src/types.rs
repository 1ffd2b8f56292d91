use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

pub const COL_PROJECT_NAME: &str = "Project name";
pub const COL_COUNTRY: &str = "Country";
pub const COL_TECHNOLOGY: &str = "Technology";
pub const COL_TECHNOLOGY_DETAIL: &str = "Technology_electricity_details";
pub const COL_DATE_ONLINE: &str = "Date online";
pub const COL_CAPACITY: &str = "Capacity_Nm³ H₂/y";
pub const COL_PRODUCTION_TONNES: &str = "Producción H₂ (toneladas)";
pub const COL_CO2_REDUCTION: &str = "Reducción CO₂ (toneladas)";

/// Columns a source file must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_PROJECT_NAME,
    COL_COUNTRY,
    COL_TECHNOLOGY,
    COL_TECHNOLOGY_DETAIL,
    COL_DATE_ONLINE,
    COL_CAPACITY,
];

/// Placeholder used by the source data, and for a blank technology detail.
pub const UNKNOWN: &str = "Unknown";

/// One source row as text, before validation. Extra columns are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Project name", default)]
    pub project_name: Option<String>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(rename = "Technology", default)]
    pub technology: Option<String>,
    #[serde(rename = "Technology_electricity_details", default)]
    pub technology_detail: Option<String>,
    #[serde(rename = "Date online", default)]
    pub date_online: Option<String>,
    #[serde(rename = "Capacity_Nm³ H₂/y", default)]
    pub capacity: Option<String>,
}

/// A validated project with its derived columns. Once a [`Dataset`] is built
/// the records are never mutated.
///
/// A blank country or technology stays `None`; such rows count towards the
/// totals but are left out of every view grouped by that column.
///
/// [`Dataset`]: crate::loader::Dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    #[serde(rename = "Project name")]
    pub project_name: String,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Technology")]
    pub technology: Option<String>,
    #[serde(rename = "Technology_electricity_details")]
    pub technology_detail: String,
    #[serde(rename = "Date online")]
    pub date_online: Option<i32>,
    #[serde(rename = "Capacity_Nm³ H₂/y")]
    pub capacity: f64,
    #[serde(rename = "Producción H₂ (toneladas)")]
    pub production_tonnes: f64,
    #[serde(rename = "Reducción CO₂ (toneladas)")]
    pub co2_reduction_tonnes: f64,
}

/// Unit the capacity headline metrics are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CapacityUnit {
    #[default]
    #[serde(rename = "Nm³ H₂/y")]
    Nm3PerYear,
    #[serde(rename = "MW")]
    Megawatts,
}

impl CapacityUnit {
    pub fn label(self) -> &'static str {
        match self {
            CapacityUnit::Nm3PerYear => "Nm³ H₂/y",
            CapacityUnit::Megawatts => "MW",
        }
    }

    /// Express a capacity given in Nm³ H₂/y in this unit.
    pub fn apply(self, capacity: f64) -> f64 {
        match self {
            CapacityUnit::Nm3PerYear => capacity,
            CapacityUnit::Megawatts => crate::kpi::convert_to_megawatts(capacity),
        }
    }
}

/// A capacity figure in both units, so the page can switch between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityFigure {
    pub nm3_per_year: f64,
    pub megawatts: f64,
}

impl CapacityFigure {
    pub fn new(nm3_per_year: f64) -> Self {
        Self { nm3_per_year, megawatts: crate::kpi::convert_to_megawatts(nm3_per_year) }
    }

    pub fn in_unit(&self, unit: CapacityUnit) -> f64 {
        match unit {
            CapacityUnit::Nm3PerYear => self.nm3_per_year,
            CapacityUnit::Megawatts => self.megawatts,
        }
    }
}

/// The four headline indicators shown above the views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub world_capacity: CapacityFigure,
    pub world_unit: CapacityUnit,
    pub latam_capacity: CapacityFigure,
    pub latam_unit: CapacityUnit,
    pub colombia_capacity_mw: f64,
    pub latam_co2_reduction_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategoryCountRow {
    #[serde(rename = "Tecnología")]
    #[tabled(rename = "Tecnología")]
    pub category: String,
    #[serde(rename = "Conteo")]
    #[tabled(rename = "Conteo")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearCapacityRow {
    #[serde(rename = "Año")]
    #[tabled(rename = "Año")]
    pub year: i32,
    #[serde(rename = "Capacidad Total (Nm³ H₂/y)")]
    #[tabled(rename = "Capacidad Total (Nm³ H₂/y)", display_with = "display_amount")]
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CountryCapacityRow {
    #[serde(rename = "País")]
    #[tabled(rename = "País")]
    pub country: String,
    #[serde(rename = "Capacidad Total (Nm³ H₂/y)")]
    #[tabled(rename = "Capacidad Total (Nm³ H₂/y)", display_with = "display_amount")]
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct LatamProjectsRow {
    #[serde(rename = "País")]
    #[tabled(rename = "País")]
    pub country: String,
    #[serde(rename = "Proyectos")]
    #[tabled(rename = "Proyectos")]
    pub projects: usize,
    #[serde(rename = "Capacidad Total (Nm³ H₂/y)")]
    #[tabled(rename = "Capacidad Total (Nm³ H₂/y)", display_with = "display_amount")]
    pub total_capacity: f64,
    /// Share of the LATAM project count, in percent.
    #[serde(rename = "Participación (%)")]
    #[tabled(rename = "Participación (%)", display_with = "display_pct")]
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MapMarker {
    #[serde(rename = "País")]
    #[tabled(rename = "País")]
    pub country: String,
    #[serde(rename = "Latitud")]
    #[tabled(rename = "Latitud")]
    pub latitude: f64,
    #[serde(rename = "Longitud")]
    #[tabled(rename = "Longitud")]
    pub longitude: f64,
    #[serde(rename = "Capacidad Total (Nm³ H₂/y)")]
    #[tabled(rename = "Capacidad Total (Nm³ H₂/y)", display_with = "display_amount")]
    pub total_capacity: f64,
    #[serde(rename = "Radio")]
    #[tabled(rename = "Radio")]
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CountryCo2Row {
    #[serde(rename = "País")]
    #[tabled(rename = "País")]
    pub country: String,
    #[serde(rename = "CO₂ Reducido (toneladas)")]
    #[tabled(rename = "CO₂ Reducido (toneladas)", display_with = "display_amount")]
    pub co2_reduction_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ProjectListingRow {
    #[serde(rename = "Project name")]
    #[tabled(rename = "Project name")]
    pub project_name: String,
    #[serde(rename = "Technology")]
    #[tabled(rename = "Technology", display_with = "display_text")]
    pub technology: Option<String>,
    #[serde(rename = "Date online")]
    #[tabled(rename = "Date online", display_with = "display_year")]
    pub date_online: Option<i32>,
    #[serde(rename = "Capacity_Nm³ H₂/y")]
    #[tabled(rename = "Capacity_Nm³ H₂/y", display_with = "display_amount")]
    pub capacity: f64,
}

pub(crate) fn display_text(text: &Option<String>) -> String {
    text.clone().unwrap_or_default()
}

pub(crate) fn display_year(year: &Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

pub(crate) fn display_amount(value: &f64) -> String {
    format_number(*value, 2)
}

fn display_pct(value: &f64) -> String {
    format!("{:.1}%", value)
}
