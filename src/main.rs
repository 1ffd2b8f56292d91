// Entry point and high-level CLI flow.
//
// - Option [1] loads the project spreadsheet through the dataset cache and
//   prints load diagnostics.
// - Option [2] asks for the two headline units, prints a preview of every
//   view and writes the HTML dashboard, summary.json and the view CSVs.
// - Option [3] discards the cached dataset and reads the file again.
// - After generating, the user can go back to the menu or exit.
mod charts;
mod config;
mod html;
mod kpi;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use config::{DashboardConfig, CONFIG_FILE};
use loader::{Dataset, DatasetCache, LoadReport};
use reports::Dashboard;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::CapacityUnit;

/// Everything one interactive run holds on to. The dataset is shared
/// read-only; reloading swaps the `Arc`.
struct Session {
    config: DashboardConfig,
    cache: DatasetCache,
    dataset: Option<Arc<Dataset>>,
}

impl Session {
    fn new(config: DashboardConfig) -> Self {
        let cache = DatasetCache::new(config.emission_factor);
        Self { config, cache, dataset: None }
    }
}

/// Print `prompt` and read one trimmed line. `None` means stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu after generating.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to Dashboard Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Ask for a headline unit; an empty answer keeps Nm³ H₂/y.
fn prompt_unit(metric: &str) -> CapacityUnit {
    loop {
        println!("Selecciona la unidad para {}:", metric);
        println!("[1] {}", CapacityUnit::Nm3PerYear.label());
        println!("[2] {}", CapacityUnit::Megawatts.label());
        match read_line("Enter choice: ").as_deref() {
            None | Some("") | Some("1") => return CapacityUnit::Nm3PerYear,
            Some("2") => return CapacityUnit::Megawatts,
            _ => println!("Invalid choice. Please enter 1 or 2."),
        }
    }
}

fn print_load_report(report: &LoadReport, from_cache: bool) {
    if from_cache {
        println!("Dataset unchanged since last load; using cached copy.");
    }
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_rows)
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to invalid capacity values.",
            util::format_int(report.parse_errors)
        );
    }
    if report.blank_capacity > 0 {
        println!(
            "Info: {} rows without capacity counted as 0.",
            util::format_int(report.blank_capacity)
        );
    }
    if report.missing_dates > 0 {
        println!(
            "Info: {} rows without a date online are left out of the yearly view.",
            util::format_int(report.missing_dates)
        );
    }
    println!();
}

/// Handle option [1]: load (or reuse) the dataset.
fn handle_load(session: &mut Session) {
    let path = session.config.input_path.clone();
    match session.cache.get_or_load(&path) {
        Ok(loaded) => {
            print_load_report(&loaded.report, loaded.from_cache);
            if loaded.dataset.is_empty() {
                warn!(path = %path.display(), "dataset has no rows; views will be empty");
            }
            session.dataset = Some(loaded.dataset);
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "load failed");
            eprintln!("Failed to load file: {}\n", e);
            session.dataset = None;
        }
    }
}

/// Handle option [3]: drop the cached copy and read the file again.
fn handle_reload(session: &mut Session) {
    if session.cache.invalidate(&session.config.input_path) {
        info!(path = %session.config.input_path.display(), "cache entry invalidated");
    }
    handle_load(session);
}

/// Re-check the source before generating so an edited file is picked up.
fn current_dataset(session: &mut Session) -> Option<Arc<Dataset>> {
    session.dataset.as_ref()?;
    let path = session.config.input_path.clone();
    match session.cache.get_or_load(&path) {
        Ok(loaded) => {
            if !loaded.from_cache {
                println!("Source file changed; dataset reloaded.");
                print_load_report(&loaded.report, false);
            }
            session.dataset = Some(Arc::clone(&loaded.dataset));
            Some(loaded.dataset)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "reload failed");
            eprintln!("Failed to load file: {}\n", e);
            session.dataset = None;
            None
        }
    }
}

fn export(label: &str, path: &Path, result: Result<(), Box<dyn std::error::Error>>) {
    match result {
        Ok(()) => info!(path = %path.display(), "{} written", label),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "{} not written", label);
            eprintln!("Write error: {}", e);
        }
    }
}

fn print_metrics(d: &Dashboard) {
    let m = &d.metrics;
    println!(
        "Producción Total Mundial: {} {}",
        util::format_number(m.world_unit.apply(m.world_capacity.nm3_per_year), 0),
        m.world_unit.label()
    );
    println!(
        "Producción Total en LATAM: {} {}",
        util::format_number(m.latam_unit.apply(m.latam_capacity.nm3_per_year), 0),
        m.latam_unit.label()
    );
    println!("Producción Total en Colombia (MW): {} MW", util::format_number(m.colombia_capacity_mw, 0));
    println!("Cantidad de CO2 Reducido en LATAM (toneladas): {}\n", util::format_number(m.latam_co2_reduction_tonnes, 0));
}

fn preview_views(d: &Dashboard, n: usize) {
    output::preview_table(1, "Tipos de Tecnologías Usadas", Some("Excluye detalle \"Unknown\""), &d.technology_details, n);
    output::preview_table(2, "Distribución por Tecnología", None, &d.technologies, n);
    output::preview_table(3, "Evolución por Año", Some("Capacidad total por año"), &d.capacity_by_year, n);
    output::preview_table(4, "Contribución de los Líderes", Some("Top 5 por capacidad"), &d.top_countries, n);
    output::preview_table(5, "Total Proyectos en LATAM", Some("Participación por número de proyectos"), &d.latam_projects, n);
    output::preview_table(6, "Total Producción en LATAM", None, &d.latam_capacity, n);
    output::preview_table(7, "Mapa LATAM", Some("Radio = capacidad × 0.00001"), &d.map_markers, n);
    output::preview_table(8, "Reducción CO2 America", None, &d.latam_co2, n);
    output::preview_table(9, "Proyectos de Colombia", None, &d.colombia_projects, n);
}

fn export_view_csvs(config: &DashboardConfig, dataset: &Dataset, d: &Dashboard) {
    let path = config.output_path("projects_with_derived_columns.csv");
    export("dataset CSV", &path, output::write_csv(&path, dataset.records()));
    let path = config.output_path("view1_technology_details.csv");
    export("view CSV", &path, output::write_csv(&path, &d.technology_details));
    let path = config.output_path("view2_technologies.csv");
    export("view CSV", &path, output::write_csv(&path, &d.technologies));
    let path = config.output_path("view3_capacity_by_year.csv");
    export("view CSV", &path, output::write_csv(&path, &d.capacity_by_year));
    let path = config.output_path("view4_top_countries.csv");
    export("view CSV", &path, output::write_csv(&path, &d.top_countries));
    let path = config.output_path("view5_latam_projects.csv");
    export("view CSV", &path, output::write_csv(&path, &d.latam_projects));
    let path = config.output_path("view6_latam_capacity.csv");
    export("view CSV", &path, output::write_csv(&path, &d.latam_capacity));
    let path = config.output_path("view7_latam_map.csv");
    export("view CSV", &path, output::write_csv(&path, &d.map_markers));
    let path = config.output_path("view8_latam_co2.csv");
    export("view CSV", &path, output::write_csv(&path, &d.latam_co2));
    let path = config.output_path("view9_colombia_projects.csv");
    export("view CSV", &path, output::write_csv(&path, &d.colombia_projects));
}

/// Handle option [2]: compute every view and write the outputs.
fn handle_generate(session: &mut Session) {
    let Some(dataset) = current_dataset(session) else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };

    let world_unit = prompt_unit("Producción Total Mundial");
    let latam_unit = prompt_unit("Producción Total en LATAM");
    println!();

    let dashboard = reports::build_dashboard(&dataset, world_unit, latam_unit);
    info!(rows = dashboard.total_rows, "dashboard computed");

    print_metrics(&dashboard);
    preview_views(&dashboard, session.config.preview_rows);

    let config = &session.config;
    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        eprintln!("Write error: {}", e);
    }
    if config.export_csv {
        export_view_csvs(config, &dataset, &dashboard);
    }
    let summary = config.output_path(&config.summary_file);
    export("summary", &summary, output::write_json(&summary, &dashboard.metrics));

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let page = html::render_dashboard(&dashboard, &generated_at);
    let html_path = config.output_path(&config.html_file);
    export("dashboard", &html_path, output::write_html(&html_path, &page));
    println!("Dashboard saved to {}\n", html_path.display());
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match DashboardConfig::load(Path::new(CONFIG_FILE)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(input = %config.input_path.display(), "configuration ready");
    let mut session = Session::new(config);

    loop {
        println!("Producción de Hidrógeno Verde");
        println!("[1] Load the file");
        println!("[2] Generate Dashboard");
        println!("[3] Reload the file\n");
        let Some(choice) = read_line("Enter choice: ") else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session),
            "3" => handle_reload(&mut session),
            "2" => {
                println!();
                handle_generate(&mut session);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
