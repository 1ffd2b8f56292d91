// Self-contained HTML dashboard.
//
// Charts are inline SVG from `charts`; the LATAM map is drawn by Leaflet
// from a CDN. A short inline script handles the tabs and the two unit
// selectors, so the page works from a plain file.

use crate::charts::{bar_chart, line_chart, pie_chart, ChartSpec, CORAL, GREEN, ORANGE, PURPLE, SKY_BLUE};
use crate::reports::{Dashboard, MAP_CENTER, MAP_ZOOM};
use crate::types::{
    display_amount, display_text, display_year, CapacityFigure, CapacityUnit, ProjectListingRow, ProjectRecord,
    COL_CAPACITY, COL_CO2_REDUCTION, COL_COUNTRY, COL_DATE_ONLINE, COL_PRODUCTION_TONNES,
    COL_PROJECT_NAME, COL_TECHNOLOGY, COL_TECHNOLOGY_DETAIL,
};
use crate::util::{escape_html, format_int, format_number};
use std::fmt::Write;

struct Section {
    id: &'static str,
    tab: &'static str,
    lead: &'static str,
    body: String,
    caption: &'static str,
}

/// Render the full page. `generated_at` is shown in the footer.
pub fn render_dashboard(d: &Dashboard, generated_at: &str) -> String {
    let sections = sections(d);
    let mut tabs = String::new();
    let mut panels = String::new();
    for (i, s) in sections.iter().enumerate() {
        let active = if i == 0 { " active" } else { "" };
        let _ = write!(
            tabs,
            r#"<button class="tab{active}" data-tab="{id}">{label}</button>"#,
            id = s.id,
            label = escape_html(s.tab)
        );
        let _ = write!(
            panels,
            r#"<section id="{id}" class="panel{active}"><p class="lead"><strong>{lead}</strong></p>{body}<p class="caption">{caption}</p></section>"#,
            id = s.id,
            lead = escape_html(s.lead),
            body = s.body,
            caption = escape_html(s.caption)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Producción de Hidrógeno Verde</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous" referrerpolicy="no-referrer" />
    <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous" referrerpolicy="no-referrer"></script>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <header>
            <h1>Producción de Hidrógeno Verde</h1>
            <p class="meta">Fuente: {source} · {rows} proyectos</p>
        </header>
        {preview}
        {metrics}
        <h2>Análisis de la base de datos</h2>
        <nav class="tabs">{tabs}</nav>
        {panels}
        <footer>Generado {generated_at}</footer>
    </div>
    <script>const MAP_MARKERS = {markers};</script>
    <script>{js}</script>
</body>
</html>"#,
        css = inline_css(),
        source = escape_html(&d.source),
        rows = format_int(d.total_rows),
        preview = render_preview(&d.preview),
        metrics = render_metrics(d),
        generated_at = escape_html(generated_at),
        markers = markers_json(d),
        js = inline_javascript(),
    )
}

fn sections(d: &Dashboard) -> Vec<Section> {
    let details: Vec<(String, f64)> =
        d.technology_details.iter().map(|r| (r.category.clone(), r.count as f64)).collect();
    let technologies: Vec<(String, f64)> =
        d.technologies.iter().map(|r| (r.category.clone(), r.count as f64)).collect();
    let years: Vec<(i32, f64)> = d.capacity_by_year.iter().map(|r| (r.year, r.capacity)).collect();
    let leaders: Vec<(String, f64)> =
        d.top_countries.iter().map(|r| (r.country.clone(), r.capacity)).collect();
    let project_counts: Vec<(String, f64)> =
        d.latam_projects.iter().map(|r| (r.country.clone(), r.projects as f64)).collect();
    let latam_capacity: Vec<(String, f64)> =
        d.latam_capacity.iter().map(|r| (r.country.clone(), r.capacity)).collect();
    let co2: Vec<(String, f64)> =
        d.latam_co2.iter().map(|r| (r.country.clone(), r.co2_reduction_tonnes)).collect();

    vec![
        Section {
            id: "tech-details",
            tab: "Tipos de Tecnologías Usadas",
            lead: "Esta gráfica muestra los tipos de tecnologías usadas para la producción de hidrógeno a nivel mundial, excluyendo los datos desconocidos.",
            body: bar_chart(
                &ChartSpec {
                    title: "Tipos de Tecnologías Usadas a Nivel Mundial",
                    x_label: "Tecnología",
                    y_label: "Conteo",
                    color: SKY_BLUE,
                },
                &details,
            ),
            caption: "Cantidad de proyectos de hidrógeno verde a nivel mundial clasificados por tipo de tecnología. Excluye los proyectos con tecnologías desconocidas y permite observar las tecnologías dominantes en el sector.",
        },
        Section {
            id: "technologies",
            tab: "Distribución por Tecnología",
            lead: "La siguiente gráfica presenta la cantidad de proyectos según la tecnología aplicada en cada uno.",
            body: bar_chart(
                &ChartSpec {
                    title: "Distribución de Proyectos por Tecnología",
                    x_label: "Tecnología",
                    y_label: "Conteo de Proyectos",
                    color: ORANGE,
                },
                &technologies,
            ),
            caption: "Cantidad de proyectos por cada tipo de tecnología utilizada. Permite identificar la tecnología más utilizada a nivel global y comparar su popularidad.",
        },
        Section {
            id: "by-year",
            tab: "Evolución por Año",
            lead: "A continuación, se observa la evolución anual en la capacidad de producción de hidrógeno, lo que permite ver el crecimiento de la industria.",
            body: line_chart(
                &ChartSpec {
                    title: "Evolución de la Capacidad de Producción de Hidrógeno por Año",
                    x_label: "Año",
                    y_label: "Capacidad Total (Nm³ H₂/y)",
                    color: GREEN,
                },
                &years,
            ),
            caption: "Evolución de la capacidad total de producción de hidrógeno verde a lo largo de los años. Útil para identificar tendencias de crecimiento en la producción.",
        },
        Section {
            id: "leaders",
            tab: "Contribución de los Líderes",
            lead: "Esta gráfica destaca los países con mayores aportes en la producción de hidrógeno, representando sus capacidades de producción.",
            body: bar_chart(
                &ChartSpec {
                    title: "Contribución de los Principales Países en la Producción de Hidrógeno",
                    x_label: "País",
                    y_label: "Capacidad Total (Nm³ H₂/y)",
                    color: CORAL,
                },
                &leaders,
            ),
            caption: "Países líderes en producción de hidrógeno verde y su capacidad total, con su participación relativa.",
        },
        Section {
            id: "latam-projects",
            tab: "Total Proyectos en LATAM",
            lead: "Visualización del total de proyectos de producción de hidrógeno en los principales países de LATAM.",
            body: pie_chart("Total de Proyectos por País", &project_counts),
            caption: "Desglose de la cantidad total de proyectos de hidrógeno en América Latina por país, con la distribución de proyectos en la región.",
        },
        Section {
            id: "latam-capacity",
            tab: "Total Producción en LATAM",
            lead: "Capacidad de producción total en LATAM agrupada por país, mostrando el potencial de cada uno.",
            body: bar_chart(
                &ChartSpec {
                    title: "Capacidad Total por País (Nm³ H₂/y)",
                    x_label: "País",
                    y_label: "Capacidad Total (Nm³ H₂/y)",
                    color: SKY_BLUE,
                },
                &latam_capacity,
            ),
            caption: "Capacidad de producción de hidrógeno por país en América Latina, para comparar la capacidad entre países de la región.",
        },
        Section {
            id: "latam-map",
            tab: "Mapa LATAM",
            lead: "Mapa de proyectos de producción de hidrógeno en LATAM. Cada círculo representa un país y su tamaño corresponde a la capacidad de producción.",
            body: format!(
                r#"<div id="map" data-lat="{lat}" data-lon="{lon}" data-zoom="{zoom}"></div>"#,
                lat = MAP_CENTER.0,
                lon = MAP_CENTER.1,
                zoom = MAP_ZOOM
            ),
            caption: "Ubicación y capacidad de producción de hidrógeno en países de América Latina. Los círculos indican la producción por país.",
        },
        Section {
            id: "latam-co2",
            tab: "Reducción CO2 America",
            lead: "Este gráfico presenta la reducción total de CO₂ en cada país de LATAM debido a la producción de hidrógeno verde.",
            body: bar_chart(
                &ChartSpec {
                    title: "Reducción de CO₂ por País en LATAM",
                    x_label: "País",
                    y_label: "CO₂ Reducido (toneladas)",
                    color: PURPLE,
                },
                &co2,
            ),
            caption: "Cantidad de CO₂ reducido en cada país de América Latina a través de la producción de hidrógeno verde, el impacto en reducción de emisiones de la región.",
        },
        Section {
            id: "colombia",
            tab: "Proyectos de Colombia",
            lead: "Detalle de proyectos específicos en Colombia.",
            body: render_listing(&d.colombia_projects),
            caption: "Proyectos de hidrógeno en Colombia con su capacidad de producción y el año en que iniciaron operaciones.",
        },
    ]
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut out = String::from("<div class=\"table-wrap\"><table><thead><tr>");
    for h in headers {
        let _ = write!(out, "<th>{}</th>", escape_html(h));
    }
    out.push_str("</tr></thead><tbody>");
    if rows.is_empty() {
        let _ = write!(out, r#"<tr><td colspan="{}" class="empty">Sin registros</td></tr>"#, headers.len());
    }
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(&cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
    out
}

fn render_preview(rows: &[ProjectRecord]) -> String {
    let body = rows
        .iter()
        .map(|r| {
            vec![
                r.project_name.clone(),
                display_text(&r.country),
                display_text(&r.technology),
                r.technology_detail.clone(),
                display_year(&r.date_online),
                display_amount(&r.capacity),
                display_amount(&r.production_tonnes),
                display_amount(&r.co2_reduction_tonnes),
            ]
        })
        .collect();
    format!(
        r#"<section class="preview"><p><strong>Resumen de los datos principales</strong>:</p><p>Base de datos resultante luego del proceso de extracción y limpieza</p>{}</section>"#,
        table(
            &[
                COL_PROJECT_NAME,
                COL_COUNTRY,
                COL_TECHNOLOGY,
                COL_TECHNOLOGY_DETAIL,
                COL_DATE_ONLINE,
                COL_CAPACITY,
                COL_PRODUCTION_TONNES,
                COL_CO2_REDUCTION,
            ],
            body,
        )
    )
}

fn render_listing(rows: &[ProjectListingRow]) -> String {
    let body = rows
        .iter()
        .map(|r| {
            vec![
                r.project_name.clone(),
                display_text(&r.technology),
                display_year(&r.date_online),
                display_amount(&r.capacity),
            ]
        })
        .collect();
    table(&[COL_PROJECT_NAME, COL_TECHNOLOGY, COL_DATE_ONLINE, COL_CAPACITY], body)
}

fn unit_option(unit: CapacityUnit, selected: CapacityUnit) -> String {
    format!(
        r#"<option value="{v}"{sel}>{v}</option>"#,
        v = unit.label(),
        sel = if unit == selected { " selected" } else { "" }
    )
}

/// A metric card whose value follows a unit selector.
fn switchable_metric(id: &str, title: &str, prompt: &str, figure: &CapacityFigure, unit: CapacityUnit) -> String {
    let nm3 = format!("{} {}", format_number(figure.nm3_per_year, 0), CapacityUnit::Nm3PerYear.label());
    let mw = format!("{} {}", format_number(figure.megawatts, 0), CapacityUnit::Megawatts.label());
    let shown = format!("{} {}", format_number(figure.in_unit(unit), 0), unit.label());
    format!(
        r#"<div class="metric"><label for="{id}-unit">{prompt}</label><select id="{id}-unit" class="unit-select" data-target="{id}">{o1}{o2}</select><div class="metric-title">{title}</div><div class="metric-value" id="{id}" data-nm3="{nm3}" data-mw="{mw}">{shown}</div></div>"#,
        prompt = escape_html(prompt),
        o1 = unit_option(CapacityUnit::Nm3PerYear, unit),
        o2 = unit_option(CapacityUnit::Megawatts, unit),
        title = escape_html(title),
        nm3 = escape_html(&nm3),
        mw = escape_html(&mw),
        shown = escape_html(&shown)
    )
}

fn render_metrics(d: &Dashboard) -> String {
    let m = &d.metrics;
    format!(
        r#"<section class="metrics">{world}{latam}<div class="metric"><div class="metric-title">Producción Total en Colombia (MW)</div><div class="metric-value">{colombia} MW</div></div><div class="metric"><div class="metric-title">Cantidad de CO2 Reducido en LATAM (toneladas)</div><div class="metric-value">{co2}</div><div class="metric-note">Factor de emisión: {factor} kg CO₂/kg H₂</div></div></section>"#,
        world = switchable_metric(
            "world-capacity",
            "Producción Total Mundial",
            "Selecciona la unidad para Producción Total Mundial:",
            &m.world_capacity,
            m.world_unit
        ),
        latam = switchable_metric(
            "latam-capacity-total",
            "Producción Total en LATAM",
            "Selecciona la unidad para Producción Total en LATAM:",
            &m.latam_capacity,
            m.latam_unit
        ),
        colombia = format_number(m.colombia_capacity_mw, 0),
        co2 = format_number(m.latam_co2_reduction_tonnes, 0),
        factor = d.emission_factor
    )
}

fn markers_json(d: &Dashboard) -> String {
    let markers: Vec<serde_json::Value> = d
        .map_markers
        .iter()
        .map(|m| {
            serde_json::json!({
                "country": m.country,
                "latitude": m.latitude,
                "longitude": m.longitude,
                "radius": m.radius,
                "total_capacity": m.total_capacity,
            })
        })
        .collect();
    // Keep a country name from closing the script element.
    serde_json::Value::Array(markers).to_string().replace("</", "<\\/")
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; line-height: 1.5; color: #111827; background: #ffffff; }
.container { max-width: 1100px; margin: 0 auto; padding: 2rem; }
header { margin-bottom: 1.5rem; padding-bottom: 1rem; border-bottom: 2px solid #e5e7eb; }
header h1 { font-size: 2rem; font-weight: 700; }
.meta { color: #6b7280; font-size: 0.875rem; }
h2 { margin: 2rem 0 1rem; font-size: 1.25rem; }
.preview p { margin-bottom: 0.5rem; }
.table-wrap { overflow-x: auto; margin: 0.5rem 0 1rem; }
table { border-collapse: collapse; width: 100%; font-size: 0.85rem; }
th, td { border: 1px solid #e5e7eb; padding: 0.35rem 0.6rem; text-align: left; }
th { background: #f9fafb; }
td.empty { color: #9ca3af; text-align: center; }
.metrics { display: grid; grid-template-columns: repeat(auto-fit, minmax(230px, 1fr)); gap: 1rem; margin-top: 1.5rem; }
.metric { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem; }
.metric label { display: block; font-size: 0.75rem; color: #6b7280; margin-bottom: 0.25rem; }
.metric select { margin-bottom: 0.75rem; }
.metric-title { font-size: 0.875rem; color: #374151; }
.metric-value { font-size: 1.6rem; font-weight: 600; }
.metric-note { font-size: 0.75rem; color: #9ca3af; }
.tabs { display: flex; flex-wrap: wrap; gap: 0.25rem; border-bottom: 1px solid #e5e7eb; }
.tab { border: none; background: none; padding: 0.5rem 0.75rem; cursor: pointer; color: #6b7280; border-bottom: 2px solid transparent; }
.tab.active { color: #dc2626; border-bottom-color: #dc2626; }
.panel { display: none; padding: 1rem 0; }
.panel.active { display: block; }
.lead { margin-bottom: 0.75rem; }
.caption { margin-top: 0.75rem; color: #374151; }
#map { width: 100%; max-width: 725px; height: 500px; }
.chart { max-width: 720px; }
.chart svg { width: 100%; height: auto; display: block; }
p.empty { color: #9ca3af; }
footer { margin-top: 2rem; color: #9ca3af; font-size: 0.75rem; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function () {
  let map = null;
  function drawMap() {
    const el = document.getElementById('map');
    if (!el || map || typeof L === 'undefined') { if (map) map.invalidateSize(); return; }
    map = L.map(el).setView([parseFloat(el.dataset.lat), parseFloat(el.dataset.lon)], parseInt(el.dataset.zoom, 10));
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 18,
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);
    MAP_MARKERS.forEach(function (m) {
      const popup = document.createElement('span');
      popup.textContent = m.country + ': ' + m.total_capacity + ' Nm³ H₂/y';
      L.circleMarker([m.latitude, m.longitude], {
        radius: m.radius,
        color: 'blue',
        fill: true,
        fillColor: 'blue',
        fillOpacity: 0.6
      }).bindPopup(popup).addTo(map);
    });
  }
  document.querySelectorAll('.tab').forEach(function (btn) {
    btn.addEventListener('click', function () {
      document.querySelectorAll('.tab').forEach(function (b) { b.classList.remove('active'); });
      document.querySelectorAll('.panel').forEach(function (p) { p.classList.remove('active'); });
      btn.classList.add('active');
      document.getElementById(btn.dataset.tab).classList.add('active');
      if (btn.dataset.tab === 'latam-map') drawMap();
    });
  });
  document.querySelectorAll('.unit-select').forEach(function (sel) {
    sel.addEventListener('change', function () {
      const target = document.getElementById(sel.dataset.target);
      target.textContent = sel.value === 'MW' ? target.dataset.mw : target.dataset.nm3;
    });
  });
})();
"#
}
