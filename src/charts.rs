// Dashboard charts, drawn with plotters into inline SVG.
//
// Each renderer takes already-aggregated points and returns a `<div>` with a
// single `<svg>` element. An empty series renders a framed "no data" note.
use crate::util::format_number;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::f64::consts::PI;
use tracing::warn;

const SIZE: (u32, u32) = (720, 420);
const FONT: &str = "sans-serif";
const EMPTY_NOTE: &str = "Sin datos para mostrar";
const PIE_RADIUS: f64 = 150.0;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const GREEN: RGBColor = RGBColor(0, 128, 0);
pub const CORAL: RGBColor = RGBColor(255, 127, 80);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
const FRAME: RGBColor = RGBColor(156, 163, 175);

/// matplotlib's default cycle, used for pie slices.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub color: RGBColor,
}

type Root<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

fn draw_into(svg: &mut String, draw: impl FnOnce(&Root<'_>) -> DrawResult) -> DrawResult {
    let root = SVGBackend::with_string(svg, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    Ok(())
}

fn render(title: &str, draw: impl FnOnce(&Root<'_>) -> DrawResult) -> String {
    let mut svg = String::new();
    match draw_into(&mut svg, draw) {
        Ok(()) => format!(r#"<div class="chart">{}</div>"#, svg),
        Err(e) => {
            warn!(chart = title, error = %e, "chart not drawn");
            r#"<p class="empty">No se pudo dibujar la gráfica</p>"#.to_string()
        }
    }
}

fn text_style(size: f64) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font())
}

fn centered(size: f64) -> TextStyle<'static> {
    text_style(size).pos(Pos::new(HPos::Center, VPos::Center))
}

fn title_center(root: &Root<'_>) -> (i32, i32) {
    let (w, _) = root.dim_in_pixel();
    (w as i32 / 2, 24)
}

fn empty(title: &str) -> String {
    render(title, |root| {
        let (w, h) = root.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        root.draw(&Text::new(title, title_center(root), centered(18.0)))?;
        root.draw(&Rectangle::new([(60, 48), (w - 24, h - 48)], FRAME.stroke_width(1)))?;
        root.draw(&Text::new(EMPTY_NOTE, (w / 2, h / 2), centered(14.0).color(&FRAME)))?;
        Ok(())
    })
}

fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 && max.is_finite() {
        max * 1.05
    } else {
        1.0
    }
}

fn tick_label(value: f64) -> String {
    if value.abs() >= 100.0 {
        format_number(value, 0)
    } else {
        format_number(value, 2)
    }
}

/// Vertical bars in the given order, one category per segment.
pub fn bar_chart(spec: &ChartSpec, points: &[(String, f64)]) -> String {
    if points.is_empty() {
        return empty(spec.title);
    }
    let segments = points.len() as u32;
    let top = axis_max(points.iter().map(|(_, v)| *v));
    render(spec.title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(spec.title, text_style(18.0))
            .margin(12)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d((0u32..segments).into_segmented(), 0.0..top)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(points.len())
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => {
                    points.get(*i as usize).map(|(label, _)| label.clone()).unwrap_or_default()
                }
                _ => String::new(),
            })
            .y_label_formatter(&|v: &f64| tick_label(*v))
            .x_desc(spec.x_label)
            .y_desc(spec.y_label)
            .draw()?;
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(spec.color.filled())
                .margin(8)
                .data(points.iter().enumerate().map(|(i, (_, v))| (i as u32, v.max(0.0)))),
        )?;
        Ok(())
    })
}

/// Points joined in x order on a linear year axis, with a circle per point.
pub fn line_chart(spec: &ChartSpec, points: &[(i32, f64)]) -> String {
    if points.is_empty() {
        return empty(spec.title);
    }
    let first = points.iter().map(|(x, _)| *x).min().unwrap_or(0);
    let last = points.iter().map(|(x, _)| *x).max().unwrap_or(0);
    let top = axis_max(points.iter().map(|(_, v)| *v));
    render(spec.title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(spec.title, text_style(18.0))
            .margin(12)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d((first - 1)..(last + 1), 0.0..top)?;
        chart
            .configure_mesh()
            .x_label_formatter(&|y: &i32| y.to_string())
            .y_label_formatter(&|v: &f64| tick_label(*v))
            .x_desc(spec.x_label)
            .y_desc(spec.y_label)
            .draw()?;
        chart.draw_series(LineSeries::new(points.iter().copied(), spec.color.stroke_width(2)))?;
        chart.draw_series(points.iter().map(|&(x, v)| Circle::new((x, v), 4, spec.color.filled())))?;
        Ok(())
    })
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

/// Slices sized by `weight`, counter-clockwise from 140°, each labelled with
/// its name and share to one decimal.
pub fn pie_chart(title: &str, slices: &[(String, f64)]) -> String {
    let total: f64 = slices.iter().map(|(_, w)| w.max(0.0)).sum();
    if slices.is_empty() || total <= 0.0 {
        return empty(title);
    }
    render(title, |root| {
        root.draw(&Text::new(title, title_center(root), centered(18.0)))?;
        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, (h as i32 + 48) / 2);

        let mut start = 140.0_f64.to_radians();
        for (i, (label, weight)) in slices.iter().enumerate() {
            let share = weight.max(0.0) / total;
            if share <= 0.0 {
                continue;
            }
            let span = share * 2.0 * PI;
            let color = PALETTE[i % PALETTE.len()];
            if share >= 1.0 {
                root.draw(&Circle::new(center, PIE_RADIUS as i32, color.filled()))?;
            } else {
                // One outline point per degree of arc.
                let steps = (span.to_degrees().ceil() as usize).max(2);
                let mut outline = vec![center];
                outline.extend(
                    (0..=steps).map(|k| polar(center, PIE_RADIUS, start + span * k as f64 / steps as f64)),
                );
                root.draw(&Polygon::new(outline, color.filled()))?;
            }

            let mid = start + span / 2.0;
            root.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                polar(center, PIE_RADIUS * 0.6, mid),
                centered(12.0).color(&WHITE),
            ))?;
            let anchor = if mid.cos() >= 0.0 { HPos::Left } else { HPos::Right };
            root.draw(&Text::new(
                label.as_str(),
                polar(center, PIE_RADIUS * 1.12, mid),
                text_style(12.0).pos(Pos::new(anchor, VPos::Center)),
            ))?;
            start += span;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ChartSpec<'static> {
        ChartSpec { title: "Título", x_label: "País", y_label: "Capacidad", color: SKY_BLUE }
    }

    #[test]
    fn bar_chart_labels_every_category() {
        let svg = bar_chart(&spec(), &[("Chile".into(), 10.0), ("Perú".into(), 5.0)]);
        assert!(svg.starts_with(r#"<div class="chart">"#));
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
        assert!(svg.contains("Chile"));
        assert!(svg.contains("Perú"));
        assert!(svg.contains("Título"));
        assert!(!svg.contains(EMPTY_NOTE));
        // Background plus one rectangle per bar.
        assert!(svg.matches("<rect").count() >= 3);
    }

    #[test]
    fn empty_series_render_placeholder() {
        for svg in [bar_chart(&spec(), &[]), line_chart(&spec(), &[]), pie_chart("x", &[])] {
            assert!(svg.contains(EMPTY_NOTE));
            assert!(svg.contains("</svg>"));
        }
        assert!(pie_chart("x", &[("A".into(), 0.0)]).contains(EMPTY_NOTE));
    }

    #[test]
    fn line_chart_has_point_per_year() {
        let svg = line_chart(&spec(), &[(2019, 1.0), (2021, 3.0), (2024, 2.0)]);
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("2021"));
        let single = line_chart(&spec(), &[(2020, 5.0)]);
        assert_eq!(single.matches("<circle").count(), 1);
    }

    #[test]
    fn pie_labels_show_count_shares() {
        let svg = pie_chart("Proyectos", &[("Chile".into(), 1.0), ("Colombia".into(), 3.0)]);
        assert!(svg.contains("25.0%"));
        assert!(svg.contains("75.0%"));
        assert_eq!(svg.matches("<polygon").count(), 2);
        let whole = pie_chart("Proyectos", &[("Chile".into(), 2.0)]);
        assert!(whole.contains("100.0%"));
        assert!(whole.contains("<circle"));
    }

    #[test]
    fn slice_outline_starts_at_140_degrees() {
        let c = (360, 234);
        let (x, y) = polar(c, 100.0, 140.0_f64.to_radians());
        // Upper left of the center.
        assert!(x < c.0);
        assert!(y < c.1);
        assert_eq!(polar(c, 100.0, 0.0), (460, 234));
    }
}
