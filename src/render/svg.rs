//! Inline SVG drawing for dashboard charts.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::chart::{BarChart, Chart, GeoScatter, GroupedBarChart, PieChart};

pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const TILE_SIZE: f64 = 256.0;
const MAP_WIDTH: f64 = 900.0;
const TILE_URL: &str = "https://tile.openstreetmap.org";

pub fn chart_svg(chart: &Chart) -> String {
    match chart {
        Chart::Bar(c) => bar_chart_svg(c),
        Chart::Pie(c) => pie_chart_svg(c),
        Chart::GroupedBar(c) => grouped_bar_svg(c),
        Chart::GeoScatter(c) => geo_scatter_svg(c),
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// Frame shared by the two bar chart kinds.
struct Axes {
    width: f64,
    height: f64,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    y_max: f64,
}

impl Axes {
    fn new(slots: usize, slot_width: f64, y_max: u64, rotated: bool) -> Self {
        let left = 70.0;
        let top = 50.0;
        let bottom = if rotated { 130.0 } else { 50.0 };
        let plot_w = (slots as f64 * slot_width).max(500.0);
        let plot_h = 320.0;
        Axes {
            width: left + plot_w + 30.0,
            height: top + plot_h + bottom,
            left,
            top,
            plot_w,
            plot_h,
            y_max: y_max.max(1) as f64,
        }
    }

    fn y(&self, value: u64) -> f64 {
        self.top + self.plot_h - value as f64 / self.y_max * self.plot_h
    }

    fn baseline(&self) -> f64 {
        self.top + self.plot_h
    }

    fn grid(&self, out: &mut String, y_label: &str) {
        for step in 0..=5 {
            let value = (self.y_max * step as f64 / 5.0).round() as u64;
            let y = self.y(value);
            let _ = write!(
                out,
                r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#e5e7eb"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" fill="#6b7280">{}</text>"##,
                self.left,
                y,
                self.left + self.plot_w,
                y,
                self.left - 6.0,
                y + 4.0,
                value
            );
        }
        let _ = write!(
            out,
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#374151"/>"##,
            self.left,
            self.baseline(),
            self.left + self.plot_w,
            self.baseline()
        );
        let mid = self.top + self.plot_h / 2.0;
        let _ = write!(
            out,
            r##"<text x="16" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 16 {:.1})">{}</text>"##,
            mid,
            mid,
            escape(y_label)
        );
    }

    fn tick_label(&self, out: &mut String, x: f64, label: &str, angle: Option<i32>) {
        let y = self.baseline() + 16.0;
        match angle {
            Some(a) => {
                let _ = write!(
                    out,
                    r##"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="start" transform="rotate({} {:.1} {:.1})">{}</text>"##,
                    x,
                    y,
                    a,
                    x,
                    y,
                    escape(label)
                );
            }
            None => {
                let _ = write!(
                    out,
                    r##"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"##,
                    x,
                    y,
                    escape(label)
                );
            }
        }
    }

    fn x_title(&self, out: &mut String, x_label: &str) {
        let _ = write!(
            out,
            r##"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"##,
            self.left + self.plot_w / 2.0,
            self.height - 10.0,
            escape(x_label)
        );
    }
}

fn open_svg(out: &mut String, width: f64, height: f64, title: Option<&str>) {
    let _ = write!(
        out,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" style="background:white; border-radius:8px">"##,
        width, height, width, height
    );
    if let Some(title) = title {
        let _ = write!(
            out,
            r##"<text x="20" y="28" font-size="16" font-weight="600">{}</text>"##,
            escape(title)
        );
    }
}

pub fn bar_chart_svg(chart: &BarChart) -> String {
    let y_max = chart.bars.iter().map(|b| b.value).max().unwrap_or(0);
    let axes = Axes::new(chart.bars.len(), 40.0, y_max, chart.tick_angle.is_some());
    let mut out = String::new();
    open_svg(&mut out, axes.width, axes.height, chart.title.as_deref());
    axes.grid(&mut out, &chart.y_label);

    let slot = axes.plot_w / chart.bars.len().max(1) as f64;
    for (i, bar) in chart.bars.iter().enumerate() {
        let x = axes.left + i as f64 * slot;
        let y = axes.y(bar.value);
        let _ = write!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"##,
            x + slot * 0.1,
            y,
            slot * 0.8,
            axes.baseline() - y,
            color(0),
            escape(&bar.label),
            bar.value
        );
        axes.tick_label(&mut out, x + slot / 2.0, &bar.label, chart.tick_angle);
    }

    axes.x_title(&mut out, &chart.x_label);
    out.push_str("</svg>");
    out
}

pub fn grouped_bar_svg(chart: &GroupedBarChart) -> String {
    let series_count = chart.series.len().max(1);
    let y_max = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .max()
        .unwrap_or(0);
    let slot_width = (series_count as f64 * 8.0 + 10.0).max(30.0);
    let axes = Axes::new(chart.groups.len(), slot_width, y_max, chart.tick_angle.is_some());
    let legend_w = 180.0;
    let mut out = String::new();
    open_svg(
        &mut out,
        axes.width + legend_w,
        axes.height.max(axes.top + 24.0 + chart.series.len() as f64 * 18.0),
        chart.title.as_deref(),
    );
    axes.grid(&mut out, &chart.y_label);

    let slot = axes.plot_w / chart.groups.len().max(1) as f64;
    let bar_w = slot * 0.8 / series_count as f64;
    for (g, group) in chart.groups.iter().enumerate() {
        let x0 = axes.left + g as f64 * slot + slot * 0.1;
        for (s, series) in chart.series.iter().enumerate() {
            let value = series.values.get(g).copied().unwrap_or(0);
            if value == 0 {
                continue;
            }
            let y = axes.y(value);
            let _ = write!(
                out,
                r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{} / {}: {}</title></rect>"##,
                x0 + s as f64 * bar_w,
                y,
                bar_w,
                axes.baseline() - y,
                color(s),
                escape(group),
                escape(&series.name),
                value
            );
        }
        axes.tick_label(&mut out, x0 + slot * 0.4, group, chart.tick_angle);
    }
    axes.x_title(&mut out, &chart.x_label);

    let lx = axes.width + 10.0;
    let _ = write!(
        out,
        r##"<text x="{:.1}" y="{:.1}" font-size="12" font-weight="600">{}</text>"##,
        lx,
        axes.top,
        escape(&chart.legend_title)
    );
    for (s, series) in chart.series.iter().enumerate() {
        let y = axes.top + 12.0 + s as f64 * 18.0;
        let _ = write!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12">{}</text>"##,
            lx,
            y,
            color(s),
            lx + 18.0,
            y + 10.0,
            escape(&series.name)
        );
    }

    out.push_str("</svg>");
    out
}

pub fn pie_chart_svg(chart: &PieChart) -> String {
    let (cx, cy, r): (f64, f64, f64) = (200.0, 210.0, 150.0);
    let width = 700.0;
    let height = (cy + r + 30.0).max(70.0 + chart.slices.len() as f64 * 18.0);
    let total = chart.total();
    let mut out = String::new();
    open_svg(&mut out, width, height, chart.title.as_deref());

    // Clockwise from twelve o'clock
    let mut angle = -PI / 2.0;
    for (i, slice) in chart.slices.iter().enumerate() {
        if total == 0 || slice.value == 0 {
            continue;
        }
        let fraction = slice.value as f64 / total as f64;
        let tooltip = format!(
            "{}: {} ({:.1}%)",
            escape(&slice.label),
            slice.value,
            fraction * 100.0
        );
        if fraction >= 0.999_999 {
            let _ = write!(
                out,
                r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"><title>{}</title></circle>"##,
                cx,
                cy,
                r,
                color(i),
                tooltip
            );
            break;
        }
        let end = angle + fraction * 2.0 * PI;
        let large_arc = if fraction > 0.5 { 1 } else { 0 };
        let _ = write!(
            out,
            r##"<path d="M {:.2} {:.2} L {:.2} {:.2} A {:.1} {:.1} 0 {} 1 {:.2} {:.2} Z" fill="{}" stroke="white"><title>{}</title></path>"##,
            cx,
            cy,
            cx + r * angle.cos(),
            cy + r * angle.sin(),
            r,
            r,
            large_arc,
            cx + r * end.cos(),
            cy + r * end.sin(),
            color(i),
            tooltip
        );
        angle = end;
    }

    let lx = cx + r + 50.0;
    for (i, slice) in chart.slices.iter().enumerate() {
        let y = 50.0 + i as f64 * 18.0;
        let pct = if total == 0 {
            0.0
        } else {
            slice.value as f64 / total as f64 * 100.0
        };
        let _ = write!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12">{} ({:.1}%)</text>"##,
            lx,
            y,
            color(i),
            lx + 18.0,
            y + 10.0,
            escape(&slice.label),
            pct
        );
    }

    out.push_str("</svg>");
    out
}

/// Web Mercator world pixel for a coordinate at `zoom`.
pub fn mercator_pixel(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * world;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

pub fn geo_scatter_svg(chart: &GeoScatter) -> String {
    let height = chart.height as f64;
    let (center_lat, center_lon) = chart.center().unwrap_or((0.0, 0.0));
    let (cx, cy) = mercator_pixel(center_lat, center_lon, chart.zoom);
    let origin_x = cx - MAP_WIDTH / 2.0;
    let origin_y = cy - height / 2.0;

    let mut out = String::new();
    open_svg(&mut out, MAP_WIDTH, height, None);
    out.push_str(r##"<rect width="100%" height="100%" fill="#aad3df"/>"##);

    let tiles = 1i64 << chart.zoom;
    let first_tx = (origin_x / TILE_SIZE).floor() as i64;
    let last_tx = ((origin_x + MAP_WIDTH) / TILE_SIZE).floor() as i64;
    let first_ty = ((origin_y / TILE_SIZE).floor() as i64).max(0);
    let last_ty = (((origin_y + height) / TILE_SIZE).floor() as i64).min(tiles - 1);
    for ty in first_ty..=last_ty {
        for tx in first_tx..=last_tx {
            let wrapped = tx.rem_euclid(tiles);
            let _ = write!(
                out,
                r##"<image href="{}/{}/{}/{}.png" x="{:.1}" y="{:.1}" width="256" height="256"/>"##,
                TILE_URL,
                chart.zoom,
                wrapped,
                ty,
                tx as f64 * TILE_SIZE - origin_x,
                ty as f64 * TILE_SIZE - origin_y
            );
        }
    }

    for point in &chart.points {
        let (px, py) = mercator_pixel(point.latitude, point.longitude, chart.zoom);
        if !px.is_finite() || !py.is_finite() {
            continue;
        }
        let _ = write!(
            out,
            r##"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}" fill-opacity="0.8"><title>{}</title></circle>"##,
            px - origin_x,
            py - origin_y,
            color(0),
            escape(&point.hover_label())
        );
    }

    let _ = write!(
        out,
        r##"<text x="{:.0}" y="{:.0}" font-size="10" text-anchor="end" fill="#374151">© OpenStreetMap contributors</text>"##,
        MAP_WIDTH - 5.0,
        height - 5.0
    );
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Bar, GeoPoint};

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("A&W <Drive-Thru>"), "A&amp;W &lt;Drive-Thru&gt;");
    }

    #[test]
    fn bar_chart_draws_a_rect_per_bar() {
        let chart = BarChart {
            title: Some("Store Distribution by City".into()),
            x_label: "City".into(),
            y_label: "Number of Stores".into(),
            tick_angle: Some(45),
            bars: vec![
                Bar { label: "Seattle".into(), value: 2 },
                Bar { label: "Portland".into(), value: 1 },
            ],
        };
        let svg = bar_chart_svg(&chart);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("rotate(45"));
        assert!(svg.contains("Store Distribution by City"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn single_slice_pie_is_a_full_circle() {
        let chart = PieChart {
            title: None,
            slices: vec![Bar { label: "Licensed".into(), value: 3 }],
        };
        let svg = pie_chart_svg(&chart);
        assert!(svg.contains("<circle"));
        assert!(svg.contains("Licensed (100.0%)"));
    }

    #[test]
    fn empty_pie_still_renders() {
        let svg = pie_chart_svg(&PieChart { title: None, slices: Vec::new() });
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn long_pie_legend_grows_the_canvas() {
        let small = pie_chart_svg(&PieChart {
            title: None,
            slices: vec![Bar { label: "Licensed".into(), value: 3 }],
        });
        assert!(small.contains(r#"height="390""#));

        let slices = (0..30)
            .map(|i| Bar { label: format!("City {}", i), value: 1 })
            .collect();
        let tall = pie_chart_svg(&PieChart { title: None, slices });
        assert!(tall.contains(r#"height="610""#));
    }

    #[test]
    fn mercator_origin_is_map_center() {
        let (x, y) = mercator_pixel(0.0, 0.0, 3);
        assert!((x - 1024.0).abs() < 1e-9);
        assert!((y - 1024.0).abs() < 1e-9);
    }

    #[test]
    fn geo_scatter_skips_unprojectable_points() {
        let chart = GeoScatter {
            zoom: 3,
            height: 300,
            map_style: "open-street-map",
            points: vec![
                GeoPoint {
                    latitude: 47.6,
                    longitude: -122.3,
                    name: "Pike Place".into(),
                    city: "Seattle".into(),
                    country: "US".into(),
                },
                GeoPoint {
                    latitude: f64::NAN,
                    longitude: 0.0,
                    name: "Unplaced".into(),
                    city: "".into(),
                    country: "".into(),
                },
            ],
        };
        let svg = geo_scatter_svg(&chart);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("tile.openstreetmap.org/3/"));
    }
}
