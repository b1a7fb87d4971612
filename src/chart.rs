use serde::Serialize;

use crate::aggregate::{AggregationResult, CrossTab};
use crate::dataset::StoreRecord;

pub const DEFAULT_Y_LABEL: &str = "Number of Stores";
pub const MAP_ZOOM: u8 = 3;
pub const MAP_HEIGHT: u32 = 300;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Bar(BarChart),
    Pie(PieChart),
    GroupedBar(GroupedBarChart),
    GeoScatter(GeoScatter),
}

impl Chart {
    pub fn title(&self) -> Option<&str> {
        match self {
            Chart::Bar(c) => c.title.as_deref(),
            Chart::Pie(c) => c.title.as_deref(),
            Chart::GroupedBar(c) => c.title.as_deref(),
            Chart::GeoScatter(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Chart::Bar(c) => c.bars.is_empty(),
            Chart::Pie(c) => c.slices.is_empty(),
            Chart::GroupedBar(c) => c.groups.is_empty(),
            Chart::GeoScatter(c) => c.points.is_empty(),
        }
    }
}

/// Fixed presentation parameters for a category chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartStyle {
    pub title: Option<&'static str>,
    pub x_label: Option<&'static str>,
    pub tick_angle: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub tick_angle: Option<i32>,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: Option<String>,
    pub slices: Vec<Bar>,
}

impl PieChart {
    pub fn total(&self) -> u64 {
        self.slices.iter().map(|s| s.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBarChart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    pub tick_angle: Option<i32>,
    pub groups: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub city: String,
    pub country: String,
}

impl GeoPoint {
    pub fn hover_label(&self) -> String {
        format!("{}\nCity: {}\nCountry: {}", self.name, self.city, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoScatter {
    pub zoom: u8,
    pub height: u32,
    pub map_style: &'static str,
    pub points: Vec<GeoPoint>,
}

impl GeoScatter {
    /// Mean of the finite coordinates, used as the initial map center.
    pub fn center(&self) -> Option<(f64, f64)> {
        let finite: Vec<&GeoPoint> = self
            .points
            .iter()
            .filter(|p| p.latitude.is_finite() && p.longitude.is_finite())
            .collect();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let lat = finite.iter().map(|p| p.latitude).sum::<f64>() / n;
        let lon = finite.iter().map(|p| p.longitude).sum::<f64>() / n;
        Some((lat, lon))
    }
}

fn bars(result: &AggregationResult) -> Vec<Bar> {
    result
        .pairs()
        .map(|(label, value)| Bar {
            label: label.to_string(),
            value,
        })
        .collect()
}

pub fn category_bar(result: &AggregationResult, style: ChartStyle) -> Chart {
    Chart::Bar(BarChart {
        title: style.title.map(str::to_string),
        x_label: style.x_label.unwrap_or(result.column.as_str()).to_string(),
        y_label: DEFAULT_Y_LABEL.to_string(),
        tick_angle: style.tick_angle,
        bars: bars(result),
    })
}

pub fn category_pie(result: &AggregationResult, style: ChartStyle) -> Chart {
    Chart::Pie(PieChart {
        title: style.title.map(str::to_string),
        slices: bars(result),
    })
}

pub fn grouped_bar(table: &CrossTab, style: ChartStyle) -> Chart {
    let series = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, name)| Series {
            name: name.clone(),
            values: table.column_series(c),
        })
        .collect();

    Chart::GroupedBar(GroupedBarChart {
        title: style.title.map(str::to_string),
        x_label: style.x_label.unwrap_or(table.row_column.as_str()).to_string(),
        y_label: "value".to_string(),
        legend_title: table.col_column.clone(),
        tick_angle: style.tick_angle,
        groups: table.rows.clone(),
        series,
    })
}

/// Records without both coordinates have nowhere to go and are left out.
/// Out-of-range values are kept as they are.
pub fn geo_scatter(records: &[StoreRecord]) -> Chart {
    let points = records
        .iter()
        .filter_map(|r| {
            Some(GeoPoint {
                latitude: r.latitude?,
                longitude: r.longitude?,
                name: r.store_name.clone(),
                city: r.city.clone(),
                country: r.country.clone(),
            })
        })
        .collect();

    Chart::GeoScatter(GeoScatter {
        zoom: MAP_ZOOM,
        height: MAP_HEIGHT,
        map_style: "open-street-map",
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{cross_tabulate, frequency_count};
    use crate::dataset::Dataset;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_reader("test", csv.as_bytes()).unwrap()
    }

    #[test]
    fn bar_defaults_x_label_to_column() {
        let ds = dataset("Timezone\nUTC\nUTC\nGMT\n");
        let result = frequency_count(&ds, "Timezone", None).unwrap();
        let chart = category_bar(
            &result,
            ChartStyle {
                tick_angle: Some(45),
                ..Default::default()
            },
        );
        let Chart::Bar(bar) = chart else {
            panic!("expected bar chart");
        };
        assert_eq!(bar.x_label, "Timezone");
        assert_eq!(bar.y_label, DEFAULT_Y_LABEL);
        assert_eq!(bar.tick_angle, Some(45));
        assert_eq!(bar.bars[0], Bar { label: "UTC".into(), value: 2 });
    }

    #[test]
    fn pie_has_a_slice_per_category() {
        let ds = dataset("Country\nUS\nCA\nMX\nUS\n");
        let result = frequency_count(&ds, "Country", None).unwrap();
        let Chart::Pie(pie) = category_pie(&result, ChartStyle::default()) else {
            panic!("expected pie chart");
        };
        assert_eq!(pie.slices.len(), 3);
        assert_eq!(pie.total(), 4);
    }

    #[test]
    fn grouped_bar_has_one_series_per_column_category() {
        let ds = dataset(
            "City,Ownership Type\nSeattle,Licensed\nPortland,Company Owned\nSeattle,Company Owned\n",
        );
        let table = cross_tabulate(&ds, "City", "Ownership Type").unwrap();
        let Chart::GroupedBar(chart) = grouped_bar(&table, ChartStyle::default()) else {
            panic!("expected grouped bar chart");
        };
        assert_eq!(chart.groups, vec!["Portland", "Seattle"]);
        assert_eq!(chart.legend_title, "Ownership Type");
        assert_eq!(chart.series[0].name, "Company Owned");
        assert_eq!(chart.series[0].values, vec![1, 1]);
        assert_eq!(chart.series[1].values, vec![0, 1]);
    }

    #[test]
    fn geo_scatter_passes_out_of_range_coordinates_through() {
        let records = vec![
            StoreRecord {
                store_name: "Pike Place".into(),
                latitude: Some(123.0),
                longitude: Some(-200.0),
                ..Default::default()
            },
            StoreRecord {
                store_name: "Nowhere".into(),
                latitude: None,
                longitude: Some(1.0),
                ..Default::default()
            },
        ];
        let Chart::GeoScatter(map) = geo_scatter(&records) else {
            panic!("expected geo scatter");
        };
        assert_eq!(map.zoom, MAP_ZOOM);
        assert_eq!(map.points.len(), 1);
        assert_eq!(map.points[0].latitude, 123.0);
        assert_eq!(map.center(), Some((123.0, -200.0)));
    }
}
