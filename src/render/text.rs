use std::fmt::Write;

use crate::chart::{BarChart, Chart, GeoScatter, GroupedBarChart, PieChart};
use crate::page::{Block, Page};
use crate::utils::format_number;

const BAR_WIDTH: u64 = 40;

pub fn render_text(page: &Page) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ===", page.title);
    let _ = writeln!(out, "{}", page.intro);
    let _ = writeln!(
        out,
        "Analysis type: {} | Question: {}",
        page.selection.analysis.label(),
        page.selection
            .question
            .map(|q| q.label())
            .unwrap_or(crate::menu::QUESTION_PLACEHOLDER)
    );

    for section in &page.sections {
        let _ = writeln!(out, "\n--- {} ---", section.header);
        for block in &section.blocks {
            write_block(&mut out, block);
        }
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Metrics(metrics) => {
            let line = metrics
                .iter()
                .map(|m| format!("{}: {}", m.label, format_number(m.value)))
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(out, "{}", line);
        }
        Block::Subheader(text) => {
            let _ = writeln!(out, "\n{}", text);
        }
        Block::Chart(chart) => write_chart(out, chart),
        Block::Error(text) => {
            let _ = writeln!(out, "Error: {}", text);
        }
    }
}

fn write_chart(out: &mut String, chart: &Chart) {
    if let Some(title) = chart.title() {
        let _ = writeln!(out, "\n{}", title);
    }
    match chart {
        Chart::Bar(c) => write_bars(out, c),
        Chart::Pie(c) => write_pie(out, c),
        Chart::GroupedBar(c) => write_grouped(out, c),
        Chart::GeoScatter(c) => write_map(out, c),
    }
}

fn scaled(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (value * BAR_WIDTH).div_ceil(max);
    "#".repeat(len as usize)
}

fn write_bars(out: &mut String, chart: &BarChart) {
    let _ = writeln!(out, "{} by {}:", chart.y_label, chart.x_label);
    if chart.bars.is_empty() {
        let _ = writeln!(out, "- (no data)");
        return;
    }
    let max = chart.bars.iter().map(|b| b.value).max().unwrap_or(0);
    for bar in &chart.bars {
        let _ = writeln!(
            out,
            "- {}: {} {}",
            bar.label,
            format_number(bar.value),
            scaled(bar.value, max)
        );
    }
}

fn write_pie(out: &mut String, chart: &PieChart) {
    let total = chart.total();
    if chart.slices.is_empty() {
        let _ = writeln!(out, "- (no data)");
        return;
    }
    for slice in &chart.slices {
        let pct = if total == 0 {
            0.0
        } else {
            slice.value as f64 / total as f64 * 100.0
        };
        let _ = writeln!(
            out,
            "- {}: {} ({:.1}%)",
            slice.label,
            format_number(slice.value),
            pct
        );
    }
}

fn write_grouped(out: &mut String, chart: &GroupedBarChart) {
    let _ = writeln!(out, "{} by {} and {}:", chart.y_label, chart.x_label, chart.legend_title);
    if chart.groups.is_empty() {
        let _ = writeln!(out, "- (no data)");
        return;
    }
    for (g, group) in chart.groups.iter().enumerate() {
        let parts = chart
            .series
            .iter()
            .filter_map(|s| {
                let value = s.values.get(g).copied().unwrap_or(0);
                (value > 0).then(|| format!("{} {}", s.name, format_number(value)))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "- {}: {}", group, parts);
    }
}

fn write_map(out: &mut String, chart: &GeoScatter) {
    let _ = writeln!(
        out,
        "Store map: {} locations plotted ({} basemap, zoom {})",
        format_number(chart.points.len() as u64),
        chart.map_style,
        chart.zoom
    );
    if let Some((lat, lon)) = chart.center() {
        let _ = writeln!(out, "Centered on {:.4}, {:.4}", lat, lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::menu::{render_page, AnalysisType, QuestionId, SelectionState};

    fn dataset() -> Dataset {
        let csv = "City,Country,Ownership Type,Timezone\n\
                   Seattle,US,Licensed,PST\n\
                   Seattle,US,Company Owned,PST\n\
                   Vancouver,CA,Licensed,PST\n";
        Dataset::from_reader("test", csv.as_bytes()).unwrap()
    }

    #[test]
    fn overview_lists_metrics_and_top_cities() {
        let page = render_page(&dataset(), &SelectionState::default());
        let text = render_text(&page);
        assert!(text.contains("--- Dataset Overview ---"));
        assert!(text.contains("Total Stores: 3 | Total Countries: 2 | Total Cities: 2"));
        assert!(text.contains("- Seattle: 2 ########################################"));
    }

    #[test]
    fn unmapped_question_shows_only_its_heading() {
        let selection = SelectionState::new(AnalysisType::Overview, Some(QuestionId::Q9));
        let text = render_text(&render_page(&dataset(), &selection));
        assert!(text.contains("--- Question Analysis ---"));
        assert!(text.contains("9. What percentage of stores have phone numbers?"));
        assert!(text.trim_end().ends_with("9. What percentage of stores have phone numbers?"));
    }

    #[test]
    fn pie_shows_percentages() {
        let selection = SelectionState::new(AnalysisType::OwnershipAnalysis, None);
        let text = render_text(&render_page(&dataset(), &selection));
        assert!(text.contains("- Licensed: 2 (66.7%)"));
        assert!(text.contains("- Seattle: Company Owned 1, Licensed 1"));
    }
}
