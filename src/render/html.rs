//! Standalone HTML page: sidebar with both selectors, main panel with the
//! rendered sections and inline SVG charts.

use crate::menu::{AnalysisType, QuestionId, QUESTION_PLACEHOLDER};
use crate::page::{Block, Page};
use crate::render::svg::{chart_svg, escape};
use crate::utils::format_number;

const STYLE: &str = r#"
body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; color: #1f2937; display: flex; }
aside { width: 300px; min-height: 100vh; background: #f0f2f6; padding: 24px; box-sizing: border-box; }
aside h2 { margin-top: 0; }
aside select { width: 100%; margin-bottom: 20px; }
aside label { display: block; margin: 4px 0; }
main { flex: 1; padding: 24px 40px; overflow-x: auto; }
.metrics { display: flex; gap: 48px; margin: 12px 0 24px; }
.metric .label { font-size: 14px; color: #6b7280; }
.metric .value { font-size: 32px; }
.chart { margin: 16px 0; overflow-x: auto; }
.error { background: #fee2e2; color: #991b1b; padding: 12px 16px; border-radius: 6px; }
footer { margin-top: 40px; font-size: 12px; color: #9ca3af; }
"#;

pub fn render_html(page: &Page) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape(&page.title)));
    output.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    output.push_str(&generate_sidebar(page));

    output.push_str("<main>\n");
    output.push_str(&format!("<h1>{}</h1>\n", escape(&page.title)));
    output.push_str(&format!("<p>{}</p>\n", escape(&page.intro)));

    for section in &page.sections {
        output.push_str(&format!("<h2>{}</h2>\n", escape(&section.header)));
        for block in &section.blocks {
            output.push_str(&generate_block(block));
        }
    }

    output.push_str(&format!(
        "<footer>Generated {}</footer>\n",
        page.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str("</main>\n</body>\n</html>\n");
    output
}

/// The form resubmits on every change, so each selection is a fresh render.
fn generate_sidebar(page: &Page) -> String {
    let mut sidebar = String::new();

    sidebar.push_str("<aside>\n<h2>Navigation</h2>\n<form method=\"get\" action=\"/\">\n");

    sidebar.push_str("<p><strong>Analysis Questions</strong></p>\n");
    sidebar.push_str("<select name=\"question\" onchange=\"this.form.submit()\">\n");
    let placeholder_selected = if page.selection.question.is_none() {
        " selected"
    } else {
        ""
    };
    sidebar.push_str(&format!(
        "<option value=\"none\"{}>{}</option>\n",
        placeholder_selected, QUESTION_PLACEHOLDER
    ));
    for question in QuestionId::ALL {
        let selected = if page.selection.question == Some(question) {
            " selected"
        } else {
            ""
        };
        sidebar.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            question.number(),
            selected,
            escape(question.label())
        ));
    }
    sidebar.push_str("</select>\n");

    sidebar.push_str("<p><strong>Select Analysis Type</strong></p>\n");
    for analysis in AnalysisType::ALL {
        let checked = if page.selection.analysis == analysis {
            " checked"
        } else {
            ""
        };
        sidebar.push_str(&format!(
            "<label><input type=\"radio\" name=\"analysis\" value=\"{}\"{} onchange=\"this.form.submit()\"> {}</label>\n",
            analysis.slug(),
            checked,
            analysis.label()
        ));
    }

    sidebar.push_str("</form>\n</aside>\n");
    sidebar
}

fn generate_block(block: &Block) -> String {
    match block {
        Block::Metrics(metrics) => {
            let mut html = String::from("<div class=\"metrics\">\n");
            for metric in metrics {
                html.push_str(&format!(
                    "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
                    escape(&metric.label),
                    format_number(metric.value)
                ));
            }
            html.push_str("</div>\n");
            html
        }
        Block::Subheader(text) => format!("<h3>{}</h3>\n", escape(text)),
        Block::Chart(chart) => format!("<div class=\"chart\">{}</div>\n", chart_svg(chart)),
        Block::Error(text) => format!("<div class=\"error\">{}</div>\n", escape(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::menu::{render_page, SelectionState};

    fn dataset() -> Dataset {
        Dataset::from_reader("test", "City,Country\nSeattle,US\nParis,FR\n".as_bytes()).unwrap()
    }

    #[test]
    fn sidebar_offers_every_selector_value() {
        let page = render_page(&dataset(), &SelectionState::default());
        let html = render_html(&page);
        assert_eq!(html.matches("<option").count(), 21);
        assert_eq!(html.matches("type=\"radio\"").count(), 4);
        assert!(html.contains("value=\"overview\" checked"));
        assert!(html.contains("<option value=\"none\" selected>Select a Question</option>"));
    }

    #[test]
    fn missing_columns_surface_as_error_blocks() {
        let selection = SelectionState::new(AnalysisType::StoreDistribution, None);
        let html = render_html(&render_page(&dataset(), &selection));
        assert!(html.contains("<div class=\"error\">column &#39;Timezone&#39; does not exist"));
        assert!(html.contains("Store Distribution by City"));
    }
}
