pub mod html;
pub mod svg;
pub mod text;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::page::Page;

pub use html::render_html;
pub use text::render_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

pub fn render(page: &Page, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(page)),
        OutputFormat::Html => Ok(render_html(page)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(page).context("Failed to serialize dashboard page")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::menu::{render_page, AnalysisType, QuestionId, SelectionState};

    #[test]
    fn json_output_tags_blocks_and_charts() {
        let ds = Dataset::from_reader(
            "test",
            "City,Country\nSeattle,US\nSeattle,US\nTokyo,JP\n".as_bytes(),
        )
        .unwrap();
        let selection = SelectionState::new(AnalysisType::Overview, Some(QuestionId::Q2));
        let json = render(&render_page(&ds, &selection), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let sections = value["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["header"], "Dataset Overview");
        assert_eq!(sections[0]["blocks"][0]["type"], "metrics");

        assert_eq!(sections[0]["blocks"][1]["type"], "subheader");
        let chart = &sections[0]["blocks"][2];
        assert_eq!(chart["type"], "chart");
        assert_eq!(chart["content"]["kind"], "bar");
        assert_eq!(chart["content"]["bars"][0]["label"], "Seattle");
        assert_eq!(chart["content"]["bars"][0]["value"], 2);

        assert_eq!(sections[1]["blocks"][0]["type"], "subheader");
        assert_eq!(sections[1]["blocks"][1]["content"]["kind"], "pie");
    }
}
