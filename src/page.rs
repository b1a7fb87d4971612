use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chart::Chart;
use crate::menu::SelectionState;

pub const PAGE_TITLE: &str = "Starbucks Store Location Analysis Dashboard";
pub const PAGE_INTRO: &str = "Analysis of Starbucks store locations across different regions";

/// Everything one render pass produces, top to bottom.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub intro: String,
    pub selection: SelectionState,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub header: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Block {
    Metrics(Vec<Metric>),
    Subheader(String),
    Chart(Chart),
    Error(String),
}

impl Page {
    pub fn new(selection: SelectionState) -> Self {
        Page {
            title: PAGE_TITLE.to_string(),
            intro: PAGE_INTRO.to_string(),
            selection,
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.blocks().filter_map(|b| match b {
            Block::Chart(chart) => Some(chart),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.blocks().filter_map(|b| match b {
            Block::Error(message) => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn metric(&self, label: &str) -> Option<u64> {
        self.blocks().find_map(|b| match b {
            Block::Metrics(metrics) => metrics.iter().find(|m| m.label == label).map(|m| m.value),
            _ => None,
        })
    }
}
