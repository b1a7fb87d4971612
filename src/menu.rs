use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

use crate::aggregate::{cross_tabulate, distinct_count, frequency_count, row_count};
use crate::chart::{self, ChartStyle};
use crate::dataset::{columns, Dataset};
use crate::error::{DashboardError, Result};
use crate::page::{Block, Metric, Page, Section};

pub const QUESTION_PLACEHOLDER: &str = "Select a Question";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ValueEnum)]
pub enum AnalysisType {
    #[default]
    Overview,
    StoreDistribution,
    OwnershipAnalysis,
    LocationAnalysis,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Overview,
        AnalysisType::StoreDistribution,
        AnalysisType::OwnershipAnalysis,
        AnalysisType::LocationAnalysis,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisType::Overview => "Overview",
            AnalysisType::StoreDistribution => "Store Distribution",
            AnalysisType::OwnershipAnalysis => "Ownership Analysis",
            AnalysisType::LocationAnalysis => "Location Analysis",
        }
    }

    /// Kebab-case identifier used on the command line and in query strings.
    pub fn slug(self) -> &'static str {
        match self {
            AnalysisType::Overview => "overview",
            AnalysisType::StoreDistribution => "store-distribution",
            AnalysisType::OwnershipAnalysis => "ownership-analysis",
            AnalysisType::LocationAnalysis => "location-analysis",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            AnalysisType::Overview => "Dataset Overview",
            AnalysisType::StoreDistribution => "Store Distribution Analysis",
            AnalysisType::OwnershipAnalysis => "Ownership Type Analysis",
            AnalysisType::LocationAnalysis => "Location Analysis",
        }
    }

    pub fn views(self) -> &'static [View] {
        match self {
            AnalysisType::Overview => OVERVIEW_VIEWS,
            AnalysisType::StoreDistribution => STORE_DISTRIBUTION_VIEWS,
            AnalysisType::OwnershipAnalysis => OWNERSHIP_VIEWS,
            AnalysisType::LocationAnalysis => LOCATION_VIEWS,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisType {
    type Err = DashboardError;

    /// Accepts either the slug (`store-distribution`) or the menu label
    /// (`Store Distribution`), ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        AnalysisType::ALL
            .into_iter()
            .find(|a| a.slug().eq_ignore_ascii_case(wanted) || a.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DashboardError::UnknownAnalysis(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum QuestionId {
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
    Q6,
    Q7,
    Q8,
    Q9,
    Q10,
    Q11,
    Q12,
    Q13,
    Q14,
    Q15,
    Q16,
    Q17,
    Q18,
    Q19,
    Q20,
}

const QUESTION_LABELS: [&str; 20] = [
    "1. What is the geographical distribution of stores by city?",
    "2. Which cities have the highest number of stores?",
    "3. What is the distribution of ownership types?",
    "4. How are stores distributed across timezones?",
    "5. What is the average latitude/longitude by country?",
    "6. Which countries have the most locations?",
    "7. What is the distribution across states/provinces?",
    "8. What are common patterns in store naming?",
    "9. What percentage of stores have phone numbers?",
    "10. How many stores are in shopping malls?",
    "11. What is the store density in urban areas?",
    "12. Are there store clusters in neighborhoods?",
    "13. Which areas show growth potential?",
    "14. What's the average distance between stores?",
    "15. How many stores are in airports?",
    "16. What is the distribution by postcode?",
    "17. Are there patterns in store numbers?",
    "18. How many stores are in educational institutions?",
    "19. Store correlation with population density",
    "20. Commercial vs residential location split",
];

static QUESTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[qQ]?(\d{1,2})(?:\.(?:\s|$)|\s*$)").expect("question prefix regex"));

/// What a question renders: a fixed view, or nothing yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestionMapping {
    Mapped(&'static View),
    NotMapped,
}

impl QuestionId {
    pub const ALL: [QuestionId; 20] = [
        QuestionId::Q1,
        QuestionId::Q2,
        QuestionId::Q3,
        QuestionId::Q4,
        QuestionId::Q5,
        QuestionId::Q6,
        QuestionId::Q7,
        QuestionId::Q8,
        QuestionId::Q9,
        QuestionId::Q10,
        QuestionId::Q11,
        QuestionId::Q12,
        QuestionId::Q13,
        QuestionId::Q14,
        QuestionId::Q15,
        QuestionId::Q16,
        QuestionId::Q17,
        QuestionId::Q18,
        QuestionId::Q19,
        QuestionId::Q20,
    ];

    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| QuestionId::ALL.get(i).copied())
    }

    pub fn label(self) -> &'static str {
        QUESTION_LABELS[self as usize]
    }

    pub fn mapping(self) -> QuestionMapping {
        match self {
            QuestionId::Q1 => QuestionMapping::Mapped(&CITY_BAR_TOP_15),
            QuestionId::Q2 => QuestionMapping::Mapped(&CITY_PIE_TOP_10),
            QuestionId::Q3 => QuestionMapping::Mapped(&OWNERSHIP_PIE),
            QuestionId::Q4 => QuestionMapping::Mapped(&TIMEZONE_BAR_ALL),
            _ => QuestionMapping::NotMapped,
        }
    }

    /// Parses `7`, `q7`, `Q7` or a full label such as `7. What is ...`.
    /// The placeholder, `none` and the empty string select no question.
    pub fn parse_selection(input: &str) -> Result<Option<Self>> {
        let trimmed = input.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed == QUESTION_PLACEHOLDER
        {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        QUESTION_PREFIX
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .and_then(QuestionId::from_number)
            .ok_or_else(|| DashboardError::UnknownQuestion(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
}

/// One step of a section: an aggregation paired with the chart that shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    OverviewMetrics,
    Subheader(&'static str),
    Frequency {
        column: &'static str,
        top_n: Option<usize>,
        kind: ChartKind,
        style: ChartStyle,
    },
    CrossTab {
        row_column: &'static str,
        col_column: &'static str,
        style: ChartStyle,
    },
    StoreMap,
}

const fn styled(title: Option<&'static str>, tick_angle: Option<i32>) -> ChartStyle {
    ChartStyle {
        title,
        x_label: None,
        tick_angle,
    }
}

const CITY_BAR_TOP_10: View = View::Frequency {
    column: columns::CITY,
    top_n: Some(10),
    kind: ChartKind::Bar,
    style: styled(None, None),
};

const CITY_BAR_TOP_15: View = View::Frequency {
    column: columns::CITY,
    top_n: Some(15),
    kind: ChartKind::Bar,
    style: styled(Some("Store Distribution by City"), None),
};

const CITY_BAR_TOP_15_ROTATED: View = View::Frequency {
    column: columns::CITY,
    top_n: Some(15),
    kind: ChartKind::Bar,
    style: styled(Some("Store Distribution by City"), Some(45)),
};

const CITY_PIE_TOP_10: View = View::Frequency {
    column: columns::CITY,
    top_n: Some(10),
    kind: ChartKind::Pie,
    style: styled(Some("Top 10 Cities by Store Count"), None),
};

const OWNERSHIP_PIE: View = View::Frequency {
    column: columns::OWNERSHIP_TYPE,
    top_n: None,
    kind: ChartKind::Pie,
    style: styled(Some("Distribution of Store Ownership Types"), None),
};

const TIMEZONE_BAR_TOP_10: View = View::Frequency {
    column: columns::TIMEZONE,
    top_n: Some(10),
    kind: ChartKind::Bar,
    style: styled(Some("Store Distribution by Timezone"), Some(45)),
};

const TIMEZONE_BAR_ALL: View = View::Frequency {
    column: columns::TIMEZONE,
    top_n: None,
    kind: ChartKind::Bar,
    style: styled(Some("Store Distribution by Timezone"), Some(45)),
};

const OWNERSHIP_BY_CITY: View = View::CrossTab {
    row_column: columns::CITY,
    col_column: columns::OWNERSHIP_TYPE,
    style: styled(Some("Ownership Types by City"), Some(45)),
};

const COUNTRY_PIE: View = View::Frequency {
    column: columns::COUNTRY,
    top_n: None,
    kind: ChartKind::Pie,
    style: styled(Some("Store Distribution by Country"), None),
};

const OVERVIEW_VIEWS: &[View] = &[
    View::OverviewMetrics,
    View::Subheader("Top 10 Cities by Number of Stores"),
    CITY_BAR_TOP_10,
];

const STORE_DISTRIBUTION_VIEWS: &[View] = &[TIMEZONE_BAR_TOP_10, CITY_BAR_TOP_15_ROTATED];

const OWNERSHIP_VIEWS: &[View] = &[OWNERSHIP_PIE, OWNERSHIP_BY_CITY];

const LOCATION_VIEWS: &[View] = &[View::StoreMap, COUNTRY_PIE];

/// The two sidebar selectors. Both apply on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SelectionState {
    pub analysis: AnalysisType,
    pub question: Option<QuestionId>,
}

impl SelectionState {
    pub fn new(analysis: AnalysisType, question: Option<QuestionId>) -> Self {
        SelectionState { analysis, question }
    }
}

/// Evaluates the selected analysis section, then the selected question
/// section beneath it. Views are not deduplicated across the two.
pub fn render_page(dataset: &Dataset, selection: &SelectionState) -> Page {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "dispatcher",
        analysis = selection.analysis.slug(),
        question = ?selection.question.map(QuestionId::number),
        "Rendering dashboard"
    );

    let mut page = Page::new(*selection);

    page.sections.push(Section {
        header: selection.analysis.header().to_string(),
        blocks: selection
            .analysis
            .views()
            .iter()
            .map(|view| evaluate(dataset, view))
            .collect(),
    });

    if let Some(question) = selection.question {
        let mut blocks = vec![Block::Subheader(question.label().to_string())];
        match question.mapping() {
            QuestionMapping::Mapped(view) => blocks.push(evaluate(dataset, view)),
            QuestionMapping::NotMapped => {
                info!(
                    action = "skip",
                    component = "dispatcher",
                    question = question.number(),
                    "Question has no mapped analysis"
                );
            }
        }
        page.sections.push(Section {
            header: "Question Analysis".to_string(),
            blocks,
        });
    }

    info!(
        action = "complete",
        component = "dispatcher",
        chart_count = page.charts().count(),
        error_count = page.errors().count(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dashboard rendered"
    );
    page
}

fn evaluate(dataset: &Dataset, view: &View) -> Block {
    match try_evaluate(dataset, view) {
        Ok(block) => block,
        Err(e) => {
            warn!(action = "evaluate", component = "dispatcher", error = %e, "View failed");
            Block::Error(e.to_string())
        }
    }
}

fn try_evaluate(dataset: &Dataset, view: &View) -> Result<Block> {
    let block = match *view {
        View::OverviewMetrics => Block::Metrics(vec![
            Metric {
                label: "Total Stores".to_string(),
                value: row_count(dataset) as u64,
            },
            Metric {
                label: "Total Countries".to_string(),
                value: distinct_count(dataset, columns::COUNTRY)? as u64,
            },
            Metric {
                label: "Total Cities".to_string(),
                value: distinct_count(dataset, columns::CITY)? as u64,
            },
        ]),
        View::Subheader(text) => Block::Subheader(text.to_string()),
        View::Frequency {
            column,
            top_n,
            kind,
            style,
        } => {
            let result = frequency_count(dataset, column, top_n)?;
            if result.is_empty() {
                warn_empty(column);
            }
            Block::Chart(match kind {
                ChartKind::Bar => chart::category_bar(&result, style),
                ChartKind::Pie => chart::category_pie(&result, style),
            })
        }
        View::CrossTab {
            row_column,
            col_column,
            style,
        } => {
            let table = cross_tabulate(dataset, row_column, col_column)?;
            if table.is_empty() {
                warn_empty(row_column);
            }
            Block::Chart(chart::grouped_bar(&table, style))
        }
        View::StoreMap => {
            for column in [
                columns::LATITUDE,
                columns::LONGITUDE,
                columns::STORE_NAME,
                columns::CITY,
                columns::COUNTRY,
            ] {
                dataset.column_index(column)?;
            }
            let records = dataset.store_records()?;
            let map = chart::geo_scatter(&records);
            if map.is_empty() {
                warn_empty(columns::LATITUDE);
            }
            Block::Chart(map)
        }
    };
    Ok(block)
}

fn warn_empty(column: &str) {
    let e = DashboardError::EmptyAggregation(column.to_string());
    warn!(action = "evaluate", component = "dispatcher", error = %e, "Rendering empty chart");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_parse_from_numbers_and_labels() {
        assert_eq!("2".parse::<QuestionId>().unwrap(), QuestionId::Q2);
        assert_eq!("q17".parse::<QuestionId>().unwrap(), QuestionId::Q17);
        assert_eq!(
            QuestionId::Q12.label().parse::<QuestionId>().unwrap(),
            QuestionId::Q12
        );
        assert!("21".parse::<QuestionId>().is_err());
        assert!("0".parse::<QuestionId>().is_err());
        assert!("which city?".parse::<QuestionId>().is_err());
    }

    #[test]
    fn label_prefix_is_not_a_substring_match() {
        // "12." contains "2." but must resolve to question 12
        assert_eq!(
            "12. Are there store clusters in neighborhoods?"
                .parse::<QuestionId>()
                .unwrap(),
            QuestionId::Q12
        );
    }

    #[test]
    fn trailing_junk_after_the_number_is_rejected() {
        assert!("1 2".parse::<QuestionId>().is_err());
        assert!("2.5".parse::<QuestionId>().is_err());
        assert!("3x".parse::<QuestionId>().is_err());
        assert_eq!("3.".parse::<QuestionId>().unwrap(), QuestionId::Q3);
        assert_eq!("Q3 ".parse::<QuestionId>().unwrap(), QuestionId::Q3);
    }

    #[test]
    fn placeholder_selects_nothing() {
        assert_eq!(QuestionId::parse_selection(QUESTION_PLACEHOLDER).unwrap(), None);
        assert_eq!(QuestionId::parse_selection("none").unwrap(), None);
        assert_eq!(QuestionId::parse_selection(" 4 ").unwrap(), Some(QuestionId::Q4));
    }

    #[test]
    fn every_question_round_trips_through_its_number() {
        for q in QuestionId::ALL {
            assert_eq!(QuestionId::from_number(q.number()), Some(q));
            assert!(q.label().starts_with(&format!("{}.", q.number())));
        }
    }

    #[test]
    fn only_first_four_questions_are_mapped() {
        let mapped: Vec<_> = QuestionId::ALL
            .into_iter()
            .filter(|q| matches!(q.mapping(), QuestionMapping::Mapped(_)))
            .collect();
        assert_eq!(
            mapped,
            vec![QuestionId::Q1, QuestionId::Q2, QuestionId::Q3, QuestionId::Q4]
        );
    }

    #[test]
    fn analysis_types_parse_from_slug_or_label() {
        assert_eq!(
            "ownership-analysis".parse::<AnalysisType>().unwrap(),
            AnalysisType::OwnershipAnalysis
        );
        assert_eq!(
            "Location Analysis".parse::<AnalysisType>().unwrap(),
            AnalysisType::LocationAnalysis
        );
        assert!("Sales".parse::<AnalysisType>().is_err());
    }

    #[test]
    fn each_analysis_has_one_or_two_charts() {
        for analysis in AnalysisType::ALL {
            let charts = analysis
                .views()
                .iter()
                .filter(|v| !matches!(v, View::Subheader(_) | View::OverviewMetrics))
                .count();
            assert!((1..=2).contains(&charts), "{analysis} has {charts} charts");
        }
    }
}
