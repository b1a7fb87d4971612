pub mod aggregate;
pub mod app;
pub mod args;
pub mod chart;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod menu;
pub mod page;
pub mod render;
pub mod server;
pub mod session;
pub mod utils;

pub use aggregate::{cross_tabulate, frequency_count, AggregationResult, CrossTab};
pub use args::Args;
pub use dataset::{Dataset, StoreRecord};
pub use error::DashboardError;
pub use loader::{DataLoader, DataSource};
pub use menu::{render_page, AnalysisType, QuestionId, SelectionState};
pub use page::Page;
