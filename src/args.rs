use clap::Parser;
use std::path::PathBuf;

use crate::loader::DEFAULT_SOURCE;
use crate::menu::AnalysisType;
use crate::render::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "storemap",
    about = "Explore store locations through a menu of precomputed charts",
    version,
    long_about = None
)]
pub struct Args {
    /// CSV source: http(s) URL, file URL or local path
    #[arg(short, long, default_value = DEFAULT_SOURCE)]
    pub source: String,

    /// Analysis section to render
    #[arg(short, long, value_enum, default_value = "overview")]
    pub analysis: AnalysisType,

    /// Question to answer below the section (1-20, q7, or the full label)
    #[arg(short, long)]
    pub question: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the rendered page to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the question menu and exit
    #[arg(long)]
    pub list_questions: bool,

    /// Read selector commands from stdin and re-render after each one
    #[arg(short, long)]
    pub interactive: bool,

    /// Serve the dashboard over HTTP on localhost
    #[arg(long)]
    pub serve: bool,

    /// Port for --serve
    #[arg(long, default_value_t = 8501)]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of aggregation worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,
}
