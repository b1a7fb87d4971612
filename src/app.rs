use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::time::Instant;
use tracing::info;

use crate::loader::{self, DataSource, DefaultFetcher};
use crate::menu::{render_page, QuestionId, SelectionState};
use crate::render::render;
use crate::session::{question_menu, Session};
use crate::{server, Args};

pub fn selection_from_args(args: &Args) -> Result<SelectionState> {
    let question = match args.question.as_deref() {
        Some(value) => QuestionId::parse_selection(value)?,
        None => None,
    };
    Ok(SelectionState::new(args.analysis, question))
}

fn configure_workers(workers: Option<usize>) -> Result<()> {
    let worker_count = workers.unwrap_or_else(|| {
        let cpu_count = num_cpus::get();
        std::cmp::min(cpu_count, 8)
    });

    rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build_global()
        .context("Failed to configure aggregation workers")?;

    info!(action = "configure", component = "aggregation", worker_count, "Using workers for aggregation");
    Ok(())
}

pub fn run(args: &Args) -> Result<()> {
    if args.list_questions {
        println!("{}", question_menu());
        return Ok(());
    }

    let total_start_time = Instant::now();
    let selection = selection_from_args(args)?;
    configure_workers(args.workers)?;

    let source = DataSource::parse(&args.source);
    let dataset = loader::session_dataset(&DefaultFetcher, &source)
        .with_context(|| format!("Store data could not be loaded from {}", source))?;

    if args.serve {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        return runtime.block_on(server::start_server(dataset, args.port));
    }

    if args.interactive {
        let stdin = io::stdin();
        let stdout = io::stdout();
        return Session::new(dataset, selection).run(stdin.lock(), stdout.lock());
    }

    let page = render_page(dataset, &selection);
    let rendered = render(&page, args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write page to {:?}", path))?;
            info!(action = "write", component = "output", file_path = ?path, "Page written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("Failed to write page to stdout")?;
        }
    }

    info!(
        action = "complete",
        component = "dashboard",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Dashboard run completed"
    );
    Ok(())
}
