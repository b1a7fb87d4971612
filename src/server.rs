use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::dataset::Dataset;
use crate::error::DashboardError;
use crate::menu::{render_page, AnalysisType, QuestionId, SelectionState};
use crate::page::Page;
use crate::render::render_html;

pub struct AppState {
    pub dataset: &'static Dataset,
}

/// Query string carrying the two sidebar selectors.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    pub analysis: Option<String>,
    pub question: Option<String>,
}

impl SelectionParams {
    pub fn selection(&self) -> Result<SelectionState, DashboardError> {
        let analysis = match self.analysis.as_deref() {
            Some(value) => value.parse::<AnalysisType>()?,
            None => AnalysisType::default(),
        };
        let question = match self.question.as_deref() {
            Some(value) => QuestionId::parse_selection(value)?,
            None => None,
        };
        Ok(SelectionState::new(analysis, question))
    }
}

pub fn router(dataset: &'static Dataset) -> Router {
    let state = Arc::new(AppState { dataset });
    Router::new()
        .route("/", get(page_handler))
        .route("/api/page", get(api_handler))
        .with_state(state)
}

pub async fn start_server(dataset: &'static Dataset, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(action = "listen", component = "server", address = %addr, "Dashboard available");
    println!("Dashboard running at http://{}", addr);

    axum::serve(listener, router(dataset))
        .await
        .context("Dashboard server stopped unexpectedly")?;
    Ok(())
}

/// Each request re-runs the dispatcher against the cached dataset.
async fn build_page(state: Arc<AppState>, params: SelectionParams) -> Result<Page, Response> {
    let selection = params
        .selection()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;

    tokio::task::spawn_blocking(move || render_page(state.dataset, &selection))
        .await
        .map_err(|e| {
            error!(action = "render", component = "server", error = %e, "Render task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Response {
    match build_page(state, params).await {
        Ok(page) => Html(render_html(&page)).into_response(),
        Err(response) => response,
    }
}

async fn api_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Response {
    match build_page(state, params).await {
        Ok(page) => Json(page).into_response(),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_the_default_selection() {
        let params = SelectionParams::default();
        assert_eq!(params.selection().unwrap(), SelectionState::default());
    }

    #[test]
    fn query_values_map_to_selectors() {
        let params = SelectionParams {
            analysis: Some("location-analysis".into()),
            question: Some("2".into()),
        };
        assert_eq!(
            params.selection().unwrap(),
            SelectionState::new(AnalysisType::LocationAnalysis, Some(QuestionId::Q2))
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        let params = SelectionParams {
            analysis: None,
            question: Some("42".into()),
        };
        assert!(matches!(
            params.selection(),
            Err(DashboardError::UnknownQuestion(_))
        ));
    }
}
