// Home route: runs the read-latency benchmark, then renders the home page

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storeprobe_core::BenchmarkRunner;

use crate::error::ApiError;
use crate::views::ViewRenderer;

/// Repetitions per scenario when `times` is not given
pub const DEFAULT_TIMES: u32 = 100;

/// App state for home routes
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<BenchmarkRunner>,
    pub views: Arc<ViewRenderer>,
}

impl AppState {
    pub fn new(runner: BenchmarkRunner, views: ViewRenderer) -> Self {
        Self {
            runner: Arc::new(runner),
            views: Arc::new(views),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// Repetitions per scenario; kept as text so bad input gets our own 400
    pub times: Option<String>,
}

#[derive(Serialize)]
struct HomeView {
    page_title: &'static str,
    heading: &'static str,
}

/// Create home routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .with_state(state)
}

/// GET / - Benchmark store reads and render the home page
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> Result<Html<String>, ApiError> {
    let times = parse_times(query.times.as_deref())?;

    let report = state.runner.run(times).await?;
    tracing::debug!(
        total_reads = report.total_reads(),
        scenarios = report.results.len(),
        "Benchmark finished"
    );

    let html = state.views.render(
        "home/index",
        HomeView {
            page_title: "Home",
            heading: "Home",
        },
    )?;
    Ok(Html(html))
}

/// Parse the `times` parameter.
///
/// Absent means the default; anything that is not a non-negative whole
/// number (including the empty string) is rejected.
pub fn parse_times(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        None => Ok(DEFAULT_TIMES),
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| ApiError::InvalidParameter("times")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_times_default() {
        assert_eq!(parse_times(None).unwrap(), 100);
    }

    #[test]
    fn test_parse_times_numbers() {
        assert_eq!(parse_times(Some("0")).unwrap(), 0);
        assert_eq!(parse_times(Some("5")).unwrap(), 5);
        assert_eq!(parse_times(Some(" 12 ")).unwrap(), 12);
    }

    #[test]
    fn test_parse_times_rejects_non_numbers() {
        for raw in ["abc", "", "   ", "12x", "1.5", "-3", "NaN"] {
            assert!(
                matches!(parse_times(Some(raw)), Err(ApiError::InvalidParameter("times"))),
                "{:?} should be rejected",
                raw
            );
        }
    }
}
