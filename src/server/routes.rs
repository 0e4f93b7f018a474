use crate::dataset::loader::LoadedDataset;
use crate::rebase::{locate, monthly};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

#[derive(Debug, Default, serde::Deserialize)]
pub struct YearQuery {
    /// Omitted means full history.
    pub start_year: Option<i32>,
}

/// GET /api/dashboard -- full dataset rebased to `start_year`
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearQuery>,
    headers: HeaderMap,
) -> Response {
    state.counters.requests_served.fetch_add(1, Relaxed);
    let (base, data) = state.rebased(params.start_year);

    let window = if Arc::ptr_eq(&base.data, &data) {
        "all".to_string()
    } else {
        params.start_year.map(|y| y.to_string()).unwrap_or_else(|| "all".into())
    };
    let etag = format!("\"{}-{window}\"", base.version.fingerprint);

    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));
    if unchanged {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    ([(header::ETAG, etag)], Json(data)).into_response()
}

/// GET /api/statistics -- statistics block only
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearQuery>,
) -> Json<serde_json::Value> {
    state.counters.requests_served.fetch_add(1, Relaxed);
    let (_, data) = state.rebased(params.start_year);
    Json(serde_json::json!(data.statistics))
}

/// GET /api/monthly -- monthly grid plus compounded annual returns
pub async fn get_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearQuery>,
) -> Json<serde_json::Value> {
    state.counters.requests_served.fetch_add(1, Relaxed);
    let (_, data) = state.rebased(params.start_year);
    Json(serde_json::json!({
        "monthly_returns": data.monthly_returns,
        "annual_returns": monthly::annual_returns(&data.monthly_returns),
    }))
}

/// GET /api/years -- selectable start years
pub async fn get_years(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let current = state.current();
    let years = locate::available_years(&current.data.equity_curve.dates);
    Json(serde_json::json!({ "years": years }))
}

/// GET /api/dataset -- version of the dataset in service
pub async fn get_dataset(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(dataset_info(&state.current()))
}

/// POST /api/reload -- re-read the dataset file now
pub async fn post_reload(State(state): State<Arc<AppState>>) -> Response {
    match state.reload(true).await {
        Ok(outcome) => Json(dataset_info(outcome.dataset())).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "manual reload failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "requests_served": state.counters.requests_served.load(Relaxed),
        "cache_hits": state.counters.cache_hits.load(Relaxed),
        "cache_misses": state.counters.cache_misses.load(Relaxed),
        "cache_entries": state.cache.len(),
        "reloads": state.counters.reloads.load(Relaxed),
        "reload_failures": state.counters.reload_failures.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}

/// `If-None-Match` uses weak comparison: `*` matches anything, otherwise any
/// listed tag matches once a `W/` prefix is dropped.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

fn dataset_info(dataset: &LoadedDataset) -> serde_json::Value {
    let data = &dataset.data;
    serde_json::json!({
        "generation": dataset.version.generation,
        "fingerprint": dataset.version.fingerprint,
        "loaded_at": dataset.loaded_at.to_rfc3339(),
        "first_date": data.first_date(),
        "last_date": data.last_date(),
        "points": data.equity_curve.dates.len(),
        "trades": data.per_trade_returns.len(),
    })
}
