//! API routes: statistics report, incident read API, health, and the
//! WebSocket push channel.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use stats_common::envelope::WrappedFrame;
use stats_common::{IncidentRecord, ReportingPeriod, StatsFilter, StatsPayload};

use crate::aggregate::aggregate;
use crate::server::{AppState, AppStateArc};

pub fn api_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/report/statistics/", get(statistics_report))
        .route("/api/v1/incidents/", get(incidents))
}

pub fn ws_routes() -> Router<AppStateArc> {
    Router::new().route("/ws/incidents/stats/", get(stats_stream))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    incidents: usize,
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        incidents: state.store.len(),
    })
}

#[derive(Debug, Deserialize)]
struct FilterQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl FilterQuery {
    /// Missing start date falls back to the default reporting range.
    fn into_filter(self, today: NaiveDate) -> StatsFilter {
        match self.start_date {
            Some(start) => StatsFilter::new(start, self.end_date),
            None => StatsFilter::default_range(today),
        }
    }
}

/// GET /api/v1/report/statistics/?start_date=YYYY-MM-DD[&end_date=...]
async fn statistics_report(
    State(state): State<AppStateArc>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<WrappedFrame>, (StatusCode, String)> {
    let now = Utc::now();
    let filter = query.into_filter(now.date_naive());
    filter
        .validate()
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    let payload = compute_payload(&state, &filter, now);
    Ok(Json(WrappedFrame::new(&payload, now)))
}

#[derive(Debug, Deserialize)]
struct IncidentsQuery {
    #[serde(default)]
    last_month: Option<bool>,
}

/// GET /api/v1/incidents/[?last_month=true] - incident read API,
/// newest first.
async fn incidents(
    State(state): State<AppStateArc>,
    Query(query): Query<IncidentsQuery>,
) -> Json<Vec<IncidentRecord>> {
    let mut records: Vec<IncidentRecord> = if query.last_month.unwrap_or(false) {
        state
            .store
            .last_month(Utc::now().date_naive())
            .into_iter()
            .cloned()
            .collect()
    } else {
        state.store.all().to_vec()
    };
    records.sort_by(|a, b| {
        b.incident_date
            .cmp(&a.incident_date)
            .then(b.id.cmp(&a.id))
    });
    Json(records)
}

pub(crate) fn compute_payload(
    state: &AppState,
    filter: &StatsFilter,
    now: DateTime<Utc>,
) -> StatsPayload {
    let records = state.store.in_range(filter);
    let period = ReportingPeriod {
        from: filter.start_date,
        to: filter.end_date,
    };
    aggregate(&records, &state.config.sla, now, period)
}

/// GET /ws/incidents/stats/ - WebSocket upgrade for the push channel.
async fn stats_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppStateArc>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| push_loop(socket, state))
}

/// Per-connection push loop. Recomputes the payload on a fixed tick
/// and sends it only when it differs from the last frame sent on this
/// connection; a client filter frame retargets the stream and
/// triggers an immediate recompute. Filter problems produce an error
/// frame and keep the previous filter; they never close the stream.
async fn push_loop(mut socket: WebSocket, state: AppStateArc) {
    let mut filter = StatsFilter::default_range(Utc::now().date_naive());
    let mut last_sent: Option<String> = None;
    let mut ticker =
        tokio::time::interval(Duration::from_secs(state.config.push_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !push_stats(&mut socket, &state, &filter, &mut last_sent).await {
                    break;
                }
            }
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match parse_filter(&text) {
                            Ok(new_filter) => {
                                filter = new_filter;
                                if !push_stats(&mut socket, &state, &filter, &mut last_sent).await {
                                    break;
                                }
                            }
                            Err(msg) => {
                                warn!("rejecting filter frame: {msg}");
                                if send_error(&mut socket, &msg).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!("stats socket read error: {err}");
                        break;
                    }
                }
            }
        }
    }
    debug!("stats socket closed");
}

fn parse_filter(text: &str) -> Result<StatsFilter, String> {
    let filter: StatsFilter =
        serde_json::from_str(text).map_err(|err| format!("malformed filter frame: {err}"))?;
    filter.validate().map_err(|err| err.to_string())?;
    Ok(filter)
}

/// Returns false once the socket is gone.
async fn push_stats(
    socket: &mut WebSocket,
    state: &AppState,
    filter: &StatsFilter,
    last_sent: &mut Option<String>,
) -> bool {
    let now = Utc::now();
    let payload = compute_payload(state, filter, now);

    // Dedup on the payload alone; the frame's generated_at timestamp
    // changes every tick and must not defeat the comparison.
    let signature = match serde_json::to_string(&payload) {
        Ok(signature) => signature,
        Err(err) => {
            warn!("failed to serialize statistics: {err}");
            return send_error(socket, "Failed to load statistics").await.is_ok();
        }
    };
    if last_sent.as_deref() == Some(signature.as_str()) {
        return true;
    }

    let frame = WrappedFrame::new(&payload, now);
    let text = match serde_json::to_string(&frame) {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to serialize statistics frame: {err}");
            return send_error(socket, "Failed to load statistics").await.is_ok();
        }
    };

    if socket.send(Message::Text(text)).await.is_err() {
        return false;
    }
    *last_sent = Some(signature);
    true
}

async fn send_error(socket: &mut WebSocket, message: &str) -> Result<(), axum::Error> {
    let frame = serde_json::json!({ "error": message });
    socket.send(Message::Text(frame.to_string())).await
}
