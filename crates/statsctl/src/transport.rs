//! Transports for the dashboard: WebSocket push with reconnect, and a
//! polling fallback over the statistics endpoint.
//!
//! Both transports emit the same `TransportEvent` stream, so the
//! orchestrator never knows which one is active. Exactly one transport
//! runs per dashboard instance.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use stats_common::{ServerFrame, StatsError, StatsFilter, StatsPayload, StatsUpdate};

/// Fixed reconnect backoff for the push channel, and the poll period
/// for the fallback transport.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(10);
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What a transport reports back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A payload together with the generation of the filter it was
    /// requested under, so stale responses can be discarded.
    Payload {
        payload: StatsPayload,
        generation: u64,
    },
    /// Application-level error reported by the aggregator.
    ServerError(String),
}

/// The confirmed filter, bumped on every successful apply/reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedFilter {
    pub filter: StatsFilter,
    pub generation: u64,
}

/// Shared handle over the confirmed filter. Transports watch it;
/// reconnects resend whatever is confirmed at that moment, never the
/// default.
#[derive(Clone)]
pub struct FilterHandle {
    tx: watch::Sender<ConfirmedFilter>,
}

impl FilterHandle {
    pub fn new(initial: StatsFilter) -> (Self, watch::Receiver<ConfirmedFilter>) {
        let (tx, rx) = watch::channel(ConfirmedFilter {
            filter: initial,
            generation: 0,
        });
        (Self { tx }, rx)
    }

    pub fn current(&self) -> ConfirmedFilter {
        self.tx.borrow().clone()
    }

    /// Confirms a new filter and bumps the generation.
    pub fn confirm(&self, filter: StatsFilter) {
        self.tx.send_modify(|confirmed| {
            confirmed.filter = filter;
            confirmed.generation += 1;
        });
    }
}

/// Push transport: connect, send the confirmed filter, forward frames;
/// reconnect after the fixed backoff for as long as the event channel
/// stays open.
pub async fn run_websocket(
    url: String,
    mut filter_rx: watch::Receiver<ConfirmedFilter>,
    events: mpsc::Sender<TransportEvent>,
    backoff: Duration,
) {
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                if events.send(TransportEvent::Connected).await.is_err() {
                    return;
                }
                if let Err(err) = drive_socket(stream, &mut filter_rx, &events).await {
                    debug!("stats socket dropped: {err}");
                }
                if events.send(TransportEvent::Disconnected).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!("stats socket connect failed: {err}");
            }
        }
        if events.is_closed() {
            return;
        }
        tokio::time::sleep(backoff).await;
    }
}

async fn drive_socket<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    filter_rx: &mut watch::Receiver<ConfirmedFilter>,
    events: &mpsc::Sender<TransportEvent>,
) -> Result<(), StatsError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = stream.split();

    // On open, immediately send the confirmed filter.
    let confirmed = filter_rx.borrow_and_update().clone();
    let mut generation = confirmed.generation;
    send_filter(&mut write, &confirmed.filter).await?;

    loop {
        tokio::select! {
            changed = filter_rx.changed() => {
                if changed.is_err() {
                    // Filter handle dropped; dashboard is going away.
                    return Ok(());
                }
                let confirmed = filter_rx.borrow_and_update().clone();
                generation = confirmed.generation;
                send_filter(&mut write, &confirmed.filter).await?;
            }
            frame = read.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                match frame.map_err(|err| StatsError::Transport(err.to_string()))? {
                    Message::Text(text) => forward_frame(&text, generation, events).await,
                    Message::Close(_) => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

async fn send_filter<W>(write: &mut W, filter: &StatsFilter) -> Result<(), StatsError>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    let text = serde_json::to_string(filter)?;
    write
        .send(Message::Text(text))
        .await
        .map_err(|err| StatsError::Transport(err.to_string()))
}

/// Malformed frames are logged and dropped; they never reach the
/// orchestrator and never tear anything down.
async fn forward_frame(text: &str, generation: u64, events: &mpsc::Sender<TransportEvent>) {
    match ServerFrame::parse(text) {
        Ok(StatsUpdate::Payload(payload)) => {
            let _ = events
                .send(TransportEvent::Payload {
                    payload,
                    generation,
                })
                .await;
        }
        Ok(StatsUpdate::Error(message)) => {
            let _ = events.send(TransportEvent::ServerError(message)).await;
        }
        Err(err) => {
            warn!("dropping malformed stats frame: {err}");
        }
    }
}

/// Pull transport: same filter contract, same payload shape, fixed
/// interval. Fetch errors are logged and skipped so the dashboard
/// keeps its last known good state.
pub async fn run_polling(
    base_url: String,
    mut filter_rx: watch::Receiver<ConfirmedFilter>,
    events: mpsc::Sender<TransportEvent>,
    interval: Duration,
) {
    let client = reqwest::Client::new();
    if events.send(TransportEvent::Connected).await.is_err() {
        return;
    }

    loop {
        let confirmed = filter_rx.borrow_and_update().clone();
        match fetch_statistics(&client, &base_url, &confirmed.filter).await {
            Ok(StatsUpdate::Payload(payload)) => {
                if events
                    .send(TransportEvent::Payload {
                        payload,
                        generation: confirmed.generation,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Ok(StatsUpdate::Error(message)) => {
                if events
                    .send(TransportEvent::ServerError(message))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(err) => {
                warn!("statistics fetch failed: {err}");
            }
        }

        // Sleep until the next poll, or refetch immediately on a
        // filter change.
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = filter_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// One GET against the statistics endpoint. Shared with the `dump`
/// subcommand.
pub async fn fetch_statistics(
    client: &reqwest::Client,
    base_url: &str,
    filter: &StatsFilter,
) -> Result<StatsUpdate, StatsError> {
    let url = format!(
        "{}/api/v1/report/statistics/?{}",
        base_url.trim_end_matches('/'),
        filter.to_query()
    );
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|err| StatsError::Transport(err.to_string()))?;
    if !response.status().is_success() {
        return Err(StatsError::Transport(format!(
            "statistics endpoint returned {}",
            response.status()
        )));
    }
    let text = response
        .text()
        .await
        .map_err(|err| StatsError::Transport(err.to_string()))?;
    ServerFrame::parse(&text)
}

/// `http(s)://host` becomes `ws(s)://host/ws/incidents/stats/`.
pub fn websocket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{base}")
    };
    format!("{ws_base}/ws/incidents/stats/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_swaps_scheme_and_appends_path() {
        assert_eq!(
            websocket_url("http://127.0.0.1:8787"),
            "ws://127.0.0.1:8787/ws/incidents/stats/"
        );
        assert_eq!(
            websocket_url("https://stats.example.org/"),
            "wss://stats.example.org/ws/incidents/stats/"
        );
    }

    #[test]
    fn confirm_bumps_generation_and_keeps_the_filter() {
        let initial = StatsFilter::default_range("2026-08-30".parse().unwrap());
        let (handle, rx) = FilterHandle::new(initial);
        assert_eq!(handle.current().generation, 0);

        let custom = StatsFilter::new("2026-08-01".parse().unwrap(), None);
        handle.confirm(custom.clone());
        assert_eq!(handle.current().generation, 1);
        assert_eq!(rx.borrow().filter, custom);
    }
}
