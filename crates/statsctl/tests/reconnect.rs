//! Reconnect behavior of the push transport against a local server.

use std::time::Duration;

use chrono::NaiveDate;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use stats_common::StatsFilter;
use statsctl::transport::{run_websocket, FilterHandle, TransportEvent};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Accepts one WebSocket connection, returns the first text frame the
/// client sent, then drops the connection.
async fn accept_and_read_filter(listener: &TcpListener) -> StatsFilter {
    let (stream, _) = listener.accept().await.unwrap();
    let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
    loop {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Close(_) => panic!("client closed before sending a filter"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn reconnect_resends_the_confirmed_filter_not_the_default() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let default = StatsFilter::default_range(d("2026-08-30"));
    let (handle, filter_rx) = FilterHandle::new(default.clone());

    // A user-confirmed range, applied before the first connection.
    let confirmed = StatsFilter::new(d("2026-03-01"), Some(d("2026-03-31")));
    handle.confirm(confirmed.clone());

    let (events_tx, mut events_rx) = mpsc::channel::<TransportEvent>(32);
    let transport = tokio::spawn(run_websocket(
        format!("ws://{addr}"),
        filter_rx,
        events_tx,
        Duration::from_millis(50),
    ));

    // First connection opens with the confirmed filter.
    let first = accept_and_read_filter(&listener).await;
    assert_eq!(first, confirmed);
    assert_ne!(first, default);

    // The connection was dropped server-side; after the backoff the
    // client reconnects and sends the confirmed filter again.
    let second = accept_and_read_filter(&listener).await;
    assert_eq!(second, confirmed);

    // Both connection cycles were reported.
    let mut connects = 0;
    while let Ok(event) = events_rx.try_recv() {
        if matches!(event, TransportEvent::Connected) {
            connects += 1;
        }
    }
    assert_eq!(connects, 2);

    transport.abort();
}

#[tokio::test]
async fn filter_change_is_pushed_on_the_open_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (handle, filter_rx) = FilterHandle::new(StatsFilter::default_range(d("2026-08-30")));
    let (events_tx, _events_rx) = mpsc::channel::<TransportEvent>(32);
    let transport = tokio::spawn(run_websocket(
        format!("ws://{addr}"),
        filter_rx,
        events_tx,
        Duration::from_millis(50),
    ));

    let (stream, _) = listener.accept().await.unwrap();
    let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

    // Initial frame carries the current filter.
    let Message::Text(_) = socket.next().await.unwrap().unwrap() else {
        panic!("expected the initial filter frame");
    };

    let updated = StatsFilter::new(d("2026-06-01"), None);
    handle.confirm(updated.clone());

    let Message::Text(text) = socket.next().await.unwrap().unwrap() else {
        panic!("expected the updated filter frame");
    };
    let received: StatsFilter = serde_json::from_str(&text).unwrap();
    assert_eq!(received, updated);

    transport.abort();
}
