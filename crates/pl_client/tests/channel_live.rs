//! Delivery channel against a real in-process WebSocket server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use pl_client::{ChannelState, DeliveryChannel, InboundHandler, RealtimeSender};
use pl_proto::OutboundFrame;

struct Recorder {
    frames: Mutex<Vec<String>>,
}

impl InboundHandler for Recorder {
    fn handle_text(&self, raw: &str) {
        self.frames.lock().push(raw.to_string());
    }
}

fn frame(to: &str) -> OutboundFrame {
    OutboundFrame {
        to: to.to_string(),
        text: "{}".to_string(),
        file_info: None,
    }
}

async fn wait_for_state(channel: &DeliveryChannel, wanted: ChannelState) {
    let mut state = channel.watch_state();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == wanted))
        .await
        .expect("state transition timed out")
        .expect("channel task gone");
}

#[tokio::test]
async fn opens_receives_sends_and_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(
            r#"{"from":"alice","text":"{}"}"#.to_string(),
        ))
        .await
        .unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("connection ended early: {other:?}"),
            }
        }
    });

    let handler = Arc::new(Recorder { frames: Mutex::new(Vec::new()) });
    let channel = DeliveryChannel::connect(format!("ws://{addr}"), Arc::clone(&handler) as Arc<dyn InboundHandler>);

    wait_for_state(&channel, ChannelState::Open).await;
    channel.send_frame(frame("bob"));

    let received = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(received.contains(r#""to":"bob""#));

    // The server's frame reached the handler.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if !handler.frames.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert!(handler.frames.lock()[0].contains("alice"));

    channel.close().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn sends_while_disconnected_are_dropped() {
    // Nobody listening here.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handler = Arc::new(Recorder { frames: Mutex::new(Vec::new()) });
    let channel = DeliveryChannel::connect(format!("ws://{addr}"), Arc::clone(&handler) as Arc<dyn InboundHandler>);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_ne!(channel.state(), ChannelState::Open);
    // Dropped silently, never queued.
    channel.send_frame(frame("bob"));
    channel.close().await;
}

#[tokio::test]
async fn dropped_connection_backs_off_before_retrying() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // A relay mid-restart: accepts the handshake, then closes at once.
    let attempts = Arc::new(AtomicUsize::new(0));
    let server_attempts = Arc::clone(&attempts);
    let server = tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            server_attempts.fetch_add(1, Ordering::SeqCst);
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.close(None).await;
        }
    });

    let handler = Arc::new(Recorder { frames: Mutex::new(Vec::new()) });
    let channel = DeliveryChannel::connect(format!("ws://{addr}"), Arc::clone(&handler) as Arc<dyn InboundHandler>);

    // 1.5s fits the first attempt plus the 1s-delayed retry; the next
    // retry lands at 3s. A zero-delay loop would rack up hundreds.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let seen = attempts.load(Ordering::SeqCst);
    assert!(
        (2..=3).contains(&seen),
        "expected a base-delayed retry after the drop, saw {seen} attempts"
    );

    channel.close().await;
    server.abort();
}

#[tokio::test]
async fn reconnects_once_the_server_appears() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handler = Arc::new(Recorder { frames: Mutex::new(Vec::new()) });
    let channel = DeliveryChannel::connect(format!("ws://{addr}"), Arc::clone(&handler) as Arc<dyn InboundHandler>);

    // Let at least one connect attempt fail.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_ne!(channel.state(), ChannelState::Open);

    let listener = TcpListener::bind(addr).await.unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Hold the connection open until the test ends.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut state = channel.watch_state();
    tokio::time::timeout(
        Duration::from_secs(10),
        state.wait_for(|s| *s == ChannelState::Open),
    )
    .await
    .expect("never reconnected")
    .unwrap();

    channel.close().await;
    server.abort();
}
