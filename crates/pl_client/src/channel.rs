//! Realtime delivery channel: one WebSocket to the relay, with
//! automatic reconnect.
//!
//! Reconnect policy: exponential backoff from 1s, doubling per
//! consecutive failure, capped at 3s. The failure counter resets only
//! on a successful open; losing an open connection counts as a failure
//! like any other, so the next attempt waits at least the base delay.
//!
//! Sends are best-effort. A frame submitted while the channel is not
//! Open is dropped (never queued) — the durable store is the source of
//! truth, realtime is an optimisation.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};

use pl_proto::OutboundFrame;

use crate::pipeline::InboundPipeline;
use crate::services::RealtimeSender;

/// Consumes raw inbound text frames. The production implementation is
/// [`InboundPipeline`].
pub trait InboundHandler: Send + Sync {
    fn handle_text(&self, raw: &str);
}

impl InboundHandler for InboundPipeline {
    fn handle_text(&self, raw: &str) {
        InboundPipeline::handle_text(self, raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

const RETRY_BASE: Duration = Duration::from_secs(1);
const RETRY_CAP: Duration = Duration::from_secs(3);

/// Delay scheduled after failure number `consecutive_failures`:
/// `min(cap, base * 2^(n-1))`.
pub fn retry_delay(consecutive_failures: u32) -> Duration {
    let factor = 1u32 << consecutive_failures.saturating_sub(1).min(16);
    RETRY_CAP.min(RETRY_BASE * factor)
}

enum Command {
    Send(OutboundFrame),
    Shutdown,
}

/// Handle to the background channel task.
pub struct DeliveryChannel {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ChannelState>,
    task: tokio::task::JoinHandle<()>,
}

impl DeliveryChannel {
    /// Spawn the connect loop. Must be called from within a tokio
    /// runtime.
    pub fn connect(url: String, handler: Arc<dyn InboundHandler>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let task = tokio::spawn(run(url, handler, cmd_rx, state_tx));
        Self {
            commands: cmd_tx,
            state: state_rx,
            task,
        }
    }

    /// The relay endpoint for one user's inbox.
    pub fn ws_url(ws_base_url: &str, username: &str) -> String {
        format!("{}/ws/{}", ws_base_url.trim_end_matches('/'), username)
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Watch state transitions, e.g. to surface connectivity in a UI.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Request shutdown and wait for the task to report Disconnected.
    pub async fn close(&self) {
        let _ = self.commands.send(Command::Shutdown);
        let mut rx = self.state.clone();
        loop {
            if *rx.borrow() == ChannelState::Disconnected {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl RealtimeSender for DeliveryChannel {
    fn send_frame(&self, frame: OutboundFrame) {
        let state = self.state();
        if state != ChannelState::Open {
            tracing::debug!(event = "realtime_send_dropped", to = %frame.to, state = ?state);
            return;
        }
        if self.commands.send(Command::Send(frame)).is_err() {
            tracing::debug!(event = "realtime_send_dropped", reason = "channel task gone");
        }
    }
}

impl Drop for DeliveryChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    url: String,
    handler: Arc<dyn InboundHandler>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ChannelState>,
) {
    let mut failures: u32 = 0;
    loop {
        let _ = state.send(ChannelState::Connecting);
        match connect_async(url.as_str()).await {
            Ok((mut ws, _)) => {
                failures = 0;
                let _ = state.send(ChannelState::Open);
                tracing::info!(event = "channel_open", url = %url);
                let shutdown = serve(&mut ws, handler.as_ref(), &mut commands).await;
                if shutdown {
                    let _ = state.send(ChannelState::Closing);
                    let _ = ws.close(None).await;
                    break;
                }
                // An involuntary close counts against the backoff too;
                // only a successful open clears the counter.
                failures += 1;
                tracing::warn!(event = "channel_lost", url = %url);
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(event = "channel_connect_failed", attempt = failures, error = %err);
            }
        }
        let _ = state.send(ChannelState::Disconnected);
        if backoff(&mut commands, retry_delay(failures)).await {
            return;
        }
    }
    let _ = state.send(ChannelState::Disconnected);
}

/// Wait out the retry delay, dropping stray sends and honouring
/// shutdown. Returns true if the loop should exit.
async fn backoff(commands: &mut mpsc::UnboundedReceiver<Command>, delay: Duration) -> bool {
    let deadline = tokio::time::sleep(delay);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => return false,
            cmd = commands.recv() => match cmd {
                None | Some(Command::Shutdown) => return true,
                Some(Command::Send(frame)) => {
                    tracing::debug!(event = "realtime_send_dropped", to = %frame.to, state = "disconnected");
                }
            },
        }
    }
}

/// Pump one open connection. Returns true on shutdown request, false
/// when the connection is lost and should be re-established.
async fn serve<S>(
    ws: &mut WebSocketStream<S>,
    handler: &dyn InboundHandler,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> bool
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                None | Some(Command::Shutdown) => return true,
                Some(Command::Send(frame)) => {
                    match serde_json::to_string(&frame) {
                        Ok(text) => {
                            if let Err(err) = ws.send(Message::Text(text)).await {
                                tracing::warn!(event = "realtime_send_failed", to = %frame.to, error = %err);
                                return false;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(event = "frame_encode_failed", error = %err);
                        }
                    }
                }
            },
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => handler.handle_text(&text),
                Some(Ok(Message::Close(_))) | None => return false,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(event = "channel_read_failed", error = %err);
                    return false;
                }
            },
        }
    }
}
