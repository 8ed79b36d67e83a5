//! Reconnecting link to the local desktop automation helper.
//!
//! One JSON message per command, newline-delimited, over a point-to-point
//! TCP connection. The link task owns the socket: it reconnects on a fixed
//! delay after any disconnect, and while disconnected commands are dropped
//! at the send site rather than queued. Sends are fire-and-forget; nothing
//! here can fail into the frame loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::config::LinkConfig;
use crate::events::EngineEvent;

/// Cheap cloneable sender half. Dropping a command while the helper is
/// unreachable is deliberate; stale pointer moves are worse than lost ones.
#[derive(Clone)]
pub struct ActuatorHandle {
    tx: mpsc::UnboundedSender<Command>,
    connected: Arc<AtomicBool>,
}

impl ActuatorHandle {
    pub fn send(&self, command: Command) {
        if !self.connected.load(Ordering::Relaxed) {
            return;
        }
        let _ = self.tx.send(command);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// A handle wired to a plain channel, for exercising components that
    /// dispatch commands without a live socket.
    #[cfg(test)]
    pub(crate) fn for_tests() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                connected: Arc::new(AtomicBool::new(true)),
            },
            rx,
        )
    }
}

pub struct ActuatorLink {
    handle: ActuatorHandle,
    task: JoinHandle<()>,
}

impl ActuatorLink {
    /// Spawn the link task. It keeps trying to reach the helper until the
    /// token is cancelled.
    pub fn spawn(
        config: LinkConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(link_loop(
            config,
            rx,
            Arc::clone(&connected),
            events,
            cancel,
        ));

        Self {
            handle: ActuatorHandle { tx, connected },
            task,
        }
    }

    pub fn handle(&self) -> ActuatorHandle {
        self.handle.clone()
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn link_loop(
    config: LinkConfig,
    mut rx: mpsc::UnboundedReceiver<Command>,
    connected: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
) {
    let reconnect_delay = Duration::from_secs(config.reconnect_delay_secs);

    loop {
        let stream = tokio::select! {
            _ = cancel.cancelled() => break,
            result = TcpStream::connect(&config.addr) => result,
        };

        match stream {
            Ok(stream) => {
                info!("Connected to desktop helper at {}", config.addr);
                connected.store(true, Ordering::Relaxed);
                let _ = events.send(EngineEvent::LinkStatus { connected: true });

                run_connection(stream, &mut rx, &cancel).await;

                connected.store(false, Ordering::Relaxed);
                let _ = events.send(EngineEvent::LinkStatus { connected: false });
                if cancel.is_cancelled() {
                    break;
                }
                warn!("Desktop helper disconnected, retrying");
            }
            Err(err) => {
                debug!("Desktop helper unreachable ({err}), retrying");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(reconnect_delay) => {}
        }
    }
}

/// Pump commands onto one live connection until it drops. The helper
/// acknowledges each command; acknowledgements are drained and discarded.
async fn run_connection(
    stream: TcpStream,
    rx: &mut mpsc::UnboundedReceiver<Command>,
    cancel: &CancellationToken,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            line = reader.next_line() => {
                match line {
                    Ok(Some(ack)) => debug!("Helper ack: {ack}"),
                    // EOF or read error: the connection is gone.
                    Ok(None) | Err(_) => return,
                }
            }
            command = rx.recv() => {
                let Some(command) = command else { return };
                let mut payload = match serde_json::to_vec(&command) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!("Failed to encode command: {err}");
                        continue;
                    }
                };
                payload.push(b'\n');
                if write_half.write_all(&payload).await.is_err() {
                    return;
                }
                if !command.is_move() {
                    debug!("Sent {}", command.describe());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{MouseButton, SwipeDirection};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_commands_flow_to_helper_as_json_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let link = ActuatorLink::spawn(
            LinkConfig {
                addr,
                reconnect_delay_secs: 1,
            },
            events_tx,
            cancel.clone(),
        );
        let handle = link.handle();

        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(socket).lines();

        // Wait for the link to report itself connected before sending.
        loop {
            match events_rx.recv().await {
                Some(EngineEvent::LinkStatus { connected: true }) => break,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }

        handle.send(Command::Click {
            button: MouseButton::Left,
        });
        handle.send(Command::SwitchDesktop {
            direction: SwipeDirection::Left,
        });

        let first = lines.next_line().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["type"], "click");
        assert_eq!(value["button"], "left");

        let second = lines.next_line().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["type"], "switch_desktop");

        cancel.cancel();
        link.join().await;
    }

    #[tokio::test]
    async fn test_commands_dropped_while_disconnected() {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        // Nothing listens here; the link stays disconnected.
        let link = ActuatorLink::spawn(
            LinkConfig {
                addr: "127.0.0.1:1".to_string(),
                reconnect_delay_secs: 1,
            },
            events_tx,
            cancel.clone(),
        );
        let handle = link.handle();

        assert!(!handle.is_connected());
        // Dropped silently, no panic, no queueing.
        handle.send(Command::Click {
            button: MouseButton::Left,
        });

        cancel.cancel();
        link.join().await;
    }
}
