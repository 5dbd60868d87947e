//! WebSocket transport
//!
//! Concrete live transport: a WebSocket listener whose clients join rooms
//! by sending `{"join":"<room>"}` text frames and receive pushed events as
//! `{"event":"<name>","data":{...}}` frames. Each client gets an unbounded
//! mailbox drained by its own task, so a push never blocks the dispatcher.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

use crate::error::Result;
use crate::registry::RoomRegistry;
use crate::session::{ConnectionGateway, ConnectionId};
use crate::stats::RelayStats;

use super::EventPush;

/// Join request carried in a client text frame
#[derive(Debug, Deserialize)]
struct ClientRequest {
    /// Room to join, e.g. `dash:ops` or `flight:UA123`
    join: String,
}

/// Handle for a connected client
struct ClientHandle {
    /// Mailbox drained to the client's socket by its task
    tx: mpsc::UnboundedSender<Message>,
}

/// WebSocket server implementing the live transport boundary
pub struct WsTransport {
    gateway: Arc<ConnectionGateway>,
    clients: Arc<RwLock<HashMap<ConnectionId, ClientHandle>>>,
    stats: Arc<RelayStats>,
    shutdown_tx: broadcast::Sender<()>,
    max_connections: usize,
}

impl WsTransport {
    /// Create a transport over the shared registry
    ///
    /// `max_connections` of zero means unlimited.
    pub fn new(registry: Arc<RoomRegistry>, stats: Arc<RelayStats>, max_connections: usize) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            gateway: Arc::new(ConnectionGateway::new(registry)),
            clients: Arc::new(RwLock::new(HashMap::new())),
            stats,
            shutdown_tx,
            max_connections,
        }
    }

    /// Trigger shutdown of the accept loop and every client task
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of currently connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Accept connections until shutdown
    pub async fn serve(&self, bind_addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!(addr = %bind_addr, "Live transport listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, peer_addr)) => {
                            self.handle_socket(socket, peer_addr).await;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Live transport shutting down");
                    break;
                }
            }
        }

        // Close every client mailbox; the client tasks finish the teardown.
        let clients = self.clients.read().await;
        for handle in clients.values() {
            let _ = handle.tx.send(Message::Close(None));
        }

        Ok(())
    }

    async fn handle_socket(&self, socket: TcpStream, peer_addr: SocketAddr) {
        if self.max_connections > 0 {
            let current = self.clients.read().await.len();
            if current >= self.max_connections {
                tracing::warn!(
                    peer = %peer_addr,
                    current,
                    max = self.max_connections,
                    "Connection rejected: limit reached"
                );
                return;
            }
        }

        let ws_stream = match accept_async(socket).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::warn!(peer = %peer_addr, error = %e, "WebSocket handshake failed");
                return;
            }
        };

        let connection = self.gateway.on_connect();
        self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.stats.active_connections.fetch_add(1, Ordering::Relaxed);
        tracing::info!(connection, peer = %peer_addr, "Client connected");

        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        {
            let mut clients = self.clients.write().await;
            clients.insert(connection, ClientHandle { tx });
        }

        let gateway = Arc::clone(&self.gateway);
        let clients = Arc::clone(&self.clients);
        let stats = Arc::clone(&self.stats);
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            Self::client_task(connection, ws_stream, rx, gateway, clients, stats, shutdown_rx).await;
        });
    }

    /// Task owning a single client's socket
    ///
    /// Pumps the mailbox out, applies join frames, and answers pings. Every
    /// exit path ends in the same teardown: deregister the mailbox, then
    /// remove the connection from the registry unconditionally.
    async fn client_task(
        connection: ConnectionId,
        ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
        mut rx: mpsc::UnboundedReceiver<Message>,
        gateway: Arc<ConnectionGateway>,
        clients: Arc<RwLock<HashMap<ConnectionId, ClientHandle>>>,
        stats: Arc<RelayStats>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        loop {
            tokio::select! {
                // Outgoing pushes
                Some(msg) = rx.recv() => {
                    if let Err(e) = ws_tx.send(msg).await {
                        tracing::debug!(connection, error = %e, "Failed to send to client");
                        break;
                    }
                }
                // Incoming frames: joins, pings, close
                incoming = ws_rx.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_client_frame(connection, &text, &gateway).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_tx.send(Message::Pong(data)).await {
                                tracing::debug!(connection, error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::debug!(connection, "Client requested close");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::debug!(connection, error = %e, "WebSocket error");
                            break;
                        }
                        None => {
                            tracing::debug!(connection, "Connection closed");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!(connection, "Shutdown signal received");
                    break;
                }
            }
        }

        {
            let mut clients = clients.write().await;
            clients.remove(&connection);
        }
        gateway.on_disconnect(connection).await;

        stats.active_connections.fetch_sub(1, Ordering::Relaxed);
        tracing::info!(connection, "Client disconnected");
    }

    async fn handle_client_frame(
        connection: ConnectionId,
        text: &str,
        gateway: &ConnectionGateway,
    ) {
        match serde_json::from_str::<ClientRequest>(text) {
            Ok(request) => {
                gateway.on_join(connection, &request.join).await;
            }
            Err(e) => {
                tracing::debug!(connection, error = %e, "Ignoring unparseable client frame");
            }
        }
    }
}

impl EventPush for WsTransport {
    async fn push(&self, connection: ConnectionId, event_name: &str, payload: &Value) {
        self.stats.pushes_attempted.fetch_add(1, Ordering::Relaxed);

        let frame = serde_json::json!({
            "event": event_name,
            "data": payload,
        });
        let text = frame.to_string();

        let clients = self.clients.read().await;
        let delivered = match clients.get(&connection) {
            Some(handle) => handle.tx.send(Message::Text(text)).is_ok(),
            None => false,
        };

        if !delivered {
            self.stats.push_failures.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(connection, event_name, "Push dropped, connection gone");
        }
    }
}
