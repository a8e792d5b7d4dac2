mod relay;

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use duckly_core::net::messages::GAME_CHANNEL;
use duckly_core::net::protocol::{MAX_MESSAGE_SIZE, decode_client_message};

use relay::{RelayState, SharedRelayState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::args()
        .nth(1)
        .and_then(|a| a.strip_prefix("--port=").map(String::from))
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8081);

    let max_players = std::env::args()
        .nth(2)
        .and_then(|a| a.strip_prefix("--max-players=").map(String::from))
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(500);

    let state: SharedRelayState = Arc::new(RwLock::new(RelayState::new(max_players)));

    let app = Router::new()
        .route("/relay", axum::routing::get(relay_ws_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Duckly relay serving {GAME_CHANNEL} on {addr} (max players: {max_players})");

    axum::serve(listener, app)
        .await
        .expect("Relay server error");
}

async fn relay_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedRelayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_relay_socket(socket, state))
}

fn session_id() -> String {
    format!("id-{}", Uuid::new_v4().simple())
}

async fn handle_relay_socket(socket: WebSocket, state: SharedRelayState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();

    let id = session_id();
    state.write().await.connect(id.clone(), tx);
    tracing::info!(session = %id, "Connection opened");

    spawn_relay_writer(ws_sender, rx);
    read_loop(&mut ws_receiver, &state, &id).await;

    state.write().await.disconnect(&id);
    tracing::info!(session = %id, "Connection closed");
}

fn spawn_relay_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64,
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Decode each text frame and apply it to the shared state.
async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &SharedRelayState,
    id: &str,
) {
    let mut rate_limiter = RateLimiter::new(50.0, 50.0);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let frame = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };
        let text = frame.as_str();

        if text.is_empty() {
            continue;
        }

        if text.len() > MAX_MESSAGE_SIZE {
            tracing::warn!(session = id, size = text.len(), "Oversized message dropped");
            continue;
        }

        if !rate_limiter.allow() {
            tracing::warn!(session = id, "Client rate limited");
            continue;
        }

        let msg = match decode_client_message(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(session = id, error = %e, "Undecodable message dropped");
                continue;
            },
        };

        let mut relay = state.write().await;
        if let Err(e) = relay.handle(id, msg) {
            tracing::warn!(session = id, error = %e, "Message rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_prefixed_and_unique() {
        let a = session_id();
        let b = session_id();
        assert!(a.starts_with("id-"));
        assert_eq!(a.len(), 3 + 32);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn rate_limiter_refuses_when_drained() {
        let mut limiter = RateLimiter::new(2.0, 0.0);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }
}
