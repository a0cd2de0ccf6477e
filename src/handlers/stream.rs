use crate::services::Metrics;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::time::{interval, Duration};

// Live counter stream for the ops dashboard. Pushes the stats snapshot
// once per second until the client hangs up.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(metrics): State<Arc<Metrics>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, metrics))
}

async fn handle_socket(socket: WebSocket, metrics: Arc<Metrics>) {
    let (mut sender, mut receiver) = socket.split();

    let mut interval = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let stats = metrics.get_stats();

                if let Ok(msg) = serde_json::to_string(&stats) {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
            }

            Some(Ok(msg)) = receiver.next() => {
                match msg {
                    Message::Close(_) => break,
                    Message::Ping(data) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("WebSocket connection closed");
}
