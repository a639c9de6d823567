/*!
WebSocket server implementation.
*/

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket, WebSocketUpgrade},
    State,
  },
  response::Response,
  routing::get,
  Router,
};
use log::{error, info, warn};
use pinpoint::AnnotationEvent;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::rpc::{dispatch_json, Session};

/// Default WebSocket server port.
pub const DEFAULT_WS_PORT: u16 = 3030;
const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// WebSocket state.
#[derive(Clone)]
pub struct WebSocketState {
  session: Session,
  json_sender: Arc<broadcast::Sender<String>>,
  port: u16,
}

impl std::fmt::Debug for WebSocketState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebSocketState")
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl WebSocketState {
  /// Create with default port.
  pub fn new(session: Session) -> Self {
    Self::with_port(session, DEFAULT_WS_PORT)
  }

  /// Create with custom port.
  pub fn with_port(session: Session, port: u16) -> Self {
    let (json_tx, _) = broadcast::channel::<String>(DEFAULT_CHANNEL_CAPACITY);
    Self {
      session,
      json_sender: Arc::new(json_tx),
      port,
    }
  }

  /// Session the RPC handlers run against.
  pub const fn session(&self) -> &Session {
    &self.session
  }
}

/// Serve `/ws` until `shutdown` resolves.
pub async fn start_server(
  ws_state: WebSocketState,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
  let port = ws_state.port;
  let sender = ws_state.json_sender.clone();
  let mut rx = ws_state.session.annotator().subscribe();
  tokio::spawn(async move {
    loop {
      match rx.recv().await {
        Ok(event) => {
          if let Ok(json) = serde_json::to_string(&event) {
            drop(sender.send(json));
          }
        }
        Err(_) if rx.is_closed() => break,
        Err(e) => warn!("[ws] Event forwarding fell behind: {e}"),
      }
    }
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let app = Router::new()
    .route("/ws", get(websocket_handler))
    .layer(cors)
    .with_state(ws_state);

  let addr = format!("127.0.0.1:{port}");
  let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
    error!("Failed to bind WebSocket server to {addr}: {e}");
    e
  })?;

  info!("WebSocket server: ws://{addr}/ws");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await
}

async fn websocket_handler(ws: WebSocketUpgrade, State(ws_state): State<WebSocketState>) -> Response {
  ws.on_upgrade(|socket| handle_websocket(socket, ws_state))
}

async fn handle_websocket(mut socket: WebSocket, ws_state: WebSocketState) {
  let mut events = ws_state.json_sender.subscribe();

  let init = AnnotationEvent::SyncInit(ws_state.session.annotator().snapshot());
  let Ok(init) = serde_json::to_string(&init) else {
    return;
  };
  if socket.send(Message::Text(init)).await.is_err() {
    return;
  }

  loop {
    let flow = tokio::select! {
      incoming = socket.recv() => on_client_message(&mut socket, &ws_state, &mut events, incoming).await,
      event = events.recv() => on_event(&mut socket, event).await,
    };
    if flow.is_break() {
      break;
    }
  }
}

async fn on_client_message(
  socket: &mut WebSocket,
  ws_state: &WebSocketState,
  events: &mut broadcast::Receiver<String>,
  incoming: Option<Result<Message, axum::Error>>,
) -> ControlFlow<()> {
  match incoming {
    Some(Ok(Message::Text(text))) => {
      let response = handle_request(&text, ws_state).await;
      // Events caused by the request go out before its response.
      while let Ok(event_json) = events.try_recv() {
        drop(socket.send(Message::Text(event_json)).await);
      }
      drop(socket.send(Message::Text(response)).await);
      ControlFlow::Continue(())
    }
    Some(Ok(Message::Close(_))) | None => {
      info!("[client] disconnected");
      ControlFlow::Break(())
    }
    Some(Err(e)) => {
      warn!("WebSocket error: {e}");
      ControlFlow::Break(())
    }
    Some(Ok(_)) => ControlFlow::Continue(()),
  }
}

async fn on_event(
  socket: &mut WebSocket,
  event: Result<String, broadcast::error::RecvError>,
) -> ControlFlow<()> {
  match event {
    Ok(event_json) => {
      if socket.send(Message::Text(event_json)).await.is_err() {
        return ControlFlow::Break(());
      }
      ControlFlow::Continue(())
    }
    Err(broadcast::error::RecvError::Lagged(n)) => {
      warn!("[ws] Client lagged, dropped {n} events; it should resync with `snapshot`");
      ControlFlow::Continue(())
    }
    Err(broadcast::error::RecvError::Closed) => ControlFlow::Break(()),
  }
}

/// `{"id", "method", "args"}` in, `{"id", "result" | "error"}` out.
async fn handle_request(request: &str, ws_state: &WebSocketState) -> String {
  let req: Value = match serde_json::from_str(request) {
    Ok(v) => v,
    Err(e) => return json!({ "error": format!("Invalid JSON: {}", e) }).to_string(),
  };

  let id = req.get("id").cloned().unwrap_or(Value::Null);
  let method = req.get("method").and_then(Value::as_str).unwrap_or("");
  let args = req.get("args").cloned().unwrap_or(Value::Null);

  let mut response = dispatch_json(&ws_state.session, method, &args).await;
  if let Some(obj) = response.as_object_mut() {
    obj.insert("id".to_string(), id);
  }
  response.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pinpoint::{Annotator, Document};

  fn state() -> WebSocketState {
    let doc = Document::from_json(
      r#"{"url": "https://a.test/", "root": {"tag": "html", "children": [
        {"tag": "body", "children": [{"tag": "h1", "children": ["Hello"]}]}
      ]}}"#,
    )
    .unwrap();
    WebSocketState::new(Session::new(Annotator::new(), doc))
  }

  #[tokio::test]
  async fn response_echoes_request_id() {
    let state = state();
    let raw = handle_request(
      r#"{"id": 7, "method": "identify", "args": {"selector": "h1"}}"#,
      &state,
    )
    .await;
    let res: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(res["id"], 7);
    assert_eq!(res["result"], "h1 \"Hello\"");
  }

  #[tokio::test]
  async fn malformed_json_is_an_error() {
    let raw = handle_request("{nope", &state()).await;
    let res: Value = serde_json::from_str(&raw).unwrap();
    assert!(res["error"].as_str().unwrap().starts_with("Invalid JSON"));
  }
}
