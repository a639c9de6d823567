//! `pinpoint-server <snapshot.json> [storage.json]`
//!
//! Loads a page snapshot, restores persisted annotations for its origin and
//! serves the annotation RPC over WebSocket until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};
use pinpoint::persistence::{sweep_expired, DEFAULT_RETENTION};
use pinpoint::{now_ms, Annotator, Document, FileStorage, Storage};
use pinpoint_ws::{start_server, Session, WebSocketState, DEFAULT_WS_PORT};

const USAGE: &str = "usage: pinpoint-server <snapshot.json> [storage.json]";

fn port() -> u16 {
  match std::env::var("PINPOINT_WS_PORT") {
    Ok(raw) => raw.parse().unwrap_or_else(|_| {
      warn!("Ignoring invalid PINPOINT_WS_PORT '{raw}'");
      DEFAULT_WS_PORT
    }),
    Err(_) => DEFAULT_WS_PORT,
  }
}

fn load_document(path: &str) -> Result<Document, String> {
  let json = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
  Document::from_json(&json).map_err(|e| format!("Failed to load {path}: {e}"))
}

fn annotator(doc: &Document, storage_path: Option<String>) -> Annotator {
  let origin = std::env::var("PINPOINT_ORIGIN")
    .ok()
    .or_else(|| doc.origin())
    .unwrap_or_else(|| "default".to_string());

  let mut builder = Annotator::builder().origin(origin);
  if let Some(path) = storage_path {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(path));
    let swept = sweep_expired(storage.as_ref(), now_ms(), DEFAULT_RETENTION);
    if swept > 0 {
      info!("Removed {swept} expired annotation(s) from storage");
    }
    builder = builder.storage(storage);
  }

  let annotator = builder.build();
  let restored = annotator.load_persisted().len();
  let attached = annotator.reattach(doc);
  info!(
    "Origin {}: restored {restored} annotation(s), {attached} attached",
    annotator.origin()
  );
  annotator
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!("Failed to listen for Ctrl-C: {e}");
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let mut args = std::env::args().skip(1);
  let Some(snapshot_path) = args.next() else {
    eprintln!("{USAGE}");
    return ExitCode::FAILURE;
  };

  let doc = match load_document(&snapshot_path) {
    Ok(doc) => doc,
    Err(e) => {
      error!("{e}");
      return ExitCode::FAILURE;
    }
  };

  let annotator = annotator(&doc, args.next());
  let session = Session::new(annotator.clone(), doc);

  println!("Pinpoint: annotating {snapshot_path}");
  let result = start_server(WebSocketState::with_port(session, port()), shutdown_signal()).await;

  if !annotator.flush() {
    warn!("Pending annotations could not be saved");
  }

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(_) => ExitCode::FAILURE,
  }
}
