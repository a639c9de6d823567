/*!
RPC request/response types and dispatch.
*/

#![allow(missing_docs)]

use std::sync::Arc;

use pinpoint::multi_select::select_elements;
use pinpoint::output::render;
use pinpoint::{
  collect_element_info, identify, refind, AddOptions, Annotation, AnnotationId, Annotator, Bounds, Document,
  DomSnapshot, ElementInfo, NodeId, OutputLevel, Point, Settings, SettingsPatch, Snapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::sync::RwLock;
use ts_rs::TS;

/// The page being annotated and its annotator.
#[derive(Debug, Clone)]
pub struct Session {
  annotator: Annotator,
  document: Arc<RwLock<Document>>,
}

impl Session {
  pub fn new(annotator: Annotator, document: Document) -> Self {
    Self {
      annotator,
      document: Arc::new(RwLock::new(document)),
    }
  }

  pub const fn annotator(&self) -> &Annotator {
    &self.annotator
  }

  pub const fn document(&self) -> &Arc<RwLock<Document>> {
    &self.document
  }
}

/// RPC request.
#[derive(Debug, Deserialize, TS)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
#[ts(export)]
pub enum RpcRequest {
  /// Annotations plus settings.
  Snapshot,
  /// All annotations, ordered by number.
  GetAnnotations,
  /// Human-readable label of the first element matching `selector`.
  Identify { selector: String },
  /// Full element snapshot of the first element matching `selector`.
  CollectElementInfo {
    selector: String,
    #[serde(default)]
    forensic: bool,
  },
  /// Annotate the first element matching `selector`. `x`/`y` is the
  /// viewport-relative click point; defaults to the element's centre.
  AddAnnotation {
    selector: String,
    comment: String,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    selected_text: Option<String>,
  },
  /// Annotate several elements with one comment, as a multi-select. Targets
  /// are the first match of each selector plus whatever a drag over `rect`
  /// would pick.
  AddAnnotations {
    comment: String,
    #[serde(default)]
    selectors: Vec<String>,
    #[serde(default)]
    rect: Option<Bounds>,
  },
  UpdateAnnotation { id: AnnotationId, comment: String },
  DeleteAnnotation { id: AnnotationId },
  ClearAnnotations,
  /// Locate a stored element in the current document.
  Refind { element_info: Box<ElementInfo> },
  /// Re-acquire elements for annotations whose element is gone.
  Reattach,
  /// Markdown export. Defaults to the configured output level.
  Export {
    #[serde(default)]
    level: Option<OutputLevel>,
  },
  /// Replace the page (navigation or re-render) and reattach.
  LoadDocument { snapshot: Box<DomSnapshot> },
  GetSettings,
  SetSettings { settings: SettingsPatch },
}

/// RPC response.
#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum RpcResponse {
  Snapshot(Box<Snapshot>),
  Annotations(Vec<Annotation>),
  /// `None` when the operation was cancelled or the annotation is unknown.
  OptionalAnnotation(Option<Box<Annotation>>),
  ElementInfo(Box<ElementInfo>),
  OptionalElementInfo(Option<Box<ElementInfo>>),
  Settings(Box<Settings>),
  Text(String),
  Count(usize),
}

fn first_match(doc: &Document, selector: &str) -> Result<NodeId, String> {
  doc
    .query_selector(selector)
    .map_err(|e| format!("Invalid selector '{selector}': {e}"))?
    .ok_or_else(|| format!("No element matches '{selector}'"))
}

pub async fn dispatch_json(session: &Session, method: &str, args: &JsonValue) -> JsonValue {
  let request_value = json!({ "method": method, "args": args });

  match serde_json::from_value::<RpcRequest>(request_value) {
    Ok(request) => match dispatch(session, request).await {
      Ok(response) => json!({ "result": response }),
      Err(e) => {
        log::warn!("[rpc] {method} failed: {e}");
        json!({ "error": e })
      }
    },
    Err(e) => {
      log::warn!("[rpc] Invalid request for {method}: {e}");
      json!({ "error": format!("Invalid request: {}", e) })
    }
  }
}

pub async fn dispatch(session: &Session, request: RpcRequest) -> Result<RpcResponse, String> {
  let annotator = &session.annotator;

  match request {
    RpcRequest::Snapshot => Ok(RpcResponse::Snapshot(Box::new(annotator.snapshot()))),

    RpcRequest::GetAnnotations => Ok(RpcResponse::Annotations(annotator.all())),

    RpcRequest::Identify { selector } => {
      let doc = session.document.read().await;
      let node = first_match(&doc, &selector)?;
      Ok(RpcResponse::Text(identify(&doc, node)))
    }

    RpcRequest::CollectElementInfo { selector, forensic } => {
      let doc = session.document.read().await;
      let node = first_match(&doc, &selector)?;
      let info = collect_element_info(&doc, node, forensic).map_err(|e| e.to_string())?;
      Ok(RpcResponse::ElementInfo(Box::new(info)))
    }

    RpcRequest::AddAnnotation {
      selector,
      comment,
      x,
      y,
      selected_text,
    } => {
      // Collect under the lock (the page may be frozen meanwhile); the hook
      // runs without it.
      let draft = {
        let mut doc = session.document.write().await;
        let node = first_match(&doc, &selector)?;
        let options = AddOptions {
          selected_text,
          click: x.zip(y).map(|(x, y)| Point::new(x, y)),
        };
        annotator
          .while_annotating(&mut doc, |page| annotator.draft(page, node, comment, options))
          .ok_or_else(|| format!("Could not collect element info for '{selector}'"))?
      };
      let created = annotator.add_draft(draft).await;
      Ok(RpcResponse::OptionalAnnotation(created.map(Box::new)))
    }

    RpcRequest::AddAnnotations {
      comment,
      selectors,
      rect,
    } => {
      let drafts = {
        let mut doc = session.document.write().await;
        let mut nodes = selectors
          .iter()
          .map(|selector| first_match(&doc, selector))
          .collect::<Result<Vec<_>, _>>()?;
        if let Some(rect) = rect {
          nodes.extend(select_elements(&doc, rect));
        }
        let mut seen = std::collections::HashSet::new();
        nodes.retain(|&node| seen.insert(node));
        if nodes.is_empty() {
          return Err("Nothing to annotate".to_string());
        }
        annotator.while_annotating(&mut doc, |page| annotator.batch_drafts(page, &nodes, &comment))
      };
      Ok(RpcResponse::Annotations(annotator.add_draft_batch(drafts).await))
    }

    RpcRequest::UpdateAnnotation { id, comment } => Ok(RpcResponse::OptionalAnnotation(
      annotator.update(&id, comment).map(Box::new),
    )),

    RpcRequest::DeleteAnnotation { id } => Ok(RpcResponse::OptionalAnnotation(
      annotator.delete(&id).map(Box::new),
    )),

    RpcRequest::ClearAnnotations => Ok(RpcResponse::Annotations(annotator.clear_all())),

    RpcRequest::Refind { element_info } => {
      let doc = session.document.read().await;
      let found = refind(&doc, &element_info)
        .map(|node| collect_element_info(&doc, node, false))
        .transpose()
        .map_err(|e| e.to_string())?;
      Ok(RpcResponse::OptionalElementInfo(found.map(Box::new)))
    }

    RpcRequest::Reattach => {
      let doc = session.document.read().await;
      Ok(RpcResponse::Count(annotator.reattach(&doc)))
    }

    RpcRequest::Export { level } => {
      let level = level.unwrap_or_else(|| annotator.settings().output_level);
      let doc = session.document.read().await;
      Ok(RpcResponse::Text(render(&annotator.all(), level, Some(&doc))))
    }

    RpcRequest::LoadDocument { snapshot } => {
      let next = Document::from_snapshot(&snapshot).map_err(|e| e.to_string())?;
      let mut doc = session.document.write().await;
      *doc = next;
      Ok(RpcResponse::Count(annotator.reattach(&doc)))
    }

    RpcRequest::GetSettings => Ok(RpcResponse::Settings(Box::new(annotator.settings()))),

    RpcRequest::SetSettings { settings } => Ok(RpcResponse::Settings(Box::new(
      annotator.set_settings(&settings),
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session() -> Session {
    let doc = Document::from_json(
      r##"{
        "url": "https://shop.example/cart",
        "viewport": {"width": 1024, "height": 768},
        "root": {"tag": "html", "children": [{"tag": "body", "children": [
          {"tag": "main", "children": [
            {"tag": "button", "attrs": {"id": "checkout"},
             "rect": {"x": 10, "y": 10, "w": 120, "h": 40}, "children": ["Checkout"]}
          ]}
        ]}]}
      }"##,
    )
    .unwrap();
    Session::new(Annotator::new(), doc)
  }

  async fn call(session: &Session, method: &str, args: JsonValue) -> JsonValue {
    dispatch_json(session, method, &args).await
  }

  #[tokio::test]
  async fn identify_by_selector() {
    let s = session();
    let res = call(&s, "identify", json!({"selector": "#checkout"})).await;
    assert_eq!(res["result"], "button \"Checkout\"");
  }

  #[tokio::test]
  async fn add_then_list_then_delete() {
    let s = session();
    let added = call(
      &s,
      "add_annotation",
      json!({"selector": "main > button", "comment": "Too small", "x": 40, "y": 30}),
    )
    .await;
    assert_eq!(added["result"]["number"], 1);
    assert_eq!(added["result"]["clickX"], 40.0);
    assert_eq!(added["result"]["offsetX"], 0.25);
    let id = added["result"]["id"].clone();

    let listed = call(&s, "get_annotations", JsonValue::Null).await;
    assert_eq!(listed["result"].as_array().unwrap().len(), 1);

    let deleted = call(&s, "delete_annotation", json!({"id": id})).await;
    assert_eq!(deleted["result"]["comment"], "Too small");
    assert!(s.annotator().is_empty());
  }

  fn toolbar_session() -> Session {
    let doc = Document::from_json(
      r##"{
        "url": "https://shop.example/cart",
        "viewport": {"width": 1024, "height": 768},
        "root": {"tag": "html", "children": [{"tag": "body", "children": [
          {"tag": "video", "attrs": {"id": "promo"}, "mediaPaused": false,
           "rect": {"x": 600, "y": 10, "w": 320, "h": 180}},
          {"tag": "nav", "children": [
            {"tag": "a", "attrs": {"id": "home", "href": "/"},
             "rect": {"x": 10, "y": 300, "w": 80, "h": 20}, "children": ["Home"]},
            {"tag": "a", "attrs": {"id": "deals", "href": "/deals"},
             "rect": {"x": 100, "y": 300, "w": 80, "h": 20}, "children": ["Deals"]},
            {"tag": "button", "attrs": {"id": "cart"},
             "rect": {"x": 400, "y": 300, "w": 80, "h": 30}, "children": ["Cart"]}
          ]}
        ]}]}
      }"##,
    )
    .unwrap();
    Session::new(Annotator::new(), doc)
  }

  #[tokio::test]
  async fn batch_add_by_rect_and_selector() {
    let s = toolbar_session();
    let res = call(
      &s,
      "add_annotations",
      json!({
        "comment": "Inconsistent spacing",
        "selectors": ["#cart", "#home"],
        "rect": {"x": 0, "y": 290, "w": 200, "h": 40}
      }),
    )
    .await;

    let created = res["result"].as_array().unwrap();
    let labels: Vec<_> = created
      .iter()
      .map(|a| a["elementInfo"]["humanReadable"].as_str().unwrap())
      .collect();
    assert_eq!(labels, vec!["button \"Cart\"", "link \"Home\"", "link \"Deals\""]);
    assert!(created.iter().all(|a| a["isMultiSelect"] == true));
    assert_eq!(created[2]["number"], 3);
  }

  #[tokio::test]
  async fn batch_add_needs_targets() {
    let s = toolbar_session();
    let empty = call(&s, "add_annotations", json!({"comment": "x", "rect": {"x": 0, "y": 700, "w": 50, "h": 50}})).await;
    assert_eq!(empty["error"], "Nothing to annotate");

    let missing = call(&s, "add_annotations", json!({"comment": "x", "selectors": ["#nope"]})).await;
    assert_eq!(missing["error"], "No element matches '#nope'");
    assert!(s.annotator().is_empty());
  }

  #[tokio::test]
  async fn freeze_setting_is_undone_after_add() {
    let s = toolbar_session();
    call(&s, "set_settings", json!({"settings": {"freezeOnAnnotation": true}})).await;

    let res = call(&s, "add_annotation", json!({"selector": "#cart", "comment": "Hidden on mobile"})).await;
    assert_eq!(res["result"]["number"], 1);

    let doc = s.document().read().await;
    assert!(doc.query_selector("style").unwrap().is_none());
    let promo = doc.get_element_by_id("promo").unwrap();
    assert_eq!(doc.media_paused(promo), Some(false));
  }

  #[tokio::test]
  async fn errors_are_reported_not_thrown() {
    let s = session();
    let bad = call(&s, "identify", json!({"selector": "button["})).await;
    assert!(bad["error"].as_str().unwrap().starts_with("Invalid selector"));

    let missing = call(&s, "identify", json!({"selector": "#nope"})).await;
    assert_eq!(missing["error"], "No element matches '#nope'");

    let unknown = call(&s, "self_destruct", JsonValue::Null).await;
    assert!(unknown["error"].as_str().unwrap().starts_with("Invalid request"));

    let gone = call(&s, "update_annotation", json!({"id": "x", "comment": "y"})).await;
    assert_eq!(gone["result"], JsonValue::Null);
  }

  #[tokio::test]
  async fn navigation_reattaches() {
    let s = session();
    call(&s, "add_annotation", json!({"selector": "#checkout", "comment": "a"})).await;

    let snapshot = json!({
      "url": "https://shop.example/cart",
      "viewport": {"width": 1024, "height": 768},
      "root": {"tag": "html", "children": [{"tag": "body", "children": [
        {"tag": "main", "children": [{"tag": "button", "attrs": {"id": "checkout"}, "children": ["Checkout"]}]}
      ]}]}
    });
    let res = call(&s, "load_document", json!({"snapshot": snapshot})).await;
    assert_eq!(res["result"], 1);
  }

  #[tokio::test]
  async fn export_uses_requested_level() {
    let s = session();
    call(&s, "add_annotation", json!({"selector": "#checkout", "comment": "Move left"})).await;
    let res = call(&s, "export", json!({"level": "compact"})).await;
    assert_eq!(
      res["result"],
      "## Page Feedback: https://shop.example/cart\n\n1. **button \"Checkout\"**: Move left\n"
    );
  }

  #[tokio::test]
  async fn settings_round_trip() {
    let s = session();
    let res = call(&s, "set_settings", json!({"settings": {"outputLevel": "forensic"}})).await;
    assert_eq!(res["result"]["outputLevel"], "forensic");
    let res = call(&s, "get_settings", JsonValue::Null).await;
    assert_eq!(res["result"]["outputLevel"], "forensic");
  }
}
