//! Test fixtures.

use super::{Document, DomSnapshot};
use serde_json::json;

pub(crate) const TEST_URL: &str = "https://example.com/app/page";

/// `<html><body>{children}</body></html>` at [`TEST_URL`], 1280x800 viewport.
pub(crate) fn page(children: serde_json::Value) -> Document {
  let snapshot: DomSnapshot = serde_json::from_value(json!({
    "url": TEST_URL,
    "viewport": {"width": 1280.0, "height": 800.0},
    "root": {"tag": "html", "children": [
      {"tag": "body", "children": children}
    ]}
  }))
  .expect("fixture snapshot");
  Document::from_snapshot(&snapshot).expect("fixture document")
}
