/*!
Pinpoint - element identity and annotation lifecycle for page feedback.

```ignore
use pinpoint::{AddOptions, Annotator, Document, FileStorage};

let doc = Document::from_json(&snapshot_json)?;
let annotator = Annotator::builder()
    .origin("https://example.com")
    .storage(Arc::new(FileStorage::new("annotations.json")))
    .build();

// Restore, then re-acquire elements once the page has rendered
annotator.load_persisted();
annotator.reattach(&doc);

// Annotate
let save = doc.query_selector("#save")?.unwrap();
let annotation = annotator.add(&doc, save, "Button is hard to see", AddOptions::default()).await;

// Subscribe to lifecycle events
let mut events = annotator.subscribe();
while let Ok(event) = events.recv().await {
    // handle event
}

// Export
let markdown = pinpoint::output::render(&annotator.all(), OutputLevel::Detailed, Some(&doc));
```
*/

mod core;
mod fallible;

pub mod a11y;
pub mod dom;
pub mod effects;
pub mod hover;
pub mod identity;
pub mod multi_select;
pub mod output;
pub mod persistence;
pub mod style;
pub mod throttle;

mod types;
pub use types::*;

pub use crate::core::{
  now_ms, AddOptions, AnnotationDraft, Annotator, AnnotatorBuilder, BeforeCreateHook, CreatePayload, HookDecision,
};
pub use crate::dom::{Document, DomSnapshot, Viewport};
pub use crate::identity::{collect_element_info, identify, refind};
pub use crate::persistence::{AnnotationStore, FileStorage, MemoryStorage, Storage};
