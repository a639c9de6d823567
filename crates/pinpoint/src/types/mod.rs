/*! Core types for Pinpoint.

Regenerate TypeScript types: `cargo test` (ts-rs exports on test).
*/

#![allow(missing_docs)]

mod annotation;
mod element_info;
mod error;
mod event;
mod geometry;
mod ids;
mod settings;
#[cfg(test)]
pub(crate) mod testing;

pub use annotation::{Annotation, AnnotationContext};
pub use element_info::{ElementInfo, ElementRect, NearbyContext};
pub use error::{PinpointError, PinpointResult};
pub use event::{AnnotationEvent, Snapshot};
pub use geometry::{Bounds, Point};
pub use ids::{AnnotationId, NodeId};
pub use settings::{
  OutputLevel, Settings, SettingsPatch, Theme, ToolbarPosition, DEFAULT_ANNOTATION_COLOR,
};
