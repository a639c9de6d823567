/*!
Page effects applied while the user is annotating.

Freezing injects a stylesheet that halts animations and transitions, and
pauses playing videos. Unfreezing removes the stylesheet and resumes only
the videos the freeze itself paused. [`FrozenPage`] ties the two to a scope.
*/

use std::ops::Deref;

use crate::dom::Document;
use crate::fallible::succeeded;
use crate::types::{NodeId, PinpointResult};

/// `id` of the injected freeze stylesheet.
pub const FREEZE_STYLE_ID: &str = "pinpoint-freeze-animations";

const FREEZE_CSS: &str = "*, *::before, *::after { \
  animation-play-state: paused !important; \
  transition: none !important; \
}";

/// Tracks what a freeze changed so it can be undone exactly.
#[derive(Debug, Default)]
pub struct PageEffects {
  style: Option<NodeId>,
  paused: Vec<NodeId>,
}

impl PageEffects {
  /// Nothing frozen.
  pub fn new() -> Self {
    Self::default()
  }

  /// True while the freeze stylesheet is in place.
  pub fn is_active(&self) -> bool {
    self.style.is_some()
  }

  /// Videos this freeze paused.
  pub fn paused_media(&self) -> &[NodeId] {
    &self.paused
  }

  /// Freeze the page. No-op if already frozen.
  pub fn inject(&mut self, doc: &mut Document) -> bool {
    if self.is_active() {
      return true;
    }
    succeeded("freeze page", self.try_inject(doc))
  }

  fn try_inject(&mut self, doc: &mut Document) -> PinpointResult<()> {
    let parent = doc
      .element_children(doc.root())
      .find(|&n| doc.tag_name(n) == Some("head"))
      .unwrap_or_else(|| doc.root());

    let style = doc.create_element("style");
    doc.set_attribute(style, "id", FREEZE_STYLE_ID);
    let css = doc.create_text(FREEZE_CSS);
    doc.append_child(style, css)?;
    doc.append_child(parent, style)?;
    self.style = Some(style);

    let playing: Vec<NodeId> = doc
      .elements()
      .filter(|&n| doc.tag_name(n) == Some("video") && doc.media_paused(n) == Some(false))
      .collect();
    for &video in &playing {
      doc.set_media_paused(video, true);
    }
    log::debug!("Froze page: paused {} videos", playing.len());
    self.paused = playing;
    Ok(())
  }

  /// Undo [`PageEffects::inject`]. No-op if not frozen.
  pub fn remove(&mut self, doc: &mut Document) {
    if let Some(style) = self.style.take() {
      doc.remove(style);
    }
    for video in self.paused.drain(..) {
      if doc.is_connected(video) {
        doc.set_media_paused(video, false);
      }
    }
  }

  /// Freeze `doc` for the lifetime of the returned guard.
  pub fn freeze(doc: &mut Document) -> FrozenPage<'_> {
    let mut effects = Self::new();
    effects.inject(doc);
    FrozenPage { doc, effects }
  }
}

/// A frozen page. Unfreezes on drop.
#[derive(Debug)]
pub struct FrozenPage<'a> {
  doc: &'a mut Document,
  effects: PageEffects,
}

impl FrozenPage<'_> {
  /// What this freeze changed.
  pub fn effects(&self) -> &PageEffects {
    &self.effects
  }
}

impl Deref for FrozenPage<'_> {
  type Target = Document;

  fn deref(&self) -> &Document {
    self.doc
  }
}

impl Drop for FrozenPage<'_> {
  fn drop(&mut self) {
    self.effects.remove(self.doc);
  }
}
