/*!
Annotation lifecycle operations.

Creation is split in two so callers can drop any lock on the document before
the (possibly slow) before-create hook runs:

1. `draft` collects element info synchronously from the document.
2. `add_draft` consults the hook (no lock held), then commits in one write.

`add` does both. Numbers are assigned inside the committing write, so they
stay dense even when adds interleave.
*/

use super::hooks::run_hook;
use super::{now_ms, Annotator, CreatePayload, HookDecision};
use crate::dom::Document;
use crate::effects::PageEffects;
use crate::fallible::swallow;
use crate::identity::{collect_element_info, refind};
use crate::types::{
  Annotation, AnnotationContext, AnnotationId, ElementInfo, NodeId, OutputLevel, PinpointError, Point,
};

/// Optional inputs to [`Annotator::add`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOptions {
  /// Text the user had selected when annotating.
  pub selected_text: Option<String>,
  /// Viewport-relative click point. Defaults to the element's centre.
  pub click: Option<Point>,
}

/// An annotation collected from the page but not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
  /// Element being annotated.
  pub element: NodeId,
  /// Identification collected at draft time.
  pub element_info: ElementInfo,
  /// Comment to store.
  pub comment: String,
  /// Text selected on the page, if any.
  pub selected_text: Option<String>,
  /// Part of a drag-selected group.
  pub is_multi_select: bool,
  /// Marker anchor x, in the annotation's coordinate space.
  pub click_x: f64,
  /// Marker anchor y.
  pub click_y: f64,
  /// Horizontal fraction inside the element box.
  pub offset_x: f64,
  /// Vertical fraction inside the element box.
  pub offset_y: f64,
}

impl AnnotationDraft {
  fn payload(&self) -> CreatePayload {
    CreatePayload {
      element: self.element,
      element_info: self.element_info.clone(),
      comment: self.comment.clone(),
      selected_text: self.selected_text.clone(),
      is_multi_select: self.is_multi_select,
      click_x: self.click_x,
      click_y: self.click_y,
    }
  }

  /// Number is a placeholder until the registry commits it.
  fn into_annotation(self, now: i64, context: Option<AnnotationContext>) -> Annotation {
    Annotation {
      id: AnnotationId::generate(now),
      number: 0,
      comment: self.comment,
      element_info: self.element_info,
      element: Some(self.element),
      created_at: now,
      updated_at: now,
      selected_text: self.selected_text,
      is_multi_select: self.is_multi_select,
      click_x: self.click_x,
      click_y: self.click_y,
      offset_x: self.offset_x,
      offset_y: self.offset_y,
      context,
    }
  }
}

/// Viewport point to the coordinate space markers are stored in: document
/// space, unless the element is fixed to the viewport.
fn to_marker_space(doc: &Document, is_fixed: bool, point: Point) -> Point {
  if is_fixed {
    point
  } else {
    let viewport = doc.viewport();
    point.offset(viewport.scroll_x, viewport.scroll_y)
  }
}

fn not_found(id: &AnnotationId) -> PinpointError {
  PinpointError::AnnotationNotFound(id.clone())
}

impl Annotator {
  // === Creation ===

  /// Collect everything needed to create an annotation on `node`.
  ///
  /// Forensic element info is gathered only at the forensic output level.
  /// `None` if `node` is not a connected element.
  pub fn draft(
    &self,
    doc: &Document,
    node: NodeId,
    comment: impl Into<String>,
    options: AddOptions,
  ) -> Option<AnnotationDraft> {
    let forensic = self.read(|s| s.settings().output_level == OutputLevel::Forensic);
    let element_info = swallow("add", collect_element_info(doc, node, forensic))?;

    let rect = doc.rect(node);
    let click = options.click.unwrap_or_else(|| rect.center());
    let (offset_x, offset_y) = rect.fraction_of(click);
    let anchor = to_marker_space(doc, element_info.is_fixed, click);

    Some(AnnotationDraft {
      element: node,
      element_info,
      comment: comment.into(),
      selected_text: options.selected_text.filter(|t| !t.trim().is_empty()),
      is_multi_select: false,
      click_x: anchor.x,
      click_y: anchor.y,
      offset_x,
      offset_y,
    })
  }

  /// Drafts for a multi-select gesture: each anchored at its element's centre.
  pub fn batch_drafts(&self, doc: &Document, nodes: &[NodeId], comment: &str) -> Vec<AnnotationDraft> {
    nodes
      .iter()
      .filter_map(|&node| self.draft(doc, node, comment, AddOptions::default()))
      .map(|draft| AnnotationDraft {
        is_multi_select: true,
        ..draft
      })
      .collect()
  }

  /// Run `collect` against the page the user is annotating.
  ///
  /// With `freeze_on_annotation` on, animations and playing videos are halted
  /// for the duration and restored afterwards, so element info is captured
  /// from a still page. Collect drafts here; commit them after it returns.
  pub fn while_annotating<R>(&self, doc: &mut Document, collect: impl FnOnce(&Document) -> R) -> R {
    if self.read(|s| s.settings().freeze_on_annotation) {
      let frozen = PageEffects::freeze(doc);
      collect(&*frozen)
    } else {
      collect(doc)
    }
  }

  /// Run the hook. `None` means cancelled.
  async fn consult_hook(&self, mut draft: AnnotationDraft) -> Option<(AnnotationDraft, Option<AnnotationContext>)> {
    let Some(hook) = &self.hook else {
      return Some((draft, None));
    };
    match run_hook(hook.as_ref(), draft.payload()).await {
      HookDecision::Cancel => {
        log::debug!("Creation on {} cancelled by hook", draft.element_info.human_readable);
        None
      }
      HookDecision::Proceed { comment, context } => {
        if let Some(comment) = comment {
          draft.comment = comment;
        }
        Some((draft, context))
      }
    }
  }

  /// Consult the hook and commit. `None` if the hook cancelled.
  pub async fn add_draft(&self, draft: AnnotationDraft) -> Option<Annotation> {
    let (draft, context) = self.consult_hook(draft).await?;
    let annotation = draft.into_annotation(now_ms(), context);
    let created = self.write(|s| s.insert(annotation));
    log::debug!("Created annotation {} on {}", created.number, created.element_info.human_readable);
    self.schedule_save();
    Some(created)
  }

  /// Annotate `node`. `None` if it is not a connected element or the hook cancelled.
  pub async fn add(
    &self,
    doc: &Document,
    node: NodeId,
    comment: impl Into<String>,
    options: AddOptions,
  ) -> Option<Annotation> {
    let draft = self.draft(doc, node, comment, options)?;
    self.add_draft(draft).await
  }

  /// Commit multi-select drafts with consecutive numbers and a single event.
  ///
  /// The hook runs once per element; cancelled elements are skipped. Nothing
  /// is emitted if nothing survives.
  pub async fn add_draft_batch(&self, drafts: Vec<AnnotationDraft>) -> Vec<Annotation> {
    let mut approved = Vec::with_capacity(drafts.len());
    for draft in drafts {
      if let Some(pair) = self.consult_hook(draft).await {
        approved.push(pair);
      }
    }
    if approved.is_empty() {
      return Vec::new();
    }

    let now = now_ms();
    let batch = approved
      .into_iter()
      .map(|(draft, context)| draft.into_annotation(now, context))
      .collect();
    let created = self.write(|s| s.insert_batch(batch));
    log::debug!("Created {} annotations from multi-select", created.len());
    self.schedule_save();
    created
  }

  /// Annotate every node of a multi-select gesture with the same comment.
  pub async fn add_batch(&self, doc: &Document, nodes: &[NodeId], comment: &str) -> Vec<Annotation> {
    let drafts = self.batch_drafts(doc, nodes, comment);
    self.add_draft_batch(drafts).await
  }

  // === Mutation ===

  /// Replace the comment. `None` (logged) if the id is unknown.
  pub fn update(&self, id: &AnnotationId, comment: impl Into<String>) -> Option<Annotation> {
    let comment = comment.into();
    let updated = self.write(|s| s.update_comment(id, comment, now_ms()));
    let updated = swallow("update", updated.ok_or_else(|| not_found(id)))?;
    self.schedule_save();
    Some(updated)
  }

  /// Replace the stored element snapshot, e.g. after the element changed.
  pub fn update_element_info(&self, id: &AnnotationId, info: ElementInfo) -> Option<Annotation> {
    let updated = self.write(|s| s.update_element_info(id, info, now_ms()));
    let updated = swallow("update_element_info", updated.ok_or_else(|| not_found(id)))?;
    self.schedule_save();
    Some(updated)
  }

  /// Remove one annotation; later numbers shift down by one.
  pub fn delete(&self, id: &AnnotationId) -> Option<Annotation> {
    let removed = self.write(|s| s.remove(id));
    let removed = swallow("delete", removed.ok_or_else(|| not_found(id)))?;
    log::debug!("Deleted annotation {}", removed.number);
    self.schedule_save();
    Some(removed)
  }

  /// Remove everything with a single event.
  pub fn clear_all(&self) -> Vec<Annotation> {
    let cleared = self.write(super::registry::Registry::clear);
    self.schedule_save();
    cleared
  }

  // === Queries ===

  /// Every annotation, ordered by number.
  pub fn all(&self) -> Vec<Annotation> {
    self.read(super::registry::Registry::sorted)
  }

  /// Look up one annotation by id.
  pub fn get(&self, id: &AnnotationId) -> Option<Annotation> {
    self.read(|s| s.get(id).cloned())
  }

  /// Number of live annotations.
  pub fn len(&self) -> usize {
    self.read(super::registry::Registry::len)
  }

  /// True when nothing is annotated.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The annotation's element, if its handle is still attached to `doc`.
  pub fn live_element(&self, doc: &Document, id: &AnnotationId) -> Option<NodeId> {
    self
      .read(|s| s.get(id).and_then(|a| a.element))
      .filter(|&node| doc.is_connected(node))
  }

  // === Re-anchoring ===

  /// Re-acquire handles for annotations whose element is missing from `doc`.
  ///
  /// Returns how many were reattached. Safe to call repeatedly while late
  /// content renders.
  pub fn reattach(&self, doc: &Document) -> usize {
    let detached = self.read(|s| s.detached(|node| doc.is_connected(node)));
    if detached.is_empty() {
      return 0;
    }
    let found: Vec<(AnnotationId, NodeId)> = detached
      .into_iter()
      .filter_map(|(id, info)| refind(doc, &info).map(|node| (id, node)))
      .collect();
    let count = self.write(|s| s.attach(found));
    log::debug!("Reattached {count} annotations");
    count
  }

  /// Where the marker for `id` belongs now.
  ///
  /// With a live element the marker follows it, keeping the original click's
  /// relative position inside the box. Otherwise the stored click point is
  /// used. Document coordinates, or viewport coordinates for fixed elements.
  pub fn marker_position(&self, doc: &Document, id: &AnnotationId) -> Option<Point> {
    let annotation = self.get(id)?;
    let live = annotation.element.filter(|&node| doc.is_connected(node));
    Some(match live {
      Some(node) => {
        let point = doc
          .rect(node)
          .point_at_fraction(annotation.offset_x, annotation.offset_y);
        to_marker_space(doc, doc.is_fixed_position(node), point)
      }
      None => Point::new(annotation.click_x, annotation.click_y),
    })
  }
}
