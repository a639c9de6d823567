/*!
The before-create hook.

A host can inspect (and veto, or rewrite) every annotation before it is
committed. The hook may be slow; no lock is held while it runs. Errors and
panics inside it are logged and treated as "proceed unchanged".
*/

use std::future::Future;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use ts_rs::TS;

use crate::types::{AnnotationContext, ElementInfo, NodeId, PinpointResult};

/// What the hook sees of an annotation about to be created.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePayload {
  /// The clicked (or first selected) element.
  pub element: NodeId,
  /// Identification captured for the element.
  pub element_info: ElementInfo,
  /// Comment as typed by the user.
  pub comment: String,
  /// Text selected on the page when the annotation was started.
  pub selected_text: Option<String>,
  /// True for drag-selected groups.
  pub is_multi_select: bool,
  /// Click x. Document pixels, or viewport pixels for fixed elements.
  pub click_x: f64,
  /// Click y, same space as `click_x`.
  pub click_y: f64,
}

/// The hook's verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision {
  /// Create the annotation, optionally replacing the comment and attaching
  /// opaque context.
  Proceed {
    /// Replacement comment.
    comment: Option<String>,
    /// Opaque data stored on the annotation.
    context: Option<AnnotationContext>,
  },
  /// Drop the annotation. Nothing is created or emitted.
  Cancel,
}

impl HookDecision {
  /// Proceed with no modifications.
  pub const fn proceed() -> Self {
    Self::Proceed {
      comment: None,
      context: None,
    }
  }
}

/// Host callback consulted before an annotation is committed.
///
/// Implemented for any `Fn(CreatePayload) -> impl Future<Output = PinpointResult<HookDecision>>`.
#[async_trait]
pub trait BeforeCreateHook: Send + Sync {
  /// Decide whether (and how) the annotation gets created. An `Err` is logged
  /// and treated as [`HookDecision::proceed`].
  async fn before_create(&self, payload: CreatePayload) -> PinpointResult<HookDecision>;
}

#[async_trait]
impl<F, Fut> BeforeCreateHook for F
where
  F: Fn(CreatePayload) -> Fut + Send + Sync,
  Fut: Future<Output = PinpointResult<HookDecision>> + Send + 'static,
{
  async fn before_create(&self, payload: CreatePayload) -> PinpointResult<HookDecision> {
    self(payload).await
  }
}

/// Run `hook`, absorbing errors and panics.
pub(crate) async fn run_hook(hook: &dyn BeforeCreateHook, payload: CreatePayload) -> HookDecision {
  match AssertUnwindSafe(hook.before_create(payload)).catch_unwind().await {
    Ok(Ok(decision)) => decision,
    Ok(Err(e)) => {
      log::warn!("[before_create] {e}; creating without modifications");
      HookDecision::proceed()
    }
    Err(_) => {
      log::warn!("[before_create] hook panicked; creating without modifications");
      HookDecision::proceed()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::testing::element_info;
  use crate::types::PinpointError;

  fn payload() -> CreatePayload {
    CreatePayload {
      element: NodeId::new(),
      element_info: element_info("button", "#save"),
      comment: "hi".to_string(),
      selected_text: None,
      is_multi_select: false,
      click_x: 0.0,
      click_y: 0.0,
    }
  }

  #[tokio::test]
  async fn closures_are_hooks() {
    let hook = |p: CreatePayload| async move {
      Ok::<_, PinpointError>(HookDecision::Proceed {
        comment: Some(p.comment.to_uppercase()),
        context: None,
      })
    };
    assert_eq!(
      run_hook(&hook, payload()).await,
      HookDecision::Proceed {
        comment: Some("HI".to_string()),
        context: None
      }
    );
  }

  #[tokio::test]
  async fn errors_proceed_unchanged() {
    let hook = |_: CreatePayload| async { Err::<HookDecision, _>(PinpointError::Hook("backend down".into())) };
    assert_eq!(run_hook(&hook, payload()).await, HookDecision::proceed());
  }

  #[tokio::test]
  async fn panics_proceed_unchanged() {
    let hook = |_: CreatePayload| async {
      if true {
        panic!("hook bug");
      }
      Ok::<_, PinpointError>(HookDecision::Cancel)
    };
    assert_eq!(run_hook(&hook, payload()).await, HookDecision::proceed());
  }
}
