/*!
The "never throw past the boundary" contract.

Storage, selector and hook failures are recoverable by definition: callers get
a sentinel value and the failure is logged. Routing every such call site
through [`swallow`] keeps that policy in one place.
*/

use crate::types::PinpointResult;

/// Convert a fallible result into an `Option`, logging the error under `op`.
pub(crate) fn swallow<T>(op: &str, result: PinpointResult<T>) -> Option<T> {
  match result {
    Ok(value) => Some(value),
    Err(e) => {
      log::warn!("[{op}] {e}");
      None
    }
  }
}

/// Like [`swallow`] for operations whose only output is success.
pub(crate) fn succeeded(op: &str, result: PinpointResult<()>) -> bool {
  swallow(op, result).is_some()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::PinpointError;

  #[test]
  fn ok_passes_through() {
    assert_eq!(swallow("test", Ok(3)), Some(3));
    assert!(succeeded("test", Ok(())));
  }

  #[test]
  fn err_becomes_none() {
    let r: PinpointResult<u8> = Err(PinpointError::Storage("disk gone".into()));
    assert_eq!(swallow("test", r), None);
    assert!(!succeeded("test", Err(PinpointError::Hook("boom".into()))));
  }
}
