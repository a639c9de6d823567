/*!
Parent/child links of a [`Document`](super::Document).

Every attached node has one `Links` record holding its parent and its
children in document order. The document element has no parent. A node is
attached at most once; detaching drops the whole subtree's records.
*/

use crate::types::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Links {
  parent: Option<NodeId>,
  children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeTree {
  links: HashMap<NodeId, Links>,
}

impl NodeTree {
  pub(super) fn new() -> Self {
    Self::default()
  }

  pub(super) fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.links.get(&id).and_then(|l| l.parent)
  }

  /// Children in document order.
  pub(super) fn children(&self, id: NodeId) -> &[NodeId] {
    self.links.get(&id).map_or(&[], |l| l.children.as_slice())
  }

  /// Attach `child` as the last child of `parent`.
  ///
  /// Appending under the current parent again is a no-op. A child that
  /// already hangs elsewhere is left where it is and `false` is returned.
  pub(super) fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
    match self.parent(child) {
      Some(current) if current == parent => return true,
      Some(current) => {
        log::error!("append: {child} is a child of {current}, not moving it under {parent}");
        return false;
      }
      None => {}
    }
    self.links.entry(child).or_default().parent = Some(parent);
    self.links.entry(parent).or_default().children.push(child);
    true
  }

  /// Detach `root` from its parent and forget it and all its descendants.
  /// Returns every forgotten id, `root` first.
  pub(super) fn detach(&mut self, root: NodeId) -> Vec<NodeId> {
    if let Some(parent) = self.parent(root) {
      if let Some(links) = self.links.get_mut(&parent) {
        links.children.retain(|&c| c != root);
      }
    }

    let mut forgotten = Vec::new();
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
      if let Some(links) = self.links.remove(&id) {
        pending.extend(links.children.into_iter().rev());
      }
      forgotten.push(id);
    }
    forgotten
  }
}
