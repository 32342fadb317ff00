//! Structural edits.
//!
//! Every edit only touches the links of the nodes next to the edit and
//! leaves graph-wide checks to the caller. Grafting a node into itself,
//! into its own subtree, or while it is still attached elsewhere corrupts
//! the tree. Prune a node before grafting it somewhere new.

use tracing::trace;

use crate::{tree::Slot, NodeId, Seed, Tree, TreeError};

impl Tree {
    /// Resets a node to type 0, empty value and no links.
    ///
    /// Neighbors that still point at the node are left as they are, so only
    /// call this on a node whose former neighbors no longer matter.
    pub fn init(&mut self, n: NodeId) {
        *self.slot_mut(n) = Slot::default();
    }

    /// Puts `replacement` where `n` is and returns it.
    ///
    /// `n` leaves with its own children, which the replacement does not
    /// inherit.
    pub fn graft(&mut self, n: NodeId, replacement: NodeId) -> NodeId {
        trace!(node = %n, replacement = %replacement, "graft");
        let links = self.links(n);
        {
            let place = self.links_mut(replacement);
            place.up = links.up;
            place.left = links.left;
            place.right = links.right;
        }

        if let Some(up) = links.up {
            let parent = self.links_mut(up);
            if parent.last == Some(n) {
                parent.last = Some(replacement);
            }
            if parent.first == Some(n) {
                parent.first = Some(replacement);
            }
        }
        if let Some(left) = links.left {
            self.links_mut(left).right = Some(replacement);
        }
        if let Some(right) = links.right {
            self.links_mut(right).left = Some(replacement);
        }

        let detached = self.links_mut(n);
        detached.up = None;
        detached.left = None;
        detached.right = None;
        replacement
    }

    /// Inserts `r` as the sibling immediately right of `n` and returns it.
    pub fn graft_right(&mut self, n: NodeId, r: NodeId) -> NodeId {
        trace!(node = %n, right = %r, "graft right");
        let links = self.links(n);
        {
            let place = self.links_mut(r);
            place.up = links.up;
            place.left = Some(n);
            place.right = links.right;
        }
        match links.right {
            Some(right) => self.links_mut(right).left = Some(r),
            None => {
                if let Some(up) = links.up {
                    self.links_mut(up).last = Some(r);
                }
            }
        }
        self.links_mut(n).right = Some(r);
        r
    }

    /// Inserts `l` as the sibling immediately left of `n` and returns it.
    pub fn graft_left(&mut self, n: NodeId, l: NodeId) -> NodeId {
        trace!(node = %n, left = %l, "graft left");
        let links = self.links(n);
        {
            let place = self.links_mut(l);
            place.up = links.up;
            place.left = links.left;
            place.right = Some(n);
        }
        match links.left {
            Some(left) => self.links_mut(left).right = Some(l),
            None => {
                if let Some(up) = links.up {
                    self.links_mut(up).first = Some(l);
                }
            }
        }
        self.links_mut(n).left = Some(l);
        l
    }

    /// Adds `c` as the last child of `n` and returns it. Any value `n` held
    /// as a leaf is discarded.
    pub fn graft_under(&mut self, n: NodeId, c: NodeId) -> NodeId {
        self.slot_mut(n).value.clear();
        match self.links(n).last {
            Some(last) => self.graft_right(last, c),
            None => {
                trace!(node = %n, under = %c, "graft under");
                {
                    let place = self.links_mut(c);
                    place.up = Some(n);
                    place.left = None;
                    place.right = None;
                }
                let parent = self.links_mut(n);
                parent.first = Some(c);
                parent.last = Some(c);
                c
            }
        }
    }

    pub fn new_right(&mut self, n: NodeId, seed: Seed) -> Result<NodeId, TreeError> {
        let r = self.seed(seed)?;
        Ok(self.graft_right(n, r))
    }

    pub fn new_left(&mut self, n: NodeId, seed: Seed) -> Result<NodeId, TreeError> {
        let l = self.seed(seed)?;
        Ok(self.graft_left(n, l))
    }

    pub fn new_under(&mut self, n: NodeId, seed: Seed) -> Result<NodeId, TreeError> {
        let c = self.seed(seed)?;
        Ok(self.graft_under(n, c))
    }

    /// Detaches `n` from its branch and siblings, closing the gap it leaves.
    /// Its own children stay with it.
    pub fn prune(&mut self, n: NodeId) -> NodeId {
        trace!(node = %n, "prune");
        let links = self.links(n);
        if let Some(up) = links.up {
            let parent = self.links_mut(up);
            if parent.first == Some(n) {
                parent.first = links.right;
            }
            if parent.last == Some(n) {
                parent.last = links.left;
            }
        }
        if let Some(left) = links.left {
            self.links_mut(left).right = links.right;
        }
        if let Some(right) = links.right {
            self.links_mut(right).left = links.left;
        }
        let detached = self.links_mut(n);
        detached.up = None;
        detached.left = None;
        detached.right = None;
        n
    }

    /// Moves every child of `from` under `n`, keeping their order.
    pub fn take(&mut self, n: NodeId, from: NodeId) {
        trace!(node = %n, from = %from, "take");
        while let Some(first) = self.links(from).first {
            self.prune(first);
            self.graft_under(n, first);
        }
    }

    /// Gives `n` the type, value, position and children of `source` while
    /// keeping the id `n`.
    ///
    /// `n` is pruned from where it was and its old children are released as
    /// loose roots. Whatever linked to `source` is relinked to `n`, and
    /// `source` is left detached with its type and value.
    pub fn morph(&mut self, n: NodeId, source: NodeId) -> Result<NodeId, TreeError> {
        self.check(n)?;
        self.check(source)?;
        if n == source {
            return Ok(n);
        }
        trace!(node = %n, source = %source, "morph");

        self.prune(n);
        while let Some(child) = self.links(n).first {
            self.prune(child);
        }
        let from = self.slot(source).clone();
        let links = from.links;
        *self.slot_mut(n) = from;
        self.slot_mut(source).links = Default::default();

        if let Some(up) = links.up {
            let parent = self.links_mut(up);
            if parent.first == Some(source) {
                parent.first = Some(n);
            }
            if parent.last == Some(source) {
                parent.last = Some(n);
            }
        }
        if let Some(left) = links.left {
            self.links_mut(left).right = Some(n);
        }
        if let Some(right) = links.right {
            self.links_mut(right).left = Some(n);
        }
        let mut child = links.first;
        while let Some(id) = child {
            let child_links = self.links_mut(id);
            child_links.up = Some(n);
            child = child_links.right;
        }
        Ok(n)
    }
}
