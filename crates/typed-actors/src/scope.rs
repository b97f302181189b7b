//! # Cancellation Scopes
//!
//! Actor lifetimes form a tree: stopping an actor stops everything it spawned. The tree is
//! kept explicitly in a [`Hierarchy`], an arena of nodes where each node records its parent,
//! its children and a [`CancellationToken`]. Cancelling a node walks its subtree and cancels
//! every token on the way.
//!
//! Node ids carry a generation, so an id that outlives its node never resolves to whatever
//! reuses the slot.
//!
//! A failing actor does not stay contained in its own subtree: [`Hierarchy::fail`] records the
//! failure and cancels the tree from its root down, so the failure reaches the parent, the
//! parent's parent and finally the actor system.

use crate::error::ActorError;
use parking_lot::Mutex;
use slab::Slab;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    index: usize,
    generation: u64,
}

struct Node {
    name: Arc<str>,
    generation: u64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    token: CancellationToken,
}

#[derive(Default)]
struct Arena {
    nodes: Slab<Node>,
    next_generation: u64,
    failure: Option<ActorError>,
}

impl Arena {
    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|node| node.generation == id.generation)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|node| node.generation == id.generation)
    }

    fn cancel_subtree(&self, root: NodeId) -> usize {
        let mut pending = vec![root];
        let mut cancelled = 0;
        while let Some(id) = pending.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if !node.token.is_cancelled() {
                node.token.cancel();
                cancelled += 1;
            }
            pending.extend(node.children.iter().copied());
        }
        cancelled
    }

    /// Topmost live ancestor of `id` (or `id` itself).
    fn root_of(&self, id: NodeId) -> NodeId {
        let mut root = id;
        while let Some(parent) = self.get(root).and_then(|node| node.parent) {
            if self.get(parent).is_none() {
                break;
            }
            root = parent;
        }
        root
    }
}

/// The live actor tree of one actor system.
#[derive(Default)]
pub(crate) struct Hierarchy {
    arena: Mutex<Arena>,
}

impl Hierarchy {
    /// Registers a node under `parent` (or as a root).
    ///
    /// A node registered under a cancelled or vanished parent starts out cancelled.
    pub(crate) fn insert(
        &self,
        parent: Option<NodeId>,
        name: Arc<str>,
    ) -> (NodeId, CancellationToken) {
        let mut arena = self.arena.lock();
        arena.next_generation += 1;
        let generation = arena.next_generation;
        let token = CancellationToken::new();

        let parent = match parent {
            Some(parent_id) => match arena.get(parent_id) {
                Some(parent) => {
                    if parent.token.is_cancelled() {
                        token.cancel();
                    }
                    Some(parent_id)
                }
                None => {
                    token.cancel();
                    None
                }
            },
            None => None,
        };

        let index = arena.nodes.insert(Node {
            name,
            generation,
            parent,
            children: Vec::new(),
            token: token.clone(),
        });
        let id = NodeId { index, generation };
        if let Some(parent) = parent.and_then(|parent_id| arena.get_mut(parent_id)) {
            parent.children.push(id);
        }
        (id, token)
    }

    /// Cancels `root` and all of its descendants, returning how many were newly cancelled.
    pub(crate) fn cancel_subtree(&self, root: NodeId) -> usize {
        self.arena.lock().cancel_subtree(root)
    }

    /// Records that the actor at `id` failed and cancels the whole tree it belongs to.
    ///
    /// Only the first failure is kept; later ones are usually consequences of it.
    pub(crate) fn fail(&self, id: NodeId, failure: ActorError) -> usize {
        let mut arena = self.arena.lock();
        error!(error = %failure, "Actor failed, cancelling its hierarchy");
        arena.failure.get_or_insert(failure);
        let root = arena.root_of(id);
        arena.cancel_subtree(root)
    }

    /// The first failure recorded with [`Hierarchy::fail`].
    pub(crate) fn failure(&self) -> Option<ActorError> {
        self.arena.lock().failure.clone()
    }

    /// Unlinks a finished node. Children still registered become roots.
    pub(crate) fn remove(&self, id: NodeId) {
        let mut arena = self.arena.lock();
        if arena.get(id).is_none() {
            return;
        }
        let node = arena.nodes.remove(id.index);
        if let Some(parent) = node.parent.and_then(|parent_id| arena.get_mut(parent_id)) {
            parent.children.retain(|child| *child != id);
        }
        for child in node.children {
            if let Some(child) = arena.get_mut(child) {
                child.parent = None;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self, id: NodeId) -> bool {
        self.arena
            .lock()
            .get(id)
            .map_or(true, |node| node.token.is_cancelled())
    }

    /// `/`-separated names from the root down to `id`.
    pub(crate) fn path(&self, id: NodeId) -> String {
        let arena = self.arena.lock();
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor.and_then(|id| arena.get(id)) {
            names.push(node.name.clone());
            cursor = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.arena.lock().nodes.len()
    }
}

/// Removes an actor's node when its task ends.
///
/// If the task ends without [`ScopeGuard::disarm`] (the runtime dropped the task midway) the
/// subtree is cancelled as well, since the actor never got to unwind its children itself.
pub(crate) struct ScopeGuard {
    hierarchy: Arc<Hierarchy>,
    node: NodeId,
    name: Arc<str>,
    armed: bool,
}

impl ScopeGuard {
    pub(crate) fn new(hierarchy: Arc<Hierarchy>, node: NodeId, name: Arc<str>) -> Self {
        Self {
            hierarchy,
            node,
            name,
            armed: true,
        }
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.armed {
            let cancelled = self.hierarchy.cancel_subtree(self.node);
            warn!(actor = %self.name, cancelled, "Actor terminated abnormally, subtree cancelled");
        }
        self.hierarchy.remove(self.node);
    }
}
