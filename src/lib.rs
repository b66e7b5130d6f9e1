//! # rb-multimap
//!
//! An ordered multi-map on a red-black tree. Every key maps to all the values
//! inserted under it, in insertion order, and insertion and lookup stay
//! O(log n) whatever order the keys arrive in.
//!
//! ## Example
//!
//! ```rust
//! use rb_multimap::RbMultiMap;
//!
//! let mut map: RbMultiMap<&str, u32> = RbMultiMap::new();
//! for (key, value) in ["b", "a", "c", "a", "d"].into_iter().zip(1..) {
//!     map.insert(key, value);
//! }
//!
//! assert_eq!(map.len(), 4);
//! assert_eq!(map.find("a"), Some(&[2, 4][..]));
//! assert_eq!(map.find("z"), None);
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace, warn};

pub mod error;
pub mod sync;

pub use error::{InvariantError, Result};
pub use sync::SharedMultiMap;

// =============================================================================
// Common contract
// =============================================================================

/// The two-operation contract shared by the tree and the baseline structures,
/// so callers can swap one implementation for another.
pub trait MultiMap<K, V> {
    /// Insert `value` under `key`. Returns `true` if `key` was not present.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// All values stored under `key`, in insertion order.
    fn find(&self, key: &K) -> Option<&[V]>;

    fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for an `RbMultiMap`.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Number of distinct keys to reserve node storage for.
    pub initial_capacity: usize,
}

// =============================================================================
// Node handles and links
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// Index into the link arena. Index 0 is the sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
struct NodeId(u32);

impl NodeId {
    const NIL: NodeId = NodeId(0);

    /// # Panics
    /// Panics if the arena outgrows `u32` handles.
    #[inline]
    fn from_index(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "node arena exhausted");
        Self(index as u32)
    }

    #[inline]
    fn is_nil(self) -> bool {
        self == Self::NIL
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Position of this node's payload. Not defined for the sentinel.
    #[inline]
    fn slot(self) -> usize {
        debug_assert!(!self.is_nil(), "sentinel has no payload");
        self.0 as usize - 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    #[inline]
    fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Links {
    color: Color,
    /// Back-reference for rotations; never an ownership edge.
    parent: NodeId,
    child: [NodeId; 2],
}

impl Links {
    const SENTINEL: Links = Links {
        color: Color::Black,
        parent: NodeId::NIL,
        child: [NodeId::NIL; 2],
    };
}

#[derive(Clone)]
struct Slot<K, V> {
    key: K,
    values: SmallVec<[V; 1]>,
}

// =============================================================================
// RbMultiMap
// =============================================================================

/// An ordered multi-map backed by an arena-allocated red-black tree.
///
/// Links (color, parent, children) and payloads (key, values) live in two
/// parallel vectors addressed by the same handle. Slot 0 of the link vector
/// is the shared black sentinel: the children of every leaf and the parent
/// of the root. It carries no payload and is never written after
/// construction.
pub struct RbMultiMap<K, V> {
    /// `links[0]` is the sentinel; `links[i]` pairs with `slots[i - 1]`.
    links: Vec<Links>,
    slots: Vec<Slot<K, V>>,
    root: NodeId,
    value_count: usize,
}

impl<K, V> RbMultiMap<K, V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(Config {
            initial_capacity: capacity,
        })
    }

    pub fn with_config(config: Config) -> Self {
        let mut links = Vec::with_capacity(config.initial_capacity + 1);
        links.push(Links::SENTINEL);
        Self {
            links,
            slots: Vec::with_capacity(config.initial_capacity),
            root: NodeId::NIL,
            value_count: 0,
        }
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    /// Total number of values across all keys.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    /// Nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, 1));
        }
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for dir in [Dir::Left, Dir::Right] {
                let child = self.child(id, dir);
                if !child.is_nil() {
                    stack.push((child, depth + 1));
                }
            }
        }
        deepest
    }

    /// Black nodes on a path from the root down to the sentinel, counting the
    /// sentinel and excluding the root. `None` for an empty tree.
    pub fn black_height(&self) -> Option<usize> {
        if self.root.is_nil() {
            return None;
        }
        let mut count = 0;
        let mut id = self.root;
        loop {
            let next = self.child(id, Dir::Left);
            if self.color(next) == Color::Black {
                count += 1;
            }
            if next.is_nil() {
                return Some(count);
            }
            id = next;
        }
    }

    /// Ascending in-order iterator over `(key, values)`.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.descend_left(self.root);
        iter
    }

    /// Same as [`iter`](Self::iter).
    pub fn traverse(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &[V]> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Render the tree sideways: right subtree first, one key per line,
    /// indented four spaces per level.
    pub fn display(&self) -> TreeDisplay<'_, K, V> {
        TreeDisplay { tree: self }
    }

    /// Drop every node, children before parents, and reset to empty.
    ///
    /// The sentinel survives. Calling this on an empty tree does nothing.
    pub fn clear(&mut self) {
        if self.root.is_nil() {
            return;
        }

        let mut order = self.post_order();
        let nodes = order.len();
        let values = self.value_count;

        // Slices drop front to back, so lay the payloads out in post-order.
        self.arrange_slots(&mut order);
        self.slots.clear();

        self.links.truncate(1);
        self.root = NodeId::NIL;
        self.value_count = 0;
        debug!(nodes, values, "cleared tree");
    }

    /// Permute `slots` in place so position `i` holds the payload of
    /// `order[i]`. Consumes `order`: each entry is reset to the sentinel
    /// once placed. Links are not updated, so this is only valid right
    /// before the payloads are dropped.
    fn arrange_slots(&mut self, order: &mut [NodeId]) {
        debug_assert_eq!(order.len(), self.slots.len());
        for start in 0..order.len() {
            let mut at = start;
            while !order[at].is_nil() {
                let from = order[at].slot();
                order[at] = NodeId::NIL;
                if from == start {
                    break;
                }
                self.slots.swap(at, from);
                at = from;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Arena accessors
    // -------------------------------------------------------------------------

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.links[id.index()].color
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        debug_assert!(!id.is_nil(), "sentinel color is fixed");
        self.links[id.index()].color = color;
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.links[id.index()].parent
    }

    #[inline]
    fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        debug_assert!(!id.is_nil(), "sentinel parent is fixed");
        self.links[id.index()].parent = parent;
    }

    #[inline]
    fn child(&self, id: NodeId, dir: Dir) -> NodeId {
        self.links[id.index()].child[dir as usize]
    }

    #[inline]
    fn set_child(&mut self, id: NodeId, dir: Dir, child: NodeId) {
        debug_assert!(!id.is_nil(), "sentinel children are fixed");
        self.links[id.index()].child[dir as usize] = child;
    }

    /// Which side of its parent `id` hangs on. Not meaningful for the root.
    #[inline]
    fn side(&self, id: NodeId) -> Dir {
        if self.child(self.parent(id), Dir::Left) == id {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    #[inline]
    fn key(&self, id: NodeId) -> &K {
        &self.slots[id.slot()].key
    }

    #[inline]
    fn node_values(&self, id: NodeId) -> &[V] {
        &self.slots[id.slot()].values
    }

    /// Every node in post-order (left, right, node).
    fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = Vec::new();
        if !self.root.is_nil() {
            stack.push(self.root);
        }
        while let Some(id) = stack.pop() {
            out.push(id);
            for dir in [Dir::Left, Dir::Right] {
                let child = self.child(id, dir);
                if !child.is_nil() {
                    stack.push(child);
                }
            }
        }
        // Node-right-left preorder, reversed.
        out.reverse();
        out
    }

    // -------------------------------------------------------------------------
    // Rotations
    // -------------------------------------------------------------------------

    /// Lift `node`'s right child into its place.
    fn rotate_left(&mut self, node: NodeId) {
        self.rotate(node, Dir::Left);
    }

    /// Lift `node`'s left child into its place.
    fn rotate_right(&mut self, node: NodeId) {
        self.rotate(node, Dir::Right);
    }

    /// Rotate `node` down toward `dir`; its child on the opposite side takes
    /// its place. Colors and keys are untouched.
    ///
    /// # Panics
    /// Panics if the child that moves up is the sentinel.
    fn rotate(&mut self, node: NodeId, dir: Dir) {
        let up = self.child(node, dir.opposite());
        assert!(!up.is_nil(), "rotation pivot is the sentinel");

        let inner = self.child(up, dir);
        self.set_child(node, dir.opposite(), inner);
        if !inner.is_nil() {
            self.set_parent(inner, node);
        }

        let parent = self.parent(node);
        self.set_parent(up, parent);
        if parent.is_nil() {
            self.root = up;
        } else {
            let side = self.side(node);
            self.set_child(parent, side, up);
        }

        self.set_child(up, dir, node);
        self.set_parent(node, up);
    }

    // -------------------------------------------------------------------------
    // In-order walk by handle
    // -------------------------------------------------------------------------

    fn in_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut iter = self.iter();
        std::iter::from_fn(move || iter.next_node())
    }
}

impl<K: Ord, V> RbMultiMap<K, V> {
    /// Insert `value` under `key`.
    ///
    /// An existing key gets `value` appended to its collection and the tree
    /// shape is left alone. A new key gets a red node followed by the
    /// insertion fixup. Returns `true` when a node was created.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut parent = NodeId::NIL;
        let mut dir = Dir::Left;
        let mut current = self.root;

        while !current.is_nil() {
            dir = match key.cmp(self.key(current)) {
                Ordering::Equal => {
                    self.slots[current.slot()].values.push(value);
                    self.value_count += 1;
                    return false;
                }
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
            };
            parent = current;
            current = self.child(current, dir);
        }

        let node = NodeId::from_index(self.links.len());
        self.links.push(Links {
            color: Color::Red,
            parent,
            child: [NodeId::NIL; 2],
        });
        self.slots.push(Slot {
            key,
            values: smallvec![value],
        });
        self.value_count += 1;

        if parent.is_nil() {
            self.root = node;
        } else {
            self.set_child(parent, dir, node);
        }
        trace!(node = node.index(), "structural insert");

        self.fix_insert(node);
        true
    }

    /// Restore the red-black rules after `node` was attached red.
    fn fix_insert(&mut self, mut node: NodeId) {
        // A red parent is never the root, so the grandparent is real.
        while self.color(self.parent(node)) == Color::Red {
            let parent = self.parent(node);
            let grandparent = self.parent(parent);
            let side = self.side(parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.color(uncle) == Color::Red {
                trace!(node = grandparent.index(), "fixup: recolor");
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            if self.side(node) != side {
                trace!(node = parent.index(), "fixup: inner rotation");
                node = parent;
                match side {
                    Dir::Left => self.rotate_left(node),
                    Dir::Right => self.rotate_right(node),
                }
            }

            trace!(node = grandparent.index(), "fixup: outer rotation");
            let parent = self.parent(node);
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            match side {
                Dir::Left => self.rotate_right(grandparent),
                Dir::Right => self.rotate_left(grandparent),
            }
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// All values stored under `key`, in insertion order.
    pub fn find<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while !current.is_nil() {
            current = match key.cmp(self.key(current).borrow()) {
                Ordering::Equal => return Some(self.node_values(current)),
                Ordering::Less => self.child(current, Dir::Left),
                Ordering::Greater => self.child(current, Dir::Right),
            };
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Verify every red-black and structural invariant, reporting the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<()> {
        let result = self.verify();
        if let Err(ref err) = result {
            warn!(%err, "red-black invariant violated");
        }
        result
    }

    fn verify(&self) -> Result<()> {
        if self.color(NodeId::NIL) != Color::Black {
            return Err(InvariantError::RedSentinel);
        }

        if self.links.len() != self.slots.len() + 1 {
            return Err(InvariantError::ArenaLengthMismatch {
                links: self.links.len(),
                slots: self.slots.len(),
            });
        }

        let order = self.post_order();
        if order.len() != self.len() {
            return Err(InvariantError::NodeCountMismatch {
                reachable: order.len(),
                stored: self.len(),
            });
        }
        if self.root.is_nil() {
            return Ok(());
        }

        let root = self.root;
        if self.color(root) == Color::Red {
            return Err(InvariantError::RedRoot { node: root.index() });
        }
        if !self.parent(root).is_nil() {
            return Err(InvariantError::RootHasParent { node: root.index() });
        }

        // Children come before parents, so each child's black-height is
        // known by the time its parent is checked. The sentinel stays at 0.
        let mut black_height = vec![0usize; self.links.len()];
        let mut counted = 0;
        for id in order {
            let values = self.node_values(id).len();
            if values == 0 {
                return Err(InvariantError::EmptyValues { node: id.index() });
            }
            counted += values;

            let mut below = [0usize; 2];
            for dir in [Dir::Left, Dir::Right] {
                let child = self.child(id, dir);
                if !child.is_nil() {
                    if self.parent(child) != id {
                        return Err(InvariantError::BrokenParentLink {
                            parent: id.index(),
                            child: child.index(),
                        });
                    }
                    if self.color(id) == Color::Red && self.color(child) == Color::Red {
                        return Err(InvariantError::RedChildOfRed {
                            node: id.index(),
                            child: child.index(),
                        });
                    }
                }
                below[dir as usize] = black_height[child.index()]
                    + usize::from(self.color(child) == Color::Black);
            }

            if below[0] != below[1] {
                return Err(InvariantError::BlackHeightMismatch {
                    node: id.index(),
                    left: below[0],
                    right: below[1],
                });
            }
            black_height[id.index()] = below[0];
        }

        if counted != self.value_count {
            return Err(InvariantError::ValueCountMismatch {
                counted,
                recorded: self.value_count,
            });
        }

        let mut prev: Option<NodeId> = None;
        for id in self.in_order() {
            if let Some(prev) = prev {
                if self.key(prev) >= self.key(id) {
                    return Err(InvariantError::KeysOutOfOrder { node: id.index() });
                }
            }
            prev = Some(id);
        }

        Ok(())
    }
}

impl<K: Ord, V> MultiMap<K, V> for RbMultiMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> bool {
        RbMultiMap::insert(self, key, value)
    }

    fn find(&self, key: &K) -> Option<&[V]> {
        RbMultiMap::find(self, key)
    }
}

impl<K, V> Drop for RbMultiMap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Default for RbMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for RbMultiMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
            slots: self.slots.clone(),
            root: self.root,
            value_count: self.value_count,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbMultiMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbMultiMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbMultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a RbMultiMap<K, V> {
    type Item = (&'a K, &'a [V]);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration and display
// =============================================================================

/// Ascending in-order iterator driven by an explicit stack.
pub struct Iter<'a, K, V> {
    tree: &'a RbMultiMap<K, V>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn descend_left(&mut self, mut id: NodeId) {
        while !id.is_nil() {
            self.stack.push(id);
            id = self.tree.child(id, Dir::Left);
        }
    }

    fn next_node(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.descend_left(self.tree.child(id, Dir::Right));
        self.remaining -= 1;
        Some(id)
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next_node()?;
        let tree = self.tree;
        Some((tree.key(id), tree.node_values(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// Sideways rendering returned by [`RbMultiMap::display`].
pub struct TreeDisplay<'a, K, V> {
    tree: &'a RbMultiMap<K, V>,
}

impl<K: fmt::Display, V> fmt::Display for TreeDisplay<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree;
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        let mut current = (tree.root, 0);
        loop {
            while !current.0.is_nil() {
                stack.push(current);
                current = (tree.child(current.0, Dir::Right), current.1 + 1);
            }
            let Some((id, depth)) = stack.pop() else {
                return Ok(());
            };
            writeln!(f, "{:indent$}{}", "", tree.key(id), indent = depth * 4)?;
            current = (tree.child(id, Dir::Left), depth + 1);
        }
    }
}


#[cfg(test)]
mod proptests;
