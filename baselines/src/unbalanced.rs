//! Plain binary search tree without rebalancing.
//!
//! Insertion order decides the shape: random keys give O(log n) depth on
//! average, sorted keys give a chain of depth n. Descent and teardown are
//! iterative so a chain of any length is safe.

use std::cmp::Ordering;

use rb_multimap::MultiMap;

struct Node<K, V> {
    key: K,
    values: Vec<V>,
    left: Option<Box<Node<K, V>>>,
    right: Option<Box<Node<K, V>>>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(Self {
            key,
            values: vec![value],
            left: None,
            right: None,
        })
    }
}

/// An unbalanced binary search tree holding every value per key.
pub struct UnbalancedTree<K, V> {
    root: Option<Box<Node<K, V>>>,
    len: usize,
}

impl<K, V> UnbalancedTree<K, V> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Nodes on the longest root-to-leaf path; 0 when empty.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node<K, V>, usize)> = Vec::new();
        stack.extend(self.root.as_deref().map(|n| (n, 1)));
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.left.as_deref().map(|n| (n, depth + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, depth + 1)));
        }
        deepest
    }

    /// Drop every node and reset to empty.
    pub fn clear(&mut self) {
        let mut stack: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
        if self.len > 0 {
            tracing::debug!(nodes = self.len, "cleared unbalanced tree");
        }
        self.len = 0;
    }
}

impl<K: Ord, V> UnbalancedTree<K, V> {
    /// Append `value` under `key`. Returns `true` if the key was new.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = match key.cmp(&node.key) {
                Ordering::Equal => {
                    node.values.push(value);
                    return false;
                }
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
            };
        }
        *slot = Some(Node::new(key, value));
        self.len += 1;
        true
    }

    /// All values for `key`, in insertion order.
    pub fn find(&self, key: &K) -> Option<&[V]> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Equal => return Some(&node.values),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }
}

impl<K: Ord, V> MultiMap<K, V> for UnbalancedTree<K, V> {
    fn insert(&mut self, key: K, value: V) -> bool {
        UnbalancedTree::insert(self, key, value)
    }

    fn find(&self, key: &K) -> Option<&[V]> {
        UnbalancedTree::find(self, key)
    }
}

impl<K, V> Drop for UnbalancedTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Default for UnbalancedTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
