//! Error types for invariant checking.

use thiserror::Error;

/// Result type alias using `InvariantError`.
pub type Result<T> = std::result::Result<T, InvariantError>;

/// A red-black or structural invariant that `check_invariants` found broken.
///
/// Node handles are arena indices; they identify nodes within one tree only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    // -------------------------------------------------------------------------
    // Color rules
    // -------------------------------------------------------------------------
    #[error("sentinel is red")]
    RedSentinel,

    #[error("root node {node} is red")]
    RedRoot { node: usize },

    #[error("red node {node} has red child {child}")]
    RedChildOfRed { node: usize, child: usize },

    #[error("black-height mismatch at node {node}: left {left}, right {right}")]
    BlackHeightMismatch {
        node: usize,
        left: usize,
        right: usize,
    },

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------
    #[error("in-order keys not strictly increasing at node {node}")]
    KeysOutOfOrder { node: usize },

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------
    #[error("root node {node} has a parent")]
    RootHasParent { node: usize },

    #[error("node {child} does not link back to parent {parent}")]
    BrokenParentLink { parent: usize, child: usize },

    #[error("node {node} holds no values")]
    EmptyValues { node: usize },

    #[error("{links} link records for {slots} payloads")]
    ArenaLengthMismatch { links: usize, slots: usize },

    #[error("{reachable} nodes reachable from root, {stored} stored")]
    NodeCountMismatch { reachable: usize, stored: usize },

    #[error("{counted} values held by nodes, {recorded} recorded")]
    ValueCountMismatch { counted: usize, recorded: usize },
}
