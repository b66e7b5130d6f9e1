//! # multimap-baselines
//!
//! Simple structures exposing the same [`MultiMap`] contract as
//! [`rb_multimap::RbMultiMap`], kept for side-by-side comparison.
//!
//! - [`UnbalancedTree`]: a plain binary search tree. Sorted input degrades it
//!   to a linked list.
//! - [`ChainedHashTable`]: separate chaining over a fixed number of buckets.
//! - [`SimpleMultiMap`]: `BTreeMap<K, Vec<V>>`, the reference answer.
//!
//! ## Example
//!
//! ```rust
//! use multimap_baselines::{ChainedHashTable, UnbalancedTree};
//! use rb_multimap::{MultiMap, RbMultiMap};
//!
//! fn load<M: MultiMap<&'static str, u32>>(map: &mut M) {
//!     for (key, value) in ["b", "a", "c", "a"].into_iter().zip(1..) {
//!         map.insert(key, value);
//!     }
//! }
//!
//! let mut rb = RbMultiMap::new();
//! let mut bst = UnbalancedTree::new();
//! let mut hash = ChainedHashTable::new();
//! load(&mut rb);
//! load(&mut bst);
//! load(&mut hash);
//!
//! assert_eq!(MultiMap::find(&rb, &"a"), Some(&[2, 4][..]));
//! assert_eq!(bst.find(&"a"), Some(&[2, 4][..]));
//! assert_eq!(hash.find(&"a"), Some(&[2, 4][..]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chained;
pub mod error;
pub mod simple;
pub mod unbalanced;

pub use chained::ChainedHashTable;
pub use error::{ConfigError, Result};
pub use simple::SimpleMultiMap;
pub use unbalanced::UnbalancedTree;

pub use rb_multimap::MultiMap;
