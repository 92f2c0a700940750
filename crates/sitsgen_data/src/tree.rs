//! Composite dataset trees.
//!
//! Views generated independently (one per seed) are aggregated by repeated
//! pairwise concatenation into a binary tree:
//!
//! ```text
//!                 +---+ Concat +---+
//!                 |                |
//!           +-- Concat --+       Leaf
//!           |            |
//!         Concat       Leaf
//!           |
//!          ...
//! ```
//!
//! A left fold over the leaves always yields this shape, where the right
//! child of every internal node is a leaf. Global indices follow the fold
//! order. Traversals, including drop, use explicit stacks so tree depth is
//! not bounded by the call stack.

use std::fmt;
use std::mem;
use std::ops::Add;

use ndarray::{Array2, Array3};

use sitsgen_core::LeafTransform;

use crate::error::{DataError, Result};
use crate::product::{FrameDataset, ProductDataset};

/// Node of a composite dataset tree.
pub enum DatasetNode {
    /// A single product dataset.
    Leaf(ProductDataset),
    /// Concatenation of two subtrees, `left` indexed first.
    Concat {
        /// Subtree holding the lower global indices.
        left: Box<DatasetNode>,
        /// Subtree holding the higher global indices.
        right: Box<DatasetNode>,
        /// Total number of frames below this node.
        len: usize,
    },
}

impl DatasetNode {
    /// Wrap a product dataset as a leaf.
    #[must_use]
    pub fn leaf(dataset: ProductDataset) -> Self {
        DatasetNode::Leaf(dataset)
    }

    /// Concatenate two trees, `self` first.
    #[must_use]
    pub fn concat(self, other: DatasetNode) -> Self {
        let len = self.len() + other.len();
        DatasetNode::Concat {
            left: Box::new(self),
            right: Box::new(other),
            len,
        }
    }

    /// Left-fold a sequence of product datasets into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] if `leaves` is empty.
    pub fn from_leaves<I>(leaves: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProductDataset>,
    {
        leaves
            .into_iter()
            .map(DatasetNode::leaf)
            .reduce(Add::add)
            .ok_or(DataError::EmptyDataset)
    }

    /// Check if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, DatasetNode::Leaf(_))
    }

    /// Number of leaves below this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.leaves().len()
    }

    /// Number of internal nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                DatasetNode::Leaf(_) => max_depth = max_depth.max(depth),
                DatasetNode::Concat { left, right, .. } => {
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Leaves in global index order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&ProductDataset> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                DatasetNode::Leaf(dataset) => leaves.push(dataset),
                DatasetNode::Concat { left, right, .. } => {
                    stack.push(&**right);
                    stack.push(&**left);
                }
            }
        }
        leaves
    }

    /// Leaf holding global `index`, with the index local to that leaf.
    pub fn locate(&self, index: usize) -> Result<(&ProductDataset, usize)> {
        if index >= self.len() {
            return Err(DataError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        let mut node = self;
        let mut local = index;
        loop {
            match node {
                DatasetNode::Leaf(dataset) => return Ok((dataset, local)),
                DatasetNode::Concat { left, right, .. } => {
                    if local < left.len() {
                        node = &**left;
                    } else {
                        local -= left.len();
                        node = &**right;
                    }
                }
            }
        }
    }

    /// Install `transform` on every leaf below this node.
    ///
    /// The transform goes into the slot its variant names, replacing what
    /// was there. Calling this twice with the same transform leaves the tree
    /// in the same state as calling it once.
    pub fn propagate(&mut self, transform: &LeafTransform) {
        let mut n_leaves = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                DatasetNode::Leaf(dataset) => {
                    dataset.set_transform(transform.clone());
                    n_leaves += 1;
                }
                DatasetNode::Concat { left, right, .. } => {
                    stack.push(right.as_mut());
                    stack.push(left.as_mut());
                }
            }
        }
        tracing::debug!("Set {} on {} leaves", transform.slot(), n_leaves);
    }
}

impl Drop for DatasetNode {
    fn drop(&mut self) {
        // detach every subtree so each node is dropped with leaf children only
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut node) = stack.pop() {
            node.detach_children(&mut stack);
        }
    }
}

impl DatasetNode {
    fn detach_children(&mut self, stack: &mut Vec<DatasetNode>) {
        if let DatasetNode::Concat { left, right, .. } = self {
            for child in [left, right] {
                if !child.is_leaf() {
                    stack.push(mem::replace(&mut **child, DatasetNode::Leaf(ProductDataset::placeholder())));
                }
            }
        }
    }
}

impl fmt::Debug for DatasetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetNode")
            .field("len", &self.len())
            .field("n_leaves", &self.n_leaves())
            .finish()
    }
}

/// Install `transform` on every leaf of `tree`, see [`DatasetNode::propagate`].
pub fn propagate(tree: &mut DatasetNode, transform: &LeafTransform) {
    tree.propagate(transform);
}

impl Add for DatasetNode {
    type Output = DatasetNode;

    fn add(self, rhs: DatasetNode) -> DatasetNode {
        self.concat(rhs)
    }
}

impl FrameDataset for DatasetNode {
    fn len(&self) -> usize {
        match self {
            DatasetNode::Leaf(dataset) => dataset.len(),
            DatasetNode::Concat { len, .. } => *len,
        }
    }

    fn get(&self, index: usize) -> Result<(Array3<f32>, Array2<i64>)> {
        let (dataset, local) = self.locate(index)?;
        dataset.get(local)
    }
}
