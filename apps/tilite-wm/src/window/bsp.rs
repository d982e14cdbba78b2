//! Binary space partition of a workspace.
//!
//! Nodes live in a slot map and refer to each other by [`NodeId`], parent
//! links included, so splicing never leaves a dangling reference. A split does
//! not remember its orientation: [`BspTree::layout`] derives it from the
//! rectangle handed to the node on every pass.

use slotmap::{new_key_type, SlotMap};

use crate::window::geometry::Rect;

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<T> {
    Leaf(T),
    Split { first: NodeId, second: NodeId },
}

#[derive(Debug, Clone)]
struct Node<T> {
    kind: NodeKind<T>,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct BspTree<T> {
    nodes: SlotMap<NodeId, Node<T>>,
    root: Option<NodeId>,
}

impl<T> Default for BspTree<T> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }
}

impl<T: Copy + PartialEq> BspTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind<T>> {
        self.nodes.get(node).map(|n| &n.kind)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn find_leaf(&self, value: T) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.kind == NodeKind::Leaf(value))
            .map(|(id, _)| id)
    }

    pub fn contains(&self, value: T) -> bool {
        self.find_leaf(value).is_some()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Leaf(_)))
            .count()
    }

    pub fn split_count(&self) -> usize {
        self.nodes.len() - self.leaf_count()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Adds `value` next to `anchor`.
    ///
    /// An empty tree becomes a single leaf. When `anchor` is a leaf, that leaf
    /// turns into a split holding `anchor` first and `value` second. Otherwise
    /// the whole tree is pushed down as the first child of a new root so the
    /// newcomer claims half of the workspace.
    pub fn insert(&mut self, anchor: Option<T>, value: T) -> NodeId {
        if let Some(existing) = self.find_leaf(value) {
            return existing;
        }

        let Some(root) = self.root else {
            let leaf = self.nodes.insert(Node {
                kind: NodeKind::Leaf(value),
                parent: None,
            });
            self.root = Some(leaf);
            return leaf;
        };

        match anchor.and_then(|a| self.find_leaf(a)) {
            Some(leaf) => {
                let NodeKind::Leaf(anchor_value) = self.nodes[leaf].kind else {
                    unreachable!("find_leaf only returns leaves");
                };
                let first = self.nodes.insert(Node {
                    kind: NodeKind::Leaf(anchor_value),
                    parent: Some(leaf),
                });
                let second = self.nodes.insert(Node {
                    kind: NodeKind::Leaf(value),
                    parent: Some(leaf),
                });
                // The anchor slot becomes the split, so its parent link is kept as is.
                self.nodes[leaf].kind = NodeKind::Split { first, second };
                second
            }
            None => {
                let split = self.nodes.insert(Node {
                    kind: NodeKind::Split {
                        first: root,
                        second: root,
                    },
                    parent: None,
                });
                let second = self.nodes.insert(Node {
                    kind: NodeKind::Leaf(value),
                    parent: Some(split),
                });
                self.nodes[split].kind = NodeKind::Split { first: root, second };
                self.nodes[root].parent = Some(split);
                self.root = Some(split);
                second
            }
        }
    }

    /// Removes the leaf holding `value`, promoting its sibling into the
    /// parent's slot. Returns false when `value` is not in the tree.
    pub fn remove(&mut self, value: T) -> bool {
        let Some(leaf) = self.find_leaf(value) else {
            return false;
        };

        let Some(parent) = self.nodes[leaf].parent else {
            self.nodes.remove(leaf);
            self.root = None;
            return true;
        };

        let NodeKind::Split { first, second } = self.nodes[parent].kind else {
            unreachable!("a parent is always a split");
        };
        let sibling = if first == leaf { second } else { first };
        let grandparent = self.nodes[parent].parent;

        self.nodes[sibling].parent = grandparent;
        match grandparent {
            None => self.root = Some(sibling),
            Some(gp) => {
                if let NodeKind::Split { first, second } = &mut self.nodes[gp].kind {
                    if *first == parent {
                        *first = sibling;
                    } else {
                        *second = sibling;
                    }
                }
            }
        }

        self.nodes.remove(leaf);
        self.nodes.remove(parent);
        true
    }

    /// Exchanges the slots of two leaves. Both must be present.
    pub fn swap(&mut self, a: T, b: T) -> bool {
        if a == b {
            return false;
        }
        match (self.find_leaf(a), self.find_leaf(b)) {
            (Some(la), Some(lb)) => {
                self.nodes[la].kind = NodeKind::Leaf(b);
                self.nodes[lb].kind = NodeKind::Leaf(a);
                true
            }
            _ => false,
        }
    }

    /// Leaf values in first-to-second order.
    pub fn leaves(&self) -> Vec<T> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_leaves(root, &mut out);
        }
        out
    }

    fn collect_leaves(&self, node: NodeId, out: &mut Vec<T>) {
        match self.nodes[node].kind {
            NodeKind::Leaf(value) => out.push(value),
            NodeKind::Split { first, second } => {
                self.collect_leaves(first, out);
                self.collect_leaves(second, out);
            }
        }
    }

    /// Rectangle of every leaf when the tree is laid out over `area` with
    /// `gap` pixels between siblings.
    pub fn layout(&self, area: Rect, gap: i32) -> Vec<(T, Rect)> {
        let mut out = Vec::with_capacity(self.nodes.len() / 2 + 1);
        if let Some(root) = self.root {
            self.assign_rects(root, area, gap, &mut out);
        }
        out
    }

    fn assign_rects(&self, node: NodeId, rect: Rect, gap: i32, out: &mut Vec<(T, Rect)>) {
        match self.nodes[node].kind {
            NodeKind::Leaf(value) => out.push((value, rect)),
            NodeKind::Split { first, second } => {
                let (a, b) = rect.split(gap);
                self.assign_rects(first, a, gap, out);
                self.assign_rects(second, b, gap, out);
            }
        }
    }
}
