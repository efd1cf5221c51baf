//! Priority Heap Module
//!
//! A Fibonacci-style mergeable min-heap indexed by key:
//! - O(1) amortized insert and decrease-key
//! - O(log n) amortized pop and delete
//!
//! Roots and each node's children form circular doubly linked rings. Nodes
//! live in a [`NodeArena`] and refer to each other by [`NodeId`].

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::HeapError;
use crate::heap::arena::{NodeArena, NodeId};

// == Rank ==
/// Internal priority. `Floor` sorts below every `At`, and is only ever held
/// by a node on its way out through `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank<P> {
    Floor,
    At(P),
}

impl<P> Rank<P> {
    fn into_value(self) -> P {
        match self {
            Rank::At(priority) => priority,
            Rank::Floor => panic!("floor rank escaped the delete path"),
        }
    }
}

// == Node ==
#[derive(Debug)]
struct Node<K, P> {
    key: K,
    rank: Rank<P>,
    parent: Option<NodeId>,
    child: Option<NodeId>,
    left: NodeId,
    right: NodeId,
    degree: usize,
    marked: bool,
}

impl<K, P> Node<K, P> {
    fn new(key: K, rank: Rank<P>, id: NodeId) -> Self {
        Self {
            key,
            rank,
            parent: None,
            child: None,
            left: id,
            right: id,
            degree: 0,
            marked: false,
        }
    }
}

// == Priority Heap ==
/// Min-heap of unique keys with unique priorities.
///
/// Live priorities may only decrease through [`set`](Self::set); anything
/// else goes through [`delete`](Self::delete) and a fresh insert.
///
/// # Example
///
/// ```
/// use lrucache::PriorityHeap;
///
/// let mut heap = PriorityHeap::new();
/// heap.set("a", 5).unwrap();
/// heap.set("b", 3).unwrap();
/// heap.set("a", 1).unwrap();
/// assert_eq!(heap.pop(), Some(("a", 1)));
/// assert_eq!(heap.pop(), Some(("b", 3)));
/// assert_eq!(heap.pop(), None);
/// ```
#[derive(Debug)]
pub struct PriorityHeap<K, P> {
    arena: NodeArena<Node<K, P>>,
    /// Minimum node, always a member of the root ring
    root: Option<NodeId>,
    nodes_by_key: HashMap<K, NodeId>,
    nodes_by_priority: BTreeMap<P, NodeId>,
}

impl<K, P> PriorityHeap<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            nodes_by_key: HashMap::new(),
            nodes_by_priority: BTreeMap::new(),
        }
    }

    // == Size ==
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.nodes_by_key.contains_key(key)
    }

    /// Returns the current priority of `key`.
    pub fn priority_of(&self, key: &K) -> Option<&P> {
        let id = *self.nodes_by_key.get(key)?;
        match &self.node(id).rank {
            Rank::At(priority) => Some(priority),
            Rank::Floor => None,
        }
    }

    /// Returns the minimum entry without removing it.
    pub fn peek(&self) -> Option<(&K, &P)> {
        let node = self.node(self.root?);
        match &node.rank {
            Rank::At(priority) => Some((&node.key, priority)),
            Rank::Floor => None,
        }
    }

    /// Iterates `(key, priority)` pairs from the highest priority down.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &P)> + '_ {
        self.nodes_by_priority
            .iter()
            .rev()
            .map(move |(priority, &id)| (&self.node(id).key, priority))
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.nodes_by_key.clear();
        self.nodes_by_priority.clear();
    }

    // == Set ==
    /// Inserts `key` with `priority`, or decreases the priority of a live key.
    ///
    /// # Errors
    /// - [`HeapError::PriorityNotDecreased`] if `key` is live and `priority`
    ///   is not strictly smaller than its current one
    /// - [`HeapError::DuplicatePriority`] if another key holds `priority`
    pub fn set(&mut self, key: K, priority: P) -> Result<(), HeapError> {
        if let Some(&id) = self.nodes_by_key.get(&key) {
            match self.node(id).rank {
                Rank::At(current) if priority < current => {}
                _ => return Err(HeapError::PriorityNotDecreased),
            }
            if self.nodes_by_priority.contains_key(&priority) {
                return Err(HeapError::DuplicatePriority);
            }
            self.decrease(id, Rank::At(priority));
            return Ok(());
        }

        if self.nodes_by_priority.contains_key(&priority) {
            return Err(HeapError::DuplicatePriority);
        }

        let id = self
            .arena
            .insert_with(|id| Node::new(key.clone(), Rank::At(priority), id));
        self.add_root(id);
        if let Some(root) = self.root {
            if Rank::At(priority) < self.node(root).rank {
                self.root = Some(id);
            }
        }
        self.nodes_by_key.insert(key, id);
        self.nodes_by_priority.insert(priority, id);
        Ok(())
    }

    // == Pop ==
    /// Removes and returns the minimum `(key, priority)`.
    pub fn pop(&mut self) -> Option<(K, P)> {
        self.extract_min()
            .map(|(key, rank)| (key, rank.into_value()))
    }

    // == Delete ==
    /// Removes `key`, returning the priority it held.
    pub fn delete(&mut self, key: &K) -> Option<P> {
        let id = *self.nodes_by_key.get(key)?;
        let priority = self.node(id).rank.into_value();
        self.decrease(id, Rank::Floor);
        debug_assert_eq!(self.root, Some(id), "floored node must be the minimum");
        self.extract_min();
        Some(priority)
    }

    // == Check Invariants ==
    /// Walks every ring and verifies links, degrees, marks, heap order, the
    /// minimum pointer and both indices. O(n).
    pub fn check_invariants(&self) -> Result<(), HeapError> {
        let corrupted = |msg: String| Err(HeapError::Corrupted(msg));

        let Some(root) = self.root else {
            if self.arena.len() != 0 || !self.nodes_by_key.is_empty() {
                return corrupted("empty heap still holds nodes".to_string());
            }
            return Ok(());
        };

        let limit = self.arena.len();
        let roots = self.ring(root, limit)?;
        let mut visited = 0;
        let mut stack = Vec::new();

        for &id in &roots {
            let node = self.node(id);
            if node.parent.is_some() {
                return corrupted(format!("root {} has a parent", id.index()));
            }
            if node.marked {
                return corrupted(format!("root {} is marked", id.index()));
            }
            if node.rank < self.node(root).rank {
                return corrupted(format!("root {} is below the minimum", id.index()));
            }
            stack.push(id);
        }

        while let Some(id) = stack.pop() {
            visited += 1;
            let node = self.node(id);

            match node.rank {
                Rank::At(priority) => {
                    if self.nodes_by_priority.get(&priority) != Some(&id) {
                        return corrupted(format!("node {} missing from priority index", id.index()));
                    }
                }
                Rank::Floor => {
                    return corrupted(format!("node {} holds the floor rank", id.index()));
                }
            }
            if self.nodes_by_key.get(&node.key) != Some(&id) {
                return corrupted(format!("node {} missing from key index", id.index()));
            }

            let children = match node.child {
                Some(child) => self.ring(child, limit)?,
                None => Vec::new(),
            };
            if children.len() != node.degree {
                return corrupted(format!(
                    "node {} has degree {} but {} children",
                    id.index(),
                    node.degree,
                    children.len()
                ));
            }
            for child in children {
                let child_node = self.node(child);
                if child_node.parent != Some(id) {
                    return corrupted(format!("child {} has a wrong parent", child.index()));
                }
                if child_node.rank < node.rank {
                    return corrupted(format!("child {} violates heap order", child.index()));
                }
                stack.push(child);
            }
        }

        if visited != self.arena.len()
            || visited != self.nodes_by_key.len()
            || visited != self.nodes_by_priority.len()
        {
            return corrupted(format!(
                "reached {} nodes, arena holds {}, key index {}, priority index {}",
                visited,
                self.arena.len(),
                self.nodes_by_key.len(),
                self.nodes_by_priority.len()
            ));
        }
        Ok(())
    }

    // == Internals ==

    fn node(&self, id: NodeId) -> &Node<K, P> {
        match self.arena.get(id) {
            Some(node) => node,
            None => panic!("heap node {} missing from arena", id.index()),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, P> {
        match self.arena.get_mut(id) {
            Some(node) => node,
            None => panic!("heap node {} missing from arena", id.index()),
        }
    }

    /// Collects the ring containing `start`, checking link symmetry.
    fn ring(&self, start: NodeId, limit: usize) -> Result<Vec<NodeId>, HeapError> {
        let mut members = Vec::new();
        let mut current = start;
        loop {
            let right = self.node(current).right;
            if self.node(right).left != current {
                return Err(HeapError::Corrupted(format!(
                    "ring link {} -> {} is not mirrored",
                    current.index(),
                    right.index()
                )));
            }
            members.push(current);
            if members.len() > limit {
                return Err(HeapError::Corrupted(format!(
                    "ring through {} never closes",
                    start.index()
                )));
            }
            current = right;
            if current == start {
                return Ok(members);
            }
        }
    }

    /// Splices the singleton `id` into the ring to the left of `anchor`.
    fn splice(&mut self, anchor: NodeId, id: NodeId) {
        let anchor_left = self.node(anchor).left;
        {
            let node = self.node_mut(id);
            node.right = anchor;
            node.left = anchor_left;
        }
        self.node_mut(anchor_left).right = id;
        self.node_mut(anchor).left = id;
    }

    /// Removes `id` from its ring, leaving it a singleton.
    fn unlink(&mut self, id: NodeId) {
        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };
        self.node_mut(left).right = right;
        self.node_mut(right).left = left;
        let node = self.node_mut(id);
        node.left = id;
        node.right = id;
    }

    fn add_root(&mut self, id: NodeId) {
        match self.root {
            Some(root) => self.splice(root, id),
            None => self.root = Some(id),
        }
    }

    fn decrease(&mut self, id: NodeId, rank: Rank<P>) {
        let old = self.node(id).rank;
        if let Rank::At(priority) = old {
            if self.nodes_by_priority.remove(&priority) != Some(id) {
                panic!("heap node {} missing from priority index", id.index());
            }
        }
        self.node_mut(id).rank = rank;
        if let Rank::At(priority) = rank {
            self.nodes_by_priority.insert(priority, id);
        }

        if let Some(parent) = self.node(id).parent {
            if rank < self.node(parent).rank {
                self.cut(id, parent);
                self.cascading_cut(parent);
            }
        }

        if let Some(root) = self.root {
            if rank < self.node(root).rank {
                self.root = Some(id);
            }
        }
    }

    /// Moves `id` from `parent`'s children into the root ring.
    fn cut(&mut self, id: NodeId, parent: NodeId) {
        let right = self.node(id).right;
        self.unlink(id);
        {
            let parent_node = self.node_mut(parent);
            parent_node.degree -= 1;
            if parent_node.degree == 0 {
                parent_node.child = None;
            } else if parent_node.child == Some(id) {
                parent_node.child = Some(right);
            }
        }
        {
            let node = self.node_mut(id);
            node.parent = None;
            node.marked = false;
        }
        self.add_root(id);
    }

    fn cascading_cut(&mut self, id: NodeId) {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if !self.node(current).marked {
                self.node_mut(current).marked = true;
                return;
            }
            self.cut(current, parent);
            current = parent;
        }
    }

    /// Makes the root `child` a child of the root `parent`.
    fn link(&mut self, child: NodeId, parent: NodeId) {
        self.unlink(child);
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.marked = false;
        }
        match self.node(parent).child {
            Some(first) => self.splice(first, child),
            None => self.node_mut(parent).child = Some(child),
        }
        self.node_mut(parent).degree += 1;
    }

    fn extract_min(&mut self) -> Option<(K, Rank<P>)> {
        let min = self.root?;

        if let Some(first) = self.node(min).child {
            let children = self.ring_members(first);
            for child in children {
                self.unlink(child);
                {
                    let node = self.node_mut(child);
                    node.parent = None;
                    node.marked = false;
                }
                self.splice(min, child);
            }
            let node = self.node_mut(min);
            node.child = None;
            node.degree = 0;
        }

        let next = self.node(min).right;
        if next == min {
            self.root = None;
        } else {
            self.unlink(min);
            self.root = Some(next);
            self.consolidate(next);
        }

        let node = match self.arena.remove(min) {
            Some(node) => node,
            None => panic!("popped node {} missing from arena", min.index()),
        };
        if self.nodes_by_key.remove(&node.key) != Some(min) {
            panic!("popped node {} missing from key index", min.index());
        }
        if let Rank::At(priority) = node.rank {
            if self.nodes_by_priority.remove(&priority) != Some(min) {
                panic!("popped node {} missing from priority index", min.index());
            }
        }
        Some((node.key, node.rank))
    }

    fn ring_members(&self, first: NodeId) -> Vec<NodeId> {
        let mut children = vec![first];
        let mut current = self.node(first).right;
        while current != first {
            children.push(current);
            current = self.node(current).right;
        }
        children
    }

    /// Links roots of equal degree until every root degree is distinct, then
    /// points `root` at the smallest survivor.
    fn consolidate(&mut self, start: NodeId) {
        let roots = self.ring_members(start);
        let mut by_degree: Vec<Option<NodeId>> = Vec::new();

        for root in roots {
            let mut tree = root;
            let mut degree = self.node(tree).degree;
            loop {
                if by_degree.len() <= degree {
                    by_degree.resize(degree + 1, None);
                }
                let Some(other) = by_degree[degree].take() else {
                    by_degree[degree] = Some(tree);
                    break;
                };
                let (smaller, larger) = if self.node(other).rank < self.node(tree).rank {
                    (other, tree)
                } else {
                    (tree, other)
                };
                self.link(larger, smaller);
                tree = smaller;
                degree += 1;
            }
        }

        self.root = by_degree
            .into_iter()
            .flatten()
            .min_by(|&a, &b| self.node(a).rank.cmp(&self.node(b).rank));
    }
}

impl<K, P> Default for PriorityHeap<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
