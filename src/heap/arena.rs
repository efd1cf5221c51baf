//! Node Arena Module
//!
//! Stable index-addressed storage for heap nodes. Ring, parent and child links
//! are `NodeId`s into this arena, so the cyclic node graph never owns itself.

// == Node Id ==
/// Index of a node slot in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

// == Node Arena ==
/// Vector of optional slots with a free list for reuse.
#[derive(Debug)]
pub struct NodeArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value built from the id it will occupy, for self-referential
    /// ring links.
    pub fn insert_with(&mut self, build: impl FnOnce(NodeId) -> T) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(build(NodeId(idx)));
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(Some(build(NodeId(idx))));
            idx
        };
        self.len += 1;
        NodeId(idx)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = NodeArena::new();
        let a = arena.insert_with(|_| "a");
        let b = arena.insert_with(|_| "b");

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn test_remove_frees_slot_for_reuse() {
        let mut arena = NodeArena::new();
        let a = arena.insert_with(|_| 1);
        let _b = arena.insert_with(|_| 2);

        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert!(arena.get(a).is_none());

        let c = arena.insert_with(|_| 3);
        assert_eq!(c.index(), a.index());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_insert_with_sees_own_id() {
        let mut arena = NodeArena::new();
        let _a = arena.insert_with(|id| id.index());
        let b = arena.insert_with(|id| id.index());
        assert_eq!(arena.get(b), Some(&b.index()));
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut arena = NodeArena::new();
        let a = arena.insert_with(|_| 10);
        *arena.get_mut(a).unwrap() += 5;
        assert_eq!(arena.get(a), Some(&15));

        arena.clear();
        assert_eq!(arena.len(), 0);
        assert!(arena.get(a).is_none());
    }
}
