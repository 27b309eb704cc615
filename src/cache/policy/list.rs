//! Arena-backed doubly linked lists.
//!
//! Nodes live in a single slot arena and link to each other by index, so
//! several lists can share one arena and a node can be spliced between them
//! without reallocating. Front is most recent, back is least recent.

/// Stable handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Links ==
/// Head/tail of one list threaded through an arena.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// == Node Arena ==
/// Slot arena holding list nodes, with a free list for slot reuse.
#[derive(Debug)]
pub struct NodeArena<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<usize>,
}

impl<K> NodeArena<K> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocates a node for `key` at the front of `links`.
    pub fn push_front(&mut self, links: &mut Links, key: K) -> NodeId {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(links, NodeId(idx));
        NodeId(idx)
    }

    /// Splices a detached node in at the front of `links`.
    pub fn link_front(&mut self, links: &mut Links, id: NodeId) {
        let old_head = links.head;
        {
            let node = self.node_mut(id.0);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => self.node_mut(head).prev = Some(id.0),
            None => links.tail = Some(id.0),
        }
        links.head = Some(id.0);
        links.len += 1;
    }

    /// Detaches a node from `links` without freeing its slot.
    pub fn unlink(&mut self, links: &mut Links, id: NodeId) {
        let (prev, next) = {
            let node = self.node_mut(id.0);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => links.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => links.tail = prev,
        }
        links.len -= 1;
    }

    /// Moves a node already in `links` to its front.
    pub fn move_to_front(&mut self, links: &mut Links, id: NodeId) {
        if links.head == Some(id.0) {
            return;
        }
        self.unlink(links, id);
        self.link_front(links, id);
    }

    /// Detaches a node and frees its slot, returning the key.
    pub fn remove(&mut self, links: &mut Links, id: NodeId) -> K {
        self.unlink(links, id);
        self.free.push(id.0);
        match self.slots[id.0].take() {
            Some(node) => node.key,
            None => unreachable!("list node {} freed twice", id.0),
        }
    }

    /// Removes the least recent node of `links`.
    pub fn pop_back(&mut self, links: &mut Links) -> Option<K> {
        let tail = links.tail?;
        Some(self.remove(links, NodeId(tail)))
    }

    /// Returns the least recent key of `links`.
    pub fn back(&self, links: &Links) -> Option<&K> {
        links.tail.map(|idx| &self.node(idx).key)
    }

    /// Keys of `links` from most to least recent.
    pub fn keys<'a>(&'a self, links: &Links) -> impl Iterator<Item = &'a K> + 'a {
        let mut cursor = links.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?);
            cursor = node.next;
            Some(&node.key)
        })
    }

    /// Frees every slot. All outstanding `Links` must be reset by the caller.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    fn node(&self, idx: usize) -> &Node<K> {
        match self.slots.get(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling list handle {idx}"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K> {
        match self.slots.get_mut(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling list handle {idx}"),
        }
    }
}

impl<K> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(arena: &NodeArena<&'static str>, links: &Links) -> Vec<&'static str> {
        arena.keys(links).copied().collect()
    }

    #[test]
    fn test_push_front_orders_most_recent_first() {
        let mut arena = NodeArena::new();
        let mut links = Links::new();
        arena.push_front(&mut links, "a");
        arena.push_front(&mut links, "b");
        arena.push_front(&mut links, "c");

        assert_eq!(collect(&arena, &links), vec!["c", "b", "a"]);
        assert_eq!(arena.back(&links), Some(&"a"));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_move_to_front() {
        let mut arena = NodeArena::new();
        let mut links = Links::new();
        let a = arena.push_front(&mut links, "a");
        arena.push_front(&mut links, "b");
        arena.push_front(&mut links, "c");

        arena.move_to_front(&mut links, a);
        assert_eq!(collect(&arena, &links), vec!["a", "c", "b"]);
        assert_eq!(arena.back(&links), Some(&"b"));
    }

    #[test]
    fn test_remove_middle_and_reuse_slot() {
        let mut arena = NodeArena::new();
        let mut links = Links::new();
        arena.push_front(&mut links, "a");
        let b = arena.push_front(&mut links, "b");
        arena.push_front(&mut links, "c");

        assert_eq!(arena.remove(&mut links, b), "b");
        assert_eq!(collect(&arena, &links), vec!["c", "a"]);

        let d = arena.push_front(&mut links, "d");
        assert_eq!(d, b, "freed slot should be reused");
        assert_eq!(collect(&arena, &links), vec!["d", "c", "a"]);
    }

    #[test]
    fn test_pop_back_until_empty() {
        let mut arena = NodeArena::new();
        let mut links = Links::new();
        arena.push_front(&mut links, "a");
        arena.push_front(&mut links, "b");

        assert_eq!(arena.pop_back(&mut links), Some("a"));
        assert_eq!(arena.pop_back(&mut links), Some("b"));
        assert_eq!(arena.pop_back(&mut links), None);
        assert!(links.is_empty());
    }

    #[test]
    fn test_splice_between_lists() {
        let mut arena = NodeArena::new();
        let mut first = Links::new();
        let mut second = Links::new();
        let a = arena.push_front(&mut first, "a");
        arena.push_front(&mut first, "b");
        arena.push_front(&mut second, "x");

        arena.unlink(&mut first, a);
        arena.link_front(&mut second, a);

        assert_eq!(collect(&arena, &first), vec!["b"]);
        assert_eq!(collect(&arena, &second), vec!["a", "x"]);
    }
}
