//! # Request Arena
//!
//! Slot storage for pending requests, threaded into one doubly linked list by
//! slot index. Links are plain indices, so a node can be unlinked or spliced
//! in O(1) and a stale position is detectable instead of dangling.

use alloc::vec::Vec;

use crate::request::Request;

/// Index of an occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(u32);

impl SlotId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

static_assertions::const_assert!(core::mem::size_of::<usize>() >= core::mem::size_of::<u32>());

/// A linked request
#[derive(Debug)]
struct Node {
    request: Request,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
enum Slot {
    Occupied(Node),
    Vacant { next_free: Option<SlotId> },
}

/// Linked list of requests stored in a slot vector
#[derive(Debug)]
pub(crate) struct RequestArena {
    /// Slot storage
    slots: Vec<Slot>,
    /// Head of the free slot chain
    free: Option<SlotId>,
    /// Lowest element
    first: Option<SlotId>,
    /// Highest element
    last: Option<SlotId>,
    /// Number of linked nodes
    len: usize,
}

impl RequestArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: None,
            first: None,
            last: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn first(&self) -> Option<SlotId> {
        self.first
    }

    pub(crate) fn last(&self) -> Option<SlotId> {
        self.last
    }

    pub(crate) fn next(&self, slot: SlotId) -> Option<SlotId> {
        self.node(slot).next
    }

    pub(crate) fn prev(&self, slot: SlotId) -> Option<SlotId> {
        self.node(slot).prev
    }

    pub(crate) fn get(&self, slot: SlotId) -> &Request {
        &self.node(slot).request
    }

    pub(crate) fn get_mut(&mut self, slot: SlotId) -> &mut Request {
        &mut self.node_mut(slot).request
    }

    /// Link `request` directly before `anchor`, or at the back when `anchor` is `None`
    pub(crate) fn insert_before(&mut self, anchor: Option<SlotId>, request: Request) -> SlotId {
        let prev = match anchor {
            Some(at) => self.prev(at),
            None => self.last,
        };
        self.link(request, prev, anchor)
    }

    /// Link `request` directly after `anchor`, or at the front when `anchor` is `None`
    pub(crate) fn insert_after(&mut self, anchor: Option<SlotId>, request: Request) -> SlotId {
        let next = match anchor {
            Some(at) => self.next(at),
            None => self.first,
        };
        self.link(request, anchor, next)
    }

    /// Unlink a node and release its slot
    pub(crate) fn remove(&mut self, slot: SlotId) -> Request {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.last = prev,
        }

        let vacated = core::mem::replace(
            &mut self.slots[slot.index()],
            Slot::Vacant {
                next_free: self.free,
            },
        );
        self.free = Some(slot);
        self.len -= 1;

        match vacated {
            Slot::Occupied(node) => node.request,
            Slot::Vacant { .. } => unreachable!("slot {} was linked but vacant", slot.0),
        }
    }

    /// Iterate front to back
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            arena: self,
            cursor: self.first,
        }
    }

    /// Iterate slot ids front to back
    pub(crate) fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        core::iter::successors(self.first, move |&slot| self.next(slot))
    }

    fn link(&mut self, request: Request, prev: Option<SlotId>, next: Option<SlotId>) -> SlotId {
        let node = Node {
            request,
            prev,
            next,
        };
        let slot = match self.free {
            Some(slot) => {
                self.free = match self.slots[slot.index()] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free chain points at live slot {}", slot.0),
                };
                self.slots[slot.index()] = Slot::Occupied(node);
                slot
            },
            None => {
                let slot = SlotId(self.slots.len() as u32);
                self.slots.push(Slot::Occupied(node));
                slot
            },
        };

        match prev {
            Some(p) => self.node_mut(p).next = Some(slot),
            None => self.first = Some(slot),
        }
        match next {
            Some(n) => self.node_mut(n).prev = Some(slot),
            None => self.last = Some(slot),
        }
        self.len += 1;
        slot
    }

    fn node(&self, slot: SlotId) -> &Node {
        match &self.slots[slot.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("slot {} is vacant", slot.0),
        }
    }

    fn node_mut(&mut self, slot: SlotId) -> &mut Node {
        match &mut self.slots[slot.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("slot {} is vacant", slot.0),
        }
    }
}

/// Front-to-back iterator over linked requests
pub(crate) struct Iter<'a> {
    arena: &'a RequestArena,
    cursor: Option<SlotId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Request;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        self.cursor = self.arena.next(slot);
        Some(self.arena.get(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(arena: &RequestArena) -> Vec<u64> {
        arena.iter().map(|rq| rq.start_sector).collect()
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut arena = RequestArena::with_capacity(4);
        let b = arena.insert_before(None, Request::read(1, 20, 1));
        arena.insert_before(Some(b), Request::read(2, 10, 1));
        arena.insert_after(Some(b), Request::read(3, 30, 1));
        arena.insert_after(None, Request::read(4, 5, 1));

        assert_eq!(starts(&arena), vec![5, 10, 20, 30]);
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.get(arena.first().unwrap()).start_sector, 5);
        assert_eq!(arena.get(arena.last().unwrap()).start_sector, 30);
    }

    #[test]
    fn test_remove_relinks_neighbours() {
        let mut arena = RequestArena::with_capacity(4);
        let a = arena.insert_before(None, Request::read(1, 1, 1));
        let b = arena.insert_before(None, Request::read(2, 2, 1));
        let c = arena.insert_before(None, Request::read(3, 3, 1));

        assert_eq!(arena.remove(b).id.raw(), 2);
        assert_eq!(arena.next(a), Some(c));
        assert_eq!(arena.prev(c), Some(a));

        arena.remove(a);
        assert_eq!(arena.first(), Some(c));
        arena.remove(c);
        assert!(arena.is_empty());
        assert_eq!(arena.first(), None);
        assert_eq!(arena.last(), None);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut arena = RequestArena::with_capacity(2);
        let a = arena.insert_before(None, Request::read(1, 1, 1));
        arena.insert_before(None, Request::read(2, 2, 1));
        arena.remove(a);

        let c = arena.insert_after(None, Request::read(3, 0, 1));
        assert_eq!(c, a);
        assert_eq!(arena.slots.len(), 2);
        assert_eq!(starts(&arena), vec![0, 2]);
    }

    #[test]
    fn test_slot_iteration_matches_requests() {
        let mut arena = RequestArena::with_capacity(3);
        for (id, start) in [(1, 7), (2, 8), (3, 9)] {
            arena.insert_before(None, Request::write(id, start, 1));
        }
        let ids: Vec<u64> = arena.slots().map(|slot| arena.get(slot).id.raw()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
