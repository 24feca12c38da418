//! 循環双方向リスト
//!
//! 番兵ノードを持つ循環リストをアリーナ上に実装する。
//! ノードは世代付きの `NodeId` で参照するため、削除済みノードへの
//! 古いハンドルは `get` で `None` になる。

use std::ops::{Index, IndexMut};

/// ノードへのハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

const SENTINEL: usize = 0;

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
    generation: u32,
}

/// 番兵付き循環双方向リスト
#[derive(Debug, Clone)]
pub struct CircularList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for CircularList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CircularList<T> {
    /// 番兵だけを持つ空リスト
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                value: None,
                prev: SENTINEL,
                next: SENTINEL,
                generation: 0,
            }],
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 番兵のハンドル
    pub fn sentinel(&self) -> NodeId {
        NodeId {
            index: SENTINEL as u32,
            generation: 0,
        }
    }

    pub fn is_sentinel(&self, id: NodeId) -> bool {
        id.index as usize == SENTINEL
    }

    /// ハンドルが生きているノードを指しているか
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some() && !self.is_sentinel(id)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.real(self.slots[SENTINEL].next)
    }

    pub fn last(&self) -> Option<NodeId> {
        self.real(self.slots[SENTINEL].prev)
    }

    /// 次のノード（末尾なら `None`）
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let index = self.resolve(id)?;
        self.real(self.slots[index].next)
    }

    /// 前のノード（先頭なら `None`）
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let index = self.resolve(id)?;
        self.real(self.slots[index].prev)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let index = self.resolve(id)?;
        self.slots[index].value.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let index = self.resolve(id)?;
        self.slots[index].value.as_mut()
    }

    /// `id` の直後に挿入する。`id` が番兵なら先頭に入る。
    pub fn insert_after(&mut self, id: NodeId, value: T) -> Option<NodeId> {
        let at = self.resolve(id)?;
        let next = self.slots[at].next;
        Some(self.link(at, next, value))
    }

    /// `id` の直前に挿入する。`id` が番兵なら末尾に入る。
    pub fn insert_before(&mut self, id: NodeId, value: T) -> Option<NodeId> {
        let at = self.resolve(id)?;
        let prev = self.slots[at].prev;
        Some(self.link(prev, at, value))
    }

    pub fn push_back(&mut self, value: T) -> NodeId {
        let prev = self.slots[SENTINEL].prev;
        self.link(prev, SENTINEL, value)
    }

    pub fn push_front(&mut self, value: T) -> NodeId {
        let next = self.slots[SENTINEL].next;
        self.link(SENTINEL, next, value)
    }

    /// ノードを外して値を返す。番兵と古いハンドルは無視される。
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let index = self.resolve(id)?;
        if index == SENTINEL {
            return None;
        }
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = index;
        slot.next = index;
        let value = slot.value.take();
        self.free.push(index);
        self.len -= 1;
        value
    }

    /// すべてのノードを削除する
    pub fn clear(&mut self) {
        while let Some(first) = self.first() {
            self.remove(first);
        }
    }

    /// 先頭から順にハンドルと値を返す
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.slots[SENTINEL].next,
        }
    }

    /// 前後のリンクが互いに整合しているかを検査する
    pub fn is_consistent(&self) -> bool {
        let mut count = 0;
        let mut cursor = SENTINEL;
        loop {
            let next = self.slots[cursor].next;
            if self.slots[next].prev != cursor {
                return false;
            }
            if next == SENTINEL {
                break;
            }
            count += 1;
            if count > self.len {
                return false;
            }
            cursor = next;
        }
        count == self.len
    }

    fn link(&mut self, prev: usize, next: usize, value: T) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                slot.prev = prev;
                slot.next = next;
                index
            }
            None => {
                self.slots.push(Slot {
                    value: Some(value),
                    prev,
                    next,
                    generation: 0,
                });
                self.slots.len() - 1
            }
        };
        self.slots[prev].next = index;
        self.slots[next].prev = index;
        self.len += 1;
        NodeId {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    fn resolve(&self, id: NodeId) -> Option<usize> {
        let index = id.index as usize;
        let slot = self.slots.get(index)?;
        if slot.generation != id.generation {
            return None;
        }
        if index != SENTINEL && slot.value.is_none() {
            return None;
        }
        Some(index)
    }

    fn real(&self, index: usize) -> Option<NodeId> {
        if index == SENTINEL {
            None
        } else {
            Some(NodeId {
                index: index as u32,
                generation: self.slots[index].generation,
            })
        }
    }
}

impl<T> Index<NodeId> for CircularList<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale list handle {:?}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for CircularList<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale list handle {:?}", id),
        }
    }
}

/// `CircularList::iter` のイテレータ
pub struct Iter<'a, T> {
    list: &'a CircularList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }
        let list = self.list;
        let index = self.cursor;
        let slot = &list.slots[index];
        self.cursor = slot.next;
        let id = NodeId {
            index: index as u32,
            generation: slot.generation,
        };
        slot.value.as_ref().map(|value| (id, value))
    }
}
