//! マーカー
//!
//! バッファの変更に追従する位置。マークや非選択ウィンドウのポイントも
//! マーカーとして保持する。明示的に確保し、明示的に解放する。

use super::point::Point;
use crate::list::NodeId;

/// マーカーへのハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(usize);

/// バッファごとのマーカー集合
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    slots: Vec<Option<Point>>,
    free: Vec<usize>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, pt: Point) -> MarkerId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(pt);
                MarkerId(index)
            }
            None => {
                self.slots.push(Some(pt));
                MarkerId(self.slots.len() - 1)
            }
        }
    }

    pub fn free(&mut self, id: MarkerId) -> Option<Point> {
        let released = self.slots.get_mut(id.0)?.take();
        if released.is_some() {
            self.free.push(id.0);
        }
        released
    }

    pub fn get(&self, id: MarkerId) -> Option<Point> {
        self.slots.get(id.0).copied().flatten()
    }

    pub fn set(&mut self, id: MarkerId, pt: Point) {
        if let Some(Some(slot)) = self.slots.get_mut(id.0) {
            *slot = pt;
        }
    }

    /// 生きているマーカーの数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, Point)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|pt| (MarkerId(index), pt)))
    }

    fn points_mut(&mut self) -> impl Iterator<Item = &mut Point> {
        self.slots.iter_mut().flatten()
    }

    /// 1 文字の挿入・削除に追従する
    ///
    /// `edit_pos` 以降にあるマーカーを `delta` だけずらす。
    pub fn adjust_char(&mut self, line: NodeId, edit_pos: usize, delta: isize) {
        for pt in self.points_mut() {
            if pt.line == line && pt.o >= edit_pos {
                pt.o = (pt.o as isize + delta).max(0) as usize;
            }
        }
    }

    /// 行 `n` がオフセット `split` で分割され、後半が `new_line` になった
    pub fn adjust_split(&mut self, line: NodeId, n: usize, split: usize, new_line: NodeId) {
        for pt in self.points_mut() {
            if pt.line == line && pt.o > split {
                pt.line = new_line;
                pt.n = n + 1;
                pt.o -= split;
            } else if pt.n > n {
                pt.n += 1;
            }
        }
    }

    /// 行 `n` (`line`) に次の行 `removed` が連結された
    pub fn adjust_join(&mut self, line: NodeId, n: usize, removed: NodeId, line_len: usize) {
        for pt in self.points_mut() {
            if pt.line == removed {
                pt.line = line;
                pt.n = n;
                pt.o += line_len;
            } else if pt.n > n + 1 {
                pt.n -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::CircularList;

    fn lines() -> (CircularList<()>, NodeId, NodeId) {
        let mut list = CircularList::new();
        let a = list.push_back(());
        let b = list.push_back(());
        (list, a, b)
    }

    #[test]
    fn freed_slots_are_reused() {
        let (_list, a, _) = lines();
        let mut set = MarkerSet::new();
        let m1 = set.alloc(Point::new(a, 0, 0));
        set.alloc(Point::new(a, 0, 1));
        assert_eq!(set.free(m1), Some(Point::new(a, 0, 0)));
        assert_eq!(set.free(m1), None);
        assert_eq!(set.len(), 1);
        let m3 = set.alloc(Point::new(a, 0, 2));
        assert_eq!(m3, m1);
    }

    #[test]
    fn char_edit_shifts_markers_at_or_after_edit() {
        let (_list, a, b) = lines();
        let mut set = MarkerSet::new();
        let before = set.alloc(Point::new(a, 0, 1));
        let after = set.alloc(Point::new(a, 0, 3));
        let other = set.alloc(Point::new(b, 1, 3));
        set.adjust_char(a, 2, 1);
        assert_eq!(set.get(before).unwrap().o, 1);
        assert_eq!(set.get(after).unwrap().o, 4);
        assert_eq!(set.get(other).unwrap().o, 3);
    }

    #[test]
    fn split_moves_tail_markers_to_new_line() {
        let (mut list, a, b) = lines();
        let mut set = MarkerSet::new();
        let at_split = set.alloc(Point::new(a, 0, 2));
        let tail = set.alloc(Point::new(a, 0, 5));
        let later = set.alloc(Point::new(b, 1, 0));
        let new_line = list.insert_after(a, ()).unwrap();

        set.adjust_split(a, 0, 2, new_line);
        assert_eq!(set.get(at_split).unwrap(), Point::new(a, 0, 2));
        assert_eq!(set.get(tail).unwrap(), Point::new(new_line, 1, 3));
        assert_eq!(set.get(later).unwrap(), Point::new(b, 2, 0));
    }

    #[test]
    fn join_moves_markers_onto_surviving_line() {
        let (mut list, a, b) = lines();
        let c = list.push_back(());
        let mut set = MarkerSet::new();
        let on_removed = set.alloc(Point::new(b, 1, 2));
        let later = set.alloc(Point::new(c, 2, 1));
        set.adjust_join(a, 0, b, 4);
        assert_eq!(set.get(on_removed).unwrap(), Point::new(a, 0, 6));
        assert_eq!(set.get(later).unwrap(), Point::new(c, 1, 1));
    }
}
