//! バッファ管理モジュール
//!
//! 行リスト・ポイント・マーク・マーカー・アンドゥログを持つバッファ。

pub mod dyn_string;
pub mod edit;
pub mod marker;
pub mod motion;
pub mod point;
pub mod undo;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CommandError;
use crate::list::{CircularList, NodeId};

pub use dyn_string::DynString;
pub use marker::{MarkerId, MarkerSet};
pub use point::{Point, Region};
pub use undo::{UndoDelta, UndoEntry, UndoLog};

/// バッファID
pub type BufferId = usize;

/// 改行コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eol {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl Eol {
    pub fn as_str(self) -> &'static str {
        match self {
            Eol::Lf => "\n",
            Eol::Cr => "\r",
            Eol::CrLf => "\r\n",
        }
    }

    /// モード行での表示
    pub fn mode_label(self) -> &'static str {
        match self {
            Eol::Lf => ":",
            Eol::Cr => "\\",
            Eol::CrLf => "(DOS)",
        }
    }
}

/// バッファの状態フラグ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    pub modified: bool,
    pub readonly: bool,
    pub overwrite: bool,
    pub autofill: bool,
    pub no_undo: bool,
    /// `*Buffer List*` などの一時バッファ
    pub temporary: bool,
    /// 保存時にファイル名を尋ねる
    pub need_name: bool,
    /// このセッションでバックアップを作成済み
    pub backup_made: bool,
}

/// テキストバッファ
#[derive(Debug, Clone)]
pub struct Buffer {
    id: BufferId,
    name: String,
    filename: Option<PathBuf>,
    pub(crate) lines: CircularList<DynString>,
    pub(crate) pt: Point,
    mark: Option<MarkerId>,
    mark_ring: Vec<MarkerId>,
    pub(crate) markers: MarkerSet,
    pub(crate) undo: UndoLog,
    pub flags: BufferFlags,
    locals: HashMap<String, String>,
    eol: Eol,
    /// 縦移動で保持する目標桁
    pub goal_column: usize,
}

impl Buffer {
    /// 空行 1 行だけのバッファを作成
    pub fn new(id: BufferId, name: impl Into<String>) -> Self {
        let mut lines = CircularList::new();
        let first = lines.push_back(DynString::new());
        Self {
            id,
            name: name.into(),
            filename: None,
            lines,
            pt: Point::new(first, 0, 0),
            mark: None,
            mark_ring: Vec::new(),
            markers: MarkerSet::new(),
            undo: UndoLog::new(),
            flags: BufferFlags::default(),
            locals: HashMap::new(),
            eol: Eol::default(),
            goal_column: 0,
        }
    }

    /// 文字列から作成（アンドゥ記録なし、未変更状態）
    pub fn from_text(id: BufferId, name: impl Into<String>, text: &str) -> Self {
        let mut buffer = Self::new(id, name);
        buffer.set_lines(text.split('\n').map(str::to_string).collect());
        buffer
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: Option<PathBuf>) {
        self.flags.need_name = filename.is_none() && !self.flags.temporary;
        self.filename = filename;
    }

    pub fn eol(&self) -> Eol {
        self.eol
    }

    pub fn set_eol(&mut self, eol: Eol) {
        self.eol = eol;
    }

    pub fn is_modified(&self) -> bool {
        self.flags.modified
    }

    /// 内容を丸ごと差し替える。マーカーとアンドゥ履歴は破棄する。
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines.clear();
        for line in lines {
            self.lines.push_back(DynString::from(line.as_str()));
        }
        if self.lines.is_empty() {
            self.lines.push_back(DynString::new());
        }
        let first = self.first_line();
        self.pt = Point::new(first, 0, 0);
        self.markers = MarkerSet::new();
        self.mark = None;
        self.mark_ring.clear();
        self.undo = UndoLog::new();
        self.flags.modified = false;
        self.goal_column = 0;
    }

    // ---- 行リスト ----

    pub fn first_line(&self) -> NodeId {
        self.lines.first().unwrap_or_else(|| self.lines.sentinel())
    }

    pub fn last_line(&self) -> NodeId {
        self.lines.last().unwrap_or_else(|| self.lines.sentinel())
    }

    pub fn next_line_of(&self, line: NodeId) -> Option<NodeId> {
        self.lines.next(line)
    }

    pub fn line(&self, line: NodeId) -> &DynString {
        &self.lines[line]
    }

    /// 行数（最終行も 1 行と数える）
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_strings(&self) -> Vec<String> {
        self.lines.iter().map(|(_, line)| line.to_string()).collect()
    }

    /// 全体を LF 区切りで連結したテキスト
    pub fn text(&self) -> String {
        self.line_strings().join("\n")
    }

    /// 総文字数（改行を含む）
    pub fn len_chars(&self) -> usize {
        self.lines.iter().map(|(_, line)| line.len() + 1).sum::<usize>() - 1
    }

    /// 行リストとポイント・マーカーの整合性を検査する
    pub fn check_consistency(&self) -> Result<(), String> {
        if !self.lines.is_consistent() {
            return Err("line links are inconsistent".to_string());
        }
        let check = |pt: Point, what: &str| -> Result<(), String> {
            let line = self
                .lines
                .get(pt.line)
                .ok_or_else(|| format!("{} refers to a removed line", what))?;
            if pt.o > line.len() {
                return Err(format!("{} offset {} beyond line length {}", what, pt.o, line.len()));
            }
            let n = self
                .lines
                .iter()
                .position(|(id, _)| id == pt.line)
                .ok_or_else(|| format!("{} line unreachable", what))?;
            if n != pt.n {
                return Err(format!("{} line number {} should be {}", what, pt.n, n));
            }
            Ok(())
        };
        check(self.pt, "point")?;
        for (_, pt) in self.markers.iter() {
            check(pt, "marker")?;
        }
        Ok(())
    }

    // ---- ポイント ----

    pub fn pt(&self) -> Point {
        self.pt
    }

    pub fn set_pt(&mut self, pt: Point) {
        self.pt = pt;
    }

    pub fn current_line(&self) -> &DynString {
        &self.lines[self.pt.line]
    }

    pub fn bolp(&self) -> bool {
        self.pt.o == 0
    }

    pub fn eolp(&self) -> bool {
        self.pt.o >= self.current_line().len()
    }

    pub fn bobp(&self) -> bool {
        self.pt.n == 0 && self.pt.o == 0
    }

    pub fn eobp(&self) -> bool {
        self.lines.next(self.pt.line).is_none() && self.eolp()
    }

    /// ポイント直後の文字（行末なら改行、バッファ末尾なら `None`）
    pub fn following_char(&self) -> Option<char> {
        if self.eobp() {
            None
        } else if self.eolp() {
            Some('\n')
        } else {
            self.current_line().char_at(self.pt.o)
        }
    }

    /// ポイント直前の文字
    pub fn preceding_char(&self) -> Option<char> {
        if self.bobp() {
            None
        } else if self.bolp() {
            Some('\n')
        } else {
            self.current_line().char_at(self.pt.o - 1)
        }
    }

    /// 行番号とオフセットから位置を作る（範囲外は丸める）
    pub fn point_at(&self, n: usize, o: usize) -> Point {
        let mut line = self.first_line();
        let mut index = 0;
        while index < n {
            match self.lines.next(line) {
                Some(next) => {
                    line = next;
                    index += 1;
                }
                None => break,
            }
        }
        let o = o.min(self.lines[line].len());
        Point::new(line, index, o)
    }

    pub fn goto_point(&mut self, n: usize, o: usize) {
        self.pt = self.point_at(n, o);
    }

    /// 先頭からの文字オフセット
    pub fn point_to_offset(&self, pt: Point) -> usize {
        let mut offset = 0;
        for (id, line) in self.lines.iter() {
            if id == pt.line {
                return offset + pt.o.min(line.len());
            }
            offset += line.len() + 1;
        }
        offset.saturating_sub(1)
    }

    pub fn offset_to_point(&self, offset: usize) -> Point {
        let mut remaining = offset;
        let mut n = 0;
        let mut current = self.first_line();
        loop {
            let len = self.lines[current].len();
            if remaining <= len {
                return Point::new(current, n, remaining);
            }
            match self.lines.next(current) {
                Some(next) => {
                    remaining -= len + 1;
                    current = next;
                    n += 1;
                }
                None => return Point::new(current, n, len),
            }
        }
    }

    pub fn goto_offset(&mut self, offset: usize) {
        self.pt = self.offset_to_point(offset);
    }

    /// 1 文字進む。バッファ末尾なら `false`。
    pub fn forward_char(&mut self) -> bool {
        if !self.eolp() {
            self.pt.o += 1;
            true
        } else if let Some(next) = self.lines.next(self.pt.line) {
            self.pt = Point::new(next, self.pt.n + 1, 0);
            true
        } else {
            false
        }
    }

    /// 1 文字戻る。バッファ先頭なら `false`。
    pub fn backward_char(&mut self) -> bool {
        if !self.bolp() {
            self.pt.o -= 1;
            true
        } else if let Some(prev) = self.lines.prev(self.pt.line) {
            let len = self.lines[prev].len();
            self.pt = Point::new(prev, self.pt.n - 1, len);
            true
        } else {
            false
        }
    }

    pub fn beginning_of_line(&mut self) {
        self.pt.o = 0;
    }

    pub fn end_of_line(&mut self) {
        self.pt.o = self.current_line().len();
    }

    pub fn beginning_of_buffer(&mut self) {
        self.pt = Point::new(self.first_line(), 0, 0);
    }

    pub fn end_of_buffer(&mut self) {
        let last = self.last_line();
        let len = self.lines[last].len();
        self.pt = Point::new(last, self.lines.len() - 1, len);
    }

    /// 現在の表示桁
    pub fn current_column(&self, tab_width: usize) -> usize {
        point::column_at(self.current_line(), self.pt.o, tab_width)
    }

    /// 目標桁を保ったまま次の行へ移動する
    pub fn move_line_down(&mut self, goal: usize, tab_width: usize) -> bool {
        match self.lines.next(self.pt.line) {
            Some(next) => {
                let o = point::offset_for_column(&self.lines[next], goal, tab_width);
                self.pt = Point::new(next, self.pt.n + 1, o);
                true
            }
            None => false,
        }
    }

    /// 目標桁を保ったまま前の行へ移動する
    pub fn move_line_up(&mut self, goal: usize, tab_width: usize) -> bool {
        match self.lines.prev(self.pt.line) {
            Some(prev) => {
                let o = point::offset_for_column(&self.lines[prev], goal, tab_width);
                self.pt = Point::new(prev, self.pt.n - 1, o);
                true
            }
            None => false,
        }
    }

    /// `count` 行移動した行の先頭位置（負なら前方、境界で止まる）
    pub fn line_beginning_position(&self, count: isize) -> Point {
        let mut pt = self.pt;
        let mut remaining = count - 1;
        while remaining > 0 {
            match self.lines.next(pt.line) {
                Some(next) => pt = Point::new(next, pt.n + 1, 0),
                None => break,
            }
            remaining -= 1;
        }
        while remaining < 0 {
            match self.lines.prev(pt.line) {
                Some(prev) => pt = Point::new(prev, pt.n - 1, 0),
                None => break,
            }
            remaining += 1;
        }
        pt.o = 0;
        pt
    }

    /// `count` 行移動した行の末尾位置
    pub fn line_end_position(&self, count: isize) -> Point {
        let mut pt = self.line_beginning_position(count);
        pt.o = self.lines[pt.line].len();
        pt
    }

    /// 2 点間の行境界の数
    pub fn count_lines(&self, a: Point, b: Point) -> usize {
        a.n.abs_diff(b.n)
    }

    /// 2 点間の文字数（行境界ごとに改行 1 文字を含む）
    pub fn point_dist(&self, a: Point, b: Point) -> usize {
        let (start, end) = if a.position_cmp(&b).is_le() { (a, b) } else { (b, a) };
        if start.line == end.line {
            return end.o - start.o;
        }
        let mut size = self.lines[start.line].len() - start.o + 1;
        let mut current = self.lines.next(start.line);
        while let Some(line) = current {
            if line == end.line {
                break;
            }
            size += self.lines[line].len() + 1;
            current = self.lines.next(line);
        }
        size + end.o
    }

    /// 2 点間のテキスト
    pub fn text_between(&self, a: Point, b: Point) -> String {
        let (start, end) = if a.position_cmp(&b).is_le() { (a, b) } else { (b, a) };
        let mut text = String::new();
        let mut line = start.line;
        let mut from = start.o;
        loop {
            let chars = self.lines[line].as_chars();
            if line == end.line {
                text.extend(&chars[from.min(chars.len())..end.o.min(chars.len())]);
                break;
            }
            text.extend(&chars[from.min(chars.len())..]);
            text.push('\n');
            match self.lines.next(line) {
                Some(next) => {
                    line = next;
                    from = 0;
                }
                None => break,
            }
        }
        text
    }

    // ---- マーカーとマーク ----

    pub fn create_marker(&mut self, pt: Point) -> MarkerId {
        self.markers.alloc(pt)
    }

    pub fn free_marker(&mut self, id: MarkerId) -> Option<Point> {
        self.markers.free(id)
    }

    pub fn marker_point(&self, id: MarkerId) -> Option<Point> {
        self.markers.get(id)
    }

    pub fn move_marker(&mut self, id: MarkerId, pt: Point) {
        self.markers.set(id, pt);
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn mark(&self) -> Option<Point> {
        self.mark.and_then(|id| self.markers.get(id))
    }

    /// マークを設定する。以前のマークはマークリングへ退避する。
    pub fn set_mark(&mut self, pt: Point) {
        if let Some(old) = self.mark.take() {
            self.mark_ring.push(old);
        }
        self.mark = Some(self.markers.alloc(pt));
    }

    /// マークリングから直前のマークを取り出して現在のマークにする
    pub fn pop_mark(&mut self) -> Option<Point> {
        let previous = self.mark_ring.pop()?;
        if let Some(current) = self.mark.take() {
            self.mark_ring.insert(0, current);
        }
        self.mark = Some(previous);
        self.markers.get(previous)
    }

    pub fn exchange_point_and_mark(&mut self) -> Result<(), CommandError> {
        let id = self.mark.ok_or(CommandError::NoMark)?;
        let mark = self.markers.get(id).ok_or(CommandError::NoMark)?;
        self.markers.set(id, self.pt);
        self.pt = mark;
        Ok(())
    }

    /// ポイントとマークの間の領域
    pub fn region(&self) -> Result<Region, CommandError> {
        let mark = self.mark().ok_or(CommandError::NoMark)?;
        let (start, end) = if self.pt.position_cmp(&mark).is_le() {
            (self.pt, mark)
        } else {
            (mark, self.pt)
        };
        Ok(Region {
            start,
            end,
            size: self.point_dist(start, end),
        })
    }

    // ---- バッファローカル変数 ----

    pub fn local_var(&self, name: &str) -> Option<&str> {
        self.locals.get(name).map(String::as_str)
    }

    pub fn set_local_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.locals.insert(name.into(), value.into());
    }

    // ---- 状態 ----

    pub fn ensure_writable(&self) -> Result<(), CommandError> {
        if self.flags.readonly {
            Err(CommandError::ReadOnly(self.name.clone()))
        } else {
            Ok(())
        }
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.flags.modified = modified;
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }
}
