//! 位置情報
//!
//! 行ハンドル・行番号・行内オフセットの組で位置を表す。

use std::cmp::Ordering;

use unicode_width::UnicodeWidthChar;

use super::dyn_string::DynString;
use crate::list::NodeId;

/// バッファ内の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// 行への参照
    pub line: NodeId,
    /// 0 始まりの行番号
    pub n: usize,
    /// 行内の文字オフセット
    pub o: usize,
}

impl Point {
    pub fn new(line: NodeId, n: usize, o: usize) -> Self {
        Self { line, n, o }
    }

    /// 行番号とオフセットで比較する
    pub fn position_cmp(&self, other: &Point) -> Ordering {
        (self.n, self.o).cmp(&(other.n, other.o))
    }
}

/// ポイントとマークに挟まれた範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: Point,
    pub end: Point,
    /// 改行を 1 文字として数えた長さ
    pub size: usize,
}

/// 表示上の次の桁を計算する
pub fn advance_column(col: usize, ch: char, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    if ch == '\t' {
        col + tab_width - col % tab_width
    } else if ch.is_control() {
        // ^X 形式で表示する
        col + 2
    } else {
        col + ch.width().unwrap_or(1)
    }
}

/// `offset` の前までの表示桁数
pub fn column_at(line: &DynString, offset: usize, tab_width: usize) -> usize {
    line.as_chars()
        .iter()
        .take(offset)
        .fold(0, |col, &ch| advance_column(col, ch, tab_width))
}

/// 表示桁が初めて `goal` に届く文字のオフセット（届かなければ行末）
pub fn offset_for_column(line: &DynString, goal: usize, tab_width: usize) -> usize {
    let mut col = 0;
    for (i, &ch) in line.as_chars().iter().enumerate() {
        if col >= goal {
            return i;
        }
        col = advance_column(col, ch, tab_width);
    }
    line.len()
}
