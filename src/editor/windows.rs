//! ウィンドウ管理
//!
//! ウィンドウは画面を上下に分割したバッファのビュー。選択中でない
//! ウィンドウのポイントはバッファのマーカーとして保持し、編集に追従させる。

use crate::buffer::{BufferId, MarkerId, Point};
use crate::error::{CommandError, CommandResult};

use super::Editor;

/// 分割後に各ウィンドウが確保すべき高さ（モード行を含む）
const MIN_SPLIT_HEIGHT: usize = 4;
/// 1 ウィンドウの最小の高さ（本文 1 行とモード行）
const MIN_WINDOW_HEIGHT: usize = 2;

/// バッファのビュー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub(crate) buffer: BufferId,
    /// 先頭に表示する行番号
    pub(crate) top: usize,
    /// 水平スクロールの開始桁
    pub(crate) start_column: usize,
    /// 非選択時のポイント
    pub(crate) saved_pt: Option<MarkerId>,
    /// モード行を含む高さ
    pub(crate) height: usize,
}

impl Window {
    pub fn new(buffer: BufferId, height: usize) -> Self {
        Self {
            buffer,
            top: 0,
            start_column: 0,
            saved_pt: None,
            height,
        }
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 本文の行数
    pub fn text_height(&self) -> usize {
        self.height.saturating_sub(1).max(1)
    }

    pub fn top_line(&self) -> usize {
        self.top
    }
}

impl Editor {
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn current_window_index(&self) -> usize {
        self.current_window
    }

    /// ウィンドウのポイント。選択中なら現在のバッファのポイント。
    pub fn window_point(&self, index: usize) -> Option<Point> {
        let window = self.windows.get(index)?;
        let buffer = self.buffer_by_id(window.buffer)?;
        if index == self.current_window {
            Some(buffer.pt())
        } else {
            window
                .saved_pt
                .and_then(|marker| buffer.marker_point(marker))
                .or(Some(buffer.pt()))
        }
    }

    /// 選択中のウィンドウを切り替える
    pub fn select_window(&mut self, index: usize) {
        if index >= self.windows.len() || index == self.current_window {
            return;
        }
        // 現在のポイントをマーカーへ退避
        let current = self.current_window;
        let buffer_id = self.windows[current].buffer;
        if let Some(buffer) = self.buffer_by_id_mut(buffer_id) {
            let pt = buffer.pt();
            let marker = buffer.create_marker(pt);
            self.windows[current].saved_pt = Some(marker);
        }

        self.current_window = index;
        let buffer_id = self.windows[index].buffer;
        if let Some(marker) = self.windows[index].saved_pt.take() {
            if let Some(buffer) = self.buffer_by_id_mut(buffer_id) {
                if let Some(pt) = buffer.free_marker(marker) {
                    buffer.set_pt(pt);
                }
            }
        }
        self.touch_buffer(buffer_id);
    }

    /// 現在のウィンドウに別のバッファを表示する
    pub(crate) fn show_buffer_in_current_window(&mut self, id: BufferId) {
        let window = &mut self.windows[self.current_window];
        if window.buffer != id {
            window.buffer = id;
            window.top = 0;
            window.start_column = 0;
        }
        self.touch_buffer(id);
    }

    /// 選択中でないウィンドウに別のバッファを表示する
    pub(crate) fn show_buffer_in_window(&mut self, index: usize, id: BufferId) {
        if index == self.current_window {
            self.show_buffer_in_current_window(id);
            return;
        }
        let old = self.windows[index].buffer;
        if let Some(marker) = self.windows[index].saved_pt.take() {
            if let Some(buffer) = self.buffer_by_id_mut(old) {
                buffer.free_marker(marker);
            }
        }
        let marker = self.buffer_by_id_mut(id).map(|buffer| {
            let pt = buffer.pt();
            buffer.create_marker(pt)
        });
        let window = &mut self.windows[index];
        window.buffer = id;
        window.top = 0;
        window.start_column = 0;
        window.saved_pt = marker;
    }

    /// 一時バッファを別のウィンドウに表示する（必要なら分割する）
    pub(crate) fn popup_buffer(&mut self, id: BufferId) -> CommandResult {
        if self.windows.len() == 1 {
            self.split_window()?;
        }
        let target = (self.current_window + 1) % self.windows.len();
        self.show_buffer_in_window(target, id);
        Ok(())
    }

    /// 現在のウィンドウを上下に分割する
    pub fn split_window(&mut self) -> CommandResult {
        let current = self.current_window;
        let height = self.windows[current].height;
        if height < MIN_SPLIT_HEIGHT {
            return Err(CommandError::Message(format!(
                "Window height {} too small for splitting",
                height
            )));
        }
        let upper = height / 2 + height % 2;
        let lower = height / 2;
        let buffer_id = self.windows[current].buffer;
        let marker = self.buffer_by_id_mut(buffer_id).map(|buffer| {
            let pt = buffer.pt();
            buffer.create_marker(pt)
        });
        let mut new_window = self.windows[current].clone();
        new_window.height = lower;
        new_window.saved_pt = marker;
        self.windows[current].height = upper;
        self.windows.insert(current + 1, new_window);
        log::debug!("split window {} into {}+{}", current, upper, lower);
        Ok(())
    }

    /// 現在のウィンドウを閉じる
    pub fn delete_window(&mut self) -> CommandResult {
        if self.windows.len() == 1 {
            return Err(CommandError::Message(
                "Attempt to delete sole ordinary window".to_string(),
            ));
        }
        let doomed = self.current_window;
        let neighbour = if doomed > 0 { doomed - 1 } else { 1 };
        self.select_window(neighbour);
        let removed = self.windows.remove(doomed);
        if let Some(marker) = removed.saved_pt {
            if let Some(buffer) = self.buffer_by_id_mut(removed.buffer) {
                buffer.free_marker(marker);
            }
        }
        if self.current_window > doomed {
            self.current_window -= 1;
        }
        let heir = if doomed > 0 { doomed - 1 } else { 0 };
        self.windows[heir].height += removed.height;
        Ok(())
    }

    /// 現在のウィンドウ以外を閉じる
    pub fn delete_other_windows(&mut self) -> CommandResult {
        let total: usize = self.windows.iter().map(|window| window.height).sum();
        let keep = self.current_window;
        let mut kept = None;
        for (index, window) in std::mem::take(&mut self.windows).into_iter().enumerate() {
            if index == keep {
                kept = Some(window);
                continue;
            }
            if let Some(marker) = window.saved_pt {
                if let Some(buffer) = self.buffer_by_id_mut(window.buffer) {
                    buffer.free_marker(marker);
                }
            }
        }
        let mut window = kept.unwrap_or_else(|| Window::new(0, total));
        window.height = total;
        self.windows = vec![window];
        self.current_window = 0;
        Ok(())
    }

    /// 次のウィンドウを選択する（負数なら逆順）
    pub fn other_window(&mut self, count: i32) -> CommandResult {
        let len = self.windows.len() as i64;
        let next = (self.current_window as i64 + count as i64).rem_euclid(len) as usize;
        self.select_window(next);
        Ok(())
    }

    /// 現在のウィンドウを `delta` 行広げる（負なら縮める）
    pub fn enlarge_window(&mut self, delta: i32) -> CommandResult {
        if self.windows.len() == 1 || delta == 0 {
            return Ok(());
        }
        if delta < 0 {
            return self.shrink_window(-delta);
        }
        for _ in 0..delta {
            let current = self.current_window;
            let donor = if current + 1 < self.windows.len() {
                current + 1
            } else {
                current - 1
            };
            if self.windows[donor].height <= MIN_WINDOW_HEIGHT {
                return Err(CommandError::Message("Cannot enlarge window".to_string()));
            }
            self.windows[donor].height -= 1;
            self.windows[current].height += 1;
        }
        Ok(())
    }

    pub fn shrink_window(&mut self, delta: i32) -> CommandResult {
        if self.windows.len() == 1 || delta <= 0 {
            return Ok(());
        }
        for _ in 0..delta {
            let current = self.current_window;
            if self.windows[current].height <= MIN_WINDOW_HEIGHT {
                return Err(CommandError::Message("Cannot shrink window".to_string()));
            }
            let heir = if current + 1 < self.windows.len() {
                current + 1
            } else {
                current - 1
            };
            self.windows[current].height -= 1;
            self.windows[heir].height += 1;
        }
        Ok(())
    }

    /// 画面の高さに合わせてウィンドウの高さを調整する
    pub(crate) fn fit_windows(&mut self, screen_height: usize) {
        let available = screen_height.saturating_sub(1).max(MIN_WINDOW_HEIGHT);
        loop {
            let total: usize = self.windows.iter().map(|window| window.height).sum();
            if total == available {
                return;
            }
            if total < available {
                if let Some(last) = self.windows.last_mut() {
                    last.height += available - total;
                }
                return;
            }
            // 足りない分を下のウィンドウから削り、収まらなければ閉じる
            let excess = total - available;
            let last = self.windows.len() - 1;
            let spare = self.windows[last].height.saturating_sub(MIN_WINDOW_HEIGHT);
            if spare >= excess {
                self.windows[last].height -= excess;
                return;
            }
            if self.windows.len() == 1 {
                self.windows[0].height = available;
                return;
            }
            if self.current_window == last {
                self.select_window(last - 1);
            }
            let removed = self.windows.remove(last);
            if let Some(marker) = removed.saved_pt {
                if let Some(buffer) = self.buffer_by_id_mut(removed.buffer) {
                    buffer.free_marker(marker);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    fn heights(editor: &crate::editor::Editor) -> Vec<usize> {
        editor.windows().iter().map(|window| window.height()).collect()
    }

    #[test]
    fn split_divides_height() {
        let mut editor = editor_with_text("abc");
        editor.split_window().unwrap();
        assert_eq!(heights(&editor), vec![12, 11]);
        assert_eq!(editor.current_window_index(), 0);
    }

    #[test]
    fn delete_window_gives_height_to_neighbour() {
        let mut editor = editor_with_text("abc");
        editor.split_window().unwrap();
        editor.delete_window().unwrap();
        assert_eq!(heights(&editor), vec![23]);
        assert_eq!(editor.buffer().marker_count(), 0);
        assert!(editor.delete_window().is_err());
    }

    #[test]
    fn enlarge_and_shrink_move_lines() {
        let mut editor = editor_with_text("abc");
        editor.split_window().unwrap();
        editor.enlarge_window(2).unwrap();
        assert_eq!(heights(&editor), vec![14, 9]);
        editor.shrink_window(5).unwrap();
        assert_eq!(heights(&editor), vec![9, 14]);
        assert!(editor.shrink_window(20).is_err());
    }

    #[test]
    fn window_point_follows_edits() {
        let mut editor = editor_with_text("abc");
        editor.buffer_mut().goto_offset(2);
        editor.split_window().unwrap();
        editor.buffer_mut().goto_offset(0);
        editor.buffer_mut().insert_string("xy").unwrap();
        let other = editor.window_point(1).unwrap();
        assert_eq!(other.o, 4);
    }

    #[test]
    fn fit_windows_drops_windows_that_do_not_fit() {
        let mut editor = editor_with_text("abc");
        editor.split_window().unwrap();
        editor.fit_windows(4);
        assert_eq!(heights(&editor), vec![3]);
        editor.fit_windows(24);
        assert_eq!(heights(&editor), vec![23]);
    }
}
