//! バッファとファイルのコマンド
//!
//! バッファ一覧は最近選択した順に並ぶ。ファイルを訪問するバッファは
//! ファイル名をバッファ名にし、重複すると `name<2>` のように番号を付ける。

use std::path::{Path, PathBuf};

use crate::buffer::{Buffer, BufferId};
use crate::error::{BufferError, CommandError, CommandResult, FileError};
use crate::file::{self, expand_path, make_backup};
use crate::input::Key;
use crate::minibuffer::{Completion, HistoryKind};

use super::Editor;

const BUFFER_LIST_NAME: &str = "*Buffer List*";
const SCRATCH_NAME: &str = "*scratch*";

/// `save-some-buffers` の答え
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveAnswer {
    Save,
    Skip,
    SaveAll,
    SaveAndStop,
    Stop,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Editor {
    // ---- バッファ一覧 ----

    /// バッファを一覧の先頭（最近選択）へ移す
    pub(crate) fn touch_buffer(&mut self, id: BufferId) {
        if let Some(index) = self.buffer_index(id) {
            let buffer = self.buffers.remove(index);
            self.buffers.insert(0, buffer);
        }
    }

    pub fn find_buffer(&self, name: &str) -> Option<BufferId> {
        self.buffers
            .iter()
            .find(|buffer| buffer.name() == name)
            .map(Buffer::id)
    }

    fn find_buffer_visiting(&self, path: &Path) -> Option<BufferId> {
        self.buffers
            .iter()
            .find(|buffer| buffer.filename() == Some(path))
            .map(Buffer::id)
    }

    /// 使われていないバッファ名。重複すれば `<2>` から番号を付ける。
    pub fn unique_buffer_name(&self, base: &str) -> String {
        if self.find_buffer(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}<{}>", base, n))
            .find(|name| self.find_buffer(name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// 新しいバッファを一覧の末尾に作る
    pub fn create_buffer(&mut self, name: &str) -> BufferId {
        let name = self.unique_buffer_name(name);
        self.push_buffer(name)
    }

    fn push_buffer(&mut self, name: String) -> BufferId {
        let id = self.allocate_buffer_id();
        let mut buffer = Buffer::new(id, name);
        buffer.set_filename(None);
        buffer.flags.autofill = self.vars.get_bool(None, "auto-fill-mode");
        log::debug!("created buffer {} ({})", buffer.name(), id);
        self.buffers.push(buffer);
        id
    }

    /// 現在のバッファ以外で最近選択したもの
    fn other_buffer(&self, except: BufferId) -> Option<BufferId> {
        self.buffers
            .iter()
            .find(|buffer| buffer.id() != except && !buffer.flags.temporary)
            .or_else(|| self.buffers.iter().find(|buffer| buffer.id() != except))
            .map(Buffer::id)
    }

    fn buffer_names(&self) -> Vec<String> {
        self.buffers.iter().map(|buffer| buffer.name().to_string()).collect()
    }

    /// バッファを削除し、それを表示していたウィンドウに別のバッファを出す
    pub fn kill_buffer(&mut self, id: BufferId) {
        // 最後のバッファなら削除後に名前が空くので番号を付けない
        let replacement = match self.other_buffer(id) {
            Some(other) => other,
            None => self.push_buffer(SCRATCH_NAME.to_string()),
        };
        for index in 0..self.windows.len() {
            if self.windows[index].buffer == id {
                self.show_buffer_in_window(index, replacement);
            }
        }
        if let Some(index) = self.buffer_index(id) {
            let buffer = self.buffers.remove(index);
            log::debug!("killed buffer {}", buffer.name());
        }
    }

    // ---- バッファのコマンド ----

    pub(crate) fn switch_to_buffer(&mut self) -> CommandResult {
        let current = self.current_buffer_id();
        let default = self
            .other_buffer(current)
            .and_then(|id| self.buffer_by_id(id))
            .map(|buffer| buffer.name().to_string());
        let prompt = match &default {
            Some(name) => format!("Switch to buffer (default {}): ", name),
            None => "Switch to buffer: ".to_string(),
        };
        let completion = Completion::new(self.buffer_names());
        let input = self.read_string(&prompt, "", Some(HistoryKind::Buffers), Some(completion))?;
        let name = match (input.is_empty(), default) {
            (true, Some(default)) => default,
            (true, None) => return Ok(()),
            (false, _) => input,
        };
        let id = match self.find_buffer(&name) {
            Some(id) => id,
            None => self.create_buffer(&name),
        };
        self.show_buffer_in_current_window(id);
        Ok(())
    }

    pub(crate) fn kill_buffer_command(&mut self) -> CommandResult {
        let current_name = self.buffer().name().to_string();
        let prompt = format!("Kill buffer (default {}): ", current_name);
        let completion = Completion::new(self.buffer_names());
        let input = self.read_string(&prompt, "", Some(HistoryKind::Buffers), Some(completion))?;
        let name = if input.is_empty() { current_name } else { input };
        let id = self
            .find_buffer(&name)
            .ok_or_else(|| CommandError::Message(BufferError::NotFound { name: name.clone() }.to_string()))?;

        let needs_confirm = self
            .buffer_by_id(id)
            .map(|buffer| buffer.is_modified() && buffer.filename().is_some() && !buffer.flags.temporary)
            .unwrap_or(false);
        if needs_confirm && !self.read_yesno(&format!("Buffer {} modified; kill anyway? ", name))? {
            return Ok(());
        }
        self.kill_buffer(id);
        Ok(())
    }

    pub(crate) fn list_buffers(&mut self) -> CommandResult {
        let mut lines = vec![
            " MR Buffer           Size  File".to_string(),
            " -- ------           ----  ----".to_string(),
        ];
        let current = self.current_buffer_id();
        for buffer in self.buffers.iter().filter(|buffer| buffer.name() != BUFFER_LIST_NAME) {
            let flags = format!(
                "{}{}{}",
                if buffer.id() == current { '.' } else { ' ' },
                if buffer.is_modified() { '*' } else { ' ' },
                if buffer.flags.readonly { '%' } else { ' ' },
            );
            let file = buffer
                .filename()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            lines.push(format!(
                "{} {:<16} {:>5}  {}",
                flags,
                buffer.name(),
                buffer.len_chars(),
                file
            ));
        }
        lines.push(String::new());

        let id = match self.find_buffer(BUFFER_LIST_NAME) {
            Some(id) => id,
            None => self.create_buffer(BUFFER_LIST_NAME),
        };
        if let Some(buffer) = self.buffer_by_id_mut(id) {
            buffer.flags.temporary = true;
            buffer.flags.need_name = false;
            buffer.set_lines(lines);
            buffer.flags.readonly = true;
            buffer.flags.no_undo = true;
        }
        self.popup_buffer(id)
    }

    pub(crate) fn toggle_read_only(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.flags.readonly = !buffer.flags.readonly;
        Ok(())
    }

    pub(crate) fn rename_buffer(&mut self) -> CommandResult {
        let name = self.read_string("Rename buffer (to new name): ", "", Some(HistoryKind::Buffers), None)?;
        if name.is_empty() {
            return Err(CommandError::Message("Empty string is invalid as a buffer name".to_string()));
        }
        let current = self.current_buffer_id();
        match self.find_buffer(&name) {
            Some(id) if id != current => {
                Err(CommandError::Message(BufferError::NameInUse { name }.to_string()))
            }
            _ => {
                self.buffer_mut().set_name(name);
                Ok(())
            }
        }
    }

    // ---- ファイル ----

    /// 現在のバッファのディレクトリ（`/` で終わる）
    fn default_directory(&self) -> String {
        let dir = self
            .buffer()
            .filename()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        let mut text = dir.display().to_string();
        if !text.ends_with('/') {
            text.push('/');
        }
        text
    }

    fn read_file_name(&mut self, prompt: &str, initial: &str) -> Result<PathBuf, CommandError> {
        let input = self.read_string(prompt, initial, Some(HistoryKind::Files), Some(Completion::filename()))?;
        let path = expand_path(&input)?;
        if path.is_dir() {
            return Err(FileError::IsDirectory {
                path: path.display().to_string(),
            }
            .into());
        }
        Ok(path)
    }

    /// ファイルを訪問するバッファを返す。なければ読み込んで作る。
    pub fn visit_file(&mut self, path: &Path, readonly: bool) -> Result<BufferId, CommandError> {
        if let Some(id) = self.find_buffer_visiting(path) {
            return Ok(id);
        }
        let loaded = if path.exists() {
            Some(file::read_lines(path)?)
        } else {
            None
        };
        let writable = std::fs::metadata(path)
            .map(|meta| !meta.permissions().readonly())
            .unwrap_or(true);

        let id = self.create_buffer(&file_label(path));
        let is_new = loaded.is_none();
        if let Some(buffer) = self.buffer_by_id_mut(id) {
            if let Some(loaded) = loaded {
                buffer.set_lines(loaded.lines);
                buffer.set_eol(loaded.eol);
            }
            buffer.set_filename(Some(path.to_path_buf()));
            buffer.flags.readonly = readonly || !writable;
        }
        log::info!("visit {}", path.display());
        if is_new {
            self.message("(New file)");
        }
        Ok(id)
    }

    /// 起動時のファイル指定。`line` は 1 始まり。
    pub fn open_file(&mut self, path: &Path, line: Option<usize>) -> CommandResult {
        let path = expand_path(&path.display().to_string())?;
        let id = self.visit_file(&path, false)?;
        self.show_buffer_in_current_window(id);
        if let Some(line) = line {
            self.buffer_mut().goto_point(line.saturating_sub(1), 0);
        }
        Ok(())
    }

    pub(crate) fn find_file(&mut self, readonly: bool) -> CommandResult {
        let prompt = if readonly {
            "Find file read-only: "
        } else {
            "Find file: "
        };
        let initial = self.default_directory();
        let path = self.read_file_name(prompt, &initial)?;
        let id = self.visit_file(&path, readonly)?;
        self.show_buffer_in_current_window(id);
        Ok(())
    }

    pub(crate) fn find_alternate_file(&mut self) -> CommandResult {
        let old = self.current_buffer_id();
        let initial = self
            .buffer()
            .filename()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| self.default_directory());
        let path = self.read_file_name("Find alternate file: ", &initial)?;
        let (name, modified) = {
            let buffer = self.buffer();
            (buffer.name().to_string(), buffer.is_modified() && !buffer.flags.temporary)
        };
        if modified && !self.read_yesno(&format!("Buffer {} modified; kill anyway? ", name))? {
            return Ok(());
        }
        // 同じファイルなら読み直す
        if self.buffer().filename() == Some(path.as_path()) {
            if let Some(buffer) = self.buffer_by_id_mut(old) {
                buffer.set_filename(None);
            }
        }
        let id = self.visit_file(&path, false)?;
        self.show_buffer_in_current_window(id);
        if id != old {
            self.kill_buffer(old);
        }
        Ok(())
    }

    pub(crate) fn insert_file(&mut self) -> CommandResult {
        self.buffer().ensure_writable()?;
        let initial = self.default_directory();
        let path = self.read_file_name("Insert file: ", &initial)?;
        let loaded = file::read_lines(&path)?;
        let text = loaded.lines.join("\n");
        let buffer = self.buffer_mut();
        let start = buffer.point_to_offset(buffer.pt());
        buffer.insert_string(&text)?;
        let end = buffer.pt();
        buffer.set_mark(end);
        buffer.goto_offset(start);
        Ok(())
    }

    /// バッファをファイルへ書き出す。初回はバックアップを作る。
    fn write_buffer(&mut self, id: BufferId) -> CommandResult {
        let make_backups = self.vars.get_bool(None, "make-backup-files");
        let backup_dir = match self.vars.get_global("backup-directory") {
            Some(dir) if dir != "nil" && !dir.is_empty() => Some(expand_path(dir)?),
            _ => None,
        };
        let buffer = self
            .buffer_by_id_mut(id)
            .ok_or_else(|| CommandError::Message("No such buffer".to_string()))?;
        let path = buffer
            .filename()
            .map(Path::to_path_buf)
            .ok_or_else(|| CommandError::Message("Buffer is not visiting a file".to_string()))?;

        if make_backups && !buffer.flags.backup_made {
            match make_backup(&path, backup_dir.as_deref()) {
                Ok(_) => buffer.flags.backup_made = true,
                Err(error) => log::warn!("backup of {} failed: {}", path.display(), error),
            }
        }
        file::write_lines(&path, &buffer.line_strings(), buffer.eol())?;
        buffer.set_modified(false);
        buffer.undo.forget_unchanged();
        self.message(format!("Wrote {}", path.display()));
        Ok(())
    }

    /// ファイル名を変えてバッファ名も合わせる
    fn set_visited_file(&mut self, path: PathBuf) {
        let id = self.current_buffer_id();
        let name = {
            let label = file_label(&path);
            match self.find_buffer(&label) {
                Some(other) if other != id => self.unique_buffer_name(&label),
                _ => label,
            }
        };
        let buffer = self.buffer_mut();
        buffer.set_name(name);
        buffer.set_filename(Some(path));
        buffer.flags.backup_made = false;
        buffer.flags.temporary = false;
    }

    pub(crate) fn save_buffer(&mut self) -> CommandResult {
        if !self.buffer().is_modified() {
            self.message("(No changes need to be saved)");
            return Ok(());
        }
        if self.buffer().filename().is_none() {
            let initial = self.default_directory();
            let path = self.read_file_name("File to save in: ", &initial)?;
            self.set_visited_file(path);
        }
        let id = self.current_buffer_id();
        self.write_buffer(id)
    }

    pub(crate) fn write_file(&mut self) -> CommandResult {
        let initial = self.default_directory();
        let path = self.read_file_name("Write file: ", &initial)?;
        self.set_visited_file(path);
        let id = self.current_buffer_id();
        self.write_buffer(id)
    }

    fn read_save_answer(&mut self, path: &Path) -> Result<SaveAnswer, CommandError> {
        let prompt = format!("Save file {}? (y, n, !, ., q) ", path.display());
        loop {
            let key = self.read_char(&prompt)?;
            let answer = match key.as_char() {
                Some('y' | ' ') => SaveAnswer::Save,
                Some('n') => SaveAnswer::Skip,
                Some('!') => SaveAnswer::SaveAll,
                Some('.') => SaveAnswer::SaveAndStop,
                Some('q') => SaveAnswer::Stop,
                _ if key == Key::RET => SaveAnswer::Stop,
                _ if key == Key::DEL => SaveAnswer::Skip,
                _ => {
                    self.term.beep();
                    continue;
                }
            };
            return Ok(answer);
        }
    }

    /// 変更のあるファイルバッファを 1 つずつ尋ねて保存する
    pub(crate) fn save_some_buffers(&mut self) -> CommandResult {
        let candidates: Vec<(BufferId, PathBuf)> = self
            .buffers
            .iter()
            .filter(|buffer| buffer.is_modified() && !buffer.flags.temporary)
            .filter_map(|buffer| buffer.filename().map(|path| (buffer.id(), path.to_path_buf())))
            .collect();
        if candidates.is_empty() {
            self.message("(No files need saving)");
            return Ok(());
        }
        let mut ask = true;
        for (id, path) in candidates {
            let answer = if ask {
                self.read_save_answer(&path)?
            } else {
                SaveAnswer::Save
            };
            match answer {
                SaveAnswer::Save => self.write_buffer(id)?,
                SaveAnswer::Skip => {}
                SaveAnswer::SaveAll => {
                    ask = false;
                    self.write_buffer(id)?;
                }
                SaveAnswer::SaveAndStop => {
                    self.write_buffer(id)?;
                    break;
                }
                SaveAnswer::Stop => break,
            }
        }
        Ok(())
    }

    pub(crate) fn save_buffers_kill_emacs(&mut self) -> CommandResult {
        self.save_some_buffers()?;
        let unsaved = self.buffers.iter().any(|buffer| {
            buffer.is_modified() && buffer.filename().is_some() && !buffer.flags.temporary
        });
        if unsaved && !self.read_yesno("Modified buffers exist; exit anyway? ")? {
            return Ok(());
        }
        log::info!("quit requested");
        self.request_quit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unique_names_get_numbered() {
        let mut editor = editor_with_text("");
        let first = editor.create_buffer("notes");
        let second = editor.create_buffer("notes");
        assert_eq!(editor.buffer_by_id(first).map(Buffer::name), Some("notes"));
        assert_eq!(editor.buffer_by_id(second).map(Buffer::name), Some("notes<2>"));
    }

    #[test]
    fn switch_to_new_buffer_and_back() {
        let mut editor = editor_with_text("scratch text");
        editor.feed_sequence("C-x b f o o RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().name(), "foo");
        editor.feed_sequence("C-x b RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().name(), "*scratch*");
    }

    #[test]
    fn kill_last_buffer_creates_scratch() {
        let mut editor = editor_with_text("x");
        editor.feed_sequence("C-x k RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffers().len(), 1);
        assert_eq!(editor.buffer().name(), "*scratch*");
        assert_eq!(editor.buffer().text(), "");
    }

    #[test]
    fn rename_to_existing_name_fails() {
        let mut editor = editor_with_text("");
        editor.create_buffer("other");
        editor.feed_sequence("M-x r e n a m e - b u f f e r RET o t h e r RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Buffer name `other' is in use"));
    }

    #[test]
    fn find_file_reads_lines_and_eol() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dos.txt");
        fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut editor = editor_with_text("");
        editor.lisp_args.push_back(path.display().to_string());
        editor.find_file(false).unwrap();
        assert_eq!(editor.buffer().name(), "dos.txt");
        assert_eq!(editor.buffer().text(), "one\ntwo\n");
        assert_eq!(editor.buffer().eol(), crate::buffer::Eol::CrLf);
        assert!(!editor.buffer().is_modified());
    }

    #[test]
    fn find_file_reuses_visiting_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "a").unwrap();

        let mut editor = editor_with_text("");
        editor.lisp_args.push_back(path.display().to_string());
        editor.find_file(false).unwrap();
        let first = editor.current_buffer_id();
        editor.lisp_args.push_back(path.display().to_string());
        editor.find_file(false).unwrap();
        assert_eq!(editor.current_buffer_id(), first);
        assert_eq!(editor.buffers().len(), 2);
    }

    #[test]
    fn find_missing_file_reports_new_file() {
        let dir = tempdir().unwrap();
        let mut editor = editor_with_text("");
        editor.lisp_args.push_back(dir.path().join("new.txt").display().to_string());
        editor.find_file(false).unwrap();
        assert_eq!(editor.echo_text(), Some("(New file)"));
        assert_eq!(editor.buffer().text(), "");
    }

    #[test]
    fn save_writes_file_with_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.txt");
        fs::write(&path, "old").unwrap();

        let mut editor = editor_with_text("");
        editor.lisp_args.push_back(path.display().to_string());
        editor.find_file(false).unwrap();
        editor.feed_sequence("C-e ! C-x C-s").unwrap();
        editor.run_pending();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old!");
        assert_eq!(fs::read_to_string(dir.path().join("b.txt~")).unwrap(), "old");
        assert!(!editor.buffer().is_modified());
        assert_eq!(editor.echo_text(), Some(format!("Wrote {}", path.display()).as_str()));
    }

    #[test]
    fn save_unmodified_buffer_is_a_no_op() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-x C-s").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("(No changes need to be saved)"));
    }

    #[test]
    fn insert_file_leaves_point_before_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ins.txt");
        fs::write(&path, "xy\nz").unwrap();

        let mut editor = editor_with_text("ab");
        editor.buffer_mut().goto_offset(1);
        editor.lisp_args.push_back(path.display().to_string());
        editor.insert_file().unwrap();
        assert_eq!(editor.buffer().text(), "axy\nzb");
        assert_eq!(editor.point_offset(), 1);
        assert_eq!(editor.buffer().mark().map(|pt| (pt.n, pt.o)), Some((1, 1)));
    }

    #[test]
    fn list_buffers_pops_up_temporary_buffer() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-x C-b").unwrap();
        editor.run_pending();
        assert_eq!(editor.windows().len(), 2);
        let listed = editor.windows()[1].buffer_id();
        let buffer = editor.buffer_by_id(listed).unwrap();
        assert_eq!(buffer.name(), "*Buffer List*");
        assert!(buffer.text().contains("*scratch*"));
        assert!(buffer.flags.readonly);
    }

    #[test]
    fn kill_emacs_with_saved_buffers_quits() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-x C-c").unwrap();
        editor.run_pending();
        assert!(editor.is_quit_requested());
    }
}
