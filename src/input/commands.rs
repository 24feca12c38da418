//! コマンド定義
//!
//! 組み込みコマンドの閉じた列挙と、名前・既定キー・説明の静的な表。

use super::keycode::Key;
use super::keymap::{Keymap, KeymapError};
use crate::error::InputError;

/// 組み込みコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // 移動
    ForwardChar,
    BackwardChar,
    NextLine,
    PreviousLine,
    BeginningOfLine,
    EndOfLine,
    ForwardWord,
    BackwardWord,
    BeginningOfBuffer,
    EndOfBuffer,
    ScrollUp,
    ScrollDown,
    GotoLine,
    GotoChar,
    ForwardParagraph,
    BackwardParagraph,
    ForwardSexp,
    BackwardSexp,
    BackToIndentation,
    Recenter,
    // 編集
    SelfInsertCommand,
    Newline,
    OpenLine,
    NewlineAndIndent,
    DeleteChar,
    BackwardDeleteChar,
    DeleteHorizontalSpace,
    JustOneSpace,
    DeleteBlankLines,
    IndentForTabCommand,
    TabToTabStop,
    QuotedInsert,
    Insert,
    TransposeChars,
    TransposeWords,
    TransposeLines,
    TransposeSexps,
    UpcaseWord,
    DowncaseWord,
    CapitalizeWord,
    UpcaseRegion,
    DowncaseRegion,
    FillParagraph,
    SetFillColumn,
    AutoFillMode,
    OverwriteMode,
    Undo,
    // キル
    KillLine,
    KillRegion,
    CopyRegionAsKill,
    KillWord,
    BackwardKillWord,
    KillSexp,
    Yank,
    // マーク
    SetMarkCommand,
    ExchangePointAndMark,
    MarkWholeBuffer,
    MarkWord,
    MarkParagraph,
    MarkSexp,
    // 検索
    IsearchForward,
    IsearchBackward,
    IsearchForwardRegexp,
    IsearchBackwardRegexp,
    SearchForward,
    SearchBackward,
    SearchForwardRegexp,
    SearchBackwardRegexp,
    ReplaceString,
    QueryReplace,
    // ファイル
    FindFile,
    FindFileReadOnly,
    FindAlternateFile,
    InsertFile,
    SaveBuffer,
    WriteFile,
    SaveSomeBuffers,
    SaveBuffersKillEmacs,
    // バッファ
    SwitchToBuffer,
    KillBuffer,
    ListBuffers,
    ToggleReadOnly,
    RenameBuffer,
    // ウィンドウ
    SplitWindow,
    DeleteWindow,
    DeleteOtherWindows,
    OtherWindow,
    EnlargeWindow,
    ShrinkWindow,
    // マクロ
    StartKbdMacro,
    EndKbdMacro,
    CallLastKbdMacro,
    NameLastKbdMacro,
    // ヘルプ
    DescribeBindings,
    WhereIs,
    DescribeFunction,
    DescribeVariable,
    DescribeKey,
    // その他
    ExecuteExtendedCommand,
    KeyboardQuit,
    UniversalArgument,
    SetVariable,
    EvalExpression,
    EvalBuffer,
    Load,
    GlobalSetKey,
    WhatCursorPosition,
    SuspendEmacs,
}

/// コマンド表の 1 エントリ
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub command: Command,
    pub name: &'static str,
    pub keys: &'static [&'static str],
    pub doc: &'static str,
}

macro_rules! commands {
    ($( $command:ident, $name:literal, [$($key:literal),*], $doc:literal; )*) => {
        /// 組み込みコマンドの一覧
        pub const COMMANDS: &[CommandSpec] = &[
            $( CommandSpec {
                command: Command::$command,
                name: $name,
                keys: &[$($key),*],
                doc: $doc,
            }, )*
        ];
    };
}

commands! {
    ForwardChar, "forward-char", ["C-f", "<right>"], "Move point right N characters (left if N is negative).";
    BackwardChar, "backward-char", ["C-b", "<left>"], "Move point left N characters (right if N is negative).";
    NextLine, "next-line", ["C-n", "<down>"], "Move cursor vertically down N lines, keeping the goal column.";
    PreviousLine, "previous-line", ["C-p", "<up>"], "Move cursor vertically up N lines, keeping the goal column.";
    BeginningOfLine, "beginning-of-line", ["C-a", "<home>"], "Move point to beginning of current line.";
    EndOfLine, "end-of-line", ["C-e", "<end>"], "Move point to end of current line.";
    ForwardWord, "forward-word", ["M-f"], "Move point forward N words.";
    BackwardWord, "backward-word", ["M-b"], "Move backward until encountering the beginning of a word.";
    BeginningOfBuffer, "beginning-of-buffer", ["M-<", "C-<home>"], "Move point to the beginning of the buffer; leave mark at previous position.";
    EndOfBuffer, "end-of-buffer", ["M->", "C-<end>"], "Move point to the end of the buffer; leave mark at previous position.";
    ScrollUp, "scroll-up", ["C-v", "<next>"], "Scroll text of current window upward near full screen.";
    ScrollDown, "scroll-down", ["M-v", "<prior>"], "Scroll text of current window downward near full screen.";
    GotoLine, "goto-line", ["M-g g", "M-g M-g"], "Move point to line LINE, counting from line 1 at beginning of buffer.";
    GotoChar, "goto-char", ["M-g c"], "Set point to POSITION, a number counting from 1.";
    ForwardParagraph, "forward-paragraph", ["M-}"], "Move forward to end of paragraph.";
    BackwardParagraph, "backward-paragraph", ["M-{"], "Move backward to start of paragraph.";
    ForwardSexp, "forward-sexp", ["C-M-f"], "Move forward across one balanced expression.";
    BackwardSexp, "backward-sexp", ["C-M-b"], "Move backward across one balanced expression.";
    BackToIndentation, "back-to-indentation", ["M-m"], "Move point to the first non-whitespace character on this line.";
    Recenter, "recenter", ["C-l"], "Center point in window and redisplay screen.";
    SelfInsertCommand, "self-insert-command", [], "Insert the character you type.";
    Newline, "newline", ["RET"], "Insert a newline at the current point position.";
    OpenLine, "open-line", ["C-o"], "Insert a newline and leave point before it.";
    NewlineAndIndent, "newline-and-indent", ["C-j"], "Insert a newline, then indent to the previous line's indentation.";
    DeleteChar, "delete-char", ["C-d", "<delete>"], "Delete the following N characters (previous if N is negative).";
    BackwardDeleteChar, "backward-delete-char", ["DEL"], "Delete the previous N characters (following if N is negative).";
    DeleteHorizontalSpace, "delete-horizontal-space", ["M-\\"], "Delete all spaces and tabs around point.";
    JustOneSpace, "just-one-space", ["M-SPC"], "Delete all spaces and tabs around point, leaving one space.";
    DeleteBlankLines, "delete-blank-lines", ["C-x C-o"], "On blank line, delete all surrounding blank lines, leaving just one.";
    IndentForTabCommand, "indent-for-tab-command", ["TAB"], "Indent line or insert a tab to the previous line's indentation.";
    TabToTabStop, "tab-to-tab-stop", ["M-i"], "Insert spaces or tabs to next defined tab-stop column.";
    QuotedInsert, "quoted-insert", ["C-q"], "Read next input character and insert it.";
    Insert, "insert", [], "Insert the argument string at point.";
    TransposeChars, "transpose-chars", ["C-t"], "Interchange characters around point, moving forward one character.";
    TransposeWords, "transpose-words", ["M-t"], "Interchange words around point, leaving point at end of them.";
    TransposeLines, "transpose-lines", ["C-x C-t"], "Exchange current line and previous line, leaving point after both.";
    TransposeSexps, "transpose-sexps", ["C-M-t"], "Like transpose-words but applies to balanced expressions.";
    UpcaseWord, "upcase-word", ["M-u"], "Convert following word to upper case, moving over.";
    DowncaseWord, "downcase-word", ["M-l"], "Convert following word to lower case, moving over.";
    CapitalizeWord, "capitalize-word", ["M-c"], "Capitalize the following word, moving over.";
    UpcaseRegion, "upcase-region", ["C-x C-u"], "Convert the region to upper case.";
    DowncaseRegion, "downcase-region", ["C-x C-l"], "Convert the region to lower case.";
    FillParagraph, "fill-paragraph", ["M-q"], "Fill paragraph at or after point.";
    SetFillColumn, "set-fill-column", ["C-x f"], "Set fill-column to the argument or the current column.";
    AutoFillMode, "auto-fill-mode", [], "Toggle Auto Fill mode.";
    OverwriteMode, "overwrite-mode", ["<insert>"], "Toggle Overwrite mode.";
    Undo, "undo", ["C-_", "C-/", "C-x u"], "Undo some previous changes.";
    KillLine, "kill-line", ["C-k"], "Kill the rest of the current line; if no nonblanks there, kill thru newline.";
    KillRegion, "kill-region", ["C-w"], "Kill between point and mark.";
    CopyRegionAsKill, "copy-region-as-kill", ["M-w"], "Save the region as if killed, but don't kill it.";
    KillWord, "kill-word", ["M-d"], "Kill characters forward until encountering the end of a word.";
    BackwardKillWord, "backward-kill-word", ["M-DEL"], "Kill characters backward until encountering the end of a word.";
    KillSexp, "kill-sexp", ["C-M-k"], "Kill the sexp following the cursor.";
    Yank, "yank", ["C-y"], "Reinsert the last stretch of killed text.";
    SetMarkCommand, "set-mark-command", ["C-SPC", "C-@"], "Set mark at where point is; with an argument, pop the mark ring.";
    ExchangePointAndMark, "exchange-point-and-mark", ["C-x C-x"], "Put the mark where point is now, and point where the mark is now.";
    MarkWholeBuffer, "mark-whole-buffer", ["C-x h"], "Put point at beginning and mark at end of buffer.";
    MarkWord, "mark-word", ["M-@"], "Set mark argument words away from point.";
    MarkParagraph, "mark-paragraph", ["M-h"], "Put point at beginning of this paragraph, mark at end.";
    MarkSexp, "mark-sexp", ["C-M-@"], "Set mark argument sexps from point.";
    IsearchForward, "isearch-forward", ["C-s"], "Do incremental search forward.";
    IsearchBackward, "isearch-backward", ["C-r"], "Do incremental search backward.";
    IsearchForwardRegexp, "isearch-forward-regexp", ["C-M-s"], "Do incremental search forward for regular expression.";
    IsearchBackwardRegexp, "isearch-backward-regexp", ["C-M-r"], "Do incremental search backward for regular expression.";
    SearchForward, "search-forward", [], "Search forward from point for the user specified text.";
    SearchBackward, "search-backward", [], "Search backward from point for the user specified text.";
    SearchForwardRegexp, "search-forward-regexp", [], "Search forward from point for regular expression REGEXP.";
    SearchBackwardRegexp, "search-backward-regexp", [], "Search backward from point for regular expression REGEXP.";
    ReplaceString, "replace-string", [], "Replace occurrences of a string with other text.";
    QueryReplace, "query-replace", ["M-%"], "Replace occurrences of a string with other text, asking each time.";
    FindFile, "find-file", ["C-x C-f"], "Edit the specified file.";
    FindFileReadOnly, "find-file-read-only", ["C-x C-r"], "Edit the specified file but don't allow changes.";
    FindAlternateFile, "find-alternate-file", ["C-x C-v"], "Find the file specified by the user, select its buffer, kill previous buffer.";
    InsertFile, "insert-file", ["C-x i"], "Insert contents of the user specified file into buffer after point.";
    SaveBuffer, "save-buffer", ["C-x C-s"], "Save current buffer in visited file if modified.";
    WriteFile, "write-file", ["C-x C-w"], "Write current buffer into the user specified file.";
    SaveSomeBuffers, "save-some-buffers", ["C-x s"], "Save some modified file-visiting buffers, asking about each one.";
    SaveBuffersKillEmacs, "save-buffers-kill-emacs", ["C-x C-c"], "Offer to save each buffer, then kill this process.";
    SwitchToBuffer, "switch-to-buffer", ["C-x b"], "Select the buffer named by the user in the current window.";
    KillBuffer, "kill-buffer", ["C-x k"], "Kill the buffer named by the user.";
    ListBuffers, "list-buffers", ["C-x C-b"], "Display a list of names of existing buffers.";
    ToggleReadOnly, "toggle-read-only", ["C-x C-q"], "Change whether this buffer is visiting its file read-only.";
    RenameBuffer, "rename-buffer", [], "Change current buffer's name to the user specified name.";
    SplitWindow, "split-window", ["C-x 2"], "Split current window into two windows, one above the other.";
    DeleteWindow, "delete-window", ["C-x 0"], "Remove the current window from the screen.";
    DeleteOtherWindows, "delete-other-windows", ["C-x 1"], "Make the selected window fill the screen.";
    OtherWindow, "other-window", ["C-x o"], "Select the first different window on the screen.";
    EnlargeWindow, "enlarge-window", ["C-x ^"], "Make current window one line bigger.";
    ShrinkWindow, "shrink-window", [], "Make current window one line smaller.";
    StartKbdMacro, "start-kbd-macro", ["C-x ("], "Record subsequent keyboard input, defining a keyboard macro.";
    EndKbdMacro, "end-kbd-macro", ["C-x )"], "Finish defining a keyboard macro.";
    CallLastKbdMacro, "call-last-kbd-macro", ["C-x e"], "Call the last keyboard macro that you defined.";
    NameLastKbdMacro, "name-last-kbd-macro", [], "Assign a name to the last keyboard macro defined.";
    DescribeBindings, "describe-bindings", ["C-h b"], "Show a list of all defined keys, and their definitions.";
    WhereIs, "where-is", ["C-h w"], "Print message listing key sequences that invoke the command.";
    DescribeFunction, "describe-function", ["C-h f"], "Display the full documentation of a function.";
    DescribeVariable, "describe-variable", ["C-h v"], "Display the full documentation of a variable.";
    DescribeKey, "describe-key", ["C-h k"], "Display documentation of the function invoked by a key sequence.";
    ExecuteExtendedCommand, "execute-extended-command", ["M-x"], "Read a function name, then call it.";
    KeyboardQuit, "keyboard-quit", ["C-g"], "Cancel current command.";
    UniversalArgument, "universal-argument", ["C-u"], "Begin a numeric argument for the following command.";
    SetVariable, "set-variable", [], "Set a variable value to the user-specified value.";
    EvalExpression, "eval-expression", ["M-:"], "Evaluate an expression and print its value.";
    EvalBuffer, "eval-buffer", [], "Execute the current buffer as Lisp code.";
    Load, "load", [], "Execute a file of Lisp code named FILE.";
    GlobalSetKey, "global-set-key", [], "Bind a command to a key sequence.";
    WhatCursorPosition, "what-cursor-position", ["C-x ="], "Print info on cursor position.";
    SuspendEmacs, "suspend-emacs", ["C-z"], "Stop the editor and return to the superior process.";
}

impl Command {
    pub fn spec(self) -> &'static CommandSpec {
        match COMMANDS.iter().find(|spec| spec.command == self) {
            Some(spec) => spec,
            None => unreachable!("every command has a table entry"),
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn doc(self) -> &'static str {
        self.spec().doc
    }

    pub fn from_name(name: &str) -> Option<Command> {
        COMMANDS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.command)
    }

    /// 引数（文字列）を読むコマンドか。Lisp から呼ぶときの引数の渡し方を決める。
    pub fn reads_arguments(self) -> bool {
        matches!(
            self,
            Command::GotoLine
                | Command::GotoChar
                | Command::Insert
                | Command::SearchForward
                | Command::SearchBackward
                | Command::SearchForwardRegexp
                | Command::SearchBackwardRegexp
                | Command::ReplaceString
                | Command::QueryReplace
                | Command::FindFile
                | Command::FindFileReadOnly
                | Command::FindAlternateFile
                | Command::InsertFile
                | Command::WriteFile
                | Command::SwitchToBuffer
                | Command::KillBuffer
                | Command::RenameBuffer
                | Command::NameLastKbdMacro
                | Command::WhereIs
                | Command::DescribeFunction
                | Command::DescribeVariable
                | Command::ExecuteExtendedCommand
                | Command::SetVariable
                | Command::EvalExpression
                | Command::Load
                | Command::GlobalSetKey
        )
    }

    /// 縦移動コマンド（目標桁を引き継ぐ）
    pub fn is_vertical_motion(self) -> bool {
        matches!(
            self,
            Command::NextLine | Command::PreviousLine | Command::ScrollUp | Command::ScrollDown
        )
    }
}

/// キーに割り当てる機能
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Command(Command),
    /// 名前付きキーボードマクロ
    Macro(String),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Command(command) => command.name(),
            Function::Macro(name) => name,
        }
    }
}

/// コマンド表から既定のキーマップを作る
///
/// 表はコードの一部なので、解析エラーや衝突は起動時の致命的エラーとして返す。
pub fn default_keymap() -> Result<Keymap<Function>, InputError> {
    let mut keymap = Keymap::new();
    for spec in COMMANDS {
        for sequence in spec.keys {
            let keys = Key::parse_sequence(sequence).map_err(|_| InputError::InvalidKeySequence {
                sequence: sequence.to_string(),
            })?;
            keymap
                .bind(&keys, Function::Command(spec.command))
                .map_err(|error| match error {
                    KeymapError::Empty => InputError::InvalidKeySequence {
                        sequence: sequence.to_string(),
                    },
                    _ => InputError::BindingConflict {
                        sequence: sequence.to_string(),
                    },
                })?;
        }
    }
    Ok(keymap)
}

/// 名前の前方一致で候補を返す（`M-x` の補完用）
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|spec| spec.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::Lookup;
    use std::collections::HashSet;

    #[test]
    fn default_table_binds_without_conflicts() {
        let keymap = default_keymap().expect("static command table must bind cleanly");
        let keys = Key::parse_sequence("C-x C-f").unwrap();
        assert_eq!(
            keymap.lookup(&keys),
            Lookup::Bound(&Function::Command(Command::FindFile))
        );
        assert_eq!(keymap.lookup(&[Key::ctrl('x')]), Lookup::Prefix);
        assert_eq!(keymap.lookup(&[Key::meta('g')]), Lookup::Prefix);
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        let mut seen = HashSet::new();
        for spec in COMMANDS {
            assert!(seen.insert(spec.name), "duplicate name {}", spec.name);
            assert_eq!(Command::from_name(spec.name), Some(spec.command));
            assert_eq!(spec.command.name(), spec.name);
        }
        assert_eq!(Command::from_name("no-such-command"), None);
    }

    #[test]
    fn where_is_reports_every_binding() {
        let keymap = default_keymap().unwrap();
        let mut bindings = keymap.where_is(&Function::Command(Command::Undo));
        bindings.sort();
        assert_eq!(bindings, vec!["C-/", "C-_", "C-x u"]);
    }
}
