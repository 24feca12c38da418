//! tsuzuri のエントリポイント

use std::io::IsTerminal;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::Parser;

use tsuzuri::error::{self, ConfigError};
use tsuzuri::logging::Logger;
use tsuzuri::{CrosstermTerminal, Editor, ScriptedTerminal, Terminal};

/// 起動スクリプトの名前（ホームディレクトリ直下）
const INIT_FILE_NAME: &str = ".tsuzuri";

const EXIT_FATAL: u8 = 1;
const EXIT_CRASH: u8 = 2;

/// Emacs 互換の端末テキストエディタ
#[derive(Debug, Parser)]
#[command(name = "tsuzuri", version, about)]
struct Cli {
    /// 起動時に実行するコマンド
    #[arg(short = 'f', long = "funcall", value_name = "FUNC")]
    funcall: Vec<String>,

    /// 変数を設定する
    #[arg(short = 'v', long = "variable", value_name = "VAR=VALUE")]
    variables: Vec<String>,

    /// 起動スクリプトを読まない
    #[arg(short = 'q', long = "no-init-file")]
    no_init_file: bool,

    /// 開くファイル。`+LINE` を前に置くとその行へ移動する。
    #[arg(value_name = "[+LINE] FILE")]
    files: Vec<String>,
}

/// `+LINE FILE` の組
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileArg {
    path: PathBuf,
    line: Option<usize>,
}

fn parse_file_args(args: &[String]) -> anyhow::Result<Vec<FileArg>> {
    let mut files = Vec::new();
    let mut line = None;
    for arg in args {
        if let Some(number) = arg.strip_prefix('+') {
            let number = number
                .parse::<usize>()
                .with_context(|| format!("invalid line number: {}", arg))?;
            line = Some(number);
            continue;
        }
        files.push(FileArg {
            path: PathBuf::from(arg),
            line: line.take(),
        });
    }
    if line.is_some() {
        bail!("line number without a file");
    }
    Ok(files)
}

fn parse_assignment(text: &str) -> Result<(String, String), ConfigError> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidAssignment {
            assignment: text.to_string(),
        }),
    }
}

fn init_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(INIT_FILE_NAME))
}

fn load_init_file(editor: &mut Editor, path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    editor.load_init_file(path).map_err(|error| {
        anyhow!(ConfigError::StartupFile {
            path: path.display().to_string(),
            message: error.to_string(),
        })
    })
}

/// 端末を開く。標準出力が端末でなければスクリプト端末で動く。
fn open_terminal() -> anyhow::Result<Box<dyn Terminal>> {
    if std::io::stdout().is_terminal() {
        let terminal = CrosstermTerminal::new().context("cannot open terminal")?;
        Ok(Box::new(terminal))
    } else {
        log::info!("stdout is not a terminal; running headless");
        Ok(Box::new(ScriptedTerminal::new(80, 24)))
    }
}

fn start(cli: &Cli) -> anyhow::Result<Editor> {
    let files = parse_file_args(&cli.files)?;
    let assignments = cli
        .variables
        .iter()
        .map(String::as_str)
        .map(parse_assignment)
        .collect::<Result<Vec<_>, _>>()?;

    let mut editor = Editor::new(open_terminal()?).context("cannot start editor")?;
    if !cli.no_init_file {
        if let Some(path) = init_file_path() {
            load_init_file(&mut editor, &path)?;
        }
    }
    for (name, value) in &assignments {
        editor.set_global_variable(name, value);
    }
    for file in &files {
        if let Err(error) = editor.open_file(&file.path, file.line) {
            editor.report_error(&error);
        }
    }
    for name in &cli.funcall {
        if let Err(error) = editor.call_function_by_name(name) {
            editor.report_error(&error);
        }
    }
    Ok(editor)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    Logger::from_env().install();
    error::setup_panic_handler();
    log::info!("tsuzuri {} starting", env!("CARGO_PKG_VERSION"));

    let mut editor = match start(&cli) {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("tsuzuri: {:#}", error);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| editor.run()));
    match result {
        Ok(()) => {
            log::info!("tsuzuri exiting");
            ExitCode::SUCCESS
        }
        Err(_) => {
            let saved = editor.emergency_save();
            // 端末を戻してから報告する
            drop(editor);
            eprintln!("tsuzuri: internal error; see the log for details");
            for path in saved {
                eprintln!("tsuzuri: saved {}", path.display());
            }
            ExitCode::from(EXIT_CRASH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn line_prefix_applies_to_next_file() {
        let files = parse_file_args(&strings(&["a.txt", "+12", "b.txt"])).unwrap();
        assert_eq!(
            files,
            vec![
                FileArg {
                    path: PathBuf::from("a.txt"),
                    line: None
                },
                FileArg {
                    path: PathBuf::from("b.txt"),
                    line: Some(12)
                },
            ]
        );
    }

    #[test]
    fn dangling_line_number_is_an_error() {
        assert!(parse_file_args(&strings(&["+3"])).is_err());
        assert!(parse_file_args(&strings(&["+x", "a"])).is_err());
    }

    #[test]
    fn assignments_split_at_first_equals() {
        assert_eq!(
            parse_assignment("fill-column=60").unwrap(),
            ("fill-column".to_string(), "60".to_string())
        );
        assert_eq!(
            parse_assignment("x=a=b").unwrap(),
            ("x".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn cli_accepts_options() {
        let cli = Cli::try_parse_from(["tsuzuri", "-q", "-v", "tab-width=4", "-f", "end-of-buffer", "+2", "x"]).unwrap();
        assert!(cli.no_init_file);
        assert_eq!(cli.variables, vec!["tab-width=4"]);
        assert_eq!(cli.funcall, vec!["end-of-buffer"]);
        assert_eq!(cli.files, vec!["+2", "x"]);
    }
}
