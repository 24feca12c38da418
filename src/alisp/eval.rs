//! 式の評価

use std::fs;
use std::path::Path;

use crate::alisp::ast::Expr;
use crate::alisp::error::EvalError;
use crate::alisp::reader;
use crate::editor::Editor;

/// ソース文字列の全フォームを評価し、最後の値を返す
pub fn eval_string(editor: &mut Editor, source: &str) -> Result<Expr, EvalError> {
    let forms = reader::parse(source)?;
    let mut last = Expr::nil();
    for form in &forms {
        last = eval(editor, form)?;
    }
    Ok(last)
}

pub fn eval_file(editor: &mut Editor, path: &Path) -> Result<Expr, EvalError> {
    let source = fs::read_to_string(path).map_err(|err| EvalError::LoadFile {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    log::info!("loading {}", path.display());
    eval_string(editor, &source)
}

pub fn eval(editor: &mut Editor, expr: &Expr) -> Result<Expr, EvalError> {
    match expr {
        Expr::Integer(_) | Expr::Str(_) => Ok(expr.clone()),
        Expr::Quote(inner) => Ok((**inner).clone()),
        Expr::Symbol(name) => Ok(lookup_variable(editor, name)),
        Expr::List(items) => eval_list(editor, items),
    }
}

/// 未束縛のシンボルはそのシンボル自身に評価される
fn lookup_variable(editor: &Editor, name: &str) -> Expr {
    if name == "t" || name == "nil" {
        return Expr::Symbol(name.to_string());
    }
    match editor.variable_value(name) {
        Some(value) => Expr::from_value_string(value),
        None => Expr::Symbol(name.to_string()),
    }
}

fn eval_list(editor: &mut Editor, items: &[Expr]) -> Result<Expr, EvalError> {
    let Some((head, args)) = items.split_first() else {
        return Ok(Expr::nil());
    };
    let name = head
        .as_symbol()
        .ok_or_else(|| EvalError::InvalidForm("function call"))?;
    match name {
        "setq" => eval_setq(editor, args),
        "quote" => args
            .first()
            .cloned()
            .ok_or_else(|| EvalError::InvalidForm("quote")),
        "progn" => {
            let mut last = Expr::nil();
            for form in args {
                last = eval(editor, form)?;
            }
            Ok(last)
        }
        _ => call_function(editor, name, args),
    }
}

fn eval_setq(editor: &mut Editor, args: &[Expr]) -> Result<Expr, EvalError> {
    if args.len() % 2 != 0 {
        return Err(EvalError::InvalidForm("setq"));
    }
    let mut last = Expr::nil();
    for pair in args.chunks(2) {
        let name = pair[0]
            .as_symbol()
            .ok_or_else(|| EvalError::InvalidForm("setq"))?;
        let value = eval(editor, &pair[1])?;
        editor.set_variable(name, &value.to_value_string());
        last = value;
    }
    Ok(last)
}

/// コマンドの成否を `t` / `nil` に写す
fn call_function(editor: &mut Editor, name: &str, args: &[Expr]) -> Result<Expr, EvalError> {
    let function = editor
        .resolve_function(name)
        .ok_or_else(|| EvalError::UndefinedFunction(name.to_string()))?;
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(editor, arg)?);
    }
    Ok(Expr::from_bool(editor.call_from_lisp(&function, &values)))
}
