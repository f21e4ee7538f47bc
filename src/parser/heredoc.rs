//! Here-Document Handling
//!
//! A here-document's operator and body live in different places: the body
//! starts after the newline ending the logical line that contained `<<`.
//! The grammar queues a pending entry per operator and drains the queue
//! FIFO whenever it consumes a newline, capturing bodies straight from the
//! cursor. Because the AST is built before the bodies are known, the nodes
//! are created with empty bodies and a fill pass installs the captured
//! text afterwards, walking the tree in source order.

use std::collections::VecDeque;

use crate::ast::types::{
    AndOr, Command, List, Pipeline, Redir, ShellCommand,
};
use crate::parser::input::{Builder, Cursor};

/// A here-doc operator seen on the current logical line, body not yet read.
#[derive(Debug, Clone)]
pub struct PendingHeredoc {
    pub delimiter: String,
    pub strip_tabs: bool,
}

/// Read one here-doc body at the cursor: lines up to (not including) the
/// delimiter line. With `strip_tabs`, leading tabs are removed from every
/// line before the delimiter comparison and from the captured body.
pub fn read_heredoc_body(cur: &mut Cursor, pending: &PendingHeredoc) -> String {
    let mut body = Builder::new();
    while !cur.eof() {
        let mut line = String::new();
        while let Some(c) = cur.current() {
            if c == '\n' {
                break;
            }
            line.push(c);
            cur.advance();
        }
        cur.eat('\n');

        let line = if pending.strip_tabs {
            line.trim_start_matches('\t')
        } else {
            line.as_str()
        };
        if line == pending.delimiter {
            break;
        }
        body.push_str(line);
        body.push('\n');
    }
    // A here-document at end of input takes the remaining lines as-is
    body.finish()
}

/// Install captured bodies into the AST, in source order of the operators.
pub fn fill_list(list: &mut List, bodies: &mut VecDeque<String>) {
    for stmt in &mut list.0 {
        fill_and_or(&mut stmt.and_or, bodies);
    }
}

fn fill_and_or(and_or: &mut AndOr, bodies: &mut VecDeque<String>) {
    match and_or {
        AndOr::Last(p) => fill_pipeline(p, bodies),
        AndOr::And(p, rest) | AndOr::Or(p, rest) => {
            fill_pipeline(p, bodies);
            fill_and_or(rest, bodies);
        }
    }
}

fn fill_pipeline(pipeline: &mut Pipeline, bodies: &mut VecDeque<String>) {
    match pipeline {
        Pipeline::Commands(cmds) => {
            for cmd in cmds {
                fill_command(cmd, bodies);
            }
        }
        Pipeline::Invert(p) => fill_pipeline(p, bodies),
        Pipeline::Time { pipeline, .. } => fill_pipeline(pipeline, bodies),
    }
}

fn fill_command(cmd: &mut Command, bodies: &mut VecDeque<String>) {
    match &mut cmd.inner {
        ShellCommand::If {
            cond,
            then_branch,
            else_branch,
        } => {
            fill_list(cond, bodies);
            fill_list(then_branch, bodies);
            if let Some(else_list) = else_branch {
                fill_list(else_list, bodies);
            }
        }
        ShellCommand::Case { clauses, .. } => {
            for clause in clauses {
                fill_list(&mut clause.body, bodies);
            }
        }
        ShellCommand::While { cond, body } | ShellCommand::Until { cond, body } => {
            fill_list(cond, bodies);
            fill_list(body, bodies);
        }
        ShellCommand::For { body, .. }
        | ShellCommand::ArithFor { body, .. }
        | ShellCommand::Select { body, .. }
        | ShellCommand::FunctionDef { body, .. } => fill_list(body, bodies),
        ShellCommand::Subshell(list) | ShellCommand::Group(list) => fill_list(list, bodies),
        ShellCommand::Coproc { command, .. } => fill_command(command, bodies),
        ShellCommand::Simple { .. }
        | ShellCommand::AssignBuiltin { .. }
        | ShellCommand::Cond(_)
        | ShellCommand::Arith(_) => {}
    }
    for redir in &mut cmd.redirs {
        if let Redir::Heredoc { body, .. } = redir {
            if let Some(text) = bodies.pop_front() {
                *body = text;
            }
        }
    }
}
