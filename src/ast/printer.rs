//! AST Pretty-Printer
//!
//! Every node renders back to source text via `Display`. Printing is
//! loss-minimal: re-parsing the output yields an equal AST, with whitespace
//! normalized to one statement per line and comments gone.
//!
//! Here-documents need care: the operator prints inline (`<<EOF`) but the
//! body belongs after the newline that ends the logical line. `List` is the
//! node that owns line breaks, so it flushes the bodies of every
//! here-document opened on a statement's line, in operator order, right
//! after that statement.

use std::fmt;

use crate::ast::types::{
    AndOr, Assign, AssignArg, CaseClause, CaseDirection, Command, List, ListTerm, ParamSubst,
    Parameter, PatternSide, Pipeline, ProcessDirection, RValue, Redir, ShellCommand, Span,
    Statement, Word,
};

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            write!(f, "{}", span)?;
        }
        Ok(())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{}", c),
            Self::Escape(c) => write!(f, "\\{}", c),
            Self::Single(s) => write!(f, "'{}'", s),
            Self::Double(w) => write!(f, "\"{}\"", w),
            Self::AnsiC(w) => write!(f, "$'{}'", w),
            Self::Locale(w) => write!(f, "$\"{}\"", w),
            Self::Backquote(w) => write!(f, "`{}`", w),
            Self::Parameter(p) => write!(f, "{}", p),
            Self::ArithSubst(s) => write!(f, "$(({}))", s),
            Self::CommandSubst(s) => write!(f, "$({})", s),
            Self::ProcessSubst(ProcessDirection::Input, s) => write!(f, "<({})", s),
            Self::ProcessSubst(ProcessDirection::Output, s) => write!(f, ">({})", s),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(sub) = &self.subscript {
            write!(f, "[{}]", sub)?;
        }
        Ok(())
    }
}

fn bang(indirect: bool) -> &'static str {
    if indirect {
        "!"
    } else {
        ""
    }
}

impl fmt::Display for ParamSubst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSubst(raw) => write!(f, "${{{}}}", raw),
            Self::Bare(p) => write!(f, "${}", p.name),
            Self::Brace {
                indirect,
                parameter,
            } => write!(f, "${{{}{}}}", bang(*indirect), parameter),
            Self::Alt {
                indirect,
                parameter,
                check_null,
                op,
                word,
            } => write!(
                f,
                "${{{}{}{}{}{}}}",
                bang(*indirect),
                parameter,
                if *check_null { ":" } else { "" },
                op,
                word
            ),
            Self::Substring {
                indirect,
                parameter,
                offset,
                length,
            } => {
                write!(f, "${{{}{}:{}", bang(*indirect), parameter, offset)?;
                if !length.is_empty() {
                    write!(f, ":{}", length)?;
                }
                write!(f, "}}")
            }
            Self::Prefix { prefix, modifier } => write!(f, "${{!{}{}}}", prefix, modifier),
            Self::Indices(p) => write!(f, "${{!{}}}", p),
            Self::Length(p) => write!(f, "${{#{}}}", p),
            Self::Delete {
                indirect,
                parameter,
                shortest,
                side,
                pattern,
            } => {
                let op = match (side, shortest) {
                    (PatternSide::Front, true) => "#",
                    (PatternSide::Front, false) => "##",
                    (PatternSide::Back, true) => "%",
                    (PatternSide::Back, false) => "%%",
                };
                write!(f, "${{{}{}{}{}}}", bang(*indirect), parameter, op, pattern)
            }
            Self::Replace {
                indirect,
                parameter,
                all,
                anchor,
                pattern,
                replacement,
            } => {
                write!(f, "${{{}{}/", bang(*indirect), parameter)?;
                if *all {
                    write!(f, "/")?;
                }
                match anchor {
                    Some(PatternSide::Front) => write!(f, "#")?,
                    Some(PatternSide::Back) => write!(f, "%")?,
                    None => {}
                }
                write!(f, "{}", pattern)?;
                if !replacement.is_empty() {
                    write!(f, "/{}", replacement)?;
                }
                write!(f, "}}")
            }
            Self::LetterCase {
                indirect,
                parameter,
                direction,
                all,
                pattern,
            } => {
                let op = match (direction, all) {
                    (CaseDirection::Upper, false) => "^",
                    (CaseDirection::Upper, true) => "^^",
                    (CaseDirection::Lower, false) => ",",
                    (CaseDirection::Lower, true) => ",,",
                };
                write!(f, "${{{}{}{}{}}}", bang(*indirect), parameter, op, pattern)
            }
        }
    }
}

impl fmt::Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.op, self.rvalue)
    }
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{}", w),
            Self::Array(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    if let Some(sub) = &e.subscript {
                        write!(f, "[{}]=", sub)?;
                    }
                    write!(f, "{}", e.value)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Redir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redir { desc, op, target } => {
                if let Some(d) = desc {
                    write!(f, "{}", d)?;
                }
                write!(f, "{}{}", op, target)
            }
            Self::Heredoc {
                op,
                delimiter,
                quoted,
                ..
            } => {
                if *quoted {
                    write!(f, "{}'{}'", op, delimiter)
                } else {
                    write!(f, "{}{}", op, delimiter)
                }
            }
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commands(cmds) => {
                for (i, cmd) in cmds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", cmd)?;
                }
                Ok(())
            }
            Self::Invert(p) => write!(f, "! {}", p),
            Self::Time { posix, pipeline } => {
                write!(f, "time {}{}", if *posix { "-p " } else { "" }, pipeline)
            }
        }
    }
}

impl fmt::Display for AndOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Last(p) => write!(f, "{}", p),
            Self::And(p, rest) => write!(f, "{} && {}", p, rest),
            Self::Or(p, rest) => write!(f, "{} || {}", p, rest),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        for redir in &self.redirs {
            write!(f, " {}", redir)?;
        }
        Ok(())
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple {
                assignments,
                words,
            } => {
                let mut first = true;
                for a in assignments {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", a)?;
                    first = false;
                }
                for w in words {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", w)?;
                    first = false;
                }
                Ok(())
            }
            Self::AssignBuiltin { name, args } => {
                write!(f, "{}", name)?;
                for arg in args {
                    match arg {
                        AssignArg::Assign(a) => write!(f, " {}", a)?,
                        AssignArg::Word(w) => write!(f, " {}", w)?,
                    }
                }
                Ok(())
            }
            Self::If {
                cond,
                then_branch,
                else_branch,
            } => {
                write!(f, "if {}then\n{}", cond, then_branch)?;
                if let Some(else_list) = else_branch {
                    write!(f, "else\n{}", else_list)?;
                }
                write!(f, "fi")
            }
            Self::Case { word, clauses } => {
                writeln!(f, "case {} in", word)?;
                for clause in clauses {
                    write!(f, "{}", clause)?;
                }
                write!(f, "esac")
            }
            Self::For { name, words, body } => {
                write!(f, "for {}", name)?;
                if words.is_empty() {
                    // `for x;` iterates nothing; a bare `for x` means "$@"
                    write!(f, ";")?;
                } else {
                    write!(f, " in")?;
                    for w in words {
                        write!(f, " {}", w)?;
                    }
                }
                write!(f, "\ndo\n{}done", body)
            }
            Self::ArithFor { expr, body } => {
                write!(f, "for (({}))\ndo\n{}done", expr, body)
            }
            Self::While { cond, body } => write!(f, "while {}do\n{}done", cond, body),
            Self::Until { cond, body } => write!(f, "until {}do\n{}done", cond, body),
            Self::Select { name, words, body } => {
                write!(f, "select {}", name)?;
                if words.is_empty() {
                    write!(f, ";")?;
                } else {
                    write!(f, " in")?;
                    for w in words {
                        write!(f, " {}", w)?;
                    }
                }
                write!(f, "\ndo\n{}done", body)
            }
            Self::Subshell(list) => write!(f, "( {})", list),
            Self::Group(list) => write!(f, "{{ {}}}", list),
            Self::Cond(words) => {
                write!(f, "[[")?;
                for w in words {
                    write!(f, " {}", w)?;
                }
                write!(f, " ]]")
            }
            Self::Arith(expr) => write!(f, "(({}))", expr),
            Self::Coproc { name, command } => {
                if matches!(
                    command.inner,
                    ShellCommand::Simple { .. } | ShellCommand::AssignBuiltin { .. }
                ) {
                    write!(f, "coproc {}", command)
                } else {
                    write!(f, "coproc {} {}", name, command)
                }
            }
            Self::FunctionDef { name, body } => {
                write!(f, "{}()", name)?;
                for stmt in &body.0 {
                    write!(f, " {}", stmt)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for CaseClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.patterns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", p)?;
        }
        writeln!(f, ")")?;
        write!(f, "{}", self.body)?;
        writeln!(f, "{}", self.term)
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.0 {
            writeln!(f, "{}", stmt)?;
            let mut heredocs = Vec::new();
            collect_line_heredocs(&stmt.and_or, &mut heredocs);
            for redir in heredocs {
                if let Redir::Heredoc {
                    delimiter, body, ..
                } = redir
                {
                    write!(f, "{}", body)?;
                    writeln!(f, "{}", delimiter)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.and_or)?;
        if self.terminator == ListTerm::Asynchronous {
            write!(f, " &")?;
        }
        Ok(())
    }
}

/// Collect the here-documents whose operators sit on this statement's last
/// printed line, in operator order. Compound commands that print their own
/// newlines (if/while/case/...) flush bodies through their inner lists, so
/// only commands printed inline are descended into.
fn collect_line_heredocs<'a>(and_or: &'a AndOr, out: &mut Vec<&'a Redir>) {
    match and_or {
        AndOr::Last(p) => collect_pipeline(p, out),
        AndOr::And(p, rest) | AndOr::Or(p, rest) => {
            collect_pipeline(p, out);
            collect_line_heredocs(rest, out);
        }
    }
}

fn collect_pipeline<'a>(pipeline: &'a Pipeline, out: &mut Vec<&'a Redir>) {
    match pipeline {
        Pipeline::Commands(cmds) => {
            for cmd in cmds {
                collect_command(cmd, out);
            }
        }
        Pipeline::Invert(p) => collect_pipeline(p, out),
        Pipeline::Time { pipeline, .. } => collect_pipeline(pipeline, out),
    }
}

fn collect_command<'a>(cmd: &'a Command, out: &mut Vec<&'a Redir>) {
    match &cmd.inner {
        ShellCommand::Coproc { command, .. } => collect_command(command, out),
        ShellCommand::FunctionDef { body, .. } => {
            for stmt in &body.0 {
                collect_line_heredocs(&stmt.and_or, out);
            }
        }
        _ => {}
    }
    for redir in &cmd.redirs {
        if matches!(redir, Redir::Heredoc { .. }) {
            out.push(redir);
        }
    }
}
