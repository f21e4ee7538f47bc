//! Shell Grammar Parser
//!
//! Recursive descent over the character cursor, following the bash grammar:
//!
//!   script       ::= linebreak statement*
//!   statement    ::= and_or (';' | '&' | newline)?
//!   and_or       ::= pipeline (('&&' | '||') linebreak and_or)?
//!   pipeline     ::= ['time' ['-p']] ['!'] command (('|' | '|&') command)*
//!   command      ::= compound_command redir* | simple_command
//!
//! Single words come from the word-span scanner, assignments from the
//! assignment lexer, and operators from the longest-match tables. Reserved
//! words are recognized only for unquoted words in command position. The
//! parser commits after a construct's opening keyword; failures are final
//! and carry the failing position.

use std::collections::VecDeque;

use crate::ast::types::{
    AndOr, Assign, AssignArg, CaseClause, ClauseTerm, Command, HeredocOp, IoDesc, List, ListTerm,
    ParamSubst, Parameter, Pipeline, Redir, RedirOp, ShellCommand, Span, Statement, Word,
};
use crate::expansion::unquote;
use crate::parser::assign::scan_assign;
use crate::parser::heredoc::{fill_list, read_heredoc_body, PendingHeredoc};
use crate::parser::input::Cursor;
use crate::parser::operators::{longest_match, COND_OPS, REDIR_OPS};
use crate::parser::types::{
    is_name_char, is_name_start, is_valid_name, ParseError, ASSIGN_BUILTINS, MAX_INPUT_SIZE,
    MAX_PARSER_DEPTH, RESERVED_WORDS, WORD_DELIMITERS,
};
use crate::parser::word::{scan_raw_arith, scan_word};

/// Word delimiters inside [[ ... ]]; the conditional operators are lexed
/// separately.
const COND_WORD_DELIMITERS: &str = " \t\n()<>&|;";

/// Parse a complete script.
pub fn parse(source_name: &str, input: &str) -> Result<List, ParseError> {
    if input.len() > MAX_INPUT_SIZE {
        return Err(ParseError::new(
            source_name,
            1,
            1,
            format!(
                "input too large: {} bytes exceeds limit of {}",
                input.len(),
                MAX_INPUT_SIZE
            ),
        ));
    }
    Parser::new(source_name, input).parse_script()
}

/// Parser state for one parse call.
pub struct Parser {
    cur: Cursor,
    /// Here-docs opened on the current logical line, FIFO
    pending_heredocs: Vec<PendingHeredoc>,
    /// Captured bodies in operator order, installed by the fill pass
    heredoc_bodies: VecDeque<String>,
    depth: usize,
}

impl Parser {
    pub fn new(source_name: &str, input: &str) -> Self {
        Parser {
            cur: Cursor::new(source_name, input),
            pending_heredocs: Vec::new(),
            heredoc_bodies: VecDeque::new(),
            depth: 0,
        }
    }

    pub fn parse_script(&mut self) -> Result<List, ParseError> {
        let mut list = self.compound_list()?;
        self.skip_newlines();
        if !self.cur.eof() {
            let c = self.cur.current().unwrap_or(' ');
            return Err(self
                .cur
                .error(format!("syntax error near unexpected token '{}'", c)));
        }
        // A here-doc opened on the final line with no trailing newline
        self.process_heredocs();
        fill_list(&mut list, &mut self.heredoc_bodies);
        Ok(list)
    }

    // ===========================================================================
    // TOKEN-LEVEL HELPERS
    // ===========================================================================

    /// Skip spaces, tabs, line continuations, and comments.
    fn skip_blanks(&mut self) {
        loop {
            match self.cur.current() {
                Some(' ' | '\t') => {
                    self.cur.advance();
                }
                Some('\\') if self.cur.peek(1) == Some('\n') => {
                    self.cur.advance();
                    self.cur.advance();
                }
                Some('#') => {
                    while let Some(c) = self.cur.current() {
                        if c == '\n' {
                            break;
                        }
                        self.cur.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip blank lines; every consumed newline drains pending here-docs.
    fn skip_newlines(&mut self) {
        loop {
            self.skip_blanks();
            if self.cur.current() == Some('\n') {
                self.cur.advance();
                self.process_heredocs();
            } else {
                break;
            }
        }
    }

    fn process_heredocs(&mut self) {
        let pending = std::mem::take(&mut self.pending_heredocs);
        for p in pending {
            let body = read_heredoc_body(&mut self.cur, &p);
            self.heredoc_bodies.push_back(body);
        }
    }

    /// The text of the next word, when it is entirely unquoted plain
    /// characters. Consumes nothing.
    fn peek_unquoted_word(&mut self) -> Option<String> {
        let state = self.cur.save();
        let word = scan_word(&mut self.cur, WORD_DELIMITERS).ok();
        self.cur.restore(state);
        word.as_ref().and_then(word_text)
    }

    /// Consume the word just inspected with peek_unquoted_word.
    fn consume_word(&mut self) -> Result<Word, ParseError> {
        scan_word(&mut self.cur, WORD_DELIMITERS)
    }

    fn eat_reserved(&mut self, keyword: &str) -> Result<bool, ParseError> {
        self.skip_blanks();
        if self.peek_unquoted_word().as_deref() == Some(keyword) {
            self.consume_word()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_reserved(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.eat_reserved(keyword)? {
            Ok(())
        } else {
            Err(self.cur.error(format!("expected '{}'", keyword)))
        }
    }

    // ===========================================================================
    // LISTS AND STATEMENTS
    // ===========================================================================

    /// Statements until a list closer: `)`, a case terminator, a closing
    /// reserved word, or end of input. May be empty.
    fn compound_list(&mut self) -> Result<List, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_list_end() {
                break;
            }
            statements.push(self.statement()?);
        }
        Ok(List(statements))
    }

    fn compound_list_nonempty(&mut self) -> Result<List, ParseError> {
        let list = self.compound_list()?;
        if list.0.is_empty() {
            return Err(self.cur.error("expected command"));
        }
        Ok(list)
    }

    fn at_list_end(&mut self) -> bool {
        self.skip_blanks();
        match self.cur.current() {
            None => return true,
            Some(')') => return true,
            Some(';') if matches!(self.cur.peek(1), Some(';' | '&')) => return true,
            _ => {}
        }
        matches!(
            self.peek_unquoted_word().as_deref(),
            Some("then" | "else" | "elif" | "fi" | "do" | "done" | "esac" | "}")
        )
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let and_or = self.and_or()?;
        self.skip_blanks();
        let terminator = match self.cur.current() {
            Some(';') if matches!(self.cur.peek(1), Some(';' | '&')) => ListTerm::Sequential,
            Some(';') => {
                self.cur.advance();
                ListTerm::Sequential
            }
            Some('&') if self.cur.peek(1) != Some('&') => {
                self.cur.advance();
                ListTerm::Asynchronous
            }
            Some('\n') => {
                self.cur.advance();
                self.process_heredocs();
                ListTerm::Sequential
            }
            _ => {
                // Only a list closer may follow without a separator
                if !self.at_list_end() {
                    let c = self.cur.current().unwrap_or(' ');
                    return Err(self
                        .cur
                        .error(format!("syntax error near unexpected token '{}'", c)));
                }
                ListTerm::Sequential
            }
        };
        Ok(Statement {
            and_or,
            terminator,
        })
    }

    fn and_or(&mut self) -> Result<AndOr, ParseError> {
        let pipeline = self.pipeline_command()?;
        self.skip_blanks();
        if self.cur.at_str("&&") {
            self.cur.advance();
            self.cur.advance();
            self.skip_newlines();
            let rest = self.and_or()?;
            Ok(AndOr::And(pipeline, Box::new(rest)))
        } else if self.cur.at_str("||") {
            self.cur.advance();
            self.cur.advance();
            self.skip_newlines();
            let rest = self.and_or()?;
            Ok(AndOr::Or(pipeline, Box::new(rest)))
        } else {
            Ok(AndOr::Last(pipeline))
        }
    }

    // ===========================================================================
    // PIPELINES
    // ===========================================================================

    fn pipeline_command(&mut self) -> Result<Pipeline, ParseError> {
        self.skip_blanks();
        if self.eat_reserved("time")? {
            self.skip_blanks();
            let posix = if self.peek_unquoted_word().as_deref() == Some("-p") {
                self.consume_word()?;
                true
            } else {
                false
            };
            let pipeline = self.pipeline_command()?;
            return Ok(Pipeline::Time {
                posix,
                pipeline: Box::new(pipeline),
            });
        }
        if self.eat_reserved("!")? {
            let pipeline = self.pipeline_command()?;
            return Ok(Pipeline::Invert(Box::new(pipeline)));
        }
        self.pipeline()
    }

    fn pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let mut commands = vec![self.command()?];
        loop {
            self.skip_blanks();
            if self.cur.at_str("|&") {
                self.cur.advance();
                self.cur.advance();
                // |& is shorthand for 2>&1 on the left command
                if let Some(last) = commands.last_mut() {
                    last.redirs.push(Redir::Redir {
                        desc: Some(IoDesc::Number(2)),
                        op: RedirOp::GreatAnd,
                        target: Word::from_string("1"),
                    });
                }
                self.skip_newlines();
                commands.push(self.command()?);
            } else if self.cur.current() == Some('|') && self.cur.peek(1) != Some('|') {
                self.cur.advance();
                self.skip_newlines();
                commands.push(self.command()?);
            } else {
                break;
            }
        }
        Ok(Pipeline::Commands(commands))
    }

    // ===========================================================================
    // COMMANDS
    // ===========================================================================

    fn command(&mut self) -> Result<Command, ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            self.depth -= 1;
            return Err(self.cur.error("maximum nesting depth exceeded"));
        }
        let result = self.command_inner();
        self.depth -= 1;
        result
    }

    fn command_inner(&mut self) -> Result<Command, ParseError> {
        self.skip_blanks();

        if self.cur.at_str("((") {
            self.cur.advance();
            self.cur.advance();
            let expr = scan_raw_arith(&mut self.cur)?;
            let redirs = self.redir_list()?;
            return Ok(Command::new(ShellCommand::Arith(expr), redirs));
        }
        if self.cur.current() == Some('(') {
            self.cur.advance();
            let list = self.compound_list_nonempty()?;
            self.skip_blanks();
            if !self.cur.eat(')') {
                return Err(self.cur.error("expected ')'"));
            }
            let redirs = self.redir_list()?;
            return Ok(Command::new(ShellCommand::Subshell(list), redirs));
        }

        if let Some(text) = self.peek_unquoted_word() {
            match text.as_str() {
                "if" => {
                    self.consume_word()?;
                    let inner = self.if_clauses()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(inner, redirs));
                }
                "while" => {
                    self.consume_word()?;
                    let cond = self.compound_list_nonempty()?;
                    let body = self.do_group()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(ShellCommand::While { cond, body }, redirs));
                }
                "until" => {
                    self.consume_word()?;
                    let cond = self.compound_list_nonempty()?;
                    let body = self.do_group()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(ShellCommand::Until { cond, body }, redirs));
                }
                "for" => {
                    self.consume_word()?;
                    let inner = self.for_command()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(inner, redirs));
                }
                "select" => {
                    self.consume_word()?;
                    let inner = self.select_command()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(inner, redirs));
                }
                "case" => {
                    self.consume_word()?;
                    let inner = self.case_command()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(inner, redirs));
                }
                "{" => {
                    self.consume_word()?;
                    let list = self.compound_list_nonempty()?;
                    self.expect_reserved("}")?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(ShellCommand::Group(list), redirs));
                }
                "[[" => {
                    self.consume_word()?;
                    let words = self.cond_words()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(ShellCommand::Cond(words), redirs));
                }
                "function" => {
                    self.consume_word()?;
                    return self.function_command();
                }
                "coproc" => {
                    self.consume_word()?;
                    let inner = self.coproc_command()?;
                    let redirs = self.redir_list()?;
                    return Ok(Command::new(inner, redirs));
                }
                "then" | "else" | "elif" | "fi" | "do" | "done" | "esac" | "in" | "}" | "]]"
                | "!" | "time" => {
                    return Err(self
                        .cur
                        .error(format!("syntax error near unexpected token '{}'", text)));
                }
                _ => {}
            }
        }

        if let Some(cmd) = self.try_function_def()? {
            return Ok(cmd);
        }
        self.simple_command()
    }

    // ===========================================================================
    // SIMPLE COMMANDS
    // ===========================================================================

    fn simple_command(&mut self) -> Result<Command, ParseError> {
        let mut assignments = Vec::new();
        let mut redirs = Vec::new();

        // Prefix: assignments and redirections in any order
        loop {
            self.skip_blanks();
            if let Some(r) = self.try_redir()? {
                self.push_redir(&mut redirs, r);
                continue;
            }
            if let Some(a) = self.try_assign()? {
                assignments.push(a);
                continue;
            }
            break;
        }

        // Assignment builtins take assignment-or-word arguments
        if assignments.is_empty() {
            if let Some(text) = self.peek_unquoted_word() {
                if ASSIGN_BUILTINS.contains(text.as_str()) {
                    return self.assign_builtin(redirs);
                }
            }
        }

        let mut words = Vec::new();
        loop {
            self.skip_blanks();
            if let Some(r) = self.try_redir()? {
                self.push_redir(&mut redirs, r);
                continue;
            }
            let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
            if word.is_empty() {
                break;
            }
            words.push(word);
        }

        if assignments.is_empty() && words.is_empty() {
            return Err(match self.cur.current() {
                Some(c) => self
                    .cur
                    .error(format!("syntax error near unexpected token '{}'", c)),
                None => self.cur.error("unexpected end of input"),
            });
        }
        Ok(Command::new(
            ShellCommand::Simple {
                assignments,
                words,
            },
            redirs,
        ))
    }

    fn assign_builtin(&mut self, mut redirs: Vec<Redir>) -> Result<Command, ParseError> {
        let name = self.consume_word()?;
        let mut args = Vec::new();
        loop {
            self.skip_blanks();
            if let Some(r) = self.try_redir()? {
                self.push_redir(&mut redirs, r);
                continue;
            }
            if let Some(a) = self.try_assign()? {
                args.push(AssignArg::Assign(a));
                continue;
            }
            let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
            if word.is_empty() {
                break;
            }
            args.push(AssignArg::Word(word));
        }
        Ok(Command::new(
            ShellCommand::AssignBuiltin { name, args },
            redirs,
        ))
    }

    // ===========================================================================
    // ASSIGNMENTS AND REDIRECTIONS (speculative, memoized)
    // ===========================================================================

    fn try_assign(&mut self) -> Result<Option<Assign>, ParseError> {
        let pos = self.cur.pos();
        if let Some(entry) = self.cur.memo_assign.get(&pos).cloned() {
            return Ok(entry.map(|(a, end)| {
                self.cur.restore(end);
                a
            }));
        }
        let state = self.cur.save();
        match scan_assign(&mut self.cur) {
            Ok(a) => {
                let end = self.cur.save();
                self.cur.memo_assign.insert(pos, Some((a.clone(), end)));
                Ok(Some(a))
            }
            Err(_) => {
                self.cur.restore(state);
                self.cur.memo_assign.insert(pos, None);
                Ok(None)
            }
        }
    }

    fn try_redir(&mut self) -> Result<Option<Redir>, ParseError> {
        let pos = self.cur.pos();
        if let Some(entry) = self.cur.memo_redir.get(&pos).cloned() {
            return Ok(entry.map(|(r, end)| {
                self.cur.restore(end);
                r
            }));
        }
        let state = self.cur.save();
        match self.scan_redir() {
            Ok(r) => {
                let end = self.cur.save();
                self.cur.memo_redir.insert(pos, Some((r.clone(), end)));
                Ok(Some(r))
            }
            Err(_) => {
                self.cur.restore(state);
                self.cur.memo_redir.insert(pos, None);
                Ok(None)
            }
        }
    }

    fn scan_redir(&mut self) -> Result<Redir, ParseError> {
        let mut desc = None;
        match self.cur.current() {
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = self.cur.current() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    self.cur.advance();
                }
                if !matches!(self.cur.current(), Some('<' | '>')) {
                    return Err(self.cur.error("expected redirection"));
                }
                let number = digits
                    .parse()
                    .map_err(|_| self.cur.error("file descriptor out of range"))?;
                desc = Some(IoDesc::Number(number));
            }
            Some('{') => {
                self.cur.advance();
                let mut name = String::new();
                while let Some(c) = self.cur.current() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    self.cur.advance();
                }
                let valid = !name.is_empty()
                    && is_name_start(name.chars().next().unwrap_or('0'))
                    && self.cur.eat('}')
                    && matches!(self.cur.current(), Some('<' | '>'));
                if !valid {
                    return Err(self.cur.error("expected redirection"));
                }
                desc = Some(IoDesc::Var(name));
            }
            _ => {}
        }

        // A `<` directly followed by `(` is a process substitution word
        if self.cur.current() == Some('<') && self.cur.peek(1) == Some('(') {
            return Err(self.cur.error("expected redirection"));
        }

        if self.cur.at_str("<<") && !self.cur.at_str("<<<") {
            let op = if self.cur.eat_str("<<-") {
                HeredocOp::DLessDash
            } else {
                self.cur.eat_str("<<");
                HeredocOp::DLess
            };
            self.skip_blanks();
            let target = scan_word(&mut self.cur, WORD_DELIMITERS)?;
            if target.is_empty() {
                return Err(self.cur.error("expected here-document delimiter"));
            }
            let delimiter = unquote(&target);
            let quoted = delimiter != target.to_string();
            return Ok(Redir::Heredoc {
                op,
                delimiter,
                quoted,
                body: String::new(),
            });
        }

        let (op, _) = longest_match(&mut self.cur, REDIR_OPS)?;
        self.skip_blanks();
        let target = scan_word(&mut self.cur, WORD_DELIMITERS)?;
        if target.is_empty() {
            return Err(self.cur.error("expected redirection target"));
        }
        Ok(Redir::Redir { desc, op, target })
    }

    /// Append a redirection; here-docs also join the pending queue so the
    /// next newline captures their bodies.
    fn push_redir(&mut self, redirs: &mut Vec<Redir>, redir: Redir) {
        if let Redir::Heredoc {
            op, delimiter, ..
        } = &redir
        {
            self.pending_heredocs.push(PendingHeredoc {
                delimiter: delimiter.clone(),
                strip_tabs: op.strips_tabs(),
            });
        }
        redirs.push(redir);
    }

    fn redir_list(&mut self) -> Result<Vec<Redir>, ParseError> {
        let mut redirs = Vec::new();
        loop {
            self.skip_blanks();
            match self.try_redir()? {
                Some(r) => self.push_redir(&mut redirs, r),
                None => break,
            }
        }
        Ok(redirs)
    }

    // ===========================================================================
    // COMPOUND COMMANDS
    // ===========================================================================

    /// Body of an if after the `if` keyword; `elif` recurses as a nested if
    /// in the else branch and shares the closing `fi`.
    fn if_clauses(&mut self) -> Result<ShellCommand, ParseError> {
        let cond = self.compound_list_nonempty()?;
        self.expect_reserved("then")?;
        let then_branch = self.compound_list_nonempty()?;

        if self.eat_reserved("elif")? {
            let nested = self.if_clauses()?;
            let else_branch = List(vec![Statement {
                and_or: AndOr::Last(Pipeline::Commands(vec![Command::new(nested, Vec::new())])),
                terminator: ListTerm::Sequential,
            }]);
            return Ok(ShellCommand::If {
                cond,
                then_branch,
                else_branch: Some(else_branch),
            });
        }

        let else_branch = if self.eat_reserved("else")? {
            Some(self.compound_list_nonempty()?)
        } else {
            None
        };
        self.expect_reserved("fi")?;
        Ok(ShellCommand::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `do list done`, also accepting a brace group as loop body.
    fn do_group(&mut self) -> Result<List, ParseError> {
        self.skip_newlines();
        if self.eat_reserved("{")? {
            let list = self.compound_list_nonempty()?;
            self.expect_reserved("}")?;
            return Ok(list);
        }
        self.expect_reserved("do")?;
        let list = self.compound_list_nonempty()?;
        self.expect_reserved("done")?;
        Ok(list)
    }

    fn for_command(&mut self) -> Result<ShellCommand, ParseError> {
        self.skip_blanks();
        if self.cur.at_str("((") {
            self.cur.advance();
            self.cur.advance();
            let expr = scan_raw_arith(&mut self.cur)?;
            self.skip_blanks();
            self.cur.eat(';');
            self.skip_newlines();
            let body = self.do_group()?;
            return Ok(ShellCommand::ArithFor { expr, body });
        }

        let name = self.loop_variable()?;
        let words = self.loop_words()?;
        let body = self.do_group()?;
        Ok(ShellCommand::For { name, words, body })
    }

    fn select_command(&mut self) -> Result<ShellCommand, ParseError> {
        let name = self.loop_variable()?;
        let words = self.loop_words()?;
        let body = self.do_group()?;
        Ok(ShellCommand::Select { name, words, body })
    }

    fn loop_variable(&mut self) -> Result<String, ParseError> {
        self.skip_blanks();
        let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
        match word_text(&word) {
            Some(name) if is_valid_name(&name) => Ok(name),
            _ => Err(self.cur.error("expected identifier")),
        }
    }

    /// The word list of a for/select: `;` means an empty list, a plain
    /// `do` means the default `"$@"`, and `in word* (;|newline)` lists the
    /// words explicitly.
    fn loop_words(&mut self) -> Result<Vec<Word>, ParseError> {
        self.skip_blanks();
        if self.cur.current() == Some(';') && !matches!(self.cur.peek(1), Some(';' | '&')) {
            self.cur.advance();
            self.skip_newlines();
            return Ok(Vec::new());
        }
        self.skip_newlines();
        if !self.eat_reserved("in")? {
            return Ok(vec![default_at_word()]);
        }
        let mut words = Vec::new();
        loop {
            self.skip_blanks();
            match self.cur.current() {
                Some(';') => {
                    self.cur.advance();
                    break;
                }
                Some('\n') => {
                    self.cur.advance();
                    self.process_heredocs();
                    break;
                }
                None => break,
                _ => {}
            }
            let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
            if word.is_empty() {
                return Err(self.cur.error("expected word"));
            }
            words.push(word);
        }
        self.skip_newlines();
        Ok(words)
    }

    fn case_command(&mut self) -> Result<ShellCommand, ParseError> {
        self.skip_blanks();
        let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
        if word.is_empty() {
            return Err(self.cur.error("expected word after 'case'"));
        }
        self.skip_newlines();
        self.expect_reserved("in")?;

        let mut clauses = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat_reserved("esac")? {
                break;
            }
            if self.cur.eof() {
                return Err(self.cur.error("expected 'esac'"));
            }

            self.skip_blanks();
            self.cur.eat('(');
            let mut patterns = Vec::new();
            loop {
                self.skip_blanks();
                let pattern = scan_word(&mut self.cur, WORD_DELIMITERS)?;
                if pattern.is_empty() {
                    return Err(self.cur.error("expected case pattern"));
                }
                patterns.push(pattern);
                self.skip_blanks();
                if self.cur.current() == Some('|') && self.cur.peek(1) != Some('|') {
                    self.cur.advance();
                } else {
                    break;
                }
            }
            if !self.cur.eat(')') {
                return Err(self.cur.error("expected ')'"));
            }

            let body = self.compound_list()?;
            self.skip_blanks();
            let term = if self.cur.eat_str(";;&") {
                ClauseTerm::Continue
            } else if self.cur.eat_str(";;") {
                ClauseTerm::Break
            } else if self.cur.eat_str(";&") {
                ClauseTerm::FallThrough
            } else {
                // The last clause may omit its terminator
                clauses.push(CaseClause {
                    patterns,
                    body,
                    term: ClauseTerm::Break,
                });
                self.expect_reserved("esac")?;
                break;
            };
            clauses.push(CaseClause {
                patterns,
                body,
                term,
            });
        }
        Ok(ShellCommand::Case { word, clauses })
    }

    /// Words and operators of `[[ ... ]]`, collected verbatim.
    fn cond_words(&mut self) -> Result<Vec<Word>, ParseError> {
        let mut words = Vec::new();
        loop {
            self.skip_blanks();
            if self.cur.current() == Some('\n') {
                self.cur.advance();
                self.process_heredocs();
                continue;
            }
            if self.cur.eof() {
                return Err(self.cur.error("unexpected EOF while looking for ']]'"));
            }
            let word = scan_word(&mut self.cur, COND_WORD_DELIMITERS)?;
            if !word.is_empty() {
                if word_text(&word).as_deref() == Some("]]") {
                    return Ok(words);
                }
                words.push(word);
                continue;
            }
            let (text, _) = longest_match(&mut self.cur, COND_OPS)
                .map_err(|_| self.cur.error("expected conditional operator"))?;
            words.push(Word::from_string(text));
        }
    }

    fn coproc_command(&mut self) -> Result<ShellCommand, ParseError> {
        self.skip_blanks();
        let state = self.cur.save();
        let mut name = String::from("COPROC");
        if let Some(text) = self.peek_unquoted_word() {
            if is_valid_name(&text) && !RESERVED_WORDS.contains(text.as_str()) {
                self.consume_word()?;
                self.skip_blanks();
                let compound_follows = self.cur.at_str("((")
                    || self.cur.current() == Some('(')
                    || matches!(
                        self.peek_unquoted_word().as_deref(),
                        Some("{" | "if" | "while" | "until" | "for" | "case" | "select" | "[[")
                    );
                if compound_follows {
                    name = text;
                } else {
                    self.cur.restore(state);
                }
            }
        }
        let command = self.command()?;
        Ok(ShellCommand::Coproc {
            name,
            command: Box::new(command),
        })
    }

    /// `function name [()] body` after the keyword.
    fn function_command(&mut self) -> Result<Command, ParseError> {
        self.skip_blanks();
        let word = scan_word(&mut self.cur, WORD_DELIMITERS)?;
        let name = match word_text(&word) {
            Some(name) if !name.is_empty() && !RESERVED_WORDS.contains(name.as_str()) => name,
            _ => return Err(self.cur.error("expected function name")),
        };
        self.skip_blanks();
        if self.cur.eat('(') {
            self.skip_blanks();
            if !self.cur.eat(')') {
                return Err(self.cur.error("expected ')'"));
            }
        }
        self.function_body(name)
    }

    /// `name()` form; backtracks entirely when the parentheses are absent.
    fn try_function_def(&mut self) -> Result<Option<Command>, ParseError> {
        let state = self.cur.save();
        let word = match scan_word(&mut self.cur, WORD_DELIMITERS) {
            Ok(w) => w,
            Err(_) => {
                self.cur.restore(state);
                return Ok(None);
            }
        };
        let name = match word_text(&word) {
            Some(name)
                if !name.is_empty()
                    && !name.contains('=')
                    && !RESERVED_WORDS.contains(name.as_str()) =>
            {
                name
            }
            _ => {
                self.cur.restore(state);
                return Ok(None);
            }
        };
        self.skip_blanks();
        if !self.cur.eat('(') {
            self.cur.restore(state);
            return Ok(None);
        }
        self.skip_blanks();
        if !self.cur.eat(')') {
            self.cur.restore(state);
            return Ok(None);
        }
        self.function_body(name).map(Some)
    }

    fn function_body(&mut self, name: String) -> Result<Command, ParseError> {
        self.skip_newlines();
        let command = self.command()?;
        let body = List(vec![Statement {
            and_or: AndOr::Last(Pipeline::Commands(vec![command])),
            terminator: ListTerm::Sequential,
        }]);
        Ok(Command::new(
            ShellCommand::FunctionDef { name, body },
            Vec::new(),
        ))
    }
}

/// The plain text of a word made only of unquoted characters.
fn word_text(word: &Word) -> Option<String> {
    let mut text = String::new();
    for span in &word.spans {
        match span {
            Span::Char(c) => text.push(*c),
            _ => return None,
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// The default loop word list: `"$@"`.
fn default_at_word() -> Word {
    Word::new(vec![Span::Double(Word::new(vec![Span::Parameter(
        ParamSubst::Bare(Parameter::new("@")),
    )]))])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> List {
        parse("test", input).unwrap_or_else(|e| panic!("parse failed: {}", e))
    }

    fn single_command(list: &List) -> &Command {
        assert_eq!(list.0.len(), 1, "expected one statement");
        match &list.0[0].and_or {
            AndOr::Last(Pipeline::Commands(cmds)) => {
                assert_eq!(cmds.len(), 1);
                &cmds[0]
            }
            other => panic!("Expected plain pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_ok(""), List(vec![]));
        assert_eq!(parse_ok("  \n # comment\n"), List(vec![]));
    }

    #[test]
    fn test_simple_command() {
        let list = parse_ok("echo hello world");
        let cmd = single_command(&list);
        if let ShellCommand::Simple {
            assignments,
            words,
        } = &cmd.inner
        {
            assert!(assignments.is_empty());
            assert_eq!(words.len(), 3);
            assert_eq!(words[0].to_string(), "echo");
        } else {
            panic!("Expected Simple");
        }
    }

    #[test]
    fn test_assignment_prefix() {
        let list = parse_ok("FOO=1 BAR=2 cmd arg");
        let cmd = single_command(&list);
        if let ShellCommand::Simple {
            assignments,
            words,
        } = &cmd.inner
        {
            assert_eq!(assignments.len(), 2);
            assert_eq!(words.len(), 2);
        } else {
            panic!("Expected Simple");
        }
    }

    #[test]
    fn test_assignment_only() {
        let list = parse_ok("FOO=bar");
        let cmd = single_command(&list);
        if let ShellCommand::Simple {
            assignments,
            words,
        } = &cmd.inner
        {
            assert_eq!(assignments.len(), 1);
            assert!(words.is_empty());
        } else {
            panic!("Expected Simple");
        }
    }

    #[test]
    fn test_assignment_after_word_is_word() {
        let list = parse_ok("cmd FOO=1");
        let cmd = single_command(&list);
        if let ShellCommand::Simple { words, .. } = &cmd.inner {
            assert_eq!(words.len(), 2);
            assert_eq!(words[1].to_string(), "FOO=1");
        } else {
            panic!("Expected Simple");
        }
    }

    #[test]
    fn test_assign_builtin() {
        let list = parse_ok("declare -i x=1 y");
        let cmd = single_command(&list);
        if let ShellCommand::AssignBuiltin { name, args } = &cmd.inner {
            assert_eq!(name.to_string(), "declare");
            assert_eq!(args.len(), 3);
            assert!(matches!(args[0], AssignArg::Word(_)));
            assert!(matches!(args[1], AssignArg::Assign(_)));
            assert!(matches!(args[2], AssignArg::Word(_)));
        } else {
            panic!("Expected AssignBuiltin");
        }
    }

    #[test]
    fn test_pipeline() {
        let list = parse_ok("a | b | c");
        match &list.0[0].and_or {
            AndOr::Last(Pipeline::Commands(cmds)) => assert_eq!(cmds.len(), 3),
            other => panic!("Expected pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_pipe_stderr_desugars() {
        let list = parse_ok("a |& b");
        match &list.0[0].and_or {
            AndOr::Last(Pipeline::Commands(cmds)) => {
                assert_eq!(cmds.len(), 2);
                assert_eq!(
                    cmds[0].redirs.last(),
                    Some(&Redir::Redir {
                        desc: Some(IoDesc::Number(2)),
                        op: RedirOp::GreatAnd,
                        target: Word::from_string("1"),
                    })
                );
            }
            other => panic!("Expected pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_and_or_chain() {
        let list = parse_ok("a && b || c");
        match &list.0[0].and_or {
            AndOr::And(_, rest) => match rest.as_ref() {
                AndOr::Or(_, last) => assert!(matches!(last.as_ref(), AndOr::Last(_))),
                other => panic!("Expected Or, got {:?}", other),
            },
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_negate_and_time() {
        let list = parse_ok("time -p ! a | b");
        match &list.0[0].and_or {
            AndOr::Last(Pipeline::Time { posix, pipeline }) => {
                assert!(*posix);
                assert!(matches!(pipeline.as_ref(), Pipeline::Invert(_)));
            }
            other => panic!("Expected Time, got {:?}", other),
        }
    }

    #[test]
    fn test_async_statement() {
        let list = parse_ok("sleep 1 & echo done");
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0].terminator, ListTerm::Asynchronous);
        assert_eq!(list.0[1].terminator, ListTerm::Sequential);
    }

    #[test]
    fn test_if_elif_else() {
        let list = parse_ok("if x; then a; elif y; then b; else c; fi");
        let cmd = single_command(&list);
        if let ShellCommand::If {
            else_branch: Some(else_list),
            ..
        } = &cmd.inner
        {
            let nested = single_command(else_list);
            if let ShellCommand::If {
                else_branch: Some(inner_else),
                ..
            } = &nested.inner
            {
                assert_eq!(inner_else.0.len(), 1);
            } else {
                panic!("Expected nested If with else");
            }
        } else {
            panic!("Expected If with else");
        }
    }

    #[test]
    fn test_while_until() {
        let list = parse_ok("while x; do y; done\nuntil a\ndo b; done");
        assert_eq!(list.0.len(), 2);
    }

    #[test]
    fn test_for_in_words() {
        let list = parse_ok("for i in a b c; do echo $i; done");
        let cmd = single_command(&list);
        if let ShellCommand::For { name, words, .. } = &cmd.inner {
            assert_eq!(name, "i");
            assert_eq!(words.len(), 3);
        } else {
            panic!("Expected For");
        }
    }

    #[test]
    fn test_for_without_list_defaults() {
        let list = parse_ok("for i\ndo echo $i; done");
        let cmd = single_command(&list);
        if let ShellCommand::For { words, .. } = &cmd.inner {
            assert_eq!(words.len(), 1);
            assert_eq!(words[0].to_string(), "\"$@\"");
        } else {
            panic!("Expected For");
        }
    }

    #[test]
    fn test_for_semicolon_is_empty() {
        let list = parse_ok("for i; do :; done");
        let cmd = single_command(&list);
        if let ShellCommand::For { words, .. } = &cmd.inner {
            assert!(words.is_empty());
        } else {
            panic!("Expected For");
        }
    }

    #[test]
    fn test_arith_for() {
        let list = parse_ok("for ((i=0; i<10; i++)); do echo $i; done");
        let cmd = single_command(&list);
        if let ShellCommand::ArithFor { expr, .. } = &cmd.inner {
            assert_eq!(expr, "i=0; i<10; i++");
        } else {
            panic!("Expected ArithFor");
        }
    }

    #[test]
    fn test_case_terminators() {
        let list = parse_ok("case $x in\na) one ;;\nb|c) two ;&\n(d) three ;;&\ne) last\nesac");
        let cmd = single_command(&list);
        if let ShellCommand::Case { clauses, .. } = &cmd.inner {
            assert_eq!(clauses.len(), 4);
            assert_eq!(clauses[0].term, ClauseTerm::Break);
            assert_eq!(clauses[1].term, ClauseTerm::FallThrough);
            assert_eq!(clauses[1].patterns.len(), 2);
            assert_eq!(clauses[2].term, ClauseTerm::Continue);
            assert_eq!(clauses[3].term, ClauseTerm::Break);
        } else {
            panic!("Expected Case");
        }
    }

    #[test]
    fn test_subshell_and_group() {
        let list = parse_ok("(a; b)\n{ c; d; }");
        assert_eq!(list.0.len(), 2);
        let first = &list.0[0];
        match &first.and_or {
            AndOr::Last(Pipeline::Commands(cmds)) => {
                assert!(matches!(cmds[0].inner, ShellCommand::Subshell(_)))
            }
            other => panic!("Expected subshell, got {:?}", other),
        }
    }

    #[test]
    fn test_cond_command() {
        let list = parse_ok("[[ -f $file && ! -d $file ]]");
        let cmd = single_command(&list);
        if let ShellCommand::Cond(words) = &cmd.inner {
            let texts: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            assert_eq!(texts, vec!["-f", "$file", "&&", "!", "-d", "$file"]);
        } else {
            panic!("Expected Cond");
        }
    }

    #[test]
    fn test_arith_command() {
        let list = parse_ok("((x = 1 + 2))");
        let cmd = single_command(&list);
        if let ShellCommand::Arith(expr) = &cmd.inner {
            assert_eq!(expr, "x = 1 + 2");
        } else {
            panic!("Expected Arith");
        }
    }

    #[test]
    fn test_function_def_paren_form() {
        let list = parse_ok("greet() { echo hi; }");
        let cmd = single_command(&list);
        if let ShellCommand::FunctionDef { name, body } = &cmd.inner {
            assert_eq!(name, "greet");
            assert_eq!(body.0.len(), 1);
        } else {
            panic!("Expected FunctionDef");
        }
    }

    #[test]
    fn test_function_def_keyword_form() {
        let list = parse_ok("function greet { echo hi; }");
        let cmd = single_command(&list);
        assert!(matches!(
            cmd.inner,
            ShellCommand::FunctionDef { .. }
        ));
    }

    #[test]
    fn test_coproc_named_and_default() {
        let list = parse_ok("coproc tail -f log");
        let cmd = single_command(&list);
        if let ShellCommand::Coproc { name, .. } = &cmd.inner {
            assert_eq!(name, "COPROC");
        } else {
            panic!("Expected Coproc");
        }

        let list = parse_ok("coproc worker { sort; }");
        let cmd = single_command(&list);
        if let ShellCommand::Coproc { name, command } = &cmd.inner {
            assert_eq!(name, "worker");
            assert!(matches!(command.inner, ShellCommand::Group(_)));
        } else {
            panic!("Expected Coproc");
        }
    }

    #[test]
    fn test_redirections() {
        let list = parse_ok("cmd <in >out 2>&1 >>append {fd}>tracked");
        let cmd = single_command(&list);
        assert_eq!(cmd.redirs.len(), 5);
        assert_eq!(
            cmd.redirs[2],
            Redir::Redir {
                desc: Some(IoDesc::Number(2)),
                op: RedirOp::GreatAnd,
                target: Word::from_string("1"),
            }
        );
        assert_eq!(
            cmd.redirs[4],
            Redir::Redir {
                desc: Some(IoDesc::Var("fd".into())),
                op: RedirOp::Great,
                target: Word::from_string("tracked"),
            }
        );
    }

    #[test]
    fn test_here_string() {
        let list = parse_ok("cat <<<word");
        let cmd = single_command(&list);
        assert_eq!(
            cmd.redirs[0],
            Redir::Redir {
                desc: None,
                op: RedirOp::TLess,
                target: Word::from_string("word"),
            }
        );
    }

    #[test]
    fn test_heredoc_basic() {
        let list = parse_ok("cat <<EOF\nhello\nworld\nEOF\n");
        let cmd = single_command(&list);
        assert_eq!(
            cmd.redirs[0],
            Redir::Heredoc {
                op: HeredocOp::DLess,
                delimiter: "EOF".into(),
                quoted: false,
                body: "hello\nworld\n".into(),
            }
        );
    }

    #[test]
    fn test_heredoc_quoted_tab_strip() {
        let list = parse_ok("cat <<-'END'\n\thello $USER\n\tEND\n");
        let cmd = single_command(&list);
        assert_eq!(
            cmd.redirs[0],
            Redir::Heredoc {
                op: HeredocOp::DLessDash,
                delimiter: "END".into(),
                quoted: true,
                body: "hello $USER\n".into(),
            }
        );
    }

    #[test]
    fn test_two_heredocs_fill_in_order() {
        let list = parse_ok("cat <<A <<B\nfirst\nA\nsecond\nB\n");
        let cmd = single_command(&list);
        if let (Redir::Heredoc { body: b1, .. }, Redir::Heredoc { body: b2, .. }) =
            (&cmd.redirs[0], &cmd.redirs[1])
        {
            assert_eq!(b1, "first\n");
            assert_eq!(b2, "second\n");
        } else {
            panic!("Expected two heredocs");
        }
    }

    #[test]
    fn test_heredoc_after_and_or() {
        let list = parse_ok("cat <<EOF && echo ok\nbody\nEOF\n");
        match &list.0[0].and_or {
            AndOr::And(Pipeline::Commands(cmds), _) => {
                assert_eq!(
                    cmds[0].redirs[0],
                    Redir::Heredoc {
                        op: HeredocOp::DLess,
                        delimiter: "EOF".into(),
                        quoted: false,
                        body: "body\n".into(),
                    }
                );
            }
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_word_as_argument() {
        let list = parse_ok("echo if then fi");
        let cmd = single_command(&list);
        if let ShellCommand::Simple { words, .. } = &cmd.inner {
            assert_eq!(words.len(), 4);
        } else {
            panic!("Expected Simple");
        }
    }

    #[test]
    fn test_errors_carry_position() {
        let err = parse("script.sh", "if true; then echo hi\n").unwrap_err();
        assert_eq!(err.source_name, "script.sh");
        assert!(err.line >= 1);
        assert!(err.message.contains("fi"));

        let err = parse("script.sh", "echo 'unterminated\n").unwrap_err();
        assert!(err.message.contains("EOF"));
    }

    #[test]
    fn test_missing_command_fails() {
        assert!(parse("test", "a && ").is_err());
        assert!(parse("test", "| b").is_err());
        assert!(parse("test", "if ; then a; fi").is_err());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "for i in 1 2; do echo $i | tee -a log; done & wait";
        assert_eq!(parse("t", input).unwrap(), parse("t", input).unwrap());
    }
}
