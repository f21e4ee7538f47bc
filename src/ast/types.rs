//! Abstract Syntax Tree Types for Bash
//!
//! This module defines the AST produced by the parser: words built from
//! lexical spans, parameter substitutions, and the command grammar from
//! simple commands up to coprocesses. Nodes are plain values; the parser
//! builds them and nothing mutates them afterwards.

use std::fmt;

// =============================================================================
// WORDS
// =============================================================================

/// A word is an ordered sequence of lexical spans forming one shell token.
///
/// Words are unexpanded: quoting and substitution structure is preserved so
/// that every word can be printed back exactly as written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Word {
    pub spans: Vec<Span>,
}

impl Word {
    pub fn new(spans: Vec<Span>) -> Self {
        Word { spans }
    }

    /// Build a word of plain unquoted characters.
    pub fn from_string(s: &str) -> Self {
        Word {
            spans: s.chars().map(Span::Char).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// One lexical fragment of a word.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    /// A single unquoted character
    Char(char),
    /// A backslash-escaped character: \x
    Escape(char),
    /// Single-quoted literal: 'text'
    Single(String),
    /// Double-quoted word: "text with $expansions"
    Double(Word),
    /// ANSI-C quoted word: $'text' (escapes preserved, decoded by consumers)
    AnsiC(Word),
    /// Locale-translated word: $"text"
    Locale(Word),
    /// Backquote command substitution: `cmd`
    Backquote(Word),
    /// Parameter expansion: $name or ${...}
    Parameter(ParamSubst),
    /// Arithmetic substitution with raw inner text: $((expr))
    ArithSubst(String),
    /// Command substitution with raw inner text: $(cmd)
    CommandSubst(String),
    /// Process substitution with raw inner text: <(cmd) or >(cmd)
    ProcessSubst(ProcessDirection, String),
}

/// Direction of a process substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessDirection {
    /// <(...)
    Input,
    /// >(...)
    Output,
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// A parameter name with an optional array subscript.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub subscript: Option<Word>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            subscript: None,
        }
    }

    pub fn with_subscript(name: impl Into<String>, subscript: Word) -> Self {
        Parameter {
            name: name.into(),
            subscript: Some(subscript),
        }
    }
}

/// A parameter substitution: every `$name` / `${...}` form.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSubst {
    /// Unclassifiable ${...} content, kept raw; diagnosed at expansion time
    BadSubst(String),
    /// $name
    Bare(Parameter),
    /// ${name} or ${!name}
    Brace {
        indirect: bool,
        parameter: Parameter,
    },
    /// ${name:-word}, ${name:=word}, ${name:?word}, ${name:+word} and the
    /// colon-less variants
    Alt {
        indirect: bool,
        parameter: Parameter,
        check_null: bool,
        op: AltOp,
        word: Word,
    },
    /// ${name:offset} or ${name:offset:length}; an empty length means the
    /// length was not given
    Substring {
        indirect: bool,
        parameter: Parameter,
        offset: Word,
        length: Word,
    },
    /// ${!prefix@} or ${!prefix*}
    Prefix {
        prefix: String,
        modifier: PrefixModifier,
    },
    /// ${!name[@]} or ${!name[*]}
    Indices(Parameter),
    /// ${#name}
    Length(Parameter),
    /// ${name#pat}, ${name##pat}, ${name%pat}, ${name%%pat}
    Delete {
        indirect: bool,
        parameter: Parameter,
        shortest: bool,
        side: PatternSide,
        pattern: Word,
    },
    /// ${name/pat/repl}, ${name//pat/repl}, ${name/#pat/repl}, ${name/%pat/repl}
    Replace {
        indirect: bool,
        parameter: Parameter,
        all: bool,
        anchor: Option<PatternSide>,
        pattern: Word,
        replacement: Word,
    },
    /// ${name^pat}, ${name^^pat}, ${name,pat}, ${name,,pat}
    LetterCase {
        indirect: bool,
        parameter: Parameter,
        direction: CaseDirection,
        all: bool,
        pattern: Word,
    },
}

/// Operator of an alternation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltOp {
    /// `-`: use word if unset
    Default,
    /// `=`: assign word if unset
    Assign,
    /// `?`: error if unset
    Error,
    /// `+`: use word if set
    Use,
}

impl fmt::Display for AltOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "-"),
            Self::Assign => write!(f, "="),
            Self::Error => write!(f, "?"),
            Self::Use => write!(f, "+"),
        }
    }
}

/// Which end of the value a pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSide {
    Front,
    Back,
}

/// ${!prefix@} vs ${!prefix*}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixModifier {
    At,
    Star,
}

impl fmt::Display for PrefixModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At => write!(f, "@"),
            Self::Star => write!(f, "*"),
        }
    }
}

/// Case-modification direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDirection {
    Upper,
    Lower,
}

// =============================================================================
// LISTS, STATEMENTS, PIPELINES
// =============================================================================

/// A complete script or compound body: a sequence of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List(pub Vec<Statement>);

/// One and-or chain plus the terminator that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub and_or: AndOr,
    pub terminator: ListTerm,
}

/// Statement terminator: `;`/newline or `&`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTerm {
    Sequential,
    Asynchronous,
}

/// A chain of pipelines joined by `&&` / `||`.
#[derive(Debug, Clone, PartialEq)]
pub enum AndOr {
    Last(Pipeline),
    And(Pipeline, Box<AndOr>),
    Or(Pipeline, Box<AndOr>),
}

/// A pipeline, possibly negated with `!` or timed with `time`.
#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
    Commands(Vec<Command>),
    Invert(Box<Pipeline>),
    Time {
        posix: bool,
        pipeline: Box<Pipeline>,
    },
}

// =============================================================================
// COMMANDS
// =============================================================================

/// A shell command together with its redirections.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub inner: ShellCommand,
    pub redirs: Vec<Redir>,
}

impl Command {
    pub fn new(inner: ShellCommand, redirs: Vec<Redir>) -> Self {
        Command { inner, redirs }
    }
}

/// Union of all command forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Assignments followed by words; at least one of the two is present
    Simple {
        assignments: Vec<Assign>,
        words: Vec<Word>,
    },
    /// declare/typeset/export/readonly/local with assignment-or-word args
    AssignBuiltin { name: Word, args: Vec<AssignArg> },
    /// if list; then list; [else list;] fi — elif chains are nested Ifs in
    /// the else branch
    If {
        cond: List,
        then_branch: List,
        else_branch: Option<List>,
    },
    /// case word in clauses esac
    Case { word: Word, clauses: Vec<CaseClause> },
    /// for name [in words]; do list; done
    For {
        name: String,
        words: Vec<Word>,
        body: List,
    },
    /// for ((expr)); do list; done — the parenthesized text is kept raw
    ArithFor { expr: String, body: List },
    /// while list; do list; done
    While { cond: List, body: List },
    /// until list; do list; done
    Until { cond: List, body: List },
    /// select name [in words]; do list; done
    Select {
        name: String,
        words: Vec<Word>,
        body: List,
    },
    /// ( list )
    Subshell(List),
    /// { list; }
    Group(List),
    /// [[ ... ]] — the raw sequence of words and conditional operators
    Cond(Vec<Word>),
    /// (( expr )) — the inner text is kept raw
    Arith(String),
    /// coproc [name] command
    Coproc { name: String, command: Box<Command> },
    /// name() body or function name body; the list holds the single
    /// statement that is the function body
    FunctionDef { name: String, body: List },
}

/// An argument to an assignment builtin: either an assignment or a word,
/// in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignArg {
    Assign(Assign),
    Word(Word),
}

/// One clause of a case statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub patterns: Vec<Word>,
    pub body: List,
    pub term: ClauseTerm,
}

/// Case clause terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseTerm {
    /// ;;
    Break,
    /// ;& — run the next clause body unconditionally
    FallThrough,
    /// ;;& — keep testing the following patterns
    Continue,
}

impl fmt::Display for ClauseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Break => write!(f, ";;"),
            Self::FallThrough => write!(f, ";&"),
            Self::Continue => write!(f, ";;&"),
        }
    }
}

// =============================================================================
// ASSIGNMENTS
// =============================================================================

/// Variable assignment: name=value, name+=value, name[sub]=value, or an
/// array literal assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub lhs: Parameter,
    pub op: AssignOp,
    pub rvalue: RValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// =
    Equals,
    /// +=
    PlusEquals,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "="),
            Self::PlusEquals => write!(f, "+="),
        }
    }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Word(Word),
    Array(Vec<ArrayElement>),
}

/// One element of an array literal: `[sub]=value` or a bare word.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayElement {
    pub subscript: Option<Word>,
    pub value: Word,
}

// =============================================================================
// REDIRECTIONS
// =============================================================================

/// An I/O redirection.
#[derive(Debug, Clone, PartialEq)]
pub enum Redir {
    /// A normal redirection with an optional descriptor on the left
    Redir {
        desc: Option<IoDesc>,
        op: RedirOp,
        target: Word,
    },
    /// A here-document; the body is captured after the logical line ends
    Heredoc {
        op: HeredocOp,
        delimiter: String,
        /// True when the delimiter word was quoted in any way
        quoted: bool,
        body: String,
    },
}

/// The descriptor part before a redirection operator: a number or {varname}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoDesc {
    Number(u32),
    Var(String),
}

impl fmt::Display for IoDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Var(name) => write!(f, "{{{}}}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirOp {
    Less,      // <
    Great,     // >
    DGreat,    // >>
    Clobber,   // >|
    LessGreat, // <>
    AndGreat,  // &>
    AndDGreat, // &>>
    LessAnd,   // <&
    GreatAnd,  // >&
    TLess,     // <<<
}

impl fmt::Display for RedirOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Less => write!(f, "<"),
            Self::Great => write!(f, ">"),
            Self::DGreat => write!(f, ">>"),
            Self::Clobber => write!(f, ">|"),
            Self::LessGreat => write!(f, "<>"),
            Self::AndGreat => write!(f, "&>"),
            Self::AndDGreat => write!(f, "&>>"),
            Self::LessAnd => write!(f, "<&"),
            Self::GreatAnd => write!(f, ">&"),
            Self::TLess => write!(f, "<<<"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeredocOp {
    /// <<
    DLess,
    /// <<- (strip leading tabs from body lines)
    DLessDash,
}

impl fmt::Display for HeredocOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DLess => write!(f, "<<"),
            Self::DLessDash => write!(f, "<<-"),
        }
    }
}

impl HeredocOp {
    /// Whether body lines have leading tabs stripped.
    pub fn strips_tabs(&self) -> bool {
        matches!(self, Self::DLessDash)
    }
}
