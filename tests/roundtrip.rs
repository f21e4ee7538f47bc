//! Integration tests: parse → print → reparse stability, and end-to-end
//! checks of the grammar and the word expansion engine.

use bash_ast::{
    brace_expand, parse, split_word, unquote, AltOp, AndOr, CaseDirection, Command, HeredocOp,
    IoDesc, List, ParamSubst, Parameter, Pipeline, Redir, RedirOp, ShellCommand, Span, Word,
};

/// Parse, print, and reparse; the ASTs must be equal.
fn assert_roundtrip(input: &str) {
    let first = parse("test.sh", input)
        .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", input, e));
    let printed = first.to_string();
    let second = parse("test.sh", &printed)
        .unwrap_or_else(|e| panic!("reparse failed for {:?}: {}", printed, e));
    assert_eq!(first, second, "round-trip changed the AST for {:?}", input);
}

fn first_command(list: &List) -> &Command {
    match &list.0[0].and_or {
        AndOr::Last(Pipeline::Commands(cmds)) => &cmds[0],
        other => panic!("Expected plain pipeline, got {:?}", other),
    }
}

fn simple_words(list: &List) -> &[Word] {
    match &first_command(list).inner {
        ShellCommand::Simple { words, .. } => words,
        other => panic!("Expected Simple, got {:?}", other),
    }
}

// ===========================================================================
// ROUND-TRIP STABILITY
// ===========================================================================

#[test]
fn roundtrip_simple_commands() {
    assert_roundtrip("echo hello world");
    assert_roundtrip("FOO=1 BAR='two words' cmd arg1 arg2");
    assert_roundtrip("arr[3]=x arr2+=(a [2]=b c) cmd");
    assert_roundtrip("echo \"double $var ${braced} $(sub) `tick`\" 'single' $'ansi\\n'");
    assert_roundtrip("echo a\\ b");
}

#[test]
fn roundtrip_operators() {
    assert_roundtrip("a && b || c");
    assert_roundtrip("a | b |& c");
    assert_roundtrip("! a | b");
    assert_roundtrip("time -p sleep 1");
    assert_roundtrip("background task &");
    assert_roundtrip("one; two; three");
}

#[test]
fn roundtrip_redirections() {
    assert_roundtrip("cmd <in >out 2>&1 >>log <>rw >|clob &>all &>>app 3<&0 {fd}>x");
    assert_roundtrip("cat <<<here-string");
    assert_roundtrip("diff <(sort a) >(tee log)");
}

#[test]
fn roundtrip_compounds() {
    assert_roundtrip("if a; then b; fi");
    assert_roundtrip("if a; then b; elif c; then d; else e; fi");
    assert_roundtrip("while read line; do echo \"$line\"; done <input");
    assert_roundtrip("until flag; do poll; done");
    assert_roundtrip("for i in 1 2 3; do echo $i; done");
    assert_roundtrip("for i; do echo $i; done");
    assert_roundtrip("for i\ndo echo $i; done");
    assert_roundtrip("for ((i=0; i<10; i++)); do echo $i; done");
    assert_roundtrip("select opt in a b; do echo $opt; done");
    assert_roundtrip("case $x in a) one ;; b|c) two ;& d) three ;;& e) last; esac");
    assert_roundtrip("(sub shell; two)");
    assert_roundtrip("{ group; cmds; }");
    assert_roundtrip("[[ -n $x && $x == a* ]]");
    assert_roundtrip("((x += 1))");
    assert_roundtrip("coproc tail -f log");
    assert_roundtrip("coproc worker { sort; }");
    assert_roundtrip("greet() { echo hi; }");
    assert_roundtrip("function greet { echo hi; }");
    assert_roundtrip("f() (sub shell)");
    assert_roundtrip("declare -A map[k]=v other");
}

#[test]
fn roundtrip_heredocs_exact() {
    let input = "cat <<EOF\nhello\nworld\nEOF\n";
    let list = parse("t", input).unwrap();
    assert_eq!(list.to_string(), input);

    assert_roundtrip("cat <<-'END'\n\tindented\n\tEND\n");
    assert_roundtrip("cat <<A <<B\none\nA\ntwo\nB\n");
    assert_roundtrip("cat <<EOF && echo ok\nbody\nEOF\n");
}

#[test]
fn roundtrip_nested_substitutions() {
    assert_roundtrip("echo $(echo \"$(date)\") $((1 + (2 * 3)))");
    assert_roundtrip("echo ${v:-${w:=x}}");
    assert_roundtrip("echo `echo \\`date\\``");
}

#[test]
fn roundtrip_larger_script() {
    let script = r#"
set -e
count=0
for f in *.log; do
  if [[ -s $f ]]; then
    grep -v '^#' "$f" | sort -u >>merged.txt 2>/dev/null
    count=$((count + 1))
  fi
done
case $count in
  0) echo "nothing" ;;
  *) echo "$count files" ;;
esac
cleanup() { rm -f merged.txt; }
"#;
    assert_roundtrip(script);
}

// ===========================================================================
// BRACE, HEREDOC, AND PARAMETER DISPATCH
// ===========================================================================

#[test]
fn brace_sequences_pad_and_step() {
    let expand = |s: &str| -> Vec<String> {
        brace_expand(&Word::from_string(s))
            .iter()
            .map(|w| w.to_string())
            .collect()
    };
    assert_eq!(expand("{01..03}"), vec!["01", "02", "03"]);
    assert_eq!(expand("{-01..01}"), vec!["-01", "00", "01"]);
    assert_eq!(expand("{1..5..2}"), vec!["1", "3", "5"]);
    assert_eq!(
        expand("a{1,2}b{A..C}"),
        vec!["a1bA", "a1bB", "a1bC", "a2bA", "a2bB", "a2bC"]
    );
}

#[test]
fn heredoc_tab_strip_with_quoted_delimiter() {
    let list = parse("t", "cat <<-'END'\n\thello $USER\n\tEND\n").unwrap();
    let cmd = first_command(&list);
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
fn pipe_stderr_adds_stderr_redirection() {
    let list = parse("t", "a |& b").unwrap();
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
fn elif_desugars_to_nested_if() {
    let list = parse("t", "if x; then a; elif y; then b; else c; fi").unwrap();
    let ShellCommand::If {
        else_branch: Some(else_list),
        ..
    } = &first_command(&list).inner
    else {
        panic!("Expected If with else branch");
    };
    assert_eq!(else_list.0.len(), 1);
    let ShellCommand::If {
        else_branch: Some(inner_else),
        ..
    } = &first_command(else_list).inner
    else {
        panic!("Expected nested If for elif");
    };
    assert_eq!(inner_else.0.len(), 1);
}

#[test]
fn parameter_expansion_dispatch() {
    let list = parse(
        "t",
        "echo ${!arr[@]} ${var:-default} ${var/foo/bar} ${var^^[aeiou]}",
    )
    .unwrap();
    let words = simple_words(&list);

    assert_eq!(
        words[1].spans,
        vec![Span::Parameter(ParamSubst::Indices(
            Parameter::with_subscript("arr", Word::from_string("@"))
        ))]
    );
    assert_eq!(
        words[2].spans,
        vec![Span::Parameter(ParamSubst::Alt {
            indirect: false,
            parameter: Parameter::new("var"),
            check_null: true,
            op: AltOp::Default,
            word: Word::from_string("default"),
        })]
    );
    assert_eq!(
        words[3].spans,
        vec![Span::Parameter(ParamSubst::Replace {
            indirect: false,
            parameter: Parameter::new("var"),
            all: false,
            anchor: None,
            pattern: Word::from_string("foo"),
            replacement: Word::from_string("bar"),
        })]
    );
    assert_eq!(
        words[4].spans,
        vec![Span::Parameter(ParamSubst::LetterCase {
            indirect: false,
            parameter: Parameter::new("var"),
            direction: CaseDirection::Upper,
            all: true,
            pattern: Word::from_string("[aeiou]"),
        })]
    );
}

// ===========================================================================
// EXPANSION AND PARSE INVARIANTS
// ===========================================================================

#[test]
fn brace_expand_never_empty() {
    for input in ["", "plain", "{a,b}", "{bad", "x{1..3}y", "{}"] {
        let out = brace_expand(&Word::from_string(input));
        assert!(!out.is_empty(), "empty expansion for {:?}", input);
    }
    let w = Word::from_string("no-braces");
    assert_eq!(brace_expand(&w), vec![w.clone()]);
}

#[test]
fn split_word_drops_empty_fields_and_rejoins() {
    let w = Word::from_string("  a  bb  ccc  ");
    let fields = split_word(" ", &w);
    assert!(fields.iter().all(|f| !f.is_empty()));

    // Rejoining with a delimiter splits back to the same fields
    let mut spans = Vec::new();
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            spans.push(Span::Char(' '));
        }
        spans.extend(f.spans.iter().cloned());
    }
    assert_eq!(split_word(" ", &Word::new(spans)), fields);
}

#[test]
fn unquote_of_plain_word_is_identity() {
    for s in ["", "plain", "with spaces", "a{b}c$d", "tabs\tand\nnewlines"] {
        assert_eq!(unquote(&Word::from_string(s)), s);
    }
}

#[test]
fn parsed_pipelines_and_simple_commands_nonempty() {
    let script = "a | b && c; FOO=1; d &";
    let list = parse("t", script).unwrap();
    fn check_and_or(and_or: &AndOr) {
        match and_or {
            AndOr::Last(p) => check_pipeline(p),
            AndOr::And(p, rest) | AndOr::Or(p, rest) => {
                check_pipeline(p);
                check_and_or(rest);
            }
        }
    }
    fn check_pipeline(p: &Pipeline) {
        match p {
            Pipeline::Commands(cmds) => {
                assert!(!cmds.is_empty());
                for cmd in cmds {
                    if let ShellCommand::Simple {
                        assignments,
                        words,
                    } = &cmd.inner
                    {
                        assert!(!assignments.is_empty() || !words.is_empty());
                    }
                }
            }
            Pipeline::Invert(p) => check_pipeline(p),
            Pipeline::Time { pipeline, .. } => check_pipeline(pipeline),
        }
    }
    for stmt in &list.0 {
        check_and_or(&stmt.and_or);
    }
}

#[test]
fn heredoc_body_reconstructs_source() {
    let body_lines = "alpha\nbeta\n";
    let input = format!("cat <<EOF\n{}EOF\n", body_lines);
    let list = parse("t", &input).unwrap();
    let Redir::Heredoc { body, .. } = &first_command(&list).redirs[0] else {
        panic!("Expected heredoc");
    };
    assert_eq!(format!("{}EOF\n", body), format!("{}EOF\n", body_lines));
}

#[test]
fn parse_is_deterministic() {
    let input = "case $1 in -h|--help) usage; exit 0 ;; *) main \"$@\" ;; esac";
    assert_eq!(parse("t", input).unwrap(), parse("t", input).unwrap());
}

// ===========================================================================
// ERRORS
// ===========================================================================

#[test]
fn error_positions_point_at_failure() {
    let err = parse("demo.sh", "echo ok\nif true; then\n").unwrap_err();
    assert_eq!(err.source_name, "demo.sh");
    assert!(err.line >= 2, "line was {}", err.line);

    let err = parse("demo.sh", "echo $((1 + 2").unwrap_err();
    assert!(err.message.contains("EOF"));
}

#[test]
fn error_no_recovery() {
    assert!(parse("t", "while ; do x; done").is_err());
    assert!(parse("t", "case x in a) b ;;").is_err());
    assert!(parse("t", "a &&").is_err());
    assert!(parse("t", ") stray").is_err());
}

#[test]
fn bad_subst_is_not_an_error() {
    let list = parse("t", "echo ${var@Q}").unwrap();
    let words = simple_words(&list);
    assert_eq!(
        words[1].spans,
        vec![Span::Parameter(ParamSubst::BadSubst("var@Q".into()))]
    );
}
