use std::sync::OnceLock;

use wl_compiler::frontend::lexer::LexErrorKind;
use wl_compiler::{Compiler, CompileResult};

fn compiler() -> &'static Compiler {
    static COMPILER: OnceLock<Compiler> = OnceLock::new();
    COMPILER.get_or_init(Compiler::new)
}

fn run(source: &str) -> CompileResult {
    compiler().run(source)
}

fn assert_lex_error(result: &CompileResult, kind: LexErrorKind) {
    assert!(
        result.lex_errors.iter().any(|e| e.kind == kind),
        "expected {kind:?}, got {:?}",
        result.lex_errors
    );
}

// ── Lexical errors ───────────────────────────────────────────────────────

#[test]
fn unterminated_block_comment_reports_the_opening() {
    let result = run("/* oops");
    assert_eq!(result.lex_errors.len(), 1);
    let err = &result.lex_errors[0];
    assert_eq!(err.kind, LexErrorKind::UnterminatedBlockComment);
    assert_eq!((err.line, err.col), (1, 1));
}

#[test]
fn multiple_decimal_points_point_at_the_second_dot() {
    let result = run("x = 1.2.3 ;");
    assert_lex_error(&result, LexErrorKind::MultipleDecimalPoints);
    let err = &result.lex_errors[0];
    assert_eq!((err.line, err.col), (1, 8));
    // The malformed lexeme still shows up in the token stream.
    assert!(result.tokens.iter().any(|t| t.lexeme == "1.2.3"));
}

#[test]
fn trailing_decimal_point_points_at_the_dot() {
    let result = run("a = 5. ;");
    assert_lex_error(&result, LexErrorKind::TrailingDecimalPoint);
    let err = &result.lex_errors[0];
    assert_eq!((err.line, err.col), (1, 6));
}

#[test]
fn lone_ampersand_is_reported_but_still_emitted() {
    let result = run("a = b & c ;");
    assert_lex_error(&result, LexErrorKind::LoneAmpersand);
    let stray = result
        .tokens
        .iter()
        .find(|t| t.lexeme == "&")
        .expect("stray '&' should stay in the stream");
    assert_eq!(stray.label, "符号");
    assert_eq!(stray.col, 7);
}

#[test]
fn lone_pipe_is_reported_but_still_emitted() {
    let result = run("a = b | c ;");
    assert_lex_error(&result, LexErrorKind::LonePipe);
    assert!(result.tokens.iter().any(|t| t.lexeme == "|"));
}

#[test]
fn unexpected_character_is_recorded_with_the_char() {
    let result = run("a = 1 @ ;");
    assert_lex_error(&result, LexErrorKind::IllegalChar);
    let err = &result.lex_errors[0];
    assert_eq!(err.found, Some('@'));
}

#[test]
fn lexical_errors_skip_parsing_entirely() {
    let result = run("/* oops");
    assert!(result.trace.is_empty(), "parse must not start");
    assert!(result.tac.is_empty());
    assert!(!result.accepted);
    assert!(result.has_errors());
}

#[test]
fn error_messages_carry_position_and_reason() {
    let result = run("a = b & c ;");
    let text = result.lex_errors[0].to_string();
    assert!(text.contains("[词法错误]"), "got: {text}");
    assert!(text.contains("第1行"));
    assert!(text.contains("'&'"));
}

// ── Syntax errors ────────────────────────────────────────────────────────

#[test]
fn missing_semicolon_is_diagnosed() {
    let result = run("int a = 1 int b = 2;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!((err.line, err.col), (1, 11), "error sits on the second 'int'");
    assert_eq!(err.unexpected, "int");
    assert!(err.expected.iter().any(|e| e == ";"), "';' must be expected");
    assert!(
        err.diagnoses.iter().any(|d| d.contains("分号")),
        "missing-semicolon hint absent: {:?}",
        err.diagnoses
    );
    assert!(result.tac.is_empty(), "nothing was reduced before the error");
    assert!(!result.accepted);
}

#[test]
fn eof_with_open_brace_names_its_line() {
    let result = run("while(true){break;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unexpected, "#");
    assert!(err.expected.iter().any(|e| e == "}"));
    assert_eq!(err.unclosed_brace_line, Some(1));
}

#[test]
fn earliest_open_brace_wins_across_lines() {
    let result = run("int a = 1 ;\nwhile ( a < 3 ) {\na = a + 1 ;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unclosed_brace_line, Some(2));
}

#[test]
fn surplus_closing_paren_is_diagnosed() {
    let result = run("a = ( 1 + 2 ) ) ;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unexpected, ")");
    assert!(
        err.diagnoses.iter().any(|d| d.contains("')'")),
        "paren hint absent: {:?}",
        err.diagnoses
    );
}

#[test]
fn operator_in_operand_position_is_diagnosed() {
    let result = run("a = * 2 ;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unexpected, "*");
    assert!(err.expected.iter().any(|e| e == "i" || e == "n"));
    assert!(
        err.diagnoses.iter().any(|d| d.contains("操作数")),
        "operand hint absent: {:?}",
        err.diagnoses
    );
}

#[test]
fn identifier_where_structure_was_expected() {
    let result = run("a b ;");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unexpected, "i");
    assert!(
        err.diagnoses.iter().any(|d| d.contains("标识符")),
        "identifier hint absent: {:?}",
        err.diagnoses
    );
}

#[test]
fn empty_input_ends_early() {
    let result = run("");
    let err = result.syntax_error.as_ref().expect("syntax error");
    assert_eq!(err.unexpected, "#");
    assert!(
        err.diagnoses.iter().any(|d| d.contains("提前结束")),
        "early-end hint absent: {:?}",
        err.diagnoses
    );
}

#[test]
fn parsing_stops_at_the_first_error() {
    let result = run("int a = 1 int b = 2 int c = 3;");
    assert!(result.syntax_error.is_some());
    let last = result.trace.last().expect("error row");
    assert_eq!(last.action, "错误: 语法不匹配");
    // Only one error row; the driver never resumed.
    assert_eq!(
        result.trace.iter().filter(|s| s.action.starts_with("错误")).count(),
        1
    );
}

#[test]
fn syntax_error_message_interleaves_into_the_trace() {
    let result = run("int a = 1 int b = 2;");
    let lines = result.trace_lines();
    let msg_idx = lines
        .iter()
        .position(|l| l.contains("[语法错误]"))
        .expect("message in trace");
    assert!(msg_idx + 1 < lines.len(), "error row follows the message");
    assert!(lines[msg_idx + 1].contains("错误: 语法不匹配"));
    assert!(lines[msg_idx].contains("期望的符号"));
}
