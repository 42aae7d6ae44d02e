//! Shift/reduce driver: runs the LR(1) tables over a token stream, keeps
//! the three parallel stacks, and feeds every reduction to the code
//! generator. One `TraceStep` is recorded per step for the teaching trace.

use std::collections::BTreeSet;
use std::fmt;

use crate::frontend::lexer::Token;
use crate::ir::codegen::{CodeGenerator, SemItem};
use crate::tables::{Action, ParseTables};

/// One rendered row of the analysis trace.
#[derive(Debug, Clone)]
pub struct TraceStep {
    pub step: usize,
    pub state_stack: String,
    pub symbol_stack: String,
    pub input: String,
    pub action: String,
    pub quads: String,
}

impl TraceStep {
    pub fn header() -> String {
        format!(
            "{:<6}{:<25}{:<20}{:<12}{:<15}{}",
            "步骤", "状态栈", "符号栈", "当前输入", "动作", "生成四元式"
        )
    }

    pub fn to_row(&self) -> String {
        format!(
            "{:<6}{:<25}{:<20}{:<12}{:<15}{}",
            self.step, self.state_stack, self.symbol_stack, self.input, self.action, self.quads
        )
    }
}

/// First (and only) syntax error: where it happened, what was found, what
/// the automaton would have accepted, and pattern hints for the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub col: usize,
    pub unexpected: String,
    pub expected: Vec<String>,
    pub diagnoses: Vec<String>,
    pub unclosed_brace_line: Option<usize>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[语法错误] 第{}行, 第{}列: 遇到意外的符号 '{}'",
            self.line, self.col, self.unexpected
        )?;
        if !self.expected.is_empty() {
            write!(f, "\n期望的符号: ")?;
            for (i, e) in self.expected.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "'{e}'")?;
            }
        }
        if let Some(line) = self.unclosed_brace_line {
            write!(f, "\n提示: 第{line}行的 '{{' 尚未闭合")?;
        }
        for d in &self.diagnoses {
            write!(f, "\n提示: {d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

/// What a parse produced, error or not.
#[derive(Debug)]
pub struct ParseOutcome {
    pub trace: Vec<TraceStep>,
    pub error: Option<SyntaxError>,
    pub accepted: bool,
    /// The state stack as the driver left it; exactly two entries after a
    /// successful parse.
    pub final_states: Vec<usize>,
}

pub fn parse(tables: &ParseTables, tokens: &[Token], gen: &mut CodeGenerator) -> ParseOutcome {
    let mut state_stack: Vec<usize> = vec![0];
    let mut symbol_stack: Vec<String> = vec!["#".to_string()];
    let mut sem_stack: Vec<SemItem> = Vec::new();
    // Lines of still-open `{`, for the unterminated-block diagnosis.
    let mut open_braces: Vec<usize> = Vec::new();
    let mut trace: Vec<TraceStep> = Vec::new();
    let mut ptr = 0;
    let mut step = 1;

    loop {
        let Some(token) = tokens.get(ptr) else {
            break;
        };
        let state = state_stack.last().copied().unwrap_or_default();
        let a = token.terminal().to_string();
        let state_str = render_state_stack(&state_stack);
        let symbol_str = render_symbol_stack(&symbol_stack);

        match tables.action(state, &a) {
            None => {
                let expected = tables.expected_terminals(state);
                let error = build_syntax_error(token, &a, &expected, &open_braces);
                trace.push(TraceStep {
                    step,
                    state_stack: state_str,
                    symbol_stack: symbol_str,
                    input: a,
                    action: "错误: 语法不匹配".to_string(),
                    quads: String::new(),
                });
                return ParseOutcome {
                    trace,
                    error: Some(error),
                    accepted: false,
                    final_states: state_stack,
                };
            }
            Some(Action::Shift(next)) => {
                // The code generator needs to see the loop open before any
                // of its condition code is emitted.
                if a == "while" {
                    gen.enter_loop();
                }
                if a == "{" {
                    open_braces.push(token.line);
                } else if a == "}" {
                    open_braces.pop();
                }
                trace.push(TraceStep {
                    step,
                    state_stack: state_str,
                    symbol_stack: symbol_str,
                    input: a.clone(),
                    action: format!("移进 S{next}"),
                    quads: String::new(),
                });
                step += 1;
                state_stack.push(next);
                symbol_stack.push(a);
                sem_stack.push(SemItem::new(token.lexeme.clone()));
                ptr += 1;
            }
            Some(Action::Reduce(prod)) => {
                let p = tables.grammar.production(prod);
                let mut popped = Vec::with_capacity(p.right.len());
                for _ in 0..p.right.len() {
                    state_stack.pop();
                    symbol_stack.pop();
                    if let Some(item) = sem_stack.pop() {
                        popped.push(item);
                    }
                }
                popped.reverse();
                let result = gen.handle_production(prod, &popped, &sem_stack);
                let quads = gen.take_step_quads();
                trace.push(TraceStep {
                    step,
                    state_stack: state_str,
                    symbol_stack: symbol_str,
                    input: a.clone(),
                    action: format!("归约 r{prod}"),
                    quads,
                });
                step += 1;
                let top = state_stack.last().copied().unwrap_or_default();
                let Some(next) = tables.goto_state(top, p.left) else {
                    // Unreachable with a well-formed table; surface it
                    // instead of panicking.
                    let error = SyntaxError {
                        line: token.line,
                        col: token.col,
                        unexpected: a,
                        expected: Vec::new(),
                        diagnoses: vec!["内部错误: GOTO 表缺少转移".to_string()],
                        unclosed_brace_line: None,
                    };
                    return ParseOutcome {
                        trace,
                        error: Some(error),
                        accepted: false,
                        final_states: state_stack,
                    };
                };
                symbol_stack.push(p.left.to_string());
                state_stack.push(next);
                sem_stack.push(result);
            }
            Some(Action::Accept) => {
                trace.push(TraceStep {
                    step,
                    state_stack: state_str,
                    symbol_stack: symbol_str,
                    input: a,
                    action: "ACCEPT".to_string(),
                    quads: String::new(),
                });
                return ParseOutcome {
                    trace,
                    error: None,
                    accepted: true,
                    final_states: state_stack,
                };
            }
        }
    }

    // Only reachable with an empty token slice (no sentinel).
    ParseOutcome {
        trace,
        error: None,
        accepted: false,
        final_states: state_stack,
    }
}

fn render_state_stack(stack: &[usize]) -> String {
    let joined = stack
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    truncate_left(joined, 23, 20)
}

fn render_symbol_stack(stack: &[String]) -> String {
    truncate_left(stack.join(" "), 18, 15)
}

/// Keep the rightmost `keep` characters once a rendering exceeds `limit`;
/// the interesting end of a parse stack is its top.
fn truncate_left(s: String, limit: usize, keep: usize) -> String {
    let len = s.chars().count();
    if len <= limit {
        return s;
    }
    let tail: String = s.chars().skip(len - keep).collect();
    format!("...{tail}")
}

fn build_syntax_error(
    token: &Token,
    terminal: &str,
    expected: &BTreeSet<&'static str>,
    open_braces: &[usize],
) -> SyntaxError {
    let unclosed_brace_line = if terminal == "#" && expected.contains("}") {
        open_braces.first().copied()
    } else {
        None
    };
    SyntaxError {
        line: token.line,
        col: token.col,
        unexpected: terminal.to_string(),
        expected: expected.iter().map(|s| s.to_string()).collect(),
        diagnoses: diagnose(terminal, expected),
        unclosed_brace_line,
    }
}

const STATEMENT_STARTERS: &[&str] = &[
    "i", "n", "int", "float", "while", "break", "continue", "++", "--", "!", "(",
];

const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "&&", "||", "==", "!=", ">", "<", ">=", "<=", "=",
];

/// Hints for the common beginner mistakes; purely advisory.
fn diagnose(terminal: &str, expected: &BTreeSet<&'static str>) -> Vec<String> {
    let mut hints = Vec::new();
    if expected.contains(";") && STATEMENT_STARTERS.contains(&terminal) {
        hints.push("上一条语句之后可能缺少分号 ';'".to_string());
    }
    if terminal == ")" && !expected.contains(")") {
        hints.push("存在多余的 ')' 或缺少与之匹配的 '('".to_string());
    }
    if terminal == "}" && !expected.contains("}") {
        hints.push("存在多余的 '}' 或缺少与之匹配的 '{'".to_string());
    }
    if BINARY_OPERATORS.contains(&terminal)
        && (expected.contains("i") || expected.contains("n"))
    {
        hints.push("运算符出现在操作数的位置，可能缺少操作数".to_string());
    }
    if terminal == "i" && !expected.contains("i") {
        hints.push("此处期望关键字或运算符，而不是标识符".to_string());
    }
    if terminal == "#" && !expected.contains("}") {
        hints.push("输入提前结束，表达式或语句不完整".to_string());
    }
    hints
}
