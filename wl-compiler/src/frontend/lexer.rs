//! Position-tracked tokenization of while-language source text. Errors are
//! accumulated, not thrown: a malformed number or a stray `&` still yields
//! a token so the scan can continue, and the caller decides whether to
//! parse.

use logos::{FilterResult, Logos};
use std::fmt;

/// What went wrong at one source position.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    #[default]
    IllegalChar,
    LoneAmpersand,
    LonePipe,
    UnterminatedBlockComment,
    MultipleDecimalPoints,
    TrailingDecimalPoint,
}

impl LexErrorKind {
    fn reason(&self) -> &'static str {
        match self {
            LexErrorKind::IllegalChar => "非法字符",
            LexErrorKind::LoneAmpersand => "非法字符 '&'，期望 '&&'",
            LexErrorKind::LonePipe => "非法字符 '|'，期望 '||'",
            LexErrorKind::UnterminatedBlockComment => "多行注释未闭合，缺少 '*/'",
            LexErrorKind::MultipleDecimalPoints => "数字中不能有多个小数点",
            LexErrorKind::TrailingDecimalPoint => "数字不能以小数点结尾",
        }
    }
}

/// A recorded lexical error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub line: usize,
    pub col: usize,
    pub kind: LexErrorKind,
    pub found: Option<char>,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[词法错误] 第{}行, 第{}列: {}",
            self.line,
            self.col,
            self.kind.reason()
        )?;
        if let Some(c) = self.found {
            let shown = match c {
                '\n' => "\\n".to_string(),
                '\t' => "\\t".to_string(),
                '\r' => "\\r".to_string(),
                _ => c.to_string(),
            };
            write!(f, " (遇到字符: '{shown}')")?;
        }
        Ok(())
    }
}

impl std::error::Error for LexicalError {}

fn block_comment(lex: &mut logos::Lexer<RawToken>) -> FilterResult<(), LexErrorKind> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(LexErrorKind::UnterminatedBlockComment)
        }
    }
}

fn number(lex: &mut logos::Lexer<RawToken>) -> Result<String, LexErrorKind> {
    Ok(lex.slice().to_string())
}

fn trailing_dot(_lex: &mut logos::Lexer<RawToken>) -> Result<String, LexErrorKind> {
    Err(LexErrorKind::TrailingDecimalPoint)
}

fn multiple_dots(_lex: &mut logos::Lexer<RawToken>) -> Result<String, LexErrorKind> {
    Err(LexErrorKind::MultipleDecimalPoints)
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum RawToken {
    // Entered on `/*`; the callback skips to the matching `*/` or reports
    // an unterminated comment at the opening position.
    #[token("/*", block_comment)]
    BlockComment,

    // --- Keywords ---
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // --- Identifiers and numbers ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", number)]
    #[regex(r"[0-9]+\.", trailing_dot)]
    #[regex(r"[0-9]+\.[0-9]*\.[0-9.]*", multiple_dots)]
    Number(String),

    // --- Operators, two-character forms before their prefixes ---
    #[token("++")]
    Incr,
    #[token("--")]
    Decr,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Neq,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token("!")]
    Not,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
}

/// Coarse token class; the teaching codes and labels hang off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Ident,
    Number,
    KwWhile,
    KwBreak,
    KwContinue,
    KwInt,
    KwFloat,
    KwTrue,
    KwFalse,
    Operator,
    Punct,
    Eof,
}

/// A lexed token: class, original lexeme, teaching label and code, and the
/// 1-based position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: SymbolClass,
    pub lexeme: String,
    pub label: &'static str,
    pub code: i32,
    pub line: usize,
    pub col: usize,
}

impl Token {
    /// The grammar terminal this token maps to in the ACTION table:
    /// identifiers collapse to `i`, numbers to `n`, the sentinel to `#`,
    /// everything else (keywords included) is its own lexeme.
    pub fn terminal(&self) -> &str {
        match self.class {
            SymbolClass::Ident => "i",
            SymbolClass::Number => "n",
            SymbolClass::Eof => "#",
            _ => &self.lexeme,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.class == SymbolClass::Eof
    }
}

fn classify(raw: &RawToken) -> (SymbolClass, &'static str, i32) {
    use RawToken::*;
    match raw {
        While => (SymbolClass::KwWhile, "关键字", 36),
        Break => (SymbolClass::KwBreak, "关键字", 37),
        Continue => (SymbolClass::KwContinue, "关键字", 38),
        Int => (SymbolClass::KwInt, "关键字", 39),
        Float => (SymbolClass::KwFloat, "关键字", 40),
        True => (SymbolClass::KwTrue, "关键字", 41),
        False => (SymbolClass::KwFalse, "关键字", 42),
        Ident(_) => (SymbolClass::Ident, "标识符", 0),
        Number(_) => (SymbolClass::Number, "数字", 1),
        Plus | Minus | Star | Slash => (SymbolClass::Operator, "算术运算符", 2),
        Lt | Gt | Le | Ge | EqEq | Neq => (SymbolClass::Operator, "关系运算符", 2),
        Assign => (SymbolClass::Operator, "赋值运算符", 2),
        AndAnd | OrOr | Not => (SymbolClass::Operator, "逻辑运算符", 4),
        Incr | Decr => (SymbolClass::Operator, "自增运算符", 5),
        LParen | RParen | LBrace | RBrace | Semicolon | Comma | Dot => {
            (SymbolClass::Punct, "符号", 3)
        }
        BlockComment => (SymbolClass::Punct, "符号", 3),
    }
}

/// Converts byte offsets to 1-based line/column, walking the source once.
/// A tab advances the column by 4, matching the teaching trace layout.
struct PosCursor<'s> {
    source: &'s str,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'s> PosCursor<'s> {
    fn new(source: &'s str) -> Self {
        Self { source, offset: 0, line: 1, col: 1 }
    }

    /// Position of `offset`; offsets must be non-decreasing across calls.
    fn advance_to(&mut self, offset: usize) -> (usize, usize) {
        for ch in self.source[self.offset..offset].chars() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                '\t' => self.col += 4,
                _ => self.col += 1,
            }
        }
        self.offset = offset;
        (self.line, self.col)
    }
}

/// Everything one scan produces: the token stream (always terminated by
/// the `#` sentinel) and the accumulated errors.
#[derive(Debug)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexicalError>,
}

pub fn lex(source: &str) -> LexOutput {
    let mut lexer = RawToken::lexer(source);
    let mut cursor = PosCursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let (line, col) = cursor.advance_to(span.start);
        match result {
            Ok(raw) => {
                let (class, label, code) = classify(&raw);
                tokens.push(Token {
                    class,
                    lexeme: slice.to_string(),
                    label,
                    code,
                    line,
                    col,
                });
            }
            Err(kind) => {
                let first_char = slice.chars().next();
                let kind = match kind {
                    LexErrorKind::IllegalChar if first_char == Some('&') => {
                        LexErrorKind::LoneAmpersand
                    }
                    LexErrorKind::IllegalChar if first_char == Some('|') => {
                        LexErrorKind::LonePipe
                    }
                    other => other,
                };
                match kind {
                    LexErrorKind::UnterminatedBlockComment => {
                        errors.push(LexicalError { line, col, kind, found: None });
                    }
                    LexErrorKind::TrailingDecimalPoint => {
                        errors.push(LexicalError {
                            line,
                            col: col + slice.chars().count() - 1,
                            kind,
                            found: Some('.'),
                        });
                        tokens.push(number_token(slice, line, col));
                    }
                    LexErrorKind::MultipleDecimalPoints => {
                        // Report at the second decimal point.
                        let off = slice
                            .char_indices()
                            .filter(|&(_, c)| c == '.')
                            .nth(1)
                            .map(|(i, _)| slice[..i].chars().count())
                            .unwrap_or(0);
                        errors.push(LexicalError { line, col: col + off, kind, found: Some('.') });
                        tokens.push(number_token(slice, line, col));
                    }
                    _ => {
                        errors.push(LexicalError { line, col, kind, found: first_char });
                        // Emit the offending text as a symbol so the stream
                        // keeps its shape for the lexical table.
                        tokens.push(Token {
                            class: SymbolClass::Punct,
                            lexeme: slice.to_string(),
                            label: "符号",
                            code: 3,
                            line,
                            col,
                        });
                    }
                }
            }
        }
    }

    let (line, col) = cursor.advance_to(source.len());
    tokens.push(Token {
        class: SymbolClass::Eof,
        lexeme: END_LEXEME.to_string(),
        label: "结束符",
        code: -1,
        line,
        col,
    });
    LexOutput { tokens, errors }
}

const END_LEXEME: &str = "#";

fn number_token(slice: &str, line: usize, col: usize) -> Token {
    Token {
        class: SymbolClass::Number,
        lexeme: slice.to_string(),
        label: "数字",
        code: 1,
        line,
        col,
    }
}

/// Lexical-analysis table (sentinel omitted), one formatted row per token.
pub fn lex_table_lines(tokens: &[Token]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<15}{:<10}{:<15}{:<8}{:<8}",
        "Token", "符号码", "类型", "行号", "列号"
    )];
    for t in tokens {
        if t.is_eof() {
            continue;
        }
        lines.push(format!(
            "{:<15}{:<10}{:<15}{:<8}{:<8}",
            t.lexeme, t.code, t.label, t.line, t.col
        ));
    }
    lines
}
