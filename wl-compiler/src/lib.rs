pub mod driver;
pub mod frontend;
pub mod grammar;
pub mod ir;
pub mod tables;

use std::io;
use std::path::Path;

use thiserror::Error;

use driver::{ParseOutcome, SyntaxError, TraceStep};
use frontend::lexer::{self, LexicalError, Token};
use ir::codegen::CodeGenerator;
use ir::tac::{Quadruple, Tac};
use tables::ParseTables;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Lexical(#[from] LexicalError),

    #[error("{0}")]
    Syntax(#[from] SyntaxError),
}

/// A compiler instance. The LR(1) tables are built once here and are
/// read-only for every subsequent `run`.
pub struct Compiler {
    tables: ParseTables,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            tables: ParseTables::build(),
        }
    }

    pub fn tables(&self) -> &ParseTables {
        &self.tables
    }

    /// Write `items.txt` and `table.csv` under `dir`.
    pub fn dump_tables(&self, dir: &Path) -> io::Result<()> {
        self.tables.dump(dir)
    }

    /// Full pipeline: lex, then — unless lexical errors were recorded —
    /// parse and generate code. Every call owns fresh stacks and a fresh
    /// code generator.
    pub fn run(&self, source: &str) -> CompileResult {
        let lexed = lexer::lex(source);
        if !lexed.errors.is_empty() {
            return CompileResult {
                tokens: lexed.tokens,
                lex_errors: lexed.errors,
                trace: Vec::new(),
                syntax_error: None,
                accepted: false,
                final_states: Vec::new(),
                tac: Vec::new(),
                quads: Vec::new(),
            };
        }

        let mut gen = CodeGenerator::new();
        let ParseOutcome {
            trace,
            error,
            accepted,
            final_states,
        } = driver::parse(&self.tables, &lexed.tokens, &mut gen);
        let (tac, quads) = gen.into_code();

        CompileResult {
            tokens: lexed.tokens,
            lex_errors: Vec::new(),
            trace,
            syntax_error: error,
            accepted,
            final_states,
            tac,
            quads,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one compilation produced. The TAC/quadruple sequences hold
/// whatever was emitted before a syntax error stopped the parse; callers
/// that only want clean output check `has_errors` (as the CLI does before
/// printing the listing).
#[derive(Debug)]
pub struct CompileResult {
    pub tokens: Vec<Token>,
    pub lex_errors: Vec<LexicalError>,
    pub trace: Vec<TraceStep>,
    pub syntax_error: Option<SyntaxError>,
    pub accepted: bool,
    pub final_states: Vec<usize>,
    pub tac: Vec<Tac>,
    pub quads: Vec<Quadruple>,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        !self.lex_errors.is_empty() || self.syntax_error.is_some()
    }

    /// Lexical-analysis table, sentinel omitted.
    pub fn lex_table_lines(&self) -> Vec<String> {
        lexer::lex_table_lines(&self.tokens)
    }

    /// Parse trace with its header row; on a syntax error the message is
    /// interleaved just before the final (failing) row.
    pub fn trace_lines(&self) -> Vec<String> {
        let mut lines = vec![TraceStep::header()];
        for (i, step) in self.trace.iter().enumerate() {
            if i + 1 == self.trace.len() {
                if let Some(err) = &self.syntax_error {
                    lines.push(String::new());
                    lines.push(err.to_string());
                }
            }
            lines.push(step.to_row());
        }
        lines
    }

    /// Final TAC listing.
    pub fn tac_lines(&self) -> Vec<String> {
        ir::tac::tac_lines(&self.tac)
    }
}

/// Compile source text straight to TAC, surfacing the first error as a
/// typed `CompileError`.
pub fn compile_to_tac(source: &str) -> Result<Vec<Tac>, CompileError> {
    let compiler = Compiler::new();
    let mut result = compiler.run(source);
    if let Some(err) = result.lex_errors.first() {
        return Err(err.clone().into());
    }
    if let Some(err) = result.syntax_error.take() {
        return Err(err.into());
    }
    Ok(result.tac)
}
