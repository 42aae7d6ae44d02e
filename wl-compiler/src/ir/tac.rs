// A tiny, linear IR: three-address instructions plus the quadruple view
// shown in the analysis trace.
use std::fmt;

/// A three-address instruction. `addr` is the instruction's index in the
/// emitted sequence, fixed at emission; only `result` is ever rewritten,
/// and only by backpatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tac {
    pub op: String,
    pub arg1: String,
    pub arg2: String,
    pub result: String,
    pub addr: usize,
}

impl Tac {
    fn render(&self) -> String {
        match self.op.as_str() {
            "goto" => format!("goto {}", self.result),
            "jz" => format!("if {:<10} == 0 goto {}", self.arg1, self.result),
            "jnz" => format!("if {:<10} != 0 goto {}", self.arg1, self.result),
            "decl" => format!("decl {:<8} {}", self.arg1, self.result),
            ":=" => format!("{:<12} := {}", self.result, self.arg1),
            "neg" => format!("{:<12} := neg {}", self.result, self.arg1),
            "!" => format!("{:<12} := ! {}", self.result, self.arg1),
            _ => format!(
                "{:<12} := {:<10} {:<4} {}",
                self.result, self.arg1, self.op, self.arg2
            ),
        }
    }
}

/// Labelled listing of the whole sequence, one `L<addr> | …` line each.
/// A branch target equal to the sequence length names the off-the-end
/// terminal label.
pub fn tac_lines(code: &[Tac]) -> Vec<String> {
    code.iter()
        .map(|t| format!("L{:>3} | {}", t.addr, t.render()))
        .collect()
}

/// The same instruction as a four-field tuple, kept for the trace display.
/// Empty operands are rendered as `_`; pending branch targets stay visible
/// here even after the TAC side has been backpatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadruple {
    pub op: String,
    pub arg1: String,
    pub arg2: String,
    pub result: String,
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.op, self.arg1, self.arg2, self.result)
    }
}
