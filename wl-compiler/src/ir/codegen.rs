//! Semantic actions and backpatching. The driver calls `enter_loop` when it
//! shifts `while` and `handle_production` on every reduction; everything
//! else is internal.

use std::fmt::Write as _;

use super::tac::{Quadruple, Tac};

/// Placeholder branch targets, rewritten when the owning loop closes.
pub const PENDING_EXIT: &str = "PENDING_EXIT";
pub const PENDING_TEST: &str = "PENDING_TEST";

/// Value slot on the semantic stack: an identifier, a literal lexeme, a
/// fresh temporary `T<k>`, or `true`/`false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemItem {
    pub name: String,
}

impl SemItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One open `while`: where its condition test starts and which emitted
/// jumps still wait for the exit / test label.
#[derive(Debug)]
struct LoopFrame {
    test_start: usize,
    break_list: Vec<usize>,
    continue_list: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct CodeGenerator {
    tac: Vec<Tac>,
    quads: Vec<Quadruple>,
    temp_count: usize,
    loops: Vec<LoopFrame>,
    step_quads: String,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tac(&self) -> &[Tac] {
        &self.tac
    }

    pub fn quads(&self) -> &[Quadruple] {
        &self.quads
    }

    pub fn into_code(self) -> (Vec<Tac>, Vec<Quadruple>) {
        (self.tac, self.quads)
    }

    /// Drain the textual quadruples emitted since the last call; the driver
    /// puts them on the current trace row.
    pub fn take_step_quads(&mut self) -> String {
        std::mem::take(&mut self.step_quads)
    }

    fn new_temp(&mut self) -> String {
        self.temp_count += 1;
        format!("T{}", self.temp_count)
    }

    fn emit(&mut self, op: &str, arg1: &str, arg2: &str, result: &str) {
        let addr = self.tac.len();
        self.tac.push(Tac {
            op: op.into(),
            arg1: arg1.into(),
            arg2: arg2.into(),
            result: result.into(),
            addr,
        });
    }

    fn emit_quad(&mut self, op: &str, arg1: &str, arg2: &str, result: &str) {
        let q = Quadruple {
            op: op.into(),
            arg1: arg1.into(),
            arg2: arg2.into(),
            result: result.into(),
        };
        if !self.step_quads.is_empty() {
            self.step_quads.push(' ');
        }
        let _ = write!(self.step_quads, "{q}");
        self.quads.push(q);
    }

    fn backpatch(&mut self, addr: usize, target: String) {
        if let Some(t) = self.tac.get_mut(addr) {
            t.result = target;
        }
    }

    /// On shift of `while`: the next TAC address is the loop's test start.
    pub fn enter_loop(&mut self) {
        self.loops.push(LoopFrame {
            test_start: self.tac.len(),
            break_list: Vec::new(),
            continue_list: Vec::new(),
        });
    }

    /// On reduction of the loop production: emit the back edge, then
    /// resolve every pending break to the exit label and every pending
    /// continue to the test label.
    fn exit_loop(&mut self) {
        let Some(frame) = self.loops.pop() else {
            return;
        };
        self.emit("goto", "", "", &format!("L{}", frame.test_start));
        self.emit_quad("j", "_", "_", &frame.test_start.to_string());
        let exit_addr = self.tac.len();
        for addr in frame.break_list {
            self.backpatch(addr, format!("L{exit_addr}"));
        }
        for addr in frame.continue_list {
            self.backpatch(addr, format!("L{}", frame.test_start));
        }
    }

    fn emit_break(&mut self) {
        if self.loops.is_empty() {
            return;
        }
        let addr = self.tac.len();
        self.emit("goto", "", "", PENDING_EXIT);
        self.emit_quad("j", "_", "_", PENDING_EXIT);
        if let Some(frame) = self.loops.last_mut() {
            frame.break_list.push(addr);
        }
    }

    fn emit_continue(&mut self) {
        if self.loops.is_empty() {
            return;
        }
        let addr = self.tac.len();
        self.emit("goto", "", "", PENDING_TEST);
        self.emit_quad("j", "_", "_", PENDING_TEST);
        if let Some(frame) = self.loops.last_mut() {
            frame.continue_list.push(addr);
        }
    }

    /// Fires on the marker reduction `M -> ε`, right after the loop
    /// condition has been parsed. The condition result sits two below the
    /// top of the semantic stack (under the just-shifted `)`). A literal
    /// `true` condition emits nothing; anything else emits a jump-if-zero
    /// that joins the break list for exit backpatching.
    fn emit_loop_test(&mut self, sem_stack: &[SemItem]) {
        if sem_stack.len() < 2 {
            return;
        }
        let cond = sem_stack[sem_stack.len() - 2].name.clone();
        if cond == "true" {
            return;
        }
        let addr = self.tac.len();
        self.emit("jz", &cond, "", PENDING_EXIT);
        self.emit_quad("jz", &cond, "_", PENDING_EXIT);
        if let Some(frame) = self.loops.last_mut() {
            frame.break_list.push(addr);
        }
    }

    fn binary(&mut self, op: &str, lhs: &SemItem, rhs: &SemItem) -> SemItem {
        let t = self.new_temp();
        self.emit(op, &lhs.name, &rhs.name, &t);
        self.emit_quad(op, &lhs.name, &rhs.name, &t);
        SemItem::new(t)
    }

    /// Postfix `i++`/`i--`: save the old value, step, return the old value.
    fn postfix_step(&mut self, id: &str, op: &str) -> SemItem {
        let old = self.new_temp();
        self.emit(":=", id, "", &old);
        self.emit_quad("=", id, "_", &old);
        let t = self.new_temp();
        self.emit(op, id, "1", &t);
        self.emit(":=", &t, "", id);
        self.emit_quad(op, id, "1", &t);
        self.emit_quad("=", &t, "_", id);
        SemItem::new(old)
    }

    /// Prefix `++i`/`--i`: step first, return the stepped identifier.
    fn prefix_step(&mut self, id: &str, op: &str) -> SemItem {
        let t = self.new_temp();
        self.emit(op, id, "1", &t);
        self.emit(":=", &t, "", id);
        self.emit_quad(op, id, "1", &t);
        self.emit_quad("=", &t, "_", id);
        SemItem::new(id)
    }

    /// Semantic action for the reduced production. `popped` holds the
    /// right-hand side's semantic items in left-to-right order;
    /// `sem_stack` is a read-only view of what remains underneath.
    pub fn handle_production(
        &mut self,
        prod_id: usize,
        popped: &[SemItem],
        sem_stack: &[SemItem],
    ) -> SemItem {
        match prod_id {
            // A -> while ( L ) M { B }
            1 => {
                self.exit_loop();
                SemItem::default()
            }
            // L -> L || M1
            2 => self.binary("||", &popped[0], &popped[2]),
            // M1 -> M1 && N
            4 => self.binary("&&", &popped[0], &popped[2]),
            // N -> ! N
            6 => {
                let t = self.new_temp();
                self.emit("!", &popped[1].name, "", &t);
                self.emit_quad("!", &popped[1].name, "_", &t);
                SemItem::new(t)
            }
            // N -> ( L ) / G -> ( E )
            8 | 24 => popped[1].clone(),
            // C -> E ROP E, with the relational lexeme as the op
            9 => self.binary(&popped[1].name, &popped[0], &popped[2]),
            // S -> i = E, returns the assigned identifier
            14 => {
                self.emit(":=", &popped[2].name, "", &popped[0].name);
                self.emit_quad("=", &popped[2].name, "_", &popped[0].name);
                popped[0].clone()
            }
            // E -> E + F | E - F, F -> F * G | F / G
            15 | 16 | 18 | 19 => self.binary(&popped[1].name, &popped[0], &popped[2]),
            // G -> - G
            21 => {
                let t = self.new_temp();
                self.emit("neg", &popped[1].name, "", &t);
                self.emit_quad("neg", &popped[1].name, "_", &t);
                SemItem::new(t)
            }
            // G -> i | n, S -> G, N -> G
            22 | 23 | 35 | 45 => popped[0].clone(),
            // G -> i ++ / ++ i / i -- / -- i
            31 => self.postfix_step(&popped[0].name, "+"),
            32 => self.prefix_step(&popped[1].name, "+"),
            33 => self.postfix_step(&popped[0].name, "-"),
            34 => self.prefix_step(&popped[1].name, "-"),
            // S -> break | continue
            36 => {
                self.emit_break();
                SemItem::default()
            }
            37 => {
                self.emit_continue();
                SemItem::default()
            }
            // M -> ε, the loop-condition marker
            38 => {
                self.emit_loop_test(sem_stack);
                SemItem::default()
            }
            // S -> int i | float i
            39 | 40 => {
                let (ty, id) = (&popped[0].name, &popped[1].name);
                self.emit("decl", ty, "", id);
                self.emit_quad("decl", ty, "_", id);
                SemItem::new(id.clone())
            }
            // S -> int i = E | float i = E
            41 | 42 => {
                let (ty, id, value) = (&popped[0].name, &popped[1].name, &popped[3].name);
                self.emit("decl", ty, "", id);
                self.emit(":=", value, "", id);
                self.emit_quad("decl", ty, "_", id);
                self.emit_quad("=", value, "_", id);
                SemItem::new(id.clone())
            }
            // G -> true | false
            43 => SemItem::new("true"),
            44 => SemItem::new("false"),
            // Chain productions and ROP: pass the first item through
            _ => popped.first().cloned().unwrap_or_default(),
        }
    }
}
