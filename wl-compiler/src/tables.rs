//! Canonical LR(1) table construction: item-set closures, the state
//! automaton, and the ACTION/GOTO tables, plus the teaching dumps
//! (`items.txt`, `table.csv`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::grammar::{Grammar, END_MARK};

/// An LR(1) item: a production, a dot position, and a lookahead set.
/// Items with equal `(prod, dot)` inside one state are kept merged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lr1Item {
    pub prod: usize,
    pub dot: usize,
    pub lookahead: BTreeSet<&'static str>,
}

/// One entry of the ACTION table. A missing entry is a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// The generated automaton. States are item vectors sorted by
/// `(prod, dot, lookahead)`, so state equality is set equality.
pub struct ParseTables {
    pub grammar: Grammar,
    pub states: Vec<Vec<Lr1Item>>,
    actions: Vec<BTreeMap<&'static str, Action>>,
    gotos: Vec<BTreeMap<&'static str, usize>>,
    /// Overwritten ACTION cells, recorded during construction. Empty for
    /// the frozen grammar.
    pub conflicts: Vec<String>,
}

impl ParseTables {
    pub fn build() -> Self {
        let grammar = Grammar::new();
        let mut tables = Self {
            grammar,
            states: Vec::new(),
            actions: Vec::new(),
            gotos: Vec::new(),
            conflicts: Vec::new(),
        };
        tables.enumerate_states();
        tables
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
        self.actions.get(state).and_then(|row| row.get(terminal)).copied()
    }

    pub fn goto_state(&self, state: usize, nonterminal: &str) -> Option<usize> {
        self.gotos.get(state).and_then(|row| row.get(nonterminal)).copied()
    }

    /// Closure of a seed item set: predict every nonterminal behind a dot,
    /// with lookaheads from FIRST of the rest of the item plus its own
    /// lookahead, merging lookaheads of items that share `(prod, dot)`.
    fn closure(&self, mut items: Vec<Lr1Item>) -> Vec<Lr1Item> {
        loop {
            let mut changed = false;
            let mut i = 0;
            while i < items.len() {
                let cur = items[i].clone();
                i += 1;
                let right = self.grammar.production(cur.prod).right;
                if cur.dot >= right.len() {
                    continue;
                }
                let next_sym = right[cur.dot];
                if !self.grammar.is_nonterminal(next_sym) {
                    continue;
                }
                let beta = &right[cur.dot + 1..];
                let mut next_la = BTreeSet::new();
                for &la in &cur.lookahead {
                    let seq = beta.iter().copied().chain(std::iter::once(la));
                    next_la.extend(self.grammar.first_of_string(seq));
                }
                for p in self.grammar.productions {
                    if p.left != next_sym {
                        continue;
                    }
                    match items.iter_mut().find(|it| it.prod == p.id && it.dot == 0) {
                        Some(existing) => {
                            let before = existing.lookahead.len();
                            existing.lookahead.extend(next_la.iter().copied());
                            if existing.lookahead.len() > before {
                                changed = true;
                            }
                        }
                        None => {
                            items.push(Lr1Item {
                                prod: p.id,
                                dot: 0,
                                lookahead: next_la.clone(),
                            });
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        items.sort();
        items
    }

    /// GOTO(I, X): advance the dot over `sym` in every item that allows it,
    /// then close.
    fn goto_set(&self, state: &[Lr1Item], sym: &str) -> Vec<Lr1Item> {
        let mut seed = Vec::new();
        for it in state {
            let right = self.grammar.production(it.prod).right;
            if it.dot < right.len() && right[it.dot] == sym {
                seed.push(Lr1Item {
                    prod: it.prod,
                    dot: it.dot + 1,
                    lookahead: it.lookahead.clone(),
                });
            }
        }
        self.closure(seed)
    }

    /// Worklist enumeration from the closure of `[S' -> .B, #]`, filling
    /// shifts and gotos from transitions and reduce/accept entries from
    /// complete items.
    fn enumerate_states(&mut self) {
        let start = self.closure(vec![Lr1Item {
            prod: 0,
            dot: 0,
            lookahead: BTreeSet::from([END_MARK]),
        }]);
        self.push_state(start);

        let mut i = 0;
        while i < self.states.len() {
            let mut symbols = BTreeSet::new();
            for it in &self.states[i] {
                let right = self.grammar.production(it.prod).right;
                if it.dot < right.len() {
                    symbols.insert(right[it.dot]);
                }
            }
            for sym in symbols {
                let next = self.goto_set(&self.states[i], sym);
                let next_id = match self.states.iter().position(|s| *s == next) {
                    Some(id) => id,
                    None => self.push_state(next),
                };
                if self.grammar.is_terminal(sym) {
                    self.set_action(i, sym, Action::Shift(next_id));
                } else {
                    self.gotos[i].insert(sym, next_id);
                }
            }
            self.fill_reductions(i);
            i += 1;
        }
    }

    fn push_state(&mut self, state: Vec<Lr1Item>) -> usize {
        self.states.push(state);
        self.actions.push(BTreeMap::new());
        self.gotos.push(BTreeMap::new());
        self.states.len() - 1
    }

    fn fill_reductions(&mut self, state: usize) {
        let complete: Vec<(usize, Vec<&'static str>)> = self.states[state]
            .iter()
            .filter(|it| it.dot == self.grammar.production(it.prod).right.len())
            .map(|it| (it.prod, it.lookahead.iter().copied().collect()))
            .collect();
        for (prod, lookaheads) in complete {
            let action = if prod == 0 { Action::Accept } else { Action::Reduce(prod) };
            for la in lookaheads {
                self.set_action(state, la, action);
            }
        }
    }

    /// Last write wins, except that an accept entry is never overwritten by
    /// a reduce. Every overwrite is recorded.
    fn set_action(&mut self, state: usize, terminal: &'static str, action: Action) {
        if let Some(&prev) = self.actions[state].get(terminal) {
            if prev != action {
                if prev == Action::Accept && matches!(action, Action::Reduce(_)) {
                    self.conflicts.push(format!(
                        "state {state}, symbol '{terminal}': {action:?} ignored, accept kept"
                    ));
                    return;
                }
                self.conflicts.push(format!(
                    "state {state}, symbol '{terminal}': {prev:?} overwritten by {action:?}"
                ));
            }
        }
        self.actions[state].insert(terminal, action);
    }

    /// Terminals the parser would accept in `state`: symbols right after a
    /// dot, plus the lookaheads of complete items. Used for syntax-error
    /// reporting.
    pub fn expected_terminals(&self, state: usize) -> BTreeSet<&'static str> {
        let mut expected = BTreeSet::new();
        for it in &self.states[state] {
            let right = self.grammar.production(it.prod).right;
            if it.dot < right.len() {
                if self.grammar.is_terminal(right[it.dot]) {
                    expected.insert(right[it.dot]);
                }
            } else {
                expected.extend(it.lookahead.iter().copied());
            }
        }
        expected
    }

    /// Human-readable listing of every state and its items.
    pub fn items_listing(&self) -> String {
        let mut out = String::from("LR(1) 项目集合\n");
        for (i, state) in self.states.iter().enumerate() {
            let _ = writeln!(out, "I{i}:");
            for it in state {
                let p = self.grammar.production(it.prod);
                let mut line = format!("  {} -> ", p.left);
                for (k, sym) in p.right.iter().enumerate() {
                    if k == it.dot {
                        line.push('.');
                    }
                    line.push_str(sym);
                    line.push(' ');
                }
                if it.dot == p.right.len() {
                    line.push('.');
                }
                line.push_str(" , { ");
                for la in &it.lookahead {
                    line.push_str(la);
                    line.push(' ');
                }
                line.push('}');
                let _ = writeln!(out, "{line}");
            }
            out.push('\n');
        }
        out
    }

    /// CSV rendering of the ACTION/GOTO tables: `S<n>` shift, `r<n>`
    /// reduce, `acc` accept, blank for error, plain integers for GOTO.
    pub fn table_csv(&self) -> String {
        let mut out = String::from("State,");
        for t in &self.grammar.terminals {
            out.push_str(t);
            out.push(',');
        }
        for n in &self.grammar.nonterminals {
            if *n == "S'" {
                continue;
            }
            out.push_str(n);
            out.push(',');
        }
        out.push('\n');

        for i in 0..self.states.len() {
            let _ = write!(out, "{i},");
            for t in &self.grammar.terminals {
                match self.actions[i].get(t) {
                    Some(Action::Shift(j)) => {
                        let _ = write!(out, "S{j}");
                    }
                    Some(Action::Reduce(p)) => {
                        let _ = write!(out, "r{p}");
                    }
                    Some(Action::Accept) => out.push_str("acc"),
                    None => {}
                }
                out.push(',');
            }
            for n in &self.grammar.nonterminals {
                if *n == "S'" {
                    continue;
                }
                if let Some(j) = self.gotos[i].get(n) {
                    let _ = write!(out, "{j}");
                }
                out.push(',');
            }
            out.push('\n');
        }
        out
    }

    /// Write `items.txt` and `table.csv` under `dir`. Failure is reported
    /// by the caller and never blocks parsing.
    pub fn dump(&self, dir: &Path) -> io::Result<()> {
        fs::write(dir.join("items.txt"), self.items_listing())?;
        fs::write(dir.join("table.csv"), self.table_csv())?;
        Ok(())
    }
}
