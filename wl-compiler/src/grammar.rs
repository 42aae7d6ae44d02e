//! The frozen while-language grammar: productions, symbol sets, FIRST sets.

use std::collections::{BTreeMap, BTreeSet};

/// End-of-input marker; also the lookahead of the initial LR(1) item.
pub const END_MARK: &str = "#";

/// Marker for the empty string inside FIRST sets.
pub const EPSILON: &str = "epsilon";

/// A fixed rule of the grammar. Id 0 is the augmented start `S' -> B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub id: usize,
    pub left: &'static str,
    pub right: &'static [&'static str],
}

impl Production {
    const fn new(id: usize, left: &'static str, right: &'static [&'static str]) -> Self {
        Self { id, left, right }
    }
}

pub static PRODUCTIONS: &[Production] = &[
    Production::new(0, "S'", &["B"]),
    Production::new(1, "A", &["while", "(", "L", ")", "M", "{", "B", "}"]),
    Production::new(2, "L", &["L", "||", "M1"]),
    Production::new(3, "L", &["M1"]),
    Production::new(4, "M1", &["M1", "&&", "N"]),
    Production::new(5, "M1", &["N"]),
    Production::new(6, "N", &["!", "N"]),
    Production::new(7, "N", &["C"]),
    Production::new(8, "N", &["(", "L", ")"]),
    Production::new(9, "C", &["E", "ROP", "E"]),
    Production::new(10, "B", &["S", ";", "B"]),
    Production::new(11, "B", &["S", ";"]),
    Production::new(12, "B", &["A", "B"]),
    Production::new(13, "B", &["A"]),
    Production::new(14, "S", &["i", "=", "E"]),
    Production::new(15, "E", &["E", "+", "F"]),
    Production::new(16, "E", &["E", "-", "F"]),
    Production::new(17, "E", &["F"]),
    Production::new(18, "F", &["F", "*", "G"]),
    Production::new(19, "F", &["F", "/", "G"]),
    Production::new(20, "F", &["G"]),
    Production::new(21, "G", &["-", "G"]),
    Production::new(22, "G", &["i"]),
    Production::new(23, "G", &["n"]),
    Production::new(24, "G", &["(", "E", ")"]),
    Production::new(25, "ROP", &[">"]),
    Production::new(26, "ROP", &["<"]),
    Production::new(27, "ROP", &["=="]),
    Production::new(28, "ROP", &[">="]),
    Production::new(29, "ROP", &["<="]),
    Production::new(30, "ROP", &["!="]),
    Production::new(31, "G", &["i", "++"]),
    Production::new(32, "G", &["++", "i"]),
    Production::new(33, "G", &["i", "--"]),
    Production::new(34, "G", &["--", "i"]),
    Production::new(35, "S", &["G"]),
    Production::new(36, "S", &["break"]),
    Production::new(37, "S", &["continue"]),
    Production::new(38, "M", &[]),
    Production::new(39, "S", &["int", "i"]),
    Production::new(40, "S", &["float", "i"]),
    Production::new(41, "S", &["int", "i", "=", "E"]),
    Production::new(42, "S", &["float", "i", "=", "E"]),
    Production::new(43, "G", &["true"]),
    Production::new(44, "G", &["false"]),
    Production::new(45, "N", &["G"]),
];

/// The grammar plus everything derived from it that table construction
/// needs: the symbol partition and the FIRST sets.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub productions: &'static [Production],
    pub nonterminals: BTreeSet<&'static str>,
    pub terminals: BTreeSet<&'static str>,
    first: BTreeMap<&'static str, BTreeSet<&'static str>>,
}

impl Grammar {
    pub fn new() -> Self {
        let productions = PRODUCTIONS;
        let mut nonterminals = BTreeSet::new();
        for p in productions {
            nonterminals.insert(p.left);
        }
        let mut terminals = BTreeSet::new();
        for p in productions {
            for &sym in p.right {
                if !nonterminals.contains(sym) {
                    terminals.insert(sym);
                }
            }
        }
        terminals.insert(END_MARK);

        let mut grammar = Self {
            productions,
            nonterminals,
            terminals,
            first: BTreeMap::new(),
        };
        grammar.compute_first();
        grammar
    }

    pub fn production(&self, id: usize) -> &'static Production {
        &self.productions[id]
    }

    pub fn is_terminal(&self, sym: &str) -> bool {
        self.terminals.contains(sym)
    }

    pub fn is_nonterminal(&self, sym: &str) -> bool {
        self.nonterminals.contains(sym)
    }

    /// FIRST set of a single nonterminal.
    pub fn first(&self, sym: &str) -> Option<&BTreeSet<&'static str>> {
        self.first.get(sym)
    }

    /// Fixed-point iteration over the productions until no FIRST set grows.
    fn compute_first(&mut self) {
        loop {
            let mut changed = false;
            for p in self.productions {
                let add = self.first_of_string(p.right.iter().copied());
                let entry = self.first.entry(p.left).or_default();
                let before = entry.len();
                entry.extend(add);
                if entry.len() > before {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// FIRST of a string of grammar symbols. A terminal stops the walk; a
    /// nullable nonterminal lets it continue; if every symbol is nullable
    /// the result contains `epsilon`.
    pub fn first_of_string(
        &self,
        symbols: impl IntoIterator<Item = &'static str>,
    ) -> BTreeSet<&'static str> {
        let mut out = BTreeSet::new();
        let mut all_nullable = true;
        for sym in symbols {
            if self.terminals.contains(sym) {
                out.insert(sym);
                all_nullable = false;
                break;
            }
            let mut nullable = false;
            if let Some(first) = self.first.get(sym) {
                for &f in first {
                    if f == EPSILON {
                        nullable = true;
                    } else {
                        out.insert(f);
                    }
                }
            }
            if !nullable {
                all_nullable = false;
                break;
            }
        }
        if all_nullable {
            out.insert(EPSILON);
        }
        out
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}
