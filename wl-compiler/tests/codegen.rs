use std::sync::OnceLock;

use wl_compiler::{Compiler, CompileResult};

fn compiler() -> &'static Compiler {
    static COMPILER: OnceLock<Compiler> = OnceLock::new();
    COMPILER.get_or_init(Compiler::new)
}

fn compile(source: &str) -> CompileResult {
    let result = compiler().run(source);
    assert!(
        result.lex_errors.is_empty(),
        "unexpected lexical errors: {:?}",
        result.lex_errors
    );
    assert!(
        result.syntax_error.is_none(),
        "unexpected syntax error: {:?}",
        result.syntax_error
    );
    assert!(result.accepted, "parse should accept");
    result
}

// ── Loops & backpatching ─────────────────────────────────────────────────

#[test]
fn minimal_loop_resolves_break_past_the_back_edge() {
    let result = compile("while(true){break;}");

    // A literal-true condition emits no test: just the pending break and
    // the back edge.
    assert_eq!(result.tac.len(), 2);
    assert_eq!(result.tac[0].op, "goto");
    assert_eq!(result.tac[0].result, "L2", "break goes to the terminal label");
    assert_eq!(result.tac[1].op, "goto");
    assert_eq!(result.tac[1].result, "L0", "back edge returns to the test start");
    assert!(result.tac.iter().all(|t| !t.result.contains("PENDING")));
}

#[test]
fn literal_true_condition_emits_no_jz() {
    let result = compile("while(true){x = 1;}");
    assert!(result.tac.iter().all(|t| t.op != "jz"));
}

#[test]
fn counter_loop_emits_test_body_and_back_edge() {
    let result = compile("int i=0; while(i<10){i=i+1;}");
    let tac = &result.tac;
    assert_eq!(tac.len(), 7);

    assert_eq!((tac[0].op.as_str(), tac[0].arg1.as_str(), tac[0].result.as_str()), ("decl", "int", "i"));
    assert_eq!((tac[1].op.as_str(), tac[1].arg1.as_str(), tac[1].result.as_str()), (":=", "0", "i"));

    // The loop test starts right after the declaration statement.
    assert_eq!((tac[2].op.as_str(), tac[2].arg1.as_str(), tac[2].arg2.as_str(), tac[2].result.as_str()), ("<", "i", "10", "T1"));
    assert_eq!((tac[3].op.as_str(), tac[3].arg1.as_str(), tac[3].result.as_str()), ("jz", "T1", "L7"));

    assert_eq!((tac[4].op.as_str(), tac[4].arg1.as_str(), tac[4].arg2.as_str(), tac[4].result.as_str()), ("+", "i", "1", "T2"));
    assert_eq!((tac[5].op.as_str(), tac[5].arg1.as_str(), tac[5].result.as_str()), (":=", "T2", "i"));

    assert_eq!((tac[6].op.as_str(), tac[6].result.as_str()), ("goto", "L2"));
}

#[test]
fn nested_loops_keep_break_lists_separate() {
    let result = compile("while(a<1){while(b<2){break;}}");
    let tac = &result.tac;
    assert_eq!(tac.len(), 7);

    // Outer test exits past everything; the inner break and test resolve
    // to a label inside the outer body, not to the outer exit.
    assert_eq!(tac[1].op, "jz");
    assert_eq!(tac[1].result, "L7", "outer test exits the program");
    assert_eq!(tac[3].op, "jz");
    assert_eq!(tac[3].result, "L6", "inner test exits the inner loop only");
    assert_eq!(tac[4].op, "goto");
    assert_eq!(tac[4].result, "L6", "inner break stays inside the outer body");
    assert_eq!(tac[5].result, "L2", "inner back edge");
    assert_eq!(tac[6].result, "L0", "outer back edge");
}

#[test]
fn continue_jumps_to_the_test_start() {
    let result = compile("while(a<1){continue;}");
    let tac = &result.tac;
    assert_eq!(tac.len(), 4);
    assert_eq!(tac[1].result, "L4", "test exits past the back edge");
    assert_eq!((tac[2].op.as_str(), tac[2].result.as_str()), ("goto", "L0"));
    assert_eq!(tac[3].result, "L0", "back edge");
}

#[test]
fn no_pending_targets_survive_loop_close() {
    let result = compile("while(a<1){break; continue; while(b<2){continue; break;}}");
    assert!(
        result.tac.iter().all(|t| !t.result.contains("PENDING")),
        "unresolved backpatch: {:?}",
        result.tac
    );
}

#[test]
fn quadruples_keep_their_pending_placeholders() {
    let result = compile("while(a<1){break;}");

    // The TAC side is patched, the quadruple (trace) side is not.
    assert_eq!(result.tac[1].result, "L4");
    assert_eq!(result.quads[1].result, "PENDING_EXIT");
    assert_eq!(result.tac[2].result, "L4");
    assert_eq!(result.quads[2].result, "PENDING_EXIT");
    // Back-edge quadruple uses the bare `j` form.
    assert_eq!(result.quads[3].op, "j");
    assert_eq!(result.quads[3].result, "0");
}

// ── Increment / decrement ────────────────────────────────────────────────

#[test]
fn postfix_increment_yields_the_old_value() {
    let result = compile("a = b ++ ;");
    let tac = &result.tac;
    assert_eq!(tac.len(), 4);
    assert_eq!((tac[0].op.as_str(), tac[0].arg1.as_str(), tac[0].result.as_str()), (":=", "b", "T1"));
    assert_eq!((tac[1].op.as_str(), tac[1].arg1.as_str(), tac[1].arg2.as_str(), tac[1].result.as_str()), ("+", "b", "1", "T2"));
    assert_eq!((tac[2].op.as_str(), tac[2].arg1.as_str(), tac[2].result.as_str()), (":=", "T2", "b"));
    assert_eq!((tac[3].op.as_str(), tac[3].arg1.as_str(), tac[3].result.as_str()), (":=", "T1", "a"));
}

#[test]
fn prefix_increment_yields_the_new_value() {
    let result = compile("y = ++ x ;");
    let tac = &result.tac;
    assert_eq!(tac.len(), 3);
    assert_eq!((tac[0].op.as_str(), tac[0].arg1.as_str(), tac[0].arg2.as_str(), tac[0].result.as_str()), ("+", "x", "1", "T1"));
    assert_eq!((tac[1].op.as_str(), tac[1].arg1.as_str(), tac[1].result.as_str()), (":=", "T1", "x"));
    assert_eq!((tac[2].op.as_str(), tac[2].arg1.as_str(), tac[2].result.as_str()), (":=", "x", "y"));
}

#[test]
fn postfix_decrement_mirrors_increment_with_minus() {
    let result = compile("y = x -- ;");
    let tac = &result.tac;
    assert_eq!(tac.len(), 4);
    assert_eq!(tac[1].op, "-");
    assert_eq!(tac[3].arg1, "T1", "the saved old value is assigned");
}

// ── Emission invariants ──────────────────────────────────────────────────

#[test]
fn tac_addresses_match_their_indices() {
    let result = compile("int i=0; while(i<10){i = i + 1 * 2; if_val = i ++ ;}");
    for (idx, t) in result.tac.iter().enumerate() {
        assert_eq!(t.addr, idx, "addr must equal the emission index");
    }
}

#[test]
fn tac_and_quadruples_stay_in_lock_step() {
    let result = compile("int i=0; while(i<10){i=i+1; break;}");
    assert_eq!(result.tac.len(), result.quads.len());
    for (t, q) in result.tac.iter().zip(&result.quads) {
        if t.op != "goto" {
            assert_eq!(t.arg1, q.arg1, "operand drift between TAC and quads");
        }
    }
}

#[test]
fn branch_targets_never_point_past_the_terminal_label() {
    let result = compile("while(a<1){break; while(b<2){continue;}}");
    let len = result.tac.len();
    for t in &result.tac {
        if t.op == "goto" || t.op == "jz" {
            let target: usize = t.result.trim_start_matches('L').parse().expect("label target");
            assert!(target <= len, "target L{target} past the terminal label L{len}");
        }
    }
}

#[test]
fn temporaries_count_up_and_are_never_reused() {
    let result = compile("x = 1 + 2 * 3 - 4 ;");
    let results: Vec<&str> = result.tac.iter().map(|t| t.result.as_str()).collect();
    assert_eq!(results, vec!["T1", "T2", "T3", "x"]);
}
