// Keep the IR types reachable as `crate::ir::*`
pub mod tac;
pub use tac::*;

pub mod codegen;
