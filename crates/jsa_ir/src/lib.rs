//! jsa_ir: Three-address intermediate code.
//!
//! Defines the quadruple model (opcodes, operands, records) and lowers a
//! syntax tree into a flat quadruple sequence. Generation builds new IR and
//! leaves the tree untouched; temporaries and labels come from a
//! [`GenContext`] owned by the run.

mod context;
mod error;
mod generator;
mod quad;

pub use context::GenContext;
pub use error::{GenerateError, GenerateResult};
pub use generator::Generator;
pub use quad::{format_number, renumber, Constant, Opcode, Operand, Quadruple};

use jsa_ast::node::Program;

/// Lower a program that parsed without syntax errors.
pub fn generate(program: &Program<'_>) -> GenerateResult<Vec<Quadruple>> {
    Generator::new().generate(program)
}

/// Render quadruples as a fixed-width table: index, operation, argument 1,
/// argument 2, result.
pub fn format_table(code: &[Quadruple]) -> String {
    let mut out = format!(
        "{:>4}  {:<14}{:<24}{:<24}{}\n",
        "#", "OP", "ARG1", "ARG2", "RESULT"
    );
    for quad in code {
        out.push_str(&quad.to_string());
        out.push('\n');
    }
    out
}
