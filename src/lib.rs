//! Formulax - editable formula document model with LaTeX transcoding
//! and exact evaluation.
//!
//! The crate has four parts:
//!
//! - the [token tree](crate::core::tree): sequences, structural nodes,
//!   matrices and commutative-diagram matrices, with the editing
//!   operations an editor needs (insert, remove, copy, paste, grid
//!   extension, arrows);
//! - the [emitter](crate::core::emit): pure recursive transcription of
//!   a tree into LaTeX-flavored markup;
//! - the [parser](crate::core::parse): a permissive recursive-descent
//!   parser from markup text to a generic AST;
//! - the [calculator](crate::core::calc): an operator-precedence
//!   evaluator over exact rationals and matrices, with graceful
//!   fallback to decimal approximation.
//!
//! ```
//! use formulax::{evaluate, parse, transcribe, Token};
//!
//! let tokens = [Token::number("1"), Token::symbol("/"), Token::number("2")];
//! let half = evaluate(&tokens).unwrap();
//! assert_eq!(transcribe(&half, "", false), "\\frac{1}{2}");
//!
//! let outcome = parse("\\frac{1}{2}");
//! assert!(outcome.warnings.is_empty());
//! ```

pub mod core;
pub mod data;
pub mod utils;

pub use crate::core::calc::{evaluate, materialize, MatrixValue, Rational, Value};
pub use crate::core::emit::{transcribe, INDENT_UNIT};
pub use crate::core::parse::{parse, Arg, Ast, CmdNode, EnvNode, ParseOutcome};
pub use crate::core::tree::{
    Arrow, Decoration, Diagram, FontStyle, Formula, LabelPos, Matrix, Number, StrokeStyle,
    Structure, Symbol, Token,
};
pub use crate::utils::error::{EvalFailure, EvalResult, ParseWarning, ParseWarningKind};
