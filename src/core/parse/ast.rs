//! Generic AST produced by the markup parser.
//!
//! The parser performs no semantic interpretation: a command node
//! records its name and arguments, an environment its name and cell
//! grid, and that is all. Turning an AST into token-tree nodes is the
//! tree builder's job.

use serde::{Deserialize, Serialize};

/// A parse-tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    /// An ordered run of nodes (a braced group or a document).
    Sequence(Vec<Ast>),
    /// A `\begin{..}` / `\end{..}` pair.
    Environment(EnvNode),
    /// A command with its parsed arguments.
    Command(CmdNode),
    /// A bare character or an escaped literal.
    Symbol(String),
    /// A run of digits, possibly with a decimal point.
    Number(String),
}

impl Ast {
    /// The command node, if this is a command.
    pub fn as_command(&self) -> Option<&CmdNode> {
        match self {
            Ast::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// The child nodes, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Ast]> {
        match self {
            Ast::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The environment node, if this is an environment.
    pub fn as_environment(&self) -> Option<&EnvNode> {
        match self {
            Ast::Environment(env) => Some(env),
            _ => None,
        }
    }
}

/// An environment and its body.
///
/// Matrix-flavored environments fill the grid with one entry per cell;
/// every other environment has a single cell holding its body sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvNode {
    pub name: String,
    pub rows: Vec<Vec<Ast>>,
}

/// A command and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmdNode {
    pub name: String,
    pub args: Vec<Arg>,
}

impl CmdNode {
    pub fn new(name: impl Into<String>) -> Self {
        CmdNode {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// One parsed argument slot.
///
/// A mandatory slot may still be empty when input ran out; an optional
/// slot is empty unless a `[..]` introduced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub optional: bool,
    pub node: Option<Ast>,
}

impl Arg {
    pub fn mandatory(node: Option<Ast>) -> Self {
        Arg {
            optional: false,
            node,
        }
    }

    pub fn optional(node: Option<Ast>) -> Self {
        Arg {
            optional: true,
            node,
        }
    }
}
