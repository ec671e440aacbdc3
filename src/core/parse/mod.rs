//! Markup parser: recursive descent over raw text.
//!
//! The parser is calm under malformed input: a missing argument stays
//! absent, an unmatched closing brace terminates the current sequence,
//! and an unknown command falls back to zero arguments. Problems are
//! collected as warnings beside the best-effort AST.

mod ast;

pub use ast::{Arg, Ast, CmdNode, EnvNode};

use crate::data::maps::static_arity;
use crate::utils::error::{ParseWarning, ParseWarningKind};
use fxhash::FxHashMap;

/// Nesting ceiling; at the ceiling the parser degrades to flat symbols
/// instead of recursing further.
const MAX_DEPTH: usize = 64;

/// The parsed document plus any warnings collected along the way.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub ast: Ast,
    pub warnings: Vec<ParseWarning>,
}

/// Parse markup text into a generic AST.
pub fn parse(text: &str) -> ParseOutcome {
    let mut parser = Parser::new(text);
    let mut seq = Vec::new();
    loop {
        parser.skip_whitespace();
        if parser.at_end() {
            break;
        }
        if parser.peek() == Some('}') {
            let at = parser.pos;
            parser.bump();
            parser.warn(
                ParseWarningKind::UnmatchedBrace,
                "closing brace with no opener",
                at,
            );
            continue;
        }
        if let Some(node) = parser.parse_token() {
            seq.push(node);
        }
    }
    ParseOutcome {
        ast: Ast::Sequence(seq),
        warnings: parser.warnings,
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    /// Live command-arity map, consulted before the static table and
    /// extended by `\newcommand` for the remainder of the pass.
    arity: FxHashMap<String, Vec<bool>>,
    warnings: Vec<ParseWarning>,
    depth: usize,
    depth_warned: bool,
    /// Nesting count of xymatrix-flavored environments.
    xymatrix: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Parser {
            chars: text.chars().collect(),
            pos: 0,
            arity: FxHashMap::default(),
            warnings: Vec::new(),
            depth: 0,
            depth_warned: false,
            xymatrix: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn warn(&mut self, kind: ParseWarningKind, message: &str, at: usize) {
        self.warnings.push(ParseWarning::new(kind, message).at(at));
    }

    /// Parse one token. Returns None at end of input or at an
    /// unconsumed closing brace (the caller decides what that means).
    fn parse_token(&mut self) -> Option<Ast> {
        self.skip_whitespace();
        let c = self.peek()?;
        if c == '}' {
            return None;
        }
        if self.depth >= MAX_DEPTH {
            if !self.depth_warned {
                self.depth_warned = true;
                let at = self.pos;
                self.warn(
                    ParseWarningKind::DepthCeiling,
                    "nesting too deep, degrading to flat symbols",
                    at,
                );
            }
            self.bump();
            return Some(Ast::Symbol(c.to_string()));
        }
        self.depth += 1;
        let node = self.parse_token_inner(c);
        self.depth -= 1;
        node
    }

    fn parse_token_inner(&mut self, c: char) -> Option<Ast> {
        match c {
            '\\' => {
                self.bump();
                match self.peek() {
                    // Double escape is a literal line-break symbol.
                    Some('\\') => {
                        self.bump();
                        Some(Ast::Symbol("\n".to_string()))
                    }
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        let name = self.read_letters();
                        self.parse_command(name)
                    }
                    // Escaped single character is a literal.
                    Some(ch) => {
                        self.bump();
                        Some(Ast::Symbol(ch.to_string()))
                    }
                    None => Some(Ast::Symbol("\\".to_string())),
                }
            }
            '^' | '_' => {
                self.bump();
                let at = self.pos;
                let arg = self.parse_token();
                if arg.is_none() {
                    self.warn(
                        ParseWarningKind::MissingArgument,
                        &format!("'{}' with nothing to attach to", c),
                        at,
                    );
                }
                Some(Ast::Command(CmdNode {
                    name: c.to_string(),
                    args: vec![Arg::mandatory(arg)],
                }))
            }
            '#' => {
                self.bump();
                let digits = self.read_digits();
                if digits.is_empty() {
                    Some(Ast::Symbol("#".to_string()))
                } else {
                    Some(Ast::Command(CmdNode {
                        name: "#".to_string(),
                        args: vec![Arg::mandatory(Some(Ast::Number(digits)))],
                    }))
                }
            }
            '{' => {
                self.bump();
                Some(self.parse_group())
            }
            c if c.is_ascii_digit() => Some(Ast::Number(self.read_number())),
            _ => {
                self.bump();
                Some(Ast::Symbol(c.to_string()))
            }
        }
    }

    fn read_letters(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn read_digits(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    /// A digit run with an optional embedded decimal point.
    fn read_number(&mut self) -> String {
        let mut out = self.read_digits();
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            out.push('.');
            self.pos += 1;
            out.push_str(&self.read_digits());
        }
        out
    }

    /// Body of a braced group; the opening brace is already consumed,
    /// the closing brace is consumed silently.
    fn parse_group(&mut self) -> Ast {
        let mut seq = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    let at = self.pos;
                    self.warn(
                        ParseWarningKind::UnmatchedBrace,
                        "group still open at end of input",
                        at,
                    );
                    break;
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                _ => {
                    if let Some(node) = self.parse_token() {
                        seq.push(node);
                    }
                }
            }
        }
        Ast::Sequence(seq)
    }

    fn parse_command(&mut self, name: String) -> Option<Ast> {
        if name == "begin" {
            return Some(self.parse_environment());
        }
        if self.xymatrix > 0 && name == "ar" {
            return Some(self.parse_arrow());
        }

        let obligations: Vec<bool> = match self.arity.get(&name) {
            Some(live) => live.clone(),
            None => static_arity(&name).to_vec(),
        };
        let mut args = Vec::with_capacity(obligations.len());
        for mandatory in obligations {
            if mandatory {
                let at = self.pos;
                let node = self.parse_token();
                if node.is_none() {
                    self.warn(
                        ParseWarningKind::MissingArgument,
                        &format!("\\{} is missing a mandatory argument", name),
                        at,
                    );
                }
                args.push(Arg::mandatory(node));
            } else {
                self.skip_whitespace();
                if self.peek() == Some('[') {
                    self.bump();
                    args.push(Arg::optional(Some(self.parse_bracket_group())));
                } else {
                    args.push(Arg::optional(None));
                }
            }
        }

        if name == "newcommand" {
            self.register_macro(&args);
        }
        Some(Ast::Command(CmdNode { name, args }))
    }

    /// Body of an optional `[..]` argument; the opening bracket is
    /// already consumed.
    fn parse_bracket_group(&mut self) -> Ast {
        let mut seq = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    let at = self.pos;
                    self.warn(
                        ParseWarningKind::MissingArgument,
                        "optional argument still open at end of input",
                        at,
                    );
                    break;
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                Some('}') => {
                    let at = self.pos;
                    self.bump();
                    self.warn(
                        ParseWarningKind::UnmatchedBrace,
                        "closing brace inside optional argument",
                        at,
                    );
                }
                _ => {
                    if let Some(node) = self.parse_token() {
                        seq.push(node);
                    }
                }
            }
        }
        Ast::Sequence(seq)
    }

    /// Record a `\newcommand{\name}[count]{body}` in the live arity map
    /// so later uses in the same pass parse with the declared arity.
    fn register_macro(&mut self, args: &[Arg]) {
        let name = args
            .first()
            .and_then(|a| a.node.as_ref())
            .and_then(command_name_of);
        let count = args
            .get(1)
            .and_then(|a| a.node.as_ref())
            .and_then(number_of)
            .and_then(|text| text.parse::<usize>().ok());
        if let Some(name) = name {
            let arity = match count {
                Some(n) => vec![true; n],
                None => Vec::new(),
            };
            self.arity.insert(name, arity);
        }
    }

    fn parse_environment(&mut self) -> Ast {
        let name = self.read_env_name();
        // The generic array environment uses the same cell grammar as
        // the matrix family.
        let is_matrix = name.contains("matrix") || name == "array";
        let rows = if is_matrix {
            if name.contains("xymatrix") {
                self.xymatrix += 1;
            }
            let rows = self.parse_matrix_body();
            if name.contains("xymatrix") {
                self.xymatrix -= 1;
            }
            rows
        } else {
            vec![vec![self.parse_environment_body()]]
        };
        Ast::Environment(EnvNode { name, rows })
    }

    /// The braced name after `\begin` or `\end`.
    fn read_env_name(&mut self) -> String {
        self.skip_whitespace();
        let mut name = String::new();
        if self.peek() == Some('{') {
            self.bump();
            while let Some(c) = self.peek() {
                if c == '}' {
                    self.bump();
                    break;
                }
                name.push(c);
                self.pos += 1;
            }
        }
        name
    }

    /// True when the cursor sits on an `\end` control word.
    fn at_env_end(&self) -> bool {
        if self.peek() != Some('\\') {
            return false;
        }
        if self.peek_at(1) != Some('e') || self.peek_at(2) != Some('n') || self.peek_at(3) != Some('d')
        {
            return false;
        }
        // "\ender" would be a different command
        !matches!(self.peek_at(4), Some(c) if c.is_ascii_alphabetic())
    }

    /// Consume `\end{name}`, discarding the name without checking it
    /// against the opener.
    fn consume_env_end(&mut self) {
        self.pos += 4; // "\end"
        let _ = self.read_env_name();
    }

    /// Body of a non-matrix environment, up to its `\end`.
    fn parse_environment_body(&mut self) -> Ast {
        let mut seq = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                let at = self.pos;
                self.warn(
                    ParseWarningKind::MissingArgument,
                    "environment still open at end of input",
                    at,
                );
                break;
            }
            if self.at_env_end() {
                self.consume_env_end();
                break;
            }
            if self.peek() == Some('}') {
                let at = self.pos;
                self.bump();
                self.warn(
                    ParseWarningKind::UnmatchedBrace,
                    "closing brace inside environment body",
                    at,
                );
                continue;
            }
            if let Some(node) = self.parse_token() {
                seq.push(node);
            }
        }
        Ast::Sequence(seq)
    }

    /// Cells separated by `&`, rows by a double escape, until `\end`.
    fn parse_matrix_body(&mut self) -> Vec<Vec<Ast>> {
        let mut rows: Vec<Vec<Ast>> = Vec::new();
        let mut row: Vec<Ast> = Vec::new();
        let mut cell: Vec<Ast> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                let at = self.pos;
                self.warn(
                    ParseWarningKind::MissingArgument,
                    "matrix environment still open at end of input",
                    at,
                );
                break;
            }
            if self.at_env_end() {
                self.consume_env_end();
                break;
            }
            match self.peek() {
                Some('&') => {
                    self.bump();
                    row.push(Ast::Sequence(std::mem::take(&mut cell)));
                }
                Some('\\') if self.peek_at(1) == Some('\\') => {
                    self.pos += 2;
                    row.push(Ast::Sequence(std::mem::take(&mut cell)));
                    rows.push(std::mem::take(&mut row));
                }
                Some('*') if self.xymatrix > 0 => {
                    let node = self.parse_decoration();
                    cell.push(node);
                }
                Some('}') => {
                    let at = self.pos;
                    self.bump();
                    self.warn(
                        ParseWarningKind::UnmatchedBrace,
                        "closing brace between matrix cells",
                        at,
                    );
                }
                _ => {
                    if let Some(node) = self.parse_token() {
                        cell.push(node);
                    }
                }
            }
        }
        if !cell.is_empty() || !row.is_empty() {
            row.push(Ast::Sequence(cell));
            rows.push(row);
        }
        rows
    }

    /// Cell decoration: `*` then an optional `+`/`-` size run, an
    /// optional `[o]` circularity marker, an optional bracketed style
    /// string, then the decorated token.
    ///
    /// Encoded as a `*` command: size, `o` marker, style, wrapped cell.
    fn parse_decoration(&mut self) -> Ast {
        self.bump(); // '*'
        let mut size: i32 = 0;
        while let Some(c) = self.peek() {
            match c {
                '+' => {
                    size += 1;
                    self.pos += 1;
                }
                '-' => {
                    size -= 1;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let circular = if self.peek() == Some('[')
            && self.peek_at(1) == Some('o')
            && self.peek_at(2) == Some(']')
        {
            self.pos += 3;
            true
        } else {
            false
        };
        let style = if self.peek() == Some('[') {
            self.bump();
            Some(self.read_until(']'))
        } else {
            None
        };
        let wrapped = self.parse_token();
        Ast::Command(CmdNode {
            name: "*".to_string(),
            args: vec![
                Arg::mandatory(Some(Ast::Number(size.to_string()))),
                Arg::optional(circular.then(|| Ast::Symbol("o".to_string()))),
                Arg::optional(style.map(Ast::Symbol)),
                Arg::mandatory(wrapped),
            ],
        })
    }

    /// Arrow production inside an xymatrix: `\ar` with optional
    /// `@`-modifiers (multiplicity digit, braced style, angled fan-out
    /// shift), a bracketed direction, and an optional positioned label.
    ///
    /// Encoded as an `ar` command: multiplicity, style, direction,
    /// label position, label.
    fn parse_arrow(&mut self) -> Ast {
        let mut multiplicity: Option<String> = None;
        let mut style: Option<String> = None;
        while self.peek() == Some('@') {
            self.bump();
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                multiplicity = Some(self.bump().unwrap().to_string());
            }
            match self.peek() {
                Some('{') => {
                    self.bump();
                    style = Some(self.read_until('}'));
                }
                // Fan-out shift is a rendering hint only.
                Some('<') => {
                    self.bump();
                    let _ = self.read_until('>');
                }
                _ => {}
            }
        }
        let direction = if self.peek() == Some('[') {
            self.bump();
            Some(self.read_until(']'))
        } else {
            let at = self.pos;
            self.warn(
                ParseWarningKind::MissingArgument,
                "arrow without a direction",
                at,
            );
            None
        };
        let (marker, label) = match self.peek() {
            Some(m @ ('^' | '_' | '|')) => {
                self.bump();
                (Some(m.to_string()), self.parse_token())
            }
            _ => (None, None),
        };
        Ast::Command(CmdNode {
            name: "ar".to_string(),
            args: vec![
                Arg::optional(multiplicity.map(Ast::Number)),
                Arg::optional(style.map(Ast::Symbol)),
                Arg::mandatory(direction.map(Ast::Symbol)),
                Arg::optional(marker.map(Ast::Symbol)),
                Arg::optional(label),
            ],
        })
    }

    /// Consume characters up to and including `close`, returning the
    /// contents.
    fn read_until(&mut self, close: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == close {
                return out;
            }
            out.push(c);
        }
        let at = self.pos;
        self.warn(
            ParseWarningKind::MissingArgument,
            &format!("expected '{}' before end of input", close),
            at,
        );
        out
    }
}

/// Dig the command or symbol name out of a (possibly wrapped) node.
fn command_name_of(node: &Ast) -> Option<String> {
    match node {
        Ast::Command(cmd) => Some(cmd.name.clone()),
        Ast::Symbol(s) => Some(s.clone()),
        Ast::Sequence(items) if items.len() == 1 => command_name_of(&items[0]),
        _ => None,
    }
}

/// Dig the number text out of a (possibly wrapped) node.
fn number_of(node: &Ast) -> Option<String> {
    match node {
        Ast::Number(text) => Some(text.clone()),
        Ast::Sequence(items) if items.len() == 1 => number_of(&items[0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(text: &str) -> Ast {
        let outcome = parse(text);
        match outcome.ast {
            Ast::Sequence(mut items) => {
                assert_eq!(items.len(), 1, "expected one node in {:?}", items);
                items.remove(0)
            }
            other => other,
        }
    }

    #[test]
    fn test_frac_command() {
        let node = parse_one(r"\frac{1}{2}");
        let cmd = node.as_command().unwrap();
        assert_eq!(cmd.name, "frac");
        assert_eq!(cmd.args.len(), 2);
        assert_eq!(
            cmd.args[0].node,
            Some(Ast::Sequence(vec![Ast::Number("1".into())]))
        );
    }

    #[test]
    fn test_missing_brace_is_calm() {
        let outcome = parse(r"\frac{1}{2");
        let seq = outcome.ast.as_sequence().unwrap();
        assert_eq!(seq.len(), 1);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == crate::utils::error::ParseWarningKind::UnmatchedBrace));
    }

    #[test]
    fn test_superscript_takes_one_token() {
        let outcome = parse(r"x^2y");
        let seq = outcome.ast.as_sequence().unwrap();
        assert_eq!(seq.len(), 3);
        let cmd = seq[1].as_command().unwrap();
        assert_eq!(cmd.name, "^");
        assert_eq!(cmd.args[0].node, Some(Ast::Number("2".into())));
    }

    #[test]
    fn test_macro_parameter() {
        let node = parse_one("#12");
        let cmd = node.as_command().unwrap();
        assert_eq!(cmd.name, "#");
        assert_eq!(cmd.args[0].node, Some(Ast::Number("12".into())));
    }

    #[test]
    fn test_decimal_number() {
        let node = parse_one("3.25");
        assert_eq!(node, Ast::Number("3.25".into()));
    }

    #[test]
    fn test_newcommand_registers_arity() {
        let outcome = parse(r"\newcommand{\pair}[2]{(#1,#2)} \pair{a}{b}");
        let seq = outcome.ast.as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        let call = seq[1].as_command().unwrap();
        assert_eq!(call.name, "pair");
        assert_eq!(call.args.len(), 2);
        assert!(call.args.iter().all(|a| a.node.is_some()));
    }

    #[test]
    fn test_unknown_command_zero_args() {
        let outcome = parse(r"\mystery{x}");
        let seq = outcome.ast.as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].as_command().unwrap().name, "mystery");
        // The braced group is an independent sequence, not an argument.
        assert!(seq[1].as_sequence().is_some());
    }

    #[test]
    fn test_matrix_environment_cells() {
        let node = parse_one(r"\begin{pmatrix} 1 & 2 \\ 3 & 4 \\ \end{pmatrix}");
        let env = node.as_environment().unwrap();
        assert_eq!(env.name, "pmatrix");
        assert_eq!(env.rows.len(), 2);
        assert_eq!(env.rows[0].len(), 2);
        assert_eq!(
            env.rows[1][1],
            Ast::Sequence(vec![Ast::Number("4".into())])
        );
    }

    #[test]
    fn test_end_name_not_validated() {
        let node = parse_one(r"\begin{pmatrix} 1 \\ \end{bmatrix}");
        let env = node.as_environment().unwrap();
        assert_eq!(env.name, "pmatrix");
        assert_eq!(env.rows.len(), 1);
    }

    #[test]
    fn test_infer_optional_argument() {
        let node = parse_one(r"\infer[r]{A}{B}");
        let cmd = node.as_command().unwrap();
        assert_eq!(cmd.args.len(), 3);
        assert!(cmd.args[0].optional);
        assert!(cmd.args[0].node.is_some());
    }

    #[test]
    fn test_xymatrix_arrow_production() {
        let node = parse_one(r"\begin{xymatrix} A \ar@2{->}[rd]^{f} & B \\ C & D \\ \end{xymatrix}");
        let env = node.as_environment().unwrap();
        let cell = env.rows[0][0].as_sequence().unwrap();
        assert_eq!(cell.len(), 2);
        let arrow = cell[1].as_command().unwrap();
        assert_eq!(arrow.name, "ar");
        assert_eq!(arrow.args[0].node, Some(Ast::Number("2".into())));
        assert_eq!(arrow.args[1].node, Some(Ast::Symbol("->".into())));
        assert_eq!(arrow.args[2].node, Some(Ast::Symbol("rd".into())));
        assert_eq!(arrow.args[3].node, Some(Ast::Symbol("^".into())));
    }

    #[test]
    fn test_xymatrix_decoration_production() {
        let node = parse_one(r"\begin{xymatrix} *++[o][F-]{A} & B \\ \end{xymatrix}");
        let env = node.as_environment().unwrap();
        let cell = env.rows[0][0].as_sequence().unwrap();
        let deco = cell[0].as_command().unwrap();
        assert_eq!(deco.name, "*");
        assert_eq!(deco.args[0].node, Some(Ast::Number("2".into())));
        assert_eq!(deco.args[1].node, Some(Ast::Symbol("o".into())));
        assert_eq!(deco.args[2].node, Some(Ast::Symbol("F-".into())));
        assert!(deco.args[3].node.is_some());
    }

    #[test]
    fn test_line_break_symbol() {
        let outcome = parse("a \\\\ b");
        let seq = outcome.ast.as_sequence().unwrap();
        assert_eq!(seq[1], Ast::Symbol("\n".into()));
    }

    #[test]
    fn test_depth_ceiling_degrades() {
        let deep = "{".repeat(200);
        let outcome = parse(&deep);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == crate::utils::error::ParseWarningKind::DepthCeiling));
    }
}
