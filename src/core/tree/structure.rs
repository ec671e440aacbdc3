//! Structural nodes: fixed-arity containers of child formulas.

use super::{Diagram, Formula, Matrix};

/// A structural node, tagged by kind. Each variant owns its child
/// formula slots directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    /// Fraction: numerator over denominator.
    Frac { num: Formula, den: Formula },
    /// Inference rule: premise over conclusion, with a rule label.
    Infer {
        premise: Formula,
        conclusion: Formula,
        rule: Formula,
    },
    /// Superscript.
    Power { arg: Formula },
    /// Subscript.
    Index { arg: Formula },
    /// Big operator with lower and upper bounds.
    BigOpr {
        opr: String,
        lower: Formula,
        upper: Formula,
    },
    /// Accent over or under its argument.
    Accent {
        glyph: String,
        below: bool,
        arg: Formula,
    },
    /// Grid of formula cells.
    Matrix(Matrix),
    /// Matrix with arrows and cell decorations.
    Diagram(Diagram),
}

impl Structure {
    pub fn frac() -> Self {
        Structure::Frac {
            num: Formula::new(),
            den: Formula::new(),
        }
    }

    pub fn infer() -> Self {
        Structure::Infer {
            premise: Formula::new(),
            conclusion: Formula::new(),
            rule: Formula::new(),
        }
    }

    pub fn power() -> Self {
        Structure::Power {
            arg: Formula::new(),
        }
    }

    pub fn index() -> Self {
        Structure::Index {
            arg: Formula::new(),
        }
    }

    pub fn big_opr(opr: impl Into<String>) -> Self {
        Structure::BigOpr {
            opr: opr.into(),
            lower: Formula::new(),
            upper: Formula::new(),
        }
    }

    pub fn accent(glyph: impl Into<String>, below: bool) -> Self {
        Structure::Accent {
            glyph: glyph.into(),
            below,
            arg: Formula::new(),
        }
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Structure::Matrix(Matrix::new(rows, cols))
    }

    pub fn diagram(rows: usize, cols: usize) -> Self {
        Structure::Diagram(Diagram::new(rows, cols))
    }

    /// The child formula slots in fixed order.
    pub fn slots(&self) -> Vec<&Formula> {
        match self {
            Structure::Frac { num, den } => vec![num, den],
            Structure::Infer {
                premise,
                conclusion,
                rule,
            } => vec![premise, conclusion, rule],
            Structure::Power { arg } | Structure::Index { arg } => vec![arg],
            Structure::BigOpr { lower, upper, .. } => vec![lower, upper],
            Structure::Accent { arg, .. } => vec![arg],
            Structure::Matrix(m) => m.cells().iter().collect(),
            Structure::Diagram(d) => d.matrix().cells().iter().collect(),
        }
    }

    /// Mutable variant of [`slots`](Structure::slots).
    pub fn slots_mut(&mut self) -> Vec<&mut Formula> {
        match self {
            Structure::Frac { num, den } => vec![num, den],
            Structure::Infer {
                premise,
                conclusion,
                rule,
            } => vec![premise, conclusion, rule],
            Structure::Power { arg } | Structure::Index { arg } => vec![arg],
            Structure::BigOpr { lower, upper, .. } => vec![lower, upper],
            Structure::Accent { arg, .. } => vec![arg],
            Structure::Matrix(m) => m.cells_mut().iter_mut().collect(),
            Structure::Diagram(d) => d.matrix_mut().cells_mut().iter_mut().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_arity() {
        assert_eq!(Structure::frac().slots().len(), 2);
        assert_eq!(Structure::infer().slots().len(), 3);
        assert_eq!(Structure::power().slots().len(), 1);
        assert_eq!(Structure::big_opr("∑").slots().len(), 2);
        assert_eq!(Structure::matrix(2, 3).slots().len(), 6);
    }
}
