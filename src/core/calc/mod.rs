//! Calculator: reduces a flat token sequence to a single value with
//! operator-precedence climbing, then materializes the value back into
//! a token.
//!
//! Failures are typed and leave the input untouched; the caller decides
//! whether to splice the returned token over the evaluated span.

mod ops;
mod value;

pub use value::{MatrixValue, Rational, Value};

use crate::core::tree::{Formula, Matrix, Structure, Token};
use crate::utils::error::{EvalFailure, EvalResult};

/// Binary operators recognized as symbol tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Priority of an infix operator symbol.
fn infix_op(text: &str) -> Option<(u8, InfixOp)> {
    match text {
        "+" => Some((1, InfixOp::Add)),
        "-" => Some((1, InfixOp::Sub)),
        "*" | "×" | "⋅" | "∗" => Some((2, InfixOp::Mul)),
        "/" | "÷" => Some((2, InfixOp::Div)),
        "^" => Some((4, InfixOp::Pow)),
        _ => None,
    }
}

/// The closing partner of a bracket-open operator symbol.
fn close_of(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

fn is_close_bracket(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

/// Evaluate a token sequence to a single replacement token.
pub fn evaluate(tokens: &[Token]) -> EvalResult<Token> {
    let value = eval_full(tokens)?;
    Ok(materialize(&value))
}

/// Evaluate a token sequence to a value, requiring full consumption.
fn eval_full(tokens: &[Token]) -> EvalResult<Value> {
    if tokens.is_empty() {
        return Err(EvalFailure::NoValue);
    }
    let mut pos = 0;
    let value = eval_expr(tokens, &mut pos, 0)?;
    if pos != tokens.len() {
        return Err(EvalFailure::NoValue);
    }
    Ok(value)
}

/// Precedence-climbing evaluation of the sub-sequence at `pos`, bounded
/// by `min_prec`.
fn eval_expr(tokens: &[Token], pos: &mut usize, min_prec: u8) -> EvalResult<Value> {
    let first = tokens.get(*pos).ok_or(EvalFailure::NoValue)?;

    // Prefix position: unary sign, bracket open, or a leaf.
    let mut acc = match first.symbol_text() {
        Some("+") => {
            *pos += 1;
            eval_expr(tokens, pos, 3)?
        }
        Some("-") => {
            *pos += 1;
            ops::neg(eval_expr(tokens, pos, 3)?)?
        }
        Some(open) if close_of(open).is_some() => {
            let close = close_of(open).unwrap();
            *pos += 1;
            let inner = eval_expr(tokens, pos, 0)?;
            match tokens.get(*pos) {
                Some(t) if t.is_symbol(close) => *pos += 1,
                _ => return Err(EvalFailure::NoValue),
            }
            inner
        }
        _ => {
            let v = eval_leaf(first)?;
            *pos += 1;
            v
        }
    };

    loop {
        let Some(next) = tokens.get(*pos) else { break };

        if let Some(text) = next.symbol_text() {
            if is_close_bracket(text) {
                break;
            }
            if text == "!" {
                if 5 < min_prec {
                    break;
                }
                acc = ops::factorial(acc)?;
                *pos += 1;
                continue;
            }
            if let Some((prec, op)) = infix_op(text) {
                if prec < min_prec {
                    break;
                }
                *pos += 1;
                // `^` keeps its own priority on the right so exponent
                // chains associate rightward; the rest climb.
                let rhs_min = if op == InfixOp::Pow { prec } else { prec + 1 };
                let rhs = eval_expr(tokens, pos, rhs_min)?;
                acc = apply(op, acc, rhs)?;
                continue;
            }
        }

        // A structural superscript supplies an exponent just like a
        // `^` token would.
        if let Token::Structure(Structure::Power { arg }) = next {
            if 4 < min_prec {
                break;
            }
            let exp = eval_formula(arg)?;
            acc = ops::pow(acc, exp)?;
            *pos += 1;
            continue;
        }

        // Adjacent non-operator tokens multiply implicitly.
        if 2 < min_prec {
            break;
        }
        let rhs = eval_expr(tokens, pos, 3)?;
        acc = ops::mul(acc, rhs)?;
    }
    Ok(acc)
}

fn apply(op: InfixOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match op {
        InfixOp::Add => ops::add(lhs, rhs),
        InfixOp::Sub => ops::sub(lhs, rhs),
        InfixOp::Mul => ops::mul(lhs, rhs),
        InfixOp::Div => ops::div(lhs, rhs),
        InfixOp::Pow => ops::pow(lhs, rhs),
    }
}

/// Evaluate a single non-operator token.
fn eval_leaf(token: &Token) -> EvalResult<Value> {
    match token {
        Token::Number(n) => parse_number(&n.text).map(Value::Rational),
        Token::Symbol(s) => {
            if s.variable {
                // Free variables never reduce.
                Err(EvalFailure::NoValue)
            } else {
                Err(EvalFailure::unknown(s.text.as_str()))
            }
        }
        Token::Structure(Structure::Matrix(m)) => eval_matrix(m).map(Value::Matrix),
        Token::Structure(Structure::Frac { num, den }) => {
            ops::div(eval_formula(num)?, eval_formula(den)?)
        }
        Token::Structure(_) => Err(EvalFailure::NoValue),
        Token::Formula(f) => eval_formula(f),
    }
}

/// Evaluate a matrix token cell by cell. Any cell failure fails the
/// whole matrix.
fn eval_matrix(m: &Matrix) -> EvalResult<MatrixValue> {
    let mut cells = Vec::with_capacity(m.rows() * m.cols());
    for cell in m.cells() {
        match eval_full(&cell.tokens)? {
            Value::Rational(r) => cells.push(r),
            Value::Matrix(_) => {
                return Err(EvalFailure::type_mismatch("matrix inside a matrix cell"))
            }
        }
    }
    Ok(MatrixValue::new(m.rows(), m.cols(), cells))
}

/// Evaluate a formula, honoring its bracket glyphs: radical, absolute
/// value, floor and ceiling apply their operation to the inner value.
fn eval_formula(f: &Formula) -> EvalResult<Value> {
    match (f.prefix, f.suffix) {
        (Some('√'), _) => ops::sqrt(eval_full(&f.tokens)?),
        (Some('|'), Some('|')) | (Some('‖'), Some('‖')) => ops::abs(eval_full(&f.tokens)?),
        (Some('⌊'), Some('⌋')) => ops::floor(eval_full(&f.tokens)?),
        (Some('⌈'), Some('⌉')) => ops::ceil(eval_full(&f.tokens)?),
        _ => eval_full(&f.tokens),
    }
}

/// Interpret a literal digit string. A decimal point makes the value
/// approximate, with the implied power of ten as denominator.
fn parse_number(text: &str) -> EvalResult<Rational> {
    match text.split_once('.') {
        None => text
            .parse::<i64>()
            .map(Rational::int)
            .map_err(|_| EvalFailure::Overflow),
        Some((int_part, frac_part)) => {
            let digits: String = [int_part, frac_part].concat();
            let num = digits.parse::<i64>().map_err(|_| EvalFailure::Overflow)?;
            let den = 10i64
                .checked_pow(frac_part.len() as u32)
                .ok_or(EvalFailure::Overflow)?;
            Rational::new(num, den, true)
        }
    }
}

/// Turn a value back into a token: a plain number when the value is an
/// exact integer, a fraction structure for a non-unit exact fraction,
/// decimal text when approximate, and a matrix of the same, cell-wise.
pub fn materialize(value: &Value) -> Token {
    match value {
        Value::Rational(r) => materialize_rational(*r),
        Value::Matrix(m) => {
            let mut grid = Matrix::new(m.rows, m.cols);
            for i in 0..m.rows {
                for j in 0..m.cols {
                    let token = materialize_rational(m.cell(i, j));
                    grid.cell_mut(i, j).insert(0, token);
                }
            }
            Token::Structure(Structure::Matrix(grid))
        }
    }
}

fn materialize_rational(r: Rational) -> Token {
    if r.approx {
        return Token::number(r.decimal_text());
    }
    if r.den == 1 {
        return Token::number(r.num.to_string());
    }
    let mut s = Structure::frac();
    if let Structure::Frac { num, den } = &mut s {
        num.insert(0, Token::number(r.num.to_string()));
        den.insert(0, Token::number(r.den.to_string()));
    }
    Token::Structure(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Token {
        Token::number(text)
    }

    fn sym(text: &str) -> Token {
        Token::symbol(text)
    }

    fn eval_str_tokens(tokens: &[Token]) -> EvalResult<Token> {
        evaluate(tokens)
    }

    fn frac_of(token: &Token) -> (String, String) {
        match token {
            Token::Structure(Structure::Frac { num, den }) => {
                let n = match &num.tokens[0] {
                    Token::Number(n) => n.text.clone(),
                    other => panic!("unexpected numerator {:?}", other),
                };
                let d = match &den.tokens[0] {
                    Token::Number(n) => n.text.clone(),
                    other => panic!("unexpected denominator {:?}", other),
                };
                (n, d)
            }
            other => panic!("expected a fraction, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_fraction_sum() {
        let tokens = [num("1"), sym("/"), num("2"), sym("+"), num("1"), sym("/"), num("3")];
        let result = eval_str_tokens(&tokens).unwrap();
        assert_eq!(frac_of(&result), ("5".into(), "6".into()));
    }

    #[test]
    fn test_exact_power() {
        let tokens = [num("2"), sym("^"), num("3")];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("8"));
    }

    #[test]
    fn test_negative_exponent_inverts() {
        let mut exponent = Formula::with_tokens(vec![sym("-"), num("1")]);
        exponent.set_brackets('(');
        let tokens = [num("2"), sym("^"), Token::Formula(exponent)];
        let result = eval_str_tokens(&tokens).unwrap();
        assert_eq!(frac_of(&result), ("1".into(), "2".into()));
    }

    #[test]
    fn test_structural_superscript_as_exponent() {
        let mut power = Structure::power();
        if let Structure::Power { arg } = &mut power {
            arg.insert(0, num("3"));
        }
        let tokens = [num("2"), Token::Structure(power)];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("8"));
    }

    #[test]
    fn test_implicit_multiplication() {
        let mut group = Formula::with_tokens(vec![num("3"), sym("+"), num("4")]);
        group.set_brackets('(');
        let tokens = [num("2"), Token::Formula(group)];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("14"));
    }

    #[test]
    fn test_factorial_suffix() {
        let tokens = [num("4"), sym("!")];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("24"));

        let tokens = [num("2.5"), sym("!")];
        assert_eq!(
            eval_str_tokens(&tokens),
            Err(EvalFailure::FactorialDomain)
        );

        let mut neg = Formula::with_tokens(vec![sym("-"), num("1")]);
        neg.set_brackets('(');
        let tokens = [Token::Formula(neg), sym("!")];
        assert_eq!(
            eval_str_tokens(&tokens),
            Err(EvalFailure::FactorialDomain)
        );
    }

    #[test]
    fn test_decimal_literal_is_approximate() {
        let tokens = [num("0.5"), sym("+"), num("0.25")];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("0.75"));
    }

    #[test]
    fn test_radical_formula() {
        let mut rad = Formula::with_tokens(vec![num("4")]);
        rad.set_brackets('√');
        let tokens = [Token::Formula(rad)];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("2"));
    }

    #[test]
    fn test_absolute_value_brackets() {
        let mut absf = Formula::with_tokens(vec![sym("-"), num("3")]);
        absf.set_brackets('|');
        let tokens = [Token::Formula(absf)];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("3"));
    }

    #[test]
    fn test_floor_ceiling_brackets() {
        let mut fl = Formula::with_tokens(vec![num("7"), sym("/"), num("2")]);
        fl.set_brackets('⌊');
        assert_eq!(eval_str_tokens(&[Token::Formula(fl)]).unwrap(), num("3"));

        let mut ce = Formula::with_tokens(vec![num("7"), sym("/"), num("2")]);
        ce.set_brackets('⌈');
        assert_eq!(eval_str_tokens(&[Token::Formula(ce)]).unwrap(), num("4"));
    }

    #[test]
    fn test_variables_never_reduce() {
        let tokens = [Token::variable("x"), sym("+"), num("1")];
        assert_eq!(eval_str_tokens(&tokens), Err(EvalFailure::NoValue));
    }

    #[test]
    fn test_matrix_sum_and_guard() {
        let mut a = Matrix::new(1, 2);
        a.cell_mut(0, 0).insert(0, num("1"));
        a.cell_mut(0, 1).insert(0, num("2"));
        let mut b = Matrix::new(1, 2);
        b.cell_mut(0, 0).insert(0, num("3"));
        b.cell_mut(0, 1).insert(0, num("4"));
        let tokens = [
            Token::Structure(Structure::Matrix(a.clone())),
            sym("+"),
            Token::Structure(Structure::Matrix(b)),
        ];
        let result = eval_str_tokens(&tokens).unwrap();
        match result {
            Token::Structure(Structure::Matrix(m)) => {
                assert_eq!(m.cell(0, 0).tokens[0], num("4"));
                assert_eq!(m.cell(0, 1).tokens[0], num("6"));
            }
            other => panic!("expected a matrix, got {:?}", other),
        }

        let mut tall = Matrix::new(2, 1);
        tall.cell_mut(0, 0).insert(0, num("1"));
        tall.cell_mut(1, 0).insert(0, num("2"));
        let tokens = [
            Token::Structure(Structure::Matrix(a)),
            sym("+"),
            Token::Structure(Structure::Matrix(tall)),
        ];
        assert!(matches!(
            eval_str_tokens(&tokens),
            Err(EvalFailure::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_unary_minus_binds_below_power() {
        let tokens = [sym("-"), num("2"), sym("^"), num("2")];
        assert_eq!(eval_str_tokens(&tokens).unwrap(), num("-4"));
    }

    #[test]
    fn test_division_by_zero() {
        let tokens = [num("1"), sym("/"), num("0")];
        assert_eq!(eval_str_tokens(&tokens), Err(EvalFailure::DivisionByZero));
    }
}
