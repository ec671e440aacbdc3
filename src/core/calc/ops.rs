//! Operations on values.
//!
//! Each operation takes owned values and returns a typed failure when
//! the operands do not fit; nothing here panics.

use super::value::{MatrixValue, Rational, Value};
use crate::utils::error::{EvalFailure, EvalResult};

fn checked_mul(a: i64, b: i64) -> EvalResult<i64> {
    a.checked_mul(b).ok_or(EvalFailure::Overflow)
}

fn checked_add(a: i64, b: i64) -> EvalResult<i64> {
    a.checked_add(b).ok_or(EvalFailure::Overflow)
}

fn rat_add(a: Rational, b: Rational) -> EvalResult<Rational> {
    let num = checked_add(checked_mul(a.num, b.den)?, checked_mul(b.num, a.den)?)?;
    Rational::new(num, checked_mul(a.den, b.den)?, a.approx || b.approx)
}

fn rat_mul(a: Rational, b: Rational) -> EvalResult<Rational> {
    Rational::new(
        checked_mul(a.num, b.num)?,
        checked_mul(a.den, b.den)?,
        a.approx || b.approx,
    )
}

fn rat_neg(a: Rational) -> Rational {
    Rational {
        num: -a.num,
        ..a
    }
}

fn rat_div(a: Rational, b: Rational) -> EvalResult<Rational> {
    if b.is_zero() {
        return Err(EvalFailure::DivisionByZero);
    }
    Rational::new(
        checked_mul(a.num, b.den)?,
        checked_mul(a.den, b.num)?,
        a.approx || b.approx,
    )
}

/// Add two values.
pub fn add(lhs: Value, rhs: Value) -> EvalResult<Value> {
    use Value::*;
    match (lhs, rhs) {
        (Rational(a), Rational(b)) => Ok(Rational(rat_add(a, b)?)),
        (Matrix(a), Matrix(b)) => Ok(Matrix(mat_zip(a, b, rat_add)?)),
        (a, b) => Err(EvalFailure::type_mismatch(format!(
            "cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Subtract two values.
pub fn sub(lhs: Value, rhs: Value) -> EvalResult<Value> {
    use Value::*;
    match (lhs, rhs) {
        (Rational(a), Rational(b)) => Ok(Rational(rat_add(a, rat_neg(b))?)),
        (Matrix(a), Matrix(b)) => {
            Ok(Matrix(mat_zip(a, b, |x, y| rat_add(x, rat_neg(y)))?))
        }
        (a, b) => Err(EvalFailure::type_mismatch(format!(
            "cannot subtract {} from {}",
            b.type_name(),
            a.type_name()
        ))),
    }
}

/// Negate a value. Matrices negate element-wise as `0 - x`.
pub fn neg(value: Value) -> EvalResult<Value> {
    use Value::*;
    match value {
        Rational(a) => Ok(Rational(rat_neg(a))),
        Matrix(m) => {
            let cells = m.cells.iter().map(|&c| rat_neg(c)).collect();
            Ok(Matrix(MatrixValue::new(m.rows, m.cols, cells)))
        }
    }
}

/// Multiply two values. A rational scales a matrix cell-wise; two
/// matrices compose when the inner dimensions agree.
pub fn mul(lhs: Value, rhs: Value) -> EvalResult<Value> {
    use Value::*;
    match (lhs, rhs) {
        (Rational(a), Rational(b)) => Ok(Rational(rat_mul(a, b)?)),
        (Rational(s), Matrix(m)) | (Matrix(m), Rational(s)) => {
            let cells = m
                .cells
                .iter()
                .map(|&c| rat_mul(s, c))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Matrix(MatrixValue::new(m.rows, m.cols, cells)))
        }
        (Matrix(a), Matrix(b)) => Ok(Matrix(mat_mul(&a, &b)?)),
    }
}

/// Divide two values. Only rationals divide.
pub fn div(lhs: Value, rhs: Value) -> EvalResult<Value> {
    use Value::*;
    match (lhs, rhs) {
        (Rational(a), Rational(b)) => Ok(Rational(rat_div(a, b)?)),
        (a, b) => Err(EvalFailure::type_mismatch(format!(
            "cannot divide {} by {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Raise `base` to `exp`.
pub fn pow(base: Value, exp: Value) -> EvalResult<Value> {
    use Value::*;
    match (base, exp) {
        (Rational(b), Rational(e)) => {
            if e.is_exact_integer() {
                Ok(Rational(rat_pow_int(b, e.num)?))
            } else {
                let f = b.to_f64().powf(e.to_f64());
                if !f.is_finite() {
                    return Err(EvalFailure::domain("power has no real value"));
                }
                Ok(Rational(super::value::Rational::from_f64_approx(f)?))
            }
        }
        (Matrix(m), Rational(e)) => {
            if !e.is_exact_integer() || e.num < 0 {
                return Err(EvalFailure::type_mismatch(
                    "matrix exponent must be an exact nonnegative integer",
                ));
            }
            if m.rows != m.cols {
                return Err(EvalFailure::dimension((m.rows, m.cols), (m.rows, m.cols)));
            }
            let mut acc = mat_identity(m.rows);
            for _ in 0..e.num {
                acc = mat_mul(&acc, &m)?;
            }
            Ok(Matrix(acc))
        }
        (a, b) => Err(EvalFailure::type_mismatch(format!(
            "cannot raise {} to {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Integer power with exact arithmetic; a negative exponent inverts
/// numerator and denominator.
fn rat_pow_int(base: Rational, exp: i64) -> EvalResult<Rational> {
    let mut acc = Rational {
        num: 1,
        den: 1,
        approx: base.approx,
    };
    for _ in 0..exp.unsigned_abs() {
        acc = rat_mul(acc, base)?;
    }
    if exp < 0 {
        if acc.is_zero() {
            return Err(EvalFailure::DivisionByZero);
        }
        acc = Rational::new(acc.den, acc.num, acc.approx)?;
    }
    Ok(acc)
}

/// Factorial. Exact nonnegative integers only.
pub fn factorial(value: Value) -> EvalResult<Value> {
    let r = match value {
        Value::Rational(r) => r,
        Value::Matrix(_) => return Err(EvalFailure::FactorialDomain),
    };
    if !r.is_exact_integer() || r.num < 0 {
        return Err(EvalFailure::FactorialDomain);
    }
    let mut acc: i64 = 1;
    for k in 2..=r.num {
        acc = checked_mul(acc, k)?;
    }
    Ok(Value::int(acc))
}

/// Square root. Always approximate.
pub fn sqrt(value: Value) -> EvalResult<Value> {
    let r = match value {
        Value::Rational(r) => r,
        Value::Matrix(_) => {
            return Err(EvalFailure::type_mismatch("square root of a matrix"))
        }
    };
    let f = r.to_f64();
    if f < 0.0 {
        return Err(EvalFailure::domain("square root of a negative value"));
    }
    Ok(Value::Rational(Rational::from_f64_approx(f.sqrt())?))
}

/// Absolute value. Numeric only, exact through the representation.
pub fn abs(value: Value) -> EvalResult<Value> {
    match value {
        Value::Rational(r) => Ok(Value::Rational(Rational {
            num: r.num.abs(),
            ..r
        })),
        Value::Matrix(_) => Err(EvalFailure::type_mismatch("absolute value of a matrix")),
    }
}

/// Floor to an integer, keeping the approximateness flag.
pub fn floor(value: Value) -> EvalResult<Value> {
    match value {
        Value::Rational(r) => Ok(Value::Rational(Rational {
            num: r.num.div_euclid(r.den),
            den: 1,
            approx: r.approx,
        })),
        Value::Matrix(_) => Err(EvalFailure::type_mismatch("floor of a matrix")),
    }
}

/// Ceiling to an integer, keeping the approximateness flag.
pub fn ceil(value: Value) -> EvalResult<Value> {
    match value {
        Value::Rational(r) => Ok(Value::Rational(Rational {
            num: -(-r.num).div_euclid(r.den),
            den: 1,
            approx: r.approx,
        })),
        Value::Matrix(_) => Err(EvalFailure::type_mismatch("ceiling of a matrix")),
    }
}

/// Element-wise combination of two same-shaped matrices.
fn mat_zip(
    a: MatrixValue,
    b: MatrixValue,
    f: impl Fn(Rational, Rational) -> EvalResult<Rational>,
) -> EvalResult<MatrixValue> {
    if a.rows != b.rows || a.cols != b.cols {
        return Err(EvalFailure::dimension((a.rows, a.cols), (b.rows, b.cols)));
    }
    let cells = a
        .cells
        .iter()
        .zip(&b.cells)
        .map(|(&x, &y)| f(x, y))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(MatrixValue::new(a.rows, a.cols, cells))
}

/// Row-by-column matrix product.
fn mat_mul(a: &MatrixValue, b: &MatrixValue) -> EvalResult<MatrixValue> {
    if a.cols != b.rows {
        return Err(EvalFailure::dimension((a.rows, a.cols), (b.rows, b.cols)));
    }
    let mut cells = Vec::with_capacity(a.rows * b.cols);
    for i in 0..a.rows {
        for j in 0..b.cols {
            let mut acc = Rational::int(0);
            for k in 0..a.cols {
                acc = rat_add(acc, rat_mul(a.cell(i, k), b.cell(k, j))?)?;
            }
            cells.push(acc);
        }
    }
    Ok(MatrixValue::new(a.rows, b.cols, cells))
}

fn mat_identity(n: usize) -> MatrixValue {
    let mut cells = vec![Rational::int(0); n * n];
    for i in 0..n {
        cells[i * n + i] = Rational::int(1);
    }
    MatrixValue::new(n, n, cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(num: i64, den: i64) -> Value {
        Value::Rational(Rational::new(num, den, false).unwrap())
    }

    fn mat(rows: usize, cols: usize, nums: &[i64]) -> Value {
        Value::Matrix(MatrixValue::new(
            rows,
            cols,
            nums.iter().map(|&n| Rational::int(n)).collect(),
        ))
    }

    #[test]
    fn test_exact_fraction_addition() {
        assert_eq!(add(rat(1, 2), rat(1, 3)).unwrap(), rat(5, 6));
    }

    #[test]
    fn test_integer_power_signs() {
        assert_eq!(pow(Value::int(2), Value::int(3)).unwrap(), Value::int(8));
        assert_eq!(pow(Value::int(2), Value::int(-1)).unwrap(), rat(1, 2));
    }

    #[test]
    fn test_fractional_power_is_approximate() {
        let v = pow(Value::int(2), rat(1, 2)).unwrap();
        match v {
            Value::Rational(r) => {
                assert!(r.approx);
                assert!((r.to_f64() - 1.4142135).abs() < 1e-6);
            }
            _ => panic!("expected a rational"),
        }
    }

    #[test]
    fn test_matrix_dimension_guard() {
        let a = mat(2, 3, &[1, 2, 3, 4, 5, 6]);
        let b = mat(4, 2, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(
            mul(a, b),
            Err(EvalFailure::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_matrix_product() {
        let a = mat(2, 2, &[1, 2, 3, 4]);
        let b = mat(2, 1, &[5, 6]);
        assert_eq!(mul(a, b).unwrap(), mat(2, 1, &[17, 39]));
    }

    #[test]
    fn test_matrix_power_repeats_product() {
        let a = mat(2, 2, &[1, 1, 0, 1]);
        assert_eq!(
            pow(a, Value::int(3)).unwrap(),
            mat(2, 2, &[1, 3, 0, 1])
        );
    }

    #[test]
    fn test_factorial_guards() {
        assert_eq!(factorial(Value::int(4)).unwrap(), Value::int(24));
        assert_eq!(factorial(Value::int(-1)), Err(EvalFailure::FactorialDomain));
        assert_eq!(
            factorial(Value::Rational(Rational::new(5, 2, true).unwrap())),
            Err(EvalFailure::FactorialDomain)
        );
    }

    #[test]
    fn test_floor_and_ceil_negatives() {
        assert_eq!(floor(rat(-7, 2)).unwrap(), Value::int(-4));
        assert_eq!(ceil(rat(-7, 2)).unwrap(), Value::int(-3));
    }
}
