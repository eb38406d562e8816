//! Expression evaluation over datums.
//!
//! Null propagates through arithmetic and comparisons; AND, OR and NOT use
//! three-valued logic.

use std::cmp::Ordering;

use quarry_core::{Column, DataType, Datum};
use quarry_sql::{BinaryOp, UnaryOp};

use crate::error::{EngineError, EngineResult};
use crate::plan::BoundExpr;

/// Evaluate `expr` against one input row.
pub(crate) fn eval(expr: &BoundExpr, row: &[Datum]) -> EngineResult<Datum> {
    match expr {
        BoundExpr::Literal(datum) => Ok(datum.clone()),
        BoundExpr::Column(idx) => row
            .get(*idx)
            .cloned()
            .ok_or_else(|| EngineError::internal(format!("column position {} out of range", idx))),
        BoundExpr::Binary(op, left, right) => {
            let l = eval(left, row)?;
            let r = eval(right, row)?;
            match op {
                BinaryOp::And => logic_and(&l, &r),
                BinaryOp::Or => logic_or(&l, &r),
                op if op.is_comparison() => compare(*op, &l, &r),
                op => arithmetic(*op, &l, &r),
            }
        }
        BoundExpr::Unary(UnaryOp::Not, operand) => {
            Ok(truth(&eval(operand, row)?, "NOT")?.map_or(Datum::Null, |b| Datum::Bool(!b)))
        }
        BoundExpr::Unary(UnaryOp::Neg, operand) => negate(eval(operand, row)?),
        BoundExpr::IsNull(operand, negated) => {
            let is_null = eval(operand, row)?.is_null();
            Ok(Datum::Bool(is_null != *negated))
        }
    }
}

/// Evaluate a filter predicate; only TRUE keeps the row.
pub(crate) fn eval_predicate(expr: &BoundExpr, row: &[Datum]) -> EngineResult<bool> {
    Ok(truth(&eval(expr, row)?, "WHERE")? == Some(true))
}

fn truth(datum: &Datum, context: &str) -> EngineResult<Option<bool>> {
    match datum {
        Datum::Null => Ok(None),
        Datum::Bool(b) => Ok(Some(*b)),
        other => Err(EngineError::datatype_mismatch(format!(
            "argument of {} must be type BOOLEAN, not {}",
            context,
            other.type_name()
        ))),
    }
}

fn logic_and(l: &Datum, r: &Datum) -> EngineResult<Datum> {
    Ok(match (truth(l, "AND")?, truth(r, "AND")?) {
        (Some(false), _) | (_, Some(false)) => Datum::Bool(false),
        (Some(true), Some(true)) => Datum::Bool(true),
        _ => Datum::Null,
    })
}

fn logic_or(l: &Datum, r: &Datum) -> EngineResult<Datum> {
    Ok(match (truth(l, "OR")?, truth(r, "OR")?) {
        (Some(true), _) | (_, Some(true)) => Datum::Bool(true),
        (Some(false), Some(false)) => Datum::Bool(false),
        _ => Datum::Null,
    })
}

fn out_of_range() -> EngineError {
    EngineError::datatype_mismatch("integer out of range")
}

fn operator_mismatch(op: BinaryOp, l: &Datum, r: &Datum) -> EngineError {
    EngineError::datatype_mismatch(format!(
        "operator {:?} does not apply to {} and {}",
        op,
        l.type_name(),
        r.type_name()
    ))
}

fn arithmetic(op: BinaryOp, l: &Datum, r: &Datum) -> EngineResult<Datum> {
    if l.is_null() || r.is_null() {
        return Ok(Datum::Null);
    }
    match (l, r) {
        (Datum::Int4(a), Datum::Int4(b)) => {
            let (a, b) = (*a, *b);
            if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
                return Err(EngineError::DivisionByZero);
            }
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Mod => a.checked_rem(b),
                _ => return Err(operator_mismatch(op, l, r)),
            };
            result.map(Datum::Int4).ok_or_else(out_of_range)
        }
        _ => match (l.as_long(), r.as_long()) {
            (Some(a), Some(b)) => {
                if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
                    return Err(EngineError::DivisionByZero);
                }
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Mod => a.checked_rem(b),
                    _ => return Err(operator_mismatch(op, l, r)),
                };
                result.map(Datum::Int8).ok_or_else(out_of_range)
            }
            _ => match (l.as_double(), r.as_double()) {
                (Some(a), Some(b)) => {
                    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0.0 {
                        return Err(EngineError::DivisionByZero);
                    }
                    let result = match op {
                        BinaryOp::Add => a + b,
                        BinaryOp::Sub => a - b,
                        BinaryOp::Mul => a * b,
                        BinaryOp::Div => a / b,
                        BinaryOp::Mod => a % b,
                        _ => return Err(operator_mismatch(op, l, r)),
                    };
                    Ok(Datum::Float8(result))
                }
                _ => Err(operator_mismatch(op, l, r)),
            },
        },
    }
}

fn compare(op: BinaryOp, l: &Datum, r: &Datum) -> EngineResult<Datum> {
    if l.is_null() || r.is_null() {
        return Ok(Datum::Null);
    }
    let ordering = match (l, r) {
        (Datum::Text(a), Datum::Text(b)) => Some(a.cmp(b)),
        (Datum::Bool(a), Datum::Bool(b)) => Some(a.cmp(b)),
        _ => match (l.as_long(), r.as_long()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => match (l.as_double(), r.as_double()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => return Err(operator_mismatch(op, l, r)),
            },
        },
    };
    let Some(ordering) = ordering else {
        // NaN compares unequal to everything
        return Ok(Datum::Bool(op == BinaryOp::NotEq));
    };
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => return Err(operator_mismatch(op, l, r)),
    };
    Ok(Datum::Bool(result))
}

fn negate(datum: Datum) -> EngineResult<Datum> {
    match datum {
        Datum::Null => Ok(Datum::Null),
        Datum::Int4(v) => v.checked_neg().map(Datum::Int4).ok_or_else(out_of_range),
        Datum::Int8(v) => v.checked_neg().map(Datum::Int8).ok_or_else(out_of_range),
        Datum::Float8(v) => Ok(Datum::Float8(-v)),
        other => Err(EngineError::datatype_mismatch(format!(
            "cannot negate a value of type {}",
            other.type_name()
        ))),
    }
}

/// Convert a value for storage in `column`, following assignment rules.
///
/// Integers widen to INT8 and FLOAT8; nothing narrows except an INT8 that
/// fits INT4. Strings must fit CHAR(n).
pub(crate) fn assign(value: Datum, column: &Column) -> EngineResult<Datum> {
    let mismatch = |value: &Datum| {
        EngineError::datatype_mismatch(format!(
            "column '{}' is of type {} but expression is of type {}",
            column.name,
            column.data_type,
            value.type_name()
        ))
    };
    match (column.data_type, value) {
        (_, Datum::Null) => Ok(Datum::Null),
        (DataType::Bool, v @ Datum::Bool(_)) => Ok(v),
        (DataType::Int4, v @ Datum::Int4(_)) => Ok(v),
        (DataType::Int4, Datum::Int8(v)) => {
            i32::try_from(v).map(Datum::Int4).map_err(|_| out_of_range())
        }
        (DataType::Int8, Datum::Int4(v)) => Ok(Datum::Int8(v as i64)),
        (DataType::Int8, v @ Datum::Int8(_)) => Ok(v),
        (DataType::Float8, Datum::Int4(v)) => Ok(Datum::Float8(v as f64)),
        (DataType::Float8, Datum::Int8(v)) => Ok(Datum::Float8(v as f64)),
        (DataType::Float8, v @ Datum::Float8(_)) => Ok(v),
        (DataType::Char(n), Datum::Text(s)) => {
            if s.chars().count() > n as usize {
                Err(EngineError::datatype_mismatch(format!(
                    "value too long for type CHAR({}) in column '{}'",
                    n, column.name
                )))
            } else {
                Ok(Datum::Text(s))
            }
        }
        (DataType::Text, v @ Datum::Text(_)) => Ok(v),
        (_, v) => Err(mismatch(&v)),
    }
}
