// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure planning of a transfer's mutation
//!
//! Every check runs here, before anything is written. A plan either comes
//! back complete or the transfer is rejected with nothing touched.

use crate::error::TransferRejection;
use pl_adapters::ElementChange;
use pl_core::value::{is_pair, peel};
use pl_core::{ArrayElement, Component, ComponentType, IdGen, PrimitiveKind, TransferOp};
use serde_json::{json, Map, Value};

/// What executing a transfer will write
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mutation {
    /// New inline value of a scalar component
    SetValue(Value),
    /// One change to an array component's element list
    Elements {
        change: ElementChange,
        removed: Option<ArrayElement>,
    },
    /// Removal from an empty array
    Nothing,
}

/// Inputs to [`plan`], already loaded from the store
pub(crate) struct PlanInput<'a> {
    pub op: TransferOp,
    pub target: &'a Component,
    /// Current elements, for array targets
    pub elements: &'a [ArrayElement],
    /// Unwrapped operand: the source component's value, or the transfer's
    /// `data_value` with one envelope level stripped
    pub operand: &'a Value,
    /// The transfer's raw `data_value`, for positional payloads
    pub data_value: &'a Value,
    pub has_source: bool,
}

pub(crate) fn plan<I: IdGen>(
    input: &PlanInput<'_>,
    id_gen: &I,
) -> Result<Mutation, TransferRejection> {
    let PlanInput {
        op,
        target,
        elements,
        operand,
        ..
    } = *input;
    let component_type = target.component_type;
    if !component_type.allows(op) {
        return Err(TransferRejection::OperationNotSupported { op, component_type });
    }

    let current = peel(&target.value);
    let len = elements.len();

    match op {
        TransferOp::Replace if component_type.is_array() => {
            let items = operand
                .as_array()
                .ok_or_else(|| TransferRejection::invalid("replace on an array needs a list"))?;
            let mut replacement = Vec::with_capacity(items.len());
            for item in items {
                let item = peel(item);
                check_element(target, item)?;
                replacement.push(ArrayElement::new(id_gen.next(), item.clone()));
            }
            Ok(Mutation::Elements {
                change: ElementChange::Replace(replacement),
                removed: None,
            })
        }
        TransferOp::Replace => {
            check_scalar(target, operand)?;
            Ok(Mutation::SetValue(coerce(component_type, operand)))
        }
        TransferOp::Add | TransferOp::Multiply => arithmetic(op, component_type, current, operand),
        TransferOp::Toggle => {
            let flag = current
                .as_bool()
                .ok_or_else(|| TransferRejection::invalid("stored value is not a bool"))?;
            Ok(Mutation::SetValue(Value::Bool(!flag)))
        }
        TransferOp::UpdateKey | TransferOp::UpdateValue => {
            let field = if op == TransferOp::UpdateKey {
                "key"
            } else {
                "value"
            };
            let mut pair = match current {
                Value::Object(map) if is_pair(current) => map.clone(),
                _ => return Err(TransferRejection::invalid("stored value is not a pair")),
            };
            let replacement = pair_payload(input)
                .and_then(|payload| payload.get(field))
                .filter(|v| !v.is_null())
                .ok_or_else(|| TransferRejection::invalid(format!("missing '{field}'")))?;
            pair.insert(field.to_string(), replacement.clone());
            Ok(Mutation::SetValue(Value::Object(pair)))
        }
        TransferOp::Append => {
            check_element(target, operand)?;
            Ok(Mutation::Elements {
                change: ElementChange::Insert {
                    index: len,
                    element: ArrayElement::new(id_gen.next(), operand.clone()),
                },
                removed: None,
            })
        }
        TransferOp::RemoveBack | TransferOp::RemoveFront => {
            let index = match (op, len) {
                (_, 0) => return Ok(Mutation::Nothing),
                (TransferOp::RemoveFront, _) => 0,
                _ => len - 1,
            };
            Ok(Mutation::Elements {
                change: ElementChange::Remove { index },
                removed: elements.get(index).cloned(),
            })
        }
        TransferOp::DeleteAt => {
            let index = position(input.data_value, len, false)?;
            Ok(Mutation::Elements {
                change: ElementChange::Remove { index },
                removed: elements.get(index).cloned(),
            })
        }
        TransferOp::PushAt => {
            let index = position(input.data_value, len, true)?;
            let item = if input.has_source {
                operand
            } else {
                positional_item(input.data_value, component_type)?
            };
            check_element(target, item)?;
            Ok(Mutation::Elements {
                change: ElementChange::Insert {
                    index,
                    element: ArrayElement::new(id_gen.next(), item.clone()),
                },
                removed: None,
            })
        }
        TransferOp::UpdatePair => {
            let index = position(input.data_value, len, false)?;
            let patch = if input.has_source {
                operand
            } else {
                positional_item(input.data_value, component_type)?
            };
            let patch = patch
                .as_object()
                .ok_or_else(|| TransferRejection::invalid("pair update must be an object"))?;
            let existing = elements
                .get(index)
                .ok_or_else(|| TransferRejection::invalid("index out of bounds"))?;
            let mut merged = existing.item.as_object().cloned().unwrap_or_else(Map::new);
            for field in ["key", "value"] {
                if let Some(v) = patch.get(field) {
                    merged.insert(field.to_string(), v.clone());
                }
            }
            let merged = Value::Object(merged);
            check_element(target, &merged)?;
            Ok(Mutation::Elements {
                change: ElementChange::Update {
                    index,
                    element: ArrayElement::new(existing.id.clone(), merged),
                },
                removed: None,
            })
        }
    }
}

fn check_scalar(target: &Component, value: &Value) -> Result<(), TransferRejection> {
    if target.accepts(value) {
        Ok(())
    } else {
        Err(TransferRejection::invalid(format!(
            "{} does not fit a {} component",
            describe(value),
            target.component_type
        )))
    }
}

fn check_element(target: &Component, item: &Value) -> Result<(), TransferRejection> {
    if target.accepts(item) {
        return Ok(());
    }
    let expected = target
        .element_kind()
        .map_or("any", PrimitiveKind::as_str);
    Err(TransferRejection::invalid(format!(
        "element {} is not a {}",
        describe(item),
        expected
    )))
}

/// Doubles are stored as floats even when fed an integer
fn coerce(component_type: ComponentType, value: &Value) -> Value {
    match (component_type, value.as_i64()) {
        (ComponentType::Double, Some(n)) => json!(n as f64),
        _ => value.clone(),
    }
}

fn arithmetic(
    op: TransferOp,
    component_type: ComponentType,
    current: &Value,
    operand: &Value,
) -> Result<Mutation, TransferRejection> {
    if component_type == ComponentType::Int {
        let lhs = current
            .as_i64()
            .ok_or_else(|| TransferRejection::invalid("stored value is not an integer"))?;
        let rhs = operand
            .as_i64()
            .ok_or_else(|| TransferRejection::invalid(format!("{} is not an integer", describe(operand))))?;
        let result = match op {
            TransferOp::Add => lhs.checked_add(rhs),
            _ => lhs.checked_mul(rhs),
        }
        .ok_or_else(|| TransferRejection::invalid("integer overflow"))?;
        return Ok(Mutation::SetValue(json!(result)));
    }

    let lhs = current
        .as_f64()
        .ok_or_else(|| TransferRejection::invalid("stored value is not a number"))?;
    let rhs = operand
        .as_f64()
        .ok_or_else(|| TransferRejection::invalid(format!("{} is not a number", describe(operand))))?;
    let result = match op {
        TransferOp::Add => lhs + rhs,
        _ => lhs * rhs,
    };
    if !result.is_finite() {
        return Err(TransferRejection::invalid("result is not finite"));
    }
    Ok(Mutation::SetValue(json!(result)))
}

/// Object carrying `key`/`value` for a pair update: `{"item": {...}}` or the
/// object itself
fn pair_payload<'a>(input: &PlanInput<'a>) -> Option<&'a Map<String, Value>> {
    let source = if input.has_source {
        input.operand
    } else {
        input.data_value
    };
    match source.get("item") {
        Some(Value::Object(inner)) => Some(inner),
        _ => source.as_object(),
    }
}

/// Read `index` from a positional payload. Insert positions may equal `len`.
fn position(data_value: &Value, len: usize, insert: bool) -> Result<usize, TransferRejection> {
    let raw = data_value
        .get("index")
        .ok_or_else(|| TransferRejection::invalid("missing 'index'"))?;
    let index = raw
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| TransferRejection::invalid(format!("index {raw} is not a position")))?;
    let in_bounds = if insert { index <= len } else { index < len };
    if !in_bounds {
        return Err(TransferRejection::invalid(format!(
            "index {index} out of bounds for {len} elements"
        )));
    }
    Ok(index)
}

/// Element carried next to `index`: `pair` for pair arrays, else `value`
/// (falling back to `item`)
fn positional_item(
    data_value: &Value,
    component_type: ComponentType,
) -> Result<&Value, TransferRejection> {
    let keys: &[&str] = if component_type == ComponentType::ArrayOfPairs {
        &["pair", "value", "item"]
    } else {
        &["value", "item"]
    };
    keys.iter()
        .find_map(|k| data_value.get(*k))
        .ok_or_else(|| TransferRejection::invalid("missing element value"))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
