//! Opportunistic coercion of raw values into typed representations.
//!
//! Coercion only changes representation (raw map → record instance, through
//! any nesting of lists, tuples, maps, optionals and unions). It never decides
//! acceptance: whatever comes out is still checked, and a failed coercion
//! hands the value back untouched so the checker can report it.

use tracing::trace;

use crate::check::{Mode, conforms};
use crate::ty::Ty;
use crate::value::Value;

pub(crate) fn coerce(value: Value, ty: &Ty) -> Value {
    match (ty, value) {
        (Ty::Record(record_type), Value::Map(raw)) => {
            match record_type.build(raw.clone(), Mode::FailFast) {
                Ok(record) => Value::Record(record),
                Err(_) => Value::Map(raw),
            }
        }
        (Ty::List(element), Value::List(items)) => {
            Value::List(items.into_iter().map(|item| coerce(item, element)).collect())
        }
        (Ty::Tuple(elements), Value::List(items)) => Value::List(
            items
                .into_iter()
                .enumerate()
                .map(|(pos, item)| match elements.get(pos) {
                    Some(element) => coerce(item, element),
                    None => item,
                })
                .collect(),
        ),
        // Keys stay as they are.
        (Ty::Map { value: value_ty, .. }, Value::Map(entries)) => Value::Map(
            entries.into_iter().map(|(k, v)| (k, coerce(v, value_ty))).collect(),
        ),
        (Ty::Optional(inner), value) if !value.is_null() => coerce(value, inner),
        (Ty::Union(branches), value) => coerce_union(value, branches),
        (_, value) => value,
    }
}

/// First branch that takes the value wins. A record branch takes it when
/// construction succeeds; any other branch when the coerced value conforms.
fn coerce_union(value: Value, branches: &[Ty]) -> Value {
    for (index, branch) in branches.iter().enumerate() {
        let candidate = match (branch, &value) {
            (Ty::Record(record_type), Value::Map(raw)) => {
                record_type.build(raw.clone(), Mode::FailFast).ok().map(Value::Record)
            }
            (Ty::Record(_), _) => None,
            _ => {
                let coerced = coerce(value.clone(), branch);
                conforms(&coerced, branch).then_some(coerced)
            }
        };
        if let Some(coerced) = candidate {
            trace!(branch = index, ty = %branch, "union branch selected");
            return coerced;
        }
    }
    value
}
