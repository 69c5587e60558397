//! Placeholder flattening: converts structured parameter values into flat
//! scalar bindings and into the replacement-text fragments spliced into the
//! rewritten SQL.
//!
//! Naming is the round-trip contract with the rewriter: a sequence element at
//! position `i` becomes `name_i`, a tuple row element becomes `name_i_j`, so
//! the flattened map's keys are exactly the placeholders emitted into the SQL.

use crate::params::{BindMode, BoundValue, ParamMap, ParamValue, Payload, SimplifiedParams};

/// Flatten a parameter map into bind-ready `:name -> scalar` entries.
///
/// Output keys are colon-prefixed regardless of how the parameter was
/// declared. `Text` and `NoBind` parameters contribute nothing.
pub fn simplify(params: &ParamMap) -> SimplifiedParams {
    let mut out = SimplifiedParams::default();

    for (key, value) in params.iter() {
        let key = format!(":{}", key.trim_start_matches(':'));

        match value {
            ParamValue::Scalar(scalar) => {
                out.insert(key, BoundValue::Plain(scalar.clone()));
            }
            ParamValue::Typed(scalar, type_code) => {
                out.insert(key, BoundValue::Typed(scalar.clone(), *type_code));
            }
            ParamValue::Array { mode, payload } => match mode {
                BindMode::Text | BindMode::NoBind => {}
                BindMode::Bind | BindMode::Tuple => match payload {
                    None => {}
                    Some(Payload::Leaf(scalar)) => {
                        out.insert(key, BoundValue::Plain(scalar.clone()));
                    }
                    Some(Payload::Seq(items)) => {
                        for (i, item) in items.iter().enumerate() {
                            flatten_into(format!("{key}_{i}"), item, &mut out);
                        }
                    }
                },
            },
        }
    }

    out
}

/// Append index suffixes per nesting level; sibling suffixes are unique, so
/// key collisions cannot occur within one parameter.
fn flatten_into(key: String, payload: &Payload, out: &mut SimplifiedParams) {
    match payload {
        Payload::Leaf(scalar) => out.insert(key, BoundValue::Plain(scalar.clone())),
        Payload::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(format!("{key}_{i}"), item, out);
            }
        }
    }
}

/// Comma-joined placeholder list for a `Bind`-mode sequence:
/// `:name_0,:name_1,...` in element order. Nested sequences recurse with the
/// same suffixing as [`flatten_into`], so every emitted placeholder has a
/// matching flattened key.
pub(crate) fn placeholder_list(name: &str, items: &[Payload]) -> String {
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        push_placeholders(format!("{name}_{i}"), item, &mut out);
    }
    out.join(",")
}

fn push_placeholders(key: String, payload: &Payload, out: &mut Vec<String>) {
    match payload {
        Payload::Leaf(_) => out.push(format!(":{key}")),
        Payload::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                push_placeholders(format!("{key}_{i}"), item, out);
            }
        }
    }
}

/// Comma-joined parenthesized groups for a `Tuple`-mode sequence:
/// `(:name_0_0,:name_0_1),(:name_1_0,:name_1_1)`. Rows are renumbered from 0;
/// a scalar row yields a single-placeholder group.
pub(crate) fn tuple_groups(name: &str, rows: &[Payload]) -> String {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let group = match row {
                Payload::Seq(cols) => (0..cols.len())
                    .map(|j| format!(":{name}_{i}_{j}"))
                    .collect::<Vec<_>>()
                    .join(","),
                Payload::Leaf(_) => format!(":{name}_{i}"),
            };
            format!("({group})")
        })
        .collect::<Vec<_>>()
        .join(",")
}
