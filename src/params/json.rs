//! JSON boundary for parameter maps.
//!
//! Converts a caller-supplied JSON document into the typed parameter model
//! once, at the edge, so the engine never re-inspects loose shapes.
//!
//! Recognized entry shapes:
//! - scalar — a plain bound parameter
//! - `[payload]` — a `Bind`-mode array (payload may nest)
//! - `[scalar, typeCode]` — scalar with a driver type code
//! - `{"bind": true|false|"text"|"tuple", "value": ...}` — explicit mode

use serde_json::{Map, Value as Json};

use super::{BindMode, BoundValue, ParamMap, ParamValue, Payload, Scalar, SimplifiedParams};
use crate::error::TemplateError;

fn invalid(message: impl Into<String>) -> TemplateError {
    TemplateError::InvalidParams {
        message: message.into(),
    }
}

/// Parse a JSON object into a [`ParamMap`], preserving field order.
pub fn params_from_json(doc: &Json) -> Result<ParamMap, TemplateError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| invalid("parameter document must be a JSON object"))?;

    let mut map = ParamMap::new();
    for (key, value) in obj {
        map.insert(key.clone(), param_from_json(key, value)?);
    }
    Ok(map)
}

fn param_from_json(key: &str, value: &Json) -> Result<ParamValue, TemplateError> {
    if let Some(scalar) = scalar_from_json(value) {
        return Ok(ParamValue::Scalar(scalar));
    }

    match value {
        Json::Array(items) => match items.as_slice() {
            [payload] => Ok(ParamValue::Array {
                mode: BindMode::Bind,
                payload: Some(payload_from_json(key, payload)?),
            }),
            [first, second] => {
                let scalar = scalar_from_json(first).ok_or_else(|| {
                    invalid(format!("parameter '{key}': typed value must be a scalar"))
                })?;
                let type_code = second.as_i64().ok_or_else(|| {
                    invalid(format!("parameter '{key}': type code must be an integer"))
                })?;
                Ok(ParamValue::Typed(scalar, type_code))
            }
            _ => Err(invalid(format!(
                "parameter '{key}': expected [payload] or [scalar, typeCode]"
            ))),
        },
        Json::Object(fields) => param_from_object(key, fields),
        _ => Err(invalid(format!("parameter '{key}': unsupported shape"))),
    }
}

fn param_from_object(key: &str, fields: &Map<String, Json>) -> Result<ParamValue, TemplateError> {
    let mode = match fields.get("bind") {
        None | Some(Json::Bool(true)) => BindMode::Bind,
        Some(Json::Bool(false)) => BindMode::NoBind,
        Some(Json::String(s)) if s == "text" => BindMode::Text,
        Some(Json::String(s)) if s == "tuple" => BindMode::Tuple,
        Some(other) => {
            return Err(invalid(format!(
                "parameter '{key}': unknown bind mode {other}"
            )))
        }
    };

    let payload = fields
        .get("value")
        .map(|v| payload_from_json(key, v))
        .transpose()?;

    Ok(ParamValue::Array { mode, payload })
}

fn payload_from_json(key: &str, value: &Json) -> Result<Payload, TemplateError> {
    if let Some(scalar) = scalar_from_json(value) {
        return Ok(Payload::Leaf(scalar));
    }
    match value {
        Json::Array(items) => Ok(Payload::Seq(
            items
                .iter()
                .map(|item| payload_from_json(key, item))
                .collect::<Result<_, _>>()?,
        )),
        _ => Err(invalid(format!(
            "parameter '{key}': payload must be a scalar or an array"
        ))),
    }
}

fn scalar_from_json(value: &Json) -> Option<Scalar> {
    match value {
        Json::Null => Some(Scalar::Null),
        Json::Bool(b) => Some(Scalar::Bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Scalar::Int(i))
            } else {
                n.as_f64().map(Scalar::Float)
            }
        }
        Json::String(s) => Some(Scalar::Text(s.clone())),
        _ => None,
    }
}

fn scalar_to_json(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Null => Json::Null,
        Scalar::Bool(b) => Json::Bool(*b),
        Scalar::Int(i) => Json::from(*i),
        Scalar::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Scalar::Text(s) => Json::String(s.clone()),
    }
}

/// Render a flattened bind map as JSON. Typed values serialize as
/// `[scalar, typeCode]`.
pub fn simplified_to_json(params: &SimplifiedParams) -> Json {
    let mut obj = Map::new();
    for (key, value) in params.iter() {
        let rendered = match value {
            BoundValue::Plain(scalar) => scalar_to_json(scalar),
            BoundValue::Typed(scalar, code) => {
                Json::Array(vec![scalar_to_json(scalar), Json::from(*code)])
            }
        };
        obj.insert(key.to_string(), rendered);
    }
    Json::Object(obj)
}
