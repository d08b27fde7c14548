//! Declared-schema check: unknown, missing, mistyped and out-of-range parameters.

use neuro_types::{ParamKind, ToolCall, ToolDefinition};
use serde_json::Value;

/// `Err` carries a reason the engine can act on.
pub(crate) fn check_schema(definition: &ToolDefinition, call: &ToolCall) -> Result<(), String> {
    let unknown: Vec<&str> = call
        .parameters
        .keys()
        .filter(|name| definition.parameter(name).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(format!(
            "`{}` does not accept parameter(s) {}; declared: {}",
            definition.name,
            quoted(&unknown),
            declared(definition)
        ));
    }

    let missing: Vec<&str> = definition
        .parameters
        .iter()
        .filter(|param| param.required && !call.parameters.contains_key(&param.name))
        .map(|param| param.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "`{}` is missing required parameter(s) {}",
            definition.name,
            quoted(&missing)
        ));
    }

    for param in &definition.parameters {
        let Some(value) = call.parameters.get(&param.name) else {
            continue;
        };
        if value.is_null() && !param.required {
            continue;
        }
        if !param.kind.matches(value) {
            return Err(format!(
                "parameter `{}` must be {}, got {}",
                param.name,
                kind_phrase(param.kind),
                value_kind(value)
            ));
        }
        if let Some(number) = value.as_f64() {
            if let Some(minimum) = param.minimum
                && number < minimum
            {
                return Err(format!(
                    "parameter `{}` = {number} is below the minimum {minimum}",
                    param.name
                ));
            }
            if let Some(maximum) = param.maximum
                && number > maximum
            {
                return Err(format!(
                    "parameter `{}` = {number} is above the maximum {maximum}",
                    param.name
                ));
            }
        }
        if let (Some(allowed), Some(text)) = (param.allowed_values.as_ref(), value.as_str())
            && !allowed.iter().any(|candidate| candidate == text)
        {
            let options: Vec<&str> = allowed.iter().map(String::as_str).collect();
            return Err(format!(
                "parameter `{}` = \"{text}\" is not one of {}",
                param.name,
                quoted(&options)
            ));
        }
    }
    Ok(())
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn declared(definition: &ToolDefinition) -> String {
    if definition.parameters.is_empty() {
        return "none".to_string();
    }
    let names: Vec<&str> = definition
        .parameters
        .iter()
        .map(|param| param.name.as_str())
        .collect();
    quoted(&names)
}

fn kind_phrase(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::String => "a string",
        ParamKind::Integer => "an integer",
        ParamKind::Number => "a number",
        ParamKind::Boolean => "a boolean",
        ParamKind::Array => "an array",
        ParamKind::Object => "an object",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use neuro_types::ToolParameter;

    use super::*;

    fn filter() -> ToolDefinition {
        ToolDefinition::new("apply_filter", "Filter", "preprocessing")
            .param(ToolParameter::required("low", ParamKind::Number, "Hz").with_range(0.0, 1000.0))
            .param(ToolParameter::required("high", ParamKind::Number, "Hz").with_range(0.0, 1000.0))
    }

    #[test]
    fn unknown_parameters_list_the_declared_ones() {
        let call = ToolCall::new("apply_filter")
            .with_param("low", 1)
            .with_param("high", 40)
            .with_param("order", 4);
        let reason = check_schema(&filter(), &call).unwrap_err();
        assert!(reason.contains("`order`"));
        assert!(reason.contains("`low`, `high`"));
    }

    #[test]
    fn strings_are_not_numbers() {
        let call = ToolCall::new("apply_filter")
            .with_param("low", "1")
            .with_param("high", 40);
        let reason = check_schema(&filter(), &call).unwrap_err();
        assert_eq!(reason, "parameter `low` must be a number, got a string");
    }

    #[test]
    fn range_is_inclusive() {
        let call = ToolCall::new("apply_filter")
            .with_param("low", 0)
            .with_param("high", 1000);
        assert!(check_schema(&filter(), &call).is_ok());
        let call = call.with_param("high", 1000.5);
        assert!(check_schema(&filter(), &call).unwrap_err().contains("above the maximum"));
    }
}
