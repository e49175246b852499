//! Shape checks for schema payloads attached to descriptors.
//!
//! Only the keys `type`, `properties`, `required` and `items` are
//! recognised. Unknown keys are ignored; recognised keys with the wrong
//! shape are reported. Nested property schemas and `items` are checked
//! recursively with dotted field paths.

use super::ValidationErrors;
use serde_json::Value;

/// Schema `type` values accepted by the validator.
pub const ALLOWED_SCHEMA_TYPES: [&str; 5] = ["object", "array", "string", "number", "boolean"];

/// Checks a schema payload, appending violations under `field`.
pub fn check_schema(errors: &mut ValidationErrors, field: &str, schema: &Value) {
    let Some(object) = schema.as_object() else {
        errors.push(field, schema.to_string(), "schema must be an object");
        return;
    };

    if let Some(schema_type) = object.get("type") {
        check_type(errors, &format!("{field}.type"), schema_type);
    }

    if let Some(properties) = object.get("properties") {
        let properties_field = format!("{field}.properties");
        match properties.as_object() {
            Some(entries) => {
                for (name, property) in entries {
                    check_schema(errors, &format!("{properties_field}.{name}"), property);
                }
            }
            None => errors.push(
                properties_field,
                properties.to_string(),
                "must be an object mapping property names to schemas",
            ),
        }
    }

    if let Some(required) = object.get("required") {
        check_required(errors, &format!("{field}.required"), required);
    }

    if let Some(items) = object.get("items") {
        let items_field = format!("{field}.items");
        if items.is_object() {
            check_schema(errors, &items_field, items);
        } else {
            errors.push(items_field, items.to_string(), "must be a schema object");
        }
    }
}

fn check_type(errors: &mut ValidationErrors, field: &str, value: &Value) {
    match value.as_str() {
        Some(name) if ALLOWED_SCHEMA_TYPES.contains(&name) => {}
        Some(name) => errors.push(
            field,
            name,
            format!("must be one of {}", ALLOWED_SCHEMA_TYPES.join(", ")),
        ),
        None => errors.push(field, value.to_string(), "must be a string"),
    }
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &Value) {
    let Some(names) = value.as_array() else {
        errors.push(field, value.to_string(), "must be an array of strings");
        return;
    };

    for (index, name) in names.iter().enumerate() {
        if !name.is_string() {
            errors.push(
                format!("{field}[{index}]"),
                name.to_string(),
                "must be a string",
            );
        }
    }
}
