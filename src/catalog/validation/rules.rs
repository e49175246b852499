//! Individual validation rules and the per-flavor descriptor checks.
//!
//! Each `check_*` rule appends violations for one field to the collector.
//! The `validate_*` entry points run every rule for a flavor and convert the
//! collector into a result.

use super::{
    ALLOWED_MIME_TYPES, ALLOWED_URI_SCHEMES, LIST_ENTRY_MAX_LENGTH, RESERVED_IDENTIFIERS,
    RESOURCE_DESCRIPTION_MAX_LENGTH, RESOURCE_NAME_MAX_LENGTH, RESOURCE_URI_MAX_LENGTH,
    TOOL_DESCRIPTION_MAX_LENGTH, TOOL_MAX_CAPABILITIES, TOOL_NAME_MAX_LENGTH, ValidationErrors,
    schema::check_schema,
};
use crate::catalog::domain::ProviderDescriptor;

/// Validates the identifying fields of a tool factory.
///
/// The registration key must equal the descriptor name, and the name must be
/// a well-formed, unreserved identifier.
///
/// # Errors
///
/// Returns every identifier violation found.
pub fn validate_tool_identity(
    key: &str,
    descriptor: &ProviderDescriptor,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_identifier(&mut errors, "name", key, TOOL_NAME_MAX_LENGTH);
    check_key_matches(&mut errors, key, descriptor.key());
    errors.into_result()
}

/// Validates the non-identifying metadata of a tool factory.
///
/// # Errors
///
/// Returns every metadata violation found.
pub fn validate_tool_descriptor(descriptor: &ProviderDescriptor) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_description(
        &mut errors,
        "description",
        descriptor.description(),
        TOOL_DESCRIPTION_MAX_LENGTH,
    );
    check_version(&mut errors, descriptor.version());
    check_list(
        &mut errors,
        "capabilities",
        descriptor.capabilities(),
        Some(TOOL_MAX_CAPABILITIES),
    );
    check_list(&mut errors, "tags", descriptor.tags(), None);
    if let Some(schema) = descriptor.schema() {
        check_schema(&mut errors, "schema", schema);
    }
    errors.into_result()
}

/// Validates the identifying fields of a resource factory.
///
/// The registration key must be an acceptable URI equal to the descriptor's
/// URI, and the resource name must be a well-formed, unreserved identifier.
///
/// # Errors
///
/// Returns every identifier violation found.
pub fn validate_resource_identity(
    key: &str,
    descriptor: &ProviderDescriptor,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_uri(&mut errors, "uri", key);
    check_key_matches(&mut errors, key, descriptor.key());
    check_identifier(
        &mut errors,
        "name",
        descriptor.name(),
        RESOURCE_NAME_MAX_LENGTH,
    );
    errors.into_result()
}

/// Validates the non-identifying metadata of a resource factory.
///
/// # Errors
///
/// Returns every metadata violation found.
pub fn validate_resource_descriptor(
    descriptor: &ProviderDescriptor,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_description(
        &mut errors,
        "description",
        descriptor.description(),
        RESOURCE_DESCRIPTION_MAX_LENGTH,
    );
    check_version(&mut errors, descriptor.version());
    match descriptor.mime_type() {
        Some(mime_type) => check_mime_type(&mut errors, "mime_type", mime_type),
        None => errors.push("mime_type", "", "resources must declare a MIME type"),
    }
    check_list(&mut errors, "capabilities", descriptor.capabilities(), None);
    check_list(&mut errors, "tags", descriptor.tags(), None);
    if let Some(schema) = descriptor.schema() {
        check_schema(&mut errors, "schema", schema);
    }
    errors.into_result()
}

/// Checks a provider identifier.
///
/// Identifiers are non-empty, at most `max_length` characters, start with an
/// ASCII letter, continue with ASCII alphanumerics, `_` or `-`, and are not a
/// reserved word.
pub fn check_identifier(errors: &mut ValidationErrors, field: &str, value: &str, max_length: usize) {
    if value.trim().is_empty() {
        errors.push(field, value, "must not be empty");
        return;
    }

    let length = value.chars().count();
    if length > max_length {
        errors.push(
            field,
            value,
            format!("must be at most {max_length} characters, got {length}"),
        );
    }

    let mut characters = value.chars();
    let starts_with_letter = characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic());
    let rest_is_valid = characters
        .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'));
    if !starts_with_letter || !rest_is_valid {
        errors.push(
            field,
            value,
            "must start with a letter and contain only letters, digits, '_' or '-'",
        );
    }

    if RESERVED_IDENTIFIERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(value))
    {
        errors.push(field, value, "is a reserved identifier");
    }
}

/// Checks a resource URI.
///
/// URIs take the form `scheme:rest` with a non-empty scheme from
/// [`ALLOWED_URI_SCHEMES`]; `file` URIs must not contain `..` segments.
pub fn check_uri(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, value, "must not be empty");
        return;
    }

    let length = value.chars().count();
    if length > RESOURCE_URI_MAX_LENGTH {
        errors.push(
            field,
            value,
            format!("must be at most {RESOURCE_URI_MAX_LENGTH} characters, got {length}"),
        );
    }

    let Some((scheme, rest)) = value.split_once(':') else {
        errors.push(field, value, "must be of the form 'scheme:path'");
        return;
    };

    if !is_well_formed_scheme(scheme) {
        errors.push(field, value, "must have a non-empty, well-formed scheme");
        return;
    }

    let normalized_scheme = scheme.to_ascii_lowercase();
    if !ALLOWED_URI_SCHEMES.contains(&normalized_scheme.as_str()) {
        errors.push(
            field,
            value,
            format!(
                "scheme '{scheme}' is not one of {}",
                ALLOWED_URI_SCHEMES.join(", ")
            ),
        );
    }

    if rest.is_empty() {
        errors.push(field, value, "must have a non-empty path after the scheme");
    }

    if normalized_scheme == "file" && rest.split(['/', '\\']).any(|segment| segment == "..") {
        errors.push(field, value, "file URIs must not contain '..' path segments");
    }
}

/// Checks a description for presence and length.
pub fn check_description(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_length: usize,
) {
    if value.trim().is_empty() {
        errors.push(field, value, "must not be empty");
        return;
    }

    let length = value.chars().count();
    if length > max_length {
        errors.push(
            field,
            value,
            format!("must be at most {max_length} characters, got {length}"),
        );
    }
}

/// Checks that a version string is present.
pub fn check_version(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.push("version", value, "must not be empty");
    }
}

/// Checks a MIME type of the form `type/subtype`.
pub fn check_mime_type(errors: &mut ValidationErrors, field: &str, value: &str) {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((main_type, subtype)) = essence.split_once('/') else {
        errors.push(field, value, "must be of the form 'type/subtype'");
        return;
    };

    if main_type.is_empty() || subtype.is_empty() || subtype.contains('/') {
        errors.push(field, value, "must be of the form 'type/subtype'");
        return;
    }

    let normalized = main_type.to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&normalized.as_str()) {
        errors.push(
            field,
            value,
            format!(
                "main type '{main_type}' is not one of {}",
                ALLOWED_MIME_TYPES.join(", ")
            ),
        );
    }
}

/// Checks capability or tag entries, optionally bounding their count.
pub fn check_list(
    errors: &mut ValidationErrors,
    field: &str,
    entries: &[String],
    max_count: Option<usize>,
) {
    if let Some(limit) = max_count
        && entries.len() > limit
    {
        errors.push(
            field,
            entries.join(","),
            format!("must contain at most {limit} entries, got {}", entries.len()),
        );
    }

    for (index, entry) in entries.iter().enumerate() {
        let entry_field = format!("{field}[{index}]");
        if entry.trim().is_empty() {
            errors.push(entry_field, entry, "must not be empty");
        } else if entry.chars().count() > LIST_ENTRY_MAX_LENGTH {
            errors.push(
                entry_field,
                entry,
                format!("must be at most {LIST_ENTRY_MAX_LENGTH} characters"),
            );
        }
    }
}

fn check_key_matches(errors: &mut ValidationErrors, key: &str, declared: &str) {
    if key != declared {
        errors.push(
            "key",
            key,
            format!("must match the factory's declared identifier '{declared}'"),
        );
    }
}

fn is_well_formed_scheme(scheme: &str) -> bool {
    let mut characters = scheme.chars();
    characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
        && characters
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '+' | '-' | '.'))
}
