//! Record Validator
//!
//! Three passes, all accumulating into one error list:
//! 1. completeness over the full schema (schema order)
//! 2. type and range per supplied key (request order)
//! 3. cross-field rules from the schema
//!
//! No pass short-circuits another. Nothing here panics or returns early on
//! the first bad field.

use super::coerce::coerce_f64;
use super::types::{NormalizedRecord, RawRecord, ValidationResult};
use crate::logic::features::{CrossFieldRule, FeatureSchema};

/// Validate a raw record against the schema
pub fn validate(raw: &RawRecord, schema: &FeatureSchema) -> ValidationResult {
    let mut errors = Vec::new();

    check_required(raw, schema, &mut errors);
    check_ranges(raw, schema, &mut errors);
    check_rules(raw, schema, &mut errors);

    if !errors.is_empty() {
        log::debug!("Rejected record with {} error(s)", errors.len());
        return ValidationResult::Invalid(errors);
    }

    let mut record = NormalizedRecord::new();
    for field in schema.fields() {
        match raw.get(&field.key).map(coerce_f64) {
            Some(Ok(value)) => record.insert(field.key.clone(), value),
            // Unreachable after passes 1 and 2, still reported rather than dropped
            _ => return ValidationResult::Invalid(vec![required_message(&field.display_name)]),
        }
    }

    ValidationResult::Valid(record)
}

fn required_message(display_name: &str) -> String {
    format!("{} is required", display_name)
}

fn check_required(raw: &RawRecord, schema: &FeatureSchema, errors: &mut Vec<String>) {
    for field in schema.fields() {
        let missing = raw.get(&field.key).map_or(true, |v| v.is_null());
        if missing {
            errors.push(required_message(&field.display_name));
        }
    }
}

fn check_ranges(raw: &RawRecord, schema: &FeatureSchema, errors: &mut Vec<String>) {
    for (key, value) in raw {
        // Unknown keys are ignored
        let Some(field) = schema.field(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        match coerce_f64(value) {
            Ok(number) if !field.contains(number) => errors.push(format!(
                "{} must be between {} and {}",
                field.display_name, field.min, field.max
            )),
            Ok(_) => {}
            Err(_) => errors.push(format!("{} must be a valid number", field.display_name)),
        }
    }
}

fn check_rules(raw: &RawRecord, schema: &FeatureSchema, errors: &mut Vec<String>) {
    for rule in schema.rules() {
        match rule {
            CrossFieldRule::NotGreaterThan { field, limit } => {
                let value = raw.get(field).and_then(|v| coerce_f64(v).ok());
                let bound = raw.get(limit).and_then(|v| coerce_f64(v).ok());

                // Malformed values were already reported by the range pass
                if let (Some(value), Some(bound)) = (value, bound) {
                    if value > bound {
                        errors.push(format!(
                            "{} cannot be greater than {}",
                            display_name(schema, field),
                            display_name(schema, limit)
                        ));
                    }
                }
            }
        }
    }
}

fn display_name<'a>(schema: &'a FeatureSchema, key: &'a str) -> &'a str {
    schema.field(key).map_or(key, |f| f.display_name.as_str())
}
