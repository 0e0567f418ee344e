//! C7 — Dynamic field validation. Each custom field definition picks a
//! typed column to write into rather than a schemaless blob (spec
//! section 3); this module dispatches incoming values to the right
//! column and enforces `required`/`choices` before a write is allowed.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::models::{DynamicFieldDefinition, DynamicFieldType};

/// One incoming value for a dynamic field, still in wire form.
#[derive(Debug, Clone)]
pub enum RawFieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Boolean(bool),
    Choice(String),
}

/// The typed columns a validated value should be written into.
#[derive(Debug, Clone, Default)]
pub struct TypedColumns {
    pub value_text: Option<String>,
    pub value_number: Option<Decimal>,
    pub value_date: Option<NaiveDate>,
    pub value_bool: Option<bool>,
    pub value_choice: Option<String>,
}

/// Validates and dispatches one value against its definition. Returns
/// `Ok(None)` only when the field is optional and the value is absent.
pub fn validate(
    definition: &DynamicFieldDefinition,
    value: Option<&RawFieldValue>,
) -> AppResult<Option<TypedColumns>> {
    let data_type = definition
        .data_type()
        .ok_or_else(|| AppError::Internal(format!("unknown dynamic field type for {}", definition.name)))?;

    let Some(value) = value else {
        if definition.required {
            return Err(AppError::validation(&definition.name, "this field is required"));
        }
        return Ok(None);
    };

    let columns = match (data_type, value) {
        (DynamicFieldType::Text, RawFieldValue::Text(v)) => TypedColumns {
            value_text: Some(v.clone()),
            ..Default::default()
        },
        (DynamicFieldType::Number, RawFieldValue::Number(v)) => TypedColumns {
            value_number: Some(*v),
            ..Default::default()
        },
        (DynamicFieldType::Date, RawFieldValue::Date(v)) => TypedColumns {
            value_date: Some(*v),
            ..Default::default()
        },
        (DynamicFieldType::Boolean, RawFieldValue::Boolean(v)) => TypedColumns {
            value_bool: Some(*v),
            ..Default::default()
        },
        (DynamicFieldType::Choice, RawFieldValue::Choice(v)) => {
            let choices = definition.choices.as_deref().unwrap_or(&[]);
            if !choices.iter().any(|c| c == v) {
                return Err(AppError::validation(
                    &definition.name,
                    format!("\"{v}\" is not one of the configured choices"),
                ));
            }
            TypedColumns {
                value_choice: Some(v.clone()),
                ..Default::default()
            }
        }
        _ => {
            return Err(AppError::validation(
                &definition.name,
                format!("value does not match data_type {}", data_type.as_str()),
            ))
        }
    };

    Ok(Some(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn definition(data_type: DynamicFieldType, required: bool, choices: Option<Vec<String>>) -> DynamicFieldDefinition {
        DynamicFieldDefinition {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            entity_kind: "vehicle".into(),
            name: "field".into(),
            data_type: data_type.as_str().to_string(),
            choices,
            required,
            field_order: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn required_field_missing_is_rejected() {
        let def = definition(DynamicFieldType::Text, true, None);
        assert!(validate(&def, None).is_err());
    }

    #[test]
    fn optional_field_missing_is_fine() {
        let def = definition(DynamicFieldType::Text, false, None);
        assert!(validate(&def, None).unwrap().is_none());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let def = definition(DynamicFieldType::Number, true, None);
        let err = validate(&def, Some(&RawFieldValue::Text("nope".into()))).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn choice_outside_configured_set_is_rejected() {
        let def = definition(
            DynamicFieldType::Choice,
            true,
            Some(vec!["red".into(), "blue".into()]),
        );
        assert!(validate(&def, Some(&RawFieldValue::Choice("green".into()))).is_err());
        let ok = validate(&def, Some(&RawFieldValue::Choice("red".into()))).unwrap().unwrap();
        assert_eq!(ok.value_choice, Some("red".into()));
    }
}
