use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicEntityKind {
    Customer,
    Vehicle,
    Policy,
}

impl DynamicEntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicEntityKind::Customer => "customer",
            DynamicEntityKind::Vehicle => "vehicle",
            DynamicEntityKind::Policy => "policy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(DynamicEntityKind::Customer),
            "vehicle" => Some(DynamicEntityKind::Vehicle),
            "policy" => Some(DynamicEntityKind::Policy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicFieldType {
    Text,
    Number,
    Date,
    Boolean,
    Choice,
}

impl DynamicFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicFieldType::Text => "text",
            DynamicFieldType::Number => "number",
            DynamicFieldType::Date => "date",
            DynamicFieldType::Boolean => "boolean",
            DynamicFieldType::Choice => "choice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(DynamicFieldType::Text),
            "number" => Some(DynamicFieldType::Number),
            "date" => Some(DynamicFieldType::Date),
            "boolean" => Some(DynamicFieldType::Boolean),
            "choice" => Some(DynamicFieldType::Choice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DynamicFieldDefinition {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity_kind: String,
    pub name: String,
    pub data_type: String,
    pub choices: Option<Vec<String>>,
    pub required: bool,
    pub field_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DynamicFieldDefinition {
    pub fn entity_kind(&self) -> Option<DynamicEntityKind> {
        DynamicEntityKind::parse(&self.entity_kind)
    }

    pub fn data_type(&self) -> Option<DynamicFieldType> {
        DynamicFieldType::parse(&self.data_type)
    }
}

/// A typed value for one (definition, entity) pair. Exactly one of the
/// `value_*` columns is populated, matching `data_type` — spec section 3
/// and section 9's "typed column per data_type" pattern.
#[derive(Debug, Clone, FromRow)]
pub struct DynamicFieldValue {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub definition_id: Uuid,
    pub entity_id: Uuid,
    pub value_text: Option<String>,
    pub value_number: Option<Decimal>,
    pub value_date: Option<NaiveDate>,
    pub value_bool: Option<bool>,
    pub value_choice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
