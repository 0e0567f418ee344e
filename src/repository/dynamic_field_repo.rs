use sqlx::PgPool;
use uuid::Uuid;

use crate::dynamic_fields::TypedColumns;
use crate::error::{AppError, AppResult};
use crate::models::{DynamicEntityKind, DynamicFieldDefinition, DynamicFieldType, DynamicFieldValue};

pub async fn create_definition(
    pool: &PgPool,
    tenant_id: Uuid,
    entity_kind: DynamicEntityKind,
    name: &str,
    data_type: DynamicFieldType,
    choices: Option<Vec<String>>,
    required: bool,
    field_order: i32,
) -> AppResult<DynamicFieldDefinition> {
    if data_type == DynamicFieldType::Choice && choices.as_ref().map_or(true, |c| c.is_empty()) {
        return Err(AppError::validation("choices", "a choice field needs at least one configured choice"));
    }

    let definition: DynamicFieldDefinition = sqlx::query_as(
        "INSERT INTO dynamic_field_definitions
            (id, tenant_id, entity_kind, name, data_type, choices, required, field_order, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(entity_kind.as_str())
    .bind(name)
    .bind(data_type.as_str())
    .bind(choices)
    .bind(required)
    .bind(field_order)
    .fetch_one(pool)
    .await?;
    Ok(definition)
}

pub async fn find_definition(pool: &PgPool, tenant_id: Uuid, definition_id: Uuid) -> AppResult<DynamicFieldDefinition> {
    sqlx::query_as("SELECT * FROM dynamic_field_definitions WHERE id = $1 AND tenant_id = $2 AND is_active = true")
        .bind(definition_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("field definition {definition_id}")))
}

pub async fn list_definitions(pool: &PgPool, tenant_id: Uuid, entity_kind: DynamicEntityKind) -> AppResult<Vec<DynamicFieldDefinition>> {
    let rows = sqlx::query_as(
        "SELECT * FROM dynamic_field_definitions
          WHERE tenant_id = $1 AND entity_kind = $2 AND is_active = true
          ORDER BY field_order",
    )
    .bind(tenant_id)
    .bind(entity_kind.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn upsert_value(
    pool: &PgPool,
    tenant_id: Uuid,
    definition_id: Uuid,
    entity_id: Uuid,
    columns: TypedColumns,
) -> AppResult<DynamicFieldValue> {
    let value: DynamicFieldValue = sqlx::query_as(
        "INSERT INTO dynamic_field_values
            (id, tenant_id, definition_id, entity_id, value_text, value_number, value_date, value_bool, value_choice, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
         ON CONFLICT (definition_id, entity_id) DO UPDATE SET
            value_text = excluded.value_text,
            value_number = excluded.value_number,
            value_date = excluded.value_date,
            value_bool = excluded.value_bool,
            value_choice = excluded.value_choice,
            updated_at = now()
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(definition_id)
    .bind(entity_id)
    .bind(columns.value_text)
    .bind(columns.value_number)
    .bind(columns.value_date)
    .bind(columns.value_bool)
    .bind(columns.value_choice)
    .fetch_one(pool)
    .await?;
    Ok(value)
}

pub async fn values_for_entity(pool: &PgPool, tenant_id: Uuid, entity_id: Uuid) -> AppResult<Vec<DynamicFieldValue>> {
    let rows = sqlx::query_as(
        "SELECT * FROM dynamic_field_values WHERE tenant_id = $1 AND entity_id = $2",
    )
    .bind(tenant_id)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
