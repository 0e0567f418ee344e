use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::dynamic_fields::{self, RawFieldValue};
use crate::models::{DynamicEntityKind, DynamicFieldDefinition, DynamicFieldType, DynamicFieldValue};
use crate::proto::dynamicfield::dynamic_field_service_server::DynamicFieldService;
use crate::proto::dynamicfield::{
    CreateFieldDefinitionRequest, FieldDefinition, FieldValue, ListFieldDefinitionsRequest,
    ListFieldDefinitionsResponse, ListFieldValuesRequest, ListFieldValuesResponse, SetFieldValueRequest,
};
use crate::repository::dynamic_field_repo;
use crate::services::common::{authenticated_user, parse_decimal, parse_uuid, require, scoped_tenant};

pub struct DynamicFieldServiceImpl {
    pool: PgPool,
}

impl DynamicFieldServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn definition_to_proto(def: DynamicFieldDefinition) -> FieldDefinition {
    FieldDefinition {
        id: def.id.to_string(),
        entity_kind: def.entity_kind,
        name: def.name,
        data_type: def.data_type,
        choices: def.choices.unwrap_or_default(),
        required: def.required,
        field_order: def.field_order,
    }
}

fn value_to_proto(definition_id: uuid::Uuid, value: DynamicFieldValue) -> FieldValue {
    FieldValue {
        definition_id: definition_id.to_string(),
        value_text: value.value_text,
        value_number: value.value_number.map(|n| n.to_string()),
        value_date: value.value_date.map(|d| d.to_string()),
        value_bool: value.value_bool,
        value_choice: value.value_choice,
    }
}

/// Picks the one populated wire value matching `data_type`; the caller
/// (`dynamic_fields::validate`) rejects a mismatch or an unpopulated
/// required field.
fn raw_value(value: &FieldValue, data_type: DynamicFieldType) -> Result<Option<RawFieldValue>, Status> {
    let raw = match data_type {
        DynamicFieldType::Text => value.value_text.clone().map(RawFieldValue::Text),
        DynamicFieldType::Number => value
            .value_number
            .as_deref()
            .map(|n| parse_decimal(n, "value_number"))
            .transpose()?
            .map(RawFieldValue::Number),
        DynamicFieldType::Date => value
            .value_date
            .as_deref()
            .map(|d| {
                chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| Status::invalid_argument("value_date: expected YYYY-MM-DD"))
            })
            .transpose()?
            .map(RawFieldValue::Date),
        DynamicFieldType::Boolean => value.value_bool.map(RawFieldValue::Boolean),
        DynamicFieldType::Choice => value.value_choice.clone().map(RawFieldValue::Choice),
    };
    Ok(raw)
}

#[tonic::async_trait]
impl DynamicFieldService for DynamicFieldServiceImpl {
    async fn create_field_definition(
        &self,
        request: Request<CreateFieldDefinitionRequest>,
    ) -> Result<Response<FieldDefinition>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageDynamicFields)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let entity_kind = DynamicEntityKind::parse(&req.entity_kind)
            .ok_or_else(|| Status::invalid_argument("entity_kind: unrecognized entity kind"))?;
        let data_type = DynamicFieldType::parse(&req.data_type)
            .ok_or_else(|| Status::invalid_argument("data_type: unrecognized field type"))?;
        let choices = if req.choices.is_empty() { None } else { Some(req.choices) };

        let definition = dynamic_field_repo::create_definition(
            &self.pool,
            tenant_id,
            entity_kind,
            &req.name,
            data_type,
            choices,
            req.required,
            req.field_order,
        )
        .await?;

        Ok(Response::new(definition_to_proto(definition)))
    }

    async fn list_field_definitions(
        &self,
        request: Request<ListFieldDefinitionsRequest>,
    ) -> Result<Response<ListFieldDefinitionsResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let entity_kind = DynamicEntityKind::parse(&req.entity_kind)
            .ok_or_else(|| Status::invalid_argument("entity_kind: unrecognized entity kind"))?;

        let definitions = dynamic_field_repo::list_definitions(&self.pool, tenant_id, entity_kind).await?;
        Ok(Response::new(ListFieldDefinitionsResponse {
            definitions: definitions.into_iter().map(definition_to_proto).collect(),
        }))
    }

    async fn set_field_value(&self, request: Request<SetFieldValueRequest>) -> Result<Response<FieldValue>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageDynamicFields)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let entity_id = parse_uuid(&req.entity_id, "entity_id")?;
        let definition_id = parse_uuid(&req.definition_id, "definition_id")?;
        let incoming = req
            .value
            .ok_or_else(|| Status::invalid_argument("value: is required"))?;

        let definition = dynamic_field_repo::find_definition(&self.pool, tenant_id, definition_id).await?;
        let data_type = definition
            .data_type()
            .ok_or_else(|| Status::internal("stored dynamic field has an unrecognized data_type"))?;

        let raw = raw_value(&incoming, data_type)?;
        let columns = dynamic_fields::validate(&definition, raw.as_ref())?.unwrap_or_default();

        let value = dynamic_field_repo::upsert_value(&self.pool, tenant_id, definition_id, entity_id, columns).await?;
        Ok(Response::new(value_to_proto(definition_id, value)))
    }

    async fn list_field_values(
        &self,
        request: Request<ListFieldValuesRequest>,
    ) -> Result<Response<ListFieldValuesResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let entity_id = parse_uuid(&req.entity_id, "entity_id")?;

        let values = dynamic_field_repo::values_for_entity(&self.pool, tenant_id, entity_id).await?;
        Ok(Response::new(ListFieldValuesResponse {
            values: values
                .into_iter()
                .map(|v| value_to_proto(v.definition_id, v))
                .collect(),
        }))
    }
}
