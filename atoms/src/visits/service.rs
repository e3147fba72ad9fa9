use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;

use super::model::{CreateVisitPayload, UpdateVisitPayload, Visit};

pub fn visit_from_item(item: &HashMap<String, AttributeValue>) -> Option<Visit> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let id = sk.strip_prefix("VISIT#")?.to_string();

    Some(Visit {
        id,
        lead_id: item
            .get("lead_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        visit_type: item
            .get("visit_type")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        visit_date: item
            .get("visit_date")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        outcome: item
            .get("outcome")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// Load all visit rows (pure domain logic, no HTTP)
pub async fn load_visits(client: &DynamoClient, table_name: &str) -> Result<Vec<Visit>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("VISIT".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("VISIT#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.items().iter().filter_map(visit_from_item).collect())
}

/// Record a visit hosted by `user_id`
pub async fn create_visit(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateVisitPayload,
) -> Result<Visit, String> {
    let visit_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("VISIT".to_string()))
        .item("SK", AttributeValue::S(format!("VISIT#{}", visit_id)))
        .item("user_id", AttributeValue::S(user_id.to_string()))
        .item("visit_type", AttributeValue::S(payload.visit_type.clone()))
        .item("visit_date", AttributeValue::S(payload.visit_date.clone()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(lead_id) = &payload.lead_id {
        builder = builder.item("lead_id", AttributeValue::S(lead_id.clone()));
    }
    if let Some(outcome) = &payload.outcome {
        builder = builder.item("outcome", AttributeValue::S(outcome.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Visit {
        id: visit_id,
        lead_id: payload.lead_id,
        user_id: user_id.to_string(),
        visit_type: payload.visit_type,
        visit_date: payload.visit_date,
        outcome: payload.outcome,
        created_at: now,
    })
}

/// Get a specific visit
pub async fn get_visit(
    client: &DynamoClient,
    table_name: &str,
    visit_id: &str,
) -> Result<Visit, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("VISIT".to_string()))
        .key("SK", AttributeValue::S(format!("VISIT#{}", visit_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    result
        .item()
        .and_then(visit_from_item)
        .ok_or_else(|| "Visit not found".to_string())
}

/// Update a visit
pub async fn update_visit(
    client: &DynamoClient,
    table_name: &str,
    visit_id: &str,
    payload: UpdateVisitPayload,
) -> Result<Visit, String> {
    // 404 before building the expression
    get_visit(client, table_name, visit_id).await?;

    let mut update_expr = vec![];
    let mut expr_values = HashMap::new();

    if let Some(visit_type) = payload.visit_type {
        update_expr.push("visit_type = :visit_type");
        expr_values.insert(":visit_type".to_string(), AttributeValue::S(visit_type));
    }
    if let Some(visit_date) = payload.visit_date {
        update_expr.push("visit_date = :visit_date");
        expr_values.insert(":visit_date".to_string(), AttributeValue::S(visit_date));
    }
    if let Some(outcome) = payload.outcome {
        update_expr.push("outcome = :outcome");
        expr_values.insert(":outcome".to_string(), AttributeValue::S(outcome));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("VISIT".to_string()))
            .key("SK", AttributeValue::S(format!("VISIT#{}", visit_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_visit(client, table_name, visit_id).await
}
