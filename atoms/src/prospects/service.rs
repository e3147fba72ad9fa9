use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateProspectPayload, Prospect, UpdateProspectPayload};
use crate::users::model::{visible_owner_ids, User};

pub fn prospect_from_item(item: &HashMap<String, AttributeValue>) -> Option<Prospect> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let id = sk.strip_prefix("PROSPECT#")?.to_string();

    Some(Prospect {
        id,
        name: item
            .get("prospect_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        phone: item
            .get("phone")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        interest: item
            .get("interest")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        method: item
            .get("method")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        site: item
            .get("site")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        remark: item
            .get("remark")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    })
}

/// Load every prospect row (pure domain logic, no HTTP)
pub async fn load_prospects(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<Prospect>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("PROSPECT".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("PROSPECT#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.items().iter().filter_map(prospect_from_item).collect())
}

/// Write a prospect row; `owner_id` is empty for public intake rows.
pub async fn create_prospect_record(
    client: &DynamoClient,
    table_name: &str,
    owner_id: &str,
    payload: &CreateProspectPayload,
) -> Result<Prospect, String> {
    let prospect_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("PROSPECT".to_string()))
        .item("SK", AttributeValue::S(format!("PROSPECT#{}", prospect_id)))
        .item("prospect_name", AttributeValue::S(payload.name.clone()))
        .item("phone", AttributeValue::S(payload.phone.clone()))
        .item("interest", AttributeValue::S(payload.interest.clone()))
        .item("method", AttributeValue::S(payload.method.clone()))
        .item("user_id", AttributeValue::S(owner_id.to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(site) = &payload.site {
        builder = builder.item("site", AttributeValue::S(site.clone()));
    }
    if let Some(remark) = &payload.remark {
        builder = builder.item("remark", AttributeValue::S(remark.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Prospect {
        id: prospect_id,
        name: payload.name.clone(),
        phone: payload.phone.clone(),
        interest: payload.interest.clone(),
        method: payload.method.clone(),
        site: payload.site.clone(),
        remark: payload.remark.clone(),
        user_id: owner_id.to_string(),
        created_at: now,
        updated_at: None,
    })
}

/// Create a prospect owned by the caller (manual entry)
pub async fn create_prospect(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateProspectPayload = serde_json::from_slice(body)?;

    if req.name.trim().is_empty() || req.phone.trim().is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Name and phone are required"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    let prospect = create_prospect_record(client, table_name, user_id, &req).await?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&prospect)?.into())
        .map_err(Box::new)?)
}

/// List prospects scoped to the viewer. Managers see everything,
/// including unclaimed public-intake rows.
pub async fn list_prospects(
    client: &DynamoClient,
    table_name: &str,
    viewer: &User,
    users: &[User],
) -> Result<Response<Body>, Error> {
    let prospects = load_prospects(client, table_name).await?;

    let scoped: Vec<&Prospect> = match visible_owner_ids(viewer, users) {
        None => prospects.iter().collect(),
        Some(ids) => prospects.iter().filter(|p| ids.contains(&p.user_id)).collect(),
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "data": scoped }).to_string().into())
        .map_err(Box::new)?)
}

/// Get a specific prospect
pub async fn get_prospect(
    client: &DynamoClient,
    table_name: &str,
    prospect_id: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("PROSPECT".to_string()))
        .key("SK", AttributeValue::S(format!("PROSPECT#{}", prospect_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item().and_then(prospect_from_item) {
        Some(prospect) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&prospect)?.into())
            .map_err(Box::new)?),
        None => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Prospect not found"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?),
    }
}

/// Update a prospect (stamps updated_at)
pub async fn update_prospect(
    client: &DynamoClient,
    table_name: &str,
    prospect_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateProspectPayload = serde_json::from_slice(body)?;

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = req.name {
        update_expr.push("#prospect_name = :prospect_name");
        expr_names.insert("#prospect_name".to_string(), "prospect_name".to_string());
        expr_values.insert(":prospect_name".to_string(), AttributeValue::S(name));
    }
    if let Some(phone) = req.phone {
        update_expr.push("phone = :phone");
        expr_values.insert(":phone".to_string(), AttributeValue::S(phone));
    }
    if let Some(interest) = req.interest {
        update_expr.push("interest = :interest");
        expr_values.insert(":interest".to_string(), AttributeValue::S(interest));
    }
    if let Some(method) = req.method {
        update_expr.push("#method = :method");
        expr_names.insert("#method".to_string(), "method".to_string());
        expr_values.insert(":method".to_string(), AttributeValue::S(method));
    }
    if let Some(site) = req.site {
        update_expr.push("site = :site");
        expr_values.insert(":site".to_string(), AttributeValue::S(site));
    }
    if let Some(remark) = req.remark {
        update_expr.push("remark = :remark");
        expr_values.insert(":remark".to_string(), AttributeValue::S(remark));
    }

    if !update_expr.is_empty() {
        update_expr.push("updated_at = :updated_at");
        expr_values.insert(
            ":updated_at".to_string(),
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        );

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("PROSPECT".to_string()))
            .key("SK", AttributeValue::S(format!("PROSPECT#{}", prospect_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_prospect(client, table_name, prospect_id).await
}
