use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateUserPayload, Role, UpdateUserPayload, User};

/// Map a directory row (PK="USER", SK="USER#{id}") to a User.
/// Rows with an unparseable role are skipped by callers.
pub fn user_from_item(item: &HashMap<String, AttributeValue>) -> Option<User> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let user_id = sk.strip_prefix("USER#")?.to_string();
    let role = item
        .get("user_role")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| Role::parse(s))?;

    Some(User {
        user_id,
        name: item
            .get("user_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        email: item
            .get("user_email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        role,
        supervisor: item
            .get("supervisor_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        active: item
            .get("active")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(true),
        created_at: item
            .get("user_created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        last_login: item
            .get("user_last_login")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    })
}

/// Load the whole directory (pure domain logic, no HTTP)
pub async fn load_users(client: &DynamoClient, table_name: &str) -> Result<Vec<User>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("USER".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("USER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.items().iter().filter_map(user_from_item).collect())
}

/// Load a single directory row
pub async fn load_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Option<User>, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("USER".to_string()))
        .key("SK", AttributeValue::S(format!("USER#{}", user_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().and_then(user_from_item))
}

/// Write the directory row for a user. Called once after Cognito signup
/// and by the admin create endpoint.
pub async fn create_user_record(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: &CreateUserPayload,
    role: Role,
) -> Result<User, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("USER#{}", user_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("USER".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("user_name", AttributeValue::S(payload.name.clone()))
        .item("user_email", AttributeValue::S(payload.email.clone()))
        .item("user_role", AttributeValue::S(role.as_str().to_string()))
        .item("active", AttributeValue::Bool(true))
        .item("user_created_at", AttributeValue::S(now.clone()));

    if let Some(supervisor) = &payload.supervisor {
        builder = builder.item("supervisor_id", AttributeValue::S(supervisor.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(User {
        user_id: user_id.to_string(),
        name: payload.name.clone(),
        email: payload.email.clone(),
        role,
        supervisor: payload.supervisor.clone(),
        active: true,
        created_at: now,
        last_login: None,
    })
}

/// Create the caller's directory row after Cognito signup
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateUserPayload = serde_json::from_slice(body)?;

    let Some(role) = Role::parse(&req.role) else {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": format!("Unknown role: {}", req.role)})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    };

    let user = create_user_record(client, table_name, user_id, &req, role).await?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&user)?.into())
        .map_err(Box::new)?)
}

/// List the directory for assignment pickers and name resolution
pub async fn list_users(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    let users = load_users(client, table_name).await?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "data": users }).to_string().into())
        .map_err(Box::new)?)
}

/// Get the calling user, stamping last_login
pub async fn get_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match load_user(client, table_name, user_id).await? {
        Some(mut user) => {
            let now = chrono::Utc::now().to_rfc3339();
            let _ = client
                .update_item()
                .table_name(table_name)
                .key("PK", AttributeValue::S("USER".to_string()))
                .key("SK", AttributeValue::S(format!("USER#{}", user_id)))
                .update_expression("SET user_last_login = :login")
                .expression_attribute_values(":login", AttributeValue::S(now.clone()))
                .send()
                .await;
            user.last_login = Some(now);

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::to_string(&user)?.into())
                .map_err(Box::new)?)
        }
        None => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "User not found"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?),
    }
}

/// Update the calling user's profile
pub async fn update_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateUserPayload = serde_json::from_slice(body)?;

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = req.name {
        update_expr.push("#user_name = :user_name");
        expr_names.insert("#user_name".to_string(), "user_name".to_string());
        expr_values.insert(":user_name".to_string(), AttributeValue::S(name));
    }

    if let Some(role) = req.role {
        let Some(role) = Role::parse(&role) else {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": format!("Unknown role: {}", role)})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        };
        update_expr.push("#user_role = :user_role");
        expr_names.insert("#user_role".to_string(), "user_role".to_string());
        expr_values.insert(
            ":user_role".to_string(),
            AttributeValue::S(role.as_str().to_string()),
        );
    }

    if let Some(supervisor) = req.supervisor {
        update_expr.push("supervisor_id = :supervisor_id");
        expr_values.insert(":supervisor_id".to_string(), AttributeValue::S(supervisor));
    }

    if let Some(active) = req.active {
        update_expr.push("active = :active");
        expr_values.insert(":active".to_string(), AttributeValue::Bool(active));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("USER".to_string()))
            .key("SK", AttributeValue::S(format!("USER#{}", user_id)))
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

    get_user(client, table_name, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sk: &str, role: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S("USER".to_string())),
            ("SK".to_string(), AttributeValue::S(sk.to_string())),
            (
                "user_name".to_string(),
                AttributeValue::S("Dana Reyes".to_string()),
            ),
            (
                "user_email".to_string(),
                AttributeValue::S("dana@homeward.estate".to_string()),
            ),
            ("user_role".to_string(), AttributeValue::S(role.to_string())),
            (
                "supervisor_id".to_string(),
                AttributeValue::S("S1".to_string()),
            ),
            ("active".to_string(), AttributeValue::Bool(true)),
        ])
    }

    #[test]
    fn user_from_item_maps_directory_row() {
        let user = user_from_item(&item("USER#A1", "Sales Agent")).expect("valid row");
        assert_eq!(user.user_id, "A1");
        assert_eq!(user.role, Role::SalesAgent);
        assert_eq!(user.supervisor.as_deref(), Some("S1"));
        assert!(user.active);
    }

    #[test]
    fn user_from_item_rejects_unknown_role_and_foreign_sk() {
        assert!(user_from_item(&item("USER#A1", "builder")).is_none());
        assert!(user_from_item(&item("LEAD#L1", "Manager")).is_none());
    }
}
