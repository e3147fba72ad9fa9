use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use homeward_atoms::users::model::{Role, User};
use lambda_http::{http::StatusCode, Body, Error, Response};

use crate::assign::lead_visible;
use crate::types::{
    CreateLeadPayload, ImportFailure, ImportLeadsPayload, ImportReport, Lead, LeadDraft,
    UpdateLeadPayload, STATUS_NEW,
};

/// Map a lead row:
/// PK = "LEAD"
/// SK = "LEAD#{lead_id}"
pub fn lead_from_item(item: &HashMap<String, AttributeValue>) -> Option<Lead> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let id = sk.strip_prefix("LEAD#")?.to_string();

    Some(Lead {
        id,
        name: item
            .get("lead_name")
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
        status: item
            .get("lead_status")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| STATUS_NEW.to_string()),
        assigned_to: item
            .get("assigned_to")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        prospect_id: item
            .get("prospect_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        date_added: item
            .get("date_added")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// Load every lead row (pure domain logic, no HTTP)
pub async fn load_leads(client: &DynamoClient, table_name: &str) -> Result<Vec<Lead>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("LEAD".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("LEAD#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.items().iter().filter_map(lead_from_item).collect())
}

/// Load a single lead
pub async fn load_lead(
    client: &DynamoClient,
    table_name: &str,
    lead_id: &str,
) -> Result<Option<Lead>, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("LEAD".to_string()))
        .key("SK", AttributeValue::S(format!("LEAD#{}", lead_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().and_then(lead_from_item))
}

/// Write a lead row and return the model
pub async fn put_lead_record(
    client: &DynamoClient,
    table_name: &str,
    name: &str,
    phone: &str,
    interest: &str,
    status: &str,
    prospect_id: Option<&str>,
) -> Result<Lead, String> {
    let lead_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("LEAD".to_string()))
        .item("SK", AttributeValue::S(format!("LEAD#{}", lead_id)))
        .item("lead_name", AttributeValue::S(name.to_string()))
        .item("phone", AttributeValue::S(phone.to_string()))
        .item("interest", AttributeValue::S(interest.to_string()))
        .item("lead_status", AttributeValue::S(status.to_string()))
        .item("date_added", AttributeValue::S(now.clone()));

    if let Some(prospect_id) = prospect_id {
        builder = builder.item("prospect_id", AttributeValue::S(prospect_id.to_string()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Lead {
        id: lead_id,
        name: name.to_string(),
        phone: phone.to_string(),
        interest: interest.to_string(),
        status: status.to_string(),
        assigned_to: None,
        prospect_id: prospect_id.map(|s| s.to_string()),
        date_added: now,
    })
}

/// List leads visible to the caller: {success, data}
pub async fn list_leads(
    client: &DynamoClient,
    table_name: &str,
    viewer: &User,
    users: &[User],
) -> Result<Response<Body>, Error> {
    match load_leads(client, table_name).await {
        Ok(leads) => {
            let visible: Vec<&Lead> = leads
                .iter()
                .filter(|lead| lead_visible(viewer, users, lead))
                .collect();

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"success": true, "data": visible})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!("Failed to list leads: {}", e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::json!({ "error": e }).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// Create a lead by manual entry
pub async fn create_lead(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateLeadPayload = serde_json::from_slice(body)?;

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

    let status = req.status.as_deref().unwrap_or(STATUS_NEW);
    let lead = put_lead_record(
        client,
        table_name,
        &req.name,
        &req.phone,
        &req.interest,
        status,
        req.prospect_id.as_deref(),
    )
    .await?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&lead)?.into())
        .map_err(Box::new)?)
}

/// Get a specific lead
pub async fn get_lead(
    client: &DynamoClient,
    table_name: &str,
    lead_id: &str,
) -> Result<Response<Body>, Error> {
    match load_lead(client, table_name, lead_id).await? {
        Some(lead) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&lead)?.into())
            .map_err(Box::new)?),
        None => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Lead not found"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?),
    }
}

/// PATCH /leads/{id}: status-only updates and direct reassignment.
/// When assigned_to is present the target must be an active Supervisor
/// or Sales Agent.
pub async fn update_lead(
    client: &DynamoClient,
    table_name: &str,
    lead_id: &str,
    users: &[User],
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateLeadPayload = serde_json::from_slice(body)?;

    if load_lead(client, table_name, lead_id).await?.is_none() {
        return Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Lead not found"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    if let Some(target_id) = &req.assigned_to {
        let assignable = users.iter().any(|u| {
            u.user_id == *target_id
                && u.active
                && matches!(u.role, Role::Supervisor | Role::SalesAgent)
        });
        if !assignable {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "assigned_to must be an active supervisor or sales agent"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    }

    let mut update_expr = vec![];
    let mut expr_values = HashMap::new();

    if let Some(status) = req.status {
        update_expr.push("lead_status = :lead_status");
        expr_values.insert(":lead_status".to_string(), AttributeValue::S(status));
    }
    if let Some(assigned_to) = req.assigned_to {
        update_expr.push("assigned_to = :assigned_to");
        expr_values.insert(":assigned_to".to_string(), AttributeValue::S(assigned_to));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("LEAD".to_string()))
            .key("SK", AttributeValue::S(format!("LEAD#{}", lead_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_lead(client, table_name, lead_id).await
}

/// One draft row is importable when name, phone and interest are all
/// present and non-empty.
pub fn validate_draft(draft: &LeadDraft) -> Result<(), String> {
    let missing = |field: &Option<String>| field.as_deref().map(str::trim).unwrap_or("").is_empty();

    if missing(&draft.name) {
        return Err("missing name".to_string());
    }
    if missing(&draft.phone) {
        return Err("missing phone".to_string());
    }
    if missing(&draft.interest) {
        return Err("missing interest".to_string());
    }
    Ok(())
}

/// Bulk import: each row validated individually, response reports exactly
/// how many imported and how many skipped with per-row reasons.
pub async fn import_leads(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ImportLeadsPayload = serde_json::from_slice(body)?;

    if req.leads.is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "No leads to import"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    let mut report = ImportReport {
        imported: 0,
        skipped: 0,
        failures: vec![],
    };

    for (row, draft) in req.leads.iter().enumerate() {
        if let Err(reason) = validate_draft(draft) {
            report.skipped += 1;
            report.failures.push(ImportFailure { row, reason });
            continue;
        }

        // fields are present after validate_draft
        let name = draft.name.clone().unwrap_or_default();
        let phone = draft.phone.clone().unwrap_or_default();
        let interest = draft.interest.clone().unwrap_or_default();
        let status = draft.status.as_deref().unwrap_or(STATUS_NEW);

        match put_lead_record(client, table_name, &name, &phone, &interest, status, None).await {
            Ok(_) => report.imported += 1,
            Err(e) => {
                tracing::error!("Failed to import lead row {}: {}", row, e);
                report.skipped += 1;
                report.failures.push(ImportFailure { row, reason: e });
            }
        }
    }

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&report)?.into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: Option<&str>, phone: Option<&str>, interest: Option<&str>) -> LeadDraft {
        LeadDraft {
            name: name.map(|s| s.to_string()),
            phone: phone.map(|s| s.to_string()),
            interest: interest.map(|s| s.to_string()),
            status: None,
        }
    }

    #[test]
    fn draft_with_all_fields_is_importable() {
        assert!(validate_draft(&draft(Some("Ana Silva"), Some("555-0101"), Some("2BR"))).is_ok());
    }

    #[test]
    fn draft_missing_phone_is_reported_as_such() {
        let err = validate_draft(&draft(Some("Ana Silva"), None, Some("2BR")))
            .expect_err("phone is required");
        assert_eq!(err, "missing phone");

        let err = validate_draft(&draft(Some("Ana Silva"), Some("   "), Some("2BR")))
            .expect_err("blank phone is missing");
        assert_eq!(err, "missing phone");
    }

    #[test]
    fn two_good_rows_and_one_bad_row_split_two_one() {
        let rows = vec![
            draft(Some("Ana Silva"), Some("555-0101"), Some("2BR")),
            draft(Some("Ben Okoro"), None, Some("3BR")),
            draft(Some("Caro Lund"), Some("555-0103"), Some("studio")),
        ];
        let ok = rows.iter().filter(|d| validate_draft(d).is_ok()).count();
        let bad: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, d)| validate_draft(d).is_err())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ok, 2);
        assert_eq!(bad, vec![1]);
    }

    #[test]
    fn lead_from_item_round_trips_assignment_fields() {
        let item = HashMap::from([
            ("PK".to_string(), AttributeValue::S("LEAD".to_string())),
            ("SK".to_string(), AttributeValue::S("LEAD#L1".to_string())),
            (
                "lead_name".to_string(),
                AttributeValue::S("Ana Silva".to_string()),
            ),
            ("phone".to_string(), AttributeValue::S("555-0101".to_string())),
            (
                "lead_status".to_string(),
                AttributeValue::S("assigned".to_string()),
            ),
            (
                "assigned_to".to_string(),
                AttributeValue::S("A1".to_string()),
            ),
        ]);
        let lead = lead_from_item(&item).expect("valid row");
        assert_eq!(lead.id, "L1");
        assert_eq!(lead.status, "assigned");
        assert_eq!(lead.assigned_to.as_deref(), Some("A1"));
    }

    #[test]
    fn lead_from_item_defaults_status_to_new() {
        let item = HashMap::from([
            ("PK".to_string(), AttributeValue::S("LEAD".to_string())),
            ("SK".to_string(), AttributeValue::S("LEAD#L2".to_string())),
        ]);
        let lead = lead_from_item(&item).expect("valid row");
        assert_eq!(lead.status, STATUS_NEW);
        assert!(lead.assigned_to.is_none());
    }
}
