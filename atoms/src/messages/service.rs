use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;

use super::model::{CreateMessagePayload, Message};

pub fn message_from_item(item: &HashMap<String, AttributeValue>) -> Option<Message> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let message_id = sk.strip_prefix("MESSAGE#")?.to_string();

    Some(Message {
        message_id,
        sender_id: item
            .get("sender_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        recipient_id: item
            .get("recipient_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        subject: item
            .get("subject")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        body: item
            .get("body")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        sent_at: item
            .get("sent_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// Load all message rows (pure domain logic, no HTTP)
pub async fn load_messages(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<Message>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("MESSAGE".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("MESSAGE#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result.items().iter().filter_map(message_from_item).collect())
}

/// Store a message from `sender_id`
pub async fn create_message(
    client: &DynamoClient,
    table_name: &str,
    sender_id: &str,
    payload: CreateMessagePayload,
) -> Result<Message, String> {
    let message_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("MESSAGE".to_string()))
        .item("SK", AttributeValue::S(format!("MESSAGE#{}", message_id)))
        .item("sender_id", AttributeValue::S(sender_id.to_string()))
        .item(
            "recipient_id",
            AttributeValue::S(payload.recipient_id.clone()),
        )
        .item("body", AttributeValue::S(payload.body.clone()))
        .item("sent_at", AttributeValue::S(now.clone()));

    if let Some(subject) = &payload.subject {
        builder = builder.item("subject", AttributeValue::S(subject.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Message {
        message_id,
        sender_id: sender_id.to_string(),
        recipient_id: payload.recipient_id,
        subject: payload.subject,
        body: payload.body,
        sent_at: now,
    })
}
