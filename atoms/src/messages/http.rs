use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateMessagePayload, Message};
use super::service;

/// List messages where the caller is sender or recipient
pub async fn list_messages(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let messages = service::load_messages(client, table_name)
        .await
        .map_err(|e| Box::new(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let mine: Vec<&Message> = messages
        .iter()
        .filter(|m| m.recipient_id == user_id || m.sender_id == user_id)
        .collect();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "data": mine }).to_string().into())
        .map_err(Box::new)?)
}

pub async fn create_message(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateMessagePayload = serde_json::from_slice(body)?;

    if payload.recipient_id.trim().is_empty() || payload.body.trim().is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Recipient and body are required"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    match service::create_message(client, table_name, user_id, payload).await {
        Ok(message) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&message)?.into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({ "error": e }).to_string().into())
            .map_err(Box::new)?),
    }
}
