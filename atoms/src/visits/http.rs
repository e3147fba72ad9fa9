use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateVisitPayload, UpdateVisitPayload, Visit};
use super::service;
use crate::users::model::{visible_owner_ids, User};

/// List visits scoped to the viewer's team
pub async fn list_visits(
    client: &DynamoClient,
    table_name: &str,
    viewer: &User,
    users: &[User],
) -> Result<Response<Body>, Error> {
    let visits = service::load_visits(client, table_name)
        .await
        .map_err(|e| Box::new(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let scoped: Vec<&Visit> = match visible_owner_ids(viewer, users) {
        None => visits.iter().collect(),
        Some(ids) => visits.iter().filter(|v| ids.contains(&v.user_id)).collect(),
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "data": scoped }).to_string().into())
        .map_err(Box::new)?)
}

pub async fn create_visit(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateVisitPayload = serde_json::from_slice(body)?;

    if payload.visit_type.trim().is_empty() || payload.visit_date.trim().is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Visit type and date are required"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    match service::create_visit(client, table_name, user_id, payload).await {
        Ok(visit) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&visit)?.into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({ "error": e }).to_string().into())
            .map_err(Box::new)?),
    }
}

pub async fn update_visit(
    client: &DynamoClient,
    table_name: &str,
    visit_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateVisitPayload = serde_json::from_slice(body)?;

    match service::update_visit(client, table_name, visit_id, payload).await {
        Ok(visit) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&visit)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Visit not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({ "error": e }).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({ "error": e }).to_string().into())
            .map_err(Box::new)?),
    }
}
