use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_sesv2::Client as SesClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use homeward_atoms::prospects::model::CreateProspectPayload;
use homeward_atoms::prospects::service::create_prospect_record;

use crate::email::send_intake_email;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntakeRequest {
    name: String,
    phone: String,
    #[serde(default)]
    interest: String,
    method: String,
    site: Option<String>,
    remark: Option<String>,
}

/// Handle a public prospect-intake form submission: store the prospect
/// unclaimed and notify the sales desk.
pub async fn handle_intake(
    dynamo: &DynamoClient,
    ses_client: &SesClient,
    table_name: &str,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let body_str = match body {
        Body::Text(text) => text,
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    };

    tracing::info!("Prospect intake submission received");

    let intake: IntakeRequest = match serde_json::from_str(body_str) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse intake request: {}", e);
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": format!("Invalid request body: {}", e)})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    if intake.name.trim().is_empty() || intake.phone.trim().is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Please provide a name and phone number"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    if intake.method.trim().is_empty() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({"error": "Please provide a contact method"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    let payload = CreateProspectPayload {
        name: intake.name,
        phone: intake.phone,
        interest: intake.interest,
        method: intake.method,
        site: intake.site,
        remark: intake.remark,
    };

    // Unclaimed row: a manager assigns an owner from the dashboard
    let prospect = create_prospect_record(dynamo, table_name, "", &payload).await?;

    let notify_to =
        std::env::var("NOTIFY_EMAIL").unwrap_or_else(|_| "sales@homeward.estate".to_string());

    match send_intake_email(ses_client, &notify_to, &prospect).await {
        Ok(_) => {
            tracing::info!("Intake notification sent for prospect {}", prospect.id);
            Ok(Response::builder()
                .status(StatusCode::CREATED)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::to_string(&prospect)?.into())
                .map_err(Box::new)?)
        }
        Err(e) => {
            // The prospect row is already written; say so
            tracing::error!("Failed to send intake notification: {}", e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({
                        "error": "Prospect was recorded but the notification email failed",
                        "prospectId": prospect.id,
                    })
                    .to_string()
                    .into(),
                )
                .map_err(Box::new)?)
        }
    }
}
