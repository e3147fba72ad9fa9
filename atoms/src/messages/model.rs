use serde::{Deserialize, Serialize};

/// User-to-user message; feeds the message notification feed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub subject: Option<String>,
    pub body: String,
    pub sent_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessagePayload {
    pub recipient_id: String,
    pub subject: Option<String>,
    pub body: String,
}
