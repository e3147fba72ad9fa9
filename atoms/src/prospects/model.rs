use serde::{Deserialize, Serialize};

/// Early-stage contact captured at first interest; independent lifecycle
/// from Lead.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub interest: String,
    /// How the prospect first reached out ("call", "walk-in", "web", ...)
    pub method: String,
    /// Development or site of interest
    pub site: Option<String>,
    pub remark: Option<String>,
    /// Owning user; empty string for unclaimed public-intake rows
    pub user_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProspectPayload {
    pub name: String,
    pub phone: String,
    pub interest: String,
    pub method: String,
    pub site: Option<String>,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProspectPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub interest: Option<String>,
    pub method: Option<String>,
    pub site: Option<String>,
    pub remark: Option<String>,
}
