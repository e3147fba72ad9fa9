use serde::{Deserialize, Serialize};

pub const STATUS_NEW: &str = "new";
pub const STATUS_CONTACTED: &str = "contacted";
pub const STATUS_ASSIGNED: &str = "assigned";

/// Lead domain model. `status` is free-form by design; the well-known
/// values are the STATUS_* constants above.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub interest: String,
    pub status: String,
    pub assigned_to: Option<String>,
    /// Denormalized back-reference to the prospect this lead was promoted from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prospect_id: Option<String>,
    pub date_added: String,
}

impl Lead {
    pub fn is_assigned(&self) -> bool {
        self.status == STATUS_ASSIGNED
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadPayload {
    pub name: String,
    pub phone: String,
    pub interest: String,
    pub status: Option<String>,
    pub prospect_id: Option<String>,
}

/// PATCH /leads/{id} body: status-only updates and direct reassignment
#[derive(Debug, Deserialize)]
pub struct UpdateLeadPayload {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
}

/// One row of a bulk import. Fields are optional so a malformed row is
/// reported per-row instead of failing the whole body deserialization.
#[derive(Debug, Deserialize)]
pub struct LeadDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportLeadsPayload {
    pub leads: Vec<LeadDraft>,
}
