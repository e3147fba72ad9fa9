use serde::{Deserialize, Serialize};

/// Visit record - a site/office/virtual meeting hosted by an agent
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Visit {
    pub id: String,
    /// Lead the visit was booked for, if any
    pub lead_id: Option<String>,
    /// Hosting user
    pub user_id: String,
    pub visit_type: String, // "site" | "office" | "virtual" (free-form)
    pub visit_date: String,
    pub outcome: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVisitPayload {
    pub lead_id: Option<String>,
    pub visit_type: String,
    pub visit_date: String,
    pub outcome: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVisitPayload {
    pub visit_type: Option<String>,
    pub visit_date: Option<String>,
    pub outcome: Option<String>,
}
