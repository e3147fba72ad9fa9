use serde::{Deserialize, Serialize};

// ========== LEAD ==========
pub use homeward_atoms::leads::model::{
    CreateLeadPayload, ImportLeadsPayload, Lead, LeadDraft, UpdateLeadPayload, STATUS_ASSIGNED,
    STATUS_CONTACTED, STATUS_NEW,
};

// ========== BATCH ASSIGNMENT ==========

/// POST /leads/assign body: a non-empty batch and exactly one target
#[derive(Debug, Deserialize)]
pub struct AssignLeadsPayload {
    pub lead_ids: Vec<String>,
    pub assigned_to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOutcome {
    Assigned,
    NotFound,
    Forbidden,
    Error,
}

#[derive(Debug, Serialize)]
pub struct LeadAssignment {
    pub lead_id: String,
    pub outcome: AssignOutcome,
}

/// Per-item result list for a batch; `success` is true only when every
/// item assigned, so partial failure is always representable.
#[derive(Debug, Serialize)]
pub struct AssignmentReport {
    pub success: bool,
    pub assigned_to: String,
    pub results: Vec<LeadAssignment>,
}

// ========== BULK IMPORT ==========

#[derive(Debug, Serialize)]
pub struct ImportFailure {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failures: Vec<ImportFailure>,
}
