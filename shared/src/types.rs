// ========== USER ==========
pub use homeward_atoms::users::model::{CreateUserPayload, Role, UpdateUserPayload, User};

// ========== LEAD ==========
pub use homeward_atoms::leads::model::{
    CreateLeadPayload, ImportLeadsPayload, Lead, LeadDraft, UpdateLeadPayload,
};

// ========== PROSPECT ==========
pub use homeward_atoms::prospects::model::{CreateProspectPayload, Prospect, UpdateProspectPayload};

// ========== VISIT ==========
pub use homeward_atoms::visits::model::{CreateVisitPayload, UpdateVisitPayload, Visit};

// ========== MESSAGE ==========
pub use homeward_atoms::messages::model::{CreateMessagePayload, Message};
