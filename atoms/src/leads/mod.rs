pub mod model;

pub use model::{
    CreateLeadPayload, ImportLeadsPayload, Lead, LeadDraft, UpdateLeadPayload, STATUS_ASSIGNED,
    STATUS_CONTACTED, STATUS_NEW,
};
