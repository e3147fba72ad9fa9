pub mod model;
pub mod service;

pub use model::{CreateProspectPayload, Prospect, UpdateProspectPayload};
pub use service::*;
