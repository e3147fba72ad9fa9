pub mod http;
pub mod model;
pub mod service;

pub use model::{CreateVisitPayload, UpdateVisitPayload, Visit};
pub use http::*;
