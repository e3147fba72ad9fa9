pub mod model;
pub mod service;

pub use model::{CreateUserPayload, Role, UpdateUserPayload, User};
pub use service::*;
