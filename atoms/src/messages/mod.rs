pub mod http;
pub mod model;
pub mod service;

pub use model::{CreateMessagePayload, Message};
pub use http::*;
