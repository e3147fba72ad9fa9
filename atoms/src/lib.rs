pub mod leads;
pub mod messages;
pub mod prospects;
pub mod users;
pub mod visits;
