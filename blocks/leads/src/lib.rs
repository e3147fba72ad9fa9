pub mod assign;
pub mod dashboard;
pub mod leads;
pub mod notify;
pub mod types;
