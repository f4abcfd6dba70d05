pub mod endpoints;
mod gateway;
pub mod models;
pub mod shape;

pub use gateway::{ApiRequest, CallSite, DEFAULT_API_URL, Gateway};
