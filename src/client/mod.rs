pub mod api;
pub mod cache;
pub mod manager;

pub use api::{HttpApi, RawResponse, ShizouApi};
pub use manager::ClientManager;
