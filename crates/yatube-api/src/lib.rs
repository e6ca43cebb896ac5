pub mod about;
pub mod auth;
pub mod cache;
pub mod comments;
pub mod error;
pub mod follows;
pub mod forms;
pub mod media;
pub mod middleware;
pub mod pages;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
