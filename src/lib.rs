pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod resources;
pub mod routes;
pub mod session;
pub mod types;

pub use api::ApiClient;
pub use auth::AuthController;
pub use error::{ClientError, ClientResult, StorageError};
pub use resources::Resources;
pub use session::{AuthState, Session};
