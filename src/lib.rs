mod auth;
mod bearer;
mod config;
mod directory;
mod error;
pub mod password;
mod routes;
mod token;
mod types;

pub use auth::*;
pub use bearer::bearer_token;
pub use config::*;
pub use directory::*;
pub use error::*;
pub use routes::*;
pub use token::*;
pub use types::*;
