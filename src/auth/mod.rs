// Authentication module
// JWT-based authentication: registration, login, token refresh and profile management

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{optional_auth, require_auth, AuthenticatedUser, MaybeUser};
pub use models::{AuthResponse, User, UserResponse};
pub use service::AuthService;
pub use token::{TokenPair, TokenService, TokenType};
