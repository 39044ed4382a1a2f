pub mod cookie;
pub mod credentials;
pub mod error;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use cookie::{extract_cookie, CookieConfig, SameSite};
pub use credentials::CredentialVerifier;
pub use error::{AuthError, Result};
pub use password::PasswordHasher;
pub use service::{AuthService, ClientInfo, LoginRequest, SignupRequest};
pub use session::{IssuedSession, SessionConfig, SessionManager};
pub use token::generate_session_token;
