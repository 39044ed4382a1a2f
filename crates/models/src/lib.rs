// Core modules
pub mod account;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use account::{Account, CREDENTIALS_PROVIDER};
pub use session::{NewSession, Session};
pub use user::{NewUser, User, UserProfile};
