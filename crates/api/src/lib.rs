pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;

use sessionauth_auth::AuthService;

pub struct AppState {
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }
}

pub use routes::create_router;
