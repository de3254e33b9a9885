pub mod account_rules;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, AuthSession, PasswordResetTicket, PublicProfile};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod search;
pub use search::{SearchError, SearchService};

pub mod token;
pub use token::{TokenError, TokenSigner};
