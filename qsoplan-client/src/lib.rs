//! QSO Plan Client Library
//!
//! This library provides a Rust client for the QSO Plan contact-logging
//! server, covering authentication, contact logging and retrieval, the
//! paired view of two-sided contacts, Maidenhead grid derivation, and
//! the CB/PMR band plans.

pub mod api;
pub mod bands;
pub mod grid;
pub mod models;
pub mod pairing;
pub mod session;
pub mod validate;

mod error;
pub use api::ApiClient;
pub use bands::{Band, Channel};
pub use error::{ClientError, Result};
pub use grid::grid_square;
pub use models::{
    parse_datetime, sort_by_confirmed, CallsignMatch, ContactRecord, Mode, NewContact,
    ProfileUpdate, RankingEntry, RegistrationRequest, RegistrationResponse, TokenPair,
    UserProfile,
};
pub use pairing::{pair_contacts, PairedContact};
pub use session::{Session, SessionStore};

/// Default server URL for a local development setup
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_url() {
        assert!(DEFAULT_SERVER_URL.starts_with("http"));
        assert!(!DEFAULT_SERVER_URL.ends_with('/'));
    }
}
