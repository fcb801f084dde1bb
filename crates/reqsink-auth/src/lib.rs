//! Authentication primitives for the webhook sink
//!
//! Password hashing (Argon2id) and stateless session tokens (JWT in an
//! HttpOnly cookie). How sessions are validated lives entirely here; the
//! capture pipeline only ever sees a "request is self-originated" boolean.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::{issue_session, validate_session, SessionClaims, SessionError};
