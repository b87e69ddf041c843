//! Authentication: password hashing, signed session tokens carried in an HTTP-only
//! cookie, and the extractor that turns that cookie back into a user.

pub mod extract;
pub mod password;
pub mod session;

pub use extract::AuthenticatedUser;
pub use session::{AUTH_COOKIE_NAME, SessionKeys};
