//! Client side of the task board: an HTTP client for the API, a reducer-style store that
//! mirrors server state for rendering, and a [board::TaskBoard] that ties the two together.

pub mod api_client;
pub mod board;
pub mod store;

pub use api_client::{ApiClient, ClientError};
pub use board::TaskBoard;
pub use store::{Action, Store};
