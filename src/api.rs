//! HTTP driving adapters. Each submodule builds the routes for one group of endpoints and
//! translates between DTOs, domain calls, and HTTP responses.

pub mod auth;
pub mod swagger_main;
pub mod task;
#[cfg(test)]
pub(crate) mod test_util;
