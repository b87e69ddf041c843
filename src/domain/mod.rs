//! Business rules for accounts and tasks. Each submodule exposes a service through
//! `driving_ports` and reaches the outside world only through `driven_ports`.

pub mod task;
pub mod user;

#[cfg(test)]
pub mod test_util;
