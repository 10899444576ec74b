//! Identity and authorization: sessions, roles, permissions, and the token
//! state machine.
//!
//! - `Session`: the persisted record of one authenticated user
//! - `Role`: closed role set with the management-chain partial order
//! - `permissions`: static access matrix plus the `is_allowed` gate
//! - `TokenManager`: access-token renewal with race-safe persistence

pub mod permissions;
pub mod role;
pub mod session;
pub mod tokens;

pub use permissions::{ensure_allowed, is_allowed, Operation, Resource};
pub use role::Role;
pub use session::Session;
pub use tokens::{classify, TokenManager, TokenState};
