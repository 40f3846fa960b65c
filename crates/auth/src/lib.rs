//! The acting user and what it may override.
//!
//! Authentication happens elsewhere; this crate only answers what the logged
//! in user is allowed to override.

pub mod permissions;
pub mod user;

pub use permissions::Permission;
pub use user::LoginUser;
