//! Domain layer - Pure business abstractions
//!
//! Framework-agnostic error type and the user-facing messages returned by
//! membership and subscription operations.

pub mod errors;
pub mod messages;

pub use errors::DomainError;
