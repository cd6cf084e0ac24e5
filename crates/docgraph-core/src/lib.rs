//! docgraph-core: Shared types, call context, and configuration for the
//! on-chain document graph client.
//!
//! This crate provides the foundational pieces used by the other crates:
//! - Document, content, and edge shapes matching the contract's tables
//! - Action and permission shapes for submissions
//! - Cancellation and deadline handling for remote calls
//! - Configuration loading

pub mod config;
pub mod context;
pub mod error;
pub mod types;

pub use context::{CallContext, CancellationToken, Interrupt};
pub use error::CoreError;
pub use types::{
    AccountName, Action, Checksum256, Content, ContentGroup, Document, Edge, FlexValue, Name,
    PermissionLevel,
};
