//! Use-case services over the outline engine.
//!
//! # Responsibility
//! - Orchestrate store, editor, resolver and repository calls into the
//!   input-event level API a text editor surface drives.
//! - Keep UI layers decoupled from storage details.

pub mod debounce;
pub mod outline_service;

pub use debounce::Debouncer;
pub use outline_service::{
    KeySignal, LinkSuggestions, OutlineService, ServiceError, ServiceResult, TextUpdate,
};
