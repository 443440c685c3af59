//! Core modules: validation, errors, flow state and form data
pub mod error;
pub mod flow;
pub mod recipients;
pub mod sanitize;
pub mod validation;
