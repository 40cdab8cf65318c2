//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and translate store failures into
//! domain errors so route handlers can stay focused on protocol translation
//! and auth plumbing.

pub mod auth;
pub mod board;
pub mod session;
