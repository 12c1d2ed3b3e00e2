//! Command handlers
//!
//! This module contains the handlers a presentation layer calls to drive
//! a capture session.

pub mod session;
