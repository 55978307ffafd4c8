//! HTTP access to the student collection.
//!
//! [`StudentApi`] is the seam between the record store and the network. The
//! production implementation is [`HttpStudentClient`]; tests substitute a
//! scripted in-memory implementation.

mod client;
mod error;

pub use client::{HttpStudentClient, StudentApi};
pub use error::{ApiError, ErrorBody};
