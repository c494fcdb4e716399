//! dynasql-common - Shared error types for the dynasql SQL-to-DynamoDB adapter
//!
//! This crate provides the error taxonomy shared by the query translation
//! engine and any future protocol adapters built on top of it.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

pub use error::{Error, ErrorKind, Result};
