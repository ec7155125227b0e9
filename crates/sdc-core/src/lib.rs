//! Core types and trait definitions for the SD Connect messaging core.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`kv::KvStore`]; the HTTP layer and the CLI
//! client build on the repositories and the messaging gate defined here.

pub mod conversation;
pub mod credit;
pub mod error;
pub mod gate;
pub mod kv;
pub mod profile;
pub mod seed;
pub mod vote;

pub use error::{Error, ErrorKind, Result};
