//! # thinkloop-error
//!
//! Unified error handling for thinkloop, following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., RateLimited, ConfigInvalid)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use thinkloop_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ConfigInvalid, "OPENAI_API_KEY is not set")
//!         .with_operation("config::from_env")
//!         .with_context("variable", "OPENAI_API_KEY"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Fallible functions return `Result<T, thinkloop_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using thinkloop Error
pub type Result<T> = std::result::Result<T, Error>;
