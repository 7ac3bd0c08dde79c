//! Core primitives for the FOLIO client
//!
//! This crate holds the parts of the client that are independent of the
//! HTTP transport:
//!
//! - **Job polling**: a bounded wait over an eventually-consistent status probe,
//!   with a not-found tolerance and an overall timeout
//! - **Signature-keyed retry**: a fixed-count, fixed-delay retry that only fires
//!   for errors the caller explicitly recognises
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::poll::{wait_until_complete, PollConfig, PollOutcome, WaitOutcome};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = wait_until_complete(&PollConfig::default(), || async {
//!     Ok::<_, std::io::Error>(PollOutcome::Success)
//! })
//! .await?;
//! assert_eq!(outcome, WaitOutcome::Completed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod duration_secs;
pub mod poll;
pub mod retry;

pub use poll::{
    wait_for, wait_until_complete, PollConfig, PollError, PollOutcome, WaitOutcome, Waited,
};
pub use retry::{retry_when, RetryPolicy};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::poll::{
        wait_for, wait_until_complete, PollConfig, PollError, PollOutcome, WaitOutcome, Waited,
    };
    pub use crate::retry::{retry_when, RetryPolicy};
}
