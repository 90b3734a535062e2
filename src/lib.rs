//! # Stagger
//!
//! Staggered fan-out for asynchronous operations.
//!
//! Applies an async operation to every item of a collection, delaying the
//! start of the unit at index `i` by `i × step`, and resolves with all
//! results in input order once every unit has completed — or with the first
//! observed error as soon as any unit fails. Units still pending at that
//! point keep running detached; there is no cancellation.
//!
//! ## Modules
//!
//! - `stagger` - The staggered aggregator and its public entry points
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let words = vec!["Promise", "all", "step"];
//!
//! let upper = stagger::stagger_all(
//!     words,
//!     |word, _index| async move { Ok::<_, std::convert::Infallible>(word.to_uppercase()) },
//!     Duration::from_millis(10),
//! )
//! .await
//! .unwrap();
//!
//! assert_eq!(upper, ["PROMISE", "ALL", "STEP"]);
//! # }
//! ```

mod delay;
pub mod stagger;

pub use stagger::{stagger_all, stagger_all_or_default, stagger_all_with};
