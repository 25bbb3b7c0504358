//! Step Pipeline Module
//!
//! Each subject type is bootstrapped by a fixed, ordered list of named
//! indexing steps. The core only knows the step *names* and their order; the
//! implementations (chain scanning, relation building, scoring) are supplied
//! by indexing services outside this crate and registered at startup.
//!
//! ## Submodules
//! - **`steps`**: The typed mapping from subject type to its step list, plus
//!   the hard-coded average step durations used for ETA.
//! - **`registry`**: Maps step names to executable async handlers (the Step
//!   Pipeline Runner port).

pub mod registry;
pub mod steps;

#[cfg(test)]
mod tests;
