//! External tool invocation.
//!
//! Turns a validated [`InvocationRequest`] plus a deterministic
//! [`CommandPlan`] into exactly one blocking child process with captured
//! output, then classifies the outcome. A zero exit code alone is not
//! success; the declared output file must exist afterwards.

mod plan;
mod request;
mod runner;

pub use plan::{Activation, CommandPlan};
pub use request::InvocationRequest;
pub use runner::{InvocationResult, invoke};
