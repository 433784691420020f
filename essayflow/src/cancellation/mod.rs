//! Cooperative cancellation for in-flight workflows.

mod token;

pub use token::CancellationToken;
