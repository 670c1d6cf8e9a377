//! Commands executed against the container runtime.
//!
//! Each command is a single-responsibility, cancellable unit with an
//! `execute(cancel) -> Result` contract. The reconciliation layer decides
//! which commands to issue and in what order; commands themselves never
//! retry.

pub mod create;
pub mod translate;

pub use create::CreateCommand;
pub use translate::translate;
