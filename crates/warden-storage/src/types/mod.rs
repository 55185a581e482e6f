//! Type definitions for warden storage.

mod ids;
mod roles;
mod rules;
mod templates;
mod users;

// Re-export all types from submodules
pub use ids::*;
pub use roles::*;
pub use rules::*;
pub use templates::*;
pub use users::*;
