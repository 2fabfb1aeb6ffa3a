//! Record services: typed, per-entity accessors over [`crate::db::Database`].
//!
//! Services do not re-validate input and pass storage errors through
//! unchanged.

mod patients;
mod settings;
mod users;
mod visits;

pub use patients::*;
pub use settings::*;
pub use users::*;
pub use visits::*;
