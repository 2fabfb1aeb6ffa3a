//! Domain models for the clinic records system.

mod form;
mod patient;
mod setting;
mod user;
mod visit;

pub use form::*;
pub use patient::*;
pub use setting::*;
pub use user::*;
pub use visit::*;
