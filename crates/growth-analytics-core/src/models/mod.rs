//! Domain models for the growth analytics engine.

mod growth;
mod measurement;
mod reference;

pub use growth::*;
pub use measurement::*;
pub use reference::*;
