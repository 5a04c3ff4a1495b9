//! Message kinds shipped with the crate.

pub mod orders;

pub use orders::{Order, OrderLine, Orders, Party};
