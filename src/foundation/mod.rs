pub mod clock;
pub mod color;
pub mod core;
pub mod ease;
pub mod error;
