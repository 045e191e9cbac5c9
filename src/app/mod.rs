#[cfg(feature = "cli")]
pub mod commands;
pub mod render;

#[cfg(feature = "cli")]
pub use commands::App;
