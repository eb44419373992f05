//! Plugins shipped with the host bundler.

mod clean;
mod define;
mod replacement;

pub use clean::CleanPlugin;
pub use define::DefinePlugin;
pub use replacement::NormalModuleReplacementPlugin;
