mod build;
mod health;

pub use build::*;
pub use health::*;
