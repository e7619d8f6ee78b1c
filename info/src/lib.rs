//! Build information baked in at compile time.

pub const NAME: &str = env!("CARGO_PKG_NAME");

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The VCS revision, if the build environment provides one.
pub const REVISION: Option<&str> = option_env!("TRACKER_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");
