//! Descriptor-style client API.
//!
//! Scripting bindings expose TFS as `open` returning an integer
//! descriptor, followed by `write`/`read` and a `close` that yields the
//! file name, plus one-shot `put`/`get`. [`TfsHandles`] keeps that shape
//! on top of a shared session and the transfer engine.

mod error;
mod handles;

pub use error::HandleError;
pub use handles::{Fd, TfsHandles};

/// Storage protocol generation this client speaks.
pub const SUPPORTS: &str = "tfs-stable-2.0";

/// Version information reported to binding users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: &'static str,
    pub supports: &'static str,
}

/// Returns the crate version and supported protocol generation.
pub fn version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        supports: SUPPORTS,
    }
}
