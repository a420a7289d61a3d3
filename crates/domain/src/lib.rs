//! # confhub-domain
//!
//! Configuration model and pure resolution logic:
//!
//! - **Project** - `ProjectId`, `ProjectMetadata`
//! - **System** - `SystemConfig` with its flattened lookup view, INI codec
//! - **Snapshot** - `ConfigSnapshot`, `Origin`
//! - **Key paths** - read paths, validated write targets
//! - **Resolution / mutation** - `resolve`, `apply_set`, `apply_delete`
//! - **Errors** - `ConfigError`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use confhub_shared::shared_crate_version;

pub mod error;
pub mod ini;
pub mod json_path;
pub mod key_path;
pub mod mutation;
pub mod project;
pub mod resolve;
pub mod snapshot;
pub mod system;
pub mod value;
pub mod well_known;

pub use error::ConfigError;
pub use ini::{IniParseError, parse_ini, render_ini};
pub use key_path::{
    CONFIG_PREFIX, KeyPath, MutationTarget, SYSTEM_PREFIX, UnsupportedKeyPath, UnsupportedReason,
};
pub use mutation::{Touched, apply_delete, apply_form_fields, apply_set, replace_user};
pub use project::{ProjectId, ProjectIdError, ProjectMetadata};
pub use resolve::{ResolvedValue, lookup, resolve};
pub use snapshot::{ConfigSnapshot, Origin};
pub use system::{KEY_SECTION, Section, Sections, SystemConfig, qualified_name};
pub use value::{coerce_value, display_value};
pub use well_known::{WellKnown, WellKnownKey};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        assert!(!domain_crate_version().is_empty());
    }

    #[test]
    fn domain_depends_on_shared() {
        assert!(!shared_crate_version().is_empty());
    }
}
