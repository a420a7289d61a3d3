//! # confhub-app
//!
//! Configuration use cases: loading with remote fallback, per-project
//! caching, resolution, and persisted mutation.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod cache;
pub mod current;
pub mod deps;
pub mod engine;
pub mod loader;
pub mod mutator;
pub mod scope;

pub use cache::ProjectConfigCache;
pub use current::{ProjectSession, current_project};
pub use deps::EngineDeps;
pub use engine::{ConfigEngine, ResolveRequest};
pub use loader::{ConfigLoader, LoadOptions};
pub use mutator::{ConfigMutator, MutationOutcome, render_user_document};
pub use scope::{EngineOptions, GLOBAL_LOCATION, ProjectScope};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use confhub_domain::domain_crate_version;
    use confhub_ports::ports_crate_version;
    use confhub_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        assert!(!app_crate_version().is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
