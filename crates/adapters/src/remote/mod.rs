//! Remote configuration service adapters.

mod http;
pub mod wire;

pub use http::{DisabledRemoteConfig, HttpRemoteConfig, HttpRemoteConfigOptions};
pub use wire::{FetchResponse, ProjectPayload};
