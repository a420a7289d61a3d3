//! Command handlers.

pub mod project;
pub mod settings;
pub mod value;

pub use project::{run_materialize, run_show};
pub use settings::{run_settings_schema, run_settings_show};
pub use value::{run_delete, run_form, run_get, run_import_config, run_set};
