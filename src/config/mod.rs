//! Layered configuration: parsing, loading and merging.

mod layer;
mod loader;
mod merge;

pub use layer::{ConfigLayer, Section, Value};
pub use loader::{load_layer_paths, read_layer, split_path_list};
pub use merge::{
    COMMON_SECTION, ENVIRONMENT_SECTION, EnvMap, MergedConfig, SoftwareDefinition, apply_override,
};
