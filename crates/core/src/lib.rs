pub mod config;
pub mod container;
pub mod errors;

// Re-export key types for convenience
pub use config::{MapProperties, PropertySource};
pub use container::{
    unwrap_handle, wrap_handle, Catalog, CatalogBuilder, CollectingSink, ComponentKind,
    ConditionSet, ExternalResolver, Instance, InstanceRegistry, Lifetime, NullResolver,
    ParamRequest, Pipeline, PropertyCondition, Registration, RegistrationSink, ScanFilter, TypeKey,
};
pub use errors::CoreError;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine information
pub const ENGINE_NAME: &str = "armature";

/// Get engine version
pub fn version() -> &'static str {
    VERSION
}

/// Get engine name
pub fn name() -> &'static str {
    ENGINE_NAME
}
