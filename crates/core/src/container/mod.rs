pub mod builder;
pub mod conditions;
pub mod contracts;
pub mod descriptor;
pub mod engine;
pub mod external;
pub mod graph;
pub mod registry;
pub mod resolver;

pub use builder::{BeanMethodBuilder, Catalog, CatalogBuilder, ComponentBuilder, UnitBuilder};
pub use conditions::{include, ConditionSet, PropertyCondition, ScanFilter};
pub use contracts::ContractIndex;
pub use descriptor::{
    unwrap_handle, wrap_handle, BeanDefinition, ComponentDescriptor, ComponentKind,
    ConstructorSpec, ContractBinding, Instance, Lifetime, ParamRequest, ProductKind, TypeKey,
};
pub use engine::Pipeline;
pub use external::{CollectingSink, ExternalResolver, NullResolver, Registration, RegistrationSink};
pub use graph::{DependencyGraph, NodeId, NodeKind};
pub use registry::InstanceRegistry;
pub use resolver::ArgResolver;
