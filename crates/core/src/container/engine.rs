//! The startup pipeline: conditional filtering, contract indexing, graph
//! construction, topological ordering, instantiation and final
//! registration. Runs once, synchronously; either every component is wired
//! or the run fails fast with no partial result published.

use std::collections::{HashMap, HashSet};

use crate::config::{MapProperties, PropertySource};
use crate::container::builder::Catalog;
use crate::container::conditions::{self, ScanFilter};
use crate::container::contracts::ContractIndex;
use crate::container::descriptor::{
    BeanDefinition, ComponentDescriptor, Instance, Lifetime, ProductKind, TypeKey,
};
use crate::container::external::{
    ExternalResolver, NullResolver, Registration, RegistrationSink,
};
use crate::container::graph::{DependencyGraph, NodeId, NodeKind};
use crate::container::registry::InstanceRegistry;
use crate::container::resolver::ArgResolver;
use crate::errors::CoreError;

/// One startup resolution run over a discovery catalog.
///
/// Not re-entrant and not meant for concurrent invocation: if several
/// initializations must occur, the caller serializes them.
pub struct Pipeline {
    catalog: Catalog,
    active_profile: Option<String>,
    properties: Box<dyn PropertySource>,
    external: Box<dyn ExternalResolver>,
    scan: ScanFilter,
}

impl Pipeline {
    /// Start a pipeline over a discovery catalog
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            active_profile: None,
            properties: Box::new(MapProperties::new()),
            external: Box::new(NullResolver),
            scan: ScanFilter::new(),
        }
    }

    /// Set the active deployment profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.active_profile = Some(profile.into());
        self
    }

    /// Set the property source consulted by property conditions
    pub fn with_properties(mut self, properties: impl PropertySource + 'static) -> Self {
        self.properties = Box::new(properties);
        self
    }

    /// Set the external resolver used for types outside the engine's graph
    pub fn with_external(mut self, external: impl ExternalResolver + 'static) -> Self {
        self.external = Box::new(external);
        self
    }

    /// Set the module-path scan filter applied to candidates
    pub fn with_scan_filter(mut self, scan: ScanFilter) -> Self {
        self.scan = scan;
        self
    }

    /// Run the pipeline to completion.
    ///
    /// Emits one registration per concrete component and per bean instance
    /// into `sink` and returns the wired registry. Any error aborts the
    /// whole run.
    pub fn run(self, sink: &mut dyn RegistrationSink) -> Result<InstanceRegistry, CoreError> {
        let profile = self.active_profile.as_deref();
        let (components, beans) =
            filter_catalog(self.catalog, profile, self.properties.as_ref(), &self.scan);
        tracing::info!(
            components = components.len(),
            beans = beans.len(),
            profile = profile.unwrap_or("<none>"),
            "resolved candidate set"
        );

        let contracts = ContractIndex::build(&components);
        let graph = DependencyGraph::build(&components, &beans, &contracts);
        let order = graph.construction_order()?;
        tracing::debug!(nodes = order.len(), "construction order ready");

        instantiate(&graph, &order, &components, &beans, self.external.as_ref(), sink)
    }
}

/// Apply the scan filter and both condition rules to the declared catalog.
///
/// Beans survive only when their own conditions pass and their owning unit
/// was itself included.
fn filter_catalog(
    catalog: Catalog,
    profile: Option<&str>,
    properties: &dyn PropertySource,
    scan: &ScanFilter,
) -> (Vec<ComponentDescriptor>, Vec<BeanDefinition>) {
    let mut components = Vec::new();
    for component in catalog.components {
        if !scan.admits(component.key.type_name()) {
            tracing::debug!(
                component = component.key.type_name(),
                "excluded by scan filter"
            );
            continue;
        }
        if !conditions::include(&component.conditions, profile, properties) {
            tracing::debug!(
                component = component.key.type_name(),
                "excluded by conditions"
            );
            continue;
        }
        components.push(component);
    }

    let included_units: HashSet<TypeKey> = components
        .iter()
        .filter(|c| c.kind.is_unit())
        .map(|c| c.key)
        .collect();

    let beans = catalog
        .beans
        .into_iter()
        .filter(|bean| {
            included_units.contains(&bean.owner)
                && conditions::include(&bean.conditions, profile, properties)
        })
        .collect();

    (components, beans)
}

/// Walk the construction order, building every node and registering the
/// injectable ones.
fn instantiate(
    graph: &DependencyGraph,
    order: &[NodeId],
    components: &[ComponentDescriptor],
    beans: &[BeanDefinition],
    external: &dyn ExternalResolver,
    sink: &mut dyn RegistrationSink,
) -> Result<InstanceRegistry, CoreError> {
    let mut registry = InstanceRegistry::new();
    // unit instances are cached for bean invocation but never registered
    let mut units: HashMap<TypeKey, Instance> = HashMap::new();

    for &node_id in order {
        let node = graph.node(node_id);
        match node.kind {
            NodeKind::Unit(index) => {
                let unit = construct(&components[index], &registry, external)?;
                units.insert(node.key, unit);
                tracing::debug!(unit = node.key.type_name(), "configuration unit ready");
            }
            NodeKind::Component(index) => {
                let component = &components[index];
                let instance = construct(component, &registry, external)?;
                registry.insert_concrete(component.key, instance.clone());

                match component.primary_contract() {
                    Some(binding) => {
                        let coerced = (binding.cast)(&instance).ok_or_else(|| {
                            CoreError::configuration(format!(
                                "contract cast failed for '{}' as '{}'",
                                component.key.type_name(),
                                binding.key.type_name()
                            ))
                        })?;
                        registry.append_contract(binding.key, coerced.clone());
                        sink.register(Registration {
                            contract: binding.key,
                            lifetime: component.lifetime,
                            instance: coerced,
                        });
                        tracing::info!(
                            component = component.key.type_name(),
                            contract = binding.key.type_name(),
                            lifetime = component.lifetime.as_str(),
                            "registered component"
                        );
                    }
                    None => {
                        sink.register(Registration {
                            contract: component.key,
                            lifetime: component.lifetime,
                            instance: instance.clone(),
                        });
                        tracing::info!(
                            component = component.key.type_name(),
                            lifetime = component.lifetime.as_str(),
                            "registered component under its own type"
                        );
                    }
                }
            }
            NodeKind::Product => {
                for bean in beans.iter().filter(|b| b.product == node.key) {
                    invoke_bean(bean, components, &mut units, &mut registry, external, sink)?;
                }
            }
        }
    }

    Ok(registry)
}

/// Invoke one bean definition: ensure the owning unit exists (building it
/// on demand if the order has not reached it), resolve the method
/// arguments, then register the product.
fn invoke_bean(
    bean: &BeanDefinition,
    components: &[ComponentDescriptor],
    units: &mut HashMap<TypeKey, Instance>,
    registry: &mut InstanceRegistry,
    external: &dyn ExternalResolver,
    sink: &mut dyn RegistrationSink,
) -> Result<(), CoreError> {
    let owner = match units.get(&bean.owner).cloned() {
        Some(owner) => owner,
        None => {
            let descriptor = components
                .iter()
                .find(|c| c.key == bean.owner && c.kind.is_unit())
                .ok_or_else(|| CoreError::unresolved(bean.owner.type_name()))?;
            let built = construct(descriptor, registry, external)?;
            units.insert(bean.owner, built.clone());
            built
        }
    };

    let produced = {
        let args = ArgResolver::new(registry, external);
        (bean.factory)(&owner, &args)?
    };
    let instance = produced
        .ok_or_else(|| CoreError::bean_production(bean.owner.type_name(), bean.name))?;

    registry.append_product(bean.product, instance.clone());
    match bean.product_kind {
        ProductKind::Contract => registry.append_contract(bean.product, instance.clone()),
        ProductKind::Concrete => registry.insert_concrete(bean.product, instance.clone()),
    }
    sink.register(Registration {
        contract: bean.product,
        lifetime: Lifetime::Singleton,
        instance,
    });
    tracing::info!(
        product = bean.product.type_name(),
        unit = bean.owner.type_name(),
        bean = bean.name,
        "registered bean"
    );

    Ok(())
}

/// Build one component or unit through its selected constructor
fn construct(
    descriptor: &ComponentDescriptor,
    registry: &InstanceRegistry,
    external: &dyn ExternalResolver,
) -> Result<Instance, CoreError> {
    let ctor = descriptor.select_constructor()?;
    let args = ArgResolver::new(registry, external);
    (ctor.factory)(&args)
}
