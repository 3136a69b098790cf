use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::descriptor::{unwrap_handle, Instance, TypeKey};

/// Terminal output artifact of one pipeline run: every instance the engine
/// created, indexed three ways.
///
/// Append-only while the run is in flight; a failed run drops the registry
/// with the pipeline, so no partial result is ever observable.
#[derive(Default)]
pub struct InstanceRegistry {
    /// Concrete type -> the single created instance (last write wins for
    /// concrete bean fan-in)
    concrete: HashMap<TypeKey, Instance>,
    /// Contract type -> instances of every implementation actually created,
    /// in creation order
    contracts: HashMap<TypeKey, Vec<Instance>>,
    /// Bean product type -> produced instances, in creation order
    products: HashMap<TypeKey, Vec<Instance>>,
}

impl InstanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_concrete(&mut self, key: TypeKey, instance: Instance) {
        self.concrete.insert(key, instance);
    }

    pub(crate) fn append_contract(&mut self, key: TypeKey, instance: Instance) {
        self.contracts.entry(key).or_default().push(instance);
    }

    pub(crate) fn append_product(&mut self, key: TypeKey, instance: Instance) {
        self.products.entry(key).or_default().push(instance);
    }

    /// Untyped lookup of a created concrete instance
    pub fn concrete_instance(&self, key: &TypeKey) -> Option<&Instance> {
        self.concrete.get(key)
    }

    /// Untyped instances bound to a contract, in creation order
    pub fn contract_instances(&self, key: &TypeKey) -> &[Instance] {
        self.contracts.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Untyped bean instances of a product type, in creation order
    pub fn product_instances(&self, key: &TypeKey) -> &[Instance] {
        self.products.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Typed lookup of a created concrete instance
    pub fn get<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.concrete
            .get(&TypeKey::of::<C>())
            .and_then(unwrap_handle)
    }

    /// Typed instances bound to a contract, in creation order
    pub fn contracts_of<T: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<T>> {
        self.contract_instances(&TypeKey::of::<T>())
            .iter()
            .filter_map(unwrap_handle)
            .collect()
    }

    /// Typed bean instances of a product type, in creation order
    pub fn products_of<X: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<X>> {
        self.product_instances(&TypeKey::of::<X>())
            .iter()
            .filter_map(unwrap_handle)
            .collect()
    }

    /// Number of created concrete instances
    pub fn concrete_count(&self) -> usize {
        self.concrete.len()
    }

    /// Number of distinct contracts with at least one instance
    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    /// Number of distinct product types with at least one instance
    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("concrete", &self.concrete.keys().collect::<Vec<_>>())
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("products", &self.products.keys().collect::<Vec<_>>())
            .finish()
    }
}
