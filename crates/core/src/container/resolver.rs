//! Argument resolution against the instances created so far, with external
//! fallback. One resolver borrows the in-flight registry for the duration
//! of a single construction or bean invocation.

use std::sync::Arc;

use crate::container::descriptor::{unwrap_handle, Instance, TypeKey};
use crate::container::external::ExternalResolver;
use crate::container::registry::InstanceRegistry;
use crate::errors::CoreError;

/// Resolves requested argument types for factory closures.
///
/// Single-value precedence: created concrete instance, then unique
/// contract/product instance (more than one match is an immediate
/// ambiguity error, never a silent first-match pick), then the external
/// resolver. Collection requests gather everything and never fail.
pub struct ArgResolver<'a> {
    registry: &'a InstanceRegistry,
    external: &'a dyn ExternalResolver,
}

impl<'a> ArgResolver<'a> {
    pub(crate) fn new(registry: &'a InstanceRegistry, external: &'a dyn ExternalResolver) -> Self {
        Self { registry, external }
    }

    /// Untyped single-value resolution for a requested type.
    pub fn resolve_single(&self, requested: &TypeKey) -> Result<Instance, CoreError> {
        if let Some(instance) = self.registry.concrete_instance(requested) {
            return Ok(instance.clone());
        }

        let mut candidates: Vec<Instance> = Vec::new();
        candidates.extend(self.registry.contract_instances(requested).iter().cloned());
        candidates.extend(self.registry.product_instances(requested).iter().cloned());

        if candidates.len() > 1 {
            return Err(CoreError::ambiguous(
                requested.type_name(),
                candidates.len(),
            ));
        }
        if let Some(instance) = candidates.pop() {
            return Ok(instance);
        }

        self.external
            .try_get(requested)
            .ok_or_else(|| CoreError::unresolved(requested.type_name()))
    }

    /// Untyped collection resolution: contract instances, then bean
    /// products, then external entries; ordered, possibly empty.
    pub fn resolve_collection(&self, item: &TypeKey) -> Vec<Instance> {
        let mut items: Vec<Instance> = Vec::new();
        items.extend(self.registry.contract_instances(item).iter().cloned());
        items.extend(self.registry.product_instances(item).iter().cloned());
        items.extend(self.external.try_get_all(item));
        items
    }

    /// Typed single-value pull, for contracts (`dyn Contract`) and concrete
    /// types alike.
    pub fn resolve<X>(&self) -> Result<Arc<X>, CoreError>
    where
        X: ?Sized + Send + Sync + 'static,
    {
        let requested = TypeKey::of::<X>();
        let instance = self.resolve_single(&requested)?;
        unwrap_handle(&instance).ok_or_else(|| {
            CoreError::configuration(format!(
                "instance for '{}' has an unexpected handle type",
                requested.type_name()
            ))
        })
    }

    /// Typed collection pull; entries with a foreign handle type are
    /// dropped.
    pub fn resolve_all<X>(&self) -> Vec<Arc<X>>
    where
        X: ?Sized + Send + Sync + 'static,
    {
        self.resolve_collection(&TypeKey::of::<X>())
            .iter()
            .filter_map(unwrap_handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::descriptor::wrap_handle;
    use crate::container::external::NullResolver;
    use std::collections::HashMap;

    trait Notifier: Send + Sync {
        fn channel(&self) -> &'static str;
    }

    struct Email;
    struct Sms;

    impl Notifier for Email {
        fn channel(&self) -> &'static str {
            "email"
        }
    }

    impl Notifier for Sms {
        fn channel(&self) -> &'static str {
            "sms"
        }
    }

    struct MapResolver {
        entries: HashMap<TypeKey, Instance>,
    }

    impl ExternalResolver for MapResolver {
        fn try_get(&self, requested: &TypeKey) -> Option<Instance> {
            self.entries.get(requested).cloned()
        }

        fn try_get_all(&self, requested: &TypeKey) -> Vec<Instance> {
            self.entries.get(requested).cloned().into_iter().collect()
        }
    }

    fn registry_with_contract(count: usize) -> InstanceRegistry {
        let mut registry = InstanceRegistry::new();
        for _ in 0..count {
            let handle: Arc<dyn Notifier> = Arc::new(Email);
            registry.append_contract(TypeKey::of::<dyn Notifier>(), wrap_handle(handle));
        }
        registry
    }

    #[test]
    fn test_unique_contract_resolves() {
        let registry = registry_with_contract(1);
        let resolver = ArgResolver::new(&registry, &NullResolver);

        let notifier = resolver.resolve::<dyn Notifier>().unwrap();
        assert_eq!(notifier.channel(), "email");
    }

    #[test]
    fn test_multiple_matches_fail_singularly_but_collect() {
        let mut registry = registry_with_contract(1);
        let handle: Arc<dyn Notifier> = Arc::new(Sms);
        registry.append_contract(TypeKey::of::<dyn Notifier>(), wrap_handle(handle));
        let resolver = ArgResolver::new(&registry, &NullResolver);

        let err = resolver.resolve::<dyn Notifier>().err().unwrap();
        assert!(err.is_ambiguous());

        let all = resolver.resolve_all::<dyn Notifier>();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].channel(), "email");
        assert_eq!(all[1].channel(), "sms");
    }

    #[test]
    fn test_created_concrete_takes_precedence() {
        let mut registry = InstanceRegistry::new();
        registry.insert_concrete(TypeKey::of::<Email>(), wrap_handle(Arc::new(Email)));
        let resolver = ArgResolver::new(&registry, &NullResolver);

        assert!(resolver.resolve::<Email>().is_ok());
        assert!(resolver.resolve::<Sms>().is_err());
    }

    #[test]
    fn test_zero_matches_fall_back_to_external_then_fail() {
        let registry = InstanceRegistry::new();

        let handle: Arc<dyn Notifier> = Arc::new(Sms);
        let external = MapResolver {
            entries: HashMap::from([(TypeKey::of::<dyn Notifier>(), wrap_handle(handle))]),
        };
        let resolver = ArgResolver::new(&registry, &external);
        assert_eq!(
            resolver.resolve::<dyn Notifier>().unwrap().channel(),
            "sms"
        );

        let resolver = ArgResolver::new(&registry, &NullResolver);
        let err = resolver.resolve::<dyn Notifier>().err().unwrap();
        assert!(err.is_unresolved());
    }

    #[test]
    fn test_collection_appends_external_after_own_and_may_be_empty() {
        let mut registry = registry_with_contract(1);
        let product: Arc<dyn Notifier> = Arc::new(Sms);
        registry.append_product(TypeKey::of::<dyn Notifier>(), wrap_handle(product));

        let extra: Arc<dyn Notifier> = Arc::new(Sms);
        let external = MapResolver {
            entries: HashMap::from([(TypeKey::of::<dyn Notifier>(), wrap_handle(extra))]),
        };

        let resolver = ArgResolver::new(&registry, &external);
        let all = resolver.resolve_all::<dyn Notifier>();
        assert_eq!(
            all.iter().map(|n| n.channel()).collect::<Vec<_>>(),
            ["email", "sms", "sms"]
        );

        let empty = InstanceRegistry::new();
        let resolver = ArgResolver::new(&empty, &NullResolver);
        assert!(resolver.resolve_all::<Email>().is_empty());
    }
}
