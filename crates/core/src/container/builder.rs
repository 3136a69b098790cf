//! The discovery feed: hosts declare services, repositories, configuration
//! units and their bean methods through these typed builders, producing the
//! immutable [`Catalog`] the pipeline consumes. This is the explicit
//! counterpart of attribute scanning.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::conditions::{ConditionSet, PropertyCondition};
use crate::container::descriptor::{
    unwrap_handle, wrap_handle, BeanDefinition, BeanFactory, ComponentDescriptor, ComponentKind,
    ConstructorSpec, ContractBinding, Instance, Lifetime, ParamRequest, ProductKind, TypeKey,
};
use crate::container::resolver::ArgResolver;
use crate::errors::CoreError;

/// Every descriptor and bean definition visible to one pipeline run, in
/// declaration order, already scoped by the host.
#[derive(Debug, Default)]
pub struct Catalog {
    pub components: Vec<ComponentDescriptor>,
    pub beans: Vec<BeanDefinition>,
}

impl Catalog {
    /// Start building a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Number of declared components (units included)
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of declared bean methods
    pub fn bean_count(&self) -> usize {
        self.beans.len()
    }
}

/// Builder assembling a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    components: Vec<ComponentDescriptor>,
    beans: Vec<BeanDefinition>,
}

impl CatalogBuilder {
    /// Create an empty catalog builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a service component of concrete type `C`
    pub fn service<C: Send + Sync + 'static>(self) -> ComponentBuilder<C> {
        ComponentBuilder::new(self, ComponentKind::Service)
    }

    /// Declare a repository component of concrete type `C`
    pub fn repository<C: Send + Sync + 'static>(self) -> ComponentBuilder<C> {
        ComponentBuilder::new(self, ComponentKind::Repository)
    }

    /// Declare a configuration unit of type `U`, hosting bean methods
    pub fn unit<U: Send + Sync + 'static>(self) -> UnitBuilder<U> {
        UnitBuilder::new(self)
    }

    /// Finish the catalog
    pub fn build(self) -> Catalog {
        Catalog {
            components: self.components,
            beans: self.beans,
        }
    }
}

/// Declaration of one service or repository component.
pub struct ComponentBuilder<C> {
    catalog: CatalogBuilder,
    kind: ComponentKind,
    lifetime: Lifetime,
    conditions: ConditionSet,
    qualifier: Option<String>,
    order: Option<i32>,
    contracts: Vec<ContractBinding>,
    constructors: Vec<ConstructorSpec>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> ComponentBuilder<C> {
    fn new(catalog: CatalogBuilder, kind: ComponentKind) -> Self {
        Self {
            catalog,
            kind,
            lifetime: kind.default_lifetime(),
            conditions: ConditionSet::new(),
            qualifier: None,
            order: None,
            contracts: Vec::new(),
            constructors: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Override the declared lifetime hint
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Attach a qualifier name
    pub fn qualifier(mut self, name: impl Into<String>) -> Self {
        self.qualifier = Some(name.into());
        self
    }

    /// Attach an explicit order value
    pub fn order(mut self, value: i32) -> Self {
        self.order = Some(value);
        self
    }

    /// Restrict to profiles; both arguments are comma-separated lists
    pub fn profiles(mut self, include: &str, exclude: &str) -> Self {
        self.conditions.profile_include = ConditionSet::profiles_from_str(include);
        self.conditions.profile_exclude = ConditionSet::profiles_from_str(exclude);
        self
    }

    /// Include only when the named property matches the required value
    pub fn when_property(
        mut self,
        name: impl Into<String>,
        having_value: impl Into<String>,
        match_if_missing: bool,
    ) -> Self {
        self.conditions.property =
            Some(PropertyCondition::new(name, having_value, match_if_missing));
        self
    }

    /// Declare a contract this component implements.
    ///
    /// Declaration order matters: only the first declared contract ever
    /// binds. The cast closure is usually just `|c| c`, letting the
    /// compiler coerce `Arc<C>` to `Arc<dyn Contract>`.
    pub fn implements<T, F>(mut self, cast: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        self.contracts.push(ContractBinding {
            key: TypeKey::of::<T>(),
            cast: Box::new(move |instance| {
                unwrap_handle::<C>(instance).map(|concrete| wrap_handle(cast(concrete)))
            }),
        });
        self
    }

    /// Declare a constructor: its parameter list plus the factory closure
    /// pulling the resolved arguments. Repeatable; the greediest
    /// constructor wins at build time.
    pub fn constructor<F>(mut self, params: Vec<ParamRequest>, factory: F) -> Self
    where
        F: Fn(&ArgResolver<'_>) -> Result<C, CoreError> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            params,
            factory: Box::new(move |args: &ArgResolver<'_>| {
                factory(args).map(|c| wrap_handle(Arc::new(c)))
            }),
        });
        self
    }

    /// Finish the declaration and return to the catalog builder
    pub fn register(mut self) -> CatalogBuilder {
        self.catalog.components.push(ComponentDescriptor {
            key: TypeKey::of::<C>(),
            kind: self.kind,
            lifetime: self.lifetime,
            conditions: self.conditions,
            qualifier: self.qualifier,
            order: self.order,
            contracts: self.contracts,
            constructors: self.constructors,
        });
        self.catalog
    }
}

/// Declaration of one configuration unit and its bean methods.
///
/// Units host factory methods and are never injectable: the builder offers
/// no contract declaration for them by construction.
pub struct UnitBuilder<U> {
    catalog: CatalogBuilder,
    conditions: ConditionSet,
    constructors: Vec<ConstructorSpec>,
    beans: Vec<BeanDefinition>,
    _marker: PhantomData<fn() -> U>,
}

impl<U: Send + Sync + 'static> UnitBuilder<U> {
    fn new(catalog: CatalogBuilder) -> Self {
        Self {
            catalog,
            conditions: ConditionSet::new(),
            constructors: Vec::new(),
            beans: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Restrict the unit (and with it every bean it hosts) to profiles
    pub fn profiles(mut self, include: &str, exclude: &str) -> Self {
        self.conditions.profile_include = ConditionSet::profiles_from_str(include);
        self.conditions.profile_exclude = ConditionSet::profiles_from_str(exclude);
        self
    }

    /// Include the unit only when the named property matches
    pub fn when_property(
        mut self,
        name: impl Into<String>,
        having_value: impl Into<String>,
        match_if_missing: bool,
    ) -> Self {
        self.conditions.property =
            Some(PropertyCondition::new(name, having_value, match_if_missing));
        self
    }

    /// Declare the unit constructor
    pub fn constructor<F>(mut self, params: Vec<ParamRequest>, factory: F) -> Self
    where
        F: Fn(&ArgResolver<'_>) -> Result<U, CoreError> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            params,
            factory: Box::new(move |args: &ArgResolver<'_>| {
                factory(args).map(|u| wrap_handle(Arc::new(u)))
            }),
        });
        self
    }

    /// Declare a bean method producing a concrete value of type `P`.
    ///
    /// The factory receives the unit instance and the argument resolver;
    /// returning `Ok(None)` is fatal at instantiation time.
    pub fn bean<P, F>(
        self,
        name: &'static str,
        params: Vec<ParamRequest>,
        factory: F,
    ) -> BeanMethodBuilder<U>
    where
        P: Send + Sync + 'static,
        F: Fn(&U, &ArgResolver<'_>) -> Result<Option<P>, CoreError> + Send + Sync + 'static,
    {
        let factory = wrap_bean_factory::<U, _>(move |unit: &U, args: &ArgResolver<'_>| {
            factory(unit, args).map(|opt| opt.map(|p| wrap_handle(Arc::new(p))))
        });
        BeanMethodBuilder::new(
            self,
            TypeKey::of::<P>(),
            ProductKind::Concrete,
            name,
            params,
            factory,
        )
    }

    /// Declare a bean method producing a contract value `Arc<dyn T>`.
    pub fn bean_contract<T, F>(
        self,
        name: &'static str,
        params: Vec<ParamRequest>,
        factory: F,
    ) -> BeanMethodBuilder<U>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&U, &ArgResolver<'_>) -> Result<Option<Arc<T>>, CoreError> + Send + Sync + 'static,
    {
        let factory = wrap_bean_factory::<U, _>(move |unit: &U, args: &ArgResolver<'_>| {
            factory(unit, args).map(|opt| opt.map(wrap_handle))
        });
        BeanMethodBuilder::new(
            self,
            TypeKey::of::<T>(),
            ProductKind::Contract,
            name,
            params,
            factory,
        )
    }

    /// Finish the declaration and return to the catalog builder
    pub fn register(mut self) -> CatalogBuilder {
        self.catalog.components.push(ComponentDescriptor {
            key: TypeKey::of::<U>(),
            kind: ComponentKind::ConfigurationUnit,
            lifetime: Lifetime::Singleton,
            conditions: self.conditions,
            qualifier: None,
            order: None,
            contracts: Vec::new(),
            constructors: self.constructors,
        });
        self.catalog.beans.append(&mut self.beans);
        self.catalog
    }
}

fn wrap_bean_factory<U, F>(factory: F) -> BeanFactory
where
    U: Send + Sync + 'static,
    F: Fn(&U, &ArgResolver<'_>) -> Result<Option<Instance>, CoreError> + Send + Sync + 'static,
{
    Box::new(move |owner: &Instance, args: &ArgResolver<'_>| {
        let unit = unwrap_handle::<U>(owner).ok_or_else(|| {
            CoreError::configuration(format!(
                "configuration unit handle mismatch for '{}'",
                std::any::type_name::<U>()
            ))
        })?;
        factory(&unit, args)
    })
}

/// Declaration of one bean method, carrying its own conditional tags.
pub struct BeanMethodBuilder<U> {
    unit: UnitBuilder<U>,
    definition: BeanDefinition,
}

impl<U: Send + Sync + 'static> BeanMethodBuilder<U> {
    fn new(
        unit: UnitBuilder<U>,
        product: TypeKey,
        product_kind: ProductKind,
        name: &'static str,
        params: Vec<ParamRequest>,
        factory: BeanFactory,
    ) -> Self {
        Self {
            definition: BeanDefinition {
                owner: TypeKey::of::<U>(),
                product,
                product_kind,
                name,
                conditions: ConditionSet::new(),
                qualifier: None,
                order: None,
                params,
                factory,
            },
            unit,
        }
    }

    /// Restrict this bean to profiles, independently of its unit
    pub fn profiles(mut self, include: &str, exclude: &str) -> Self {
        self.definition.conditions.profile_include = ConditionSet::profiles_from_str(include);
        self.definition.conditions.profile_exclude = ConditionSet::profiles_from_str(exclude);
        self
    }

    /// Include this bean only when the named property matches
    pub fn when_property(
        mut self,
        name: impl Into<String>,
        having_value: impl Into<String>,
        match_if_missing: bool,
    ) -> Self {
        self.definition.conditions.property =
            Some(PropertyCondition::new(name, having_value, match_if_missing));
        self
    }

    /// Attach a qualifier name
    pub fn qualifier(mut self, name: impl Into<String>) -> Self {
        self.definition.qualifier = Some(name.into());
        self
    }

    /// Attach an explicit order value
    pub fn order(mut self, value: i32) -> Self {
        self.definition.order = Some(value);
        self
    }

    /// Finish the bean declaration and return to its unit
    pub fn add(mut self) -> UnitBuilder<U> {
        self.unit.beans.push(self.definition);
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Notifier: Send + Sync {
        fn channel(&self) -> &'static str;
    }

    struct EmailService;

    impl Notifier for EmailService {
        fn channel(&self) -> &'static str {
            "email"
        }
    }

    struct MessagingConfig;

    #[test]
    fn test_component_declaration_captures_metadata() {
        let catalog = Catalog::builder()
            .service::<EmailService>()
            .implements::<dyn Notifier, _>(|c| c)
            .qualifier("email")
            .order(10)
            .profiles("dev, test", "prod")
            .when_property("app.sendmail", "true", false)
            .constructor(Vec::new(), |_| Ok(EmailService))
            .register()
            .build();

        assert_eq!(catalog.component_count(), 1);
        let descriptor = &catalog.components[0];
        assert_eq!(descriptor.kind, ComponentKind::Service);
        assert_eq!(descriptor.lifetime, Lifetime::Singleton);
        assert_eq!(descriptor.qualifier.as_deref(), Some("email"));
        assert_eq!(descriptor.order, Some(10));
        assert_eq!(descriptor.conditions.profile_include, ["dev", "test"]);
        assert_eq!(descriptor.conditions.profile_exclude, ["prod"]);
        assert_eq!(
            descriptor.primary_contract().unwrap().key,
            TypeKey::of::<dyn Notifier>()
        );
    }

    #[test]
    fn test_repository_defaults_to_scoped_lifetime() {
        let catalog = Catalog::builder()
            .repository::<EmailService>()
            .constructor(Vec::new(), |_| Ok(EmailService))
            .register()
            .build();

        assert_eq!(catalog.components[0].lifetime, Lifetime::Scoped);
    }

    #[test]
    fn test_unit_declaration_hosts_beans_and_never_binds_contracts() {
        let catalog = Catalog::builder()
            .unit::<MessagingConfig>()
            .constructor(Vec::new(), |_| Ok(MessagingConfig))
            .bean_contract::<dyn Notifier, _>("mail_sender", Vec::new(), |_, _| {
                Ok(Some(Arc::new(EmailService) as Arc<dyn Notifier>))
            })
            .when_property("app.sendmail", "true", false)
            .add()
            .bean::<u64, _>("startup_stamp", Vec::new(), |_, _| Ok(Some(42u64)))
            .add()
            .register()
            .build();

        assert_eq!(catalog.component_count(), 1);
        assert_eq!(catalog.bean_count(), 2);

        let unit = &catalog.components[0];
        assert!(unit.kind.is_unit());
        assert!(unit.contracts.is_empty());

        let mail = &catalog.beans[0];
        assert_eq!(mail.owner, TypeKey::of::<MessagingConfig>());
        assert_eq!(mail.product, TypeKey::of::<dyn Notifier>());
        assert_eq!(mail.product_kind, ProductKind::Contract);
        assert!(mail.conditions.property.is_some());

        let stamp = &catalog.beans[1];
        assert_eq!(stamp.product, TypeKey::of::<u64>());
        assert_eq!(stamp.product_kind, ProductKind::Concrete);
    }

    #[test]
    fn test_contract_cast_round_trips_through_binding() {
        let catalog = Catalog::builder()
            .service::<EmailService>()
            .implements::<dyn Notifier, _>(|c| c)
            .constructor(Vec::new(), |_| Ok(EmailService))
            .register()
            .build();

        let binding = catalog.components[0].primary_contract().unwrap();
        let instance = wrap_handle(Arc::new(EmailService));
        let coerced = (binding.cast)(&instance).unwrap();
        let notifier = unwrap_handle::<dyn Notifier>(&coerced).unwrap();
        assert_eq!(notifier.channel(), "email");
    }
}
