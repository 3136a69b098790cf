use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::container::conditions::ConditionSet;
use crate::container::resolver::ArgResolver;
use crate::errors::CoreError;

/// Identity of a managed type: concrete component, configuration unit,
/// contract and bean product type alike.
///
/// Use `TypeKey::of::<dyn Contract>()` for contracts and
/// `TypeKey::of::<Concrete>()` for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl TypeKey {
    /// Create a key for a type
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Get the full type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Declared lifetime hint, forwarded to the host registration sink.
///
/// Informational only: the engine always builds exactly one instance per
/// run, and the host may wrap it in a narrower policy downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifetime {
    /// Single instance shared across the application
    Singleton,
    /// Instance scoped to a particular context (e.g. request scope)
    Scoped,
    /// New instance created for each request
    Transient,
}

impl Lifetime {
    /// Check if the lifetime is singleton
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }

    /// Get the lifetime name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Singleton
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Lifetime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            _ => Err(CoreError::InvalidLifetime {
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of a discovered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Service,
    Repository,
    /// Non-injectable host for bean factory methods
    ConfigurationUnit,
}

impl ComponentKind {
    /// Check if the kind is a configuration unit
    pub fn is_unit(&self) -> bool {
        matches!(self, ComponentKind::ConfigurationUnit)
    }

    /// Lifetime assigned when the declaration does not pick one explicitly
    pub fn default_lifetime(&self) -> Lifetime {
        match self {
            ComponentKind::Repository => Lifetime::Scoped,
            _ => Lifetime::Singleton,
        }
    }
}

/// Shared handle to a constructed instance.
///
/// The payload is always the smart pointer `Arc<X>` for the registered type
/// `X`, so contract handles (`Arc<dyn Contract>`) and concrete handles
/// (`Arc<Concrete>`) move through the same untyped maps.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Box an `Arc<X>` handle into an untyped instance
pub fn wrap_handle<X>(handle: Arc<X>) -> Instance
where
    X: ?Sized + Send + Sync + 'static,
{
    Arc::new(handle)
}

/// Recover the typed `Arc<X>` handle from an untyped instance
pub fn unwrap_handle<X>(instance: &Instance) -> Option<Arc<X>>
where
    X: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<X>>().cloned()
}

/// Declared shape of one requested constructor or bean-method argument.
///
/// The shape drives graph-edge derivation; the factory closure performs the
/// matching typed pull at instantiation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRequest {
    /// A single value of an abstract contract
    Contract(TypeKey),
    /// A single value of a concrete type
    Concrete(TypeKey),
    /// Every instance bound to the given type, possibly empty
    CollectionOf(TypeKey),
}

impl ParamRequest {
    /// The requested type key, regardless of shape
    pub fn key(&self) -> TypeKey {
        match self {
            ParamRequest::Contract(key)
            | ParamRequest::Concrete(key)
            | ParamRequest::CollectionOf(key) => *key,
        }
    }
}

/// Factory closure that builds a component or configuration unit from
/// resolved arguments.
pub type ComponentFactory =
    Box<dyn Fn(&ArgResolver<'_>) -> Result<Instance, CoreError> + Send + Sync>;

/// Factory closure for a bean method, invoked with the owning unit instance.
///
/// Returning `Ok(None)` is the "produced no value" case and is fatal
/// upstream.
pub type BeanFactory =
    Box<dyn Fn(&Instance, &ArgResolver<'_>) -> Result<Option<Instance>, CoreError> + Send + Sync>;

/// One declared constructor: its ordered parameter list plus the factory
/// consuming the resolved arguments.
pub struct ConstructorSpec {
    pub params: Vec<ParamRequest>,
    pub factory: ComponentFactory,
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("params", &self.params)
            .field("factory", &"<factory_fn>")
            .finish()
    }
}

/// A declared contract candidate: the contract key plus the coercion from
/// the concrete handle to the contract handle.
pub struct ContractBinding {
    pub key: TypeKey,
    pub cast: Box<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>,
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("key", &self.key)
            .field("cast", &"<cast_fn>")
            .finish()
    }
}

/// A discovered type eligible for the engine to manage.
///
/// Created once during discovery, immutable thereafter, consumed by every
/// downstream stage.
pub struct ComponentDescriptor {
    pub key: TypeKey,
    pub kind: ComponentKind,
    pub lifetime: Lifetime,
    pub conditions: ConditionSet,
    pub qualifier: Option<String>,
    pub order: Option<i32>,
    /// Declared contract candidates in declaration order. Only the first
    /// one ever binds: a component claims at most one contract. Components
    /// implementing several contracts are registered under the first alone,
    /// which can surprise; declare the intended contract first.
    pub contracts: Vec<ContractBinding>,
    pub constructors: Vec<ConstructorSpec>,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("lifetime", &self.lifetime)
            .field("conditions", &self.conditions)
            .field("qualifier", &self.qualifier)
            .field("order", &self.order)
            .field("contracts", &self.contracts)
            .field("constructors", &self.constructors)
            .finish()
    }
}

impl ComponentDescriptor {
    /// The primary contract, i.e. the first declared one
    pub fn primary_contract(&self) -> Option<&ContractBinding> {
        self.contracts.first()
    }

    /// Select the constructor with the most parameters; declaration order
    /// breaks ties.
    pub fn select_constructor(&self) -> Result<&ConstructorSpec, CoreError> {
        let mut selected: Option<&ConstructorSpec> = None;
        for ctor in &self.constructors {
            let better = match selected {
                Some(current) => ctor.params.len() > current.params.len(),
                None => true,
            };
            if better {
                selected = Some(ctor);
            }
        }
        selected.ok_or_else(|| CoreError::missing_constructor(self.key.type_name()))
    }
}

/// Whether a bean's product type is an abstract contract or a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Contract,
    Concrete,
}

/// A declared factory method belonging to a configuration unit.
///
/// The product type is a distinct graph node even when several bean
/// definitions share it; each invocation contributes one instance
/// accumulating under that type.
pub struct BeanDefinition {
    pub owner: TypeKey,
    pub product: TypeKey,
    pub product_kind: ProductKind,
    /// Method name, used in error and log output
    pub name: &'static str,
    pub conditions: ConditionSet,
    pub qualifier: Option<String>,
    pub order: Option<i32>,
    pub params: Vec<ParamRequest>,
    pub factory: BeanFactory,
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("owner", &self.owner)
            .field("product", &self.product)
            .field("product_kind", &self.product_kind)
            .field("name", &self.name)
            .field("conditions", &self.conditions)
            .field("params", &self.params)
            .field("factory", &"<factory_fn>")
            .finish()
    }
}
