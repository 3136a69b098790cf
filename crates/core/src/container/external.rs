use std::fmt;

use crate::container::descriptor::{Instance, Lifetime, TypeKey};

/// Read-only fallback collaborator: the host container the engine delegates
/// to for types outside its own graph.
///
/// Returned instances must follow the engine's handle convention: the
/// `dyn Any` payload is the smart pointer `Arc<X>` for the requested `X`
/// (see [`wrap_handle`](crate::container::descriptor::wrap_handle)). The
/// engine never mutates the resolver and assumes its answers are stable
/// within one run.
pub trait ExternalResolver: Send + Sync {
    /// Single instance lookup; `None` when the host has nothing either
    fn try_get(&self, requested: &TypeKey) -> Option<Instance>;

    /// Collection lookup; entries are appended after the engine's own
    fn try_get_all(&self, requested: &TypeKey) -> Vec<Instance> {
        let _ = requested;
        Vec::new()
    }
}

/// Resolver that never resolves anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ExternalResolver for NullResolver {
    fn try_get(&self, _requested: &TypeKey) -> Option<Instance> {
        None
    }
}

/// One final registration handed to the host: an already-constructed
/// instance under its resolved contract (or its own type, for contract-less
/// components) with its declared lifetime hint.
pub struct Registration {
    pub contract: TypeKey,
    pub lifetime: Lifetime,
    pub instance: Instance,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("contract", &self.contract)
            .field("lifetime", &self.lifetime)
            .field("instance", &"<instance>")
            .finish()
    }
}

/// Sink receiving the engine's final registrations, one per concrete
/// component and per bean instance. Configuration units are never sent.
pub trait RegistrationSink {
    fn register(&mut self, registration: Registration);
}

/// Sink that simply collects registrations, for tests and hosts that want
/// to post-process the result.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub registrations: Vec<Registration>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected registrations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if nothing was registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Contract keys in registration order
    pub fn contract_keys(&self) -> Vec<TypeKey> {
        self.registrations.iter().map(|r| r.contract).collect()
    }
}

impl RegistrationSink for CollectingSink {
    fn register(&mut self, registration: Registration) {
        self.registrations.push(registration);
    }
}
