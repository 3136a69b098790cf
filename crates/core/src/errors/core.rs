use thiserror::Error;

/// Core error type for the armature engine.
///
/// Every pipeline error is fatal: the run aborts immediately and no partial
/// registry is published.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid lifetime: {value}")]
    InvalidLifetime { value: String },

    #[error("Cyclic dependency detected: {path}")]
    CyclicDependency { path: String },

    #[error("Ambiguous dependency for contract '{contract}': found {count} implementations. Inject a collection of the contract or reduce to a single implementation")]
    AmbiguousDependency { contract: String, count: usize },

    #[error("Unable to resolve dependency '{requested}': no implementations found or registered")]
    UnresolvedDependency { requested: String },

    #[error("Type '{component}' does not declare a public constructor")]
    MissingConstructor { component: String },

    #[error("Bean method {unit}::{bean} produced no value")]
    BeanProduction { unit: String, bean: String },
}

impl CoreError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new cyclic dependency error from a readable path chain
    pub fn cyclic(path: impl Into<String>) -> Self {
        Self::CyclicDependency { path: path.into() }
    }

    /// Create a new ambiguous dependency error
    pub fn ambiguous(contract: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousDependency {
            contract: contract.into(),
            count,
        }
    }

    /// Create a new unresolved dependency error
    pub fn unresolved(requested: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            requested: requested.into(),
        }
    }

    /// Create a new missing constructor error
    pub fn missing_constructor(component: impl Into<String>) -> Self {
        Self::MissingConstructor {
            component: component.into(),
        }
    }

    /// Create a new bean production error
    pub fn bean_production(unit: impl Into<String>, bean: impl Into<String>) -> Self {
        Self::BeanProduction {
            unit: unit.into(),
            bean: bean.into(),
        }
    }

    /// Check if the error is a cyclic dependency error
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }

    /// Check if the error is an ambiguous dependency error
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousDependency { .. })
    }

    /// Check if the error is an unresolved dependency error
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedDependency { .. })
    }

    /// Check if the error is a bean production error
    pub fn is_bean_production(&self) -> bool {
        matches!(self, Self::BeanProduction { .. })
    }
}
