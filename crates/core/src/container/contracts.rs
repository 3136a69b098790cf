use std::collections::HashMap;

use crate::container::descriptor::{ComponentDescriptor, TypeKey};

/// Mapping from an abstract contract to the components claiming it as their
/// primary contract, in discovery order.
///
/// Fan-out (several components bound to one contract) is recorded here as
/// legal; whether it is an error is decided at argument-resolution time.
#[derive(Debug, Default)]
pub struct ContractIndex {
    bindings: HashMap<TypeKey, Vec<usize>>,
}

impl ContractIndex {
    /// Build the index over the filtered component list.
    ///
    /// Each component contributes its first declared contract only;
    /// contract-less components contribute no binding and configuration
    /// units never bind.
    pub fn build(components: &[ComponentDescriptor]) -> Self {
        let mut bindings: HashMap<TypeKey, Vec<usize>> = HashMap::new();

        for (index, component) in components.iter().enumerate() {
            if component.kind.is_unit() {
                continue;
            }
            if let Some(contract) = component.primary_contract() {
                bindings.entry(contract.key).or_default().push(index);
                tracing::debug!(
                    contract = contract.key.type_name(),
                    implementation = component.key.type_name(),
                    "bound primary contract"
                );
            }
        }

        for (contract, implementations) in &bindings {
            if implementations.len() > 1 {
                tracing::warn!(
                    contract = contract.type_name(),
                    count = implementations.len(),
                    "contract bound more than once; singular injection of it will fail"
                );
            }
        }

        Self { bindings }
    }

    /// Component indexes bound to a contract, in discovery order
    pub fn implementations(&self, contract: &TypeKey) -> &[usize] {
        self.bindings
            .get(contract)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check if any component binds the given contract
    pub fn is_bound(&self, key: &TypeKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Number of distinct bound contracts
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no contract is bound at all
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
