use async_trait::async_trait;
use cashdrop_shared::AddressRef;
use std::collections::HashMap;

use crate::BoxError;

/// Address collaborator: turns user input (a saved-address id, a plus code...) into an opaque handle
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// `Ok(None)` when the input does not resolve to a deliverable address
    async fn resolve(&self, input: &str) -> Result<Option<AddressRef>, BoxError>;
}

/// Fixed lookup table, for wiring demos and tests
pub struct StaticAddressResolver {
    known: HashMap<String, AddressRef>,
}

impl StaticAddressResolver {
    pub fn new() -> Self {
        Self {
            known: HashMap::new(),
        }
    }

    pub fn with_address(mut self, input: &str, address: AddressRef) -> Self {
        self.known.insert(input.trim().to_lowercase(), address);
        self
    }
}

impl Default for StaticAddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressResolver for StaticAddressResolver {
    async fn resolve(&self, input: &str) -> Result<Option<AddressRef>, BoxError> {
        Ok(self.known.get(&input.trim().to_lowercase()).cloned())
    }
}
