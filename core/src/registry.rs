use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
};

use itertools::Itertools;
use tracing::debug;

use crate::{
    custom::CustomHash,
    error::{UnhashError, UnhashResult},
    hash::{HashFunction, HashProvider},
    CUSTOM_ALGORITHM,
};

/// How many times `CUSTOM` can be bound in a registry: once, then rebound once.
const MAX_CUSTOM_BINDINGS: u8 = 2;

/// A case-insensitive algorithm identifier such as `MD5` or `sha3-256`.
/// Identifiers are stored upper case, with `-` normalized to `_`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlgorithmId(String);

impl AlgorithmId {
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_ascii_uppercase().replace('-', "_"))
    }

    /// Returns true if this is the reserved identifier of the custom hash.
    pub fn is_custom(&self) -> bool {
        self.0 == CUSTOM_ALGORITHM
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AlgorithmId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<HashFunction> for AlgorithmId {
    fn from(hash_function: HashFunction) -> Self {
        Self::new(hash_function.id())
    }
}

impl FromStr for AlgorithmId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps algorithm identifiers to hash providers.
///
/// The registry is owned by the caller and only read by search jobs, which keep
/// their own reference to the provider they resolved.
#[derive(Default)]
pub struct HashRegistry {
    providers: HashMap<AlgorithmId, Arc<dyn HashProvider>>,
    custom_bindings: u8,
}

impl HashRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every [`HashFunction`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for hash_function in HashFunction::ALL {
            registry
                .providers
                .insert(hash_function.into(), Arc::new(hash_function));
        }

        registry
    }

    /// Binds a provider to an identifier.
    ///
    /// Binding the very same provider twice is a no-op. Binding another provider
    /// to a bound identifier fails, except for `CUSTOM` which can be rebound once.
    pub fn register(
        &mut self,
        id: impl Into<AlgorithmId>,
        provider: Arc<dyn HashProvider>,
    ) -> UnhashResult<()> {
        let id = id.into();

        if let Some(bound) = self.providers.get(&id) {
            if Arc::ptr_eq(bound, &provider) {
                return Ok(());
            }

            if !id.is_custom() {
                return Err(UnhashError::DuplicateAlgorithm(id.0));
            }
        }

        if id.is_custom() {
            if self.custom_bindings >= MAX_CUSTOM_BINDINGS {
                return Err(UnhashError::DuplicateAlgorithm(id.0));
            }
            self.custom_bindings += 1;
        }

        debug!(algorithm = %id, "registered hash provider");
        self.providers.insert(id, provider);

        Ok(())
    }

    /// Binds a host supplied function to `CUSTOM`.
    pub fn register_custom(&mut self, custom: CustomHash) -> UnhashResult<()> {
        self.register(CUSTOM_ALGORITHM, Arc::new(custom))
    }

    /// Returns the provider bound to an identifier.
    pub fn resolve(&self, id: impl Into<AlgorithmId>) -> UnhashResult<Arc<dyn HashProvider>> {
        let id = id.into();

        self.providers
            .get(&id)
            .cloned()
            .ok_or(UnhashError::UnknownAlgorithm(id.0))
    }

    /// Returns all the registered identifiers, sorted.
    pub fn algorithms(&self) -> Vec<AlgorithmId> {
        self.providers.keys().cloned().sorted().collect()
    }

    pub fn contains(&self, id: impl Into<AlgorithmId>) -> bool {
        self.providers.contains_key(&id.into())
    }
}
