//! Negotiated capability matrix.
//!
//! The matrix is populated once per session from the handshake response
//! and immutable after negotiation. Every capability wrapper consults it
//! before constructing a call; an unsupported call fails fast with no
//! envelope traffic. Querying the matrix before the handshake completes
//! is itself an error — the bridge must not claim support or non-support
//! before negotiation — which the bridge enforces by holding no matrix
//! at all until `Ready`.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::{FxHashMap, FxHashSet};

use crate::protocol::{RuntimeConfig, SupportDeclaration};

// ============================================================================
// CapabilitySupport
// ============================================================================

/// Host support declared for one capability namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilitySupport {
    /// The entire namespace is supported.
    Entire,
    /// Only the named functions are supported.
    Functions(FxHashSet<String>),
}

// ============================================================================
// CapabilityMatrix
// ============================================================================

/// Table of capability namespaces and functions the current host build
/// supports.
#[derive(Debug, Clone, Default)]
pub struct CapabilityMatrix {
    api_version: u32,
    supports: FxHashMap<String, CapabilitySupport>,
}

impl CapabilityMatrix {
    /// Builds the matrix from the host's runtime configuration.
    ///
    /// Declarations that deny support (`false`, unrecognized shapes) are
    /// treated as absent.
    #[must_use]
    pub fn from_config(config: RuntimeConfig) -> Self {
        let mut supports = FxHashMap::default();

        for (namespace, value) in &config.supports {
            let Some(declaration) = RuntimeConfig::declaration(value) else {
                continue;
            };

            let support = match declaration {
                SupportDeclaration::Flag(_) | SupportDeclaration::Namespace(_) => {
                    CapabilitySupport::Entire
                }
                SupportDeclaration::Functions(functions) => {
                    CapabilitySupport::Functions(functions.into_iter().collect())
                }
            };

            supports.insert(namespace.clone(), support);
        }

        Self {
            api_version: config.api_version,
            supports,
        }
    }

    /// Host protocol version negotiated at handshake.
    #[inline]
    #[must_use]
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Returns `true` if the namespace has any declared support.
    #[inline]
    #[must_use]
    pub fn is_supported(&self, namespace: &str) -> bool {
        self.supports.contains_key(namespace)
    }

    /// Returns `true` if the specific function is supported.
    ///
    /// An entire-namespace declaration supports every function in it.
    #[must_use]
    pub fn is_function_supported(&self, namespace: &str, method: &str) -> bool {
        match self.supports.get(namespace) {
            Some(CapabilitySupport::Entire) => true,
            Some(CapabilitySupport::Functions(functions)) => functions.contains(method),
            None => false,
        }
    }

    /// Returns the number of supported namespaces.
    #[inline]
    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.supports.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
