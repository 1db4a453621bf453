//! Dispatch core.
//!
//! [`PlatformContext`] holds the detected [`PlatformProfile`] and the
//! [`CapabilityRegistry`]. It is constructed once at startup and passed by
//! `Arc` to every adapter constructor; there are no ambient globals beyond
//! the detector's own cache. Every abstract call routes through
//! [`PlatformContext::dispatch`], which enforces the fallback/error
//! contract: adapter errors are forwarded verbatim, unsupported operations
//! surface as `MiniapiError::Unsupported`, and nothing is ever swallowed.

use tracing::debug;

use crate::config::Config;
use crate::error::{MiniapiError, MiniapiResult};
use crate::platform::{detect, PlatformProfile};
use crate::registry::{CapabilityRegistry, FallbackPolicy, Resolution};

/// How a dispatched operation should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Run the native implementation for the resolved backend.
    Native,
    /// Run the deterministic emulation built from supported primitives.
    Emulated,
    /// Do nothing and report success. Callers observe a documented
    /// difference from real execution (the `NoOp` fallback policy).
    Skipped,
}

/// Shared, read-only dispatch state.
///
/// Safe for unsynchronized concurrent reads once constructed. Adapters
/// store an `Arc<PlatformContext>` and consult it on every operation;
/// handles created by an adapter stay bound to the profile this context
/// resolved for their entire lifetime.
pub struct PlatformContext {
    profile: &'static PlatformProfile,
    registry: CapabilityRegistry,
}

impl PlatformContext {
    /// Build a context for the detected host platform.
    ///
    /// The registry starts from the static default table with the
    /// configuration's fallback overrides applied on top.
    pub fn new(config: &Config) -> Self {
        let mut registry = CapabilityRegistry::with_defaults();
        registry.apply_overrides(&config.fallback_overrides);
        PlatformContext {
            profile: detect(),
            registry,
        }
    }

    /// Build a context with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&Config::default())
    }

    /// The immutable profile this context resolved against.
    pub fn profile(&self) -> &PlatformProfile {
        self.profile
    }

    /// The read-only capability registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Route an abstract operation through the registry.
    ///
    /// Returns how the adapter must execute the call, or
    /// `MiniapiError::Unsupported` when the operation has no
    /// implementation and no usable fallback on this platform.
    pub fn dispatch(&self, operation: &str) -> MiniapiResult<Execution> {
        match self.registry.resolve(operation, self.profile) {
            Resolution::Supported => Ok(Execution::Native),
            Resolution::Fallback(FallbackPolicy::Emulate) => {
                debug!(operation, "dispatching via emulation fallback");
                Ok(Execution::Emulated)
            }
            Resolution::Fallback(FallbackPolicy::NoOp) => {
                debug!(operation, "dispatching as configured no-op");
                Ok(Execution::Skipped)
            }
            Resolution::Fallback(FallbackPolicy::Error) | Resolution::Unsupported => Err(
                MiniapiError::unsupported(operation, self.profile.family.as_str()),
            ),
        }
    }
}
