//! miniapi-core: Platform detection, capability registry, and dispatch core
//!
//! This crate provides the foundational pieces of the miniapi
//! compatibility layer:
//! - Canonical error type [`MiniapiError`] and the [`MiniapiResult`] alias
//! - Platform detection ([`platform::detect`]) with an immutable,
//!   process-wide [`platform::PlatformProfile`]
//! - The [`registry::CapabilityRegistry`] mapping abstract operation names
//!   to per-platform availability and fallback policies
//! - The dispatch core ([`dispatch::PlatformContext`]) that routes every
//!   abstract call to a native implementation, an emulation, a documented
//!   no-op, or an `Unsupported` error
//! - Process-wide [`config::Config`] loaded once at initialization
//!
//! ## Dispatch Flow
//!
//! ```text
//! caller -> adapter -> PlatformContext::dispatch(op)
//!            |            |- registry.resolve(op, profile)
//!            |            `- Native | Emulated | Skipped | Err(Unsupported)
//!            `- executes the resolved path, normalizes native errors
//! ```
//!
//! Adapters live in the sibling crates (`miniapi-fs`, `miniapi-proc`,
//! `miniapi-net`, `miniapi-telemetry`); each takes an
//! `Arc<PlatformContext>` at construction so there is no ambient global
//! state beyond the detector's own cache.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod ops;
pub mod platform;
pub mod registry;

// Re-export the types adapters touch on every call.
pub use config::Config;
pub use dispatch::{Execution, PlatformContext};
pub use error::{ErrorKind, MiniapiError, MiniapiResult};
pub use platform::{detect, Family, PlatformProfile};
pub use registry::{CapabilityRegistry, FallbackPolicy, Resolution};
