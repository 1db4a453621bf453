//! Capability registry.
//!
//! Maps abstract operation names to the platforms that implement them and
//! to a fallback policy for the platforms that do not. The registry is
//! built once at startup from a static table plus configuration overrides,
//! and is immutable afterwards; [`CapabilityRegistry::resolve`] is pure and
//! side-effect free, so concurrent unsynchronized reads are safe.
//!
//! ## Rule Matching
//!
//! Each operation carries a list of [`CapabilityRule`]s. Resolution picks
//! the most specific rule for the profile: an exact-version rule wins over
//! a family-level rule. No rule for the profile's family means the
//! operation is unsupported there.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ops;
use crate::platform::{Family, PlatformProfile};

/// Behavior applied when an operation is not natively supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Surface `MiniapiError::Unsupported` to the caller.
    Error,
    /// Reproduce the abstract contract deterministically using only
    /// operations already proven supported.
    Emulate,
    /// Succeed without doing anything. Observably different from real
    /// execution; adapters document the difference per operation.
    NoOp,
}

/// One availability rule for an operation.
#[derive(Debug, Clone)]
pub struct CapabilityRule {
    /// Platform family the rule applies to.
    pub family: Family,
    /// When set, the rule only matches this exact profile version and
    /// takes precedence over family-level rules.
    pub version: Option<String>,
    /// Whether a native implementation exists under this rule.
    pub supported: bool,
    /// Policy applied when `supported` is false.
    pub fallback: FallbackPolicy,
}

impl CapabilityRule {
    /// Family-level rule marking native support.
    pub fn supported(family: Family) -> Self {
        CapabilityRule {
            family,
            version: None,
            supported: true,
            fallback: FallbackPolicy::Error,
        }
    }

    /// Family-level rule marking the operation unsupported with `fallback`.
    pub fn fallback(family: Family, fallback: FallbackPolicy) -> Self {
        CapabilityRule {
            family,
            version: None,
            supported: false,
            fallback,
        }
    }
}

/// Availability of one operation across platforms.
#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    /// The abstract operation name (see [`crate::ops`]).
    pub operation: &'static str,
    /// Matching rules, most specific wins.
    pub rules: Vec<CapabilityRule>,
}

/// Result of resolving an operation against a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A native implementation exists; dispatch to it.
    Supported,
    /// No native implementation; apply the given policy.
    Fallback(FallbackPolicy),
    /// No rule matches the profile at all.
    Unsupported,
}

/// The read-only operation/platform capability table.
pub struct CapabilityRegistry {
    table: HashMap<&'static str, Vec<CapabilityRule>>,
    overrides: HashMap<String, FallbackPolicy>,
}

impl CapabilityRegistry {
    /// Build the registry from the static default table.
    pub fn with_defaults() -> Self {
        Self::from_descriptors(default_table())
    }

    /// Build the registry from an explicit descriptor set.
    pub fn from_descriptors(descriptors: Vec<CapabilityDescriptor>) -> Self {
        let mut table = HashMap::new();
        for descriptor in descriptors {
            table.insert(descriptor.operation, descriptor.rules);
        }
        CapabilityRegistry {
            table,
            overrides: HashMap::new(),
        }
    }

    /// Apply configuration fallback overrides.
    ///
    /// An override replaces the table's resolution for that operation on
    /// every platform, including natively supported ones. This is how
    /// operators route around a broken native path and how the `Emulate`
    /// and `NoOp` contracts are exercised on platforms that support
    /// everything. Consumed during
    /// [`crate::dispatch::PlatformContext`] construction, before the
    /// registry becomes shared.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, FallbackPolicy>) {
        for (operation, policy) in overrides {
            self.overrides.insert(operation.clone(), *policy);
        }
    }

    /// Resolve `operation` against `profile`.
    ///
    /// Pure and deterministic: repeated calls with the same inputs return
    /// the same resolution. Exact-version rules win over family rules.
    pub fn resolve(&self, operation: &str, profile: &PlatformProfile) -> Resolution {
        let base = match self.table.get(operation) {
            None => Resolution::Unsupported,
            Some(rules) => {
                let exact = rules.iter().find(|r| {
                    r.family == profile.family
                        && r.version.as_deref() == Some(profile.version.as_str())
                });
                let family_level = rules
                    .iter()
                    .find(|r| r.family == profile.family && r.version.is_none());

                match exact.or(family_level) {
                    None => Resolution::Unsupported,
                    Some(rule) if rule.supported => Resolution::Supported,
                    Some(rule) => Resolution::Fallback(rule.fallback),
                }
            }
        };

        match self.overrides.get(operation) {
            Some(policy) => Resolution::Fallback(*policy),
            None => base,
        }
    }
}

/// The static default capability table.
///
/// Most operations are natively implemented on all three recognized
/// families; the exceptions are listed per rule. `Family::Unknown` never
/// appears here, so every operation resolves `Unsupported` on it unless an
/// override configures an explicit fallback.
fn default_table() -> Vec<CapabilityDescriptor> {
    let everywhere = || {
        vec![
            CapabilityRule::supported(Family::Linux),
            CapabilityRule::supported(Family::Macos),
            CapabilityRule::supported(Family::Windows),
        ]
    };

    ops::ALL_OPERATIONS
        .iter()
        .map(|&op| CapabilityDescriptor {
            operation: op,
            // macOS exposes no cheap per-process IO byte counters.
            rules: if op == ops::TELEMETRY_SAMPLE_IO {
                vec![
                    CapabilityRule::supported(Family::Linux),
                    CapabilityRule::fallback(Family::Macos, FallbackPolicy::Error),
                    CapabilityRule::supported(Family::Windows),
                ]
            } else {
                everywhere()
            },
        })
        .collect()
}
