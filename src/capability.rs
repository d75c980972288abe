//! Runtime capability probing.
//!
//! Components describe what they can do by answering 4-byte capability ids.
//! The registry probes candidates before admitting them: a real transformer
//! answers `false` for the reserved invalid id, `true` for the probe
//! capability itself, and `true` for the transform capability. Unknown ids
//! always answer `false`, never an error.

use alloy_primitives::keccak256;

/// A 4-byte capability identifier, derived from a capability name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId(pub [u8; 4]);

impl CapabilityId {
    /// Reserved id that no component may claim. Probing logic uses it to
    /// reject components that blindly answer `true`.
    pub const INVALID: CapabilityId = CapabilityId([0xff, 0xff, 0xff, 0xff]);

    /// Derive a capability id from its name.
    pub fn of(name: &str) -> Self {
        let hash = keccak256(name.as_bytes());
        CapabilityId([hash[0], hash[1], hash[2], hash[3]])
    }

    /// The self-description capability: answering probes at all.
    pub fn probe() -> Self {
        CapabilityId::of("capability-probe")
    }

    /// The transformer capability: the full conversion interface.
    pub fn transform() -> Self {
        CapabilityId::of("transform")
    }

    /// Dust collection: governor-gated recovery of stray balances.
    pub fn collectable_dust() -> Self {
        CapabilityId::of("collectable-dust")
    }
}

/// The answer set shared by every transformer in this crate.
pub fn standard_transformer_capabilities(capability: CapabilityId) -> bool {
    capability == CapabilityId::probe() || capability == CapabilityId::transform()
}
