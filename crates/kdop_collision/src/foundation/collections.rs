//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Stable handle to a primitive registered with a collision world
    pub struct PrimitiveKey;
}

/// Handle-based map for collision primitives
pub type PrimitiveMap<T> = SlotMap<PrimitiveKey, T>;
