//! Typed identifiers.
//!
//! `AgentId` is an agent's registration index with the traffic controller;
//! `NodeId` is a road node's index in a `GridGraph`.  Both wrap a `u32` and
//! index straight into the owning `Vec` through [`index`](NodeId::index).

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $name:ident, $tag:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Marks "no such id", e.g. an unreached node in a predecessor table.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// `None` if `index` does not fit in a `u32`.
            #[inline]
            pub fn from_index(index: usize) -> Option<$name> {
                u32::try_from(index).ok().map($name)
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        /// Defaults to [`INVALID`](Self::INVALID).
        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($tag, "#{}"), self.0)
                } else {
                    f.write_str(concat!($tag, "#-"))
                }
            }
        }
    };
}

typed_id! {
    /// Registration index of a delivery agent.
    AgentId, "agent"
}

typed_id! {
    /// Index of a road node in a `GridGraph`.
    NodeId, "node"
}
