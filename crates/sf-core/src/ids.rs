//! Dense, typed indices for network objects.
//!
//! Every table in the network is a `Vec` indexed by position, so an id is
//! just that position. Each object kind gets its own type so a link id can
//! never be used to look up a node.

use core::fmt;
use core::num::NonZeroU32;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Id of the object stored at `index`.
            pub fn from_index(index: u32) -> Self {
                // stored off by one; saturates at u32::MAX
                Self(NonZeroU32::MIN.saturating_add(index))
            }

            pub fn index(self) -> u32 {
                self.0.get() - 1
            }

            /// Position in the owning table.
            pub fn idx(self) -> usize {
                self.index() as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $tag, self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }
    };
}

define_id!(
    /// A junction, outfall, storage unit or divider.
    NodeId,
    "node"
);
define_id!(
    /// A conduit, pump, orifice, weir or outlet.
    LinkId,
    "link"
);
define_id!(SubcatchId, "subcatch");

/// Pollutants are few and never removed; a plain index is enough.
pub type PollutantIdx = usize;
