//! Dense arena index newtypes, one per entity kind, so a `ValueId` can never
//! be used where an `OperationId` is expected even though both are `u32`
//! under the hood.

use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn raw(&self) -> u32 {
                self.0
            }

            pub(crate) fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(ValueId);
arena_id!(OperationId);
