//! Dense joint identifiers and their allocator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Joint id in `[0, N)`. The root is always 0 and a parent's id is always lower
/// than its children's ids.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

impl JointId {
    pub const ROOT: JointId = JointId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for joint ids, handed out in the order joints are visited.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_joint: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_joint(&mut self) -> JointId {
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        id
    }

    #[inline]
    pub fn allocated(&self) -> usize {
        self.next_joint as usize
    }
}
