//! Identifiers and a simple allocator for mounted sections.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub u32);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section#{}", self.0)
    }
}

/// Monotonic allocator for SectionId.
/// Ids are never reused within one engine, so a stale id cannot alias a newer section.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_section: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next `alloc_section` will return.
    #[inline]
    pub fn peek_section(&self) -> SectionId {
        SectionId(self.next_section)
    }

    #[inline]
    pub fn alloc_section(&mut self) -> SectionId {
        let id = self.peek_section();
        self.next_section = self.next_section.wrapping_add(1);
        id
    }
}
