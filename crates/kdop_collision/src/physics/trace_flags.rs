//! Options for line checks

bitflags::bitflags! {
    /// Flags controlling how a line check searches
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TraceFlags: u32 {
        /// Return the first hit found instead of the nearest one
        const STOP_AT_FIRST_HIT = 1 << 0;
    }
}

impl TraceFlags {
    /// Whether the search may end at any hit
    pub fn stops_at_first_hit(self) -> bool {
        self.contains(Self::STOP_AT_FIRST_HIT)
    }
}
