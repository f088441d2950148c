use super::ZIndex;

/// Stable paint-order key: z-layer first, then insertion order within the
/// layer. The derived ordering is field order, which is exactly the rule.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SortKey {
    pub z: ZIndex,
    pub order: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(z: ZIndex, order: u32) -> Self {
        Self { z, order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_dominates_order() {
        assert!(SortKey::new(ZIndex(0), 9) < SortKey::new(ZIndex(1), 0));
        assert!(SortKey::new(ZIndex(1), 0) < SortKey::new(ZIndex(1), 1));
        assert!(SortKey::new(ZIndex(-1), 5) < SortKey::new(ZIndex(0), 0));
    }
}
