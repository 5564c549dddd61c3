//! Morton (Z-order) coordinate interleaving.
//!
//! An alternative way of addressing tiles in spatial-locality order by
//! interleaving the bits of the grid coordinates. The manifest uses the
//! recursive quadtree walk in [`crate::quadtree`] instead; this is kept as a
//! standalone utility and is not used by the render pipeline.

const MASKS: [u32; 4] = [0x5555_5555, 0x3333_3333, 0x0F0F_0F0F, 0x00FF_00FF];
const SHIFTS: [u32; 4] = [1, 2, 4, 8];

/// Spreads the low 16 bits of `v` so that bit `i` moves to bit `2i`.
#[inline]
fn spread(v: u16) -> u32 {
    let mut v = u32::from(v);
    v = (v | (v << SHIFTS[3])) & MASKS[3];
    v = (v | (v << SHIFTS[2])) & MASKS[2];
    v = (v | (v << SHIFTS[1])) & MASKS[1];
    (v | (v << SHIFTS[0])) & MASKS[0]
}

/// Interleaves two 16-bit coordinates into a 32-bit Morton code.
///
/// Bits of `x` occupy the even positions and bits of `y` the odd ones.
pub fn swizzle(x: u16, y: u16) -> u32 {
    spread(x) | (spread(y) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swizzle_small_values() {
        assert_eq!(swizzle(0, 0), 0);
        assert_eq!(swizzle(1, 0), 1);
        assert_eq!(swizzle(0, 1), 2);
        assert_eq!(swizzle(1, 1), 3);
        assert_eq!(swizzle(2, 0), 4);
        assert_eq!(swizzle(3, 3), 15);
    }

    #[test]
    fn test_swizzle_extremes() {
        assert_eq!(swizzle(0xFFFF, 0), 0x5555_5555);
        assert_eq!(swizzle(0, 0xFFFF), 0xAAAA_AAAA);
        assert_eq!(swizzle(0xFFFF, 0xFFFF), u32::MAX);
    }

    #[test]
    fn test_swizzle_matches_quadtree_order() {
        // Sorting a 4x4 grid by Morton code gives the same order as the
        // recursive quadtree walk.
        let size = 4u32;
        let mut by_code: Vec<(u32, u32)> = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                (swizzle(x as u16, y as u16), 1 + i)
            })
            .collect();
        by_code.sort_unstable();
        let order: Vec<u32> = by_code.into_iter().map(|(_, index)| index).collect();

        assert_eq!(order, crate::quadtree::leaf_order(size));
    }
}
