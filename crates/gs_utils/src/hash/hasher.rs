//! Hashers behind the workspace's containers.
//!
//! - [`FixedHashState`]: `foldhash` with a constant seed. Iteration order
//!   of a map only depends on its keys, so layouts and logs are
//!   reproducible from one run to the next.
//! - [`PtrHashState`]: a single multiply for keys that are addresses.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

const SEED: u64 = 0x6A09_E667_F3BC_C908;

/// Hasher built by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// Seeded `foldhash` state, the default state of [`HashMap`](super::HashMap)
/// and [`HashSet`](super::HashSet).
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use gs_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("core.i32");
/// let b = FixedHashState.hash_one("core.i32");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(SEED).build_hasher()
    }
}

// -----------------------------------------------------------------------------
// PtrHasher

/// Golden ratio multiplier, spreads aligned addresses over the high bits.
const PTR_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// A hasher for a single pointer-sized key.
///
/// Heap addresses are aligned, so their low bits carry no information.
/// `write_usize` multiplies the address by a fixed odd constant and folds
/// the high half back in, which is enough for `hashbrown`'s top-7-bit tags.
///
/// Other methods fall back to folding the bytes in order.
#[derive(Copy, Clone, Default, Debug)]
pub struct PtrHasher {
    hash: u64,
}

impl Hasher for PtrHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash = (self.hash.rotate_left(8) ^ (*byte as u64)).wrapping_mul(PTR_MIX);
        }
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        let mixed = (i as u64).wrapping_mul(PTR_MIX);
        self.hash = mixed ^ (mixed >> 32);
    }
}

/// Build state for [`PtrHasher`].
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hasher};
/// use gs_utils::hash::PtrHashState;
///
/// let mut a = PtrHashState.build_hasher();
/// a.write_usize(0x1000);
/// let mut b = PtrHashState.build_hasher();
/// b.write_usize(0x1008);
///
/// assert_ne!(a.finish(), b.finish());
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct PtrHashState;

impl BuildHasher for PtrHashState {
    type Hasher = PtrHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        PtrHasher::default()
    }
}
