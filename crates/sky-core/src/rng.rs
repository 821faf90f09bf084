//! Seeded pseudo-random sources for scene construction.
//!
//! Two distinct recurrences are kept on purpose: the filler field and the
//! procedural objects must each reproduce their own sequence for a given seed,
//! so they cannot share a generator or be swapped for one another.

use rand::SeedableRng;
use rand::rand_core::{RngCore, impls};

/// `2^-24`: a 24-bit integer times this is exactly representable and below 1.
const UNIT_24: f32 = 1.0 / 16_777_216.0;

// ---------------------------------------------------------------------------
// Filler star stream
// ---------------------------------------------------------------------------

/// 32-bit linear congruential generator used by the bulk filler-star field.
///
/// Recurrence: `state = state * 1664525 + 1013904223 (mod 2^32)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillerLcg {
    state: u32,
}

impl FillerLcg {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    /// Create a generator starting from `seed`.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the recurrence and return the new state.
    #[inline]
    pub fn step(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.state
    }

    /// Uniform sample in `[0, 1)`, from the top 24 bits of the state.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        (self.step() >> 8) as f32 * UNIT_24
    }

    /// Uniform sample in `[lo, hi)`.
    #[inline]
    pub fn next_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }
}

impl RngCore for FillerLcg {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for FillerLcg {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32 ^ (state >> 32) as u32)
    }
}

// ---------------------------------------------------------------------------
// Procedural object stream
// ---------------------------------------------------------------------------

/// Park–Miller "minimal standard" generator owned by a single nebula or galaxy.
///
/// Recurrence: `state = state * 16807 (mod 2^31 - 1)`, state never zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRng {
    state: u32,
}

impl ObjectRng {
    const MODULUS: u64 = 2_147_483_647;
    const MULTIPLIER: u64 = 16_807;

    /// Create a generator from a raw seed. Zero and multiples of the modulus
    /// are remapped so the stream never collapses.
    pub fn new(seed: u64) -> Self {
        let state = (seed % (Self::MODULUS - 1)) as u32 + 1;
        Self { state }
    }

    /// Derive the stream for the object at `index` within a scene seeded by `scene_seed`.
    ///
    /// Each object gets an independent stream, so building objects in a different
    /// order (or adding one) never shifts the randomness of the others.
    pub fn for_object(scene_seed: u64, index: u32) -> Self {
        let mixed = scene_seed
            .wrapping_add(1)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (index as u64 + 1).wrapping_mul(2_654_435_761);
        Self::new(mixed ^ (mixed >> 29))
    }

    /// Advance the recurrence and return the new state in `[1, 2^31 - 2]`.
    #[inline]
    pub fn step(&mut self) -> u32 {
        self.state = ((self.state as u64 * Self::MULTIPLIER) % Self::MODULUS) as u32;
        self.state
    }

    /// Uniform sample in `[0, 1)`, from the top 24 of the 31 state bits.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        ((self.step() - 1) >> 7) as f32 * UNIT_24
    }

    /// Uniform sample in `[lo, hi)`.
    #[inline]
    pub fn next_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }

    /// Returns `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_unit() < p
    }

    /// The current internal state, usable as a seed for derived noise fields.
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl RngCore for ObjectRng {
    fn next_u32(&mut self) -> u32 {
        // 31 significant bits per step; stitch two steps for a full word.
        let hi = self.step() << 1;
        let lo = self.step() >> 30;
        hi | lo
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for ObjectRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
