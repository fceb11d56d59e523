//! Deterministic RNG helpers.
//!
//! Random composites draw from here instead of a global generator so a given agent seed replays
//! the same choices. Not cryptographic.

pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Uniform float in `[0, 1)`.
    fn next_f32_unit(&mut self) -> f32 {
        // 24 bits of mantissa
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "next_index on an empty range");
        // Lemire's multiply-shift; bias is negligible for child counts.
        (((self.next_u32() as u64) * (len as u64)) >> 32) as usize
    }

    fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// SplitMix64: good seeding RNG and small deterministic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        mix64(self.state)
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.step()
    }
}

pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Seed for one draw site: stable for a given `(seed, tick, stream)` triple.
pub fn derive_seed(seed: u64, tick: u64, stream: u64) -> u64 {
    let x = seed ^ mix64(tick.wrapping_add(0x9E3779B97F4A7C15)) ^ mix64(stream);
    mix64(x)
}

/// Stream for the `draw`-th fresh choice at one draw site, so repeated choices within a tick
/// stay independent.
pub fn draw_stream(site: u64, draw: u64) -> u64 {
    mix64(site ^ mix64(draw.wrapping_add(0x9E3779B97F4A7C15)))
}

/// Stable 64-bit id for a name (FNV-1a). Used to salt the streams of separately built trees.
pub fn name_salt(name: &str) -> u64 {
    name.bytes().fold(0xCBF2_9CE4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01B3)
    })
}
