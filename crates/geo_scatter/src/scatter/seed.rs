//! Deterministic per-region seeds.
//!
//! Seeded runs give the allocator and every region an independent random
//! stream derived from one base seed, so a region's points do not depend on how
//! many candidates other regions rejected.

/// Stream index reserved for the allocator's residual draw.
const ALLOCATION_STREAM: u64 = u64::MAX;

/// Creates a deterministic seed for the region at `index` from a base seed.
pub fn seed_for_region(base_seed: u64, index: usize) -> u64 {
    seed_for_stream(base_seed, index as u64)
}

/// Creates the seed used for the allocator's residual draw.
pub fn seed_for_allocation(base_seed: u64) -> u64 {
    seed_for_stream(base_seed, ALLOCATION_STREAM)
}

fn seed_for_stream(base_seed: u64, stream: u64) -> u64 {
    let mixed = base_seed
        ^ stream.wrapping_add(1).wrapping_mul(0x9E3779B97F4A7C15)
        ^ 0xBF58476D1CE4E5B9;
    mix_u64(mixed)
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}
