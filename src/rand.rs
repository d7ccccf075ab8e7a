use std::num::Wrapping;

use crate::math::pi;

// Linear congruential generator parameters
const MUL: u64 = 6364136223846793005; // Knuth section 3.3.4 (p.108)
const INC: u64 = 1442695040888963407;

/// Seeded pseudo-random stream used for every stochastic choice in a pass.
///
/// The noise field is not driven by this stream: reseeding an
/// `Rng` never changes what [`crate::noise_field::NoiseField`] returns.
#[derive(Clone, PartialEq)]
pub struct Rng {
    state: u64,
    next_gaussian: Option<f64>,
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rng")
            .field("state", &format_args!("{:#018x}", self.state))
            .field("next_gaussian", &self.next_gaussian)
            .finish()
    }
}

impl Rng {
    /// Seeds a stream from an arbitrary byte string.
    pub fn from_bytes(seed: &[u8]) -> Rng {
        let lower = murmur2(seed, 1690382925).swap_bytes();
        let upper = murmur2(seed, 72970470).swap_bytes();
        let state = u64::from(lower) | (u64::from(upper) << 32);
        Rng {
            state,
            next_gaussian: None,
        }
    }

    /// Seeds a stream from the numeric seed exposed in [`crate::config::Params`].
    pub fn from_seed(seed: u32) -> Rng {
        Rng::from_bytes(&seed.to_le_bytes())
    }

    /// Picks a random value uniformly distributed between `0.0` (inclusive) and `1.0` (exclusive).
    pub fn rnd(&mut self) -> f64 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(MUL).wrapping_add(INC);
        // PCG-XSH-RR output function (O'Neill 2014, section 6.3.1) over the old state.
        let xorshifted = ((((old_state >> 18) & !(3 << 30)) ^ old_state) >> 27) as u32;
        let fac = xorshifted.rotate_right((old_state >> 59) as u32);
        2.0f64.powi(-32) * f64::from(fac)
    }

    /// Picks a random value uniformly distributed between `min` (inclusive) and `max` (exclusive).
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.rnd() * (max - min) + min
    }

    /// Picks a normal deviate with the given mean and standard deviation.
    ///
    /// Uses the Marsaglia polar method. Each accepted pair yields two deviates; the second is
    /// cached and returned by the next call, so the cache is part of the stream state.
    pub fn gauss(&mut self, mean: f64, stdev: f64) -> f64 {
        if let Some(z) = self.next_gaussian.take() {
            return mean + stdev * z;
        }
        let (v1, v2, s) = loop {
            let v1 = self.rnd() * 2.0 - 1.0;
            let v2 = self.rnd() * 2.0 - 1.0;
            let s = v1 * v1 + v2 * v2;
            if s < 1.0 && s != 0.0 {
                break (v1, v2, s);
            }
        };
        let multiplier = (-2.0 * f64::ln(s) / s).sqrt();
        let (z1, z2) = (v1 * multiplier, v2 * multiplier);
        self.next_gaussian = Some(z2);
        mean + stdev * z1
    }

    /// Uniform offset in `[-magnitude, magnitude)`. Used for all the symmetric color and
    /// position jitters.
    pub fn jitter(&mut self, magnitude: f64) -> f64 {
        self.uniform(-magnitude, magnitude)
    }

    /// Picks an integer uniformly from `min..max`. Returns `min` when the range is empty.
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.uniform(min as f64, max as f64).floor() as i64
    }

    /// Uniform angle in `[0, 2π)`.
    pub fn angle(&mut self) -> f64 {
        self.uniform(0.0, pi(2.0))
    }

    /// Picks `true` with probability `p`.
    ///
    /// Uses a strict comparison so that `odds(0.0)` never fires: the chaos-scaled features rely on
    /// a zero probability meaning "never".
    pub fn odds(&mut self, p: f64) -> bool {
        self.rnd() < p
    }

    /// Chooses an item from `items` at a uniformly random index, or `None` if `items` is empty.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.uniform(0.0, items.len() as f64) as usize)
    }
}


fn murmur2(bytes: &[u8], seed: u32) -> u32 {
    const K: usize = 16;
    const MASK: Wrapping<u32> = Wrapping(0xffff);
    const MASK_BYTE: Wrapping<u32> = Wrapping(0xff);
    const M: Wrapping<u32> = Wrapping(0x5bd1e995);

    let mut l: usize = bytes.len();
    let mut h = Wrapping(seed ^ (l as u32));
    let mut i = 0;

    let byte32 = |i: usize| Wrapping(u32::from(bytes[i]));

    while l >= 4 {
        let mut k = (byte32(i) & MASK_BYTE)
            | ((byte32(i + 1) & MASK_BYTE) << 8)
            | ((byte32(i + 2) & MASK_BYTE) << 16)
            | ((byte32(i + 3) & MASK_BYTE) << 24);
        i += 4;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        k ^= k >> 24;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        h = ((h & MASK) * M + ((((h >> K) * M) & MASK) << K)) ^ k;
        l -= 4;
    }
    if l >= 3 {
        h ^= (byte32(i + 2) & MASK_BYTE) << K;
    }
    if l >= 2 {
        h ^= (byte32(i + 1) & MASK_BYTE) << 8;
    }
    if l >= 1 {
        h ^= byte32(i) & MASK_BYTE;
        h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    }

    h ^= h >> 13;
    h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    h ^= h >> 15;

    h.0
}

#[cfg(test)]
mod murmur2_test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test() {
        assert_eq!(murmur2(b"", 0), 0);
        assert_eq!(murmur2(b"\x12\x34\x56\x78", 0), 0x52bcf091);

        let bytes = &hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");
        assert_eq!(murmur2(bytes, 0x64c1324d), 0x142b44e9);
    }
}
