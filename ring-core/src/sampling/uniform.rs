//! Uniform sampler: rejection sampling against a bitmask, so coefficients
//! land exactly in `[0, q)` with no modular-reduction bias.

use rand::RngCore;

use crate::poly::Poly;
use crate::ring::RnsRing;

pub struct UniformSampler;

impl UniformSampler {
    /// Fills every row of a fresh polynomial at `level` with coefficients
    /// drawn uniformly from `[0, q_i)`, independently per modulus.
    pub fn sample<R: RngCore>(ring: &RnsRing, level: usize, rng: &mut R) -> Poly {
        let n = ring.degree();
        let mut poly = Poly::zero_at_level(ring, level);
        for i in 0..=level {
            let m = ring.modulus(i);
            let row = poly.coeffs_mut(i);
            for slot in row.iter_mut() {
                *slot = Self::sample_one(m.q, m.mask, rng);
            }
        }
        poly
    }

    /// Draws one uniform residue in `[0, q)` via mask-and-reject: draws a
    /// random value under `mask` (the smallest `2^k - 1 >= q - 1`) and
    /// retries until it falls below `q`.
    fn sample_one<R: RngCore>(q: u64, mask: u64, rng: &mut R) -> u64 {
        loop {
            let candidate = rng.next_u64() & mask;
            if candidate < q {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn samples_are_within_range() {
        let ring = RnsRing::builder().degree(8).moduli(vec![97, 193]).build().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let poly = UniformSampler::sample(&ring, 1, &mut rng);
        for i in 0..=1 {
            let q = ring.modulus(i).q;
            assert!(poly.coeffs(i).iter().all(|&c| c < q));
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let ring = RnsRing::builder().degree(8).moduli(vec![97]).build().unwrap();
        let mut rng_a = ChaCha20Rng::seed_from_u64(7);
        let mut rng_b = ChaCha20Rng::seed_from_u64(7);
        let a = UniformSampler::sample(&ring, 0, &mut rng_a);
        let b = UniformSampler::sample(&ring, 0, &mut rng_b);
        assert_eq!(a, b);
    }
}
