//! Ternary sampler: coefficients in `{-1, 0, +1}`, drawn either uniformly
//! or with a fixed Hamming weight ("sparse ternary" mode), via the ring's
//! precomputed `ternary_lut`.

use rand::{Rng, RngCore};

use crate::poly::Poly;
use crate::ring::RnsRing;

pub struct TernarySampler;

impl TernarySampler {
    /// Draws each coefficient independently: `0` with probability
    /// `1 - p_nonzero`, else `+1`/`-1` with equal probability, shared
    /// across every RNS row (the same ternary digit reduced per modulus).
    pub fn sample<R: RngCore>(ring: &RnsRing, level: usize, p_nonzero: f64, rng: &mut R) -> Poly {
        let n = ring.degree();
        let digits = Self::draw_digits(n, p_nonzero, rng);
        Self::poly_from_digits(ring, level, &digits)
    }

    /// Draws exactly `hamming_weight` nonzero coefficients (half +1, half
    /// -1, rounding the odd one to +1), the rest zero, via Fisher-Yates
    /// position selection.
    pub fn sample_sparse<R: RngCore>(ring: &RnsRing, level: usize, hamming_weight: usize, rng: &mut R) -> Poly {
        let n = ring.degree();
        assert!(hamming_weight <= n);
        let mut positions: Vec<usize> = (0..n).collect();
        for i in 0..hamming_weight {
            let j = i + (rng.next_u64() as usize % (n - i));
            positions.swap(i, j);
        }
        let mut digits = vec![0u8; n];
        for (k, &pos) in positions.iter().take(hamming_weight).enumerate() {
            digits[pos] = if k % 2 == 0 { 1 } else { 2 };
        }
        Self::poly_from_digits(ring, level, &digits)
    }

    /// Same distribution as [`TernarySampler::sample`], converted to
    /// Montgomery form afterward (the optional Montgomery form a caller can
    /// ask for instead of the plain `{0, 1, q-1}` residues).
    pub fn sample_montgomery<R: RngCore>(ring: &RnsRing, level: usize, p_nonzero: f64, rng: &mut R) -> Poly {
        let mut poly = Self::sample(ring, level, p_nonzero, rng);
        Self::to_montgomery_in_place(ring, level, &mut poly);
        poly
    }

    /// Same distribution as [`TernarySampler::sample_sparse`], converted to
    /// Montgomery form afterward.
    pub fn sample_sparse_montgomery<R: RngCore>(ring: &RnsRing, level: usize, hamming_weight: usize, rng: &mut R) -> Poly {
        let mut poly = Self::sample_sparse(ring, level, hamming_weight, rng);
        Self::to_montgomery_in_place(ring, level, &mut poly);
        poly
    }

    /// Same distribution as [`TernarySampler::sample`], then forward-NTT'd
    /// (Montgomery form is the required input domain for `RnsRing::ntt`).
    pub fn sample_ntt<R: RngCore>(ring: &RnsRing, level: usize, p_nonzero: f64, rng: &mut R) -> Poly {
        let mut poly = Self::sample_montgomery(ring, level, p_nonzero, rng);
        ring.ntt(&mut poly);
        poly
    }

    /// Same distribution as [`TernarySampler::sample_sparse`], then
    /// forward-NTT'd.
    pub fn sample_sparse_ntt<R: RngCore>(ring: &RnsRing, level: usize, hamming_weight: usize, rng: &mut R) -> Poly {
        let mut poly = Self::sample_sparse_montgomery(ring, level, hamming_weight, rng);
        ring.ntt(&mut poly);
        poly
    }

    fn to_montgomery_in_place(ring: &RnsRing, level: usize, poly: &mut Poly) {
        for i in 0..=level {
            let m = ring.modulus(i);
            let row = poly.coeffs(i).to_vec();
            crate::vector_ops::m_form_vec(&row, m.q, &m.bred, poly.coeffs_mut(i));
        }
    }

    fn draw_digits<R: RngCore>(n: usize, p_nonzero: f64, rng: &mut R) -> Vec<u8> {
        (0..n)
            .map(|_| {
                if rng.gen::<f64>() >= p_nonzero {
                    0
                } else if rng.gen::<bool>() {
                    1
                } else {
                    2
                }
            })
            .collect()
    }

    fn poly_from_digits(ring: &RnsRing, level: usize, digits: &[u8]) -> Poly {
        let mut poly = Poly::zero_at_level(ring, level);
        for i in 0..=level {
            let lut = ring.modulus(i).ternary_lut;
            let row = poly.coeffs_mut(i);
            for (slot, &d) in row.iter_mut().zip(digits) {
                *slot = lut[d as usize];
            }
        }
        poly
    }
}
