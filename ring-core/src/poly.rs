//! `Poly` (C6): a level-aware polynomial in `R_Q`, stored as an `L x N`
//! matrix of `u64` residues, one row per modulus. A `Poly` does not know
//! whether it is currently in coefficient or NTT domain — callers track
//! that externally, exactly as operations are named (`*_ntt` suffixes)
//! rather than the type carrying a domain flag.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::params::bit_reverse;
use crate::ring::RnsRing;

/// A polynomial at a given RNS level: `coeffs[i][j]` is the coefficient of
/// `X^j` reduced mod `q_i`, for `i` in `0..=level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<Vec<u64>>,
}

impl Poly {
    /// The zero polynomial at the ring's maximum level.
    pub fn zero(ring: &RnsRing) -> Self {
        Self::zero_at_level(ring, ring.level_count() - 1)
    }

    /// The zero polynomial restricted to the first `level + 1` moduli.
    pub fn zero_at_level(ring: &RnsRing, level: usize) -> Self {
        Poly {
            coeffs: vec![vec![0u64; ring.degree()]; level + 1],
        }
    }

    pub fn level(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn degree(&self) -> usize {
        self.coeffs[0].len()
    }

    /// Coefficients mod `q_level`.
    pub fn coeffs(&self, level: usize) -> &[u64] {
        &self.coeffs[level]
    }

    pub fn coeffs_mut(&mut self, level: usize) -> &mut [u64] {
        &mut self.coeffs[level]
    }

    pub fn all_coeffs(&self) -> &[Vec<u64>] {
        &self.coeffs
    }

    pub fn all_coeffs_mut(&mut self) -> &mut [Vec<u64>] {
        &mut self.coeffs
    }

    /// Builds directly from a precomputed `L x N` matrix, already reduced
    /// mod each `q_i`. Caller's responsibility; not checked.
    pub fn from_raw(coeffs: Vec<Vec<u64>>) -> Self {
        Poly { coeffs }
    }

    /// Sets every RNS row from the same signed `i64` coefficients,
    /// reducing each one mod its row's modulus.
    pub fn set_coefficients_int64(&mut self, ring: &RnsRing, values: &[i64]) {
        assert_eq!(values.len(), self.degree());
        for (level, row) in self.coeffs.iter_mut().enumerate() {
            let q = ring.modulus(level).q;
            for (slot, &v) in row.iter_mut().zip(values) {
                *slot = if v >= 0 {
                    (v as u64) % q
                } else {
                    q - ((-v) as u64 % q)
                } % q;
            }
        }
    }

    /// Sets every RNS row from unsigned `u64` coefficients.
    pub fn set_coefficients_uint64(&mut self, values: &[u64]) {
        assert_eq!(values.len(), self.degree());
        for row in self.coeffs.iter_mut() {
            for (slot, &v) in row.iter_mut().zip(values) {
                *slot = v;
            }
        }
    }

    /// Sets every RNS row from arbitrary-precision coefficients, each
    /// reduced mod its row's modulus (CRT basis decomposition, not a
    /// centered representation).
    pub fn set_coefficients_bigint(&mut self, ring: &RnsRing, values: &[BigInt]) {
        assert_eq!(values.len(), self.degree());
        for (level, row) in self.coeffs.iter_mut().enumerate() {
            let q = BigInt::from(ring.modulus(level).q);
            for (slot, v) in row.iter_mut().zip(values) {
                let r = v.mod_floor(&q);
                *slot = r.to_u64().expect("reduced value fits in u64");
            }
        }
    }

    /// Sets every RNS row from decimal-string coefficients, parsed as
    /// arbitrary-precision integers.
    pub fn set_coefficients_string(&mut self, ring: &RnsRing, values: &[String]) {
        let parsed: Vec<BigInt> = values
            .iter()
            .map(|s| s.parse::<BigInt>().expect("invalid decimal coefficient string"))
            .collect();
        self.set_coefficients_bigint(ring, &parsed);
    }

    /// CRT-reconstructs every coefficient into its full-precision integer
    /// value in `[0, Q)`, `Q` being the product of moduli up to this
    /// polynomial's level.
    pub fn to_bigint(&self, ring: &RnsRing) -> Vec<BigUint> {
        let level = self.level();
        let qs: Vec<BigUint> = ring.moduli()[..=level].iter().map(|m| BigUint::from(m.q)).collect();
        let q_total = ring.modulus_product_at_level(level);

        let mut qhat = Vec::with_capacity(qs.len());
        let mut qhat_inv = Vec::with_capacity(qs.len());
        for q in &qs {
            let qi = &q_total / q;
            let qi_inv = modinv_biguint(&qi.mod_floor(q), q);
            qhat.push(qi);
            qhat_inv.push(qi_inv);
        }

        let n = self.degree();
        let mut out = Vec::with_capacity(n);
        for j in 0..n {
            let mut acc = BigUint::zero();
            for i in 0..=level {
                let residue = BigUint::from(self.coeffs[i][j]);
                let term = (&residue * &qhat_inv[i]).mod_floor(&qs[i]);
                acc += &qhat[i] * term;
            }
            out.push(acc.mod_floor(&q_total));
        }
        out
    }

    /// Like [`Poly::to_bigint`] but formats each coefficient as a decimal
    /// string.
    pub fn to_string_coeffs(&self, ring: &RnsRing) -> Vec<String> {
        self.to_bigint(ring).iter().map(|v| v.to_string()).collect()
    }

    /// CRT-reconstructs and re-centers each coefficient into `(-Q/2, Q/2]`.
    pub fn centered_coefficients(&self, ring: &RnsRing) -> Vec<BigInt> {
        let q_total = ring.modulus_product_at_level(self.level());
        let half = &q_total / 2u32;
        self.to_bigint(ring)
            .iter()
            .map(|v| {
                if *v > half {
                    BigInt::from(v.clone()) - BigInt::from(q_total.clone())
                } else {
                    BigInt::from(v.clone())
                }
            })
            .collect()
    }

    /// Coefficient-wise equality within the shared level of the two
    /// polynomials (ignores any extra rows the longer one has).
    pub fn equal(&self, other: &Poly) -> bool {
        let shared = self.level().min(other.level());
        self.coeffs[..=shared] == other.coeffs[..=shared]
    }

    /// Permutes coefficients by reversing the low `log2(N)` bits of each
    /// index, in place per row. Used to switch between natural and
    /// bit-reversed coefficient order around the NTT.
    pub fn bit_reverse_in_place(&mut self) {
        let n = self.degree();
        let log_n = n.trailing_zeros();
        for row in self.coeffs.iter_mut() {
            for i in 0..n {
                let j = bit_reverse(i, log_n);
                if j > i {
                    row.swap(i, j);
                }
            }
        }
    }

    /// Applies the Galois automorphism `X -> X^gal_el` to coefficients in
    /// the standard (non-NTT) domain, returning a new polynomial. `gal_el`
    /// must be odd so the map is a ring automorphism of `X^N+1`; always
    /// returns a fresh `Poly` rather than aliasing `self` (see DESIGN.md).
    pub fn permute(&self, ring: &RnsRing, gal_el: u64) -> Poly {
        assert!(gal_el & 1 == 1, "Galois element must be odd");
        let n = self.degree() as u64;
        let mask = n - 1;
        let mut out = Poly::zero_at_level(ring, self.level());
        for (level, row) in self.coeffs.iter().enumerate() {
            let q = ring.modulus(level).q;
            for (j, &c) in row.iter().enumerate() {
                let raw = j as u64 * gal_el;
                let dest_index = raw & mask;
                // Each full wrap around degree N picks up a factor of
                // X^N = -1; an odd wrap count negates the coefficient.
                let wraps_odd = (raw >> n.trailing_zeros()) & 1 == 1;
                out.coeffs[level][dest_index as usize] = if wraps_odd && c != 0 { q - c } else { c };
            }
        }
        out
    }

    /// Applies a Galois automorphism to an NTT-domain polynomial via a
    /// precomputed index permutation: `out[i] = self[index[i]]`, no
    /// negation needed since NTT-domain slots are already images of
    /// evaluation points.
    pub fn permute_ntt_with_index(&self, index: &[usize]) -> Poly {
        assert_eq!(index.len(), self.degree());
        let mut out = Poly::from_raw(vec![vec![0u64; self.degree()]; self.level() + 1]);
        for (level, row) in self.coeffs.iter().enumerate() {
            for (i, &src) in index.iter().enumerate() {
                out.coeffs[level][i] = row[src];
            }
        }
        out
    }

    /// Builds the index permutation consumed by
    /// [`Poly::permute_ntt_with_index`] for Galois element `gal_el` over
    /// bit-reversed NTT-domain slots of degree `n`.
    pub fn galois_ntt_index(n: usize, gal_el: u64) -> Vec<usize> {
        let log_n = n.trailing_zeros();
        let mask = (n as u64) - 1;
        let mut index = vec![0usize; n];
        for i in 0..n {
            let bit_reversed = bit_reverse(i, log_n) as u64;
            let permuted = (2 * bit_reversed + 1).wrapping_mul(gal_el) & ((2 * n as u64) - 1);
            let natural = (permuted >> 1) & mask;
            index[i] = bit_reverse(natural as usize, log_n);
        }
        index
    }

    /// Multiplies by the monomial `X^k` in the coefficient domain (negating
    /// and rotating coefficients that wrap past degree N), per row. `k` is
    /// reduced into `[0, 2N)` first, but a single reduced `k` can still push
    /// `j + k` past `2N - 2`, wrapping twice; each full wrap of `N` picks up
    /// one more factor of `X^N = -1`, so the destination and sign come from
    /// `(j+k) div N` and `(j+k) mod N`, not a single-crossing check.
    pub fn mult_by_monomial(&self, ring: &RnsRing, k: i64) -> Poly {
        let n = self.degree() as i64;
        let two_n = 2 * n;
        let k = ((k % two_n) + two_n) % two_n;
        let mut out = Poly::zero_at_level(ring, self.level());
        for (level, row) in self.coeffs.iter().enumerate() {
            let q = ring.modulus(level).q;
            for (j, &c) in row.iter().enumerate() {
                let shifted = j as i64 + k;
                let dest = shifted % n;
                let negate = (shifted / n) % 2 == 1;
                let v = if negate && c != 0 { q - c } else { c };
                out.coeffs[level][dest as usize] = v;
            }
        }
        out
    }
}

fn modinv_biguint(a: &BigUint, m: &BigUint) -> BigUint {
    let a = BigInt::from(a.clone());
    let m = BigInt::from(m.clone());
    let (mut old_r, mut r) = (a, m.clone());
    let (mut old_s, mut s) = (BigInt::from(1), BigInt::from(0));
    while !r.is_zero() {
        let q = &old_r / &r;
        let tmp_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, tmp_r);
        let tmp_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, tmp_s);
    }
    ((old_s % &m) + &m).to_biguint().unwrap() % m.to_biguint().unwrap()
}
