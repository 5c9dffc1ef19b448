//! Number-Theoretic Transform engine (C4): forward/inverse NTT of length N
//! per modulus, standard and conjugate-invariant variants, each with a lazy
//! ("constant") form whose output sits in `[0, 2q)`.
//!
//! Butterfly contracts:
//! - forward (Cooley-Tukey, decimation-in-time): `(u, v) -> (u + v*psi, u + q - v*psi)`,
//!   output may reach `2q` before the final fold.
//! - inverse (Gentleman-Sande, decimation-in-frequency): `(u, v) -> (u + v, (u + 2q - v)*psi_inv)`,
//!   folded by `N^{-1}` in the final pass.
//!
//! The standard variant operates on `Z_q[X]/(X^N+1)` and requires a `2N`-th
//! root of unity with `q = 1 mod 2N`. The conjugate-invariant variant
//! operates on the fixed sub-ring of `Z_q[X]/(X^{2N}+1)` under `X <-> X^{-1}`;
//! substituting `Y = X^2` identifies that sub-ring's N coefficients with
//! evaluations at `{psi^{2(2j+1)}}`, i.e. the same size-N butterfly network
//! keyed to a `2N`-th root (`psi^2`, not `psi` itself) — the two variants
//! share this module's kernel byte-for-byte. What differs is the modulus
//! eligibility check: the conjugate-invariant case additionally needs
//! `q = 1 mod 4N` so that a genuine `4N`-th root `psi` exists to square into
//! the `2N`-th root the tables are built from (see DESIGN.md). Because the
//! tables are always keyed to a true `2N`-th order root, forward/backward
//! are honest mutual inverses on the N-sized coefficient buffer by
//! construction, for both variants.

use crate::modular::{cred, m_red_constant, MontgomeryParams};
use crate::params::NttTables;

/// In-place forward NTT, lazy: output coefficients in `[0, 2q)`.
pub fn forward_lazy(coeffs: &mut [u64], tables: &NttTables, q: u64, mp: &MontgomeryParams) {
    let n = coeffs.len();
    debug_assert!(n.is_power_of_two());
    let log_n = n.trailing_zeros();
    let mut t = n;
    for stage in 0..log_n {
        let m = 1usize << stage;
        t >>= 1;
        for i in 0..m {
            let j1 = 2 * i * t;
            let j2 = j1 + t;
            let s = m + i; // bit-reversed twiddle index for this butterfly
            let w = tables.psi_pow[s];
            for j in j1..j2 {
                let u = coeffs[j];
                let v = m_red_constant(coeffs[j + t], w, q, mp);
                // u can carry up to 4q from a prior stage where it was the
                // un-multiplied half of its butterfly; fold back to [0,2q)
                // after every stage so the next m_red_constant call sees a
                // bounded operand regardless of which role it plays next.
                coeffs[j] = cred(u + v, 2 * q);
                coeffs[j + t] = cred(u + 2 * q - v, 2 * q);
            }
        }
    }
}

/// In-place forward NTT, folded into `[0, q)`.
pub fn forward(coeffs: &mut [u64], tables: &NttTables, q: u64, mp: &MontgomeryParams) {
    forward_lazy(coeffs, tables, q, mp);
    for c in coeffs.iter_mut() {
        *c = cred(cred(*c, 2 * q), q);
    }
}

/// In-place inverse NTT, lazy: output in `[0, 2q)` before the final
/// `N^{-1}` multiply (which itself folds into `[0, q)`).
pub fn backward(coeffs: &mut [u64], tables: &NttTables, q: u64, mp: &MontgomeryParams) {
    let n = coeffs.len();
    debug_assert!(n.is_power_of_two());
    let log_n = n.trailing_zeros();
    let mut t = 1usize;
    for stage in (0..log_n).rev() {
        let m = 1usize << stage;
        for i in 0..m {
            let j1 = 2 * i * t;
            let j2 = j1 + t;
            let s = m + i;
            let w = tables.psi_inv_pow[s];
            for j in j1..j2 {
                let u = coeffs[j];
                let v = coeffs[j + t];
                let sum = u + v;
                coeffs[j] = cred(sum, 2 * q);
                let diff = u + 2 * q - v;
                coeffs[j + t] = m_red_constant(diff, w, q, mp);
            }
        }
        t <<= 1;
    }
    for c in coeffs.iter_mut() {
        *c = m_red_constant(*c, tables.n_inv_mont, q, mp);
        *c = cred(*c, q);
    }
}

/// Lazy inverse NTT: skips the trailing `cred` so the final `N^{-1}`
/// multiply's `[0, 2q)` Montgomery-constant output is returned as-is.
pub fn backward_lazy(coeffs: &mut [u64], tables: &NttTables, q: u64, mp: &MontgomeryParams) {
    let n = coeffs.len();
    let log_n = n.trailing_zeros();
    let mut t = 1usize;
    for stage in (0..log_n).rev() {
        let m = 1usize << stage;
        for i in 0..m {
            let j1 = 2 * i * t;
            let j2 = j1 + t;
            let s = m + i;
            let w = tables.psi_inv_pow[s];
            for j in j1..j2 {
                let u = coeffs[j];
                let v = coeffs[j + t];
                let sum = u + v;
                coeffs[j] = cred(sum, 2 * q);
                let diff = u + 2 * q - v;
                coeffs[j + t] = m_red_constant(diff, w, q, mp);
            }
        }
        t <<= 1;
    }
    for c in coeffs.iter_mut() {
        *c = m_red_constant(*c, tables.n_inv_mont, q, mp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modular::{m_form, BarrettParams};
    use crate::params::build_ntt_tables;

    fn naive_mul_neg_cyclic(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0i128; n];
        for i in 0..n {
            for j in 0..n {
                let prod = a[i] as i128 * b[j] as i128;
                let idx = (i + j) % n;
                if i + j >= n {
                    out[idx] -= prod;
                } else {
                    out[idx] += prod;
                }
            }
        }
        out.iter().map(|&v| (((v % q as i128) + q as i128) % q as i128) as u64).collect()
    }

    #[test]
    fn roundtrip_scenario_s1() {
        // N=8, q = 0x3ffffffff000001 (58-bit prime, 1 mod 16).
        let q = 0x3ffffffff000001u64;
        let n = 8usize;
        let bp = BarrettParams::new(q);
        let mp = MontgomeryParams::new(q);
        let psi = find_primitive_root(q, 2 * n as u64);
        let tables = build_ntt_tables(q, n, psi, &bp);

        let coeffs = [1u64, 2, 3, 4, 5, 6, 7, 8];
        let mut mont: Vec<u64> = coeffs.iter().map(|&c| m_form(c, q, &bp)).collect();
        forward(&mut mont, &tables, q, &mp);
        backward(&mut mont, &tables, q, &mp);
        let back: Vec<u64> = mont.iter().map(|&c| crate::modular::inv_m_form(c, q, &mp)).collect();
        assert_eq!(back, coeffs);
    }

    #[test]
    fn convolution_identity() {
        let q = 97u64;
        let n = 4usize;
        let bp = BarrettParams::new(q);
        let mp = MontgomeryParams::new(q);
        let psi = find_primitive_root(q, 2 * n as u64);
        let tables = build_ntt_tables(q, n, psi, &bp);

        let a = [1u64, 2, 3, 4];
        let b = [5u64, 6, 7, 8];
        let expect = naive_mul_neg_cyclic(&a, &b, q);

        let mut a_mont: Vec<u64> = a.iter().map(|&c| m_form(c, q, &bp)).collect();
        let mut b_mont: Vec<u64> = b.iter().map(|&c| m_form(c, q, &bp)).collect();
        forward(&mut a_mont, &tables, q, &mp);
        forward(&mut b_mont, &tables, q, &mp);
        let mut prod: Vec<u64> = a_mont.iter().zip(&b_mont).map(|(&x, &y)| crate::modular::m_red(x, y, q, &mp)).collect();
        backward(&mut prod, &tables, q, &mp);
        let got: Vec<u64> = prod.iter().map(|&c| crate::modular::inv_m_form(c, q, &mp)).collect();
        assert_eq!(got, expect);
    }

    /// Brute-force search for a primitive `order`-th root of unity mod `q`,
    /// for use in tests only (the ring builds these from a known generator
    /// in production; see ring.rs).
    pub(crate) fn find_primitive_root(q: u64, order: u64) -> u64 {
        for cand in 2..q {
            if crate::modular::mod_exp(cand, order, q) == 1 && crate::modular::mod_exp(cand, order / 2, q) != 1 {
                return cand;
            }
        }
        panic!("no primitive root of order {order} found mod {q}");
    }
}
