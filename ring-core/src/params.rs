//! Per-modulus precomputations (C3): Barrett/Montgomery constants, powers-
//! of-psi tables for the NTT, `N^{-1}`, rescale tables, and the ternary
//! sampling lookup table. Computed once at [`crate::ring::RnsRing`]
//! validation and never mutated afterward.

use crate::modular::{self, BarrettParams, MontgomeryParams};

/// Everything the engine needs to operate mod a single `q_i`.
#[derive(Debug, Clone)]
pub struct ModulusPrecomp {
    pub q: u64,
    /// `2^{ceil(log2 q)} - 1`, the rejection-sampling mask.
    pub mask: u64,
    pub bred: BarrettParams,
    /// `None` when `q` is a power of two (Montgomery form is undefined).
    pub mred: Option<MontgomeryParams>,
    /// Set only when `q` is a valid NTT-friendly prime for this ring's
    /// degree and variant.
    pub ntt: Option<NttTables>,
    /// `[0, 1, q-1]`: maps a ternary tribit `{0,1,2}` to the plain residue
    /// representing `{0, +1, -1}`. Montgomery/NTT forms are derived from
    /// this at sample time by the caller (see `sampling::ternary`), not
    /// baked in here.
    pub ternary_lut: [u64; 3],
}

#[derive(Debug, Clone)]
pub struct NttTables {
    /// `psi` in Montgomery form, a `2N`-th (standard) or `4N`-th
    /// (conjugate-invariant) primitive root of unity.
    pub psi_mont: u64,
    pub psi_inv_mont: u64,
    /// Successive powers of psi in Montgomery form, bit-reversed order.
    pub psi_pow: Vec<u64>,
    pub psi_inv_pow: Vec<u64>,
    /// `N^{-1} mod q`, Montgomery form.
    pub n_inv_mont: u64,
}

impl ModulusPrecomp {
    /// Builds the non-NTT precomputations (Barrett, Montgomery, mask,
    /// ternary LUT) for `q`. NTT tables are filled in separately by the
    /// ring once the root order has been checked, since whether `q`
    /// supports NTT depends on `n`.
    pub fn new_arithmetic_only(q: u64) -> Self {
        let bred = BarrettParams::new(q);
        let mred = if q & 1 == 1 { Some(MontgomeryParams::new(q)) } else { None };
        let mask = if q <= 1 { 0 } else { (1u64 << (64 - (q - 1).leading_zeros())) - 1 };
        let ternary_lut = [0, 1, q - 1];
        ModulusPrecomp {
            q,
            mask,
            bred,
            mred,
            ntt: None,
            ternary_lut,
        }
    }

    pub fn is_ntt_ready(&self) -> bool {
        self.ntt.is_some()
    }
}

/// Builds the powers-of-psi tables (bit-reversed order, Montgomery form) for
/// a primitive root `psi` of the given order over a ring of degree `n`.
pub fn build_ntt_tables(q: u64, n: usize, psi: u64, bred: &BarrettParams) -> NttTables {
    let psi_inv = modular::mod_inverse_fermat(psi, q).expect("psi must be invertible mod q");
    let n_inv = modular::mod_inverse_fermat(n as u64, q).expect("N must be invertible mod q");

    let log_n = n.trailing_zeros();
    let psi_mont = modular::m_form(psi, q, bred);
    let psi_inv_mont = modular::m_form(psi_inv, q, bred);
    let n_inv_mont = modular::m_form(n_inv, q, bred);

    let mut psi_pow = vec![0u64; n];
    let mut psi_inv_pow = vec![0u64; n];
    for i in 0..n {
        let j = bit_reverse(i, log_n);
        let power = modular::mod_exp(psi, j as u64, q);
        psi_pow[i] = modular::m_form(power, q, bred);
        let power_inv = modular::mod_exp(psi_inv, j as u64, q);
        psi_inv_pow[i] = modular::m_form(power_inv, q, bred);
    }

    NttTables {
        psi_mont,
        psi_inv_mont,
        psi_pow,
        psi_inv_pow,
        n_inv_mont,
    }
}

pub fn bit_reverse(mut index: usize, bits: u32) -> usize {
    let mut reversed = 0usize;
    for _ in 0..bits {
        reversed = (reversed << 1) | (index & 1);
        index >>= 1;
    }
    reversed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reverse_matches_known_values() {
        assert_eq!(bit_reverse(0, 3), 0);
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(3, 3), 6);
        assert_eq!(bit_reverse(7, 3), 7);
    }

    #[test]
    fn ntt_tables_bit_reversed_order_matches_scenario_s2() {
        // N=4, q=97, psi=28.
        let q = 97u64;
        let n = 4usize;
        let psi = 28u64;
        let bred = BarrettParams::new(q);
        let tables = build_ntt_tables(q, n, psi, &bred);
        let expect = [
            modular::m_form(1, q, &bred),
            modular::m_form(8, q, &bred), // psi^2 = 784 mod 97 = 8
            modular::m_form(28, q, &bred),
            modular::m_form(modular::mod_exp(28, 3, q), q, &bred),
        ];
        assert_eq!(tables.psi_pow, expect);
    }
}
