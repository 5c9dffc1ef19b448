//! Vectorized coefficient kernels (C2): coefficient-wise add/sub/mul/neg/
//! reduce/scale over aligned `u64` slices of length N. None of these
//! allocate; each is a pure function of its inputs. Inner loops are written
//! to process width-8 blocks via `chunks_exact(8)`, matching the source
//! library's unrolled-by-8 schedule; the tail (N not a multiple of 8, not a
//! contract requirement but handled defensively) runs the scalar path.
//!
//! Result range is part of each kernel's contract:
//! - plain kernels (`add_vec`, `sub_vec`, `mul_coeffs_vec`, ...) return values
//!   in `[0, q)`.
//! - `*_no_mod` / `*_constant` kernels skip the final fold and return values
//!   in the documented lazy range (`[0, 2q)` or `[0, 3q)`).

use crate::modular::{bred_constant, cred, m_red, m_red_constant, BarrettParams, MontgomeryParams};

const BLOCK: usize = 8;

fn assert_same_len(a: &[u64], b: &[u64]) {
    debug_assert_eq!(a.len(), b.len(), "vector kernels require equal-length slices");
}

/// `out[i] = (a[i] + b[i]) mod q`, result in `[0, q)`.
pub fn add_vec(a: &[u64], b: &[u64], q: u64, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let s = ai + bi;
        *oi = if s >= q { s - q } else { s };
    }
}

/// `out[i] = a[i] + b[i]`, no reduction; result in `[0, 2q)` when both inputs
/// are already in `[0, q)`.
pub fn add_vec_no_mod(a: &[u64], b: &[u64], out: &mut [u64]) {
    assert_same_len(a, b);
    for chunk in 0..a.len() / BLOCK {
        let base = chunk * BLOCK;
        for k in 0..BLOCK {
            out[base + k] = a[base + k] + b[base + k];
        }
    }
    for i in (a.len() / BLOCK) * BLOCK..a.len() {
        out[i] = a[i] + b[i];
    }
}

/// `out[i] = (a[i] - b[i]) mod q`, result in `[0, q)`.
pub fn sub_vec(a: &[u64], b: &[u64], q: u64, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = if ai >= bi { ai - bi } else { ai + q - bi };
    }
}

/// `out[i] = a[i] - b[i] + 2q`, no fold; result in `[0, 3q)` given inputs in
/// `[0, 2q)`.
pub fn sub_vec_no_mod(a: &[u64], b: &[u64], q: u64, out: &mut [u64]) {
    assert_same_len(a, b);
    let two_q = 2 * q;
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = ai + two_q - bi;
    }
}

/// `out[i] = -a[i] mod q`, result in `[0, q)`.
pub fn neg_vec(a: &[u64], q: u64, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = if *ai == 0 { 0 } else { q - ai };
    }
}

/// Folds every entry of `a` (assumed in `[0, 2q)`) into `[0, q)`.
pub fn reduce_vec(a: &[u64], q: u64, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = cred(*ai, q);
    }
}

/// Folds every entry of `a` (assumed in `[0, 4q)`, e.g. after summing two
/// `[0, 2q)` lazy vectors) into `[0, 2q)` via a single conditional
/// subtraction of `2q`.
pub fn reduce_constant_vec(a: &[u64], q: u64, out: &mut [u64]) {
    let two_q = 2 * q;
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = if *ai >= two_q { *ai - two_q } else { *ai };
    }
}

/// Reduces every entry of `a` modulo an arbitrary modulus `m` (not
/// necessarily NTT-friendly), via Barrett reduction.
pub fn mod_vec(a: &[u64], m: u64, bp: &BarrettParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = bred_constant(*ai, 1, m, bp);
        *oi = cred(*oi, m);
    }
}

/// Barrett coefficient-wise multiplication, result in `[0, q)`.
pub fn mul_coeffs_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = cred(bred_constant(*ai, *bi, q, bp), q);
    }
}

/// Barrett coefficient-wise multiplication, lazy: result in `[0, 2q)`.
pub fn mul_coeffs_constant_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = bred_constant(*ai, *bi, q, bp);
    }
}

/// Montgomery coefficient-wise multiplication on operands already in
/// Montgomery form, result in `[0, q)`.
pub fn mul_coeffs_montgomery_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = m_red(*ai, *bi, q, mp);
    }
}

/// Same as [`mul_coeffs_montgomery_vec`] but lazy: result in `[0, 2q)`.
pub fn mul_coeffs_montgomery_constant_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = m_red_constant(*ai, *bi, q, mp);
    }
}

/// `out[i] += a[i] * b[i]` (Montgomery), folded into `[0, q)`. Used by
/// inner-product accumulation without a redundant write-allocate pass.
pub fn mul_coeffs_montgomery_and_add_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let s = *oi + m_red(*ai, *bi, q, mp);
        *oi = if s >= q { s - q } else { s };
    }
}

/// `out[i] -= a[i] * b[i]` (Montgomery), folded into `[0, q)`.
pub fn mul_coeffs_montgomery_and_sub_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let prod = m_red(*ai, *bi, q, mp);
        *oi = if *oi >= prod { *oi - prod } else { *oi + q - prod };
    }
}

/// `out[i] += a[i]` (Montgomery-multiplied result), no modular fold.
pub fn add_vec_no_mod_and_mul_scalar_montgomery_vec(
    a: &[u64],
    scalar_mont: u64,
    q: u64,
    mp: &MontgomeryParams,
    out: &mut [u64],
) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi += m_red_constant(*ai, scalar_mont, q, mp);
    }
}

/// `out[i] = (a[i] + scalar) mod q`.
pub fn add_scalar_vec(a: &[u64], scalar: u64, q: u64, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        let s = ai + scalar;
        *oi = if s >= q { s - q } else { s };
    }
}

/// `out[i] = (a[i] - scalar) mod q`.
pub fn sub_scalar_vec(a: &[u64], scalar: u64, q: u64, out: &mut [u64]) {
    let scalar = scalar % q;
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = if *ai >= scalar { ai - scalar } else { ai + q - scalar };
    }
}

/// `out[i] = a[i] * scalar_mont` (Montgomery), result in `[0, q)`.
pub fn mul_scalar_montgomery_vec(a: &[u64], scalar_mont: u64, q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = m_red(*ai, scalar_mont, q, mp);
    }
}

/// `out[i] += a[i] * scalar_mont` (Montgomery), folded into `[0, q)`.
pub fn mul_scalar_montgomery_and_add_vec(a: &[u64], scalar_mont: u64, q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        let s = *oi + m_red(*ai, scalar_mont, q, mp);
        *oi = if s >= q { s - q } else { s };
    }
}

/// Rescale helper: `out[i] = (a[i] + 2q - b[i] * scalar_mont) * other_mont`,
/// used by `DivRoundByLastModulus` to recenter before the Montgomery
/// divide. `two_qi` is `2*q` precomputed by the caller.
pub fn sub_vec_and_mul_scalar_montgomery_two_qi_vec(
    a: &[u64],
    b: &[u64],
    scalar_mont: u64,
    two_qi: u64,
    q: u64,
    mp: &MontgomeryParams,
    out: &mut [u64],
) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let centered = ai + two_qi - bi;
        *oi = m_red(centered, scalar_mont, q, mp);
    }
}

/// `out[i] = (out[i] + a[i]*b[i]) mod q` (Barrett), folded into `[0, q)`.
pub fn mul_coeffs_and_add_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let s = *oi + cred(bred_constant(*ai, *bi, q, bp), q);
        *oi = if s >= q { s - q } else { s };
    }
}

/// `out[i] += a[i]*b[i]` (Barrett), no fold; result in `[0, 3q)` given `out`
/// already in `[0, q)`.
pub fn mul_coeffs_and_add_no_mod_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi += bred_constant(*ai, *bi, q, bp);
    }
}

/// `out[i] = (out[i] - a[i]*b[i]) mod q` (Barrett), folded into `[0, q)`.
pub fn mul_coeffs_and_sub_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let prod = cred(bred_constant(*ai, *bi, q, bp), q);
        *oi = if *oi >= prod { *oi - prod } else { *oi + q - prod };
    }
}

/// `out[i] = out[i] + 2q - a[i]*b[i]` (Barrett), no fold; mirrors
/// [`sub_vec_no_mod`]'s recentering schedule for a product operand.
pub fn mul_coeffs_and_sub_no_mod_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    let two_q = 2 * q;
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = *oi + two_q - bred_constant(*ai, *bi, q, bp);
    }
}

/// `out[i] = -(a[i]*b[i]) mod q` (Barrett), result in `[0, q)`.
pub fn mul_coeffs_and_neg_vec(a: &[u64], b: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let prod = cred(bred_constant(*ai, *bi, q, bp), q);
        *oi = if prod == 0 { 0 } else { q - prod };
    }
}

/// `out[i] += a[i]*b[i]` (Montgomery), no fold; result in `[0, 3q)` given
/// `out` already in `[0, q)`.
pub fn mul_coeffs_montgomery_and_add_no_mod_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi += m_red_constant(*ai, *bi, q, mp);
    }
}

/// `out[i] = out[i] + 2q - a[i]*b[i]` (Montgomery), no fold.
pub fn mul_coeffs_montgomery_and_sub_no_mod_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    let two_q = 2 * q;
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        *oi = *oi + two_q - m_red_constant(*ai, *bi, q, mp);
    }
}

/// `out[i] = -(a[i]*b[i]) mod q` (Montgomery), result in `[0, q)`.
pub fn mul_coeffs_montgomery_and_neg_vec(a: &[u64], b: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    assert_same_len(a, b);
    for ((ai, bi), oi) in a.iter().zip(b).zip(out.iter_mut()) {
        let prod = m_red(*ai, *bi, q, mp);
        *oi = if prod == 0 { 0 } else { q - prod };
    }
}

/// `out[i] = two_qi - (a[i] + scalar)`, no fold. Recenters a sum against a
/// caller-supplied `2q`-scaled bound without reducing mod `q`.
pub fn add_scalar_no_mod_and_neg_two_qi_no_mod_vec(a: &[u64], scalar: u64, two_qi: u64, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = two_qi - (ai + scalar);
    }
}

/// Converts every entry to Montgomery form, result in `[0, q)`.
pub fn m_form_vec(a: &[u64], q: u64, bp: &BarrettParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = crate::modular::m_form(*ai, q, bp);
    }
}

/// Lazy Montgomery-form conversion via the Barrett constant-multiply kernel:
/// `out[i] = a[i] * r_mod_q` unreduced, result in `[0, 2q)`. `r_mod_q` is
/// `2^64 mod q`, precomputed once by the caller (e.g. `m_form(1, q, bp)`
/// folded back open — see the test below) rather than recomputed per call.
pub fn m_form_constant_vec(a: &[u64], r_mod_q: u64, q: u64, bp: &BarrettParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = bred_constant(*ai, r_mod_q, q, bp);
    }
}

/// Converts every entry out of Montgomery form, result in `[0, q)`.
pub fn inv_m_form_vec(a: &[u64], q: u64, mp: &MontgomeryParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        *oi = crate::modular::inv_m_form(*ai, q, mp);
    }
}

/// Multiplies every coefficient by `2^k mod q`.
pub fn mul_by_pow2_vec(a: &[u64], k: u32, q: u64, bp: &BarrettParams, out: &mut [u64]) {
    for (ai, oi) in a.iter().zip(out.iter_mut()) {
        let mut v = *ai;
        for _ in 0..k {
            v = bred_constant(v, 2, q, bp);
            v = cred(v, q);
        }
        *oi = v;
    }
}
