//! Rescaling (C5): dropping the last modulus of an RNS chain while
//! preserving the represented integer up to floor/round error, plus the
//! `Scaler` trait for basis-extension rescaling used by schemes that carry
//! a separate plaintext modulus `t`.
//!
//! The single-level primitive is the standard CRT rescale-by-last-modulus:
//! given `x`'s residues `{x_0, ..., x_{L-1}, x_L}`, and `v` a representative
//! of `x mod q_L` (taken as-is for floor, centered into `(-q_L/2, q_L/2]`
//! for round), `(x - v)/q_L` is an exact integer and its residues are
//! `(x_i - v) * q_L^{-1} mod q_i` for every remaining `i`.

use num_traits::ToPrimitive;

use crate::error::{Result, RingError};
use crate::ntt;
use crate::poly::Poly;
use crate::ring::RnsRing;
use crate::vector_ops;

/// Centers `v` (a residue mod `q`) into `(-q/2, q/2]`, returned as a value
/// already reduced mod every `qi` in `moduli_except_last` (i.e. `v mod qi`
/// if `v` is small, `qi - (q - v) mod qi` if `v` was negative after
/// centering).
fn centered_residue_mod(v: u64, q: u64, qi: u64) -> u64 {
    if v > q / 2 {
        // v - q is negative; add back qi until non-negative.
        let neg = q - v;
        let r = neg % qi;
        if r == 0 {
            0
        } else {
            qi - r
        }
    } else {
        v % qi
    }
}

/// Drops the top modulus of `p`, one level, writing `(p - v) / q_last` into
/// a polynomial at `p.level() - 1`. `round` selects floor vs. round
/// division by centering `v` before subtracting.
fn drop_last_modulus(ring: &RnsRing, p: &Poly, round: bool) -> Result<Poly> {
    let level = p.level();
    if level == 0 {
        return Err(RingError::LevelOverflow { level: 0, requested: 1 });
    }
    let q_last = ring.modulus(level).q;
    let n = p.degree();
    let mut out = Poly::zero_at_level(ring, level - 1);

    for i in 0..level {
        let qi = ring.modulus(i).q;
        let inv = crate::modular::mod_inverse_extgcd(q_last % qi, qi)
            .expect("modulus chain moduli are pairwise coprime");
        let bp = &ring.modulus(i).bred;
        let row_i = p.coeffs(i);
        let row_last = p.coeffs(level);
        let out_row = out.coeffs_mut(i);
        for j in 0..n {
            let v = if round {
                centered_residue_mod(row_last[j], q_last, qi)
            } else {
                row_last[j] % qi
            };
            let diff = if row_i[j] >= v { row_i[j] - v } else { row_i[j] + qi - v };
            out_row[j] = crate::modular::bred(diff, inv, qi, bp);
        }
    }
    Ok(out)
}

/// `DivFloorByLastModulus`: drops the top modulus, `floor` division.
pub fn div_floor_by_last_modulus(ring: &RnsRing, p: &Poly) -> Result<Poly> {
    drop_last_modulus(ring, p, false)
}

/// `DivRoundByLastModulus`: drops the top modulus, rounding to nearest.
pub fn div_round_by_last_modulus(ring: &RnsRing, p: &Poly) -> Result<Poly> {
    drop_last_modulus(ring, p, true)
}

/// Drops `levels` moduli in one call, repeatedly applying
/// [`div_floor_by_last_modulus`].
pub fn div_floor_by_last_modulus_many(ring: &RnsRing, p: &Poly, levels: usize) -> Result<Poly> {
    let mut cur = p.clone();
    for _ in 0..levels {
        cur = div_floor_by_last_modulus(ring, &cur)?;
    }
    Ok(cur)
}

/// Drops `levels` moduli in one call, repeatedly applying
/// [`div_round_by_last_modulus`].
pub fn div_round_by_last_modulus_many(ring: &RnsRing, p: &Poly, levels: usize) -> Result<Poly> {
    let mut cur = p.clone();
    for _ in 0..levels {
        cur = div_round_by_last_modulus(ring, &cur)?;
    }
    Ok(cur)
}

/// Drops the top modulus in NTT domain: every row of `p`, including the
/// dropped one, is already a Montgomery-form NTT-domain row (the layout
/// `RnsRing::ntt` produces). The dropped row is inverse-NTT'd back to plain
/// coefficients once, the resulting value is floored/centered mod each
/// surviving `q_i` exactly as in [`drop_last_modulus`], and that per-modulus
/// correction is then forward-NTT'd again so the subtract-and-scale step can
/// run pointwise in the surviving rows' own NTT domain.
fn drop_last_modulus_ntt(ring: &RnsRing, p: &Poly, round: bool) -> Result<Poly> {
    let level = p.level();
    if level == 0 {
        return Err(RingError::LevelOverflow { level: 0, requested: 1 });
    }
    let n = p.degree();
    let last = ring.modulus(level);
    let q_last = last.q;
    let last_mp = last.mred.as_ref().expect("NTT requires an odd modulus");
    let last_tables = last.ntt.as_ref().expect("modulus has no NTT tables");

    let mut top = p.coeffs(level).to_vec();
    ntt::backward(&mut top, last_tables, q_last, last_mp);
    let mut top_plain = vec![0u64; n];
    vector_ops::inv_m_form_vec(&top, q_last, last_mp, &mut top_plain);

    let mut out = Poly::zero_at_level(ring, level - 1);
    let mut v_plain = vec![0u64; n];
    let mut v_mont = vec![0u64; n];
    let mut diff = vec![0u64; n];
    for i in 0..level {
        let m = ring.modulus(i);
        let qi = m.q;
        let inv = crate::modular::mod_inverse_extgcd(q_last % qi, qi).expect("modulus chain moduli are pairwise coprime");
        let inv_mont = crate::modular::m_form(inv, qi, &m.bred);
        let mp = m.mred.as_ref().expect("NTT requires an odd modulus");
        let tables = m.ntt.as_ref().expect("modulus has no NTT tables");

        for j in 0..n {
            v_plain[j] = if round {
                centered_residue_mod(top_plain[j], q_last, qi)
            } else {
                top_plain[j] % qi
            };
        }
        vector_ops::m_form_vec(&v_plain, qi, &m.bred, &mut v_mont);
        ntt::forward(&mut v_mont, tables, qi, mp);

        vector_ops::sub_vec(p.coeffs(i), &v_mont, qi, &mut diff);
        vector_ops::mul_scalar_montgomery_vec(&diff, inv_mont, qi, mp, out.coeffs_mut(i));
    }
    Ok(out)
}

/// NTT-domain `DivFloorByLastModulus`.
pub fn div_floor_by_last_modulus_ntt(ring: &RnsRing, p: &Poly) -> Result<Poly> {
    drop_last_modulus_ntt(ring, p, false)
}

/// NTT-domain `DivRoundByLastModulus`.
pub fn div_round_by_last_modulus_ntt(ring: &RnsRing, p: &Poly) -> Result<Poly> {
    drop_last_modulus_ntt(ring, p, true)
}

/// Drops `levels` moduli in NTT domain, repeatedly applying
/// [`div_floor_by_last_modulus_ntt`].
pub fn div_floor_by_last_modulus_many_ntt(ring: &RnsRing, p: &Poly, levels: usize) -> Result<Poly> {
    let mut cur = p.clone();
    for _ in 0..levels {
        cur = div_floor_by_last_modulus_ntt(ring, &cur)?;
    }
    Ok(cur)
}

/// Drops `levels` moduli in NTT domain, repeatedly applying
/// [`div_round_by_last_modulus_ntt`].
pub fn div_round_by_last_modulus_many_ntt(ring: &RnsRing, p: &Poly, levels: usize) -> Result<Poly> {
    let mut cur = p.clone();
    for _ in 0..levels {
        cur = div_round_by_last_modulus_ntt(ring, &cur)?;
    }
    Ok(cur)
}

/// Common interface for rescaling a polynomial from one RNS basis to
/// another, exact-big-integer scale factor baked into the implementation.
pub trait Scaler {
    /// Rescales `p` (represented over `ring_in`) into `ring_out`'s basis.
    fn scale(&self, ring_in: &RnsRing, ring_out: &RnsRing, p: &Poly) -> Poly;
}

/// Independent oracle for [`RNSScaler`]: computes `round(t*x/Q) mod t` the
/// same way, but via a per-modulus integer/fractional decomposition instead
/// of an exact big-integer CRT reconstruction, so the two can be checked
/// against each other.
///
/// For `x` represented by residues `x_i mod q_i`, CRT reconstruction gives
/// `x = sum_i x_i * w_i * (Q/q_i) - v*Q` for some nonnegative integer `v`,
/// where `w_i = (Q/q_i)^{-1} mod q_i`. Multiplying by `t/Q`:
/// `t*x/Q = sum_i (x_i*w_i mod q_i) * (t/q_i) - v*t`. The `v*t` term vanishes
/// mod `t`, so only `sum_i y_i * (t/q_i)` (with `y_i = x_i*w_i mod q_i`)
/// needs rounding. Each `t/q_i` is split into an exact integer part
/// `floor(t/q_i)` (accumulated mod `t` with integer arithmetic) and a
/// fractional part (accumulated in a float, rounded once at the end via the
/// usual `+0.5` convention) so no arbitrary-precision accumulator is needed.
pub struct SimpleScaler {
    pub t: u64,
}

impl Scaler for SimpleScaler {
    fn scale(&self, ring_in: &RnsRing, ring_out: &RnsRing, p: &Poly) -> Poly {
        let level = p.level();
        let t = self.t;
        let n = p.degree();
        let q_total = ring_in.modulus_product_at_level(level);

        struct Row {
            q: u64,
            w: u64,
            int_part_mod_t: u64,
            frac: f64,
        }
        let rows: Vec<Row> = (0..=level)
            .map(|i| {
                let qi = ring_in.modulus(i).q;
                let qhat = &q_total / qi;
                let qhat_mod_qi = (&qhat % qi).to_u64().unwrap();
                let w = crate::modular::mod_inverse_extgcd(qhat_mod_qi, qi).expect("moduli are pairwise coprime");
                let int_part_mod_t = (t / qi) % t;
                let frac = (t % qi) as f64 / qi as f64;
                Row {
                    q: qi,
                    w,
                    int_part_mod_t,
                    frac,
                }
            })
            .collect();

        let reduce_mod_t = |v: u128| -> u64 {
            if t.is_power_of_two() {
                (v & (t as u128 - 1)) as u64
            } else {
                (v % t as u128) as u64
            }
        };

        let mut scaled = Vec::with_capacity(n);
        for j in 0..n {
            let mut int_acc: u128 = 0;
            let mut frac_acc: f64 = 0.0;
            for (i, row) in rows.iter().enumerate() {
                let xi = p.coeffs(i)[j];
                let bp = &ring_in.modulus(i).bred;
                let y = crate::modular::bred(xi, row.w, row.q, bp);
                int_acc += y as u128 * row.int_part_mod_t as u128;
                frac_acc += y as f64 * row.frac;
            }
            let int_mod_t = reduce_mod_t(int_acc);
            let carry = frac_acc.round() as i64;
            let total = (int_mod_t as i64 + carry).rem_euclid(t as i64) as u64;
            scaled.push(num_bigint::BigInt::from(total));
        }

        let mut out = Poly::zero(ring_out);
        out.set_coefficients_bigint(ring_out, &scaled);
        out
    }
}

/// Basis-extension rescale by an external modulus `t` (e.g. a BFV
/// plaintext modulus): reconstructs each coefficient's full-precision
/// value via CRT, computes `round(t * x / Q)`, and reduces mod `t`. Used
/// for the plaintext-scaling step of decrypt/decode rather than for RNS
/// level-dropping.
pub struct RNSScaler {
    pub t: u64,
}

impl Scaler for RNSScaler {
    fn scale(&self, ring_in: &RnsRing, ring_out: &RnsRing, p: &Poly) -> Poly {
        let q = ring_in.modulus_product_at_level(p.level());
        let t = num_bigint::BigUint::from(self.t);
        let values = p.to_bigint(ring_in);
        let scaled: Vec<num_bigint::BigInt> = values
            .iter()
            .map(|x| {
                let numer = x * &t;
                let doubled = &numer * 2u32;
                let rounded = (doubled + &q) / (&q * 2u32);
                num_bigint::BigInt::from(rounded % &t)
            })
            .collect();
        let mut out = Poly::zero(ring_out);
        out.set_coefficients_bigint(ring_out, &scaled);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_floor_matches_integer_division() {
        // Two small coprime moduli: q0=97, q1=193. Represent x=150: coeffs
        // [150 mod 97, 150 mod 193] = [53, 150]. floor(150/193) = 0, so the
        // result should be the zero polynomial over just q0.
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[150, 0, 0, 0]);
        let out = div_floor_by_last_modulus(&ring, &p).unwrap();
        assert_eq!(out.level(), 0);
        assert_eq!(out.coeffs(0)[0], 0);
    }

    #[test]
    fn div_round_matches_expected_nearest_integer() {
        // x = 300 over q0=97, q1=193: 300/193 rounds to 2 (300/193 ~= 1.55).
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[300, 0, 0, 0]);
        let out = div_round_by_last_modulus(&ring, &p).unwrap();
        assert_eq!(out.coeffs(0)[0] % 97, 2);
    }

    #[test]
    fn simple_scaler_matches_known_value() {
        // Q = 97*193 = 18721, x = 1234, t = 101: round(101*1234/18721) mod 101 = 7
        // (hand-verified via the CRT decomposition the scaler implements).
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let t_ring = RnsRing::builder().degree(4).moduli(vec![101]).allow_non_ntt(true).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[1234, 1234, 1234, 1234]);
        let out = SimpleScaler { t: 101 }.scale(&ring, &t_ring, &p);
        assert_eq!(out.coeffs(0), &[7, 7, 7, 7]);
    }

    #[test]
    fn simple_scaler_agrees_with_rns_scaler() {
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let t_ring = RnsRing::builder().degree(4).moduli(vec![101]).allow_non_ntt(true).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[1234, 5000, 18000, 42]);
        let simple = SimpleScaler { t: 101 }.scale(&ring, &t_ring, &p);
        let rns = RNSScaler { t: 101 }.scale(&ring, &t_ring, &p);
        assert_eq!(simple.coeffs(0), rns.coeffs(0));
    }

    #[test]
    fn div_floor_by_last_modulus_ntt_matches_coefficient_domain() {
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[150, 7, 42, 96]);

        let expect = div_floor_by_last_modulus(&ring, &p).unwrap();

        let bp0 = &ring.modulus(0).bred;
        let bp1 = &ring.modulus(1).bred;
        let mut p_ntt = p.clone();
        crate::vector_ops::m_form_vec(p.coeffs(0), 97, bp0, p_ntt.coeffs_mut(0));
        crate::vector_ops::m_form_vec(p.coeffs(1), 193, bp1, p_ntt.coeffs_mut(1));
        ring.ntt(&mut p_ntt);

        let out_ntt = div_floor_by_last_modulus_ntt(&ring, &p_ntt).unwrap();
        let mut out = out_ntt.clone();
        ring.intt(&mut out);
        let mp0 = ring.modulus(0).mred.as_ref().unwrap();
        let mut out_plain = Poly::zero_at_level(&ring, 0);
        crate::vector_ops::inv_m_form_vec(out.coeffs(0), 97, mp0, out_plain.coeffs_mut(0));

        assert_eq!(out_plain.coeffs(0), expect.coeffs(0));
    }
}
