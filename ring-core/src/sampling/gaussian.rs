//! Discrete Gaussian sampler: a port of the classical Marsaglia-Tsang
//! Ziggurat algorithm for the standard normal distribution (the usual
//! `kn`/`wn`/`fn` table shape and `rn` tail-start constant), scaled by
//! `sigma`, rounded to the nearest integer, and rejected past a truncation
//! `bound`. The tables are built once, at first use, by the same
//! construction routine the reference Ziggurat implementations run at
//! `init()` time rather than a hand-transcribed 128-entry literal, and are
//! immutable after that.

use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use rand::RngCore;

use crate::poly::Poly;
use crate::ring::RnsRing;

/// Tail cutoff: the Ziggurat's base strip starts at this x.
const RN: f64 = 3.442619855899;
/// Common rectangle area, shared by every layer including the tail strip.
const VN: f64 = 9.91256303526217e-3;
const LAYERS: usize = 128;
const M1: f64 = 4294967296.0; // 2^32

struct ZigguratTables {
    kn: [u32; LAYERS],
    wn: [f64; LAYERS],
    fn_: [f64; LAYERS],
}

static TABLES: OnceLock<ZigguratTables> = OnceLock::new();

fn tables() -> &'static ZigguratTables {
    TABLES.get_or_init(|| {
        let mut kn = [0u32; LAYERS];
        let mut wn = [0f64; LAYERS];
        let mut fn_ = [0f64; LAYERS];

        let mut dn = RN;
        let mut tn = RN;
        let q = VN / (-0.5 * dn * dn).exp();

        kn[0] = ((dn / q) * M1) as u32;
        kn[1] = 0;
        wn[0] = q / M1;
        wn[LAYERS - 1] = dn / M1;
        fn_[0] = 1.0;
        fn_[LAYERS - 1] = (-0.5 * dn * dn).exp();

        for i in (1..LAYERS - 1).rev() {
            dn = (-2.0 * (VN / dn + (-0.5 * dn * dn).exp()).ln()).sqrt();
            kn[i + 1] = ((dn / tn) * M1) as u32;
            tn = dn;
            fn_[i] = (-0.5 * dn * dn).exp();
            wn[i] = dn / M1;
        }

        ZigguratTables { kn, wn, fn_ }
    })
}

fn uniform_open01<R: RngCore>(rng: &mut R) -> f64 {
    // 53 bits of mantissa precision, strictly inside (0, 1).
    let bits = rng.next_u64() >> 11;
    ((bits as f64) + 0.5) / (1u64 << 53) as f64
}

/// One draw from the standard normal distribution via Ziggurat.
fn standard_normal<R: RngCore>(rng: &mut R) -> f64 {
    let t = tables();
    loop {
        let j = rng.next_u32() as i32;
        let i = (j & 0x7f) as usize;
        let x = j as f64 * t.wn[i];

        if (j as i64).unsigned_abs() < t.kn[i] as u64 {
            return x;
        }

        if i == 0 {
            // Tail strip: sample from the exponential tail past RN.
            loop {
                let e1 = -(uniform_open01(rng)).ln() / RN;
                let e2 = -(uniform_open01(rng)).ln();
                if e2 + e2 >= e1 * e1 {
                    return if j > 0 { RN + e1 } else { -RN - e1 };
                }
            }
        }

        let threshold = t.fn_[i] + uniform_open01(rng) * (t.fn_[i - 1] - t.fn_[i]);
        if threshold < (-0.5 * x * x).exp() {
            return x;
        }
    }
}

pub struct GaussianSampler;

impl GaussianSampler {
    /// Draws `N` truncated-discrete-Gaussian coefficients (`sigma`,
    /// `bound`) and reduces each one (signed) into every RNS row.
    pub fn sample<R: RngCore>(ring: &RnsRing, level: usize, sigma: f64, bound: i64, rng: &mut R) -> Poly {
        let n = ring.degree();
        let values: Vec<i64> = (0..n).map(|_| Self::sample_one(sigma, bound, rng)).collect();
        let mut poly = Poly::zero_at_level(ring, level);
        for i in 0..=level {
            let q = ring.modulus(i).q;
            let row = poly.coeffs_mut(i);
            for (slot, &v) in row.iter_mut().zip(&values) {
                *slot = if v >= 0 {
                    v as u64 % q
                } else {
                    (q - ((-v) as u64 % q)) % q
                };
            }
        }
        poly
    }

    fn sample_one<R: RngCore>(sigma: f64, bound: i64, rng: &mut R) -> i64 {
        loop {
            let z = standard_normal(rng) * sigma;
            let rounded = z.round() as i64;
            if rounded.abs() <= bound {
                return rounded;
            }
        }
    }

    /// Big-integer overflow path for `sigma > 2^53` or `bound > 2^64`:
    /// samples a standard-normal magnitude (`sigma=1`), scales it by the
    /// arbitrary-precision `sigma`, and fills the bits below the f64's
    /// precision with fresh randomness rather than leaving them zero.
    pub fn sample_big<R: RngCore>(ring: &RnsRing, level: usize, sigma: &BigUint, bound: &BigUint, rng: &mut R) -> Poly {
        let n = ring.degree();
        let values: Vec<BigInt> = (0..n).map(|_| Self::sample_one_big(sigma, bound, rng)).collect();
        let mut poly = Poly::zero_at_level(ring, level);
        poly.set_coefficients_bigint(ring, &values);
        poly
    }

    fn sample_one_big<R: RngCore>(sigma: &BigUint, bound: &BigUint, rng: &mut R) -> BigInt {
        loop {
            let z = standard_normal(rng);
            let negative = z.is_sign_negative();
            let integer_part = z.abs().floor() as u64;
            let fill = rng.next_u64();
            let sigma_u64 = sigma.to_u64().unwrap_or(u64::MAX).max(1);
            let magnitude = BigUint::from(integer_part) * sigma + BigUint::from(fill % sigma_u64);
            if &magnitude <= bound {
                let signed = BigInt::from(magnitude);
                return if negative { -signed } else { signed };
            }
        }
    }
}
