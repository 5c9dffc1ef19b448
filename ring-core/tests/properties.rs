//! Integration tests: numbered correctness properties and end-to-end
//! scenarios (S1-S6), exercised through the public `ring_core` API rather
//! than any module's internals.

use num_bigint::BigInt;
use proptest::prelude::*;

use ring_core::modular::{m_form, BarrettParams};
use ring_core::poly::Poly;
use ring_core::prng::KeyedPrng;
use ring_core::rescale::{div_round_by_last_modulus, div_round_by_last_modulus_many, RNSScaler, Scaler, SimpleScaler};
use ring_core::ring::RnsRing;
use ring_core::sampling::{GaussianSampler, TernarySampler};

fn centered_modsub(v: i64, q: u64) -> i64 {
    ((v % q as i64) + q as i64) % q as i64
}

// --- S1: N=8, single 58-bit prime, NTT round-trip + monomial shift. ---
#[test]
fn scenario_s1_roundtrip_and_monomial_shift() {
    let q = 0x3ffffffff000001u64;
    let ring = RnsRing::builder().degree(8).moduli(vec![q]).build().unwrap();
    assert!(ring.ntt_ready(0));

    let coeffs = [1u64, 2, 3, 4, 5, 6, 7, 8];
    let mut p = Poly::zero(&ring);
    p.set_coefficients_uint64(&coeffs);

    let bp = BarrettParams::new(q);
    let mut mont = p.clone();
    ring_core::vector_ops::m_form_vec(p.coeffs(0), q, &bp, mont.coeffs_mut(0));
    ring.ntt(&mut mont);
    ring.intt(&mut mont);
    let mp = ring.modulus(0).mred.as_ref().unwrap();
    let mut back = Poly::zero(&ring);
    ring_core::vector_ops::inv_m_form_vec(mont.coeffs(0), q, mp, back.coeffs_mut(0));
    assert_eq!(back.coeffs(0), &coeffs);

    // Multiplying by the monomial X: [q-8,1,2,3,4,5,6,7].
    let shifted = ring.mult_by_monomial(&p, 1);
    let mut expect = vec![q - 8, 1, 2, 3, 4, 5, 6, 7];
    expect[0] = q - 8;
    assert_eq!(shifted.coeffs(0), expect.as_slice());
}

// --- S2: N=4, q=97, psi=28; covered in params.rs unit tests directly; here
// we additionally confirm the ring built from q=97 exposes matching tables. ---
#[test]
fn scenario_s2_ring_exposes_matching_psi_table() {
    let q = 97u64;
    let ring = RnsRing::builder().degree(4).moduli(vec![q]).build().unwrap();
    let bp = BarrettParams::new(q);
    let tables = ring.modulus(0).ntt.as_ref().unwrap();
    assert_eq!(tables.psi_pow[0], m_form(1, q, &bp));
}

// --- S3: RNSScaler vs SimpleScaler agreement. ---
#[test]
fn scenario_s3_scalers_agree() {
    let t = 65537u64;
    let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
    let t_ring = RnsRing::builder().degree(4).moduli(vec![t]).allow_non_ntt(true).build().unwrap();
    let q_total = ring.modulus_product();

    let values: Vec<BigInt> = vec![
        BigInt::from(0),
        BigInt::from(&q_total / 4u32),
        BigInt::from(&q_total / 2u32),
        BigInt::from(&q_total * 3u32 / 4u32),
    ];
    let mut p = Poly::zero(&ring);
    p.set_coefficients_bigint(&ring, &values);

    let rns_scaler = RNSScaler { t };
    let simple_scaler = SimpleScaler { t };
    let a = rns_scaler.scale(&ring, &t_ring, &p);
    let b = simple_scaler.scale(&ring, &t_ring, &p);
    assert_eq!(a.level(), 0);
    // x=0 scales to 0 regardless of rounding direction.
    assert_eq!(a.to_bigint(&t_ring)[0], BigInt::from(0).to_biguint().unwrap());
    // RNSScaler (exact CRT) and SimpleScaler (per-modulus float oracle)
    // must agree element-wise for the same (t, Q).
    assert_eq!(a.coeffs(0), b.coeffs(0));
}

// --- S4: deterministic PRNG -> deterministic ternary + Gaussian polys. ---
#[test]
fn scenario_s4_deterministic_prng_reproduces_polynomials() {
    let ring = RnsRing::builder().degree(16).moduli(vec![97]).build().unwrap();
    let seed = [0u8; 32];
    let mut seed_val = seed;
    seed_val[31] = 1;

    let mut prng_a = KeyedPrng::new_keyed(seed_val, b"");
    let mut prng_b = KeyedPrng::new_keyed(seed_val, b"");

    let ternary_a = TernarySampler::sample(&ring, 0, 2.0 / 3.0, &mut prng_a);
    let gaussian_a = GaussianSampler::sample(&ring, 0, 3.2, 19, &mut prng_a);
    let ternary_b = TernarySampler::sample(&ring, 0, 2.0 / 3.0, &mut prng_b);
    let gaussian_b = GaussianSampler::sample(&ring, 0, 3.2, 19, &mut prng_b);

    assert_eq!(ternary_a, ternary_b);
    assert_eq!(gaussian_a, gaussian_b);
}

// --- S5: dropping two levels preserves a small constant's value. ---
#[test]
fn scenario_s5_div_round_many_preserves_small_constant() {
    let ring = RnsRing::builder().degree(4).moduli(vec![97, 193, 257]).build().unwrap();
    let mut p = Poly::zero(&ring);
    p.set_coefficients_uint64(&[5, 5, 5, 5]);
    let out = div_round_by_last_modulus_many(&ring, &p, 2).unwrap();
    assert_eq!(out.level(), 0);
    assert_eq!(out.coeffs(0), &[5, 5, 5, 5]);
}

// --- S6: Permute(p, 5) matches p(X^5) mod (X^N+1) with sign flips. ---
#[test]
fn scenario_s6_permute_matches_substitution_with_sign_flip() {
    let ring = RnsRing::builder().degree(8).moduli(vec![97]).build().unwrap();
    let mut p = Poly::zero(&ring);
    // p = X + 2X^2 + ... + 7X^7 (coefficient of X^0 is 0).
    p.set_coefficients_uint64(&[0, 1, 2, 3, 4, 5, 6, 7]);

    let permuted = ring.permute(&p, 5);

    let n = 8i64;
    let mut expect = vec![0i64; 8];
    for exp in 0..8i64 {
        let coeff = p.coeffs(0)[exp as usize] as i64;
        if coeff == 0 {
            continue;
        }
        let new_exp_raw = exp * 5;
        let folds = new_exp_raw / n;
        let new_exp = (new_exp_raw % n) as usize;
        let sign = if folds % 2 == 1 { -1 } else { 1 };
        expect[new_exp] += sign * coeff;
    }
    let q = 97i64;
    let expect_mod: Vec<u64> = expect.iter().map(|&v| centered_modsub(v, q as u64) as u64).collect();
    assert_eq!(permuted.coeffs(0), expect_mod.as_slice());
}

// --- Property 3: NTT round-trip. ---
proptest! {
    #[test]
    fn prop_ntt_roundtrip(coeffs in proptest::collection::vec(0u64..97, 4)) {
        let q = 97u64;
        let ring = RnsRing::builder().degree(4).moduli(vec![q]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&coeffs);

        let bp = BarrettParams::new(q);
        let mut mont = p.clone();
        ring_core::vector_ops::m_form_vec(p.coeffs(0), q, &bp, mont.coeffs_mut(0));
        ring.ntt(&mut mont);
        ring.intt(&mut mont);
        let mp = ring.modulus(0).mred.as_ref().unwrap();
        let mut back = Poly::zero(&ring);
        ring_core::vector_ops::inv_m_form_vec(mont.coeffs(0), q, mp, back.coeffs_mut(0));
        prop_assert_eq!(back.coeffs(0), p.coeffs(0));
    }
}

// --- Property 5: Montgomery round-trip. ---
proptest! {
    #[test]
    fn prop_montgomery_roundtrip(x in 0u64..97) {
        let q = 97u64;
        let bp = BarrettParams::new(q);
        let mp = ring_core::modular::MontgomeryParams::new(q);
        let mont = m_form(x, q, &bp);
        let back = ring_core::modular::inv_m_form(mont, q, &mp);
        prop_assert_eq!(back, x);
    }
}

// --- Property 6: CRT round-trip. ---
proptest! {
    #[test]
    fn prop_crt_roundtrip(a in 0u64..97, b in 0u64..193, c in 0u64..97, d in 0u64..193) {
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[a, b, c, d]);
        let big = p.to_bigint(&ring);
        let mut back = Poly::zero(&ring);
        let big_signed: Vec<BigInt> = big.iter().map(|v| BigInt::from(v.clone())).collect();
        back.set_coefficients_bigint(&ring, &big_signed);
        prop_assert_eq!(back.coeffs(0), p.coeffs(0));
        prop_assert_eq!(back.coeffs(1), p.coeffs(1));
    }
}

// --- Property 8: rescale contract against big-integer round(). ---
proptest! {
    #[test]
    fn prop_rescale_matches_bigint_round(raw in 0u64..(97u64 * 193 * 257)) {
        let ring = RnsRing::builder().degree(4).moduli(vec![97, 193, 257]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&[raw, 0, 0, 0]);
        let out = div_round_by_last_modulus(&ring, &p).unwrap();

        let q_last = 257u64;
        let expect = ((raw as f64) / (q_last as f64)).round() as u64;
        prop_assert_eq!(out.coeffs(0)[0] % 97, expect % 97);
        prop_assert_eq!(out.coeffs(1)[0] % 193, expect % 193);
    }
}

// --- Property 10: Galois involution. ---
proptest! {
    #[test]
    fn prop_galois_involution(coeffs in proptest::collection::vec(0u64..97, 8)) {
        let ring = RnsRing::builder().degree(8).moduli(vec![97]).build().unwrap();
        let mut p = Poly::zero(&ring);
        p.set_coefficients_uint64(&coeffs);

        let g = 5u64;
        let two_n = 16u64;
        let g_inv = ring_core::modular::mod_inverse_extgcd(g, two_n).unwrap();

        let once = ring.permute(&p, g);
        let twice = ring.permute(&once, g_inv);
        prop_assert_eq!(twice.coeffs(0), p.coeffs(0));
    }
}

// --- Property 9: sampler determinism, seed-driven. ---
#[test]
fn prop_sampler_determinism_across_fresh_prngs() {
    let ring = RnsRing::builder().degree(8).moduli(vec![97]).build().unwrap();
    for seed_byte in 0u8..5 {
        let mut a = KeyedPrng::new_keyed([seed_byte; 32], b"s");
        let mut b = KeyedPrng::new_keyed([seed_byte; 32], b"s");
        let pa = TernarySampler::sample(&ring, 0, 0.5, &mut a);
        let pb = TernarySampler::sample(&ring, 0, 0.5, &mut b);
        assert_eq!(pa, pb);
    }
}

