use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use ring_core::modular::{inv_m_form, m_form, BarrettParams};
use ring_core::poly::Poly;
use ring_core::rescale::div_round_by_last_modulus;
use ring_core::ring::{RingKind, RnsRing};
use ring_core::sampling::{GaussianSampler, TernarySampler};

fn main() {
    tracing_subscriber::fmt::init();

    println!("RNS polynomial engine demo");
    println!("==========================");

    // Build a 3-limb RNS ring over N=4096, standard negacyclic variant.
    let ring = RnsRing::builder()
        .degree(4096)
        .kind(RingKind::Standard)
        .generate_moduli(50, 3)
        .build()
        .expect("ring construction");
    println!("Built ring: N={}, levels={}", ring.degree(), ring.level_count());

    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);

    // Sample a ternary secret and a Gaussian error, both at the top level.
    let s = TernarySampler::sample_sparse(&ring, ring.level_count() - 1, 64, &mut rng);
    let e = GaussianSampler::sample(&ring, ring.level_count() - 1, 3.2, 19, &mut rng);
    println!("Sampled ternary secret (hamming weight 64) and discrete-Gaussian error");

    // NTT-domain multiply: s * e, coefficient domain in, NTT domain
    // intermediate, coefficient domain out.
    let top = ring.level_count() - 1;
    let q0 = ring.modulus(0).q;
    let bp0 = BarrettParams::new(q0);

    let mut s_mont = s.clone();
    let mut e_mont = e.clone();
    for level in 0..=top {
        let m = ring.modulus(level);
        ring_core::vector_ops::m_form_vec(s.coeffs(level), m.q, &m.bred, s_mont.coeffs_mut(level));
        ring_core::vector_ops::m_form_vec(e.coeffs(level), m.q, &m.bred, e_mont.coeffs_mut(level));
    }
    ring.ntt(&mut s_mont);
    ring.ntt(&mut e_mont);
    let mut product = Poly::zero(&ring);
    ring.mul_coeffs_montgomery(&s_mont, &e_mont, &mut product);
    ring.intt(&mut product);
    for level in 0..=top {
        let m = ring.modulus(level);
        let mp = m.mred.as_ref().unwrap();
        let row: Vec<u64> = product.coeffs(level).to_vec();
        ring_core::vector_ops::inv_m_form_vec(&row, m.q, mp, product.coeffs_mut(level));
    }
    println!("Computed s*e via NTT-domain pointwise multiplication");

    // Rescale by dropping the last modulus.
    let rescaled = div_round_by_last_modulus(&ring, &product).expect("rescale");
    println!("Rescaled from {} levels down to {} levels", ring.level_count(), rescaled.level() + 1);

    // Round-trip a small polynomial through Montgomery form for a sanity check.
    let x = 12345u64 % q0;
    let mont = m_form(x, q0, &bp0);
    let mp0 = ring.modulus(0).mred.as_ref().unwrap();
    let back = inv_m_form(mont, q0, mp0);
    assert_eq!(back, x);
    println!("Montgomery round-trip check passed for x={x}");
}
