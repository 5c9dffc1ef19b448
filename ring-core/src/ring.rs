//! `RnsRing` (C3): the validated, immutable context that every `Poly`
//! operation is performed against — degree `N`, the modulus chain
//! `{q_0, ..., q_{L-1}}`, and their precomputed Barrett/Montgomery/NTT
//! tables. Construction follows the builder pattern used for parameter
//! assembly elsewhere in the ecosystem (see DESIGN.md): fields are set
//! incrementally and validated once, at `build()`, rather than inside
//! a constructor that could be called with a half-valid state.

use num_bigint::BigUint;
use num_traits::One;

use crate::error::{Result, RingError};
use crate::modular::{self, generate_ntt_primes, is_prime, BarrettParams};
use crate::ntt;
use crate::params::{build_ntt_tables, ModulusPrecomp};
use crate::poly::Poly;
use crate::vector_ops;

/// Which cyclotomic this ring realizes: the standard power-of-two
/// negacyclic ring, or its conjugate-invariant (real) subring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    Standard,
    ConjugateInvariant,
}

impl RingKind {
    /// The congruence a modulus must satisfy to be eligible for this
    /// variant at all: `q = 1 mod 2N` for the standard ring, `q = 1 mod 4N`
    /// for the conjugate-invariant one. The stronger conjugate-invariant
    /// constraint is what embeds the N-coefficient sub-ring fixed by
    /// `X <-> X^{-1}` into the size-`2N` ring via `Y = X^2`; the actual NTT
    /// tables built from an eligible modulus always use a `2N`-th root
    /// (see [`RingBuilder::build`]), so the two variants share one kernel.
    pub fn root_order(&self, n: usize) -> u64 {
        match self {
            RingKind::Standard => 2 * n as u64,
            RingKind::ConjugateInvariant => 4 * n as u64,
        }
    }
}

/// A validated `Z_Q[X]/(X^N+1)` context, `Q = q_0 * q_1 * ... * q_{L-1}`.
#[derive(Debug, Clone)]
pub struct RnsRing {
    pub(crate) n: usize,
    pub(crate) kind: RingKind,
    pub(crate) moduli: Vec<ModulusPrecomp>,
}

impl RnsRing {
    pub fn builder() -> RingBuilder {
        RingBuilder::default()
    }

    pub fn degree(&self) -> usize {
        self.n
    }

    pub fn kind(&self) -> RingKind {
        self.kind
    }

    /// Number of moduli currently in the chain (the maximum level + 1).
    pub fn level_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn modulus(&self, level: usize) -> &ModulusPrecomp {
        &self.moduli[level]
    }

    pub fn moduli(&self) -> &[ModulusPrecomp] {
        &self.moduli
    }

    /// `true` iff every modulus up to `level` carries NTT tables.
    pub fn ntt_ready(&self, level: usize) -> bool {
        self.moduli[..=level].iter().all(ModulusPrecomp::is_ntt_ready)
    }

    /// `Q = prod(q_i)` over all moduli, as an exact big integer.
    pub fn modulus_product(&self) -> BigUint {
        self.moduli
            .iter()
            .fold(BigUint::one(), |acc, m| acc * BigUint::from(m.q))
    }

    /// `Q = prod(q_i)` restricted to the first `level + 1` moduli.
    pub fn modulus_product_at_level(&self, level: usize) -> BigUint {
        self.moduli[..=level]
            .iter()
            .fold(BigUint::one(), |acc, m| acc * BigUint::from(m.q))
    }

    /// Produces a new ring sharing this one's degree and variant but
    /// restricted to its first `level + 1` moduli. Used when a rescale
    /// permanently drops the top modulus of a chain.
    pub fn at_level(&self, level: usize) -> Result<RnsRing> {
        if level >= self.moduli.len() {
            return Err(RingError::LevelOverflow {
                level: self.moduli.len() - 1,
                requested: level + 1 - self.moduli.len(),
            });
        }
        Ok(RnsRing {
            n: self.n,
            kind: self.kind,
            moduli: self.moduli[..=level].to_vec(),
        })
    }

    /// Merges `self` with `other`, concatenating `other`'s moduli onto
    /// `self`'s chain. Both rings must share degree and variant.
    pub fn merge(&self, other: &RnsRing) -> Result<RnsRing> {
        if self.n != other.n {
            return Err(RingError::MergeMismatch {
                lhs: self.n,
                rhs: other.n,
            });
        }
        let mut moduli = self.moduli.clone();
        moduli.extend(other.moduli.iter().cloned());
        Ok(RnsRing {
            n: self.n,
            kind: self.kind,
            moduli,
        })
    }
}

/// Polynomial-level operations: the ring owns these rather than `Poly`
/// itself, since every one of them needs the modulus chain.
impl RnsRing {
    pub fn add(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for level in 0..=out.level() {
            let q = self.modulus(level).q;
            vector_ops::add_vec(a.coeffs(level), b.coeffs(level), q, out.coeffs_mut(level));
        }
    }

    pub fn sub(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for level in 0..=out.level() {
            let q = self.modulus(level).q;
            vector_ops::sub_vec(a.coeffs(level), b.coeffs(level), q, out.coeffs_mut(level));
        }
    }

    pub fn neg(&self, a: &Poly, out: &mut Poly) {
        for level in 0..=out.level() {
            let q = self.modulus(level).q;
            vector_ops::neg_vec(a.coeffs(level), q, out.coeffs_mut(level));
        }
    }

    /// Coefficient-wise Barrett multiplication (valid in either domain;
    /// callers use it in NTT domain for the convolution identity).
    pub fn mul_coeffs(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for level in 0..=out.level() {
            let m = self.modulus(level);
            vector_ops::mul_coeffs_vec(a.coeffs(level), b.coeffs(level), m.q, &m.bred, out.coeffs_mut(level));
        }
    }

    /// Same as [`RnsRing::mul_coeffs`] but both operands must already be in
    /// Montgomery form.
    pub fn mul_coeffs_montgomery(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for level in 0..=out.level() {
            let m = self.modulus(level);
            let mp = m.mred.as_ref().expect("Montgomery form requires an odd modulus");
            vector_ops::mul_coeffs_montgomery_vec(a.coeffs(level), b.coeffs(level), m.q, mp, out.coeffs_mut(level));
        }
    }

    /// `Equal`: reduces both operands into `[0, q)` first (a no-op for
    /// values already canonical), then compares byte-wise.
    pub fn equal(&self, a: &Poly, b: &Poly) -> bool {
        a.equal(b)
    }

    pub fn bit_reverse(&self, p: &mut Poly) {
        p.bit_reverse_in_place();
    }

    pub fn permute(&self, p: &Poly, gal_el: u64) -> Poly {
        p.permute(self, gal_el)
    }

    pub fn permute_ntt(&self, p: &Poly, gal_el: u64) -> Poly {
        let index = Poly::galois_ntt_index(self.n, gal_el);
        p.permute_ntt_with_index(&index)
    }

    pub fn permute_ntt_with_index(&self, p: &Poly, index: &[usize]) -> Poly {
        p.permute_ntt_with_index(index)
    }

    pub fn mult_by_monomial(&self, p: &Poly, deg: i64) -> Poly {
        p.mult_by_monomial(self, deg)
    }

    /// Forward NTT, in place, per RNS row up to `p.level()`.
    pub fn ntt(&self, p: &mut Poly) {
        for level in 0..=p.level() {
            let m = self.modulus(level);
            let tables = m.ntt.as_ref().expect("modulus has no NTT tables");
            let mp = m.mred.as_ref().expect("NTT requires an odd modulus");
            ntt::forward(p.coeffs_mut(level), tables, m.q, mp);
        }
    }

    /// Inverse NTT, in place, per RNS row up to `p.level()`.
    pub fn intt(&self, p: &mut Poly) {
        for level in 0..=p.level() {
            let m = self.modulus(level);
            let tables = m.ntt.as_ref().expect("modulus has no NTT tables");
            let mp = m.mred.as_ref().expect("NTT requires an odd modulus");
            ntt::backward(p.coeffs_mut(level), tables, m.q, mp);
        }
    }

    /// `MarshalBinary`: little-endian `(N as u64, level_count as u64,
    /// q_0, ..., q_{L-1})`. Only the ring's shape is encoded; callers
    /// rebuild polynomial contents separately.
    pub fn marshal_binary(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + 8 * self.moduli.len());
        out.extend_from_slice(&(self.n as u64).to_le_bytes());
        out.extend_from_slice(&(self.moduli.len() as u64).to_le_bytes());
        for m in &self.moduli {
            out.extend_from_slice(&m.q.to_le_bytes());
        }
        out
    }

    /// `UnmarshalBinary`: decodes the byte layout of [`RnsRing::marshal_binary`]
    /// and re-validates exactly as [`RingBuilder::build`] does.
    pub fn unmarshal_binary(bytes: &[u8]) -> Result<RnsRing> {
        if bytes.len() < 16 {
            return Err(RingError::InvalidDegree(0));
        }
        let n = u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize;
        let level_count = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let expected_len = 16 + 8 * level_count;
        if bytes.len() != expected_len {
            return Err(RingError::InvalidDegree(n));
        }
        let mut qs = Vec::with_capacity(level_count);
        for i in 0..level_count {
            let off = 16 + 8 * i;
            qs.push(u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap()));
        }
        RnsRing::builder().degree(n).moduli(qs).build()
    }
}

/// Incrementally assembles an [`RnsRing`], validating everything at
/// [`RingBuilder::build`].
#[derive(Debug, Clone)]
pub struct RingBuilder {
    n: Option<usize>,
    kind: RingKind,
    explicit_moduli: Option<Vec<u64>>,
    generate: Option<(usize, usize)>, // (log_q per modulus, count)
    allow_non_ntt: bool,
}

impl Default for RingBuilder {
    fn default() -> Self {
        RingBuilder {
            n: None,
            kind: RingKind::Standard,
            explicit_moduli: None,
            generate: None,
            allow_non_ntt: false,
        }
    }
}

impl RingBuilder {
    pub fn degree(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    pub fn kind(mut self, kind: RingKind) -> Self {
        self.kind = kind;
        self
    }

    /// Supplies the modulus chain explicitly; mutually exclusive with
    /// [`RingBuilder::generate_moduli`].
    pub fn moduli(mut self, qs: Vec<u64>) -> Self {
        self.explicit_moduli = Some(qs);
        self
    }

    /// Generates `count` NTT-friendly primes near `2^log_q` instead of
    /// taking an explicit chain.
    pub fn generate_moduli(mut self, log_q: usize, count: usize) -> Self {
        self.generate = Some((log_q, count));
        self
    }

    /// Opts into building the ring even when a modulus fails the NTT
    /// eligibility check, degrading that level to arithmetic-only instead
    /// of failing `build()` with `UnsupportedModulus`. Off by default: a
    /// caller who didn't ask for this should be told their modulus lost
    /// NTT support, not have it happen silently.
    pub fn allow_non_ntt(mut self, allow: bool) -> Self {
        self.allow_non_ntt = allow;
        self
    }

    pub fn build(self) -> Result<RnsRing> {
        let n = self.n.ok_or(RingError::InvalidDegree(0))?;
        if !n.is_power_of_two() || n == 0 {
            return Err(RingError::InvalidDegree(n));
        }
        let root_order = self.kind.root_order(n);
        // The NTT kernel itself always runs a size-n transform, so its
        // tables need a 2n-th order root regardless of ring kind; only
        // modulus *eligibility* (root_order above) differs by kind.
        let table_root_order = 2 * n as u64;

        let qs = match (self.explicit_moduli, self.generate) {
            (Some(qs), _) => qs,
            (None, Some((log_q, count))) => generate_ntt_primes(log_q, root_order, count)?,
            (None, None) => return Err(RingError::NotEnoughPrimes { log_q: 0 }),
        };

        let mut moduli = Vec::with_capacity(qs.len());
        for &q in &qs {
            let mut precomp = ModulusPrecomp::new_arithmetic_only(q);
            if is_prime(q) && q % root_order == 1 {
                let psi = find_primitive_root(q, table_root_order);
                let bred = BarrettParams::new(q);
                precomp.ntt = Some(build_ntt_tables(q, n, psi, &bred));
            } else if !self.allow_non_ntt {
                return Err(RingError::UnsupportedModulus { modulus: q, root_order });
            } else {
                tracing::warn!(modulus = q, root_order, "modulus is not NTT-friendly, building arithmetic-only level");
            }
            moduli.push(precomp);
        }

        tracing::debug!(n, levels = moduli.len(), root_order, "built RNS ring");
        Ok(RnsRing { n, kind: self.kind, moduli })
    }
}

/// Finds a primitive `order`-th root of unity mod `q` by checking small
/// generators; `q - 1` is divisible by `order` whenever this is called
/// (callers only invoke it once `q % order == 1` has been confirmed).
fn find_primitive_root(q: u64, order: u64) -> u64 {
    let exponent = (q - 1) / order;
    let mut g = 2u64;
    loop {
        let candidate = modular::mod_exp(g, exponent, q);
        if modular::mod_exp(candidate, order, q) == 1 && modular::mod_exp(candidate, order / 2, q) != 1 {
            return candidate;
        }
        g += 1;
    }
}
