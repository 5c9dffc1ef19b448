//! Modular-arithmetic primitives (Barrett, Montgomery, exponentiation,
//! inversion, primality, prime generation) for a 64-bit modulus `q` with
//! `1 < q < 2^62`. Every reduction here assumes 128-bit intermediate
//! products fit without overflow, matching the source library's register
//! model.

use crate::error::{Result, RingError};

/// Precomputed Barrett constant `floor(2^128 / q)`, split into its two
/// 64-bit words (high, low) as used by `BRed`/`BRedConstant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrettParams {
    pub hi: u64,
    pub lo: u64,
}

impl BarrettParams {
    pub fn new(q: u64) -> Self {
        // floor(2^128/q): q is odd (primes > 2), so q never divides 2^128
        // exactly and floor((2^128-1)/q) + 1 == floor(2^128/q).
        let bp = (u128::MAX / q as u128) + 1;
        BarrettParams {
            hi: (bp >> 64) as u64,
            lo: bp as u64,
        }
    }
}

/// Montgomery constant `-q^{-1} mod 2^64`. Undefined (panics) if `q` is even.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontgomeryParams {
    pub q_inv_neg: u64,
}

impl MontgomeryParams {
    pub fn new(q: u64) -> Self {
        assert!(q & 1 == 1, "Montgomery form requires an odd modulus");
        // Newton's iteration for the 2-adic inverse of q mod 2^64.
        let mut inv: u64 = q; // correct mod 2^3
        for _ in 0..5 {
            inv = inv.wrapping_mul(2u64.wrapping_sub(q.wrapping_mul(inv)));
        }
        debug_assert_eq!(q.wrapping_mul(inv), 1);
        MontgomeryParams {
            q_inv_neg: inv.wrapping_neg(),
        }
    }
}

/// Barrett-reduces `x*y mod q`, result in `[0, q)`.
#[inline]
pub fn bred(x: u64, y: u64, q: u64, bp: &BarrettParams) -> u64 {
    cred(bred_constant(x, y, q, bp), q)
}

/// Same schedule as [`bred`] but leaves the result in `[0, 2q)`, used inside
/// NTT inner loops.
#[inline]
pub fn bred_constant(x: u64, y: u64, q: u64, bp: &BarrettParams) -> u64 {
    let prod = x as u128 * y as u128;
    let bp128 = ((bp.hi as u128) << 64) | bp.lo as u128;
    // quotient estimate: (prod * bp) >> 128, via the high word of the 256-bit product.
    let quot = mulhi_256(prod, bp128);
    let r = prod.wrapping_sub(quot.wrapping_mul(q as u128));
    r as u64
}

/// High 128 bits of the 256-bit product `a * b` where both operands are
/// u128 (used only for the Barrett quotient estimate, where `a < q^2 < 2^124`
/// and `b < 2^128`, so the result fits in a u128).
fn mulhi_256(a: u128, b: u128) -> u128 {
    let a_hi = a >> 64;
    let a_lo = a & 0xFFFF_FFFF_FFFF_FFFF;
    let b_hi = b >> 64;
    let b_lo = b & 0xFFFF_FFFF_FFFF_FFFF;

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    let mid = (lo_lo >> 64) + (hi_lo & 0xFFFF_FFFF_FFFF_FFFF) + (lo_hi & 0xFFFF_FFFF_FFFF_FFFF);
    hi_hi + (hi_lo >> 64) + (lo_hi >> 64) + (mid >> 64)
}

/// Single-operand reduction of `x` into `[0, q)`.
#[inline]
pub fn bred_add(x: u64, q: u64, bp: &BarrettParams) -> u64 {
    bred(x, 1, q, bp)
}

/// Conditional-subtraction reduction of `a in [0, 2q)` to `[0, q)`.
#[inline]
pub fn cred(a: u64, q: u64) -> u64 {
    if a >= q {
        a - q
    } else {
        a
    }
}

/// Converts `x` to Montgomery form: `x * 2^64 mod q`.
#[inline]
pub fn m_form(x: u64, q: u64, bp: &BarrettParams) -> u64 {
    // x * 2^64 mod q via Barrett on (x, 2^64 mod q) would need 2^64 mod q;
    // computed directly via 128-bit shift-reduce instead.
    let shifted = (x as u128) << 64;
    (shifted % q as u128) as u64
}

/// Inverse of [`m_form`]: recovers `x` from its Montgomery representative.
#[inline]
pub fn inv_m_form(x: u64, q: u64, mp: &MontgomeryParams) -> u64 {
    m_red(x, 1, q, mp)
}

/// Montgomery multiplication: for `x, y` already in Montgomery form (in
/// `[0, q)`), returns `x*y*2^{-64} mod q`, result in `[0, q)`.
#[inline]
pub fn m_red(x: u64, y: u64, q: u64, mp: &MontgomeryParams) -> u64 {
    cred(m_red_constant(x, y, q, mp), q)
}

/// Same schedule as [`m_red`] but leaves the result in `[0, 2q)`, used
/// inside NTT butterflies.
#[inline]
pub fn m_red_constant(x: u64, y: u64, q: u64, mp: &MontgomeryParams) -> u64 {
    let t = x as u128 * y as u128;
    let m = (t as u64).wrapping_mul(mp.q_inv_neg);
    let mq = m as u128 * q as u128;
    let sum = t + mq;
    (sum >> 64) as u64
}

/// Right-to-left square-and-multiply modular exponentiation on plain
/// (non-Montgomery) residues.
pub fn mod_exp(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let bp = BarrettParams::new(q);
    let mut result = 1u64 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            result = bred(result, base, q, &bp);
        }
        base = bred(base, base, q, &bp);
        exp >>= 1;
    }
    result
}

/// Modular exponentiation operating entirely in Montgomery domain: `base`
/// and the result are Montgomery representatives.
pub fn mod_exp_montgomery(base_mont: u64, mut exp: u64, q: u64, mp: &MontgomeryParams, bp: &BarrettParams) -> u64 {
    let mut result = m_form(1, q, bp);
    let mut base = base_mont;
    while exp > 0 {
        if exp & 1 == 1 {
            result = m_red(result, base, q, mp);
        }
        base = m_red(base, base, q, mp);
        exp >>= 1;
    }
    result
}

/// Modular inverse via Fermat's little theorem (`x^{q-2} mod q`); requires
/// `q` prime. Returns `None` for `x == 0`.
pub fn mod_inverse_fermat(x: u64, q: u64) -> Option<u64> {
    if x % q == 0 {
        return None;
    }
    Some(mod_exp(x, q - 2, q))
}

/// Modular inverse via the extended Euclidean algorithm, valid for any
/// modulus (not only primes). Returns `None` if `gcd(x, m) != 1`.
pub fn mod_inverse_extgcd(x: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (x as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        let tmp_r = old_r - quotient * r;
        old_r = r;
        r = tmp_r;
        let tmp_s = old_s - quotient * s;
        old_s = s;
        s = tmp_s;
    }
    if old_r != 1 {
        return None;
    }
    let m_i = m as i128;
    Some((((old_s % m_i) + m_i) % m_i) as u64)
}

/// Deterministic Miller-Rabin primality test, exact for all `u64` using the
/// witness set `{2,3,5,7,11,13,17,19,23,29,31,37}` (sufficient up to
/// 3,317,044,064,679,887,385,961,981, well beyond `2^64`): an exact
/// primality oracle for moduli in this engine's range.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in [2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    let mut d = n - 1;
    let mut r = 0u32;
    while d & 1 == 0 {
        d >>= 1;
        r += 1;
    }
    'witness: for a in [2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        let mut x = mod_exp(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 0..r - 1 {
            x = mod_exp(x, 2, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Enumerates primes `q` congruent to `1 mod nth_root` near `2^log_q`,
/// alternating one candidate above and one below the power of two (only
/// downward once `log_q` is the 61-bit ceiling), until `n` have been found.
pub fn generate_ntt_primes(log_q: usize, nth_root: u64, n: usize) -> Result<Vec<u64>> {
    let mut primes = Vec::with_capacity(n);
    let base = 1u64 << log_q;
    let mut up = base;
    let mut down = base;
    let only_down = log_q >= 61;
    loop {
        if !only_down {
            if let Some(p) = next_candidate_up(up, nth_root) {
                up = p;
                if is_prime(up) && !primes.contains(&up) {
                    primes.push(up);
                    if primes.len() == n {
                        break;
                    }
                }
                up += nth_root;
            }
        }
        match next_candidate_down(down, nth_root) {
            Some(p) if p > nth_root => {
                down = p;
                if is_prime(down) && !primes.contains(&down) {
                    primes.push(down);
                    if primes.len() == n {
                        break;
                    }
                }
                down = down.saturating_sub(nth_root);
            }
            _ => {
                if only_down {
                    return Err(RingError::NotEnoughPrimes { log_q });
                }
            }
        }
        if up > (1u64 << 62) && down < nth_root {
            return Err(RingError::NotEnoughPrimes { log_q });
        }
    }
    Ok(primes)
}

fn next_candidate_up(from: u64, nth_root: u64) -> Option<u64> {
    let rem = from % nth_root;
    let delta = if rem == 1 { nth_root } else { (nth_root + 1 - rem) % nth_root };
    from.checked_add(delta)
}

fn next_candidate_down(from: u64, nth_root: u64) -> Option<u64> {
    let rem = from % nth_root;
    let delta = if rem == 1 { 0 } else { (rem + nth_root - 1) % nth_root };
    from.checked_sub(delta)
}

/// Smallest NTT-friendly prime `>= from` congruent to `1 mod nth_root`.
pub fn next_ntt_prime(from: u64, nth_root: u64) -> Result<u64> {
    let mut cand = from + ((nth_root - from % nth_root) % nth_root);
    if cand < from {
        cand += nth_root;
    }
    let mut cand = if cand % nth_root != 1 {
        cand - (cand % nth_root) + 1
    } else {
        cand
    };
    loop {
        if cand >= from && is_prime(cand) {
            return Ok(cand);
        }
        cand += nth_root;
        if cand > (1u64 << 62) {
            return Err(RingError::NotEnoughPrimes { log_q: 62 });
        }
    }
}

/// Largest NTT-friendly prime `<= from` congruent to `1 mod nth_root`.
/// Fails with `BelowRoot` once the search would drop under `nth_root`.
pub fn previous_ntt_prime(from: u64, nth_root: u64) -> Result<u64> {
    let mut cand = from - (from % nth_root) + 1;
    if cand > from {
        cand = cand.saturating_sub(nth_root);
    }
    loop {
        if cand < nth_root {
            return Err(RingError::BelowRoot {
                candidate: cand,
                root_order: nth_root,
            });
        }
        if is_prime(cand) {
            return Ok(cand);
        }
        cand = cand.saturating_sub(nth_root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrett_matches_naive_mulmod() {
        let q = 0x3ffffffff000001u64; // 58-bit NTT-friendly prime, see spec scenario S1
        let bp = BarrettParams::new(q);
        for (x, y) in [(1u64, 1u64), (q - 1, q - 1), (12345, 67890), (q / 2, 3)] {
            let expect = ((x as u128 * y as u128) % q as u128) as u64;
            assert_eq!(bred(x, y, q, &bp), expect);
        }
    }

    #[test]
    fn montgomery_round_trip() {
        let q = 97u64;
        let bp = BarrettParams::new(q);
        let mp = MontgomeryParams::new(q);
        for x in 0..q {
            let m = m_form(x, q, &bp);
            assert_eq!(inv_m_form(m, q, &mp), x % q);
        }
    }

    #[test]
    fn montgomery_multiplication_matches_plain() {
        let q = 97u64;
        let bp = BarrettParams::new(q);
        let mp = MontgomeryParams::new(q);
        for x in [3u64, 10, 96, 50] {
            for y in [5u64, 41, 96, 1] {
                let mx = m_form(x, q, &bp);
                let my = m_form(y, q, &bp);
                let prod_mont = m_red(mx, my, q, &mp);
                let prod_plain = inv_m_form(prod_mont, q, &mp);
                assert_eq!(prod_plain, (x * y) % q);
            }
        }
    }

    #[test]
    fn mod_inverse_agrees_fermat_and_extgcd() {
        let q = 97u64;
        for x in 1..q {
            let a = mod_inverse_fermat(x, q).unwrap();
            let b = mod_inverse_extgcd(x, q).unwrap();
            assert_eq!(a, b);
            assert_eq!((x * a) % q, 1);
        }
    }

    #[test]
    fn primality_matches_known_values() {
        assert!(is_prime(97));
        assert!(is_prime(0x3ffffffff000001));
        assert!(!is_prime(1));
        assert!(!is_prime(0));
        assert!(!is_prime(91)); // 7 * 13
        assert!(is_prime(2));
        assert!(!is_prime(4));
    }

    #[test]
    fn generated_primes_are_ntt_friendly() {
        let n = 8usize;
        let nth_root = 2 * n as u64;
        let primes = generate_ntt_primes(20, nth_root, 4).unwrap();
        assert_eq!(primes.len(), 4);
        for p in primes {
            assert!(is_prime(p));
            assert_eq!(p % nth_root, 1);
        }
    }

    #[test]
    fn previous_ntt_prime_below_root_fails() {
        let result = previous_ntt_prime(5, 16);
        assert!(matches!(result, Err(RingError::BelowRoot { .. })));
    }
}
