//! `RnsScalar`: a single scalar represented as one residue per modulus,
//! same RNS basis as a `Poly` row but with no polynomial degree — used for
//! the per-level constants produced by rescaling and by `MulScalar`.

use crate::ring::RnsRing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RnsScalar {
    residues: Vec<u64>,
}

impl RnsScalar {
    /// Reduces `value` mod every modulus in the ring up to `level`.
    pub fn from_u64(ring: &RnsRing, level: usize, value: u64) -> Self {
        let residues = ring.moduli()[..=level].iter().map(|m| value % m.q).collect();
        RnsScalar { residues }
    }

    pub fn level(&self) -> usize {
        self.residues.len() - 1
    }

    pub fn residue(&self, level: usize) -> u64 {
        self.residues[level]
    }

    pub fn residues(&self) -> &[u64] {
        &self.residues
    }

    pub fn add(&self, ring: &RnsRing, other: &RnsScalar) -> RnsScalar {
        let residues = self
            .residues
            .iter()
            .zip(&other.residues)
            .enumerate()
            .map(|(i, (&a, &b))| {
                let q = ring.modulus(i).q;
                let s = a + b;
                if s >= q {
                    s - q
                } else {
                    s
                }
            })
            .collect();
        RnsScalar { residues }
    }

    pub fn subtract(&self, ring: &RnsRing, other: &RnsScalar) -> RnsScalar {
        let residues = self
            .residues
            .iter()
            .zip(&other.residues)
            .enumerate()
            .map(|(i, (&a, &b))| {
                let q = ring.modulus(i).q;
                if a >= b {
                    a - b
                } else {
                    a + q - b
                }
            })
            .collect();
        RnsScalar { residues }
    }

    pub fn multiply(&self, ring: &RnsRing, other: &RnsScalar) -> RnsScalar {
        let residues = self
            .residues
            .iter()
            .zip(&other.residues)
            .enumerate()
            .map(|(i, (&a, &b))| {
                let m = ring.modulus(i);
                crate::modular::bred(a, b, m.q, &m.bred)
            })
            .collect();
        RnsScalar { residues }
    }

    pub fn negate(&self, ring: &RnsRing) -> RnsScalar {
        let residues = self
            .residues
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let q = ring.modulus(i).q;
                if a == 0 {
                    0
                } else {
                    q - a
                }
            })
            .collect();
        RnsScalar { residues }
    }
}
