//! Composition and tensor products of tableaus.
//!
//! A tableau doubles as the Clifford unitary that prepares its state from
//! ∣0...0⟩: row *k* is the image of the *k*-th generator in the ordering
//! (*X*<sub>0</sub>, ..., *X*<sub>*n*−1</sub>, *Z*<sub>0</sub>, ...,
//! *Z*<sub>*n*−1</sub>). Composing two such maps is a mod-2 matrix product on
//! the binary part, plus a sign correction for the factors of *i* that appear
//! when products of Paulis are re-expanded in X-then-Z order.
//!
//! The tensor product of two tableaus on disjoint registers is computed by
//! embedding each into the joint register and composing the embeddings.

use nalgebra as na;
use tracing::debug;
use crate::{
    error::{ TableauError, TableauResult },
    tableau::Tableau,
};

/// Quarter-phase correction (0, ..., 3 for 1, *i*, −1, −*i*) for one row of a
/// composed tableau.
///
/// `row` is a row of the first tableau's `[xs | zs]` matrix, selecting which
/// rows of `second` (the second tableau's `[xs | zs]` matrix) are multiplied
/// together. The correction counts one factor of *i* for every *Y* (X and Z
/// both set) in the input row and in each selected row, two for every *Z*
/// that has to be commuted past a later *X* on the same qubit, and removes
/// one for every *Y* in the reduced product.
pub fn swap_phase(row: &[u8], second: &na::DMatrix<u8>) -> u8 {
    // number of Y's in a (possibly unreduced) x|z row
    fn ys(v: &[i64], n: usize) -> i64 {
        (0..n).map(|j| (v[j] % 2) * (v[n + j] % 2)).sum()
    }

    let n = row.len() / 2;
    let first: Vec<i64> = row.iter().map(|b| i64::from(*b)).collect();
    let mut phase: i64 = ys(&first, n);
    let mut prev: Vec<i64> = vec![0; 2 * n];
    for (i, _) in row.iter().enumerate().filter(|(_, b)| **b != 0) {
        let m2_i: Vec<i64> = second.row(i).iter().map(|b| i64::from(*b)).collect();
        phase += ys(&m2_i, n);
        phase += 2 * (0..n).map(|j| m2_i[j] * prev[n + j]).sum::<i64>();
        prev.iter_mut().zip(&m2_i).for_each(|(p, m)| { *p += m; });
    }
    phase -= ys(&prev, n);
    phase.rem_euclid(4) as u8
}

impl Tableau {
    // `then` without the dimension check
    fn compose(&self, second: &Tableau) -> Tableau {
        let n = self.n;
        let m1: na::DMatrix<u8> = self.matrix();
        let m2: na::DMatrix<u8> = second.matrix();
        let merged: na::DMatrix<u8>
            = (m1.map(u32::from) * m2.map(u32::from)).map(|v| (v % 2) as u8);

        let mut out = Tableau::blank(n);
        for k in 0..2 * n {
            let row: Vec<u8> = m1.row(k).iter().copied().collect();
            let mut sign: u8 = u8::from(self.r[k]);
            for (i, _) in row.iter().enumerate().filter(|(_, b)| **b != 0) {
                sign ^= u8::from(second.r[i]);
            }
            sign = (sign + swap_phase(&row, &m2) / 2) % 2;
            for j in 0..n {
                out.set_x_bit(k, j, merged[(k, j)] != 0);
                out.set_z_bit(k, j, merged[(k, n + j)] != 0);
            }
            out.r[k] = sign != 0;
        }
        debug_assert!(out.validate());
        out
    }

    /// Compose two Clifford operations on the same register: the result is
    /// the tableau of applying `self` and then `second`.
    ///
    /// Fails if the two tableaus have different numbers of qubits.
    pub fn then(&self, second: &Tableau) -> TableauResult<Tableau> {
        if self.n != second.n {
            return Err(TableauError::DimensionMismatch {
                left: self.n,
                right: second.n,
            });
        }
        Ok(self.compose(second))
    }

    // embed `self` into a register of `total` qubits starting at column
    // `offset`, with identity generators everywhere else
    fn embed(&self, total: usize, offset: usize) -> Tableau {
        let n = self.n;
        let mut out = Tableau::blank(total);
        for j in 0..total {
            match j.checked_sub(offset).filter(|l| *l < n) {
                Some(l) => {
                    for c in 0..n {
                        out.set_x_bit(j, offset + c, self.x_bit(l, c));
                        out.set_z_bit(j, offset + c, self.z_bit(l, c));
                        out.set_x_bit(total + j, offset + c, self.x_bit(n + l, c));
                        out.set_z_bit(total + j, offset + c, self.z_bit(n + l, c));
                    }
                    out.r[j] = self.r[l];
                    out.r[total + j] = self.r[n + l];
                },
                None => {
                    out.set_x_bit(j, j, true);
                    out.set_z_bit(total + j, j, true);
                },
            }
        }
        out
    }

    /// Return the tableau of the tensor product of `self` (on the first
    /// `self.n()` qubits) and `other` (on the remaining `other.n()` qubits).
    ///
    /// Qubit `j` of `other` becomes qubit `self.n() + j` of the result.
    /// Neither input is modified.
    pub fn merged_with(&self, other: &Tableau) -> Tableau {
        let total = self.n + other.n;
        debug!(left = self.n, right = other.n, "merging tableaus");
        let a = self.embed(total, 0);
        let b = other.embed(total, self.n);
        a.compose(&b)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rustc_hash::FxHashSet;
    use crate::{ gate::Pauli, tableau::NPauli };
    use rand::{ rngs::StdRng, Rng, SeedableRng };

    fn scramble<R: Rng>(tab: &mut Tableau, depth: usize, rng: &mut R) {
        let n = tab.n();
        for _ in 0..depth {
            let a = rng.gen_range(0..n);
            match rng.gen_range(0..4) {
                0 => { tab.apply_h(a, 1.0, 0.0); },
                1 => { tab.apply_z(a, 0.5, 0.0); },
                2 => { tab.apply_x(a, 1.0, 0.0); },
                _ if n > 1 => {
                    let b = (a + rng.gen_range(1..n)) % n;
                    tab.apply_cx(a, b, 1.0, 0.0);
                },
                _ => { tab.apply_y(a, 1.0, 0.0); },
            }
        }
    }

    #[test]
    fn swap_phase_identity_rows() {
        let id = Tableau::zero(2).matrix();
        for k in 0..4 {
            let row: Vec<u8> = id.row(k).iter().copied().collect();
            assert_eq!(swap_phase(&row, &id), 0);
        }
        // a Y in the input row expands to XZ and recombines
        assert_eq!(swap_phase(&[1, 0, 1, 0], &id), 0);
    }

    #[test]
    fn swap_phase_reordering() {
        // second maps X -> Z and Z -> X on one qubit (Hadamard)
        let mut h = Tableau::zero(1);
        h.apply_h(0, 1.0, 0.0);
        let m2 = h.matrix();
        // H maps Y to -Y
        assert_eq!(swap_phase(&[1, 1], &m2), 2);
        assert_eq!(swap_phase(&[1, 0], &m2), 0);
        assert_eq!(swap_phase(&[0, 1], &m2), 0);
    }

    #[test]
    fn swap_phase_single_qubit_merge() {
        // S then S is Z: X -> -X
        let mut s = Tableau::zero(1);
        s.apply_z(0, 0.5, 0.0);
        let ss = s.then(&s).unwrap();
        let mut z = Tableau::zero(1);
        z.apply_z(0, 1.0, 0.0);
        assert_eq!(ss, z);
    }

    #[test]
    fn compose_matches_sequential_application() {
        let mut rng = StdRng::seed_from_u64(8675309);
        for n in [1, 2, 3, 4] {
            for _ in 0..20 {
                let mut first = Tableau::zero(n);
                scramble(&mut first, 30, &mut rng);
                // the same gates that build `second` from zero, replayed on
                // `first`, give the composition
                let seed: u64 = rng.gen();
                let mut second = Tableau::zero(n);
                scramble(&mut second, 30, &mut StdRng::seed_from_u64(seed));
                let mut direct = first.copy();
                scramble(&mut direct, 30, &mut StdRng::seed_from_u64(seed));
                let composed = first.then(&second).unwrap();
                assert!(composed.validate());
                assert_eq!(composed, direct);
            }
        }
    }

    #[test]
    fn then_dimension_mismatch() {
        assert!(matches!(
            Tableau::zero(2).then(&Tableau::zero(3)),
            Err(TableauError::DimensionMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn merge_matches_direct_construction() {
        let mut a = Tableau::zero(1);
        a.apply_h(0, 1.0, 0.0);
        let mut b = Tableau::zero(1);
        b.apply_x(0, 1.0, 0.0);
        let merged = a.merged_with(&b);

        let mut direct = Tableau::zero(2);
        direct.apply_h(0, 1.0, 0.0).apply_x(1, 1.0, 0.0);
        assert!(merged.validate());
        assert_eq!(merged, direct);
    }

    #[test]
    fn merge_entangled_subsystems() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = Tableau::zero(2);
        scramble(&mut a, 40, &mut rng);
        let mut b = Tableau::new(3, 0b110).unwrap();
        scramble(&mut b, 40, &mut rng);
        let merged = a.merged_with(&b);
        assert!(merged.validate());
        assert_eq!(merged.n(), 5);
        let stabs = merged.stabilizers();
        for (k, s) in a.stabilizers().into_iter().enumerate() {
            assert_eq!(stabs[k].negative, s.negative);
            assert_eq!(&stabs[k].ops[..2], &s.ops[..]);
        }
        for (k, s) in b.stabilizers().into_iter().enumerate() {
            assert_eq!(stabs[2 + k].negative, s.negative);
            assert_eq!(&stabs[2 + k].ops[2..], &s.ops[..]);
        }
    }

    #[test]
    fn merge_with_empty() {
        let mut a = Tableau::zero(2);
        a.apply_h(1, 1.0, 0.0);
        assert_eq!(a.merged_with(&Tableau::zero(0)), a);
        assert_eq!(Tableau::zero(0).merged_with(&a), a);
    }

    // multiply every subset of the stabilizer generators together through the
    // scratch row
    fn stabilizer_group(tab: &Tableau) -> Vec<NPauli> {
        let n = tab.n();
        let mut group: Vec<NPauli> = Vec::with_capacity(1 << n);
        for mask in 0_usize..1 << n {
            let mut work = tab.copy();
            work.row_clear(2 * n);
            for k in (0..n).filter(|k| mask & (1 << k) != 0) {
                work.rowsum(2 * n, n + k);
            }
            let ops = (0..n)
                .map(|j| Pauli::from_bits(work.x_bit(2 * n, j), work.z_bit(2 * n, j)))
                .collect();
            group.push(NPauli { negative: work.r[2 * n], ops });
        }
        group
    }

    #[test]
    fn group_closure() {
        let mut rng = StdRng::seed_from_u64(1729);
        for n in [2, 3] {
            for _ in 0..10 {
                let mut tab = Tableau::zero(n);
                scramble(&mut tab, 25, &mut rng);
                let group = stabilizer_group(&tab);
                let distinct: FxHashSet<NPauli> = group.iter().cloned().collect();
                assert_eq!(distinct.len(), 1 << n);
                // no operator appears with both signs
                let unsigned: FxHashSet<&Vec<_>>
                    = group.iter().map(|p| &p.ops).collect();
                assert_eq!(unsigned.len(), 1 << n);
                // closed under multiplication by each generator
                for g in tab.stabilizers() {
                    for p in group.iter() {
                        let prod = product(&g, p);
                        assert!(distinct.contains(&prod));
                    }
                }
            }
        }
    }

    // multiply two Hermitian Paulis known to commute
    fn product(a: &NPauli, b: &NPauli) -> NPauli {
        let n = a.ops.len();
        let mut tab = Tableau::blank(n);
        for (j, (pa, pb)) in a.ops.iter().zip(&b.ops).enumerate() {
            let (xa, za) = pa.to_bits();
            let (xb, zb) = pb.to_bits();
            tab.set_x_bit(0, j, xa);
            tab.set_z_bit(0, j, za);
            tab.set_x_bit(1, j, xb);
            tab.set_z_bit(1, j, zb);
        }
        tab.r[0] = a.negative;
        tab.r[1] = b.negative;
        tab.rowsum(1, 0);
        let ops = (0..n)
            .map(|j| Pauli::from_bits(tab.x_bit(1, j), tab.z_bit(1, j)))
            .collect();
        NPauli { negative: tab.r[1], ops }
    }
}
