//! Numerical recognition of single-qubit Clifford unitaries.
//!
//! A 2 × 2 unitary *U* is a Clifford operation iff it maps each of *X*, *Y*,
//! *Z* to a signed Pauli under conjugation. The resulting table of signed
//! images identifies *U* up to a global phase and can be factored into at most
//! two quarter-turn rotations about the coordinate axes, each of which the
//! tableau applies exactly.

use std::f64::consts::{ FRAC_1_SQRT_2, PI };
use nalgebra as na;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use crate::gate::{ Pauli, Pow };

/// A single-qubit identity matrix.
pub static PAULI_I: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| na::DMatrix::identity(2, 2));

/// A single-qubit Pauli *X* matrix.
pub static PAULI_X: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| {
        let mut x = na::DMatrix::zeros(2, 2);
        x[(0, 1)] = C64::from(1.0);
        x[(1, 0)] = C64::from(1.0);
        x
    });

/// A single-qubit Pauli *Y* matrix.
pub static PAULI_Y: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| {
        let mut y = na::DMatrix::zeros(2, 2);
        y[(0, 1)] = -C64::i();
        y[(1, 0)] =  C64::i();
        y
    });

/// A single-qubit Pauli *Z* matrix.
pub static PAULI_Z: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| {
        let mut z = na::DMatrix::zeros(2, 2);
        z[(0, 0)] = C64::from( 1.0);
        z[(1, 1)] = C64::from(-1.0);
        z
    });

/// The (involutory) Hadamard matrix.
pub static HADAMARD: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| {
        let h = C64::from(FRAC_1_SQRT_2);
        na::DMatrix::from_row_slice(2, 2, &[h, h, h, -h])
    });

/// Return the matrix of a single-qubit Pauli.
pub fn pauli_matrix(p: Pauli) -> &'static na::DMatrix<C64> {
    match p {
        Pauli::I => Lazy::force(&PAULI_I),
        Pauli::X => Lazy::force(&PAULI_X),
        Pauli::Y => Lazy::force(&PAULI_Y),
        Pauli::Z => Lazy::force(&PAULI_Z),
    }
}

// e^{iπts} [(I + P) / 2 + e^{iπt} (I − P) / 2] for involutory P
fn involution_pow(p: &na::DMatrix<C64>, pow: Pow) -> na::DMatrix<C64> {
    let id: na::DMatrix<C64> = na::DMatrix::identity(2, 2);
    let plus: na::DMatrix<C64> = (&id + p).map(|a| a / 2.0);
    let minus: na::DMatrix<C64> = (&id - p).map(|a| a / 2.0);
    let shift = C64::cis(PI * pow.exponent * pow.global_shift);
    let eig = C64::cis(PI * pow.exponent);
    (plus + minus.map(|a| a * eig)).map(|a| a * shift)
}

/// Unitary matrix of a power of a Pauli rotation. The identity axis gives a
/// pure phase.
pub fn rotation_unitary(axis: Pauli, pow: Pow) -> na::DMatrix<C64> {
    involution_pow(pauli_matrix(axis), pow)
}

/// Unitary matrix of a power of the Hadamard gate.
pub fn hadamard_unitary(pow: Pow) -> na::DMatrix<C64> {
    involution_pow(Lazy::force(&HADAMARD), pow)
}

/// Return `true` if `u` is square and *U U*<sup>†</sup> is the identity to
/// within `atol` in every entry.
pub fn is_unitary(u: &na::DMatrix<C64>, atol: f64) -> bool {
    u.is_square()
        && (u * u.adjoint() - na::DMatrix::<C64>::identity(u.nrows(), u.ncols()))
            .iter()
            .all(|a| a.norm() <= atol)
}

fn approx_eq(a: &na::DMatrix<C64>, b: &na::DMatrix<C64>, sign: f64, atol: f64)
    -> bool
{
    a.iter().zip(b.iter()).all(|(ak, bk)| (ak - bk * sign).norm() <= atol)
}

/// The image of a Pauli under conjugation by a Clifford operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PauliTransform {
    pub to: Pauli,
    pub flip: bool,
}

/// A single-qubit Clifford operation, identified (up to global phase) by where
/// it sends *X*, *Y*, and *Z* under conjugation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SingleQubitClifford {
    transforms: [PauliTransform; 3],
}

impl SingleQubitClifford {
    /// Try to identify `u` as a single-qubit Clifford operation.
    ///
    /// Returns `None` if `u` is not 2 × 2, is not unitary, or does not map
    /// every Pauli to a signed Pauli, all to within `atol` in each matrix
    /// entry.
    pub fn from_unitary(u: &na::DMatrix<C64>, atol: f64) -> Option<Self> {
        if u.shape() != (2, 2) || !is_unitary(u, atol) { return None; }
        let u_dag = u.adjoint();
        let mut transforms = [PauliTransform { to: Pauli::I, flip: false }; 3];
        for (t, p) in transforms.iter_mut().zip([Pauli::X, Pauli::Y, Pauli::Z]) {
            let image: na::DMatrix<C64> = u * pauli_matrix(p) * &u_dag;
            *t = [Pauli::X, Pauli::Y, Pauli::Z].into_iter()
                .flat_map(|q| [(q, false), (q, true)])
                .find(|(q, flip)| {
                    approx_eq(&image, pauli_matrix(*q), if *flip { -1.0 } else { 1.0 }, atol)
                })
                .map(|(to, flip)| PauliTransform { to, flip })?;
        }
        Some(Self { transforms })
    }

    /// Return the image of `p` under conjugation.
    pub fn transform(&self, p: Pauli) -> PauliTransform {
        match p.axis() {
            Some(k) => self.transforms[k],
            None => PauliTransform { to: Pauli::I, flip: false },
        }
    }

    /// Factor `self` into a sequence of zero, one, or two rotations
    /// `(axis, quarter_turns)`, to be applied in order. A rotation of `q`
    /// quarter turns about `axis` is `axis`<sup>`q / 2`</sup>.
    pub fn decompose_rotation(&self) -> Vec<(Pauli, i8)> {
        let [x_rot, y_rot, z_rot] = self.transforms;
        let whole: [bool; 3]
            = [x_rot.to == Pauli::X, y_rot.to == Pauli::Y, z_rot.to == Pauli::Z];
        let flips: [bool; 3] = [x_rot.flip, y_rot.flip, z_rot.flip];
        match whole.iter().filter(|w| **w).count() {
            3 => {
                // identity, or a half turn about the one unflipped axis
                flips.iter()
                    .position(|f| !*f)
                    .filter(|_| flips.iter().any(|f| *f))
                    .map(|k| vec![(Pauli::from_axis(k), 2)])
                    .unwrap_or_default()
            },
            1 => {
                let k = whole.iter().position(|w| *w).unwrap_or(0);
                let pauli = Pauli::from_axis(k);
                let mut output: Vec<(Pauli, i8)> = Vec::with_capacity(2);
                if flips[k] { output.push((pauli.next_axis(), 2)); }
                if self.transform(pauli.next_axis()).flip {
                    output.push((pauli, -1));
                } else {
                    output.push((pauli, 1));
                }
                output
            },
            _ => {
                // a 120 degree rotation about a diagonal
                if x_rot.to == Pauli::Y {
                    vec![
                        (Pauli::X, if y_rot.flip { -1 } else { 1 }),
                        (Pauli::Z, if x_rot.flip { -1 } else { 1 }),
                    ]
                } else {
                    vec![
                        (Pauli::Z, if y_rot.flip { 1 } else { -1 }),
                        (Pauli::X, if z_rot.flip { 1 } else { -1 }),
                    ]
                }
            },
        }
    }
}
