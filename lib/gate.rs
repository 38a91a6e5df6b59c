//! Descriptions of the operations fed to the tableau engine.
//!
//! An [`Operation`] pairs a [`Gate`] with the ordered list of qubit (column)
//! indices it acts on. Power gates carry a [`Pow`], following the usual
//! convention
//!
//! U = e<sup>*iπts*</sup> [(*I* + *P*) / 2 + e<sup>*iπt*</sup> (*I* − *P*) / 2]
//!
//! for an involutory generator *P*, exponent *t*, and global shift *s*. Only
//! those exponents for which U is a Clifford operation can be applied to a
//! tableau directly.
//!
//! See also: <https://en.wikipedia.org/wiki/Clifford_gates>

use std::fmt;
use itertools::Itertools;
use nalgebra as na;
use num_complex::Complex64 as C64;
use crate::{
    clifford,
    error::{ TableauError, TableauResult },
};

/// Absolute tolerance used when deciding whether an exponent is an exact
/// multiple of 1/2.
pub const EXPONENT_ATOL: f64 = 1e-9;

/// A single-qubit Pauli operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity
    I,
    /// σ<sub>*x*</sub>
    X,
    /// σ<sub>*y*</sub>
    Y,
    /// σ<sub>*z*</sub>
    Z,
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I => write!(f, "{}", if f.alternate() { "." } else { "I" }),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl Pauli {
    /// Decode from a pair of (X, Z) tableau bits.
    pub fn from_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Self::I,
            (true,  false) => Self::X,
            (true,  true ) => Self::Y,
            (false, true ) => Self::Z,
        }
    }

    /// Encode as a pair of (X, Z) tableau bits.
    pub fn to_bits(self) -> (bool, bool) {
        match self {
            Self::I => (false, false),
            Self::X => (true,  false),
            Self::Y => (true,  true ),
            Self::Z => (false, true ),
        }
    }

    /// Index of a rotation axis, with X, Y, Z as 0, 1, 2.
    pub fn axis(self) -> Option<usize> {
        match self {
            Self::I => None,
            Self::X => Some(0),
            Self::Y => Some(1),
            Self::Z => Some(2),
        }
    }

    /// Inverse of [`Self::axis`], taken modulo 3.
    pub fn from_axis(k: usize) -> Self {
        match k % 3 {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }

    /// The next axis in the cycle X → Y → Z → X. The identity maps to itself.
    pub fn next_axis(self) -> Self {
        self.axis().map(|k| Self::from_axis(k + 1)).unwrap_or(Self::I)
    }
}

// number of quarter turns (mod 4) in `exponent` half turns, if it is one
pub(crate) fn quarter_turns(exponent: f64) -> Option<u8> {
    let h = 2.0 * exponent.rem_euclid(2.0);
    let r = h.round();
    ((h - r).abs() <= EXPONENT_ATOL).then(|| (r as u8) % 4)
}

/// Exponent and global shift of a power gate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pow {
    pub exponent: f64,
    pub global_shift: f64,
}

impl Default for Pow {
    fn default() -> Self { Self::full() }
}

impl Pow {
    pub fn new(exponent: f64, global_shift: f64) -> Self {
        Self { exponent, global_shift }
    }

    /// Exponent 1 with no global shift.
    pub fn full() -> Self { Self::new(1.0, 0.0) }

    /// Exponent `t` with no global shift.
    pub fn exp(exponent: f64) -> Self { Self::new(exponent, 0.0) }

    /// Number of quarter turns modulo 4, if the exponent is a multiple of
    /// 1/2.
    pub fn quarter_turns(&self) -> Option<u8> { quarter_turns(self.exponent) }

    /// Parity of the exponent, if it is an integer.
    pub fn half_turns(&self) -> Option<u8> {
        self.quarter_turns()
            .and_then(|q| (q % 2 == 0).then_some(q / 2))
    }

    /// The exponent modulo `m`, if the exponent is an integer.
    ///
    /// The reduction happens before rounding, so exponents too large for an
    /// integer type are still classified exactly.
    pub fn integer_mod(&self, m: u32) -> Option<u32> {
        let e = self.exponent.rem_euclid(f64::from(m));
        let r = e.round();
        ((e - r).abs() <= EXPONENT_ATOL).then(|| (r as u32) % m)
    }
}

impl fmt::Display for Pow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent != 1.0 { write!(f, "^{}", self.exponent)?; }
        if self.global_shift != 0.0 { write!(f, "[s={}]", self.global_shift)?; }
        Ok(())
    }
}

/// Description of a single gate, independent of the qubits it acts on.
#[derive(Clone, Debug, PartialEq)]
pub enum Gate {
    /// Power of Pauli X
    X(Pow),
    /// Power of Pauli Y
    Y(Pow),
    /// Power of Pauli Z
    Z(Pow),
    /// Power of Hadamard
    H(Pow),
    /// Power of Z-controlled X.
    ///
    /// The first qubit index is the control.
    CX(Pow),
    /// Power of Z-controlled Z.
    CZ(Pow),
    /// Power of Swap
    Swap(Pow),
    /// Power of iSwap
    ISwap(Pow),
    /// Power of Z-controlled Y.
    ///
    /// The first qubit index is the control.
    CY(Pow),
    /// Multiplication by a complex scalar; acts on no qubits.
    GlobalPhase(C64),
    /// An arbitrary unitary on one or two qubits.
    Matrix(na::DMatrix<C64>),
    /// A probability-weighted list of unitaries, exactly one of which is
    /// applied.
    Mixture(Vec<(f64, na::DMatrix<C64>)>),
    /// Projective measurement in the Z-basis.
    Measure,
    /// Reset to ∣0⟩.
    Reset,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X(p) => write!(f, "X{}", p),
            Self::Y(p) => write!(f, "Y{}", p),
            Self::Z(p) => write!(f, "Z{}", p),
            Self::H(p) => write!(f, "H{}", p),
            Self::CX(p) => write!(f, "CX{}", p),
            Self::CZ(p) => write!(f, "CZ{}", p),
            Self::Swap(p) => write!(f, "SWAP{}", p),
            Self::ISwap(p) => write!(f, "ISWAP{}", p),
            Self::CY(p) => write!(f, "CY{}", p),
            Self::GlobalPhase(c) => write!(f, "GlobalPhase({})", c),
            Self::Matrix(u) => write!(f, "Matrix[{}x{}]", u.nrows(), u.ncols()),
            Self::Mixture(m) => write!(f, "Mixture[{}]", m.len()),
            Self::Measure => write!(f, "M"),
            Self::Reset => write!(f, "R"),
        }
    }
}

impl Gate {
    /// Number of qubits the gate acts on.
    ///
    /// For `Matrix` and `Mixture`, this is inferred from the matrix dimension;
    /// a dimension that is not a power of two yields zero, which no qubit
    /// list can match.
    pub fn num_qubits(&self) -> usize {
        fn from_dim(u: &na::DMatrix<C64>) -> usize {
            let d = u.nrows();
            if d.is_power_of_two() && u.is_square() {
                d.trailing_zeros() as usize
            } else {
                0
            }
        }

        match self {
            Self::X(_) | Self::Y(_) | Self::Z(_) | Self::H(_) => 1,
            Self::CX(_) | Self::CZ(_) | Self::Swap(_) | Self::ISwap(_)
                | Self::CY(_) => 2,
            Self::GlobalPhase(_) => 0,
            Self::Matrix(u) => from_dim(u),
            Self::Mixture(m) => m.first().map(|(_, u)| from_dim(u)).unwrap_or(0),
            Self::Measure | Self::Reset => 1,
        }
    }

    /// The gate's single-qubit unitary matrix, if it has one.
    pub fn unitary(&self) -> Option<na::DMatrix<C64>> {
        match self {
            Self::X(p) => Some(clifford::rotation_unitary(Pauli::X, *p)),
            Self::Y(p) => Some(clifford::rotation_unitary(Pauli::Y, *p)),
            Self::Z(p) => Some(clifford::rotation_unitary(Pauli::Z, *p)),
            Self::H(p) => Some(clifford::hadamard_unitary(*p)),
            Self::Matrix(u) => Some(u.clone()),
            _ => None,
        }
    }
}

/// A [`Gate`] applied to an ordered list of qubit indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub gate: Gate,
    pub qubits: Vec<usize>,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.gate, self.qubits.iter().join(", "))
    }
}

impl Operation {
    pub fn new<I>(gate: Gate, qubits: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self { gate, qubits: qubits.into_iter().collect() }
    }

    /// Pauli X.
    pub fn x(q: usize) -> Self { Self::new(Gate::X(Pow::full()), [q]) }

    /// Pauli Y.
    pub fn y(q: usize) -> Self { Self::new(Gate::Y(Pow::full()), [q]) }

    /// Pauli Z.
    pub fn z(q: usize) -> Self { Self::new(Gate::Z(Pow::full()), [q]) }

    /// Hadamard.
    pub fn h(q: usize) -> Self { Self::new(Gate::H(Pow::full()), [q]) }

    /// π/2 phase, Z<sup>1/2</sup>.
    pub fn s(q: usize) -> Self { Self::z_pow(q, 0.5) }

    /// Inverse π/2 phase, Z<sup>−1/2</sup>.
    pub fn sdg(q: usize) -> Self { Self::z_pow(q, -0.5) }

    pub fn x_pow(q: usize, exponent: f64) -> Self {
        Self::new(Gate::X(Pow::exp(exponent)), [q])
    }

    pub fn y_pow(q: usize, exponent: f64) -> Self {
        Self::new(Gate::Y(Pow::exp(exponent)), [q])
    }

    pub fn z_pow(q: usize, exponent: f64) -> Self {
        Self::new(Gate::Z(Pow::exp(exponent)), [q])
    }

    /// CNOT with `c` as control.
    pub fn cx(c: usize, t: usize) -> Self {
        Self::new(Gate::CX(Pow::full()), [c, t])
    }

    pub fn cz(a: usize, b: usize) -> Self {
        Self::new(Gate::CZ(Pow::full()), [a, b])
    }

    /// Controlled-Y with `c` as control.
    pub fn cy(c: usize, t: usize) -> Self {
        Self::new(Gate::CY(Pow::full()), [c, t])
    }

    pub fn swap(a: usize, b: usize) -> Self {
        Self::new(Gate::Swap(Pow::full()), [a, b])
    }

    pub fn iswap(a: usize, b: usize) -> Self {
        Self::new(Gate::ISwap(Pow::full()), [a, b])
    }

    pub fn global_phase(coefficient: C64) -> Self {
        Self::new(Gate::GlobalPhase(coefficient), [])
    }

    /// An arbitrary unitary acting on `qubits`.
    pub fn matrix<I>(u: na::DMatrix<C64>, qubits: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self::new(Gate::Matrix(u), qubits)
    }

    /// A probability-weighted choice of unitaries acting on `qubits`.
    pub fn mixture<I>(mixture: Vec<(f64, na::DMatrix<C64>)>, qubits: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self::new(Gate::Mixture(mixture), qubits)
    }

    pub fn measure(q: usize) -> Self { Self::new(Gate::Measure, [q]) }

    pub fn reset(q: usize) -> Self { Self::new(Gate::Reset, [q]) }

    /// Return a copy of `self` acting on different qubits.
    pub fn with_qubits(&self, qubits: Vec<usize>) -> Self {
        Self { gate: self.gate.clone(), qubits }
    }

    /// Check that the qubit list matches the gate's arity, contains no
    /// repeats, and fits in a register of `n` qubits.
    pub fn check(&self, n: usize) -> TableauResult<()> {
        let expected = self.gate.num_qubits();
        if self.qubits.len() != expected {
            return Err(TableauError::ArityMismatch {
                gate: self.gate.to_string(),
                expected,
                found: self.qubits.len(),
            });
        }
        if let Some(&q) = self.qubits.iter().find(|q| **q >= n) {
            return Err(TableauError::QubitOutOfRange { qubit: q, n });
        }
        if let Some(q) = self.qubits.iter().duplicates().next() {
            return Err(TableauError::DuplicateQubit(*q));
        }
        Ok(())
    }
}
