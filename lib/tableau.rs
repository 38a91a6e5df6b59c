//! *N*-qubit stabilizer states in the Aaronson-Gottesman tableau
//! representation.
//!
//! A state is identified not by its complex amplitudes but by the *N* Pauli
//! operators that stabilize it, along with *N* complementary "destabilizers"
//! that together with the stabilizers generate the full *N*-qubit Pauli group
//! (see [arXiv:quant-ph/0406196][tableau]). Each generator is stored as a row of
//! two bit matrices `xs` and `zs`, plus one sign bit in `rs`:
//!
//! | `xs[i, k]` | `zs[i, k]` | Pauli on qubit `k` |
//! | :--------: | :--------: | :----------------: |
//! | 0          | 0          | *I*                |
//! | 1          | 0          | *X*                |
//! | 1          | 1          | *Y*                |
//! | 0          | 1          | *Z*                |
//!
//! Rows `0..n` are destabilizers, rows `n..2n` are stabilizers, and row `2n`
//! is a scratch row used only while a measurement is in progress[^1]. Columns
//! of each row are packed into `u32` words so that row products can be carried
//! out a word at a time.
//!
//! The action of a Clifford gate is a conjugation of every generator, which
//! amounts to *O*(*N*) bitwise updates on one or two columns.
//!
//! # Example
//! ```
//! use clifford_tableau::tableau::Tableau;
//!
//! // initialize a new state to ∣00⟩
//! let mut tab = Tableau::zero(2);
//!
//! // generate a Bell state on qubits 0, 1
//! tab.apply_h(0, 1.0, 0.0);
//! tab.apply_cx(0, 1, 1.0, 0.0);
//! assert!(tab.validate());
//!
//! println!("{}", tab);
//! // + X X
//! // + Z Z
//! ```
//!
//! [^1]: The scratch row is never part of the state; it is excluded from
//! equality, decoding, and gate updates.
//!
//! [tableau]: https://arxiv.org/abs/quant-ph/0406196

use std::fmt;
use itertools::iproduct;
use nalgebra as na;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    error::{ TableauError, TableauResult },
    gate::{ quarter_turns, Pauli },
};

pub(crate) const PW: [u32; 32] = [ // PW[i] = 2^i
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
    65536, 131072, 262144, 524288, 1048576, 2097152, 4194304, 8388608, 16777216,
    33554432, 67108864, 134217728, 268435456, 536870912, 1073741824, 2147483648
];

#[inline]
fn put(word: &mut u32, pw: u32, val: bool) {
    if val { *word |= pw; } else { *word &= !pw; }
}

/// Phase contribution, in units of *i*, of left-multiplying one packed word of
/// Pauli operators `(x2, z2)` by another `(x1, z1)`.
#[inline]
fn word_phase(x1: u32, z1: u32, x2: u32, z2: u32) -> i64 {
    let plus
        = (x1 & z1 & z2 & !x2)
        | (x1 & !z1 & x2 & z2)
        | (!x1 & z1 & x2 & !z2);
    let minus
        = (x1 & z1 & x2 & !z2)
        | (x1 & !z1 & !x2 & z2)
        | (!x1 & z1 & x2 & z2);
    i64::from(plus.count_ones()) - i64::from(minus.count_ones())
}

/// Return the `i`-th bit (big-endian, out of `n`) of a computational basis
/// state.
pub(crate) fn basis_bit(state: u64, n: usize, i: usize) -> bool {
    let shift = n - 1 - i;
    shift < 64 && (state >> shift) & 1 == 1
}

pub(crate) fn check_basis_state(state: u64, n: usize) -> TableauResult<()> {
    if n < 64 && state >> n != 0 {
        Err(TableauError::BasisStateOutOfRange { state, n })
    } else {
        Ok(())
    }
}

/// A stabilizer state of a finite register of qubits, identified by its
/// stabilizer and destabilizer generators.
#[derive(Clone, Debug)]
pub struct Tableau {
    pub(crate) n: usize,
    // `x` and `z` are bit arrays of size (2n + 1) × n; for space efficiency,
    // the columns are packed into u32s
    pub(crate) x: na::DMatrix<u32>, // size (2n + 1) × (floor(n / 32) + 1)
    pub(crate) z: na::DMatrix<u32>, // size (2n + 1) × (floor(n / 32) + 1)
    pub(crate) r: na::DVector<bool>, // sign bits; size 2n + 1
    pub(crate) over32: usize, // = floor(n / 32) + 1
}

impl PartialEq for Tableau {
    fn eq(&self, other: &Self) -> bool {
        let m = 2 * self.n;
        self.n == other.n
            && self.x.rows(0, m) == other.x.rows(0, m)
            && self.z.rows(0, m) == other.z.rows(0, m)
            && self.r.rows(0, m) == other.r.rows(0, m)
    }
}

impl Eq for Tableau { }

impl Tableau {
    // all-zero bits, including the generators
    pub(crate) fn blank(n: usize) -> Self {
        let over32: usize = (n >> 5) + 1;
        let x: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let z: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let r: na::DVector<bool> = na::DVector::from_element(2 * n + 1, false);
        Self { n, x, z, r, over32 }
    }

    /// Create a new tableau of `n` qubits initialized to the computational
    /// basis state whose big-endian binary representation is `initial_state`
    /// (so that qubit 0 is the most significant bit).
    ///
    /// Fails if `initial_state` does not fit in `n` bits.
    pub fn new(n: usize, initial_state: u64) -> TableauResult<Self> {
        check_basis_state(initial_state, n)?;
        let mut tab = Self::zero(n);
        (0..n).for_each(|i| { tab.r[n + i] = basis_bit(initial_state, n, i); });
        Ok(tab)
    }

    /// Create a new tableau of `n` qubits initialized to ∣0...0⟩.
    pub fn zero(n: usize) -> Self {
        let mut tab = Self::blank(n);
        for i in 0..n {
            let (i5, pw) = (i >> 5, PW[i & 31]);
            tab.x[(i, i5)] = pw;
            tab.z[(n + i, i5)] = pw;
        }
        tab
    }

    /// Return the number of qubits.
    pub fn n(&self) -> usize { self.n }

    /// Return a full, independent duplicate of `self`.
    pub fn copy(&self) -> Self { self.clone() }

    pub(crate) fn x_bit(&self, row: usize, col: usize) -> bool {
        self.x[(row, col >> 5)] & PW[col & 31] != 0
    }

    pub(crate) fn z_bit(&self, row: usize, col: usize) -> bool {
        self.z[(row, col >> 5)] & PW[col & 31] != 0
    }

    pub(crate) fn set_x_bit(&mut self, row: usize, col: usize, val: bool) {
        put(&mut self.x[(row, col >> 5)], PW[col & 31], val);
    }

    pub(crate) fn set_z_bit(&mut self, row: usize, col: usize, val: bool) {
        put(&mut self.z[(row, col >> 5)], PW[col & 31], val);
    }

    fn check_qubit(&self, q: usize) {
        assert!(q < self.n, "qubit index {} out of range for {} qubits", q, self.n);
    }

    fn check_pair(&self, a: usize, b: usize) {
        self.check_qubit(a);
        self.check_qubit(b);
        assert!(a != b, "two-qubit gate applied to a single qubit {}", a);
    }

    // apply `f` to the (x, z, r) bits of column `q` for every generator row
    fn map_column<F>(&mut self, q: usize, mut f: F)
    where F: FnMut(bool, bool, bool) -> (bool, bool, bool)
    {
        let q5: usize = q >> 5;
        let pw: u32 = PW[q & 31];
        for ((x_i_q5, z_i_q5), r_i) in
            self.x.column_mut(q5).iter_mut()
                .zip(self.z.column_mut(q5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            let (x, z, r) = f(*x_i_q5 & pw != 0, *z_i_q5 & pw != 0, *r_i);
            put(x_i_q5, pw, x);
            put(z_i_q5, pw, z);
            *r_i = r;
        }
    }

    fn rot_x(&mut self, q: usize, quarters: u8) {
        match quarters % 4 {
            1 => self.map_column(q, |x, z, r| {
                let x = x ^ z;
                (x, z, r ^ (x & z))
            }),
            2 => self.map_column(q, |x, z, r| (x, z, r ^ z)),
            3 => self.map_column(q, |x, z, r| (x ^ z, z, r ^ (x & z))),
            _ => { },
        }
    }

    fn rot_y(&mut self, q: usize, quarters: u8) {
        match quarters % 4 {
            1 => self.map_column(q, |x, z, r| (z, x, r ^ (x & !z))),
            2 => self.map_column(q, |x, z, r| (x, z, r ^ x ^ z)),
            3 => self.map_column(q, |x, z, r| (z, x, r ^ (!x & z))),
            _ => { },
        }
    }

    fn rot_z(&mut self, q: usize, quarters: u8) {
        match quarters % 4 {
            1 => self.map_column(q, |x, z, r| (x, z ^ x, r ^ (x & z))),
            2 => self.map_column(q, |x, z, r| (x, z, r ^ x)),
            3 => self.map_column(q, |x, z, r| (x, z ^ x, r ^ (x & !z))),
            _ => { },
        }
    }

    fn had(&mut self, q: usize) {
        self.rot_y(q, 1);
        self.rot_x(q, 2);
    }

    fn cnot(&mut self, a: usize, b: usize) {
        let a5: usize = a >> 5;
        let b5: usize = b >> 5;
        let pwa: u32 = PW[a & 31];
        let pwb: u32 = PW[b & 31];
        for ((mut x_i, mut z_i), r_i) in
            self.x.row_iter_mut()
                .zip(self.z.row_iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            let xa = x_i[a5] & pwa != 0;
            let xb = x_i[b5] & pwb != 0;
            let za = z_i[a5] & pwa != 0;
            let zb = z_i[b5] & pwb != 0;
            *r_i ^= xa && zb && !(xb ^ za);
            if xa { x_i[b5] ^= pwb; }
            if zb { z_i[a5] ^= pwa; }
        }
    }

    fn quarters(exponent: f64, gate: &str) -> u8 {
        match quarter_turns(exponent) {
            Some(q) => q,
            None => panic!("{}^{} is not a Clifford operation", gate, exponent),
        }
    }

    fn parity(exponent: f64, gate: &str) -> bool {
        match quarter_turns(exponent) {
            Some(q) if q % 2 == 0 => q == 2,
            _ => panic!("{}^{} is not a Clifford operation", gate, exponent),
        }
    }

    /// Apply an X<sup>`exponent`</sup> gate to the `q`-th qubit.
    ///
    /// `global_shift` affects only the global phase, which a tableau does not
    /// track.
    ///
    /// *Panics if `q` is out of bounds or `exponent` is not a multiple of
    /// 1/2.*
    pub fn apply_x(&mut self, q: usize, exponent: f64, _global_shift: f64)
        -> &mut Self
    {
        self.check_qubit(q);
        self.rot_x(q, Self::quarters(exponent, "X"));
        self
    }

    /// Apply a Y<sup>`exponent`</sup> gate to the `q`-th qubit.
    ///
    /// *Panics if `q` is out of bounds or `exponent` is not a multiple of
    /// 1/2.*
    pub fn apply_y(&mut self, q: usize, exponent: f64, _global_shift: f64)
        -> &mut Self
    {
        self.check_qubit(q);
        self.rot_y(q, Self::quarters(exponent, "Y"));
        self
    }

    /// Apply a Z<sup>`exponent`</sup> gate to the `q`-th qubit. An exponent
    /// of 1/2 is the S gate.
    ///
    /// *Panics if `q` is out of bounds or `exponent` is not a multiple of
    /// 1/2.*
    pub fn apply_z(&mut self, q: usize, exponent: f64, _global_shift: f64)
        -> &mut Self
    {
        self.check_qubit(q);
        self.rot_z(q, Self::quarters(exponent, "Z"));
        self
    }

    /// Apply a power of a Pauli rotation about `axis`. The identity axis is a
    /// no-op.
    ///
    /// *Panics under the same conditions as [`Self::apply_x`].*
    pub fn apply_rotation(&mut self, axis: Pauli, q: usize, exponent: f64)
        -> &mut Self
    {
        match axis {
            Pauli::I => { self.check_qubit(q); self },
            Pauli::X => self.apply_x(q, exponent, 0.0),
            Pauli::Y => self.apply_y(q, exponent, 0.0),
            Pauli::Z => self.apply_z(q, exponent, 0.0),
        }
    }

    /// Apply a Hadamard<sup>`exponent`</sup> gate to the `q`-th qubit.
    ///
    /// *Panics if `q` is out of bounds or `exponent` is not an integer.*
    pub fn apply_h(&mut self, q: usize, exponent: f64, _global_shift: f64)
        -> &mut Self
    {
        self.check_qubit(q);
        if Self::parity(exponent, "H") { self.had(q); }
        self
    }

    /// Apply a CNOT<sup>`exponent`</sup> gate to the `target`-th qubit, with
    /// the `control`-th qubit as control.
    ///
    /// *Panics if either index is out of bounds, the indices are equal, or
    /// `exponent` is not an integer.*
    pub fn apply_cx(
        &mut self,
        control: usize,
        target: usize,
        exponent: f64,
        _global_shift: f64,
    ) -> &mut Self
    {
        self.check_pair(control, target);
        if Self::parity(exponent, "CX") { self.cnot(control, target); }
        self
    }

    /// Apply a CZ<sup>`exponent`</sup> gate to the `a`-th and `b`-th qubits.
    ///
    /// *Panics if either index is out of bounds, the indices are equal, or
    /// `exponent` is not an integer.*
    pub fn apply_cz(
        &mut self,
        a: usize,
        b: usize,
        exponent: f64,
        _global_shift: f64,
    ) -> &mut Self
    {
        self.check_pair(a, b);
        if Self::parity(exponent, "CZ") {
            self.had(b);
            self.cnot(a, b);
            self.had(b);
        }
        self
    }

    /// Apply a SWAP<sup>`exponent`</sup> gate to the `a`-th and `b`-th
    /// qubits, as three alternating CNOTs.
    ///
    /// *Panics if either index is out of bounds, the indices are equal, or
    /// `exponent` is not an integer.*
    pub fn apply_swap(
        &mut self,
        a: usize,
        b: usize,
        exponent: f64,
        _global_shift: f64,
    ) -> &mut Self
    {
        self.check_pair(a, b);
        if Self::parity(exponent, "SWAP") {
            self.cnot(a, b);
            self.cnot(b, a);
            self.cnot(a, b);
        }
        self
    }

    /// Multiply the state by a scalar.
    ///
    /// A tableau carries no global phase, so this changes nothing; it exists
    /// so that callers can keep their phase bookkeeping in one place.
    pub fn apply_global_phase(&mut self, coefficient: C64) -> &mut Self {
        debug!(re = coefficient.re, im = coefficient.im, "global phase");
        self
    }

    /// Left-multiply the Pauli operator in row `dst` by the one in row `src`,
    /// storing the result in row `dst` with the correct sign.
    ///
    /// Either row may be the scratch row `2n`.
    ///
    /// *Panics if either row is out of bounds or `dst == src`.*
    pub fn rowsum(&mut self, dst: usize, src: usize) -> &mut Self {
        let rows = 2 * self.n + 1;
        assert!(dst < rows && src < rows, "rowsum: row index out of bounds");
        assert!(dst != src, "rowsum: a row cannot be multiplied into itself");
        let mut acc: i64
            = 2 * i64::from(self.r[dst]) + 2 * i64::from(self.r[src]);
        for w in 0..self.over32 {
            acc += word_phase(
                self.x[(src, w)], self.z[(src, w)],
                self.x[(dst, w)], self.z[(dst, w)],
            );
        }
        self.r[dst] = acc.rem_euclid(4) != 0;
        for (mut x__w, mut z__w) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__w[dst] ^= x__w[src];
            z__w[dst] ^= z__w[src];
        }
        self
    }

    // set row b equal to row a
    pub(crate) fn row_copy(&mut self, a: usize, b: usize) -> &mut Self {
        for (mut x__w, mut z__w) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__w[b] = x__w[a];
            z__w[b] = z__w[a];
        }
        self.r[b] = self.r[a];
        self
    }

    // set row k to the identity with a positive sign
    pub(crate) fn row_clear(&mut self, k: usize) -> &mut Self {
        self.x.fill_row(k, 0);
        self.z.fill_row(k, 0);
        self.r[k] = false;
        self
    }

    // set row k to +Z_q
    pub(crate) fn row_set_z(&mut self, q: usize, k: usize) -> &mut Self {
        self.row_clear(k);
        self.z[(k, q >> 5)] = PW[q & 31];
        self
    }

    // exchange the labels of qubits a and b: their columns, and the
    // destabilizer/stabilizer rows that belong to them
    pub(crate) fn swap_labels(&mut self, a: usize, b: usize) -> &mut Self {
        if a == b { return self; }
        let n = self.n;
        self.apply_swap(a, b, 1.0, 0.0);
        for (i, j) in [(a, b), (n + a, n + b)] {
            self.x.swap_rows(i, j);
            self.z.swap_rows(i, j);
            self.r.swap_rows(i, j);
        }
        self
    }

    /// Decode row `i` into a signed string of single-qubit Paulis.
    ///
    /// *Panics if `i` is not a generator row (`i ≥ 2n`).*
    pub fn row_to_pauli_string(&self, i: usize) -> NPauli {
        assert!(i < 2 * self.n, "row {} is not a generator row", i);
        let ops: Vec<Pauli>
            = (0..self.n)
            .map(|k| Pauli::from_bits(self.x_bit(i, k), self.z_bit(i, k)))
            .collect();
        NPauli { negative: self.r[i], ops }
    }

    /// Return the `n` stabilizer generators.
    pub fn stabilizers(&self) -> Vec<NPauli> {
        (self.n..2 * self.n).map(|i| self.row_to_pauli_string(i)).collect()
    }

    /// Return the `n` destabilizer generators.
    pub fn destabilizers(&self) -> Vec<NPauli> {
        (0..self.n).map(|i| self.row_to_pauli_string(i)).collect()
    }

    /// Convert `self` to a stabilizer/destabilizer group representation.
    pub fn as_group(&self) -> StabGroup {
        StabGroup { stab: self.stabilizers(), destab: self.destabilizers() }
    }

    /// Unpacked X bits of every row, including the scratch row.
    pub fn xs(&self) -> na::DMatrix<bool> {
        na::DMatrix::from_fn(2 * self.n + 1, self.n, |i, k| self.x_bit(i, k))
    }

    /// Unpacked Z bits of every row, including the scratch row.
    pub fn zs(&self) -> na::DMatrix<bool> {
        na::DMatrix::from_fn(2 * self.n + 1, self.n, |i, k| self.z_bit(i, k))
    }

    /// Sign bits of every row, including the scratch row.
    pub fn rs(&self) -> na::DVector<bool> { self.r.clone() }

    /// The `2n × 2n` binary matrix `[xs | zs]` of the generator rows.
    pub fn matrix(&self) -> na::DMatrix<u8> {
        let n = self.n;
        na::DMatrix::from_fn(2 * n, 2 * n, |i, k| {
            u8::from(if k < n { self.x_bit(i, k) } else { self.z_bit(i, k - n) })
        })
    }

    fn check_shape(&self, what: &'static str, found: (usize, usize))
        -> TableauResult<()>
    {
        let expected = (2 * self.n + 1, if what == "rs" { 1 } else { self.n });
        if found == expected {
            Ok(())
        } else {
            Err(TableauError::ShapeMismatch { what, expected, found })
        }
    }

    /// Overwrite the X bits of every row.
    ///
    /// Fails if `xs` is not `(2n + 1) × n`.
    pub fn set_xs(&mut self, xs: &na::DMatrix<bool>) -> TableauResult<()> {
        self.check_shape("xs", xs.shape())?;
        for (i, k) in iproduct!(0..xs.nrows(), 0..xs.ncols()) {
            self.set_x_bit(i, k, xs[(i, k)]);
        }
        Ok(())
    }

    /// Overwrite the Z bits of every row.
    ///
    /// Fails if `zs` is not `(2n + 1) × n`.
    pub fn set_zs(&mut self, zs: &na::DMatrix<bool>) -> TableauResult<()> {
        self.check_shape("zs", zs.shape())?;
        for (i, k) in iproduct!(0..zs.nrows(), 0..zs.ncols()) {
            self.set_z_bit(i, k, zs[(i, k)]);
        }
        Ok(())
    }

    /// Overwrite the sign bits of every row.
    ///
    /// Fails if `rs` does not have length `2n + 1`.
    pub fn set_rs(&mut self, rs: &na::DVector<bool>) -> TableauResult<()> {
        self.check_shape("rs", rs.shape())?;
        self.r.copy_from(rs);
        Ok(())
    }

    /// Check the symplectic relation *M*<sup>T</sup> *J* *M* = *J* (mod 2) on
    /// the generator rows, where *J* swaps the X and Z halves.
    ///
    /// Intended for tests and debug assertions.
    pub fn validate(&self) -> bool {
        let n = self.n;
        let m: na::DMatrix<u32> = self.matrix().map(u32::from);
        let j: na::DMatrix<u32>
            = na::DMatrix::from_fn(2 * n, 2 * n, |a, b| {
                u32::from(b == (a + n) % (2 * n))
            });
        let prod: na::DMatrix<u32> = (m.transpose() * &j * &m).map(|v| v % 2);
        prod == j
    }
}

impl fmt::Display for Tableau {
    /// Print the stabilizers, one per line. The alternate form prints the
    /// full stabilizer/destabilizer table with identities suppressed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() { return write!(f, "{:#}", self.as_group()); }
        for (k, stab) in self.stabilizers().iter().enumerate() {
            stab.fmt(f)?;
            if k + 1 < self.n { writeln!(f)?; }
        }
        Ok(())
    }
}

/// A single `n`-qubit Pauli operator with a sign.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NPauli {
    pub negative: bool,
    pub ops: Vec<Pauli>,
}

impl fmt::Display for NPauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.negative { "-" } else { "+" })?;
        if f.alternate() {
            self.ops.iter().try_for_each(|p| write!(f, " {:#}", p))
        } else {
            self.ops.iter().try_for_each(|p| write!(f, " {}", p))
        }
    }
}

/// The complete `n`-qubit stabilizer/destabilizer groups for a given state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabGroup {
    pub stab: Vec<NPauli>,
    pub destab: Vec<NPauli>,
}

impl fmt::Display for StabGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.stab.len();
        for (k, (stab, destab)) in
            self.stab.iter().zip(&self.destab).enumerate()
        {
            if f.alternate() {
                write!(f, "{:#} | {:#}", stab, destab)?;
            } else {
                write!(f, "{} | {}", stab, destab)?;
            }
            if k + 1 < n { writeln!(f)?; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, Rng, SeedableRng };

    fn ops(s: &str) -> Vec<Pauli> {
        s.chars()
            .map(|c| match c {
                'X' => Pauli::X,
                'Y' => Pauli::Y,
                'Z' => Pauli::Z,
                _ => Pauli::I,
            })
            .collect()
    }

    // apply a random supported gate, returning a description of it
    fn random_gate<R: Rng>(tab: &mut Tableau, rng: &mut R) -> String {
        let n = tab.n();
        let a = rng.gen_range(0..n);
        let b = (a + rng.gen_range(1..n)) % n;
        let e = f64::from(rng.gen_range(-3_i32..=3)) / 2.0;
        let k = f64::from(rng.gen_range(-2_i32..=2));
        match rng.gen_range(0..7) {
            0 => { tab.apply_x(a, e, 0.0); format!("X^{}({})", e, a) },
            1 => { tab.apply_y(a, e, 0.0); format!("Y^{}({})", e, a) },
            2 => { tab.apply_z(a, e, 0.0); format!("Z^{}({})", e, a) },
            3 => { tab.apply_h(a, k, 0.0); format!("H^{}({})", k, a) },
            4 => { tab.apply_cx(a, b, k, 0.0); format!("CX^{}({}, {})", k, a, b) },
            5 => { tab.apply_cz(a, b, k, 0.0); format!("CZ^{}({}, {})", k, a, b) },
            _ => { tab.apply_swap(a, b, k, 0.0); format!("SWAP^{}({}, {})", k, a, b) },
        }
    }

    #[test]
    fn initial_state() {
        let tab = Tableau::new(3, 0b101).unwrap();
        let stabs = tab.stabilizers();
        assert!(stabs[0].negative);
        assert!(!stabs[1].negative);
        assert!(stabs[2].negative);
        assert_eq!(stabs[1].ops, ops("IZI"));
        assert_eq!(stabs[0].to_string(), "- Z I I");
        assert_eq!(format!("{:#}", stabs[1]), "+ . Z .");
        assert_eq!(tab.destabilizers()[2].ops, ops("IIX"));
        assert!(tab.validate());
        assert_eq!(Tableau::new(3, 0).unwrap(), Tableau::zero(3));
    }

    #[test]
    fn initial_state_out_of_range() {
        assert!(matches!(
            Tableau::new(2, 4),
            Err(TableauError::BasisStateOutOfRange { state: 4, n: 2 })
        ));
        assert!(Tableau::new(0, 0).is_ok());
        assert!(Tableau::new(70, u64::MAX).is_ok());
    }

    #[test]
    fn hadamard_and_phase() {
        let mut tab = Tableau::zero(1);
        tab.apply_h(0, 1.0, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "+ X");
        assert_eq!(tab.destabilizers()[0].to_string(), "+ Z");
        tab.apply_z(0, 0.5, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "+ Y");
        tab.apply_z(0, 0.5, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "- X");
        tab.apply_y(0, 1.0, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "+ X");
        tab.apply_x(0, -0.5, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "+ X");
        tab.apply_y(0, 0.5, 0.0);
        assert_eq!(tab.stabilizers()[0].to_string(), "- Z");
    }

    #[test]
    fn bell_state() {
        let mut tab = Tableau::zero(2);
        tab.apply_h(0, 1.0, 0.0).apply_cx(0, 1, 1.0, 0.0);
        assert_eq!(tab.to_string(), "+ X X\n+ Z Z");
        assert_eq!(format!("{:#}", tab), "+ X X | + Z .\n+ Z Z | + . X");
        assert!(tab.validate());
    }

    #[test]
    fn cz_on_plus_states() {
        let mut tab = Tableau::zero(2);
        tab.apply_h(0, 1.0, 0.0).apply_h(1, 1.0, 0.0).apply_cz(0, 1, 1.0, 0.0);
        assert_eq!(tab.to_string(), "+ X Z\n+ Z X");
    }

    #[test]
    fn swap_exchanges_columns() {
        let mut tab = Tableau::new(2, 0b10).unwrap();
        tab.apply_h(1, 1.0, 0.0);
        tab.apply_swap(0, 1, 1.0, 0.0);
        assert_eq!(tab.to_string(), "- I Z\n+ X I");
    }

    #[test]
    fn invariant_preserved() {
        let mut rng = StdRng::seed_from_u64(10546);
        for n in [2, 3, 5, 33, 40] {
            let mut tab = Tableau::zero(n);
            for _ in 0..200 {
                let g = random_gate(&mut tab, &mut rng);
                assert!(tab.validate(), "invariant broken by {}", g);
            }
        }
    }

    #[test]
    fn inverse_round_trip() {
        let mut rng = StdRng::seed_from_u64(271828);
        let mut tab = Tableau::zero(4);
        for _ in 0..50 { random_gate(&mut tab, &mut rng); }
        let orig = tab.copy();
        for e in [0.5, 1.0, 1.5, -0.5, 2.5] {
            for q in 0..4 {
                tab.apply_x(q, e, 0.0).apply_x(q, -e, 0.0);
                assert_eq!(tab, orig);
                tab.apply_y(q, e, 0.0).apply_y(q, -e, 0.0);
                assert_eq!(tab, orig);
                tab.apply_z(q, e, 0.0).apply_z(q, -e, 0.0);
                assert_eq!(tab, orig);
            }
        }
        for q in 0..4 {
            tab.apply_h(q, 1.0, 0.0).apply_h(q, 1.0, 0.0);
            assert_eq!(tab, orig);
        }
        tab.apply_cx(0, 3, 1.0, 0.0).apply_cx(0, 3, -1.0, 0.0);
        assert_eq!(tab, orig);
        tab.apply_cz(1, 2, 1.0, 0.0).apply_cz(2, 1, 1.0, 0.0);
        assert_eq!(tab, orig);
        tab.apply_swap(1, 3, 1.0, 0.0).apply_swap(3, 1, 1.0, 0.0);
        assert_eq!(tab, orig);
    }

    #[test]
    fn rowsum_involution() {
        let mut rng = StdRng::seed_from_u64(31415);
        let mut tab = Tableau::zero(5);
        for _ in 0..100 { random_gate(&mut tab, &mut rng); }
        let n = tab.n();
        for dst in n..2 * n {
            for src in n..2 * n {
                if src == dst { continue; }
                let orig = tab.row_to_pauli_string(dst);
                tab.rowsum(dst, src);
                tab.rowsum(dst, src);
                assert_eq!(tab.row_to_pauli_string(dst), orig);
            }
        }
    }

    #[test]
    fn rowsum_signs() {
        // (XX)(ZZ) = -YY
        let mut tab = Tableau::zero(2);
        tab.apply_h(0, 1.0, 0.0).apply_cx(0, 1, 1.0, 0.0);
        tab.rowsum(3, 2);
        assert_eq!(tab.row_to_pauli_string(3).to_string(), "- Y Y");
    }

    #[test]
    fn rowsum_across_words() {
        let n = 40;
        let mut tab = Tableau::zero(n);
        for q in [0, 31] { tab.apply_h(q, 1.0, 0.0); }
        tab.apply_cx(0, 39, 1.0, 0.0).apply_cx(31, 32, 1.0, 0.0);
        // stabilizers X0 X39 and Z0 Z39 span both words
        let before = tab.copy();
        tab.rowsum(n + 39, n);
        let row = tab.row_to_pauli_string(n + 39);
        assert_eq!(row.ops[0], Pauli::Y);
        assert_eq!(row.ops[39], Pauli::Y);
        assert!(row.negative);
        // the product is a stabilizer, but it anticommutes with destabilizer 0
        tab.rowsum(n + 39, n);
        assert_eq!(tab, before);
        assert!(tab.validate());
    }

    #[test]
    fn accessors_and_shapes() {
        let mut tab = Tableau::zero(2);
        tab.apply_h(0, 1.0, 0.0);
        let (xs, zs, rs) = (tab.xs(), tab.zs(), tab.rs());
        assert_eq!(xs.shape(), (5, 2));
        assert_eq!(rs.len(), 5);
        let mut other = Tableau::zero(2);
        other.set_xs(&xs).unwrap();
        other.set_zs(&zs).unwrap();
        other.set_rs(&rs).unwrap();
        assert_eq!(other, tab);
        assert!(matches!(
            other.set_xs(&na::DMatrix::from_element(4, 2, false)),
            Err(TableauError::ShapeMismatch { what: "xs", expected: (5, 2), found: (4, 2) })
        ));
        assert!(matches!(
            other.set_rs(&na::DVector::from_element(3, false)),
            Err(TableauError::ShapeMismatch { what: "rs", .. })
        ));
        assert_eq!(tab.matrix().shape(), (4, 4));
    }

    #[test]
    fn validate_detects_breakage() {
        let mut tab = Tableau::zero(2);
        assert!(tab.validate());
        tab.set_x_bit(2, 1, true);
        assert!(!tab.validate());
    }

    #[test]
    fn scratch_row_ignored_in_equality() {
        let a = Tableau::zero(2);
        let mut b = Tableau::zero(2);
        b.set_x_bit(4, 0, true);
        assert_eq!(a, b);
    }

    #[test]
    fn swap_labels_relabels_qubits() {
        let mut a = Tableau::zero(3);
        a.apply_h(0, 1.0, 0.0).apply_cx(0, 2, 1.0, 0.0).apply_x(1, 1.0, 0.0);
        let mut b = Tableau::zero(3);
        b.apply_h(1, 1.0, 0.0).apply_cx(1, 2, 1.0, 0.0).apply_x(0, 1.0, 0.0);
        a.swap_labels(0, 1);
        assert_eq!(a, b);
        assert!(a.validate());
    }

    #[test]
    #[should_panic]
    fn non_clifford_exponent_panics() {
        Tableau::zero(1).apply_x(0, 0.25, 0.0);
    }

    #[test]
    #[should_panic]
    fn out_of_range_panics() {
        Tableau::zero(2).apply_cx(0, 2, 1.0, 0.0);
    }
}
