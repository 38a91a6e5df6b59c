//! Projective Z-basis measurement on a [`Tableau`].
//!
//! A measurement of qubit *q* either commutes with every stabilizer, in which
//! case the outcome is already determined and can be read off by accumulating
//! the relevant stabilizers in the scratch row, or anticommutes with at least
//! one, in which case the outcome is uniformly random and the tableau is
//! updated to reflect the collapsed state.

use std::fmt;
use rand::Rng;
use tracing::trace;
use crate::tableau::{ Tableau, PW };

/// The result of a measurement, generated by [`Tableau::measure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A deterministic outcome resulting in ∣0⟩
    Det0,
    /// A deterministic outcome resulting in ∣1⟩
    Det1,
    /// A random outcome resulting in ∣0⟩
    Rand0,
    /// A random outcome resulting in ∣1⟩
    Rand1,
}

impl Outcome {
    /// Returns `true` if `self` is `Det0` or `Rand0`.
    pub fn is_0(&self) -> bool { matches!(self, Self::Det0 | Self::Rand0) }

    /// Returns `true` if `self` is `Det1` or `Rand1`.
    pub fn is_1(&self) -> bool { matches!(self, Self::Det1 | Self::Rand1) }

    /// Returns `true` if `self` is `Rand0` or `Rand1`.
    pub fn is_random(&self) -> bool { matches!(self, Self::Rand0 | Self::Rand1) }

    /// Returns `true` if `self` is `Det0` or `Det1`.
    pub fn is_deterministic(&self) -> bool { !self.is_random() }

    /// The classical measurement bit.
    pub fn bit(&self) -> bool { self.is_1() }
}

impl From<Outcome> for bool {
    fn from(outcome: Outcome) -> Self { outcome.bit() }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(self.bit()))
    }
}

impl Tableau {
    /// Perform a projective measurement on qubit `q` in the Z-basis,
    /// returning the outcome of the measurement.
    ///
    /// Randomness is drawn from `rng` only when the outcome is not already
    /// determined by the state.
    ///
    /// *Panics if `q` is out of bounds.*
    pub fn measure<R>(&mut self, q: usize, rng: &mut R) -> Outcome
    where R: Rng + ?Sized
    {
        assert!(q < self.n, "qubit index {} out of range for {} qubits", q, self.n);
        let n = self.n;
        let q5: usize = q >> 5;
        let pw: u32 = PW[q & 31];

        let maybe_p: Option<usize>
            = (n..2 * n).find(|i| self.x[(*i, q5)] & pw != 0);
        if let Some(p) = maybe_p {
            for i in 0..2 * n {
                if i != p && self.x[(i, q5)] & pw != 0 { self.rowsum(i, p); }
            }
            self.row_copy(p, p - n);
            self.row_set_z(q, p);
            let bit: bool = rng.gen();
            self.r[p] = bit;
            trace!(qubit = q, pivot = p, bit, "random measurement");
            if bit { Outcome::Rand1 } else { Outcome::Rand0 }
        } else {
            let s = 2 * n;
            self.row_clear(s);
            for i in 0..n {
                if self.x[(i, q5)] & pw != 0 { self.rowsum(s, n + i); }
            }
            let bit: bool = self.r[s];
            trace!(qubit = q, bit, "deterministic measurement");
            if bit { Outcome::Det1 } else { Outcome::Det0 }
        }
    }

    /// Measure qubit `q` and then flip it to ∣0⟩ if necessary, returning the
    /// outcome of the intermediate measurement.
    ///
    /// *Panics if `q` is out of bounds.*
    pub fn reset<R>(&mut self, q: usize, rng: &mut R) -> Outcome
    where R: Rng + ?Sized
    {
        let outcome = self.measure(q, rng);
        if outcome.is_1() { self.apply_x(q, 1.0, 0.0); }
        outcome
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, SeedableRng };

    #[test]
    fn deterministic_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut tab = Tableau::zero(1);
        let orig = tab.copy();
        for _ in 0..1000 {
            assert_eq!(tab.measure(0, &mut rng), Outcome::Det0);
        }
        assert_eq!(tab, orig);
    }

    #[test]
    fn deterministic_from_basis_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tab = Tableau::new(3, 0b011).unwrap();
        assert_eq!(tab.measure(0, &mut rng), Outcome::Det0);
        assert_eq!(tab.measure(1, &mut rng), Outcome::Det1);
        assert_eq!(tab.measure(2, &mut rng), Outcome::Det1);
    }

    #[test]
    fn deterministic_after_collapse() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut tab = Tableau::zero(2);
        tab.apply_h(0, 1.0, 0.0)
            .apply_cx(0, 1, 1.0, 0.0)
            .apply_h(0, 1.0, 0.0)
            .apply_h(1, 1.0, 0.0);
        // H ⊗ H maps the Bell state to itself
        let first = tab.measure(0, &mut rng);
        assert!(first.is_random());
        let second = tab.measure(1, &mut rng);
        assert!(second.is_deterministic());
        assert_eq!(first.bit(), second.bit());
        assert!(tab.validate());
    }

    #[test]
    fn random_measurement_statistics() {
        const TRIALS: usize = 10_000;
        let run = |seed: u64| -> Vec<bool> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..TRIALS)
                .map(|_| {
                    let mut tab = Tableau::zero(1);
                    tab.apply_h(0, 1.0, 0.0);
                    let out = tab.measure(0, &mut rng);
                    assert!(out.is_random());
                    out.bit()
                })
                .collect()
        };
        let outcomes = run(12345);
        let ones = outcomes.iter().filter(|b| **b).count();
        let frac = ones as f64 / TRIALS as f64;
        assert!((frac - 0.5).abs() < 0.03, "fraction of ones: {}", frac);
        assert_eq!(outcomes, run(12345));
    }

    #[test]
    fn collapse_is_repeatable() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let mut tab = Tableau::zero(3);
            tab.apply_h(0, 1.0, 0.0)
                .apply_cx(0, 1, 1.0, 0.0)
                .apply_cx(1, 2, 1.0, 0.0);
            let first = tab.measure(1, &mut rng);
            assert!(first.is_random());
            assert!(tab.validate());
            for q in 0..3 {
                let again = tab.measure(q, &mut rng);
                assert!(again.is_deterministic());
                assert_eq!(again.bit(), first.bit());
            }
        }
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut tab = Tableau::zero(2);
            tab.apply_h(0, 1.0, 0.0).apply_cx(0, 1, 1.0, 0.0);
            tab.reset(0, &mut rng);
            assert_eq!(tab.measure(0, &mut rng), Outcome::Det0);
            assert!(tab.validate());
        }
    }
}
