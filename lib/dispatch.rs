//! Realization of arbitrary [`Operation`]s as sequences of tableau updates.
//!
//! A [`GateDispatcher`] tries a fixed, ordered list of [`Strategy`]s and stops
//! at the first one that applies:
//! 1. **Direct**: the gate is one of the tableau's own mutators, with a
//!    Clifford exponent.
//! 1. **Mixture**: the gate is a probability-weighted list of unitaries; one
//!    is sampled and handed to the single-qubit strategy.
//! 1. **SingleQubit**: the gate has a known 2 × 2 unitary that can be matched
//!    to a Clifford operation, which is then applied as quarter-turn
//!    rotations.
//! 1. **Decompose**: an external [`Decompose`] oracle breaks the operation
//!    into smaller ones, each of which is dispatched in turn.
//!
//! If every strategy declines, the operation is reported as
//! [`TableauError::UnsupportedOperation`].

use itertools::Itertools;
use nalgebra as na;
use num_complex::Complex64 as C64;
use rand::{
    distributions::{ Distribution, WeightedIndex },
    Rng,
};
use tracing::{ debug, trace };
use crate::{
    clifford::{ self, SingleQubitClifford },
    error::{ TableauError, TableauResult },
    gate::{ Gate, Operation, Pow },
    tableau::Tableau,
};

/// Numerical parameters for a [`GateDispatcher`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DispatchConfig {
    /// Absolute tolerance, per matrix entry, for deciding that a matrix is
    /// unitary and that a conjugated Pauli matches a signed Pauli.
    pub atol: f64,
    /// Maximum nesting of recursive decompositions.
    pub max_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self { Self { atol: 1e-8, max_depth: 32 } }
}

impl DispatchConfig {
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A single way of realizing an operation on a tableau.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    Mixture,
    SingleQubit,
    Decompose,
}

impl Strategy {
    /// The order in which strategies are tried.
    pub const ORDER: [Self; 4]
        = [Self::Direct, Self::Mixture, Self::SingleQubit, Self::Decompose];
}

// three-way result of a single strategy
#[derive(Debug)]
enum Strat {
    Applied(Strategy),
    NotApplicable,
    Failed(TableauError),
}

/// An oracle that breaks an operation into simpler ones.
///
/// Returned sub-operations must act only on qubits of the original operation.
/// Returning `None` means the operation cannot be broken down any further.
pub trait Decompose {
    fn decompose(&self, op: &Operation) -> Option<Vec<Operation>>;
}

impl<F> Decompose for F
where F: Fn(&Operation) -> Option<Vec<Operation>>
{
    fn decompose(&self, op: &Operation) -> Option<Vec<Operation>> { self(op) }
}

/// Oracle that never decomposes anything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoDecompose;

impl Decompose for NoDecompose {
    fn decompose(&self, _op: &Operation) -> Option<Vec<Operation>> { None }
}

/// Oracle for the built-in two-qubit gates that have no direct tableau
/// update.
///
/// - iSWAP<sup>*k*</sup> for integer *k*: *k* mod 4 rounds of (S ⊗ S), CZ,
///   SWAP.
/// - CY<sup>*k*</sup> for integer *k*: S<sup>†</sup> on the target, CX, S on
///   the target if *k* is odd; nothing otherwise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StandardDecomposer;

impl Decompose for StandardDecomposer {
    fn decompose(&self, op: &Operation) -> Option<Vec<Operation>> {
        match (&op.gate, op.qubits.as_slice()) {
            (Gate::ISwap(p), &[a, b]) => {
                let k = p.integer_mod(4)?;
                let ops: Vec<Operation>
                    = (0..k)
                    .flat_map(|_| [
                        Operation::s(a),
                        Operation::s(b),
                        Operation::cz(a, b),
                        Operation::swap(a, b),
                    ])
                    .collect();
                Some(ops)
            },
            (Gate::CY(p), &[c, t]) => {
                if p.half_turns()? == 1 {
                    Some(vec![Operation::sdg(t), Operation::cx(c, t), Operation::s(t)])
                } else {
                    Some(Vec::new())
                }
            },
            _ => None,
        }
    }
}

/// Routes operations to tableau updates through an ordered chain of
/// [`Strategy`]s.
#[derive(Clone, Debug)]
pub struct GateDispatcher<D = StandardDecomposer> {
    config: DispatchConfig,
    decomposer: D,
}

impl Default for GateDispatcher {
    fn default() -> Self { Self::new() }
}

impl GateDispatcher {
    /// Create a new dispatcher with default configuration and the
    /// [`StandardDecomposer`] oracle.
    pub fn new() -> Self {
        Self::with_decomposer(DispatchConfig::default(), StandardDecomposer)
    }
}

impl<D> GateDispatcher<D>
where D: Decompose
{
    /// Create a new dispatcher with a custom decomposition oracle.
    pub fn with_decomposer(config: DispatchConfig, decomposer: D) -> Self {
        Self { config, decomposer }
    }

    pub fn config(&self) -> &DispatchConfig { &self.config }

    /// Apply `op` to `tableau`, returning the strategy that realized it.
    ///
    /// Randomness is drawn from `rng` only for mixture sampling. If the
    /// operation cannot be realized, `tableau` is left as it was. Measurement
    /// and reset are not gates and are rejected here; see
    /// [`Tableau::measure`] and [`Tableau::reset`].
    pub fn apply<R>(&self, tableau: &mut Tableau, op: &Operation, rng: &mut R)
        -> TableauResult<Strategy>
    where R: Rng + ?Sized
    {
        op.check(tableau.n())?;
        match self.apply_at(tableau, op, rng, 0) {
            Strat::Applied(strategy) => Ok(strategy),
            Strat::NotApplicable
                => Err(TableauError::UnsupportedOperation(op.to_string())),
            Strat::Failed(err) => Err(err),
        }
    }

    fn apply_at<R>(&self, tab: &mut Tableau, op: &Operation, rng: &mut R, depth: usize)
        -> Strat
    where R: Rng + ?Sized
    {
        for strategy in Strategy::ORDER {
            let res = match strategy {
                Strategy::Direct => Self::strat_direct(tab, op),
                Strategy::Mixture => self.strat_mixture(tab, op, rng),
                Strategy::SingleQubit => self.strat_single_qubit(tab, op),
                Strategy::Decompose => self.strat_decompose(tab, op, rng, depth),
            };
            match res {
                Strat::NotApplicable => {
                    trace!(op = %op, ?strategy, depth, "not applicable");
                },
                Strat::Applied(_) => {
                    trace!(op = %op, ?strategy, depth, "applied");
                    return res;
                },
                Strat::Failed(ref err) => {
                    trace!(op = %op, ?strategy, depth, %err, "failed");
                    return res;
                },
            }
        }
        Strat::NotApplicable
    }

    fn strat_direct(tab: &mut Tableau, op: &Operation) -> Strat {
        let q = op.qubits.as_slice();
        match &op.gate {
            Gate::X(p) if p.quarter_turns().is_some()
                => { tab.apply_x(q[0], p.exponent, p.global_shift); },
            Gate::Y(p) if p.quarter_turns().is_some()
                => { tab.apply_y(q[0], p.exponent, p.global_shift); },
            Gate::Z(p) if p.quarter_turns().is_some()
                => { tab.apply_z(q[0], p.exponent, p.global_shift); },
            Gate::H(p) if p.half_turns().is_some()
                => { tab.apply_h(q[0], p.exponent, p.global_shift); },
            Gate::CX(p) if p.half_turns().is_some()
                => { tab.apply_cx(q[0], q[1], p.exponent, p.global_shift); },
            Gate::CZ(p) if p.half_turns().is_some()
                => { tab.apply_cz(q[0], q[1], p.exponent, p.global_shift); },
            Gate::Swap(p) if p.half_turns().is_some()
                => { tab.apply_swap(q[0], q[1], p.exponent, p.global_shift); },
            Gate::GlobalPhase(c) => { tab.apply_global_phase(*c); },
            _ => { return Strat::NotApplicable; },
        }
        Strat::Applied(Strategy::Direct)
    }

    fn strat_mixture<R>(&self, tab: &mut Tableau, op: &Operation, rng: &mut R)
        -> Strat
    where R: Rng + ?Sized
    {
        let Gate::Mixture(mixture) = &op.gate else { return Strat::NotApplicable; };
        let dim = 1_usize << op.qubits.len();
        let all_unitary
            = !mixture.is_empty()
            && (dim == 2 || dim == 4)
            && mixture.iter()
                .all(|(_, u)| {
                    u.shape() == (dim, dim) && clifford::is_unitary(u, self.config.atol)
                });
        if !all_unitary { return Strat::NotApplicable; }
        let dist = match WeightedIndex::new(mixture.iter().map(|(p, _)| *p)) {
            Ok(dist) => dist,
            Err(err) => {
                return Strat::Failed(TableauError::InvalidMixture(err.to_string()));
            },
        };
        let k = dist.sample(rng);
        trace!(op = %op, choice = k, "sampled mixture");
        let chosen = Operation::matrix(mixture[k].1.clone(), op.qubits.iter().copied());
        match self.strat_single_qubit(tab, &chosen) {
            Strat::Applied(_) => Strat::Applied(Strategy::Mixture),
            other => other,
        }
    }

    fn strat_single_qubit(&self, tab: &mut Tableau, op: &Operation) -> Strat {
        if op.qubits.len() != 1 { return Strat::NotApplicable; }
        let Some(u) = op.gate.unitary() else { return Strat::NotApplicable; };
        let Some(cliff) = SingleQubitClifford::from_unitary(&u, self.config.atol)
            else { return Strat::NotApplicable; };
        let q = op.qubits[0];
        let mut fin: na::DMatrix<C64> = na::DMatrix::identity(2, 2);
        for (axis, quarters) in cliff.decompose_rotation() {
            let exponent = f64::from(quarters) / 2.0;
            tab.apply_rotation(axis, q, exponent);
            fin = clifford::rotation_unitary(axis, Pow::exp(exponent)) * fin;
        }
        // residual phase, taken at the entry of largest magnitude
        let k = u.iter()
            .position_max_by(|a, b| a.norm().total_cmp(&b.norm()))
            .unwrap_or(0);
        tab.apply_global_phase(u[k] / fin[k]);
        Strat::Applied(Strategy::SingleQubit)
    }

    fn strat_decompose<R>(
        &self,
        tab: &mut Tableau,
        op: &Operation,
        rng: &mut R,
        depth: usize,
    ) -> Strat
    where R: Rng + ?Sized
    {
        let Some(sub_ops) = self.decomposer.decompose(op)
            else { return Strat::NotApplicable; };
        if depth >= self.config.max_depth {
            return Strat::Failed(TableauError::DecompositionDepth(self.config.max_depth));
        }
        if let Some(bad) = sub_ops.iter()
            .find(|sub| sub.qubits.iter().any(|q| !op.qubits.contains(q)))
        {
            return Strat::Failed(TableauError::InvalidDecomposition(
                format!("{} is not within the qubits of {}", bad, op)
            ));
        }
        debug!(op = %op, depth, parts = sub_ops.len(), "decomposing");
        let snapshot = tab.copy();
        for sub in sub_ops.iter() {
            let res = match sub.check(tab.n()) {
                Ok(()) => self.apply_at(tab, sub, rng, depth + 1),
                Err(err) => Strat::Failed(err),
            };
            match res {
                Strat::Applied(_) => { },
                other => {
                    debug!(op = %op, sub = %sub, depth, "rolling back decomposition");
                    *tab = snapshot;
                    return other;
                },
            }
        }
        Strat::Applied(Strategy::Decompose)
    }
}
