//! Abstractions for driving circuits over a register of qubits whose state is
//! split across independent tableaus.
//!
//! Every qubit starts in its own one-qubit subsystem. Subsystems are joined
//! with [`Tableau::merged_with`] the first time an operation spans more than
//! one of them, so unentangled parts of the register never pay for each
//! other's size.

use rand::{ rngs::StdRng, SeedableRng };
use rustc_hash::FxHashMap;
use tracing::debug;
use crate::{
    dispatch::{ Decompose, GateDispatcher, StandardDecomposer },
    error::{ TableauError, TableauResult },
    gate::{ Gate, Operation },
    measure::Outcome,
    tableau::{ basis_bit, check_basis_state, Tableau },
};

// one independently tracked group of qubits; `qubits[k]` is the logical qubit
// stored in column `k`
#[derive(Clone, Debug)]
struct Subsystem {
    tableau: Tableau,
    qubits: Vec<usize>,
}

/// Main driver for replaying operations on a register of `n` logical qubits.
#[derive(Clone, Debug)]
pub struct Simulation<D = StandardDecomposer> {
    n: usize,
    subsystems: Vec<Subsystem>,
    // logical qubit -> (subsystem, column)
    owner: FxHashMap<usize, (usize, usize)>,
    dispatcher: GateDispatcher<D>,
    outcomes: Vec<(usize, Outcome)>,
    rng: StdRng,
}

impl Simulation {
    /// Create a new `Simulation` of `n` qubits initialized to the
    /// computational basis state whose big-endian binary representation is
    /// `initial_state`, with no recorded outcomes. Optionally also seed the
    /// internal random number generator.
    ///
    /// Fails if `initial_state` does not fit in `n` bits.
    pub fn new(n: usize, initial_state: u64, seed: Option<u64>)
        -> TableauResult<Self>
    {
        check_basis_state(initial_state, n)?;
        let subsystems: Vec<Subsystem>
            = (0..n)
            .map(|q| {
                let bit = u64::from(basis_bit(initial_state, n, q));
                Tableau::new(1, bit)
                    .map(|tableau| Subsystem { tableau, qubits: vec![q] })
            })
            .collect::<TableauResult<_>>()?;
        let owner: FxHashMap<usize, (usize, usize)>
            = (0..n).map(|q| (q, (q, 0))).collect();
        let rng
            = seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        Ok(Self {
            n,
            subsystems,
            owner,
            dispatcher: GateDispatcher::new(),
            outcomes: Vec::new(),
            rng,
        })
    }
}

impl<D> Simulation<D>
where D: Decompose
{
    /// Replace the gate dispatcher.
    pub fn with_dispatcher<E>(self, dispatcher: GateDispatcher<E>) -> Simulation<E>
    where E: Decompose
    {
        Simulation {
            n: self.n,
            subsystems: self.subsystems,
            owner: self.owner,
            dispatcher,
            outcomes: self.outcomes,
            rng: self.rng,
        }
    }

    /// Return the number of logical qubits.
    pub fn n(&self) -> usize { self.n }

    /// Return the number of independently tracked subsystems.
    pub fn num_subsystems(&self) -> usize { self.subsystems.len() }

    /// Return every recorded measurement as `(qubit, outcome)`, in order.
    pub fn outcomes(&self) -> &[(usize, Outcome)] { &self.outcomes }

    fn locate(&self, q: usize) -> TableauResult<(usize, usize)> {
        self.owner.get(&q)
            .copied()
            .ok_or(TableauError::QubitOutOfRange { qubit: q, n: self.n })
    }

    // the subsystems holding `qubits`, in ascending order
    fn slots_of(&self, qubits: &[usize]) -> TableauResult<Vec<usize>> {
        let mut slots: Vec<usize>
            = qubits.iter()
            .map(|q| self.locate(*q).map(|(slot, _)| slot))
            .collect::<TableauResult<_>>()?;
        slots.sort_unstable();
        slots.dedup();
        Ok(slots)
    }

    // replace the subsystems at `slots` (ascending, non-empty) with `joint`,
    // stored in the lowest-numbered one
    fn commit_join(&mut self, slots: &[usize], joint: Subsystem) {
        let first = slots[0];
        for &slot in slots[1..].iter().rev() {
            self.subsystems.swap_remove(slot);
            if slot < self.subsystems.len() {
                for q in self.subsystems[slot].qubits.iter() {
                    if let Some(entry) = self.owner.get_mut(q) { entry.0 = slot; }
                }
            }
        }
        for (k, q) in joint.qubits.iter().enumerate() {
            self.owner.insert(*q, (first, k));
        }
        self.subsystems[first] = joint;
    }

    /// Apply a single operation, returning the outcome if it was a
    /// measurement or reset.
    ///
    /// Subsystems touched by `op` are merged first. The merge is kept only if
    /// the operation succeeds; on failure every subsystem is left as it was.
    /// An operation on no qubits (a global phase) is applied to the first
    /// subsystem, if there is one.
    pub fn apply(&mut self, op: &Operation) -> TableauResult<Option<Outcome>> {
        op.check(self.n)?;
        match op.gate {
            Gate::Measure => { return self.measure(op.qubits[0]).map(Some); },
            Gate::Reset => { return self.reset(op.qubits[0]).map(Some); },
            _ => { },
        }
        if op.qubits.is_empty() {
            if let Some(sub) = self.subsystems.first_mut() {
                self.dispatcher.apply(&mut sub.tableau, op, &mut self.rng)?;
            }
            return Ok(None);
        }
        let slots = self.slots_of(&op.qubits)?;
        if let [slot] = slots[..] {
            let local: Vec<usize>
                = op.qubits.iter()
                .map(|q| self.locate(*q).map(|(_, col)| col))
                .collect::<TableauResult<_>>()?;
            let local_op = op.with_qubits(local);
            // the dispatcher leaves the tableau unchanged on failure
            self.dispatcher.apply(
                &mut self.subsystems[slot].tableau, &local_op, &mut self.rng)?;
            return Ok(None);
        }

        // merge into a copy, committed only once the operation succeeds
        let mut joint = self.subsystems[slots[0]].clone();
        let mut offsets: FxHashMap<usize, usize> = FxHashMap::default();
        offsets.insert(slots[0], 0);
        for &slot in slots[1..].iter() {
            let sub = &self.subsystems[slot];
            debug!(left = ?joint.qubits, right = ?sub.qubits, "merging subsystems");
            offsets.insert(slot, joint.qubits.len());
            joint.tableau = joint.tableau.merged_with(&sub.tableau);
            joint.qubits.extend(sub.qubits.iter().copied());
        }
        let local: Vec<usize>
            = op.qubits.iter()
            .map(|q| {
                let (slot, col) = self.locate(*q)?;
                Ok(offsets.get(&slot).copied().unwrap_or(0) + col)
            })
            .collect::<TableauResult<_>>()?;
        let local_op = op.with_qubits(local);
        self.dispatcher.apply(&mut joint.tableau, &local_op, &mut self.rng)?;
        self.commit_join(&slots, joint);
        Ok(None)
    }

    /// Apply a sequence of operations, stopping at the first failure.
    pub fn run<'a, I>(&mut self, ops: I) -> TableauResult<()>
    where I: IntoIterator<Item = &'a Operation>
    {
        ops.into_iter().try_for_each(|op| self.apply(op).map(|_| ()))
    }

    /// Run rounds of operations chosen by feedback on measurement outcomes.
    ///
    /// At each round, the outcomes recorded during the previous round are
    /// passed to the supplied closure along with the round number to
    /// determine when to halt or what to apply next. For the first round, an
    /// empty slice is passed.
    ///
    /// Returns the number of rounds that were run.
    pub fn run_feedback<F>(&mut self, mut feedback: F) -> TableauResult<usize>
    where F: FnMut(usize, &[(usize, Outcome)]) -> Feedback
    {
        let mut start: usize = self.outcomes.len();
        let mut d: usize = 0;
        loop {
            match feedback(d, &self.outcomes[start..]) {
                Feedback::Halt => { break Ok(d); },
                Feedback::Ops(ops) => {
                    start = self.outcomes.len();
                    self.run(&ops)?;
                },
            }
            d += 1;
        }
    }

    /// Perform a projective measurement on qubit `q` in the Z-basis and
    /// record the outcome.
    pub fn measure(&mut self, q: usize) -> TableauResult<Outcome> {
        let (slot, col) = self.locate(q)?;
        let outcome = self.subsystems[slot].tableau.measure(col, &mut self.rng);
        self.outcomes.push((q, outcome));
        Ok(outcome)
    }

    /// Reset qubit `q` to ∣0⟩, returning the outcome of the intermediate
    /// measurement. The outcome is not recorded.
    pub fn reset(&mut self, q: usize) -> TableauResult<Outcome> {
        let (slot, col) = self.locate(q)?;
        Ok(self.subsystems[slot].tableau.reset(col, &mut self.rng))
    }

    /// Return the state of the whole register as a single tableau, with
    /// columns in logical qubit order.
    pub fn tableau(&self) -> Tableau {
        let mut joint = Tableau::zero(0);
        let mut order: Vec<usize> = Vec::with_capacity(self.n);
        for sub in self.subsystems.iter() {
            joint = joint.merged_with(&sub.tableau);
            order.extend(sub.qubits.iter().copied());
        }
        for target in 0..self.n {
            if let Some(col) = order.iter().position(|q| *q == target) {
                joint.swap_labels(col, target);
                order.swap(col, target);
            }
        }
        joint
    }
}

/// Post-measurement determination for [`Simulation::run_feedback`].
#[derive(Clone, Debug)]
pub enum Feedback {
    Halt,
    Ops(Vec<Operation>),
}
