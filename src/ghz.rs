use clap::Parser;
use clifford_tableau::{
    error::TableauResult,
    gate::Operation,
    sim::Simulation,
};
use tracing_subscriber::EnvFilter;

/// Prepare an n-qubit GHZ state, print its tableau, and measure every qubit.
#[derive(Parser, Debug)]
#[command(name = "ghz")]
struct Args {
    /// Number of qubits
    #[arg(default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    n: u16,

    /// Seed for the measurement RNG; drawn from entropy if omitted
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> TableauResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let n = usize::from(args.n);
    let seed = args.seed;

    let mut sim = Simulation::new(n, 0, seed)?;
    let mut ops: Vec<Operation> = vec![Operation::h(0)];
    ops.extend((1..n).map(|k| Operation::cx(k - 1, k)));
    sim.run(&ops)?;

    println!("stabilizers:");
    println!("{}", sim.tableau());
    println!("stabilizers | destabilizers:");
    println!("{:#}", sim.tableau());

    (0..n).try_for_each(|q| sim.measure(q).map(|_| ()))?;
    let bits: String
        = sim.outcomes().iter()
        .map(|(_, outcome)| outcome.to_string())
        .collect();
    let kinds: String
        = sim.outcomes().iter()
        .map(|(_, outcome)| if outcome.is_random() { 'r' } else { 'd' })
        .collect();
    println!("outcomes: {}", bits);
    println!("kinds:    {}", kinds);
    Ok(())
}
