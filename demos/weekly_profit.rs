//! One seeded week of operation, printed as the metric table.
//!
//! `RUST_LOG=debug cargo run --bin weekly_profit` traces every grant, hold
//! and stock take of the run.

use pizzasim::{get_metrics, run};

fn main() -> Result<(), String> {
    env_logger::init();

    let handle = run(168.0, 7, None)?;

    println!(
        "run {} over {:.0} h ({:?})",
        handle.id, handle.horizon_hours, handle.outcome
    );
    println!();
    for (name, value) in get_metrics(&handle) {
        println!("{:<38} {:>16.4}", name, value);
    }

    println!();
    println!("facility peaks:");
    for usage in &handle.facilities.resources {
        println!(
            "  {:<22} {:>3} / {:<3}",
            usage.name, usage.peak_in_use, usage.capacity
        );
    }
    println!("stock excursions:");
    for usage in &handle.facilities.bins {
        println!(
            "  {:<22} min {:>9.1}  max {:>9.1}  (capacity {:.0})",
            usage.name, usage.min_level, usage.max_level, usage.capacity
        );
    }
    Ok(())
}
