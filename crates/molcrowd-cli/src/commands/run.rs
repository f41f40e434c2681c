use crate::cli::RunArgs;
use crate::config::RunSpec;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use molcrowd::engine::arena::PackedSphereArena;
use molcrowd::engine::crowding::NullEnergy;
use molcrowd::engine::progress::ProgressReporter;
use molcrowd::workflows::crowd;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let spec = RunSpec::load(&args.scenario)?;
    let (config, subjects, file_seed) = spec.into_parts();
    let seed = args.seed.unwrap_or(file_seed);
    info!(seed, "Loaded scenario from {:?}", &args.scenario);

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.callback());
    let mut rng = StdRng::seed_from_u64(seed);
    // With no solver attached every proposal is accepted; the run samples
    // unbiased crowding configurations.
    let mut energy = NullEnergy;

    println!("Running crowding scenario...");
    let outcome = crowd::run(&config, &subjects, &mut energy, &mut rng, &reporter)?;

    println!(
        "✓ Search complete: {} accepted, {} rejected, final energy {:.4} kJ/mol",
        outcome.stats.accepted, outcome.stats.rejected, outcome.stats.final_energy
    );
    println!(
        "  {} occupied of {} cells (capacity {})",
        outcome.arena.occupied().count(),
        outcome.arena.cell_count(),
        outcome.arena.capacity()
    );

    if let Some(path) = &args.occupancy {
        write_occupancy_table(&outcome.arena, path)?;
        println!("  Occupancy table written to: {}", path.display());
    }
    if let Some(path) = &args.trace {
        write_energy_trace(&outcome.stats.energy_trace, path)?;
        println!("  Energy trace written to: {}", path.display());
    }

    Ok(())
}

// "x y z c s" table for R or matplotlib; rows carry a leading record number
// in the unnamed row-name column, as R's read.table expects. Positive kinds
// drop to their zero-based library index.
fn write_occupancy_table(arena: &PackedSphereArena, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .flexible(true)
        .from_path(path)?;
    writer.write_record(["x", "y", "z", "c", "s"])?;
    let s = arena.sphere_radius();
    for (record, (_, centre, occupant)) in arena.occupied().enumerate() {
        let c = if occupant.kind > 0 {
            occupant.kind - 1
        } else {
            occupant.kind
        };
        writer.write_record([
            (record + 1).to_string(),
            format!("{:.3}", centre.x),
            format!("{:.3}", centre.y),
            format!("{:.3}", centre.z),
            c.to_string(),
            format!("{:.3}", s),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_energy_trace(trace: &[f64], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["iteration", "energy"])?;
    for (i, e) in trace.iter().enumerate() {
        writer.write_record([i.to_string(), format!("{:.6}", e)])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use molcrowd::core::models::occupant::Occupant;
    use nalgebra::Point3;

    #[test]
    fn occupancy_table_has_header_and_one_row_per_occupant() {
        let mut arena = PackedSphereArena::new(1.0, 6.0, Point3::origin());
        let a = arena.vacancy(0).unwrap();
        let b = arena.vacancy(1).unwrap();
        arena.occupy(a, Occupant::new(2, 0)).unwrap();
        arena.occupy(b, Occupant::new(-1, 1)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupancy.txt");
        write_occupancy_table(&arena, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x y z c s");
        assert_eq!(lines.len(), 3);

        // subject kind 2 dropped to library index 1; crowder kind kept at -1
        let kinds: Vec<&str> = lines[1..]
            .iter()
            .map(|line| line.split(' ').nth(4).unwrap())
            .collect();
        assert!(kinds.contains(&"1"));
        assert!(kinds.contains(&"-1"));

        // every data row: record number plus x y z c s
        for line in &lines[1..] {
            assert_eq!(line.split(' ').count(), 6);
        }
    }

    #[test]
    fn energy_trace_is_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        write_energy_trace(&[0.5, -1.25], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "iteration,energy");
        assert_eq!(lines[1], "0,0.500000");
        assert_eq!(lines[2], "1,-1.250000");
    }
}
