use crate::cli::ArenaArgs;
use crate::config::RunSpec;
use crate::error::Result;
use molcrowd::engine::arena::PackedSphereArena;
use tracing::info;

/// Builds the scenario's arena without running anything, as a quick check of
/// the geometry a run would start from.
pub fn run(args: ArenaArgs) -> Result<()> {
    let spec = RunSpec::load(&args.scenario)?;
    let (config, subjects, _) = spec.into_parts();

    let a = config.packing_radius();
    let arena = PackedSphereArena::new(a, config.arena_radius, config.centre);
    info!(
        packing_radius = a,
        cells = arena.cell_count(),
        "arena built"
    );

    println!("Arena geometry for {}", args.scenario.display());
    println!("  packing radius : {:.3}", arena.sphere_radius());
    println!("  boundary radius: {:.3}", arena.radius());
    println!(
        "  centre         : ({:.3}, {:.3}, {:.3})",
        arena.centre().x,
        arena.centre().y,
        arena.centre().z
    );
    println!("  cells          : {}", arena.cell_count());
    println!("  capacity       : {}", arena.capacity());
    println!("  volume         : {:.3}", arena.volume());
    println!("  subjects       : {}", subjects.len());

    Ok(())
}
