use anyhow::Result;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use scenario_core::{
    complex_offers, cytosol_offers, membrane_offers, select_cell, with_selected, CompartmentKind,
    ElementKind, RunConfig, Scenario, Snapshot,
};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Scenario Engine (fate sampling runner)...");

    // --- Load Configuration ---
    let config = RunConfig::load("scenario.toml")?;

    // --- Load Scenario Document ---
    info!("Loading scenario from '{}'...", config.scenario.path);
    let document = std::fs::read_to_string(&config.scenario.path)?;
    let mut scenario: Scenario = serde_json::from_str(&document)?;
    // Lookup structures are never rebuilt implicitly on load.
    scenario.reindex()?;
    info!(
        "Scenario loaded: {} molecules, {} reactions, {} complexes, {} cells.",
        scenario.catalog.molecules().len(),
        scenario.catalog.reactions().len(),
        scenario.catalog.complexes().len(),
        scenario.cells().len()
    );

    // --- Prepare Fate Drivers ---
    // Every cell gets a death driver (created lazily with a sampled
    // initial state) and a distribution-driven alive->dead edge so the
    // sampling loop below has something to fire.
    let mut rng = StdRng::seed_from_u64(config.fate.sample_seed);
    for cell in scenario.cells_mut() {
        let driver = cell.configure_death_driver(&mut rng)?;
        if driver.element(0, 1)?.kind.is_molecular() {
            driver.switch_representation(0, 1)?;
        }
    }

    // --- Selection Lock ---
    // Mutations of the focused cell go through the advisory selection
    // lock shared with the background track-fitting job.
    let selection = scenario_core::new_shared_selection();
    if let Some(first) = scenario.cells().first() {
        select_cell(&selection, Some(&first.id));
        with_selected(&selection, |selected| {
            debug!("Focused cell for this run: {:?}", selected);
        });
    }

    // --- Fate Sampling Loop ---
    let total_steps = config.fate.steps;
    let record_interval_steps = config.fate.record_interval_steps;
    info!(
        "Sampling fate transitions for {} steps (recording every {}).",
        total_steps, record_interval_steps
    );
    let start_time = Instant::now();
    let mut recorded_snapshots: Vec<Snapshot> = Vec::new();

    // Initial snapshot (step 0).
    recorded_snapshots.push(record_snapshot(&scenario, 0));

    for step in 0..total_steps {
        let mut fired = 0u32;
        for cell in scenario.cells_mut() {
            let Some(driver) = cell.death_driver.as_mut() else {
                continue;
            };
            let current = driver.current_state();
            let state_count = driver.state_count();
            // Toy integrator: sample every distribution-driven edge
            // leaving the current state; a draw landing on the edge's
            // destination fires the transition. The real integrator
            // replaces this loop and writes the state back the same way.
            let mut next: Option<usize> = None;
            for j in 0..state_count {
                if j == current {
                    continue;
                }
                let element = driver.element(current, j)?;
                if let ElementKind::Distribution(params) = &element.kind {
                    let draw = params.sample(&mut rng, state_count)?;
                    if draw == element.dest_state {
                        next = Some(element.dest_state);
                        break;
                    }
                }
            }
            if let Some(dest) = next {
                driver.set_current_state(dest)?;
                fired += 1;
            }
        }

        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step == total_steps - 1;
        if is_record_step || is_last_step {
            debug!(
                "Step [{}/{}] | transitions fired this step: {}",
                step + 1,
                total_steps,
                fired
            );
            recorded_snapshots.push(record_snapshot(&scenario, step + 1));
        }
    }

    info!(
        "Fate sampling finished in {:.3} seconds.",
        start_time.elapsed().as_secs_f64()
    );

    // --- Save Recorded Data ---
    if config.output.save_snapshots {
        let output_format = config.output.format.as_deref().unwrap_or("json");
        save_snapshots(&recorded_snapshots, &config.output.base_filename, output_format);
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    // --- Save Compartment Summary ---
    if config.output.save_summary_csv {
        let filename = format!("{}_compartments.csv", config.output.base_filename);
        match write_summary_csv(&scenario, &filename) {
            Ok(()) => info!("Compartment summary saved to {}", filename),
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping compartment summary as per config.");
    }

    info!("Scenario Run Complete.");
    Ok(())
}

/// Collects the death-driver state occupancy across all cells.
fn record_snapshot(scenario: &Scenario, step: u32) -> Snapshot {
    let mut state_occupancy: BTreeMap<String, u32> = BTreeMap::new();
    for cell in scenario.cells() {
        if let Some(driver) = &cell.death_driver {
            *state_occupancy
                .entry(driver.current_state_name().to_string())
                .or_insert(0) += 1;
        }
    }
    Snapshot {
        step,
        cell_count: scenario.cells().len() as u32,
        state_occupancy,
    }
}

/// Writes the snapshot series in the configured format, mirroring the
/// json/bincode/messagepack fan-out of the output settings.
fn save_snapshots(snapshots: &[Snapshot], base_filename: &str, output_format: &str) {
    match output_format {
        "json" => {
            let filename = format!("{}_snapshots.json", base_filename);
            match File::create(&filename) {
                Ok(mut file) => match serde_json::to_string(snapshots) {
                    Ok(json_string) => {
                        if let Err(e) = file.write_all(json_string.as_bytes()) {
                            error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                        } else {
                            info!("All snapshots saved to {}", filename);
                        }
                    }
                    Err(e) => error!("Error serializing snapshots to JSON: {}", e),
                },
                Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
            }
        }
        "bincode" => {
            let filename = format!("{}_snapshots.bin", base_filename);
            match File::create(&filename) {
                Ok(file) => match bincode::serialize_into(file, snapshots) {
                    Ok(_) => info!("All snapshots saved to {} (binary format)", filename),
                    Err(e) => error!("Error serializing snapshots to bincode: {}", e),
                },
                Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
            }
        }
        "messagepack" => {
            let filename = format!("{}_snapshots.msgpack", base_filename);
            match &mut File::create(&filename) {
                Ok(file) => match rmp_serde::encode::write(file, &snapshots) {
                    Ok(_) => info!("All snapshots saved to {} (MessagePack format)", filename),
                    Err(e) => error!("Error serializing snapshots to MessagePack: {}", e),
                },
                Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
            }
        }
        _ => {
            warn!("Unknown output format: {}. Using JSON instead.", output_format);
            save_snapshots(snapshots, base_filename, "json");
        }
    }
}

/// Writes one CSV row per cell and compartment with membership counts
/// and the current availability-filter offer counts.
fn write_summary_csv(scenario: &Scenario, filename: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    writer.write_record([
        "cell_id",
        "compartment",
        "populations",
        "reactions",
        "complexes",
        "orphaned_complexes",
        "reaction_offers",
        "complex_offers",
    ])?;
    for cell in scenario.cells() {
        for kind in [CompartmentKind::Membrane, CompartmentKind::Cytosol] {
            let compartment = cell.compartment(kind);
            let reaction_offers = match kind {
                CompartmentKind::Cytosol => cytosol_offers(&scenario.catalog, cell).len(),
                CompartmentKind::Membrane => membrane_offers(&scenario.catalog, cell).len(),
            };
            writer.write_record([
                cell.id.clone(),
                kind.to_string(),
                compartment.populations().len().to_string(),
                compartment.reactions().len().to_string(),
                compartment.complexes().len().to_string(),
                compartment.orphaned_complexes().len().to_string(),
                reaction_offers.to_string(),
                complex_offers(&scenario.catalog, compartment)
                    .len()
                    .to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
