pub mod catalog;
pub mod cell;
pub mod compartment;
pub mod config;
pub mod error;
pub mod filter;
pub mod scenario;
pub mod snapshot;
pub mod transition;

// Re-export key types for easier use by dependent crates
pub use catalog::{EntityCatalog, Gene, Molecule, MoleculeLocation, Reaction, ReactionComplex, ReactionKind};
pub use cell::{AddOutcome, CascadeOutcome, Cell, DEFAULT_DEATH_STATES};
pub use compartment::{Compartment, CompartmentKind, ConcentrationSpec, DisplayInfo, MolecularPopulation};
pub use config::{FateRunConfig, OutputConfig, RunConfig, ScenarioFileConfig};
pub use error::{EntityKind, Result, ScenarioError};
pub use filter::{classify, complex_offers, cytosol_offers, is_eligible_complex, is_eligible_for_cytosol, is_eligible_for_membrane, membrane_offers, molecule_offers, RefPartition};
pub use scenario::{new_shared_selection, select_cell, with_selected, Scenario, SharedSelection};
pub use snapshot::Snapshot;
pub use transition::{
    DistributionKind, DistributionParams, DriverRow, ElementKind, MolecularParams, MolecularSignal,
    TransitionDriver, TransitionDriverElement, TransitionScheme, DEFAULT_POISSON_MEAN,
};
