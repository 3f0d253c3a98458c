use crate::catalog::EntityCatalog;
use crate::compartment::{Compartment, CompartmentKind, MolecularPopulation};
use crate::error::{EntityKind, Result, ScenarioError};
use crate::filter;
use crate::transition::{TransitionDriver, TransitionScheme};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default state pair synthesized when a death driver is first configured.
pub const DEFAULT_DEATH_STATES: [&str; 2] = ["alive", "dead"];

/// Result of an add command. Re-adding an existing member is a no-op,
/// not an error; a candidate failing its eligibility predicate is
/// rejected without touching the compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
    Rejected,
}

/// Structured diff returned by [`Cell::remove_population`]: the removed
/// population plus every reaction instance purged from either
/// compartment because it referenced the molecule.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub molecule_id: String,
    pub removed_population: Option<MolecularPopulation>,
    pub removed_reactions: Vec<(CompartmentKind, String)>,
}

/// A simulated cell: one membrane and one cytosol compartment, the gene
/// set of its nucleus, and optional fate machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub name: String,
    pub membrane: Compartment,
    pub cytosol: Compartment,
    pub genes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_driver: Option<TransitionDriver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<TransitionScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiation: Option<TransitionScheme>,
}

impl Cell {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Cell {
            id: id.into(),
            name: name.into(),
            membrane: Compartment::new(CompartmentKind::Membrane),
            cytosol: Compartment::new(CompartmentKind::Cytosol),
            genes: BTreeSet::new(),
            death_driver: None,
            division: None,
            differentiation: None,
        }
    }

    pub fn compartment(&self, kind: CompartmentKind) -> &Compartment {
        match kind {
            CompartmentKind::Membrane => &self.membrane,
            CompartmentKind::Cytosol => &self.cytosol,
        }
    }

    pub fn compartment_mut(&mut self, kind: CompartmentKind) -> &mut Compartment {
        match kind {
            CompartmentKind::Membrane => &mut self.membrane,
            CompartmentKind::Cytosol => &mut self.cytosol,
        }
    }

    // --- Nucleus content ---

    /// Adds a catalog gene to the cell nucleus.
    pub fn add_gene(&mut self, catalog: &EntityCatalog, gene_id: &str) -> Result<AddOutcome> {
        catalog.gene(gene_id)?;
        if !self.genes.insert(gene_id.to_string()) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        Ok(AddOutcome::Added)
    }

    pub fn remove_gene(&mut self, gene_id: &str) -> bool {
        self.genes.remove(gene_id)
    }

    // --- Add commands (each re-validates before insertion) ---

    /// Admits a molecular population into a compartment. The molecule
    /// must exist in the catalog; a molecule already held there makes
    /// this a no-op.
    pub fn add_population(
        &mut self,
        kind: CompartmentKind,
        catalog: &EntityCatalog,
        population: MolecularPopulation,
    ) -> Result<AddOutcome> {
        catalog.molecule(&population.molecule_id)?;
        if self.compartment(kind).has_molecule(&population.molecule_id) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        log::debug!(
            "Cell '{}': adding population '{}' to {}.",
            self.id,
            population.molecule_id,
            kind
        );
        self.compartment_mut(kind).insert_population(population);
        Ok(AddOutcome::Added)
    }

    /// Admits a catalog reaction into a compartment as a local clone,
    /// re-checking the matching eligibility predicate first.
    pub fn add_reaction(
        &mut self,
        kind: CompartmentKind,
        catalog: &EntityCatalog,
        reaction_id: &str,
    ) -> Result<AddOutcome> {
        let reaction = catalog.reaction(reaction_id)?;
        if self.compartment(kind).has_reaction(reaction_id) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        let eligible = match kind {
            CompartmentKind::Cytosol => filter::is_eligible_for_cytosol(reaction, catalog, self),
            CompartmentKind::Membrane => filter::is_eligible_for_membrane(reaction, self),
        };
        if !eligible {
            log::debug!(
                "Cell '{}': reaction '{}' rejected for {}.",
                self.id,
                reaction_id,
                kind
            );
            return Ok(AddOutcome::Rejected);
        }
        let instance = reaction.clone();
        self.compartment_mut(kind).insert_reaction(instance);
        Ok(AddOutcome::Added)
    }

    /// Admits a catalog complex into a compartment as a local clone,
    /// re-checking that every constituent reaction is already a member.
    pub fn add_complex(
        &mut self,
        kind: CompartmentKind,
        catalog: &EntityCatalog,
        complex_id: &str,
    ) -> Result<AddOutcome> {
        let complex = catalog.complex(complex_id)?;
        let compartment = self.compartment(kind);
        if compartment.has_complex(complex_id) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        if !filter::is_eligible_complex(complex, compartment) {
            return Ok(AddOutcome::Rejected);
        }
        let instance = complex.clone();
        self.compartment_mut(kind).insert_complex(instance);
        Ok(AddOutcome::Added)
    }

    // --- Remove commands ---

    /// Removes a reaction instance by id. Never cascades further; a
    /// complex left referencing the removed reaction is kept and shows
    /// up in [`Compartment::orphaned_complexes`].
    pub fn remove_reaction(
        &mut self,
        kind: CompartmentKind,
        reaction_id: &str,
    ) -> Option<crate::catalog::Reaction> {
        self.compartment_mut(kind).take_reaction(reaction_id)
    }

    /// Removes a complex instance by id.
    pub fn remove_complex(
        &mut self,
        kind: CompartmentKind,
        complex_id: &str,
    ) -> Option<crate::catalog::ReactionComplex> {
        self.compartment_mut(kind).take_complex(complex_id)
    }

    /// Removes a molecular population and cascades: every reaction in
    /// *either* compartment of this cell whose reactant/product/modifier
    /// set contains the molecule id is purged, regardless of which
    /// compartment the population was removed from.
    ///
    /// This is the only path by which a reaction is removed as a side
    /// effect of molecule removal.
    pub fn remove_population(
        &mut self,
        kind: CompartmentKind,
        molecule_id: &str,
    ) -> CascadeOutcome {
        let removed_population = self.compartment_mut(kind).take_population(molecule_id);
        let mut removed_reactions = Vec::new();
        for side in [CompartmentKind::Cytosol, CompartmentKind::Membrane] {
            let compartment = self.compartment_mut(side);
            for reaction_id in compartment.reactions_referencing(molecule_id) {
                compartment.take_reaction(&reaction_id);
                removed_reactions.push((side, reaction_id));
            }
        }
        if !removed_reactions.is_empty() {
            log::info!(
                "Cell '{}': removing '{}' cascaded to {} dependent reaction(s).",
                self.id,
                molecule_id,
                removed_reactions.len()
            );
        }
        CascadeOutcome {
            molecule_id: molecule_id.to_string(),
            removed_population,
            removed_reactions,
        }
    }

    // --- Fate machinery (created lazily on first configuration) ---

    /// Returns the death driver, creating it on first use with the
    /// default state pair and a sampled initial state.
    pub fn configure_death_driver<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&mut TransitionDriver> {
        if self.death_driver.is_none() {
            let states = DEFAULT_DEATH_STATES.iter().map(|s| s.to_string()).collect();
            let mut driver = TransitionDriver::new(states)?;
            let initial = driver.sample_initial_state(rng)?;
            log::debug!(
                "Cell '{}': death driver created, initial state '{}'.",
                self.id,
                driver.states()[initial]
            );
            self.death_driver = Some(driver);
        }
        Ok(self.death_driver.as_mut().expect("set above"))
    }

    /// Returns the division scheme, creating it over `states` on first
    /// use. Fails with `InsufficientStates` when fewer than two states
    /// are supplied for the initial configuration.
    pub fn configure_division(&mut self, states: Vec<String>) -> Result<&mut TransitionScheme> {
        if self.division.is_none() {
            self.division = Some(TransitionScheme::new(states)?);
        }
        Ok(self.division.as_mut().expect("set above"))
    }

    /// Returns the differentiation scheme, creating it over `states` on
    /// first use.
    pub fn configure_differentiation(
        &mut self,
        states: Vec<String>,
    ) -> Result<&mut TransitionScheme> {
        if self.differentiation.is_none() {
            self.differentiation = Some(TransitionScheme::new(states)?);
        }
        Ok(self.differentiation.as_mut().expect("set above"))
    }

    /// Drops a fate scheme; its driver and elements go with it.
    pub fn clear_division(&mut self) {
        self.division = None;
    }

    pub fn clear_differentiation(&mut self) {
        self.differentiation = None;
    }

    pub fn clear_death_driver(&mut self) {
        self.death_driver = None;
    }

    /// Validates that every id this cell references resolves in the
    /// catalog (or, for reaction references, to a gene). Used by the
    /// scenario-level reindex after load.
    pub(crate) fn validate_references(&self, catalog: &EntityCatalog) -> Result<()> {
        for gene_id in &self.genes {
            catalog.gene(gene_id)?;
        }
        for compartment in [&self.membrane, &self.cytosol] {
            for molecule_id in compartment.molecule_ids() {
                catalog.molecule(molecule_id)?;
            }
            for reaction in compartment.reactions().values() {
                for id in reaction.referenced_ids() {
                    if catalog.find_molecule(id).is_none() && catalog.find_gene(id).is_none() {
                        return Err(ScenarioError::ReferenceNotFound {
                            kind: EntityKind::Molecule,
                            id: id.to_string(),
                        });
                    }
                }
            }
            for complex in compartment.complexes().values() {
                for reaction_id in &complex.reactions {
                    catalog.reaction(reaction_id)?;
                }
            }
        }
        if let Some(driver) = &self.death_driver {
            driver.validate()?;
        }
        for scheme in [&self.division, &self.differentiation].into_iter().flatten() {
            scheme.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Gene, Molecule, MoleculeLocation, Reaction, ReactionKind};
    use crate::compartment::ConcentrationSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn molecule(id: &str, location: MoleculeLocation) -> Molecule {
        Molecule {
            id: id.to_string(),
            name: id.to_string(),
            location,
            predefined: false,
        }
    }

    fn reaction(id: &str, reactants: &[&str], products: &[&str]) -> Reaction {
        Reaction {
            id: id.to_string(),
            name: id.to_string(),
            kind: ReactionKind::Association,
            reactants: reactants.iter().map(|s| s.to_string()).collect(),
            products: products.iter().map(|s| s.to_string()).collect(),
            modifiers: vec![],
            rate_constant: 1.0,
            predefined: false,
        }
    }

    fn population(id: &str) -> MolecularPopulation {
        MolecularPopulation::new(id, ConcentrationSpec::Constant { value: 1.0 })
    }

    fn demo_catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        for id in ["A", "B", "C"] {
            catalog
                .add_molecule(molecule(id, MoleculeLocation::Bulk))
                .unwrap();
        }
        catalog
            .add_molecule(molecule("R1", MoleculeLocation::Boundary))
            .unwrap();
        catalog
            .add_gene(Gene {
                id: "g1".into(),
                name: "g1".into(),
            })
            .unwrap();
        catalog.add_reaction(reaction("rxn_ab", &["A"], &["B"])).unwrap();
        catalog.add_reaction(reaction("rxn_bc", &["B"], &["C"])).unwrap();
        catalog.add_reaction(reaction("rxn_ca", &["C"], &["A"])).unwrap();
        catalog
            .add_reaction(reaction("rxn_mem", &["R1", "A"], &["R1"]))
            .unwrap();
        catalog
    }

    #[test]
    fn add_population_validates_and_is_idempotent() {
        let catalog = demo_catalog();
        let mut cell = Cell::new("c1", "test");

        assert_eq!(
            cell.add_population(CompartmentKind::Cytosol, &catalog, population("A"))
                .unwrap(),
            AddOutcome::Added
        );
        assert_eq!(
            cell.add_population(CompartmentKind::Cytosol, &catalog, population("A"))
                .unwrap(),
            AddOutcome::AlreadyPresent
        );
        assert!(matches!(
            cell.add_population(CompartmentKind::Cytosol, &catalog, population("nope")),
            Err(ScenarioError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn add_reaction_revalidates_eligibility_and_is_idempotent() {
        let catalog = demo_catalog();
        let mut cell = Cell::new("c1", "test");
        cell.add_population(CompartmentKind::Cytosol, &catalog, population("A"))
            .unwrap();

        // B is missing, so rxn_ab is rejected.
        assert_eq!(
            cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
                .unwrap(),
            AddOutcome::Rejected
        );
        cell.add_population(CompartmentKind::Cytosol, &catalog, population("B"))
            .unwrap();
        assert_eq!(
            cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
                .unwrap(),
            AddOutcome::Added
        );

        // Idempotence: the second call leaves the compartment unchanged.
        let before = cell.cytosol.reactions().len();
        assert_eq!(
            cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
                .unwrap(),
            AddOutcome::AlreadyPresent
        );
        assert_eq!(cell.cytosol.reactions().len(), before);
    }

    #[test]
    fn post_add_invariant_bulk_refs_present_in_cytosol() {
        let catalog = demo_catalog();
        let mut cell = Cell::new("c1", "test");
        cell.add_population(CompartmentKind::Cytosol, &catalog, population("A"))
            .unwrap();
        cell.add_population(CompartmentKind::Cytosol, &catalog, population("B"))
            .unwrap();
        cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
            .unwrap();

        let instance = cell.cytosol.reactions().get("rxn_ab").unwrap();
        for id in instance.referenced_ids() {
            let m = catalog.molecule(id).unwrap();
            if m.location == MoleculeLocation::Bulk {
                assert!(cell.cytosol.has_molecule(id));
            }
        }
    }

    #[test]
    fn scenario_d_cascade_purges_both_compartments() {
        // Molecule A referenced by 2 cytosol reactions and 1 membrane
        // reaction; removing A from the cytosol purges all 3.
        let catalog = demo_catalog();
        let mut cell = Cell::new("c1", "test");
        for id in ["A", "B", "C"] {
            cell.add_population(CompartmentKind::Cytosol, &catalog, population(id))
                .unwrap();
        }
        cell.add_population(CompartmentKind::Membrane, &catalog, population("R1"))
            .unwrap();
        cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
            .unwrap();
        cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_bc")
            .unwrap();
        cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ca")
            .unwrap();
        // Membrane instance referencing A (admitted directly; membrane
        // eligibility needs A held there too).
        cell.add_population(CompartmentKind::Membrane, &catalog, population("A"))
            .unwrap();
        cell.add_reaction(CompartmentKind::Membrane, &catalog, "rxn_mem")
            .unwrap();

        let outcome = cell.remove_population(CompartmentKind::Cytosol, "A");
        assert!(outcome.removed_population.is_some());
        // rxn_ab and rxn_ca (cytosol) and rxn_mem (membrane) referenced A;
        // rxn_bc did not.
        assert_eq!(outcome.removed_reactions.len(), 3);
        assert!(outcome
            .removed_reactions
            .contains(&(CompartmentKind::Cytosol, "rxn_ab".to_string())));
        assert!(outcome
            .removed_reactions
            .contains(&(CompartmentKind::Cytosol, "rxn_ca".to_string())));
        assert!(outcome
            .removed_reactions
            .contains(&(CompartmentKind::Membrane, "rxn_mem".to_string())));

        // Cascade completeness: no surviving reaction references A.
        for compartment in [&cell.cytosol, &cell.membrane] {
            assert!(compartment
                .reactions()
                .values()
                .all(|r| !r.references("A")));
        }
        assert!(cell.cytosol.has_reaction("rxn_bc"));
        // The membrane copy of A is untouched; only the named
        // compartment's population was removed.
        assert!(cell.membrane.has_molecule("A"));
    }

    #[test]
    fn remove_reaction_never_cascades() {
        let catalog = demo_catalog();
        let mut cell = Cell::new("c1", "test");
        for id in ["A", "B"] {
            cell.add_population(CompartmentKind::Cytosol, &catalog, population(id))
                .unwrap();
        }
        cell.add_reaction(CompartmentKind::Cytosol, &catalog, "rxn_ab")
            .unwrap();

        let removed = cell.remove_reaction(CompartmentKind::Cytosol, "rxn_ab");
        assert!(removed.is_some());
        assert!(cell.cytosol.has_molecule("A"));
        assert!(cell.cytosol.has_molecule("B"));
    }

    #[test]
    fn death_driver_created_lazily_with_default_states() {
        let mut cell = Cell::new("c1", "test");
        assert!(cell.death_driver.is_none());

        let mut rng = StdRng::seed_from_u64(5);
        let driver = cell.configure_death_driver(&mut rng).unwrap();
        assert_eq!(
            driver.states(),
            &["alive".to_string(), "dead".to_string()][..]
        );
        let initial = driver.current_state();
        assert!(initial < 2);

        // Second configuration call reuses the existing driver.
        let again = cell.configure_death_driver(&mut rng).unwrap();
        assert_eq!(again.current_state(), initial);

        cell.clear_death_driver();
        assert!(cell.death_driver.is_none());
    }

    #[test]
    fn division_scheme_requires_two_states() {
        let mut cell = Cell::new("c1", "test");
        assert!(matches!(
            cell.configure_division(vec!["only".into()]),
            Err(ScenarioError::InsufficientStates { found: 1 })
        ));
        cell.configure_division(vec!["mother".into(), "daughter".into()])
            .unwrap();
        assert!(cell.division.is_some());
        cell.clear_division();
        assert!(cell.division.is_none());
    }
}
