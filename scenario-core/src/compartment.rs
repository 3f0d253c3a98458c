use crate::catalog::{Reaction, ReactionComplex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two compartments each cell owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompartmentKind {
    Membrane,
    Cytosol,
}

impl std::fmt::Display for CompartmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompartmentKind::Membrane => f.write_str("membrane"),
            CompartmentKind::Cytosol => f.write_str("cytosol"),
        }
    }
}

/// Concentration/distribution specification carried by a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "spec", rename_all = "lowercase")]
pub enum ConcentrationSpec {
    Constant { value: f64 },
    Uniform { min: f64, max: f64 },
}

impl Default for ConcentrationSpec {
    fn default() -> Self {
        ConcentrationSpec::Constant { value: 0.0 }
    }
}

/// Presentation metadata kept with a population so it round-trips with
/// the scenario document. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub color: [f32; 4],
    pub visible: bool,
}

impl Default for DisplayInfo {
    fn default() -> Self {
        DisplayInfo {
            color: [1.0, 1.0, 1.0, 1.0],
            visible: true,
        }
    }
}

/// A compartment-local instance of a catalog molecule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MolecularPopulation {
    pub molecule_id: String,
    #[serde(default)]
    pub concentration: ConcentrationSpec,
    #[serde(default)]
    pub display: DisplayInfo,
}

impl MolecularPopulation {
    pub fn new(molecule_id: impl Into<String>, concentration: ConcentrationSpec) -> Self {
        MolecularPopulation {
            molecule_id: molecule_id.into(),
            concentration,
            display: DisplayInfo::default(),
        }
    }
}

/// One spatial sub-region of a cell, holding its own molecular
/// populations, reaction instances, and complex instances.
///
/// Members are compartment-local clones keyed by their catalog id; the
/// BTreeMap keys double as the serialized id lookup, so no separate
/// index rebuild is needed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compartment {
    pub kind: CompartmentKind,
    populations: BTreeMap<String, MolecularPopulation>,
    reactions: BTreeMap<String, Reaction>,
    complexes: BTreeMap<String, ReactionComplex>,
}

impl Compartment {
    pub fn new(kind: CompartmentKind) -> Self {
        Compartment {
            kind,
            populations: BTreeMap::new(),
            reactions: BTreeMap::new(),
            complexes: BTreeMap::new(),
        }
    }

    // --- Membership predicates ---

    pub fn has_molecule(&self, molecule_id: &str) -> bool {
        self.populations.contains_key(molecule_id)
    }

    pub fn has_reaction(&self, reaction_id: &str) -> bool {
        self.reactions.contains_key(reaction_id)
    }

    pub fn has_complex(&self, complex_id: &str) -> bool {
        self.complexes.contains_key(complex_id)
    }

    /// True when every id in `ids` is held as a population.
    pub fn holds_all<'a, I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().all(|id| self.has_molecule(id))
    }

    // --- Accessors ---

    pub fn population(&self, molecule_id: &str) -> Option<&MolecularPopulation> {
        self.populations.get(molecule_id)
    }

    pub fn populations(&self) -> &BTreeMap<String, MolecularPopulation> {
        &self.populations
    }

    pub fn reactions(&self) -> &BTreeMap<String, Reaction> {
        &self.reactions
    }

    pub fn complexes(&self) -> &BTreeMap<String, ReactionComplex> {
        &self.complexes
    }

    pub fn molecule_ids(&self) -> impl Iterator<Item = &str> {
        self.populations.keys().map(String::as_str)
    }

    // --- Raw insert/remove (cell-level commands layer validation on top) ---

    pub(crate) fn insert_population(&mut self, population: MolecularPopulation) {
        self.populations
            .insert(population.molecule_id.clone(), population);
    }

    pub(crate) fn take_population(&mut self, molecule_id: &str) -> Option<MolecularPopulation> {
        self.populations.remove(molecule_id)
    }

    pub(crate) fn insert_reaction(&mut self, reaction: Reaction) {
        self.reactions.insert(reaction.id.clone(), reaction);
    }

    pub(crate) fn take_reaction(&mut self, reaction_id: &str) -> Option<Reaction> {
        self.reactions.remove(reaction_id)
    }

    pub(crate) fn insert_complex(&mut self, complex: ReactionComplex) {
        self.complexes.insert(complex.id.clone(), complex);
    }

    pub(crate) fn take_complex(&mut self, complex_id: &str) -> Option<ReactionComplex> {
        self.complexes.remove(complex_id)
    }

    /// Reaction ids whose instances reference `molecule_id`.
    pub(crate) fn reactions_referencing(&self, molecule_id: &str) -> Vec<String> {
        self.reactions
            .values()
            .filter(|r| r.references(molecule_id))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Complexes whose reaction list no longer fully resolves within this
    /// compartment. Cascade deletion deliberately leaves these in place;
    /// callers audit them through this report.
    pub fn orphaned_complexes(&self) -> Vec<&ReactionComplex> {
        self.complexes
            .values()
            .filter(|c| c.reactions.iter().any(|r| !self.has_reaction(r)))
            .collect()
    }
}
