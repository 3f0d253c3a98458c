use crate::error::{EntityKind, Result, ScenarioError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a molecule lives: free-floating in the cytosol or bound to the membrane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoleculeLocation {
    Bulk,
    Boundary,
}

/// A catalog molecule definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Molecule {
    pub id: String,
    pub name: String,
    pub location: MoleculeLocation,
    /// Predefined entries ship with the scenario and are protected from edits.
    #[serde(default)]
    pub predefined: bool,
}

/// A gene definition. Genes live in the cell nucleus, not in a compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gene {
    pub id: String,
    pub name: String,
}

/// Template kind of a reaction. Only `Transcription` changes the
/// eligibility rule; the rest share the default bulk/boundary logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Association,
    Dissociation,
    Annihilation,
    Transcription,
    Translation,
    Degradation,
}

/// A catalog reaction definition. Reactant/product/modifier lists hold
/// molecule ids (gene ids for transcription templates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub name: String,
    pub kind: ReactionKind,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    pub modifiers: Vec<String>,
    pub rate_constant: f64,
    #[serde(default)]
    pub predefined: bool,
}

impl Reaction {
    /// Iterates over every id the reaction references, in
    /// reactant/product/modifier order. Duplicates are not filtered.
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .chain(self.modifiers.iter())
            .map(String::as_str)
    }

    /// True if any reactant, product, or modifier is `id`.
    pub fn references(&self, id: &str) -> bool {
        self.referenced_ids().any(|r| r == id)
    }
}

/// An ordered bundle of reactions plus the union of molecule ids they touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionComplex {
    pub id: String,
    pub name: String,
    pub reactions: Vec<String>,
    pub molecules: Vec<String>,
}

/// The canonical, globally addressable entity definitions for a scenario.
///
/// Entities are stored in plain vectors (the serialized representation);
/// the id lookup maps are derived state, skipped by serde and rebuilt by
/// [`EntityCatalog::reindex`] after every load.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EntityCatalog {
    molecules: Vec<Molecule>,
    genes: Vec<Gene>,
    reactions: Vec<Reaction>,
    complexes: Vec<ReactionComplex>,

    #[serde(skip)]
    molecule_index: HashMap<String, usize>,
    #[serde(skip)]
    gene_index: HashMap<String, usize>,
    #[serde(skip)]
    reaction_index: HashMap<String, usize>,
    #[serde(skip)]
    complex_index: HashMap<String, usize>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds every id lookup map from the entity vectors.
    ///
    /// Must be called after deserialization and after any bulk edit; the
    /// maps are never kept in sync implicitly. Fails if two entities of
    /// the same class share an id.
    pub fn reindex(&mut self) -> Result<()> {
        self.molecule_index = build_index(&self.molecules, |m| &m.id, EntityKind::Molecule)?;
        self.gene_index = build_index(&self.genes, |g| &g.id, EntityKind::Gene)?;
        self.reaction_index = build_index(&self.reactions, |r| &r.id, EntityKind::Reaction)?;
        self.complex_index =
            build_index(&self.complexes, |c| &c.id, EntityKind::ReactionComplex)?;
        log::debug!(
            "Catalog reindexed: {} molecules, {} genes, {} reactions, {} complexes.",
            self.molecules.len(),
            self.genes.len(),
            self.reactions.len(),
            self.complexes.len()
        );
        Ok(())
    }

    // --- Add operations ---

    pub fn add_molecule(&mut self, molecule: Molecule) -> Result<()> {
        if self.molecule_index.contains_key(&molecule.id) {
            return Err(ScenarioError::DuplicateId {
                kind: EntityKind::Molecule,
                id: molecule.id,
            });
        }
        self.molecule_index
            .insert(molecule.id.clone(), self.molecules.len());
        self.molecules.push(molecule);
        Ok(())
    }

    pub fn add_gene(&mut self, gene: Gene) -> Result<()> {
        if self.gene_index.contains_key(&gene.id) {
            return Err(ScenarioError::DuplicateId {
                kind: EntityKind::Gene,
                id: gene.id,
            });
        }
        self.gene_index.insert(gene.id.clone(), self.genes.len());
        self.genes.push(gene);
        Ok(())
    }

    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<()> {
        if self.reaction_index.contains_key(&reaction.id) {
            return Err(ScenarioError::DuplicateId {
                kind: EntityKind::Reaction,
                id: reaction.id,
            });
        }
        self.reaction_index
            .insert(reaction.id.clone(), self.reactions.len());
        self.reactions.push(reaction);
        Ok(())
    }

    pub fn add_complex(&mut self, complex: ReactionComplex) -> Result<()> {
        if self.complex_index.contains_key(&complex.id) {
            return Err(ScenarioError::DuplicateId {
                kind: EntityKind::ReactionComplex,
                id: complex.id,
            });
        }
        self.complex_index
            .insert(complex.id.clone(), self.complexes.len());
        self.complexes.push(complex);
        Ok(())
    }

    // --- Clone operations ---

    /// Clones a catalog molecule under a fresh id. The copy is user-owned
    /// (not predefined) and independent of the source entry.
    pub fn clone_molecule(&mut self, source_id: &str, new_id: &str) -> Result<()> {
        let mut copy = self.molecule(source_id)?.clone();
        copy.id = new_id.to_string();
        copy.predefined = false;
        self.add_molecule(copy)
    }

    /// Clones a catalog reaction under a fresh id, clearing the
    /// predefined flag so the copy is editable.
    pub fn clone_reaction(&mut self, source_id: &str, new_id: &str) -> Result<()> {
        let mut copy = self.reaction(source_id)?.clone();
        copy.id = new_id.to_string();
        copy.predefined = false;
        self.add_reaction(copy)
    }

    // --- Lookups ---

    pub fn molecule(&self, id: &str) -> Result<&Molecule> {
        self.find_molecule(id).ok_or_else(|| ScenarioError::ReferenceNotFound {
            kind: EntityKind::Molecule,
            id: id.to_string(),
        })
    }

    pub fn gene(&self, id: &str) -> Result<&Gene> {
        self.find_gene(id).ok_or_else(|| ScenarioError::ReferenceNotFound {
            kind: EntityKind::Gene,
            id: id.to_string(),
        })
    }

    pub fn reaction(&self, id: &str) -> Result<&Reaction> {
        self.find_reaction(id).ok_or_else(|| ScenarioError::ReferenceNotFound {
            kind: EntityKind::Reaction,
            id: id.to_string(),
        })
    }

    pub fn complex(&self, id: &str) -> Result<&ReactionComplex> {
        self.find_complex(id).ok_or_else(|| ScenarioError::ReferenceNotFound {
            kind: EntityKind::ReactionComplex,
            id: id.to_string(),
        })
    }

    pub fn find_molecule(&self, id: &str) -> Option<&Molecule> {
        self.molecule_index.get(id).map(|&i| &self.molecules[i])
    }

    pub fn find_gene(&self, id: &str) -> Option<&Gene> {
        self.gene_index.get(id).map(|&i| &self.genes[i])
    }

    pub fn find_reaction(&self, id: &str) -> Option<&Reaction> {
        self.reaction_index.get(id).map(|&i| &self.reactions[i])
    }

    pub fn find_complex(&self, id: &str) -> Option<&ReactionComplex> {
        self.complex_index.get(id).map(|&i| &self.complexes[i])
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn complexes(&self) -> &[ReactionComplex] {
        &self.complexes
    }
}

fn build_index<T, F>(entries: &[T], id_of: F, kind: EntityKind) -> Result<HashMap<String, usize>>
where
    F: Fn(&T) -> &String,
{
    let mut index = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if index.insert(id_of(entry).clone(), i).is_some() {
            return Err(ScenarioError::DuplicateId {
                kind,
                id: id_of(entry).clone(),
            });
        }
    }
    Ok(index)
}
