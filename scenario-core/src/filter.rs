//! Availability predicates: pure, side-effect-free answers to "can this
//! catalog entity be added to that compartment right now".
//!
//! The presentation layer evaluates these once per candidate against the
//! currently focused cell, so they must stay cheap; the offer-list
//! builders fan the per-candidate scans out with rayon.

use crate::catalog::{EntityCatalog, Molecule, MoleculeLocation, Reaction, ReactionComplex, ReactionKind};
use crate::cell::Cell;
use crate::compartment::Compartment;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Total, disjoint partition of the ids a reaction references.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefPartition {
    /// Ids resolving to Boundary-located catalog molecules.
    pub boundary: BTreeSet<String>,
    /// Ids resolving to catalog genes.
    pub genes: BTreeSet<String>,
    /// Everything else, including ids that do not resolve at all.
    pub bulk: BTreeSet<String>,
}

/// Scans reactants, products, and modifiers and buckets every referenced
/// id into exactly one of the three sets.
pub fn classify(reaction: &Reaction, catalog: &EntityCatalog) -> RefPartition {
    let mut partition = RefPartition::default();
    for id in reaction.referenced_ids() {
        let is_boundary = matches!(
            catalog.find_molecule(id),
            Some(m) if m.location == MoleculeLocation::Boundary
        );
        if is_boundary {
            partition.boundary.insert(id.to_string());
        } else if catalog.find_gene(id).is_some() {
            partition.genes.insert(id.to_string());
        } else {
            partition.bulk.insert(id.to_string());
        }
    }
    partition
}

/// Whether `reaction` may be newly admitted into the cell's cytosol.
///
/// Transcription templates need their genes present in the cell nucleus
/// and their bulk molecules in the cytosol. Every other template needs
/// its bulk molecules in the cytosol and, if it touches boundary
/// molecules at all, those satisfied from the membrane. A reaction that
/// is already an active cytosol member is never offered again.
pub fn is_eligible_for_cytosol(reaction: &Reaction, catalog: &EntityCatalog, cell: &Cell) -> bool {
    let partition = classify(reaction, catalog);
    let satisfied = match reaction.kind {
        ReactionKind::Transcription => {
            !partition.bulk.is_empty()
                && !partition.genes.is_empty()
                && partition.genes.iter().all(|g| cell.genes.contains(g))
                && cell
                    .cytosol
                    .holds_all(partition.bulk.iter().map(String::as_str))
        }
        _ => {
            !partition.bulk.is_empty()
                && (partition.boundary.is_empty()
                    || cell
                        .membrane
                        .holds_all(partition.boundary.iter().map(String::as_str)))
                && cell
                    .cytosol
                    .holds_all(partition.bulk.iter().map(String::as_str))
        }
    };
    satisfied && !cell.cytosol.has_reaction(&reaction.id)
}

/// Whether `reaction` may be newly admitted into the cell's membrane:
/// the membrane must already carry every referenced molecule, with no
/// bulk/boundary distinction applied.
pub fn is_eligible_for_membrane(reaction: &Reaction, cell: &Cell) -> bool {
    cell.membrane.holds_all(reaction.referenced_ids())
        && !cell.membrane.has_reaction(&reaction.id)
}

/// Whether `complex` may be newly admitted into `compartment`: every
/// constituent reaction must already be an active member there.
pub fn is_eligible_complex(complex: &ReactionComplex, compartment: &Compartment) -> bool {
    !compartment.has_complex(&complex.id)
        && complex
            .reactions
            .iter()
            .all(|r| compartment.has_reaction(r))
}

/// Catalog molecules that could be newly added to `compartment`:
/// location must match the compartment side and the molecule must not
/// already be held there.
pub fn molecule_offers<'a>(
    catalog: &'a EntityCatalog,
    compartment: &Compartment,
) -> Vec<&'a Molecule> {
    let wanted = match compartment.kind {
        crate::compartment::CompartmentKind::Membrane => MoleculeLocation::Boundary,
        crate::compartment::CompartmentKind::Cytosol => MoleculeLocation::Bulk,
    };
    catalog
        .molecules()
        .par_iter()
        .filter(|m| m.location == wanted && !compartment.has_molecule(&m.id))
        .collect()
}

/// Catalog reactions currently eligible for the cell's cytosol.
pub fn cytosol_offers<'a>(catalog: &'a EntityCatalog, cell: &Cell) -> Vec<&'a Reaction> {
    catalog
        .reactions()
        .par_iter()
        .filter(|r| is_eligible_for_cytosol(r, catalog, cell))
        .collect()
}

/// Catalog reactions currently eligible for the cell's membrane.
pub fn membrane_offers<'a>(catalog: &'a EntityCatalog, cell: &Cell) -> Vec<&'a Reaction> {
    catalog
        .reactions()
        .par_iter()
        .filter(|r| is_eligible_for_membrane(r, cell))
        .collect()
}

/// Catalog complexes currently eligible for `compartment`.
pub fn complex_offers<'a>(
    catalog: &'a EntityCatalog,
    compartment: &Compartment,
) -> Vec<&'a ReactionComplex> {
    catalog
        .complexes()
        .par_iter()
        .filter(|c| is_eligible_complex(c, compartment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Gene;
    use crate::compartment::{CompartmentKind, ConcentrationSpec, MolecularPopulation};

    fn molecule(id: &str, location: MoleculeLocation) -> Molecule {
        Molecule {
            id: id.to_string(),
            name: id.to_string(),
            location,
            predefined: false,
        }
    }

    fn reaction(id: &str, kind: ReactionKind, reactants: &[&str], products: &[&str]) -> Reaction {
        Reaction {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            reactants: reactants.iter().map(|s| s.to_string()).collect(),
            products: products.iter().map(|s| s.to_string()).collect(),
            modifiers: vec![],
            rate_constant: 0.5,
            predefined: false,
        }
    }

    fn population(id: &str) -> MolecularPopulation {
        MolecularPopulation::new(id, ConcentrationSpec::Constant { value: 1.0 })
    }

    fn catalog_with(molecules: &[(&str, MoleculeLocation)], genes: &[&str]) -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        for (id, location) in molecules {
            catalog.add_molecule(molecule(id, *location)).unwrap();
        }
        for id in genes {
            catalog
                .add_gene(Gene {
                    id: id.to_string(),
                    name: id.to_string(),
                })
                .unwrap();
        }
        catalog
    }

    #[test]
    fn classify_partition_is_total_and_disjoint() {
        let catalog = catalog_with(
            &[
                ("bulk1", MoleculeLocation::Bulk),
                ("mem1", MoleculeLocation::Boundary),
            ],
            &["g1"],
        );
        let r = reaction(
            "r",
            ReactionKind::Association,
            &["bulk1", "mem1"],
            &["g1", "unknown"],
        );
        let partition = classify(&r, &catalog);

        assert_eq!(partition.boundary, BTreeSet::from(["mem1".to_string()]));
        assert_eq!(partition.genes, BTreeSet::from(["g1".to_string()]));
        // Unresolvable ids land in bulk, keeping the partition total.
        assert_eq!(
            partition.bulk,
            BTreeSet::from(["bulk1".to_string(), "unknown".to_string()])
        );

        let union: BTreeSet<String> = partition
            .boundary
            .union(&partition.genes)
            .chain(partition.bulk.iter())
            .cloned()
            .collect();
        let referenced: BTreeSet<String> =
            r.referenced_ids().map(str::to_string).collect();
        assert_eq!(union, referenced);
        assert!(partition.boundary.is_disjoint(&partition.genes));
        assert!(partition.boundary.is_disjoint(&partition.bulk));
        assert!(partition.genes.is_disjoint(&partition.bulk));
    }

    #[test]
    fn scenario_a_association_needs_all_bulk_molecules() {
        // R: reactants=[A(Bulk)], products=[B(Bulk)]; cytosol holds {A}.
        let catalog = catalog_with(
            &[("A", MoleculeLocation::Bulk), ("B", MoleculeLocation::Bulk)],
            &[],
        );
        let r = reaction("R", ReactionKind::Association, &["A"], &["B"]);
        let mut cell = Cell::new("cell1", "epithelial");
        cell.cytosol.insert_population(population("A"));

        assert!(!is_eligible_for_cytosol(&r, &catalog, &cell));
        cell.cytosol.insert_population(population("B"));
        assert!(is_eligible_for_cytosol(&r, &catalog, &cell));
    }

    #[test]
    fn scenario_b_transcription_needs_gene_and_transcript() {
        // T: bulkRefs=[mRNA], geneRefs=[G1]; cell genes={G1}; cytosol={}.
        let catalog = catalog_with(&[("mRNA", MoleculeLocation::Bulk)], &["G1"]);
        let t = reaction("T", ReactionKind::Transcription, &["G1"], &["mRNA"]);
        let mut cell = Cell::new("cell1", "epithelial");
        cell.genes.insert("G1".to_string());

        assert!(!is_eligible_for_cytosol(&t, &catalog, &cell));
        cell.cytosol.insert_population(population("mRNA"));
        assert!(is_eligible_for_cytosol(&t, &catalog, &cell));

        // Without the gene the transcript alone is not enough.
        let mut geneless = Cell::new("cell2", "epithelial");
        geneless.cytosol.insert_population(population("mRNA"));
        assert!(!is_eligible_for_cytosol(&t, &catalog, &geneless));
    }

    #[test]
    fn boundary_refs_must_be_satisfied_from_membrane() {
        let catalog = catalog_with(
            &[
                ("ligand", MoleculeLocation::Bulk),
                ("receptor", MoleculeLocation::Boundary),
            ],
            &[],
        );
        let r = reaction(
            "bind",
            ReactionKind::Association,
            &["ligand", "receptor"],
            &["ligand"],
        );
        let mut cell = Cell::new("cell1", "epithelial");
        cell.cytosol.insert_population(population("ligand"));

        assert!(!is_eligible_for_cytosol(&r, &catalog, &cell));
        cell.membrane.insert_population(population("receptor"));
        assert!(is_eligible_for_cytosol(&r, &catalog, &cell));
    }

    #[test]
    fn active_member_never_reoffered() {
        let mut catalog = catalog_with(&[("A", MoleculeLocation::Bulk)], &[]);
        let r = reaction("R", ReactionKind::Degradation, &["A"], &[]);
        catalog.add_reaction(r.clone()).unwrap();
        let mut cell = Cell::new("cell1", "epithelial");
        cell.cytosol.insert_population(population("A"));

        assert!(is_eligible_for_cytosol(&r, &catalog, &cell));
        assert_eq!(cytosol_offers(&catalog, &cell).len(), 1);
        cell.cytosol.insert_reaction(r.clone());
        assert!(!is_eligible_for_cytosol(&r, &catalog, &cell));
        assert!(cytosol_offers(&catalog, &cell).is_empty());
    }

    #[test]
    fn membrane_eligibility_ignores_location_split() {
        let mut catalog = catalog_with(
            &[
                ("ligand", MoleculeLocation::Bulk),
                ("receptor", MoleculeLocation::Boundary),
            ],
            &[],
        );
        let r = reaction(
            "bind",
            ReactionKind::Association,
            &["ligand", "receptor"],
            &[],
        );
        catalog.add_reaction(r.clone()).unwrap();
        let mut cell = Cell::new("cell1", "epithelial");
        cell.membrane.insert_population(population("receptor"));
        assert!(!is_eligible_for_membrane(&r, &cell));

        // Bulk-located or not, the membrane must carry every reference.
        cell.membrane.insert_population(population("ligand"));
        assert!(is_eligible_for_membrane(&r, &cell));
        assert_eq!(membrane_offers(&catalog, &cell).len(), 1);
    }

    #[test]
    fn complex_needs_every_constituent_reaction_present() {
        let complex = ReactionComplex {
            id: "c1".into(),
            name: "cascade".into(),
            reactions: vec!["r1".into(), "r2".into()],
            molecules: vec![],
        };
        let mut compartment = Compartment::new(CompartmentKind::Cytosol);
        compartment.insert_reaction(reaction("r1", ReactionKind::Association, &["A"], &[]));
        assert!(!is_eligible_complex(&complex, &compartment));

        compartment.insert_reaction(reaction("r2", ReactionKind::Dissociation, &["B"], &[]));
        assert!(is_eligible_complex(&complex, &compartment));

        compartment.insert_complex(complex.clone());
        assert!(!is_eligible_complex(&complex, &compartment));
    }

    #[test]
    fn molecule_offers_respect_location_and_membership() {
        let catalog = catalog_with(
            &[
                ("bulk1", MoleculeLocation::Bulk),
                ("bulk2", MoleculeLocation::Bulk),
                ("mem1", MoleculeLocation::Boundary),
            ],
            &[],
        );
        let mut cell = Cell::new("cell1", "epithelial");
        cell.cytosol.insert_population(population("bulk1"));

        let cytosol_mols = molecule_offers(&catalog, &cell.cytosol);
        assert_eq!(cytosol_mols.len(), 1);
        assert_eq!(cytosol_mols[0].id, "bulk2");

        let membrane_mols = molecule_offers(&catalog, &cell.membrane);
        assert_eq!(membrane_mols.len(), 1);
        assert_eq!(membrane_mols[0].id, "mem1");
    }
}
