use crate::catalog::EntityCatalog;
use crate::cell::Cell;
use crate::error::{EntityKind, Result, ScenarioError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A complete scenario: the entity catalog plus the cells assembled from
/// it. This is the unit of persistence; the cell id index is derived
/// state, rebuilt only by an explicit [`Scenario::reindex`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub catalog: EntityCatalog,
    cells: Vec<Cell>,
    #[serde(skip)]
    cell_index: HashMap<String, usize>,
}

impl Scenario {
    pub fn new(catalog: EntityCatalog) -> Self {
        Scenario {
            catalog,
            cells: Vec::new(),
            cell_index: HashMap::new(),
        }
    }

    pub fn add_cell(&mut self, cell: Cell) -> Result<()> {
        if self.cell_index.contains_key(&cell.id) {
            return Err(ScenarioError::DuplicateId {
                kind: EntityKind::Cell,
                id: cell.id,
            });
        }
        self.cell_index.insert(cell.id.clone(), self.cells.len());
        self.cells.push(cell);
        Ok(())
    }

    pub fn cell(&self, id: &str) -> Result<&Cell> {
        self.cell_index
            .get(id)
            .map(|&i| &self.cells[i])
            .ok_or_else(|| ScenarioError::ReferenceNotFound {
                kind: EntityKind::Cell,
                id: id.to_string(),
            })
    }

    pub fn cell_mut(&mut self, id: &str) -> Result<&mut Cell> {
        match self.cell_index.get(id) {
            Some(&i) => Ok(&mut self.cells[i]),
            None => Err(ScenarioError::ReferenceNotFound {
                kind: EntityKind::Cell,
                id: id.to_string(),
            }),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Rebuilds every derived lookup structure and validates referential
    /// integrity across the whole tree.
    ///
    /// Must be called after deserialization and after any bulk edit;
    /// nothing rebuilds these maps implicitly. Fails on duplicate ids or
    /// on any compartment member referencing an id the catalog does not
    /// resolve.
    pub fn reindex(&mut self) -> Result<()> {
        self.catalog.reindex()?;
        self.cell_index.clear();
        for (i, cell) in self.cells.iter().enumerate() {
            if self.cell_index.insert(cell.id.clone(), i).is_some() {
                return Err(ScenarioError::DuplicateId {
                    kind: EntityKind::Cell,
                    id: cell.id.clone(),
                });
            }
        }
        for cell in &self.cells {
            cell.validate_references(&self.catalog)?;
        }
        log::info!("Scenario reindexed: {} cell(s).", self.cells.len());
        Ok(())
    }
}

/// Advisory lock around the currently selected cell id.
///
/// The long-running track-fitting job in the visualization layer holds
/// this while it reads the selected cell; callers wrap core reads and
/// structural mutations in [`with_selected`] / [`select_cell`] so an
/// edit cannot race that job. Nothing inside the core takes the lock on
/// its own.
pub type SharedSelection = Arc<Mutex<Option<String>>>;

pub fn new_shared_selection() -> SharedSelection {
    Arc::new(Mutex::new(None))
}

/// Replaces the selected cell id under the lock.
pub fn select_cell(selection: &SharedSelection, cell_id: Option<&str>) {
    let mut guard = selection
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = cell_id.map(str::to_string);
}

/// Runs `f` with the selection held, so the caller's reads or mutations
/// are mutually exclusive with the background job.
pub fn with_selected<T, F>(selection: &SharedSelection, f: F) -> T
where
    F: FnOnce(Option<&str>) -> T,
{
    let guard = selection
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(guard.as_deref())
}
