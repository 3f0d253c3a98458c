use crate::error::{Result, ScenarioError};
use rand::distr::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// Default mean installed when an element is switched to the
/// distribution representation.
pub const DEFAULT_POISSON_MEAN: f64 = 1.0;

/// One molecular signal: alpha/beta coefficients against a molecule's
/// concentration. How the coefficients combine into a firing decision is
/// owned by the external integrator; the core only carries the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularSignal {
    pub molecule_id: String,
    pub alpha: f64,
    pub beta: f64,
}

/// Payload of a molecular-signal-driven transition element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MolecularParams {
    pub signals: Vec<MolecularSignal>,
}

/// Sampleable probability distributions a transition element can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Poisson,
}

/// Payload of a distribution-driven transition element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionParams {
    pub kind: DistributionKind,
    pub mean: f64,
}

impl DistributionParams {
    /// Builds a Poisson payload, rejecting non-positive means.
    pub fn poisson(mean: f64) -> Result<Self> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(ScenarioError::InvalidDistributionParameter(format!(
                "poisson mean must be positive and finite, got {mean}"
            )));
        }
        Ok(DistributionParams {
            kind: DistributionKind::Poisson,
            mean,
        })
    }

    /// Draws a next-state index, clamped into `0..state_count`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, state_count: usize) -> Result<usize> {
        match self.kind {
            DistributionKind::Poisson => {
                let dist = Poisson::new(self.mean).map_err(|e| {
                    ScenarioError::InvalidDistributionParameter(e.to_string())
                })?;
                let draw: f64 = dist.sample(rng);
                Ok((draw.round() as usize).min(state_count.saturating_sub(1)))
            }
        }
    }
}

/// The two mutually exclusive representations of a transition element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Molecular(MolecularParams),
    Distribution(DistributionParams),
}

impl ElementKind {
    pub fn is_molecular(&self) -> bool {
        matches!(self, ElementKind::Molecular(_))
    }

    pub fn is_distribution(&self) -> bool {
        matches!(self, ElementKind::Distribution(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Molecular(_) => "molecular",
            ElementKind::Distribution(_) => "distribution",
        }
    }
}

/// The element governing one i -> j edge of a transition driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDriverElement {
    pub current_state: usize,
    pub dest_state: usize,
    pub current_state_name: String,
    pub dest_state_name: String,
    pub kind: ElementKind,
}

impl TransitionDriverElement {
    fn molecular(i: usize, j: usize, states: &[String]) -> Self {
        TransitionDriverElement {
            current_state: i,
            dest_state: j,
            current_state_name: states[i].clone(),
            dest_state_name: states[j].clone(),
            kind: ElementKind::Molecular(MolecularParams::default()),
        }
    }
}

/// One row of the driver matrix: the elements leaving a single state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRow {
    pub elements: Vec<TransitionDriverElement>,
}

/// Finite-state machine governing a cell fate process.
///
/// Holds an ordered state list, an NxN element matrix
/// (`rows[i].elements[j]` governs the i -> j edge), and the current
/// state index. Constructors enforce that the matrix dimensions always
/// match the state list and that element indices stay in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDriver {
    states: Vec<String>,
    rows: Vec<DriverRow>,
    current_state: usize,
}

impl TransitionDriver {
    /// Builds a driver over `states` with every element defaulting to the
    /// molecular representation with zero coefficients. At least two
    /// states are required; callers wanting the legacy auto-created pair
    /// go through [`TransitionScheme::with_default_states`].
    pub fn new(states: Vec<String>) -> Result<Self> {
        if states.len() < 2 {
            return Err(ScenarioError::InsufficientStates {
                found: states.len(),
            });
        }
        let n = states.len();
        let rows = (0..n)
            .map(|i| DriverRow {
                elements: (0..n)
                    .map(|j| TransitionDriverElement::molecular(i, j, &states))
                    .collect(),
            })
            .collect();
        Ok(TransitionDriver {
            states,
            rows,
            current_state: 0,
        })
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn rows(&self) -> &[DriverRow] {
        &self.rows
    }

    pub fn current_state(&self) -> usize {
        self.current_state
    }

    pub fn current_state_name(&self) -> &str {
        &self.states[self.current_state]
    }

    /// Writes back the current state, typically after the external
    /// integrator decided a transition fired.
    pub fn set_current_state(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.current_state = index;
        Ok(())
    }

    pub fn element(&self, i: usize, j: usize) -> Result<&TransitionDriverElement> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(&self.rows[i].elements[j])
    }

    pub fn element_mut(&mut self, i: usize, j: usize) -> Result<&mut TransitionDriverElement> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(&mut self.rows[i].elements[j])
    }

    /// Replaces the element at `[i][j]` with one of the opposite
    /// representation.
    ///
    /// The four positional fields (state indices and names) carry over
    /// exactly; the variant payload is reset to neutral defaults: a
    /// Poisson with mean [`DEFAULT_POISSON_MEAN`] when switching to the
    /// distribution representation, zero coefficients when switching to
    /// molecular. The swap is a reconstruction, installed in place.
    pub fn switch_representation(&mut self, i: usize, j: usize) -> Result<&TransitionDriverElement> {
        self.check_index(i)?;
        self.check_index(j)?;
        let old = &self.rows[i].elements[j];
        let kind = match old.kind {
            ElementKind::Molecular(_) => {
                ElementKind::Distribution(DistributionParams::poisson(DEFAULT_POISSON_MEAN)?)
            }
            ElementKind::Distribution(_) => ElementKind::Molecular(MolecularParams::default()),
        };
        let replacement = TransitionDriverElement {
            current_state: old.current_state,
            dest_state: old.dest_state,
            current_state_name: old.current_state_name.clone(),
            dest_state_name: old.dest_state_name.clone(),
            kind,
        };
        log::trace!(
            "Switched element [{i}][{j}] to {} representation.",
            replacement.kind.label()
        );
        self.rows[i].elements[j] = replacement;
        Ok(&self.rows[i].elements[j])
    }

    /// Samples an initial state index from a uniform initializer over the
    /// state range and installs it. Used once when a death driver is
    /// created.
    pub fn sample_initial_state<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        let high = (self.states.len() - 1) as f64;
        let dist = Uniform::new_inclusive(0.0f64, high).map_err(|e| {
            ScenarioError::InvalidDistributionParameter(e.to_string())
        })?;
        let index = (dist.sample(rng).round() as usize).min(self.states.len() - 1);
        self.current_state = index;
        Ok(index)
    }

    /// Checks that the element matrix lines up with the state list:
    /// NxN rows, positional indices and names agreeing with `states`,
    /// and a current state inside the range.
    ///
    /// Constructors uphold all of this, but a deserialized document is
    /// raw field data; [`Scenario::reindex`](crate::Scenario::reindex)
    /// runs this on every fate driver after load so a malformed matrix
    /// is rejected instead of panicking on first access.
    pub fn validate(&self) -> Result<()> {
        let n = self.states.len();
        if n < 2 {
            return Err(ScenarioError::InsufficientStates { found: n });
        }
        if self.current_state >= n {
            return Err(ScenarioError::StateOutOfRange {
                index: self.current_state,
                len: n,
            });
        }
        if self.rows.len() != n {
            return Err(ScenarioError::MalformedDriver(format!(
                "expected {n} rows for {n} states, found {}",
                self.rows.len()
            )));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.elements.len() != n {
                return Err(ScenarioError::MalformedDriver(format!(
                    "row {i}: expected {n} elements, found {}",
                    row.elements.len()
                )));
            }
            for (j, element) in row.elements.iter().enumerate() {
                if element.current_state != i || element.dest_state != j {
                    return Err(ScenarioError::MalformedDriver(format!(
                        "element [{i}][{j}] carries indices [{}][{}]",
                        element.current_state, element.dest_state
                    )));
                }
                if element.current_state_name != self.states[i]
                    || element.dest_state_name != self.states[j]
                {
                    return Err(ScenarioError::MalformedDriver(format!(
                        "element [{i}][{j}] state names disagree with the state list"
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.states.len() {
            return Err(ScenarioError::StateOutOfRange {
                index,
                len: self.states.len(),
            });
        }
        Ok(())
    }
}

/// An ordered list of state names plus the driver built over them, used
/// for division and differentiation fate processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionScheme {
    pub states: Vec<String>,
    pub driver: TransitionDriver,
}

impl TransitionScheme {
    pub fn new(states: Vec<String>) -> Result<Self> {
        let driver = TransitionDriver::new(states.clone())?;
        Ok(TransitionScheme { states, driver })
    }

    /// Convenience path for configuring a scheme before any states exist:
    /// synthesizes the two named default states. This is the explicit
    /// surface for the legacy auto-create behavior.
    pub fn with_default_states(first: &str, second: &str) -> Self {
        let states = vec![first.to_string(), second.to_string()];
        let driver =
            TransitionDriver::new(states.clone()).expect("two states always satisfy the minimum");
        TransitionScheme { states, driver }
    }

    /// Validates the embedded driver and that the scheme's state list is
    /// the one the driver was built over.
    pub fn validate(&self) -> Result<()> {
        self.driver.validate()?;
        if self.states != self.driver.states() {
            return Err(ScenarioError::MalformedDriver(
                "scheme state list disagrees with its driver".to_string(),
            ));
        }
        Ok(())
    }
}
