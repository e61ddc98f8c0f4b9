use crate::rom::error::{RomError, RomResult};
use crate::rom::events::{BasisCounts, CoreMatrices, Phase, PipelineEvent, Stabilization};
use crate::rom::matrix::Matrix;

/// What the receiver learned from one applied event.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyStatus {
    /// Progress to surface in the UI.
    Progress(Phase, u8),
    /// Artifact recorded, more to come.
    Pending,
    /// Terminal: every mandatory artifact present, session can be built.
    Complete,
    /// Terminal: pipeline reported failure.
    Failed(RomError),
}

/// Receiver-side accumulation of the Basis Set.
///
/// Events may arrive in any order within the indexed families (the decode
/// fan-out makes no ordering promise), so each slot is keyed by the event's
/// explicit index. Duplicates and out-of-range indices are protocol
/// violations, not data to be overwritten.
pub struct BasisAssembly {
    stabilization: Stabilization,
    counts: Option<BasisCounts>,
    core: Option<CoreMatrices>,
    modes: Option<Matrix>,
    grid: Option<Vec<u8>>,
    surface: Option<Vec<u8>>,
    ct1: Vec<Option<Matrix>>,
    ct2: Vec<Option<Matrix>>,
    c: Vec<Option<Matrix>>,
    g: Vec<Option<Matrix>>,
    weights: Vec<Option<Matrix>>,
    rbf: Option<(Matrix, Matrix)>,
}

impl BasisAssembly {
    pub fn new(stabilization: Stabilization) -> Self {
        BasisAssembly {
            stabilization,
            counts: None,
            core: None,
            modes: None,
            grid: None,
            surface: None,
            ct1: Vec::new(),
            ct2: Vec::new(),
            c: Vec::new(),
            g: Vec::new(),
            weights: Vec::new(),
            rbf: None,
        }
    }

    pub fn counts(&self) -> Option<BasisCounts> {
        self.counts
    }

    pub fn apply(&mut self, event: PipelineEvent) -> RomResult<AssemblyStatus> {
        match event {
            PipelineEvent::Progress { phase, percent } => {
                return Ok(AssemblyStatus::Progress(phase, percent));
            }
            PipelineEvent::Failed(err) => return Ok(AssemblyStatus::Failed(err)),
            PipelineEvent::Constructor(counts) => {
                if self.counts.is_some() {
                    return Err(RomError::protocol("duplicate constructor event"));
                }
                self.ct1 = vec![None; counts.n_phi_u];
                self.ct2 = vec![None; counts.n_phi_u];
                self.c = vec![None; counts.n_phi_u];
                self.g = vec![
                    None;
                    match self.stabilization {
                        Stabilization::Ppe => counts.n_phi_p,
                        Stabilization::Supremizer => 0,
                    }
                ];
                self.weights = vec![None; counts.n_phi_nut];
                self.counts = Some(counts);
                return Ok(AssemblyStatus::Pending);
            }
            PipelineEvent::Initialized => {
                return if self.is_complete() {
                    Ok(AssemblyStatus::Complete)
                } else {
                    Err(RomError::protocol("initialization before all artifacts arrived"))
                };
            }
            _ => {}
        }

        // Every remaining event is data and must follow the constructor.
        if self.counts.is_none() {
            return Err(RomError::protocol("data event before constructor"));
        }
        match event {
            PipelineEvent::Grid(bytes) => Self::store_blob(&mut self.grid, bytes, "grid")?,
            PipelineEvent::Surface(bytes) => Self::store_blob(&mut self.surface, bytes, "surface")?,
            PipelineEvent::Matrices(core) => {
                if self.core.is_some() {
                    return Err(RomError::protocol("duplicate matrices event"));
                }
                self.core = Some(core);
            }
            PipelineEvent::Modes(modes) => {
                if self.modes.is_some() {
                    return Err(RomError::protocol("duplicate modes event"));
                }
                self.modes = Some(modes);
            }
            PipelineEvent::Rbf { mu, coeff_l2 } => {
                if self.rbf.is_some() {
                    return Err(RomError::protocol("duplicate RBF event"));
                }
                self.rbf = Some((mu, coeff_l2));
            }
            PipelineEvent::Ct1 { index, matrix } => Self::store_indexed(&mut self.ct1, index, matrix, "ct1")?,
            PipelineEvent::Ct2 { index, matrix } => Self::store_indexed(&mut self.ct2, index, matrix, "ct2")?,
            PipelineEvent::C { index, matrix } => Self::store_indexed(&mut self.c, index, matrix, "C")?,
            PipelineEvent::G { index, matrix } => Self::store_indexed(&mut self.g, index, matrix, "G")?,
            PipelineEvent::Weights { index, matrix } => {
                Self::store_indexed(&mut self.weights, index, matrix, "weights")?
            }
            // Handled above; the match is exhaustive so new event kinds
            // cannot be silently ignored.
            PipelineEvent::Progress { .. }
            | PipelineEvent::Constructor(_)
            | PipelineEvent::Initialized
            | PipelineEvent::Failed(_) => unreachable!(),
        }
        Ok(AssemblyStatus::Pending)
    }

    fn store_blob(slot: &mut Option<Vec<u8>>, bytes: Vec<u8>, what: &str) -> RomResult<()> {
        if slot.is_some() {
            return Err(RomError::protocol(format!("duplicate {what} event")));
        }
        *slot = Some(bytes);
        Ok(())
    }

    fn store_indexed(
        slots: &mut [Option<Matrix>],
        index: usize,
        matrix: Matrix,
        family: &str,
    ) -> RomResult<()> {
        let len = slots.len();
        let slot = slots.get_mut(index).ok_or_else(|| {
            RomError::protocol(format!("{family} index {index} out of range (n={len})"))
        })?;
        if slot.is_some() {
            return Err(RomError::protocol(format!("{family} index {index} delivered twice")));
        }
        *slot = Some(matrix);
        Ok(())
    }

    /// True once every artifact mandated by the stabilization variant has
    /// arrived exactly once.
    pub fn is_complete(&self) -> bool {
        let Some(counts) = self.counts else {
            return false;
        };
        let indexed_done = self.ct1.iter().all(Option::is_some)
            && self.ct2.iter().all(Option::is_some)
            && self.c.iter().all(Option::is_some)
            && self.g.iter().all(Option::is_some)
            && self.weights.iter().all(Option::is_some);
        let rbf_done = counts.n_phi_nut == 0 || self.rbf.is_some();
        indexed_done
            && rbf_done
            && self.core.is_some()
            && self.modes.is_some()
            && self.grid.is_some()
    }

    pub fn core(&self) -> Option<&CoreMatrices> {
        self.core.as_ref()
    }

    pub fn modes(&self) -> Option<&Matrix> {
        self.modes.as_ref()
    }

    pub fn grid(&self) -> Option<&[u8]> {
        self.grid.as_deref()
    }

    pub fn surface(&self) -> Option<&[u8]> {
        self.surface.as_deref()
    }

    pub fn rbf(&self) -> Option<(&Matrix, &Matrix)> {
        self.rbf.as_ref().map(|(mu, c)| (mu, c))
    }

    pub fn indexed(&self, index: usize) -> Option<(&Matrix, &Matrix, &Matrix)> {
        let ct1 = self.ct1.get(index).and_then(Option::as_ref)?;
        let ct2 = self.ct2.get(index).and_then(Option::as_ref)?;
        let c = self.c.get(index).and_then(Option::as_ref)?;
        Some((ct1, ct2, c))
    }

    pub fn gradient(&self, index: usize) -> Option<&Matrix> {
        self.g.get(index).and_then(Option::as_ref)
    }

    pub fn weight(&self, index: usize) -> Option<&Matrix> {
        self.weights.get(index).and_then(Option::as_ref)
    }
}
