use crate::rom::error::RomError;
use crate::rom::matrix::Matrix;

/// Stabilization variant of the offline stage. Determines which auxiliary
/// matrices are mandatory in the archive: supremizer cases ship `P_mat.txt`,
/// PPE cases ship `D_mat.txt` + `BC3_mat.txt` and one `G<i>` per pressure
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stabilization {
    Supremizer,
    Ppe,
}

/// Basis sizes, announced once the archive manifest has been scanned and the
/// small header matrices decoded. After this event the receiver can allocate
/// its per-index slots and the ROM session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisCounts {
    /// Velocity modes.
    pub n_phi_u: usize,
    /// Pressure modes.
    pub n_phi_p: usize,
    /// Turbulence-closure (eddy viscosity) modes.
    pub n_phi_nut: usize,
    /// Offline parameter samples.
    pub n_runs: usize,
}

/// The stabilization-dependent pressure coupling block.
#[derive(Debug, Clone, PartialEq)]
pub enum Coupling {
    Supremizer { p: Matrix },
    Ppe { d: Matrix, bc3: Matrix },
}

/// Mandatory matrix set for the selected stabilization variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreMatrices {
    pub coupling: Coupling,
    pub k: Matrix,
    pub b: Matrix,
}

/// Pipeline phase a progress percentage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Download,
    Decode,
    SceneBuild,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Download => "Downloading dataset",
            Phase::Decode => "Decoding matrices",
            Phase::SceneBuild => "Building scene",
        }
    }
}

/// One message on the decode-pipeline → UI channel.
///
/// This is a closed vocabulary: the receiving match is exhaustive, so adding
/// a message kind forces every consumer to handle it. Ordering contract:
/// `Constructor` precedes every data event, and exactly one of
/// `Initialized` / `Failed` terminates the stream. Indexed events may
/// interleave arbitrarily across and within families; receivers route by the
/// explicit index, never by arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress { phase: Phase, percent: u8 },
    Constructor(BasisCounts),
    /// Raw bytes of the unstructured volume mesh (`internal.vtu`).
    Grid(Vec<u8>),
    Matrices(CoreMatrices),
    /// First convective tensor slice for one velocity mode.
    Ct1 { index: usize, matrix: Matrix },
    /// Second convective tensor slice for one velocity mode.
    Ct2 { index: usize, matrix: Matrix },
    /// Convection tensor slice for one velocity mode.
    C { index: usize, matrix: Matrix },
    /// Pressure-gradient tensor slice for one pressure mode (PPE only).
    G { index: usize, matrix: Matrix },
    /// Radial-basis-function weights for one turbulence mode.
    Weights { index: usize, matrix: Matrix },
    /// Regression inputs for the turbulence closure.
    Rbf { mu: Matrix, coeff_l2: Matrix },
    /// Velocity basis modes.
    Modes(Matrix),
    /// Raw bytes of the optional surface mesh (`*.vtp`), 3-D cases only.
    Surface(Vec<u8>),
    /// Terminal: every artifact delivered, no further messages.
    Initialized,
    /// Terminal: pipeline aborted. Replaces the legacy behavior of silently
    /// never reaching 100%.
    Failed(RomError),
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Initialized | PipelineEvent::Failed(_))
    }
}
