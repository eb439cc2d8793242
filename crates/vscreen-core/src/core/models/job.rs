use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The search region of the receptor: a box centered on the binding pocket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockingBox {
    /// Center of the pocket in receptor coordinates (Å).
    pub center: Point3<f64>,
    /// Edge lengths of the search box along x, y and z (Å).
    pub size: Vector3<f64>,
}

impl DockingBox {
    pub fn new(center: Point3<f64>, size: Vector3<f64>) -> Self {
        Self { center, size }
    }

    pub fn from_arrays(center: [f64; 3], size: [f64; 3]) -> Self {
        Self::new(Point3::from(center), Vector3::from(size))
    }
}

/// Geometry and search settings shared by every job of one docking round.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingParams {
    pub receptor: PathBuf,
    pub pocket: DockingBox,
    pub exhaustiveness: u32,
}

/// A single docking invocation, fully resolved before launch.
///
/// Descriptors are immutable once built. The docking parameters are shared between all
/// descriptors of a batch through an [`Arc`], so cloning a descriptor is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    molecule_id: String,
    ligand_path: PathBuf,
    output_path: PathBuf,
    log_path: PathBuf,
    params: Arc<DockingParams>,
}

impl JobDescriptor {
    pub fn new(
        molecule_id: impl Into<String>,
        ligand_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
        params: Arc<DockingParams>,
    ) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            ligand_path: ligand_path.into(),
            output_path: output_path.into(),
            log_path: log_path.into(),
            params,
        }
    }

    pub fn molecule_id(&self) -> &str {
        &self.molecule_id
    }

    pub fn ligand_path(&self) -> &Path {
        &self.ligand_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn params(&self) -> &DockingParams {
        &self.params
    }
}

/// Derives the molecule identifier from a ligand or result file name by stripping its
/// extension (`"Z1234.pdbqt"` becomes `"Z1234"`).
///
/// Returns `None` for paths without a usable UTF-8 file stem.
pub fn molecule_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
