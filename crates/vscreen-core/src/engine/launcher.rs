use crate::core::models::job::JobDescriptor;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Turns a job descriptor into an external process invocation.
///
/// The scheduler owns stdio and process lifetime; implementors only provide the program and
/// its arguments.
pub trait JobLauncher: Send + Sync {
    /// The executable started for every job, used in launch-failure reports.
    fn program(&self) -> &Path;

    fn command(&self, job: &JobDescriptor) -> Command;
}

/// Launches AutoDock Vina or a command-line compatible engine (PSOVina, QuickVina).
#[derive(Debug, Clone)]
pub struct VinaLauncher {
    executable: PathBuf,
}

impl VinaLauncher {
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
        }
    }
}

impl JobLauncher for VinaLauncher {
    fn program(&self) -> &Path {
        &self.executable
    }

    fn command(&self, job: &JobDescriptor) -> Command {
        let params = job.params();
        let center = params.pocket.center;
        let size = params.pocket.size;

        let mut command = Command::new(&self.executable);
        command
            .arg("--receptor")
            .arg(&params.receptor)
            .arg("--ligand")
            .arg(job.ligand_path())
            .arg("--center_x")
            .arg(center.x.to_string())
            .arg("--center_y")
            .arg(center.y.to_string())
            .arg("--center_z")
            .arg(center.z.to_string())
            .arg("--size_x")
            .arg(size.x.to_string())
            .arg("--size_y")
            .arg(size.y.to_string())
            .arg("--size_z")
            .arg(size.z.to_string())
            .arg("--log")
            .arg(job.log_path())
            .arg("--out")
            .arg(job.output_path())
            .arg("--exhaustiveness")
            .arg(params.exhaustiveness.to_string());
        command
    }
}
