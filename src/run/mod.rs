//! External execution: launching the JULES binary against an attached
//! configuration.
//!
//! One blocking subprocess per invocation, with standard output and error
//! redirected to fixed log files in the run directory. The core never
//! retries; a non-zero exit surfaces as [`Error::Runtime`] carrying the
//! captured stderr.

use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use crate::config::{Configuration, ReadOptions};

/// Default executable name searched for on `$PATH`.
pub const JULES_EXE_NAME: &str = "jules.exe";

/// Fixed log filenames in the run directory.
pub const STDOUT_LOG: &str = "stdout.log";
pub const STDERR_LOG: &str = "stderr.log";

#[derive(Debug, Error)]
pub enum Error {
    /// The executable (or an expected directory) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provided file is not executable.
    #[error("'{}' is not an executable file", .0.display())]
    NotExecutable(PathBuf),

    /// A container mount point must be absolute.
    #[error("mount point '{}' is not an absolute path", .0.display())]
    RelativeMount(PathBuf),

    /// Containerized runs mount the run directory, so the namelists must
    /// live under it.
    #[error(
        "namelists directory '{}' is not inside run directory '{}'",
        namelists.display(),
        run_dir.display()
    )]
    OutsideRunDir {
        namelists: PathBuf,
        run_dir: PathBuf,
    },

    /// The simulation binary exited with a non-zero status.
    #[error("JULES exited with status {status:?}; captured stderr:\n{stderr}")]
    Runtime {
        /// Exit code, when the process was not killed by a signal.
        status: Option<i32>,
        /// Contents of `stderr.log`.
        stderr: String,
    },

    /// Configuration handling failed while preparing or opening a run.
    #[error(transparent)]
    Config(#[from] crate::config::Error),

    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// A located JULES executable.
#[derive(Debug, Clone)]
pub struct JulesExe {
    path: PathBuf,
}

impl JulesExe {
    /// Uses an explicit executable location.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "'{}' is not a file",
                path.display()
            )));
        }
        if !is_executable(&path) {
            return Err(Error::NotExecutable(path));
        }
        Ok(Self { path })
    }

    /// Locates [`JULES_EXE_NAME`] on `$PATH`.
    pub fn discover() -> Result<Self, Error> {
        let search = env::var_os("PATH").unwrap_or_default();
        for dir in env::split_paths(&search) {
            let candidate = dir.join(JULES_EXE_NAME);
            if candidate.is_file() && is_executable(&candidate) {
                return Ok(Self { path: candidate });
            }
        }
        Err(Error::NotFound(format!(
            "'{JULES_EXE_NAME}' was not found on PATH"
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs the binary with `namelists_dir` as its argument and `run_dir` as
    /// the working directory, redirecting output to [`STDOUT_LOG`] and
    /// [`STDERR_LOG`] inside `run_dir`.
    pub fn run(&self, namelists_dir: &Path, run_dir: &Path) -> Result<(), Error> {
        if !namelists_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "namelists directory '{}' does not exist",
                namelists_dir.display()
            )));
        }
        if !run_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "run directory '{}' does not exist",
                run_dir.display()
            )));
        }

        let stdout_path = run_dir.join(STDOUT_LOG);
        let stderr_path = run_dir.join(STDERR_LOG);
        let stdout_file = File::create(&stdout_path)?;
        let stderr_file = File::create(&stderr_path)?;

        info!(
            exe = %self.path.display(),
            namelists = %namelists_dir.display(),
            run_dir = %run_dir.display(),
            "running JULES"
        );
        let status = Command::new(&self.path)
            .arg(namelists_dir)
            .current_dir(run_dir)
            .stdout(stdout_file)
            .stderr(stderr_file)
            .status()?;

        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(Error::Runtime {
                status: status.code(),
                stderr,
            });
        }
        Ok(())
    }
}

/// Default in-container mount point for the run directory.
pub const UDOCKER_MOUNT_POINT: &str = "/root/run";

/// A JULES build packaged in a udocker container.
///
/// The run directory is volume-mounted into the container and the simulation
/// is started against the namelists path translated onto the mount point.
/// Requires the `udocker` tool on `$PATH` and a pulled container image.
#[derive(Debug, Clone)]
pub struct JulesContainer {
    container: String,
    mount_point: PathBuf,
}

impl JulesContainer {
    /// Targets the named container with the default mount point.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            mount_point: PathBuf::from(UDOCKER_MOUNT_POINT),
        }
    }

    /// Targets the named container with a custom in-container mount point,
    /// which must be an absolute path.
    pub fn with_mount_point(
        container: impl Into<String>,
        mount_point: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let mount_point = mount_point.into();
        if !mount_point.is_absolute() {
            return Err(Error::RelativeMount(mount_point));
        }
        Ok(Self {
            container: container.into(),
            mount_point,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Arguments handed to `udocker`: a volume mapping of `run_dir` onto the
    /// mount point, then the simulation invocation with `namelists_dir`
    /// translated into the container. `namelists_dir` must sit under
    /// `run_dir` or the mapping cannot reach it.
    fn arguments(&self, namelists_dir: &Path, run_dir: &Path) -> Result<Vec<OsString>, Error> {
        let relative =
            namelists_dir
                .strip_prefix(run_dir)
                .map_err(|_| Error::OutsideRunDir {
                    namelists: namelists_dir.to_path_buf(),
                    run_dir: run_dir.to_path_buf(),
                })?;

        let mut volume = run_dir.as_os_str().to_os_string();
        volume.push(":");
        volume.push(self.mount_point.as_os_str());

        Ok(vec![
            OsString::from("run"),
            OsString::from("-v"),
            volume,
            OsString::from(&self.container),
            OsString::from("-d"),
            self.mount_point.as_os_str().to_os_string(),
            self.mount_point.join(relative).into_os_string(),
        ])
    }

    /// Runs the containerized binary, redirecting output to [`STDOUT_LOG`]
    /// and [`STDERR_LOG`] inside `run_dir` like [`JulesExe::run`].
    pub fn run(&self, namelists_dir: &Path, run_dir: &Path) -> Result<(), Error> {
        if !namelists_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "namelists directory '{}' does not exist",
                namelists_dir.display()
            )));
        }
        if !run_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "run directory '{}' does not exist",
                run_dir.display()
            )));
        }

        // Resolve both before the containment check so symlinked run
        // directories map correctly.
        let namelists_dir = namelists_dir.canonicalize()?;
        let run_dir = run_dir.canonicalize()?;
        let args = self.arguments(&namelists_dir, &run_dir)?;

        let stdout_path = run_dir.join(STDOUT_LOG);
        let stderr_path = run_dir.join(STDERR_LOG);
        let stdout_file = File::create(&stdout_path)?;
        let stderr_file = File::create(&stderr_path)?;

        info!(
            container = %self.container,
            namelists = %namelists_dir.display(),
            run_dir = %run_dir.display(),
            "running JULES via udocker"
        );
        let status = Command::new("udocker")
            .args(&args)
            .current_dir(&run_dir)
            .stdout(stdout_file)
            .stderr(stderr_file)
            .status()?;

        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(Error::Runtime {
                status: status.code(),
                stderr,
            });
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// A portable [`Configuration`] materialized at a concrete directory, ready
/// to be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    config: Configuration,
    dir: PathBuf,
}

impl Experiment {
    /// Writes `config` into a fresh directory and returns the experiment.
    /// The directory must not already hold files.
    pub fn create(config: &Configuration, dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        let written = config.write(&dir, false)?;

        // Pre-create the model output directory when the namelists name one.
        if let Some(output_dir) = written.params().output_dir() {
            let output_path = Path::new(output_dir);
            if !output_path.is_absolute() {
                fs::create_dir_all(dir.join(output_path))?;
            }
        }

        Ok(Self {
            config: written,
            dir,
        })
    }

    /// Opens an existing experiment directory.
    pub fn open(dir: impl Into<PathBuf>, namelists_subdir: Option<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        let config = Configuration::read(
            &dir,
            ReadOptions {
                namelists_subdir,
                ..ReadOptions::default()
            },
        )?;
        Ok(Self { config, dir })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn namelists_dir(&self) -> PathBuf {
        self.dir.join(self.config.namelists_subdir())
    }

    /// Absolute output directory, when the namelists declare one.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.config.params().output_dir().map(|out| {
            let out = Path::new(out);
            if out.is_absolute() {
                out.to_path_buf()
            } else {
                self.dir.join(out)
            }
        })
    }

    pub fn input_files(&self) -> Vec<PathBuf> {
        self.config.input_files()
    }

    /// Executes the simulation in the experiment directory.
    pub fn run(&self, exe: &JulesExe) -> Result<(), Error> {
        if let Some(output_dir) = self.output_dir() {
            fs::create_dir_all(output_dir)?;
        }
        exe.run(&self.namelists_dir(), &self.dir)
    }
}
