use std::io::ErrorKind;
use std::process::{Command, Stdio};

use crate::core::error::{Result, SpawnError};

pub static SHARED_FOLDER_ENV: &'static str = "WEBOTS_SHARED_FOLDER";
pub static KERNEL_RELEASE_FILE: &'static str = "/proc/sys/kernel/osrelease";
pub static DEFAULT_WSLPATH_EXECUTABLE: &'static str = "wslpath";

/// What the spawner needs to know about where it runs compared to where
/// Webots runs. Injected so tests never touch the real host.
pub trait ExecutionEnvironment {
    /// Running inside WSL, i.e. Webots is a Windows process.
    fn is_wsl(&self) -> bool;

    /// Webots runs in a container reachable only through a shared folder.
    fn has_shared_folder(&self) -> bool;

    /// Root of the shared folder as mounted where this process runs.
    fn container_shared_folder(&self) -> Result<String>;

    /// Root of the shared folder as seen by Webots.
    fn host_shared_folder(&self) -> Result<String>;

    /// Rewrite a WSL path into its Windows equivalent.
    fn to_windows_path(&self, path: &str) -> Result<String>;

    fn descriptor(&self) -> ExecutionEnvironmentDescriptor {
        ExecutionEnvironmentDescriptor {
            wsl: self.is_wsl(),
            shared_folder: self.has_shared_folder(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionEnvironmentDescriptor {
    pub wsl: bool,
    pub shared_folder: bool,
}

/// The real environment: kernel release for WSL detection,
/// `WEBOTS_SHARED_FOLDER=<host_root>:<container_root>` for the shared folder
/// and `wslpath` for conversions.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    shared_folder: Option<String>,
    kernel_release: Option<String>,
    wslpath_executable: String,
}

impl HostEnvironment {
    pub fn detect() -> Self {
        let shared_folder = std::env::var(SHARED_FOLDER_ENV).ok();
        let kernel_release = std::fs::read_to_string(KERNEL_RELEASE_FILE).ok();
        log::debug!(target: "urdf_spawner",
            "Detected kernel release {:?}, shared folder {:?}.", kernel_release, shared_folder);
        HostEnvironment::new(shared_folder, kernel_release)
    }

    pub fn new(shared_folder: Option<String>, kernel_release: Option<String>) -> Self {
        HostEnvironment {
            shared_folder,
            kernel_release,
            wslpath_executable: DEFAULT_WSLPATH_EXECUTABLE.to_string(),
        }
    }

    pub fn with_wslpath_executable(mut self, wslpath_executable: &str) -> Self {
        self.wslpath_executable = wslpath_executable.to_string();
        self
    }

    fn shared_folder_roots(&self) -> Result<(String, String)> {
        let value = self.shared_folder.clone().unwrap_or_default();
        // Split on the last colon, the host side may carry a drive letter.
        match value.rsplit_once(':') {
            Some((host, container)) if !host.is_empty() && !container.is_empty() => {
                Ok((host.to_string(), container.to_string()))
            }
            _ => Err(SpawnError::SharedFolder(value)),
        }
    }
}

impl ExecutionEnvironment for HostEnvironment {
    fn is_wsl(&self) -> bool {
        match &self.kernel_release {
            Some(release) => release.to_lowercase().contains("microsoft"),
            None => false,
        }
    }

    fn has_shared_folder(&self) -> bool {
        self.shared_folder.is_some()
    }

    fn container_shared_folder(&self) -> Result<String> {
        Ok(self.shared_folder_roots()?.1)
    }

    fn host_shared_folder(&self) -> Result<String> {
        Ok(self.shared_folder_roots()?.0)
    }

    fn to_windows_path(&self, path: &str) -> Result<String> {
        let conversion_error = |source: std::io::Error| SpawnError::PathConversion {
            path: path.to_string(),
            source,
        };

        let output = Command::new(&self.wslpath_executable)
            .arg("-w")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(conversion_error)?;

        if !output.status.success() {
            return Err(conversion_error(std::io::Error::new(
                ErrorKind::Other,
                format!(
                    "{} exited with code {:?}: {}",
                    self.wslpath_executable,
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )));
        }

        String::from_utf8(output.stdout)
            .map(|converted| converted.trim().to_string())
            .map_err(|e| conversion_error(std::io::Error::new(ErrorKind::InvalidData, e)))
    }
}
