use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::core::error::{Result, SpawnError};

/// The process to start once the robot exists in the simulation, typically
/// `ros2 run webots_ros2_driver driver` for that robot.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverLauncher {
    pub program: String,
    pub args: Vec<String>,
}

impl DriverLauncher {
    /// `None` for an empty command line.
    pub fn from_command_line(command_line: &[String]) -> Option<Self> {
        let (program, args) = command_line.split_first()?;
        Some(DriverLauncher {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Starts the driver and returns a handle that resolves when it exits.
    pub fn launch(&self) -> Result<JoinHandle<Option<i32>>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|e| SpawnError::Launch {
                program: self.program.clone(),
                source: e,
            })?;

        let program = self.program.clone();
        log::info!(target: "urdf_spawner", "Started the driver '{}'.", program);

        let handle = tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    if !status.success() {
                        log::error!(target: "urdf_spawner",
                            "{} exited with code {:?}", program, status.code());
                    } else {
                        log::info!(target: "urdf_spawner", "{} exited successfully", program);
                    }
                    status.code()
                }
                Err(e) => {
                    log::error!(target: "urdf_spawner", "Error waiting for {}: {e}", program);
                    None
                }
            }
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line() {
        assert_eq!(DriverLauncher::from_command_line(&[]), None);

        let command_line: Vec<String> = ["ros2", "run", "webots_ros2_driver", "driver"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let driver = DriverLauncher::from_command_line(&command_line).unwrap();
        assert_eq!(driver.program, "ros2");
        assert_eq!(driver.args, vec!["run", "webots_ros2_driver", "driver"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_reports_exit_code() {
        let driver = DriverLauncher {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };
        let code = driver.launch().unwrap().await.unwrap();
        assert_eq!(code, Some(3));
    }

    #[tokio::test]
    async fn test_launch_failure_is_an_error() {
        let driver = DriverLauncher {
            program: "/nonexistent/driver".to_string(),
            args: vec![],
        };
        assert!(matches!(driver.launch(), Err(SpawnError::Launch { .. })));
    }
}
