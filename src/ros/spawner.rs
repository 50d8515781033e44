use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::core::environment::ExecutionEnvironment;
use crate::core::error::{Result, SpawnError};
use crate::core::message::SpawnMessage;
use crate::core::paths::{preview_relative_path_prefix, reconcile_relative_path_prefix};
use crate::core::structs::{OutputMode, ProcessOutcome, SpawnRequest};

pub static DEFAULT_ROS2_EXECUTABLE: &'static str = "ros2";
pub static SPAWN_SERVICE: &'static str = "/spawn_urdf_robot";
pub static SPAWN_SERVICE_TYPE: &'static str = "webots_ros2_msgs/srv/SpawnUrdfRobot";
pub static SPAWN_SUCCESS_MARKER: &'static str = "success=True";

/// Returns `surviving` when the `ros2 service call` output reports a
/// successful response, `None` otherwise. Only the human readable response
/// is available, so this is a plain substring check.
pub fn classify_spawn_response<T>(stdout: &[u8], surviving: T) -> Option<T> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().contains(SPAWN_SUCCESS_MARKER) {
        return Some(surviving);
    }
    log::warn!(target: "urdf_spawner", "The Ros2Supervisor was not able to spawn this URDF robot.");
    None
}

/// Sends URDF robots to the Webots Ros2Supervisor through the
/// `/spawn_urdf_robot` service.
pub struct UrdfSpawner<E: ExecutionEnvironment> {
    env: Arc<E>,
    ros2_executable: String,
    output: OutputMode,
}

impl<E: ExecutionEnvironment> UrdfSpawner<E> {
    pub fn new(env: E) -> Self {
        UrdfSpawner {
            env: Arc::new(env),
            ros2_executable: DEFAULT_ROS2_EXECUTABLE.to_string(),
            output: OutputMode::default(),
        }
    }

    pub fn with_ros2_executable(mut self, ros2_executable: &str) -> Self {
        self.ros2_executable = ros2_executable.to_string();
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Reconciles the relative path prefix and builds the request message.
    /// Blocks on `wslpath` and on the shared folder copy.
    pub fn prepare(&self, request: &SpawnRequest) -> Result<SpawnMessage> {
        let relative_path_prefix = reconcile_relative_path_prefix(
            request.relative_path_prefix.as_deref(),
            self.env.as_ref(),
        )?;
        Ok(SpawnMessage::from_request(request, &relative_path_prefix))
    }

    /// The message `prepare` would build, without copying anything into the
    /// shared folder.
    pub fn preview(&self, request: &SpawnRequest) -> Result<SpawnMessage> {
        let relative_path_prefix = preview_relative_path_prefix(
            request.relative_path_prefix.as_deref(),
            self.env.as_ref(),
        )?;
        Ok(SpawnMessage::from_request(request, &relative_path_prefix))
    }

    /// The full command line, executable included.
    pub fn command_line(&self, message: &SpawnMessage) -> Vec<String> {
        vec![
            self.ros2_executable.clone(),
            "service".to_string(),
            "call".to_string(),
            SPAWN_SERVICE.to_string(),
            SPAWN_SERVICE_TYPE.to_string(),
            message.serialize(),
        ]
    }

    /// Runs `ros2 service call` to completion. No timeout, a dispatched spawn
    /// can't be withdrawn.
    pub async fn call(&self, message: &SpawnMessage) -> Result<ProcessOutcome> {
        let command_line = self.command_line(message);
        log::info!(target: "urdf_spawner", "Calling {} ({}).", SPAWN_SERVICE, SPAWN_SERVICE_TYPE);
        log::debug!(target: "urdf_spawner", "Spawn request: {}", command_line[5]);

        let output = Command::new(&command_line[0])
            .args(&command_line[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SpawnError::Launch {
                program: self.ros2_executable.clone(),
                source: e,
            })?;

        let outcome = ProcessOutcome {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        };
        self.forward_output(&outcome);
        Ok(outcome)
    }

    fn forward_output(&self, outcome: &ProcessOutcome) {
        let stdout = String::from_utf8_lossy(&outcome.stdout);
        let stderr = String::from_utf8_lossy(&outcome.stderr);
        match self.output {
            OutputMode::Screen => {
                print!("{}", stdout);
                eprint!("{}", stderr);
            }
            OutputMode::Log => {
                for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
                    log::debug!(target: "urdf_spawner", "[ros2] {}", line);
                }
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    log::debug!(target: "urdf_spawner", "[ros2 stderr] {}", line);
                }
            }
        }
        log::debug!(target: "urdf_spawner", "ros2 service call exited with code {:?}.", outcome.exit_code);
    }
}

impl<E: ExecutionEnvironment + Send + Sync + 'static> UrdfSpawner<E> {
    /// `prepare` on the blocking pool, so the copy never stalls the runtime.
    pub async fn prepare_blocking(&self, request: &SpawnRequest) -> Result<SpawnMessage> {
        let env = self.env.clone();
        let relative_path_prefix = request.relative_path_prefix.clone();
        let resolved = tokio::task::spawn_blocking(move || {
            reconcile_relative_path_prefix(relative_path_prefix.as_deref(), env.as_ref())
        })
        .await??;
        Ok(SpawnMessage::from_request(request, &resolved))
    }

    /// Prepares, dispatches and classifies one spawn. `surviving` comes back
    /// only if the Ros2Supervisor accepted the robot.
    pub async fn spawn<T>(&self, request: &SpawnRequest, surviving: T) -> Result<Option<T>> {
        let message = self.prepare_blocking(request).await?;
        let outcome = self.call(&message).await?;
        Ok(classify_spawn_response(&outcome.stdout, surviving))
    }
}
