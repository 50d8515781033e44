use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, SpawnError};

pub static DEFAULT_TRANSLATION: &'static str = "0 0 0";
pub static DEFAULT_ROTATION: &'static str = "0 0 1 0";

/// Everything the Ros2Supervisor needs to know to insert a URDF robot.
/// Fields left out of a request file fall back to the same defaults as the
/// command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnRequest {
    pub name: Option<String>,
    pub urdf_path: Option<String>,
    pub robot_description: Option<String>,
    pub relative_path_prefix: Option<String>,
    pub translation: String,
    pub rotation: String,
    pub normal: bool,
    pub box_collision: bool,
    pub init_pos: Option<String>,
}

impl Default for SpawnRequest {
    fn default() -> Self {
        SpawnRequest {
            name: None,
            urdf_path: None,
            robot_description: None,
            relative_path_prefix: None,
            translation: DEFAULT_TRANSLATION.to_string(),
            rotation: DEFAULT_ROTATION.to_string(),
            normal: false,
            box_collision: false,
            init_pos: None,
        }
    }
}

impl SpawnRequest {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SpawnError::RequestFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SpawnError::RequestFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Stdout, stderr and exit status of a finished `ros2 service call`.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Log,
    Screen,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(OutputMode::Log),
            "screen" => Ok(OutputMode::Screen),
            other => Err(format!("unknown output mode '{other}', expected 'log' or 'screen'")),
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Log => write!(f, "log"),
            OutputMode::Screen => write!(f, "screen"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_request_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "tesla", "urdf_path": "/tmp/tesla.urdf", "normal": true}}"#)
            .unwrap();

        let request = SpawnRequest::from_json_file(file.path()).unwrap();
        assert_eq!(request.name.as_deref(), Some("tesla"));
        assert_eq!(request.urdf_path.as_deref(), Some("/tmp/tesla.urdf"));
        assert!(request.normal);
        assert!(!request.box_collision);
        assert_eq!(request.translation, DEFAULT_TRANSLATION);
        assert_eq!(request.rotation, DEFAULT_ROTATION);
    }

    #[test]
    fn test_request_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        match SpawnRequest::from_json_file(file.path()) {
            Err(SpawnError::RequestFile { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected a request file error, got {:?}", other),
        }
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("screen".parse::<OutputMode>(), Ok(OutputMode::Screen));
        assert_eq!("LOG".parse::<OutputMode>(), Ok(OutputMode::Log));
        assert!("both".parse::<OutputMode>().is_err());
    }
}
