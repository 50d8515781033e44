pub mod core;
pub use crate::core::environment::*;
pub use crate::core::error::SpawnError;
pub use crate::core::message::*;
pub use crate::core::paths::*;
pub use crate::core::structs::*;

pub mod ros;
pub use crate::ros::driver_launcher::*;
pub use crate::ros::spawner::*;
