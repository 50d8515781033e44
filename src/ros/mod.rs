pub mod driver_launcher;
pub mod spawner;
