pub mod environment;
pub mod error;
pub mod message;
pub mod paths;
pub mod structs;
