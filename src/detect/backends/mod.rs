pub mod scripted;
pub mod synthetic;

pub use scripted::{ScriptStep, ScriptedDetector};
pub use synthetic::SyntheticPerson;
