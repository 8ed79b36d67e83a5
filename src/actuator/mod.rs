pub mod link;

pub use link::{ActuatorHandle, ActuatorLink};
