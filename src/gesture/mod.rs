pub mod engine;
pub mod shapes;
pub mod state;
mod volume;

pub use engine::{CursorUpdate, GestureEngine, GestureOutput, GestureStatus};
pub use state::{GestureLabel, GestureState};
