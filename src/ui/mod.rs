pub mod icons;
pub mod progress;

pub use progress::{RunnerUI, format_elapsed};
