pub mod alert;
pub mod classifier;

pub use alert::{AlertMonitor, AlertNotice, AlertSignal};
pub use classifier::{
    CalibrationProfile, Classification, PostureClassifier, PostureLabel, PostureVerdict,
    StandingTransition,
};
