//! Request/response abstractions over the external vision models.
//!
//! The frame loop awaits exactly one `detect` call per step for one
//! detector kind; a new request for the same kind is never issued until
//! the previous result has been consumed. `Ok(None)` means the model ran
//! and saw nothing; `Err` means the inference itself failed (logged, frame
//! skipped). A model that cannot be constructed at all is represented by
//! passing no detector to the engine, which disables that feature for the
//! process lifetime.

use std::future::Future;

use anyhow::Result;

use crate::landmarks::{HandFrame, PoseFrame};

pub trait PoseDetector: Send + 'static {
    fn detect(&mut self) -> impl Future<Output = Result<Option<PoseFrame>>> + Send;
}

pub trait HandDetector: Send + 'static {
    fn detect(&mut self) -> impl Future<Output = Result<Option<HandFrame>>> + Send;
}
