//! Noisy-statistics engine boundary
//!
//! The engine is the only component that reads raw data files; this service
//! never computes noise itself. Everything crossing the boundary goes through
//! [`EngineClient`] and the typed request/response structs in this module.

mod client;

pub use client::{DeleteFileRequest, EngineClient, EngineError, NoisyRequest, NoisyResponse};

pub type EngineResult<T> = Result<T, EngineError>;
