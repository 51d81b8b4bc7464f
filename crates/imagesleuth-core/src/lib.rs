/// ImageSleuth Core: corrupt-image detection, scanning, and reporting.
///
/// This crate contains all business logic with zero front-end dependencies.
/// It is designed to be reusable across different front ends (CLI, HTTP, GUI).
///
/// # Modules
///
/// - [`model`]: Work items, batches, findings, and the shared scan state.
/// - [`validate`]: Header sniffing, forced decode, pixel sampling, and
///   structural verification of individual image files.
/// - [`scanner`]: Task enumeration, batching, the worker pool, and the
///   background scan coordinator.
/// - [`report`]: Persisting the final corrupt-file list.
/// - [`config`]: Tunables for worker count, batching, and sampling.
/// - [`error`]: Typed errors surfaced to callers.
pub mod config;
pub mod error;
pub mod model;
pub mod report;
pub mod scanner;
pub mod validate;
