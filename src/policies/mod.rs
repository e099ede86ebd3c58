//! Admission pacing and backpressure policies.
//!
//! This module groups the knobs that control **how many** tasks the pickup loop
//! admits per cycle, **how long** it waits between cycles, and **how** it
//! reacts to health scores.
//!
//! ## Contents
//! - [`Spread`] randomized duration `base + random[0, variance)` (inter-cycle delay)
//! - [`CountSpread`] randomized quota `floor(random[0, 1) * variance + base)` (per-cycle admissions)
//! - [`BackpressurePolicy`] what a health score does to admission
//!
//! ## Quick wiring
//! ```text
//! EngineConfig { delay: Spread, pickup_count: CountSpread, backpressure: BackpressurePolicy }
//!      └─► core::engine pickup loop uses:
//!           - pickup_count.sample() admissions per cycle
//!           - TaskKind::delay(&delay) between cycles
//!      └─► core::health monitor uses:
//!           - backpressure.hold_for(score) to hold admission
//! ```
//!
//! ## Defaults
//! - `Spread::default()` → base=1s, variance=4s.
//! - `CountSpread::default()` → base=1, variance=0 (fixed quota of one).
//! - `BackpressurePolicy::Observe` (scores are recorded, never acted on).

mod backpressure;
mod spread;

pub use backpressure::BackpressurePolicy;
pub use spread::{CountSpread, Spread};
