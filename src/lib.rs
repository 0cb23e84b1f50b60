//! `dualpi2-l4s`: a DCTCP sender paired with a PI²/DualQ Coupled AQM bottleneck.
//!
//! This crate models the two halves of an L4S path: [`dctcp`] is the sender-side congestion
//! control that reacts to ECN marks with a smoothed marked-fraction estimator instead of a flat
//! multiplicative decrease, and [`dual_queue`] is the bottleneck-side scheduler that produces
//! those marks — two FIFOs (Classic and L4S) arbitrated by a time-shift rule and a shared
//! [`pi_controller::PiController`] that turns queuing delay into mark/drop probability.
//!
//! Packet/header (de)serialization, routing, and any actual network I/O are out of scope: the
//! queue works over anything implementing [`item::Item`], and the sender works over sequence
//! numbers and ACK events a socket layer would supply. Wiring either half into a real event loop
//! or socket stack is left to the caller; see [`pi_controller::PiController::sample`] and
//! [`dual_queue::DualQueue::sample_pi`] for where a caller's own timer drives this crate instead
//! of the reverse.

pub mod config;
pub mod congestion;
pub mod dctcp;
pub mod dual_queue;
pub mod error;
pub mod item;
pub mod pi_controller;
pub mod rng;
pub mod seq;
pub mod time;

pub use config::{DctcpConfig, DualQueueConfig, PiConfig};
pub use congestion::{CongestionControl, CongestionState, NewReno};
pub use dctcp::{AckFlags, CeMirrorHost, CwndEvent, Dctcp, EcnState};
pub use dual_queue::{DualQueue, Mode, Stats};
pub use error::ConfigError;
pub use item::Item;
pub use pi_controller::{PiController, SampleOutcome};
pub use rng::StreamRng;
pub use seq::SequenceNumber;
pub use time::{Duration, Instant};
