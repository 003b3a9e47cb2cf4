//! Ports layer for the rotation pool.
//!
//! - Inbound (Driving) ports: operations exposed to the API/admin layer
//! - Outbound (Driven) ports: registry, payout schedule, durable store, alerts, clock

pub mod inbound;
pub mod outbound;

pub use inbound::{ParticipantStatus, RotationApi};
pub use outbound::{AlertSink, ParticipantRegistry, PayoutSchedule, PoolStore, TimeSource};
