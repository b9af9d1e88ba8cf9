//! Band-steering compliance engine.
//!
//! Ingests an 802.11 capture via an external packet dissector, reconstructs
//! the steering timeline for a single primary client, scores compliance
//! against four explicit checks, and assembles a persisted verdict
//! artifact. Pipeline order: [`dissector`] (C1) -> [`device`]/[`client`]
//! (C2/C4) -> [`aggregate`] (C5, source of truth) -> [`steering`] (C6) ->
//! [`compliance`] (C7) -> [`analyze`]/[`persist`] (C8) -> [`registry`] (C9).
//!
//! [`analyze::analyze_capture`] wires C1 through C8 for a single file;
//! [`persist`] and [`registry`] own the on-disk analysis tree.

pub mod aggregate;
pub mod analyze;
pub mod client;
pub mod compliance;
pub mod config;
pub mod deauth;
pub mod device;
pub mod dissector;
pub mod error;
pub mod model;
pub mod persist;
pub mod registry;
pub mod steering;

pub use analyze::{analyze_capture, analyze_records};
pub use config::{EngineConfig, UserMetadata};
pub use dissector::{Band, CaptureRecord, DissectorError, RecordSource, TsharkSource, VecRecordSource};
pub use error::{AnalysisError, PersistenceError};
pub use model::BandSteeringAnalysis;
