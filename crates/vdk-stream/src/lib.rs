//! Streaming boundary for the continuous vital-sign sources.
//!
//! Replays per-patient continuous CSVs onto a message transport
//! ([`replay_patients`]) and drains the two continuous topics into bounded
//! most-recent buffers with periodic CSV snapshots ([`run_consumer`]).
//!
//! The transport is a seam: the async [`StreamBroker`] trait, with the
//! in-process [`ChannelBroker`] (one tokio broadcast channel per topic) as
//! the default implementation. Wire messages are JSON-serialized
//! [`vdk_schemas::StreamRecord`] envelopes keyed by patient id; topics are
//! named by [`vdk_schemas::SourceKind::as_str`].
//!
//! This crate does **not**:
//! - merge or reconcile timelines (see `vdk-reconcile`)
//! - speak to an external broker (implement [`StreamBroker`] for that)

mod broker;
mod consume;
mod replay;

pub use broker::{ChannelBroker, MessageStream, StreamBroker, DEFAULT_CHANNEL_CAPACITY};
pub use consume::{
    run_consumer, subscribe_continuous, ConsumerBuffers, ConsumerOptions, SnapshotStats,
    TopicSubscriptions,
};
pub use replay::{replay_patients, ReplayOptions, ReplaySummary};
