//! Uploading local media and waiting for the remote store to finish processing it.
//!
//! [`AssetPoller`] is an explicit state machine
//! (`Waiting → Active | Failed | TimedOut`) over any [`AssetStore`], driven by a
//! [`Clock`](crate::clock::Clock).

pub mod model;
pub mod poller;
pub mod store;

pub use model::{AssetState, RemoteAsset};
pub use poller::{AssetPoller, Error as AssetError, PollConfig, PollState};
pub use store::{AssetStore, Upload};
