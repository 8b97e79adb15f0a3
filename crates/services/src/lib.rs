#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod reconcile;
pub mod store;

pub use client::LearningClient;
pub use config::ClientConfig;
pub use dispatch::{Dispatcher, Operation, OperationHandle, Phase};
pub use error::{ClientError, ConfigError, OperationError};
pub use reconcile::{MergeMiss, ProgressStats};
pub use store::{LearningState, LearningStore, Slice, SliceKind, StoreEvent, TopicsData};
