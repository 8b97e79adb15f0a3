#![forbid(unsafe_code)]

pub mod api;
pub mod credentials;
pub mod http;
pub mod scripted;
mod wire;

pub use api::{GatewayError, LearningApi, RemoteError};
pub use credentials::Credentials;
pub use http::{HttpGateway, HttpGatewayError};
pub use scripted::{GatewayCall, Release, ScriptedGateway};
