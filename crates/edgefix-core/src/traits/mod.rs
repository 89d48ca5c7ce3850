//! Core traits for edgefix
//!
//! This module defines the seams between the core and its collaborators.
//!
//! - [`ControlPlane`]: Authenticated request/response against the zone API
//! - [`OriginProbe`]: Direct health check against the origin server
//! - [`CredentialProvider`]: Credential store lookup and persistence
//! - [`Prompt`]: Interactive input for values the store lacks

pub mod control_plane;
pub mod credential_provider;
pub mod origin_probe;

pub use control_plane::{ApiMessage, ApiResponse, ControlPlane, Method};
pub use credential_provider::{CredentialProvider, Prompt};
pub use origin_probe::{OriginProbe, ProbeRequest, ProbeResult};
