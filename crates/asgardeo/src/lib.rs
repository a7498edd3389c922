//! Asgardeo / WSO2 Identity Server management API client.
//!
//! [`ManagementApi`] is the seam the tools are written against;
//! [`ManagementClient`] implements it over HTTPS with OAuth2 client
//! credentials.

mod api;
mod auth;
mod client;
mod config;
mod error;
pub mod types;

pub use api::ManagementApi;
pub use client::ManagementClient;
pub use config::{ClientConfig, DEFAULT_SCOPES, DEFAULT_TIMEOUT, ProductMode};
pub use error::{Error, Result};
pub use types::{
    ApiResource, ApiResourceQuery, ApplicationDetails, ApplicationKind, ApplicationPatch,
    ApplicationSummary, AuthorizedApiRequest, LoginFlowGeneration, LoginFlowRequest,
    LoginFlowStatus, NewApiResource, NewApplication, NewUser, OidcConfig, ScopeCreate,
};
