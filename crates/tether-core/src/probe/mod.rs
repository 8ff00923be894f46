//! Remote probe client: queries an instance for feature and user state.
//!
//! Probe failures are values (`ProbeError`), never propagated faults. The
//! auth provider downgrades every failed probe to an unauthenticated status.

mod graphql;

pub use graphql::GraphQlProbe;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::endpoint;

/// Endpoint + token + custom headers a probe client is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub custom_headers: HashMap<String, String>,
}

/// Remote feature flag and product version reported by the instance.
///
/// Degrades to disabled/empty when the site cannot be reached, so the
/// version string doubles as a "was the site reachable" hint for callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistStatus {
    pub enabled: bool,
    pub version: String,
}

/// Current-user identity fields from the combined lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub has_verified_email: bool,
}

/// Categories of probe failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection or transport failure
    Network,
    /// Failed to parse the response envelope
    Parse,
    /// GraphQL-level errors returned in the envelope
    GraphQl,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeErrorKind::HttpStatus => write!(f, "http_status"),
            ProbeErrorKind::Network => write!(f, "network"),
            ProbeErrorKind::Parse => write!(f, "parse"),
            ProbeErrorKind::GraphQl => write!(f, "graphql"),
        }
    }
}

/// Structured probe failure with kind and details.
#[derive(Debug, Clone)]
pub struct ProbeError {
    /// Error category
    pub kind: ProbeErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g. raw error body)
    pub details: Option<String>,
}

impl ProbeError {
    /// Creates a new probe error.
    pub fn new(kind: ProbeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ProbeErrorKind::HttpStatus,
            message: format!("HTTP {status}"),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a transport error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProbeErrorKind::Network, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProbeErrorKind::Parse, message)
    }

    /// Creates an error from the `errors` list of a GraphQL envelope.
    pub fn graphql(messages: &[String]) -> Self {
        Self::new(ProbeErrorKind::GraphQl, messages.join("; "))
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProbeError {}

/// Result type for probe operations.
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Remote calls the auth provider needs from an instance.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Feature flag and product version. Degrades internally; never errors.
    async fn site_assist_status(&self) -> AssistStatus;

    /// True when the bound endpoint is the public instance.
    fn is_dotcom(&self) -> bool;

    /// Looks up the current user's id for the bound token.
    async fn current_user_id(&self) -> ProbeResult<String>;

    /// Looks up the current user's id and email verification together.
    async fn current_user_info(&self) -> ProbeResult<UserInfo>;
}

/// Builds probe clients bound to a config.
pub trait ProbeFactory: Send + Sync {
    fn build(&self, config: &ClientConfig) -> Box<dyn ProbeClient>;
}

/// Production factory producing [`GraphQlProbe`] clients.
#[derive(Debug, Default)]
pub struct GraphQlProbeFactory;

impl ProbeFactory for GraphQlProbeFactory {
    fn build(&self, config: &ClientConfig) -> Box<dyn ProbeClient> {
        Box::new(GraphQlProbe::new(config.clone()))
    }
}

/// Shared classification used by probe implementations.
pub(crate) fn config_is_dotcom(config: &ClientConfig) -> bool {
    endpoint::is_dotcom(&config.endpoint)
}
