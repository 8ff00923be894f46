//! Seams to the hosting environment (editor shell or terminal front end).
//!
//! The auth provider never talks to a UI directly; it goes through these
//! traits so hosts can render the flow however they like and tests can
//! script it.

use anyhow::Result;
use async_trait::async_trait;

/// Which login surface a browser callback came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFlavor {
    /// The local desktop app.
    LocalApp,
    /// The public instance.
    Dotcom,
}

/// Login method picked from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginChoice {
    /// Re-use a previously authenticated endpoint.
    History(String),
    /// Enter a new enterprise instance URL, then sign in via browser.
    Enterprise,
    /// Sign in to the public instance via browser.
    Dotcom,
    /// Paste an access token directly.
    AccessToken,
}

/// Two-step instance-URL + token entry. A `None` field means the user
/// skipped that step.
#[derive(Debug, Clone, Default)]
pub struct CredentialInput {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

/// Integration points with the hosting environment.
#[async_trait]
pub trait Host: Send + Sync {
    /// Sets the activation flag that gates assistant features in the host.
    async fn set_activated(&self, activated: bool);

    /// Opens an external URL in the user's browser.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn open_external(&self, url: &str) -> Result<()>;

    /// Shows the post-login notification. Returns true when the user picked
    /// the follow-up action.
    async fn show_login_success(&self, flavor: CallbackFlavor) -> bool;

    /// Focuses the main chat surface.
    async fn focus_chat(&self);

    /// Client-identifying value sent as the `requestFrom` parameter on the
    /// browser redirect.
    fn request_from(&self) -> &str;
}

/// Interactive prompts for the login flow.
///
/// Every method resolves to `None` on cancellation; call sites treat that as
/// a silent end of the flow.
#[async_trait]
pub trait LoginPrompts: Send + Sync {
    /// Presents the login menu over the endpoint history.
    async fn choose_login(&self, history: &[String]) -> Option<LoginChoice>;

    /// Prompts for an enterprise instance URL.
    async fn endpoint_input(&self) -> Option<String>;

    /// Prompts for an instance URL and access token, suggesting `endpoint`
    /// as the instance.
    async fn credential_input(&self, endpoint: &str) -> Option<CredentialInput>;
}
