//! Session/authentication orchestrator.
//!
//! `AuthProvider` owns the working endpoint, the endpoint history cache, and
//! the last derived [`AuthStatus`]. Every state-mutating operation takes
//! `&mut self`: exclusive borrows are the serialization discipline here, so
//! two flows cannot interleave on one provider value. Callers that share a
//! provider across tasks wrap it in an async mutex.

use std::collections::HashMap;

use anyhow::{Context, Result};
use url::Url;

use crate::endpoint::{DOTCOM_URL, LOCAL_APP_URL, is_local_app, normalize_endpoint};
use crate::host::{CallbackFlavor, Host, LoginChoice, LoginPrompts};
use crate::probe::{ClientConfig, ProbeClient, ProbeFactory};

use super::history::HistoryStore;
use super::secrets::SecretStore;
use super::status::AuthStatus;

/// Path on an instance that mints a token and redirects back to the client.
const TOKEN_CALLBACK_PATH: &str = "user/settings/tokens/new/callback";

/// Orchestrates login flows and derives the authentication status.
pub struct AuthProvider {
    endpoint: String,
    endpoint_history: Vec<String>,
    config: ClientConfig,
    status: Option<AuthStatus>,
    probe: Option<Box<dyn ProbeClient>>,
    probe_factory: Box<dyn ProbeFactory>,
    secrets: Box<dyn SecretStore>,
    history: Box<dyn HistoryStore>,
    host: Box<dyn Host>,
    prompts: Box<dyn LoginPrompts>,
}

impl AuthProvider {
    /// Creates a provider and loads the endpoint history from the store.
    pub fn new(
        config: ClientConfig,
        secrets: Box<dyn SecretStore>,
        history: Box<dyn HistoryStore>,
        host: Box<dyn Host>,
        prompts: Box<dyn LoginPrompts>,
        probe_factory: Box<dyn ProbeFactory>,
    ) -> Self {
        let endpoint = if config.endpoint.is_empty() {
            DOTCOM_URL.to_string()
        } else {
            normalize_endpoint(&config.endpoint)
        };
        let mut provider = Self {
            endpoint,
            endpoint_history: Vec::new(),
            config,
            status: None,
            probe: None,
            probe_factory,
            secrets,
            history,
            host,
            prompts,
        };
        provider.load_endpoint_history();
        provider
    }

    /// Current working endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Endpoints with previously stored credentials, oldest first.
    pub fn endpoint_history(&self) -> &[String] {
        &self.endpoint_history
    }

    /// Most recently computed status, if any flow has produced one.
    pub fn status(&self) -> Option<&AuthStatus> {
        self.status.as_ref()
    }

    /// Interactive login entry point.
    ///
    /// An empty or missing hint never erases the current endpoint.
    /// Cancellation at any prompt silently ends the flow.
    ///
    /// # Errors
    /// Returns an error if credential persistence fails.
    pub async fn login(&mut self, endpoint_hint: Option<&str>) -> Result<()> {
        self.set_endpoint(endpoint_hint);
        let Some(choice) = self.prompts.choose_login(&self.endpoint_history).await else {
            return Ok(());
        };
        match choice {
            LoginChoice::Enterprise => {
                let Some(input) = self.prompts.endpoint_input().await else {
                    return Ok(());
                };
                if input.trim().is_empty() {
                    return Ok(());
                }
                self.set_endpoint(Some(&input));
                self.redirect_to_endpoint_login(false)?;
            }
            LoginChoice::Dotcom => self.redirect_to_endpoint_login(true)?,
            LoginChoice::AccessToken => {
                let input = self.prompts.credential_input(&self.endpoint).await;
                if let Some(input) = input {
                    self.store_auth_info(input.endpoint.as_deref(), input.token.as_deref())?;
                }
            }
            LoginChoice::History(selected) => {
                // Auto log in when a token for the selected instance is stored.
                let token = self.secrets.get(&selected)?;
                if self.auth(&selected, token.as_deref(), None).await {
                    return Ok(());
                }
                let Some(input) = self.prompts.credential_input(&selected).await else {
                    return Ok(());
                };
                self.store_auth_info(Some(&selected), input.token.as_deref())?;
            }
        }
        Ok(())
    }

    /// Computes the auth status for a config.
    ///
    /// A missing token or endpoint short-circuits to the default status with
    /// no remote call. The probe client is rebuilt only when the config
    /// differs from the one used last.
    pub async fn get_auth_status(&mut self, config: &ClientConfig) -> AuthStatus {
        let has_token = config.token.as_deref().is_some_and(|t| !t.is_empty());
        if !has_token || config.endpoint.is_empty() {
            return AuthStatus::default_status();
        }

        if self.config != *config || self.probe.is_none() {
            self.config = config.clone();
            self.probe = Some(self.probe_factory.build(config));
        }
        // The slot was filled above when empty.
        let probe = self.probe.as_deref().expect("probe client is bound");

        let assist = probe.site_assist_status().await;
        let dotcom_or_app = probe.is_dotcom() || is_local_app(&config.endpoint);

        if !dotcom_or_app {
            let user_id = probe.current_user_id().await;
            if let Err(err) = &user_id {
                tracing::debug!("user id probe failed for {}: {err}", config.endpoint);
            }
            return AuthStatus::from_probe(
                dotcom_or_app,
                user_id.is_ok(),
                false,
                assist.enabled,
                assist.version,
            );
        }

        match probe.current_user_info().await {
            Err(err) => {
                tracing::debug!("user info probe failed for {}: {err}", config.endpoint);
                AuthStatus::unauthenticated()
            }
            Ok(user) => AuthStatus::from_probe(
                dotcom_or_app,
                !user.id.is_empty(),
                user.has_verified_email,
                true,
                assist.version,
            ),
        }
    }

    /// Authenticates the endpoint/token pair, records the resulting status,
    /// and signals the activation flag to the host (always, including on
    /// failure). Returns whether the user is logged in.
    pub async fn auth(
        &mut self,
        endpoint: &str,
        token: Option<&str>,
        custom_headers: Option<HashMap<String, String>>,
    ) -> bool {
        let config = ClientConfig {
            endpoint: endpoint.to_string(),
            token: token.map(ToString::to_string),
            custom_headers: custom_headers.unwrap_or_else(|| self.config.custom_headers.clone()),
        };
        let status = self.get_auth_status(&config).await;
        let logged_in = status.logged_in();
        self.status = Some(status);
        self.host.set_activated(logged_in).await;
        logged_in
    }

    /// Handles the browser redirect callback.
    ///
    /// A `type=app` callback switches the working endpoint to the local app
    /// before the token is extracted. Returns the last computed status, or
    /// `None` when the callback carries no usable token (no state change).
    ///
    /// # Errors
    /// Returns an error if credential persistence fails.
    pub async fn token_callback_handler(
        &mut self,
        callback: &Url,
        custom_headers: HashMap<String, String>,
    ) -> Result<Option<AuthStatus>> {
        let is_app = callback
            .query_pairs()
            .any(|(name, value)| name == "type" && value == "app");
        if is_app {
            self.endpoint = LOCAL_APP_URL.to_string();
        }
        let endpoint = self.endpoint.clone();
        let token = callback
            .query_pairs()
            .find(|(name, _)| name == "code")
            .map(|(_, value)| value.into_owned());

        let Some(token) = token else {
            return Ok(None);
        };
        if token.is_empty() || endpoint.is_empty() {
            return Ok(None);
        }

        self.store_auth_info(Some(&endpoint), Some(&token))?;
        let authed = self.auth(&endpoint, Some(&token), Some(custom_headers)).await;
        if authed {
            let flavor = if is_app {
                CallbackFlavor::LocalApp
            } else {
                CallbackFlavor::Dotcom
            };
            if self.host.show_login_success(flavor).await {
                self.host.focus_chat().await;
            }
        }
        Ok(self.status.clone())
    }

    /// Persists a credential: sets the working endpoint, saves the endpoint
    /// to history and the token to the secret store, then reloads the
    /// in-memory history cache. A missing endpoint or token is a no-op.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn store_auth_info(&mut self, endpoint: Option<&str>, token: Option<&str>) -> Result<()> {
        let (Some(endpoint), Some(token)) = (endpoint, token) else {
            return Ok(());
        };
        if endpoint.trim().is_empty() || token.is_empty() {
            return Ok(());
        }
        self.set_endpoint(Some(endpoint));
        // The normalized form is the storage key.
        let endpoint = self.endpoint.clone();
        self.history.save_endpoint(&endpoint)?;
        self.secrets.store_token(&endpoint, token)?;
        self.load_endpoint_history();
        Ok(())
    }

    /// Removes the stored token for the current endpoint and deactivates the
    /// host context. Returns whether a token existed.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn logout(&mut self) -> Result<bool> {
        let existed = self.secrets.delete_token(&self.endpoint)?;
        self.status = Some(AuthStatus::default_status());
        self.host.set_activated(false).await;
        Ok(existed)
    }

    /// Opens the instance's token-creation page, which redirects back to the
    /// client with a `code` parameter.
    fn redirect_to_endpoint_login(&mut self, dotcom: bool) -> Result<()> {
        let endpoint = if dotcom {
            DOTCOM_URL.to_string()
        } else {
            self.endpoint.clone()
        };
        if endpoint.is_empty() {
            return Ok(());
        }
        let base = Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint URL: {endpoint}"))?;
        let mut auth_url = base
            .join(TOKEN_CALLBACK_PATH)
            .with_context(|| format!("Failed to build login URL for {endpoint}"))?;
        auth_url
            .query_pairs_mut()
            .append_pair("requestFrom", self.host.request_from());
        self.set_endpoint(Some(&endpoint));
        self.host.open_external(auth_url.as_str())
    }

    /// Sets the working endpoint. Empty or missing values never erase the
    /// current endpoint.
    fn set_endpoint(&mut self, endpoint: Option<&str>) {
        let Some(endpoint) = endpoint else {
            return;
        };
        if endpoint.trim().is_empty() {
            return;
        }
        self.endpoint = normalize_endpoint(endpoint);
    }

    fn load_endpoint_history(&mut self) {
        match self.history.endpoint_history() {
            Ok(entries) => self.endpoint_history = entries,
            Err(err) => {
                tracing::warn!("failed to load endpoint history: {err:#}");
                self.endpoint_history = Vec::new();
            }
        }
    }
}
