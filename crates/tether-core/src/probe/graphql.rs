//! GraphQL probe implementation over reqwest.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::endpoint::normalize_endpoint;

use super::{
    AssistStatus, ClientConfig, ProbeClient, ProbeError, ProbeResult, UserInfo, config_is_dotcom,
};

/// API path GraphQL documents are POSTed to, relative to the endpoint.
const GRAPHQL_PATH: &str = ".api/graphql";

const SITE_ASSIST_QUERY: &str = "\
query SiteAssistStatus {
    site {
        productVersion
        isAssistEnabled
    }
}";

const CURRENT_USER_ID_QUERY: &str = "\
query CurrentUser {
    currentUser {
        id
    }
}";

const CURRENT_USER_INFO_QUERY: &str = "\
query CurrentUserInfo {
    currentUser {
        id
        hasVerifiedEmail
    }
}";

/// GraphQL client bound to one [`ClientConfig`].
pub struct GraphQlProbe {
    config: ClientConfig,
    http: reqwest::Client,
}

impl GraphQlProbe {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}{GRAPHQL_PATH}",
            normalize_endpoint(&self.config.endpoint)
        )
    }

    /// Sends one GraphQL document and unwraps the `{data, errors}` envelope.
    async fn query<T>(&self, document: &str) -> ProbeResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut request = self
            .http
            .post(self.api_url())
            .json(&json!({ "query": document }));
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        for (name, value) in &self.config.custom_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ProbeError::network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProbeError::http_status(status.as_u16(), &body));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| ProbeError::parse(err.to_string()))?;

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ProbeError::graphql(&messages));
        }

        envelope
            .data
            .ok_or_else(|| ProbeError::parse("response envelope had no data"))
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct SiteData {
    site: Site,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Site {
    product_version: String,
    is_assist_enabled: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserData {
    current_user: Option<CurrentUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUser {
    id: String,
    #[serde(default)]
    has_verified_email: bool,
}

#[async_trait]
impl ProbeClient for GraphQlProbe {
    async fn site_assist_status(&self) -> AssistStatus {
        match self.query::<SiteData>(SITE_ASSIST_QUERY).await {
            Ok(data) => AssistStatus {
                enabled: data.site.is_assist_enabled,
                version: data.site.product_version,
            },
            Err(err) => {
                tracing::debug!("site assist probe failed for {}: {err}", self.config.endpoint);
                AssistStatus::default()
            }
        }
    }

    fn is_dotcom(&self) -> bool {
        config_is_dotcom(&self.config)
    }

    async fn current_user_id(&self) -> ProbeResult<String> {
        let data: CurrentUserData = self.query(CURRENT_USER_ID_QUERY).await?;
        let user = data.current_user.ok_or_else(|| {
            ProbeError::graphql(&["no current user for the supplied token".to_string()])
        })?;
        Ok(user.id)
    }

    async fn current_user_info(&self) -> ProbeResult<UserInfo> {
        let data: CurrentUserData = self.query(CURRENT_USER_INFO_QUERY).await?;
        let user = data.current_user.ok_or_else(|| {
            ProbeError::graphql(&["no current user for the supplied token".to_string()])
        })?;
        Ok(UserInfo {
            id: user.id,
            has_verified_email: user.has_verified_email,
        })
    }
}
