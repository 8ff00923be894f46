//! Derived authentication status.

/// Snapshot of whether an endpoint/token pair authenticates, and what the
/// instance reports about the user and the assist feature.
///
/// Recomputed on every probe and only trusted immediately after computation;
/// callers must not cache it across time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub is_dotcom_or_app: bool,
    pub has_verified_email: bool,
    /// Public-or-local instances gate login on a verified email address;
    /// enterprise instances never do.
    pub requires_verified_email: bool,
    /// Set when an instance rejected the supplied token outright.
    pub invalid_token: bool,
    pub site_has_assist_enabled: bool,
    pub site_version: String,
}

impl AuthStatus {
    /// Status returned when no credentials were supplied (no probe made).
    pub fn default_status() -> Self {
        Self::default()
    }

    /// Canned status for a failed probe against a public-or-local instance.
    pub fn unauthenticated() -> Self {
        Self {
            invalid_token: true,
            ..Self::default()
        }
    }

    /// Builds the status for a completed probe.
    pub fn from_probe(
        is_dotcom_or_app: bool,
        user_found: bool,
        has_verified_email: bool,
        assist_enabled: bool,
        site_version: String,
    ) -> Self {
        Self {
            authenticated: user_found,
            is_dotcom_or_app,
            has_verified_email,
            requires_verified_email: is_dotcom_or_app,
            invalid_token: false,
            site_has_assist_enabled: assist_enabled,
            site_version,
        }
    }

    /// True when the user counts as logged in: authenticated, and verified
    /// when the instance requires a verified email.
    pub fn logged_in(&self) -> bool {
        if !self.authenticated {
            return false;
        }
        !self.requires_verified_email || self.has_verified_email
    }
}
