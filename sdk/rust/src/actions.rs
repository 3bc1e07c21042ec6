//! Framework-agnostic account actions.
//!
//! Each action takes the submitted form and the inbound `Cookie` header and
//! returns an [`ActionOutcome`] that a web framework turns into a response.

use crate::error::{ErrorCode, ResultExt, SdkResult};
use crate::forms::{normalize_login_identifier, FormData};
use crate::headers::{names, HeaderBundle};
use crate::operations::LoginResult;
use crate::sdk::StorefrontSdk;
use crate::transport::QueryOptions;
use crate::validation::{
    extract_registration_values, validate_registration_form, RegistrationVariant,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Where a successful sign-in goes without `redirectTo`.
pub const DEFAULT_SIGN_IN_REDIRECT: &str = "/account";
/// Where a successful sign-up goes.
pub const SIGN_UP_SUCCESS_PATH: &str = "/sign-up/success";

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
const NO_CHANNEL_MESSAGE: &str = "No channel associated with this email.";

/// What an action asks the web layer to send back.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A `302` redirect.
    Redirect {
        location: String,
        headers: HeaderBundle,
    },
    /// A JSON body.
    Json {
        status: u16,
        body: Value,
        headers: HeaderBundle,
    },
}

impl ActionOutcome {
    /// Creates a redirect.
    pub fn redirect(location: impl Into<String>, headers: HeaderBundle) -> Self {
        Self::Redirect {
            location: location.into(),
            headers,
        }
    }

    /// Creates a JSON outcome.
    pub fn json(status: u16, body: &impl Serialize, headers: HeaderBundle) -> SdkResult<Self> {
        let body = serde_json::to_value(body).map_sdk_err(ErrorCode::SerializeError)?;
        Ok(Self::Json {
            status,
            body,
            headers,
        })
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> u16 {
        match self {
            Self::Redirect { .. } => 302,
            Self::Json { status, .. } => *status,
        }
    }

    /// Returns the headers to send, including `Location` for redirects.
    pub fn response_headers(&self) -> HeaderBundle {
        match self {
            Self::Redirect { location, headers } => {
                let mut all = headers.clone();
                all.set(names::LOCATION, location.as_str());
                all
            }
            Self::Json { headers, .. } => {
                let mut all = headers.clone();
                all.set(names::CONTENT_TYPE, "application/json; charset=utf-8");
                all
            }
        }
    }

    /// Returns the JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Redirect { .. } => None,
            Self::Json { body, .. } => Some(body),
        }
    }
}

/// Sign-in, sign-up and sign-out flows over a [`StorefrontSdk`].
#[derive(Debug, Clone)]
pub struct StorefrontActions {
    sdk: StorefrontSdk,
    phone_email_domain: String,
    variant: RegistrationVariant,
}

impl StorefrontActions {
    /// Creates actions for e-mail registration.
    pub fn new(sdk: StorefrontSdk, phone_email_domain: impl Into<String>) -> Self {
        Self {
            sdk,
            phone_email_domain: phone_email_domain.into(),
            variant: RegistrationVariant::Email,
        }
    }

    /// Sets the registration variant.
    #[must_use]
    pub fn registration_variant(mut self, variant: RegistrationVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Returns the SDK.
    pub fn sdk(&self) -> &StorefrontSdk {
        &self.sdk
    }

    /// Signs a customer in.
    ///
    /// The identifier may be a 10-digit phone number. The customer's first
    /// channel is used for the login call.
    pub async fn sign_in(
        &self,
        form: &FormData,
        cookie: Option<&str>,
    ) -> SdkResult<ActionOutcome> {
        let (Some(identifier), Some(password)) = (form.get("email"), form.get("password")) else {
            warn!("Sign-in form is missing email or password");
            return ActionOutcome::json(
                400,
                &json!({ "message": INVALID_CREDENTIALS_MESSAGE }),
                HeaderBundle::new(),
            );
        };

        let email = normalize_login_identifier(identifier, &self.phone_email_domain);
        let remember_me = form.is_checked("rememberMe");
        let redirect_to = form
            .get_non_empty("redirectTo")
            .unwrap_or(DEFAULT_SIGN_IN_REDIRECT);

        let channels = self
            .sdk
            .get_channels_by_customer_email(&email, &QueryOptions::new())
            .await?;
        let Some(channel) = channels.first() else {
            debug!(%email, "No channel found for customer");
            return ActionOutcome::json(
                403,
                &json!({ "message": NO_CHANNEL_MESSAGE }),
                HeaderBundle::new(),
            );
        };

        let options = QueryOptions::new()
            .maybe_cookie(cookie)
            .custom_header(names::VENDURE_TOKEN, channel.token.as_str());
        let result = self
            .sdk
            .login(&email, password, remember_me, &options)
            .await?;

        match result.into_parts() {
            (LoginResult::CurrentUser(user), headers) => {
                debug!(user = %user.id, "Signed in customer");
                info!(channel = %channel.code, "Signed in");
                Ok(ActionOutcome::redirect(redirect_to, headers))
            }
            (LoginResult::Error(error), _) => {
                info!(code = %error.error_code, "Sign-in rejected");
                ActionOutcome::json(401, &error, HeaderBundle::new())
            }
        }
    }

    /// Registers a customer.
    ///
    /// A chosen `channel` is written to the session cookie only once the
    /// register call has run. A form that fails validation sends no cookie.
    pub async fn sign_up(
        &self,
        form: &FormData,
        cookie: Option<&str>,
    ) -> SdkResult<ActionOutcome> {
        let sessions = self.sdk.sessions();
        let mut session = sessions.get_session(cookie).await?;

        if let Some(channel) = form.get_non_empty("channel") {
            session.set_channel_token(channel);
        }

        let errors = validate_registration_form(form, self.variant);
        if !errors.is_valid() {
            info!(fields = errors.len(), "Sign-up form rejected");
            return ActionOutcome::json(200, &errors, HeaderBundle::new());
        }

        let input = extract_registration_values(form, self.variant, &self.phone_email_domain);
        let options = QueryOptions::new()
            .maybe_cookie(cookie)
            .custom_header(names::VENDURE_TOKEN, form.get("channel").unwrap_or_default());
        let result = self.sdk.register_customer_account(input, &options).await?;

        let headers =
            HeaderBundle::new().with(names::SET_COOKIE, sessions.commit_session(&session).await?);

        match result.error_code() {
            None => {
                info!("Registered customer account");
                Ok(ActionOutcome::redirect(SIGN_UP_SUCCESS_PATH, headers))
            }
            Some(code) => {
                info!(code, "Registration rejected");
                ActionOutcome::json(401, &json!({ "form": code }), headers)
            }
        }
    }

    /// Lists the channels offered on the sign-up page.
    pub async fn sign_up_channels(&self, cookie: Option<&str>) -> SdkResult<ActionOutcome> {
        let channels = self
            .sdk
            .get_channel_list(&QueryOptions::new().maybe_cookie(cookie))
            .await?;
        ActionOutcome::json(200, &json!({ "channels": &channels.data }), HeaderBundle::new())
    }

    /// Signs the customer out and clears the session cookie.
    pub async fn sign_out(&self, cookie: Option<&str>) -> SdkResult<ActionOutcome> {
        let sessions = self.sdk.sessions();
        let session = sessions.get_session(cookie).await?;

        self.sdk
            .logout(&QueryOptions::new().maybe_cookie(cookie))
            .await?;
        let headers =
            HeaderBundle::new().with(names::SET_COOKIE, sessions.destroy_session(&session).await?);

        info!("Signed out");
        Ok(ActionOutcome::redirect("/", headers))
    }
}
