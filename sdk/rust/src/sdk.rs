//! Typed storefront SDK.
//!
//! # Example
//!
//! ```ignore
//! use storefront_sdk::{QueryOptions, StorefrontConfig, StorefrontSdk};
//!
//! let sdk = StorefrontSdk::from_config(&StorefrontConfig::from_env()?)?;
//! let channels = sdk.get_channel_list(&QueryOptions::new()).await?;
//! for channel in channels.iter() {
//!     println!("{} {}", channel.code, channel.token);
//! }
//! // copy `channels.headers` onto the outgoing HTTP response
//! ```

use crate::config::{ClientConfig, StorefrontConfig};
use crate::error::SdkResult;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::operation::{NoVariables, Operation, WithHeaders};
use crate::operations::{
    ActiveCustomer, Channel, Customer, GetChannelList, GetChannelsByCustomerEmail,
    GetChannelsByCustomerEmailVariables, Login, LoginResult, LoginVariables, Logout,
    RegisterCustomerAccount, RegisterCustomerAccountVariables, RegisterCustomerInput,
    RegisterResult, Success,
};
use crate::requester::Requester;
use crate::transport::{GraphqlTransport, QueryOptions};
use std::sync::Arc;
use storefront_session::{CookieSessionStore, SessionStore};

/// One method per Shop API operation, each returning its payload together
/// with the headers the caller must forward.
#[derive(Debug, Clone)]
pub struct StorefrontSdk {
    requester: Requester,
}

impl StorefrontSdk {
    /// Creates an SDK from its parts.
    pub fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            requester: Requester::new(GraphqlTransport::new(config, http, sessions)),
        }
    }

    /// Creates an SDK with the reqwest client and signed-cookie sessions.
    pub fn from_config(config: &StorefrontConfig) -> SdkResult<Self> {
        config.client.validate()?;
        let sessions = CookieSessionStore::new(config.session.clone())?;
        Ok(Self::new(
            config.client.clone(),
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(sessions),
        ))
    }

    /// Returns the requester.
    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        self.requester.transport().sessions()
    }

    /// Executes any typed operation.
    pub async fn execute<Op: Operation>(
        &self,
        variables: &Op::Variables,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<Op::Response>> {
        let document = Op::document()?;
        self.requester.request(&document, variables, options).await
    }

    /// Lists all channels.
    pub async fn get_channel_list(
        &self,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<Vec<Channel>>> {
        let result = self.execute::<GetChannelList>(&NoVariables, options).await?;
        Ok(result.map(|data| data.get_channel_list))
    }

    /// Lists the channels a customer e-mail belongs to.
    pub async fn get_channels_by_customer_email(
        &self,
        email: &str,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<Vec<Channel>>> {
        let variables = GetChannelsByCustomerEmailVariables {
            email: email.to_string(),
        };
        let result = self
            .execute::<GetChannelsByCustomerEmail>(&variables, options)
            .await?;
        Ok(result.map(|data| data.get_channels_by_customer_email))
    }

    /// Logs in. A `CurrentUser` result carries the refreshed session cookie.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<LoginResult>> {
        let variables = LoginVariables {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: Some(remember_me),
        };
        let result = self.execute::<Login>(&variables, options).await?;
        Ok(result.map(|data| data.login))
    }

    /// Logs out.
    pub async fn logout(&self, options: &QueryOptions) -> SdkResult<WithHeaders<Success>> {
        let result = self.execute::<Logout>(&NoVariables, options).await?;
        Ok(result.map(|data| data.logout))
    }

    /// Registers a customer account.
    pub async fn register_customer_account(
        &self,
        input: RegisterCustomerInput,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<RegisterResult>> {
        let variables = RegisterCustomerAccountVariables { input };
        let result = self
            .execute::<RegisterCustomerAccount>(&variables, options)
            .await?;
        Ok(result.map(|data| data.register_customer_account))
    }

    /// Fetches the logged-in customer, `None` when anonymous.
    pub async fn active_customer(
        &self,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<Option<Customer>>> {
        let result = self.execute::<ActiveCustomer>(&NoVariables, options).await?;
        Ok(result.map(|data| data.active_customer))
    }
}
