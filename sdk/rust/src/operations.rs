//! Shop API operations used by the storefront.
//!
//! Each unit struct binds one document to its variables and response types.
//! Field names follow the Shop API schema through `camelCase` renames.

use crate::operation::NoVariables;
use serde::{Deserialize, Serialize};
use storefront_macros::Operation;

// ============================================================================
// Shared result types
// ============================================================================

/// A sales channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Value for the `vendure-token` header.
    pub token: String,
    pub code: String,
}

/// The `ErrorResult` interface returned by mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResult {
    #[serde(rename = "__typename", default)]
    pub typename: String,
    pub error_code: String,
    pub message: String,
}

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "__typename", default = "CurrentUser::typename")]
    pub typename: String,
    pub id: String,
    pub identifier: String,
}

impl CurrentUser {
    fn typename() -> String {
        "CurrentUser".to_string()
    }
}

/// The `Success` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

// ============================================================================
// getChannelList
// ============================================================================

/// Lists every channel.
#[derive(Operation)]
#[operation(
    query = "query getChannelList { getChannelList { id token code } }",
    variables = NoVariables
)]
pub struct GetChannelList;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelListResponse {
    pub get_channel_list: Vec<Channel>,
}

// ============================================================================
// getChannelsByCustomerEmail
// ============================================================================

/// Lists the channels a customer e-mail is registered in.
#[derive(Operation)]
#[operation(query = "
    query getChannelsByCustomerEmail($email: String!) {
        getChannelsByCustomerEmail(email: $email) { id token code }
    }
")]
pub struct GetChannelsByCustomerEmail;

#[derive(Debug, Clone, Serialize)]
pub struct GetChannelsByCustomerEmailVariables {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelsByCustomerEmailResponse {
    #[serde(default)]
    pub get_channels_by_customer_email: Vec<Channel>,
}

// ============================================================================
// login
// ============================================================================

/// Authenticates with e-mail and password.
#[derive(Operation)]
#[operation(mutation = "
    mutation login($email: String!, $password: String!, $rememberMe: Boolean) {
        login(username: $email, password: $password, rememberMe: $rememberMe) {
            __typename
            ... on CurrentUser { id identifier }
            ... on ErrorResult { errorCode message }
        }
    }
")]
pub struct Login;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginVariables {
    pub email: String,
    pub password: String,
    pub remember_me: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub login: LoginResult,
}

/// Result of `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginResult {
    CurrentUser(CurrentUser),
    Error(ErrorResult),
}

impl LoginResult {
    /// Returns the user on success.
    pub fn current_user(&self) -> Option<&CurrentUser> {
        match self {
            Self::CurrentUser(user) => Some(user),
            Self::Error(_) => None,
        }
    }
}

// ============================================================================
// logout
// ============================================================================

/// Ends the customer session.
#[derive(Operation)]
#[operation(mutation = "mutation logout { logout { success } }", variables = NoVariables)]
pub struct Logout;

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    pub logout: Success,
}

// ============================================================================
// registerCustomerAccount
// ============================================================================

/// Registers a new customer.
#[derive(Operation)]
#[operation(mutation = "
    mutation registerCustomerAccount($input: RegisterCustomerInput!) {
        registerCustomerAccount(input: $input) {
            __typename
            ... on Success { success }
            ... on ErrorResult { errorCode message }
        }
    }
")]
pub struct RegisterCustomerAccount;

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCustomerAccountVariables {
    pub input: RegisterCustomerInput,
}

/// Input of `registerCustomerAccount`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerInput {
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerAccountResponse {
    pub register_customer_account: RegisterResult,
}

/// Result of `registerCustomerAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterResult {
    Success(Success),
    Error(ErrorResult),
}

impl RegisterResult {
    /// Returns the upstream error code on failure.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error(error) => Some(&error.error_code),
        }
    }
}

// ============================================================================
// activeCustomer
// ============================================================================

/// Fetches the logged-in customer.
#[derive(Operation)]
#[operation(
    query = "
        query activeCustomer {
            activeCustomer { id title firstName lastName emailAddress phoneNumber }
        }
    ",
    variables = NoVariables
)]
pub struct ActiveCustomer;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCustomerResponse {
    pub active_customer: Option<Customer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Operation, OperationKind};
    use serde_json::json;

    #[test]
    fn test_derived_operation_metadata() {
        assert_eq!(GetChannelList::OPERATION_NAME, "getChannelList");
        assert_eq!(GetChannelList::KIND, OperationKind::Query);
        assert_eq!(Login::OPERATION_NAME, "login");
        assert_eq!(Login::KIND, OperationKind::Mutation);
        assert_eq!(RegisterCustomerAccount::KIND, OperationKind::Mutation);
        assert_eq!(ActiveCustomer::OPERATION_NAME, "activeCustomer");
    }

    #[test]
    fn test_documents_parse() {
        for document in [
            GetChannelList::document(),
            GetChannelsByCustomerEmail::document(),
            Login::document(),
            Logout::document(),
            RegisterCustomerAccount::document(),
            ActiveCustomer::document(),
        ] {
            assert!(document.is_ok(), "{document:?}");
        }
        assert_eq!(
            GetChannelList::document().unwrap().print(),
            "query getChannelList{getChannelList{id token code}}"
        );
    }

    #[test]
    fn test_login_result_variants() {
        let ok: LoginResponse = serde_json::from_value(json!({
            "login": {"__typename": "CurrentUser", "id": "1", "identifier": "a@b.c"}
        }))
        .unwrap();
        assert_eq!(ok.login.current_user().unwrap().identifier, "a@b.c");

        let failed: LoginResponse = serde_json::from_value(json!({
            "login": {
                "__typename": "InvalidCredentialsError",
                "errorCode": "INVALID_CREDENTIALS_ERROR",
                "message": "The provided credentials are invalid"
            }
        }))
        .unwrap();
        assert!(failed.login.current_user().is_none());
        assert_eq!(
            serde_json::to_value(&failed.login).unwrap()["errorCode"],
            "INVALID_CREDENTIALS_ERROR"
        );
    }

    #[test]
    fn test_register_result_and_input() {
        let response: RegisterCustomerAccountResponse = serde_json::from_value(json!({
            "registerCustomerAccount": {"__typename": "Success", "success": true}
        }))
        .unwrap();
        assert_eq!(response.register_customer_account.error_code(), None);

        let input = RegisterCustomerInput {
            email_address: "a@b.c".to_string(),
            password: "pass".to_string(),
            ..RegisterCustomerInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"emailAddress": "a@b.c", "firstName": "", "lastName": "", "password": "pass"})
        );
    }
}
