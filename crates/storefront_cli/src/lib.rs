//! Command-line interface for the Vendure storefront SDK.
//!
//! # Usage
//!
//! ```bash
//! # List every channel
//! storefront channels
//!
//! # Channels a customer belongs to
//! storefront channels-for ann@example.com
//!
//! # Sign in; prints the session cookie to reuse with --cookie
//! storefront sign-in 0123456789 secret --remember-me
//!
//! # Who is signed in
//! storefront whoami --cookie 'vendure_remix_session=...'
//!
//! # Register a customer
//! storefront sign-up --email ann@example.com --password secret1 \
//!     --repeat-password secret1 --channel eu
//!
//! # Check a registration form without calling the API
//! storefront validate-registration --phone 0123456789 --password a --repeat-password a
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use storefront_sdk::headers::names;
use storefront_sdk::{
    ActionOutcome, ErrorCode, FormData, HeaderBundle, QueryOptions, RegistrationVariant,
    ResultExt, SdkResult, StorefrontActions, StorefrontConfig, StorefrontSdk,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Shop API endpoint
    #[arg(long, global = true, env = "VENDURE_API_URL")]
    pub api_url: Option<String>,

    /// Comma-separated session signing secrets, newest first
    #[arg(long, global = true, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every channel
    Channels,

    /// List the channels a customer belongs to
    ChannelsFor {
        /// Customer e-mail address
        email: String,
    },

    /// Sign a customer in
    SignIn {
        /// E-mail address or 10-digit phone number
        identifier: String,

        /// Password
        password: String,

        /// Keep the session after the browser closes
        #[arg(long)]
        remember_me: bool,

        /// Path to redirect to on success
        #[arg(long)]
        redirect_to: Option<String>,

        /// Session cookie from a previous command
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Register a customer account
    SignUp {
        #[command(flatten)]
        form: RegistrationArgs,

        /// Channel token to register in
        #[arg(long)]
        channel: Option<String>,

        /// Session cookie from a previous command
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Sign the customer out
    SignOut {
        /// Session cookie from a previous command
        #[arg(long)]
        cookie: String,
    },

    /// Show the signed-in customer
    Whoami {
        /// Session cookie from a previous command
        #[arg(long)]
        cookie: String,
    },

    /// Validate a registration form without calling the API
    ValidateRegistration {
        #[command(flatten)]
        form: RegistrationArgs,
    },
}

/// Registration form fields.
#[derive(Args, Debug, Clone)]
pub struct RegistrationArgs {
    /// E-mail address
    #[arg(long, conflicts_with = "phone", required_unless_present = "phone")]
    pub email: Option<String>,

    /// 10-digit phone number (registers `<phone>@<domain>`)
    #[arg(long)]
    pub phone: Option<String>,

    /// Password
    #[arg(long)]
    pub password: Option<String>,

    /// Password again
    #[arg(long)]
    pub repeat_password: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

impl RegistrationArgs {
    /// Returns the variant selected by `--email` or `--phone`.
    pub fn variant(&self) -> RegistrationVariant {
        if self.phone.is_some() {
            RegistrationVariant::Phone
        } else {
            RegistrationVariant::Email
        }
    }

    /// Builds the submitted form.
    pub fn to_form(&self) -> FormData {
        let mut form = FormData::new();
        if let Some(email) = &self.email {
            form.append("email", email.as_str());
        }
        if let Some(phone) = &self.phone {
            form.append("phoneNumber", phone.as_str());
        }
        if let Some(password) = &self.password {
            form.append("password", password.as_str());
        }
        if let Some(repeat_password) = &self.repeat_password {
            form.append("repeatPassword", repeat_password.as_str());
        }
        if let Some(first_name) = &self.first_name {
            form.append("firstName", first_name.as_str());
        }
        if let Some(last_name) = &self.last_name {
            form.append("lastName", last_name.as_str());
        }
        form
    }
}

/// Builds the configuration from the environment and command-line flags.
pub fn load_config(cli: &Cli) -> SdkResult<StorefrontConfig> {
    load_config_with(cli, |key| std::env::var(key).ok())
}

/// Builds the configuration with flags taking precedence over `env`.
///
/// Validation runs once, after the flags are applied.
fn load_config_with(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> SdkResult<StorefrontConfig> {
    StorefrontConfig::from_lookup(|key| match key {
        "VENDURE_API_URL" => cli.api_url.clone().or_else(|| env(key)),
        "SESSION_SECRET" => cli.session_secret.clone().or_else(|| env(key)),
        _ => env(key),
    })
}

fn connect(cli: &Cli) -> SdkResult<StorefrontActions> {
    let config = load_config(cli)?;
    debug!(url = %config.client.url, "Using Shop API");
    let sdk = StorefrontSdk::from_config(&config)?;
    Ok(StorefrontActions::new(sdk, config.phone_email_domain))
}

pub async fn run(cli: Cli) -> SdkResult<i32> {
    match &cli.command {
        Commands::ValidateRegistration { form } => Ok(validate_registration(form, cli.quiet)),
        Commands::Channels => {
            let actions = connect(&cli)?;
            let channels = actions.sdk().get_channel_list(&QueryOptions::new()).await?;
            for channel in channels.iter() {
                println!("{} {} {}", channel.code.green(), channel.token, channel.id.dimmed());
            }
            Ok(0)
        }
        Commands::ChannelsFor { email } => {
            let actions = connect(&cli)?;
            let channels = actions
                .sdk()
                .get_channels_by_customer_email(email, &QueryOptions::new())
                .await?;
            if channels.is_empty() {
                println!("{} no channel for {}", "Warning:".yellow().bold(), email);
                return Ok(1);
            }
            for channel in channels.iter() {
                println!("{} {} {}", channel.code.green(), channel.token, channel.id.dimmed());
            }
            Ok(0)
        }
        Commands::SignIn {
            identifier,
            password,
            remember_me,
            redirect_to,
            cookie,
        } => {
            let mut form = FormData::new()
                .with("email", identifier.as_str())
                .with("password", password.as_str());
            if *remember_me {
                form.append("rememberMe", "on");
            }
            if let Some(redirect_to) = redirect_to {
                form.append("redirectTo", redirect_to.as_str());
            }
            let outcome = connect(&cli)?.sign_in(&form, cookie.as_deref()).await?;
            print_outcome(&outcome, cli.quiet)
        }
        Commands::SignUp {
            form,
            channel,
            cookie,
        } => {
            let mut data = form.to_form();
            if let Some(channel) = channel {
                data.append("channel", channel.as_str());
            }
            let outcome = connect(&cli)?
                .registration_variant(form.variant())
                .sign_up(&data, cookie.as_deref())
                .await?;
            print_outcome(&outcome, cli.quiet)
        }
        Commands::SignOut { cookie } => {
            let outcome = connect(&cli)?.sign_out(Some(cookie)).await?;
            print_outcome(&outcome, cli.quiet)
        }
        Commands::Whoami { cookie } => {
            let customer = connect(&cli)?
                .sdk()
                .active_customer(&QueryOptions::new().cookie(cookie.as_str()))
                .await?;
            print_set_cookie(&customer.headers);
            match customer.data.as_ref() {
                Some(customer) => {
                    println!(
                        "{} {} {} <{}>",
                        "Signed in:".green().bold(),
                        customer.first_name,
                        customer.last_name,
                        customer.email_address
                    );
                    Ok(0)
                }
                None => {
                    println!("{}", "Not signed in".yellow());
                    Ok(1)
                }
            }
        }
    }
}

fn validate_registration(args: &RegistrationArgs, quiet: bool) -> i32 {
    let errors = storefront_sdk::validate_registration_form(&args.to_form(), args.variant());

    if errors.is_valid() {
        if !quiet {
            println!("{} registration form is valid", "Success:".green().bold());
        }
        return 0;
    }

    for error in errors.iter() {
        eprintln!("  {} {}: {}", "-->".blue(), error.field.bold(), error.message);
    }
    1
}

/// Prints an action outcome. Non-2xx/3xx statuses exit with 1.
fn print_outcome(outcome: &ActionOutcome, quiet: bool) -> SdkResult<i32> {
    let status = outcome.status();
    let label = format!("HTTP {status}");
    let label = if status < 400 {
        label.green().bold()
    } else {
        label.red().bold()
    };

    if !quiet || status >= 400 {
        println!("{label}");
        for (name, value) in &outcome.response_headers() {
            println!("{}: {}", name.cyan(), value);
        }
        if let Some(body) = outcome.body() {
            let pretty =
                serde_json::to_string_pretty(body).map_sdk_err(ErrorCode::SerializeError)?;
            println!("{pretty}");
        }
    }

    Ok(if status < 400 { 0 } else { 1 })
}

fn print_set_cookie(headers: &HeaderBundle) {
    if let Some(set_cookie) = headers.get(names::SET_COOKIE) {
        println!("{}: {}", "set-cookie".cyan(), set_cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_sdk::validation::REPEAT_PASSWORD_MESSAGE;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign_in() {
        let cli = Cli::try_parse_from([
            "storefront",
            "sign-in",
            "0123456789",
            "secret",
            "--remember-me",
            "--api-url",
            "http://shop.test/shop-api",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://shop.test/shop-api"));
        match cli.command {
            Commands::SignIn {
                identifier,
                remember_me,
                cookie,
                ..
            } => {
                assert_eq!(identifier, "0123456789");
                assert!(remember_me);
                assert!(cookie.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_email_and_phone_conflict() {
        let result = Cli::try_parse_from([
            "storefront",
            "validate-registration",
            "--email",
            "a@b.co",
            "--phone",
            "0123456789",
        ]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["storefront", "validate-registration"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_registration_form_fields() {
        let args = RegistrationArgs {
            email: None,
            phone: Some("0123456789".to_string()),
            password: Some("secret1".to_string()),
            repeat_password: Some("secret1".to_string()),
            first_name: Some("Ann".to_string()),
            last_name: None,
        };

        let form = args.to_form();
        assert_eq!(args.variant(), RegistrationVariant::Phone);
        assert_eq!(form.get("phoneNumber"), Some("0123456789"));
        assert_eq!(form.get("repeatPassword"), Some("secret1"));
        assert_eq!(form.get("firstName"), Some("Ann"));
        assert!(!form.has("email"));
        assert!(!form.has("lastName"));
    }

    #[test]
    fn test_validate_registration_exit_code() {
        let valid = RegistrationArgs {
            email: Some("ann@example.com".to_string()),
            phone: None,
            password: Some("secret1".to_string()),
            repeat_password: Some("secret1".to_string()),
            first_name: None,
            last_name: None,
        };
        assert_eq!(validate_registration(&valid, true), 0);

        let mismatch = RegistrationArgs {
            repeat_password: Some("other".to_string()),
            ..valid
        };
        assert_eq!(validate_registration(&mismatch, true), 1);
    }

    #[test]
    fn test_omitted_repeat_password_is_reported_as_missing() {
        let cli = Cli::try_parse_from([
            "storefront",
            "validate-registration",
            "--email",
            "a@b.co",
            "--password",
            "abcd",
        ])
        .unwrap();
        let Commands::ValidateRegistration { form } = cli.command else {
            panic!("expected validate-registration");
        };

        let data = form.to_form();
        assert!(!data.has("repeatPassword"));
        let errors = storefront_sdk::validate_registration_form(&data, form.variant());
        assert_eq!(errors.get("repeatPassword"), Some(REPEAT_PASSWORD_MESSAGE));
        assert_eq!(validate_registration(&form, true), 1);
    }

    #[test]
    fn test_session_secret_flag_overrides() {
        let cli = Cli::try_parse_from([
            "storefront",
            "--session-secret",
            "new, old",
            "--api-url",
            "https://shop.test/shop-api",
            "channels",
        ])
        .unwrap();

        let config = load_config_with(&cli, |_| None).unwrap();
        assert_eq!(config.session.secrets, vec!["new", "old"]);
        assert_eq!(config.client.url, "https://shop.test/shop-api");
    }

    #[test]
    fn test_api_url_flag_overrides_invalid_env_url() {
        let env = |key: &str| match key {
            "VENDURE_API_URL" => Some("ftp://broken".to_string()),
            "PHONE_EMAIL_DOMAIN" => Some("example.com".to_string()),
            _ => None,
        };

        let mut cli = Cli::try_parse_from(["storefront", "channels"]).unwrap();
        cli.api_url = Some("https://shop.test/shop-api".to_string());
        cli.session_secret = None;
        let config = load_config_with(&cli, env).unwrap();
        assert_eq!(config.client.url, "https://shop.test/shop-api");
        assert_eq!(config.phone_email_domain, "example.com");

        cli.api_url = None;
        let err = load_config_with(&cli, env).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUrl);
    }
}
