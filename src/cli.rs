use clap::{Args, Parser, Subcommand};

use crate::models::token::TokenStatus;
use crate::models::user::DigestFrequency;

/// authconsole — token dashboard and profile console for an authorization service
#[derive(Parser)]
#[command(name = "authconsole", version, about)]
pub struct Cli {
    /// Backend base URL (overrides AUTHCONSOLE_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token for authenticated endpoints (overrides AUTHCONSOLE_ACCESS_TOKEN)
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and manage tokens
    Tokens {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// View and edit the signed-in user's profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// List tokens with their derived status
    List {
        #[arg(long)]
        status: Option<TokenStatus>,
        /// Case-insensitive match on name, key id or client id
        #[arg(long)]
        search: Option<String>,
    },
    /// Show aggregate token statistics
    Stats,
    /// Revoke a token by id, key id or raw token value
    Revoke { token: String },
    /// Ask the backend whether a token is valid
    Introspect {
        token: String,
        #[arg(long, env = "AUTHCONSOLE_CLIENT_ID")]
        client_id: Option<String>,
        #[arg(long, env = "AUTHCONSOLE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },
    /// Remove expired tokens from the backend cache
    Cleanup,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile
    Show,
    /// Update name fields; omitted fields keep their current value, empty clears
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Change the password
    Password(PasswordArgs),
    /// Notification preferences
    Preferences {
        #[command(subcommand)]
        command: PreferenceCommands,
    },
}

#[derive(Args)]
pub struct PasswordArgs {
    #[arg(long, env = "AUTHCONSOLE_CURRENT_PASSWORD", hide_env_values = true)]
    pub current: String,
    #[arg(long = "new", env = "AUTHCONSOLE_NEW_PASSWORD", hide_env_values = true)]
    pub new_password: String,
    #[arg(long, env = "AUTHCONSOLE_CONFIRM_PASSWORD", hide_env_values = true)]
    pub confirm: String,
}

#[derive(Subcommand)]
pub enum PreferenceCommands {
    /// Show current preferences
    Show,
    /// Change one or more preferences
    Set {
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        security_alerts: Option<bool>,
        #[arg(long)]
        workflow_updates: Option<bool>,
        #[arg(long)]
        digest: Option<DigestFrequency>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list_filters() {
        let cli = Cli::parse_from([
            "authconsole",
            "--json",
            "tokens",
            "list",
            "--status",
            "expired",
            "--search",
            "ci",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Tokens {
                command: TokenCommands::List { status, search },
            } => {
                assert_eq!(status, Some(TokenStatus::Expired));
                assert_eq!(search.as_deref(), Some("ci"));
            }
            _ => panic!("expected tokens list"),
        }
    }

    #[test]
    fn test_parse_preferences_set() {
        let cli = Cli::parse_from([
            "authconsole",
            "profile",
            "preferences",
            "set",
            "--workflow-updates",
            "true",
            "--digest",
            "monthly",
        ]);
        match cli.command {
            Commands::Profile {
                command:
                    ProfileCommands::Preferences {
                        command:
                            PreferenceCommands::Set {
                                workflow_updates,
                                digest,
                                email_notifications,
                                ..
                            },
                    },
            } => {
                assert_eq!(workflow_updates, Some(true));
                assert_eq!(digest, Some(DigestFrequency::Monthly));
                assert_eq!(email_notifications, None);
            }
            _ => panic!("expected preferences set"),
        }
    }

    #[test]
    fn test_rejects_unknown_digest() {
        let res = Cli::try_parse_from([
            "authconsole",
            "profile",
            "preferences",
            "set",
            "--digest",
            "hourly",
        ]);
        assert!(res.is_err());
    }
}
