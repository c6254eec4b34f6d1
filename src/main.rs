use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authconsole::cli::{self, Cli, Commands, PreferenceCommands, ProfileCommands, TokenCommands};
use authconsole::client::AuthClient;
use authconsole::config::{self, Config};
use authconsole::dashboard::TokenDashboard;
use authconsole::models::token::TokenRecord;
use authconsole::models::user::{PasswordForm, PreferencesPatch};
use authconsole::notice::{Notice, NoticeBoard};
use authconsole::profile::ProfilePage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "authconsole=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Loads .env before clap reads env-backed arguments.
    let mut cfg = config::load()?;
    let args = Cli::parse();

    if let Some(url) = &args.base_url {
        cfg.base_url = config::parse_base_url(url)?;
    }
    if let Some(token) = &args.access_token {
        cfg.access_token = Some(token.clone());
    }

    let client = AuthClient::new(&cfg).context("failed to build backend client")?;
    tracing::debug!(base_url = %client.base_url(), "using auth backend");

    let ok = match args.command {
        Commands::Tokens { command } => handle_token_command(command, client, &cfg, args.json).await?,
        Commands::Profile { command } => {
            handle_profile_command(command, client, &cfg, args.json).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_token_command(
    cmd: TokenCommands,
    client: AuthClient,
    cfg: &Config,
    json: bool,
) -> anyhow::Result<bool> {
    let mut dash = TokenDashboard::new(client, NoticeBoard::new(cfg.notice_ttl));

    match cmd {
        TokenCommands::List { status, search } => {
            if !dash.load_tokens().await {
                return Ok(report(dash.notice()));
            }
            dash.status_filter = status;
            dash.search = search.unwrap_or_default();
            let visible = dash.visible_tokens();
            if json {
                print_json(&visible)?;
            } else {
                print_tokens(&visible);
            }
        }
        TokenCommands::Stats => {
            if !dash.load_stats().await {
                return Ok(report(dash.notice()));
            }
            if let Some(stats) = dash.stats() {
                if json {
                    print_json(stats)?;
                } else {
                    println!(
                        "Total cached:  {}\nActive:        {}\nAPI keys:      {}\nExpired:       {}",
                        stats.total_cached_tokens,
                        stats.active_tokens,
                        stats.api_key_count,
                        stats.expired_tokens
                    );
                }
            }
        }
        TokenCommands::Revoke { token } => {
            // The list is only used to resolve ids to key ids; a failure here is not fatal.
            dash.load_tokens().await;
            let target = dash.revocation_id_for(&token);
            dash.revoke(&target).await;
        }
        TokenCommands::Introspect {
            token,
            client_id,
            client_secret,
        } => {
            if let Some(result) = dash
                .introspect(&token, client_id.as_deref(), client_secret.as_deref())
                .await
            {
                print_json(result)?;
            }
        }
        TokenCommands::Cleanup => {
            dash.cleanup_cache().await;
        }
    }

    Ok(report(dash.notices().last()))
}

async fn handle_profile_command(
    cmd: ProfileCommands,
    client: AuthClient,
    cfg: &Config,
    json: bool,
) -> anyhow::Result<bool> {
    let mut page = ProfilePage::new(client, NoticeBoard::new(cfg.notice_ttl));

    match cmd {
        ProfileCommands::Show => {
            if !page.load_profile().await {
                return Ok(report(page.notice()));
            }
            if let Some(p) = page.profile() {
                if json {
                    print_json(p)?;
                } else {
                    println!("ID:        {}", p.id);
                    println!("Name:      {}", p.label());
                    println!("Username:  {}", p.username);
                    println!("Email:     {}", p.email);
                }
            }
        }
        ProfileCommands::Update {
            first_name,
            last_name,
            display_name,
        } => {
            if !page.load_profile().await {
                return Ok(report(page.notice()));
            }
            if let Some(form) = page.begin_edit() {
                if let Some(v) = first_name {
                    form.first_name = v;
                }
                if let Some(v) = last_name {
                    form.last_name = v;
                }
                if let Some(v) = display_name {
                    form.display_name = v;
                }
            }
            page.save_edit().await;
        }
        ProfileCommands::Password(cli::PasswordArgs {
            current,
            new_password,
            confirm,
        }) => {
            let mut form = PasswordForm::new(current, new_password, confirm);
            page.change_password(&mut form).await;
        }
        ProfileCommands::Preferences { command } => match command {
            PreferenceCommands::Show => {
                if !page.load_preferences().await {
                    return Ok(report(page.notice()));
                }
                let prefs = page.preferences();
                if json {
                    print_json(prefs)?;
                } else {
                    println!("Email notifications:  {}", prefs.email_notifications);
                    println!("Security alerts:      {}", prefs.security_alerts);
                    println!("Workflow updates:     {}", prefs.workflow_updates);
                    println!("Digest frequency:     {}", prefs.digest_frequency);
                }
                return Ok(true);
            }
            PreferenceCommands::Set {
                email_notifications,
                security_alerts,
                workflow_updates,
                digest,
            } => {
                page.patch_preferences(PreferencesPatch {
                    email_notifications,
                    security_alerts,
                    workflow_updates,
                    digest_frequency: digest,
                })
                .await;
            }
        },
    }

    Ok(report(page.notices().last()))
}

/// Prints the notice an action produced. Returns false for error notices.
fn report(notice: Option<&Notice>) -> bool {
    match notice {
        Some(n) if n.is_error() => {
            eprintln!("Error: {}", n.message);
            false
        }
        Some(n) => {
            println!("{}", n.message);
            true
        }
        None => true,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

fn print_tokens(tokens: &[&TokenRecord]) {
    if tokens.is_empty() {
        println!("No tokens found.");
        return;
    }
    println!(
        "{:<38} {:<24} {:<8} {:<9} {:<17} {:<17} {:<17}",
        "ID", "NAME", "KIND", "STATUS", "CREATED", "LAST USED", "EXPIRES"
    );
    for t in tokens {
        println!(
            "{:<38} {:<24} {:<8} {:<9} {:<17} {:<17} {:<17}",
            t.id,
            t.name,
            t.kind().as_str(),
            t.status().as_str(),
            short_time(t.created(), "-"),
            short_time(t.last_used(), "never"),
            short_time(t.expiry(), "never")
        );
    }
}

fn short_time(ts: Option<chrono::DateTime<chrono::Utc>>, missing: &str) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| missing.to_string())
}
