use clap::{Args, Parser, Subcommand};
use drawchat_push::adapters::{
    FilePushManager, GrantedPermission, HttpGatewayClient, TokioTimeProvider,
};
use drawchat_push::client::SubscriptionNegotiator;
use drawchat_push::config::{self, ConfigError};
use drawchat_push::ports::{GatewayClient, PushManager, Registration};
use drawchat_push::types::push::Trigger;
use std::path::PathBuf;
use std::time::Duration;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(config::AppConfig),
    Client(ClientCommand),
    Exit(i32),
}

pub(crate) enum ClientCommand {
    Subscribe {
        config: config::ClientConfig,
        subscription: PathBuf,
    },
    Notify {
        config: config::ClientConfig,
        subscription: PathBuf,
        trigger: Trigger,
    },
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Some(Command::Init(args)) => return RunOutcome::Exit(run_init(args)),
        Some(Command::Subscribe(args)) => {
            resolve_client_config(&args.client, false).map(|config| {
                RunOutcome::Client(ClientCommand::Subscribe {
                    config,
                    subscription: args.client.subscription,
                })
            })
        }
        Some(Command::Notify(args)) => resolve_client_config(&args.client, true).map(|config| {
            RunOutcome::Client(ClientCommand::Notify {
                config,
                subscription: args.client.subscription,
                trigger: Trigger::from(args.trigger),
            })
        }),
        None => resolve_app_config(&cli.serve).map(RunOutcome::Serve),
    };

    match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "drawchat-push",
    version,
    about = "Push subscription and delivery server for DrawChat"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,
    #[arg(long, env = "VAPID_KEY_PRIVATE")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "VAPID_KEY_PUBLIC")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "PUSH_DELIVERY_TIMEOUT")]
    delivery_timeout: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
    /// Register a stored browser subscription with a running server.
    Subscribe(SubscribeArgs),
    /// Ask a running server to push a notification to a stored subscription.
    Notify(NotifyArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[arg(long, env = "SERVER_URL", default_value = config::DEFAULT_SERVER_URL)]
    server_url: String,
    /// JSON file holding a browser `PushSubscription`.
    #[arg(long)]
    subscription: PathBuf,
    #[arg(long, env = "VAPID_KEY_PUBLIC")]
    application_server_key: Option<String>,
    #[arg(long, env = "PUSH_REQUEST_TIMEOUT")]
    timeout: Option<String>,
}

#[derive(Args, Debug)]
struct SubscribeArgs {
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Args, Debug)]
struct NotifyArgs {
    #[command(flatten)]
    client: ClientArgs,
    #[arg(long, default_value = "onPageLoad")]
    trigger: String,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match drawchat_push::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("VAPID_KEY_PRIVATE=\"{}\"", credentials.private_key);
    println!("VAPID_KEY_PUBLIC=\"{}\"", credentials.public_key);
    println!("VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

pub(crate) async fn run_client(command: ClientCommand) -> i32 {
    match command {
        ClientCommand::Subscribe {
            config,
            subscription,
        } => {
            let client = match HttpGatewayClient::new(&config.server_url, config.subscribe_timeout)
            {
                Ok(client) => client,
                Err(err) => {
                    eprintln!("error: {err}");
                    return 1;
                }
            };
            let stored = match FilePushManager::new(&subscription).get_subscription().await {
                Ok(Some(stored)) => stored,
                Ok(None) => {
                    eprintln!("error: no subscription stored at {}", subscription.display());
                    return 1;
                }
                Err(err) => {
                    eprintln!("error: failed to read {}: {err}", subscription.display());
                    return 1;
                }
            };
            match client.subscribe(&stored).await {
                Ok(response) => {
                    println!("{}", response.notification.body);
                    0
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    1
                }
            }
        }
        ClientCommand::Notify {
            config,
            subscription,
            trigger,
        } => {
            let client = match HttpGatewayClient::new(&config.server_url, config.subscribe_timeout)
            {
                Ok(client) => client,
                Err(err) => {
                    eprintln!("error: {err}");
                    return 1;
                }
            };
            let negotiator = SubscriptionNegotiator::new(
                client,
                GrantedPermission,
                TokioTimeProvider,
                config.application_server_key,
                config.subscribe_timeout,
            );
            let registration = Registration::new("/", FilePushManager::new(subscription));
            match negotiator.notify_server(&trigger, &registration).await {
                Ok(notification) => {
                    println!("{}: {}", notification.title, notification.body);
                    0
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    1
                }
            }
        }
    }
}

fn resolve_app_config(args: &ServeArgs) -> Result<config::AppConfig, ConfigError> {
    let vapid = drawchat_push::push::vapid::resolve_vapid_config(
        args.vapid_private_key.as_deref(),
        args.vapid_public_key.as_deref(),
        args.vapid_subject.as_deref(),
    )?;
    let delivery_timeout = match args.delivery_timeout.as_deref() {
        Some(raw) => parse_duration(raw)?,
        None => config::DEFAULT_TIMEOUT,
    };

    Ok(config::AppConfig {
        port: args.port,
        vapid,
        delivery_timeout,
    })
}

/// `notify` may have to create a subscription, which needs the server's
/// public key; `subscribe` only forwards an existing one.
fn resolve_client_config(
    args: &ClientArgs,
    require_application_server_key: bool,
) -> Result<config::ClientConfig, ConfigError> {
    let server_url = args.server_url.trim();
    if server_url.is_empty() {
        return Err(ConfigError::Missing("SERVER_URL".to_string()));
    }
    let application_server_key = args
        .application_server_key
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if require_application_server_key && application_server_key.is_empty() {
        return Err(ConfigError::Missing(
            drawchat_push::push::vapid::PUBLIC_KEY_VAR.to_string(),
        ));
    }
    let subscribe_timeout = match args.timeout.as_deref() {
        Some(raw) => parse_duration(raw)?,
        None => config::DEFAULT_TIMEOUT,
    };

    Ok(config::ClientConfig {
        server_url: server_url.to_string(),
        application_server_key: application_server_key.to_string(),
        subscribe_timeout,
    })
}

fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let value = raw.trim();
    let invalid = || ConfigError::InvalidDuration(value.to_string());
    if value.is_empty() {
        return Err(invalid());
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: u64 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let seconds = match unit {
        's' => Some(amount),
        'm' => amount.checked_mul(60),
        'h' => amount.checked_mul(60 * 60),
        _ => None,
    };
    seconds.map(Duration::from_secs).ok_or_else(invalid)
}
