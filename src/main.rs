mod commands;
mod config;
mod constants;
mod engine;
mod error;
mod handlers;
mod models;
mod services;
mod utils;

use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing::{error, info, warn};

use crate::{
    commands::{no_spam, voice_spam},
    config::load_guild_configs,
    constants::{DEFAULT_CONFIG_PATH, DEFAULT_TIMEZONE, LOG_DIRECTIVE},
    engine::{ConfigStore, role_sync::Direction},
    error::ConfigError,
    handlers::{handle_reaction, handle_ready, handle_voice_state_update},
    models::Data,
    services::Soundboard,
    utils::timezone::parse_timezone,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    initialize_logging();

    // Load configuration from environment
    let config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Load per-guild settings
    let guilds = match load_guild_configs(&config.config_path, config.default_timezone) {
        Ok(guilds) => guilds,
        Err(e) => {
            error!("Failed to load guild configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Loaded configuration for {} guilds from {}",
        guilds.len(),
        config.config_path
    );

    // Initialize bot data
    let data = Data::new(
        ConfigStore::new(guilds),
        Soundboard::new(&config.discord_token),
    );

    // Create and start the bot
    if let Err(e) = start_bot(config.discord_token, data).await {
        error!("Bot error: {}", e);
        std::process::exit(1);
    }
}

/// Configuration loaded from environment variables
struct Config {
    discord_token: String,
    config_path: String,
    default_timezone: Tz,
}

/// Initialize the logging system
fn initialize_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse().expect("valid log directive")),
        )
        .init();
}

/// Load configuration from environment variables
fn load_configuration() -> Result<Config, ConfigError> {
    let discord_token =
        std::env::var("DISCORD_TOKEN").map_err(|_| ConfigError::MissingEnvVar("DISCORD_TOKEN"))?;

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let default_timezone = parse_timezone(
        &std::env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
    )?;

    Ok(Config {
        discord_token,
        config_path,
        default_timezone,
    })
}

/// Create and start the Discord bot
async fn start_bot(token: String, data: Data) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Create framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![voice_spam(), no_spam()],
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    match event {
                        serenity::FullEvent::Ready { data_about_bot } => {
                            handle_ready(ctx, data_about_bot, data).await;
                        }
                        serenity::FullEvent::VoiceStateUpdate { old, new } => {
                            handle_voice_state_update(ctx, old.clone(), new.clone(), data).await;
                        }
                        serenity::FullEvent::ReactionAdd { add_reaction } => {
                            handle_reaction(ctx, add_reaction, Direction::Grant, data).await;
                        }
                        serenity::FullEvent::ReactionRemove { removed_reaction } => {
                            handle_reaction(ctx, removed_reaction, Direction::Revoke, data).await;
                        }
                        _ => {}
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                // Commands are per guild so they show up instantly
                for guild_id in data.config.guild_ids() {
                    match poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        guild_id,
                    )
                    .await
                    {
                        Ok(()) => info!("Commands registered in guild {}", guild_id),
                        Err(e) => error!("Failed to register commands in guild {}: {}", guild_id, e),
                    }
                }

                info!("Bot is ready!");

                Ok(data)
            })
        })
        .build();

    // Create client with required intents
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_PRESENCES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .register_songbird()
        .await?;

    // Close the gateway connection cleanly on SIGINT/SIGTERM
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received, closing connection");
        shard_manager.shutdown_all().await;
    });

    // Start the bot
    info!("Starting bot...");
    client.start().await?;

    info!("Bot stopped");
    Ok(())
}

/// Resolve when the process is asked to stop
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = wait_for_ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                wait_for_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }
}

async fn wait_for_ctrl_c() {
    signal_received(tokio::signal::ctrl_c().await).await;
}

/// A listener that failed to install never fires, rather than firing at once
async fn signal_received(result: std::io::Result<()>) {
    if let Err(e) = result {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
