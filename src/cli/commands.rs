//! CLI command handlers.

use std::time::Duration;

use crate::api::SpotifyClient;
use crate::auth::{TokenManager, TokenState};
use crate::config::{CredentialStore, Field, FieldValue, StoreConfig, StoreError};
use crate::error::{PlaylisterError, Result};

use super::{Cli, Commands, ConfigCommands, PlaylistCommands, SearchArgs};

/// Run one parsed command line to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        token,
        client,
        secret,
        redirect,
        path,
        auth_timeout,
        command,
        ..
    } = cli;

    let mut store = CredentialStore::new(StoreConfig::resolve(path));
    apply_client_overrides(&mut store, client.as_deref(), secret.as_deref())?;

    let manager = |store: CredentialStore| {
        let built = TokenManager::new(store)
            .with_callback_timeout(Duration::from_secs(auth_timeout));
        match &redirect {
            Some(uri) => built.with_redirect_uri(uri.clone()),
            None => built,
        }
    };

    match command {
        Commands::Auth(args) => handle_auth(&mut manager(store), args.force).await,
        Commands::Token => handle_token(&mut manager(store), token).await,
        Commands::Search(args) => handle_search(&mut manager(store), token, args).await,
        Commands::Config(args) => match args.command {
            ConfigCommands::Get { field } => handle_config_get(&mut store, &field),
            ConfigCommands::Set { field, value } => handle_config_set(&mut store, &field, value),
        },
        Commands::Playlist(args) => match args.command {
            PlaylistCommands::Add { name, id } => handle_playlist_add(&mut store, name, id),
            PlaylistCommands::Remove { name } => handle_playlist_remove(&mut store, &name),
            PlaylistCommands::List => handle_playlist_list(&mut store),
        },
    }
}

/// Write the client id/secret given on the command line, skipping the write
/// when they already match the record.
pub fn apply_client_overrides(
    store: &mut CredentialStore,
    client: Option<&str>,
    secret: Option<&str>,
) -> std::result::Result<(), StoreError> {
    let record = store.record()?;
    let mut updates = Vec::new();
    if let Some(client) = client.filter(|c| *c != record.client_id) {
        updates.push((Field::Client, FieldValue::from(client)));
    }
    if let Some(secret) = secret.filter(|s| *s != record.client_secret) {
        updates.push((Field::Secret, FieldValue::from(secret)));
    }
    if updates.is_empty() {
        return Ok(());
    }
    store.update(updates)
}

async fn handle_auth(manager: &mut TokenManager, force: bool) -> Result<()> {
    if force || manager.state()? == TokenState::NoToken {
        manager.authorize().await?;
    } else {
        manager.current_token().await?;
    }
    let record = manager.store_mut().record()?;
    match record.expires_at {
        Some(expires_at) => println!(
            "✅ Authorized (token valid until {})",
            expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("✅ Authorized"),
    }
    Ok(())
}

async fn handle_token(manager: &mut TokenManager, token_override: Option<String>) -> Result<()> {
    let token = bearer(manager, token_override).await?;
    println!("{token}");
    Ok(())
}

async fn handle_search(
    manager: &mut TokenManager,
    token_override: Option<String>,
    args: SearchArgs,
) -> Result<()> {
    let token = bearer(manager, token_override).await?;
    match SpotifyClient::new()
        .search(&token, &args.artist, &args.title)
        .await?
    {
        Some(track) => println!("{} - {} ({})", track.artist, track.name, track.id),
        None => println!("No match for {} - {}", args.artist, args.title),
    }
    Ok(())
}

async fn bearer(manager: &mut TokenManager, token_override: Option<String>) -> Result<String> {
    match token_override.filter(|t| !t.is_empty()) {
        Some(token) => Ok(token),
        None => Ok(manager.current_token().await?),
    }
}

fn handle_config_get(store: &mut CredentialStore, field: &str) -> Result<()> {
    let value = store.get_named(field)?;
    println!("{value}");
    Ok(())
}

/// Only the client credentials are set by hand; token fields belong to the
/// authorization flow.
pub fn handle_config_set(store: &mut CredentialStore, field: &str, value: String) -> Result<()> {
    match Field::parse(field)? {
        target @ (Field::Client | Field::Secret) => {
            store.set(target, value)?;
            Ok(())
        }
        Field::Playlists => Err(PlaylisterError::InvalidArgument(
            "playlists are managed with `playlister playlist`".to_string(),
        )),
        other => Err(PlaylisterError::InvalidArgument(format!(
            "'{other}' is managed by `playlister auth`"
        ))),
    }
}

pub fn handle_playlist_add(store: &mut CredentialStore, name: String, id: String) -> Result<()> {
    let mut playlists = store.record()?.playlists.clone();
    playlists.insert(name, id);
    store.set(Field::Playlists, playlists)?;
    Ok(())
}

pub fn handle_playlist_remove(store: &mut CredentialStore, name: &str) -> Result<()> {
    let mut playlists = store.record()?.playlists.clone();
    if playlists.remove(name).is_none() {
        return Err(PlaylisterError::InvalidArgument(format!(
            "no playlist named '{name}'"
        )));
    }
    store.set(Field::Playlists, playlists)?;
    Ok(())
}

fn handle_playlist_list(store: &mut CredentialStore) -> Result<()> {
    let playlists = &store.record()?.playlists;
    if playlists.is_empty() {
        println!("No playlists configured");
        return Ok(());
    }
    for (name, id) in playlists {
        println!("{name}: {id}");
    }
    Ok(())
}
