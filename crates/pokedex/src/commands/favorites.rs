//! Favorites command handlers.

use serde::Serialize;
use tabled::Tabled;

use pokedex_core::{PokemonId, ToggleAction, parse_entity_id};

use crate::cli::{FavoritesArgs, FavoritesCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct FavoriteRow {
    #[tabled(rename = "#")]
    id: PokemonId,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Serialize)]
struct FavoriteEntry {
    id: PokemonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct ToggleResult {
    id: PokemonId,
    action: ToggleAction,
    count: usize,
}

pub async fn handle(session: &Session, args: FavoritesArgs) -> Result<(), CliError> {
    // Favorites need a user; fail before touching the network otherwise.
    let auth = session.app.auth();
    if !auth.initialize().await.is_authenticated() {
        return Err(CliError::NotSignedIn {
            operation: "use favorites".into(),
        });
    }
    session.app.favorites().load().await?;

    match args.command {
        FavoritesCommand::List => list(session).await,
        FavoritesCommand::Toggle { id } => toggle(session, &id).await,
    }
}

async fn list(session: &Session) -> Result<(), CliError> {
    let ids = session.app.favorites().ids();
    let want_names = session.output != OutputFormat::Plain;

    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        let name = if want_names {
            match session.app.catalog().fetch_detail(id).await {
                Ok(p) => Some(p.name),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };
        entries.push(FavoriteEntry { id, name });
    }

    let out = output::render_list(
        session.output,
        &entries,
        |e| FavoriteRow {
            id: e.id,
            name: e.name.clone().unwrap_or_else(|| "(unknown)".into()),
        },
        |e| e.id.to_string(),
    )?;
    if entries.is_empty() {
        session.status("No favorites yet. Add one with: pokedex favorites toggle <id>");
    }
    output::print_output(&out, session.quiet);
    Ok(())
}

async fn toggle(session: &Session, raw_id: &str) -> Result<(), CliError> {
    let id = parse_entity_id(raw_id)?;
    let favorites = session.app.favorites();
    let action = favorites.toggle(id).await?;

    let result = ToggleResult {
        id,
        action,
        count: favorites.count(),
    };
    let out = output::render_single(
        session.output,
        &result,
        |r| match r.action {
            ToggleAction::Added => format!("Added #{} to favorites ({} total)", r.id, r.count),
            ToggleAction::Removed => {
                format!("Removed #{} from favorites ({} total)", r.id, r.count)
            }
        },
        |r| r.action.to_string(),
    )?;
    output::print_output(&out, session.quiet);
    Ok(())
}
