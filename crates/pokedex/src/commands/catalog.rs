//! Catalog command handlers: `list` and `show`.

use std::fmt::Write;

use serde::Serialize;
use tabled::Tabled;

use pokedex_core::{Pokemon, PokemonSummary, parse_entity_id};

use crate::cli::{ListArgs, OutputFormat, ShowArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "#")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Localized")]
    localized: String,
    #[tabled(rename = "★")]
    favorite: String,
}

/// One listed entry with its favorite flag, for structured output.
#[derive(Serialize)]
struct ListedEntry<'a> {
    #[serde(flatten)]
    summary: &'a PokemonSummary,
    favorite: bool,
}

#[derive(Serialize)]
struct PageView<'a> {
    page: u32,
    total_pages: u64,
    total_count: u64,
    items: Vec<ListedEntry<'a>>,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list(session: &Session, args: &ListArgs) -> Result<(), CliError> {
    session.bootstrap().await?;
    let catalog = session.app.catalog();
    let favorites = session.app.favorites();

    let items = if args.page == catalog.current_page_number() {
        catalog.current_page()
    } else {
        catalog.load_page(args.page).await?
    };

    let entries: Vec<ListedEntry<'_>> = items
        .iter()
        .map(|summary| ListedEntry {
            summary,
            favorite: favorites.is_favorite(summary.id),
        })
        .collect();

    let out = match session.output {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let view = PageView {
                page: args.page,
                total_pages: catalog.total_pages(),
                total_count: catalog.total_count(),
                items: entries,
            };
            output::render_single(session.output, &view, |_| String::new(), |_| String::new())?
        }
        _ => {
            let body = output::render_list(
                session.output,
                &entries,
                |e| SummaryRow {
                    id: e.summary.id,
                    name: e.summary.name.clone(),
                    localized: e.summary.localized_name.clone().unwrap_or_default(),
                    favorite: output::favorite_marker(e.favorite, session.color),
                },
                |e| e.summary.id.to_string(),
            )?;
            if session.output == OutputFormat::Table {
                session.status(&format!(
                    "Page {} of {} ({} total)",
                    args.page,
                    catalog.total_pages(),
                    catalog.total_count()
                ));
            }
            body
        }
    };
    output::print_output(&out, session.quiet);
    Ok(())
}

pub async fn show(session: &Session, args: &ShowArgs) -> Result<(), CliError> {
    let id = parse_entity_id(&args.id)?;
    let (pokemon, _) = tokio::join!(
        session.app.catalog().fetch_detail(id),
        load_favorites(session)
    );
    let pokemon = pokemon?;
    let favorite = session.app.favorites().is_favorite(id);

    let out = output::render_single(
        session.output,
        &pokemon,
        |p| detail(p, favorite, session.color),
        |p| p.id.to_string(),
    )?;
    output::print_output(&out, session.quiet);
    Ok(())
}

/// Favorites only decorate the detail view; failures are logged.
async fn load_favorites(session: &Session) {
    if session.app.auth().initialize().await.is_authenticated() {
        if let Err(e) = session.app.favorites().load().await {
            tracing::warn!(error = %e, "could not load favorites");
        }
    }
}

fn detail(p: &Pokemon, favorite: bool, color: bool) -> String {
    let mut out = String::new();
    let title = match p.localized_name {
        Some(ref local) => format!("#{} {} ({local})", p.id, p.name),
        None => format!("#{} {}", p.id, p.name),
    };
    let marker = output::favorite_marker(favorite, color);
    let _ = writeln!(out, "{} {marker}", output::heading(&title, color));
    let _ = writeln!(out, "  Types:   {}", p.types.join(", "));
    let _ = writeln!(out, "  Height:  {}", p.height);
    let _ = writeln!(out, "  Weight:  {}", p.weight);
    let _ = writeln!(out, "  HP:      {}", p.stats.hp);
    let _ = writeln!(out, "  Attack:  {}", p.stats.attack);
    let _ = write!(out, "  Defense: {}", p.stats.defense);
    if let Some(ref url) = p.thumbnail_url {
        let _ = write!(out, "\n  Image:   {url}");
    }
    out
}
