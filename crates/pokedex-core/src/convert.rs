// ── API-to-domain type conversions ──
//
// Bridges raw `pokedex_api` wire types into `pokedex_core::model`.
// Column names are normalized and epoch timestamps become `DateTime`.

use chrono::Utc;

use pokedex_api::{PokemonRow, PokemonSummaryRow, SessionData, UserRecord};

use crate::model::{
    BaseStats, Pokemon, PokemonSummary, Session, SessionChange, SessionEventKind, User, UserId,
};

impl From<PokemonSummaryRow> for PokemonSummary {
    fn from(row: PokemonSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            localized_name: row.japanese_name,
            thumbnail_url: row.sprite_url,
        }
    }
}

impl From<PokemonRow> for Pokemon {
    fn from(row: PokemonRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            localized_name: row.japanese_name,
            height: row.height,
            weight: row.weight,
            thumbnail_url: row.sprite_url,
            types: row.types,
            stats: BaseStats {
                hp: row.stats.hp,
                attack: row.stats.attack,
                defense: row.stats.defense,
            },
            created_at: row.created_at,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: UserId::new(record.id),
            email: record.email,
            email_confirmed: record.email_confirmed_at.is_some(),
            created_at: record.created_at,
            last_sign_in: record.last_sign_in_at,
        }
    }
}

impl From<SessionData> for Session {
    fn from(data: SessionData) -> Self {
        let expires_at = data.expires_at_utc(Utc::now());
        Self {
            access_token: data.access_token,
            expires_at,
            user: data.user.into(),
        }
    }
}

impl From<pokedex_api::SessionEventKind> for SessionEventKind {
    fn from(kind: pokedex_api::SessionEventKind) -> Self {
        match kind {
            pokedex_api::SessionEventKind::SignedIn => Self::SignedIn,
            pokedex_api::SessionEventKind::SignedOut => Self::SignedOut,
            pokedex_api::SessionEventKind::TokenRefreshed => Self::TokenRefreshed,
            pokedex_api::SessionEventKind::UserUpdated => Self::UserUpdated,
            pokedex_api::SessionEventKind::PasswordRecovery => Self::PasswordRecovery,
        }
    }
}

impl From<pokedex_api::SessionEvent> for SessionChange {
    fn from(event: pokedex_api::SessionEvent) -> Self {
        Self {
            kind: event.kind.into(),
            session: event.session.map(Session::from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_row_maps_localized_fields() {
        let summary: PokemonSummary = PokemonSummaryRow {
            id: 1,
            name: "bulbasaur".into(),
            japanese_name: Some("フシギダネ".into()),
            sprite_url: Some("https://img.example/1.png".into()),
        }
        .into();

        assert_eq!(
            summary,
            PokemonSummary {
                id: 1,
                name: "bulbasaur".into(),
                localized_name: Some("フシギダネ".into()),
                thumbnail_url: Some("https://img.example/1.png".into()),
            }
        );
    }

    #[test]
    fn user_record_marks_confirmation() {
        let user: User = UserRecord {
            id: uuid::Uuid::nil(),
            email: Some("ash@example.com".into()),
            email_confirmed_at: Some(DateTime::from_timestamp(0, 0).unwrap()),
            created_at: None,
            last_sign_in_at: None,
        }
        .into();
        assert!(user.email_confirmed);
        assert_eq!(user.id, UserId::new(uuid::Uuid::nil()));
    }
}
