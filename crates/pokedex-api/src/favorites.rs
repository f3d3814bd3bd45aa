// Favorites relation (`user_favorites`: user id -> pokemon id)

use tracing::debug;
use uuid::Uuid;

use crate::client::SupabaseClient;
use crate::error::Error;
use crate::models::{FavoriteInsert, FavoriteRow};

const TABLE: &str = "user_favorites";

impl SupabaseClient {
    /// All pokemon ids the user has favorited.
    pub async fn list_favorite_ids(&self, user_id: Uuid) -> Result<Vec<i64>, Error> {
        let mut url = self.rest_url(TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "pokemon_id")
            .append_pair("user_id", &format!("eq.{user_id}"));

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        let rows: Vec<FavoriteRow> = self.handle_response(resp).await?;
        debug!(%user_id, count = rows.len(), "favorites fetched");
        Ok(rows.into_iter().map(|r| r.pokemon_id).collect())
    }

    pub async fn insert_favorite(&self, user_id: Uuid, pokemon_id: i64) -> Result<(), Error> {
        let url = self.rest_url(TABLE)?;
        let resp = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(&FavoriteInsert {
                user_id,
                pokemon_id,
            })
            .send()
            .await?;
        self.handle_empty(resp).await
    }

    pub async fn delete_favorite(&self, user_id: Uuid, pokemon_id: i64) -> Result<(), Error> {
        let mut url = self.rest_url(TABLE)?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("pokemon_id", &format!("eq.{pokemon_id}"));

        let resp = self.request(reqwest::Method::DELETE, url).send().await?;
        self.handle_empty(resp).await
    }
}
