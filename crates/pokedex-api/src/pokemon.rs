// Pokemon row queries
//
// Count, inclusive-range page listing ordered by id, and single-row
// detail lookup against the `pokemon` table.

use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;

use crate::client::SupabaseClient;
use crate::error::Error;
use crate::models::{PokemonRow, PokemonSummaryRow};

const TABLE: &str = "pokemon";
const SUMMARY_COLUMNS: &str = "id,name,japanese_name,sprite_url";
/// REST error code for "single-row query returned zero rows".
const NO_ROWS_CODE: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

impl SupabaseClient {
    /// Total number of rows.
    ///
    /// `HEAD rest/v1/pokemon?select=id` with `Prefer: count=exact`; the
    /// total comes back in `Content-Range` (`0-29/151` or `*/151`).
    pub async fn count_pokemon(&self) -> Result<u64, Error> {
        let mut url = self.rest_url(TABLE)?;
        url.query_pairs_mut().append_pair("select", "id");

        let resp = self
            .request(reqwest::Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let header = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let count = parse_content_range_total(&header).ok_or_else(|| Error::Deserialization {
            message: "missing or malformed Content-Range total".into(),
            body: header.clone(),
        })?;
        debug!(count, "pokemon count");
        Ok(count)
    }

    /// Rows `offset..=end_inclusive` ordered by id ascending.
    ///
    /// Past the end of the table this returns a short or empty page.
    pub async fn list_pokemon(
        &self,
        offset: u64,
        end_inclusive: u64,
    ) -> Result<Vec<PokemonSummaryRow>, Error> {
        if end_inclusive < offset {
            return Ok(Vec::new());
        }
        let limit = end_inclusive - offset + 1;

        let mut url = self.rest_url(TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", SUMMARY_COLUMNS)
            .append_pair("order", "id.asc")
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        let rows: Vec<PokemonSummaryRow> = self.handle_response(resp).await?;
        debug!(offset, end_inclusive, returned = rows.len(), "pokemon page");
        Ok(rows)
    }

    /// Full record for one id.
    pub async fn get_pokemon(&self, id: i64) -> Result<PokemonRow, Error> {
        let mut url = self.rest_url(TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));

        let resp = self
            .request(reqwest::Method::GET, url)
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .send()
            .await?;

        match self.handle_response(resp).await {
            Err(Error::Rest { status, code, .. })
                if status == 406 || code.as_deref() == Some(NO_ROWS_CODE) =>
            {
                Err(Error::NotFound {
                    resource: "pokemon",
                    identifier: id.to_string(),
                })
            }
            other => other,
        }
    }
}

/// Extract the total from a `Content-Range` header value.
pub(crate) fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}
