use std::time::Duration;

use reqwest::Client;

use super::error::SearchError;
use super::types::SearchResponse;
use crate::traits::{ArtistMatch, MetadataService, SongMatch};

const BASE_URL: &str = "https://tools.applemediaservices.com/api/apple-media/music";

/// Client for the public Apple media search endpoint.
pub struct AppleMediaClient {
    storefront: String,
    http: Client,
}

impl AppleMediaClient {
    /// Build a client for a storefront (e.g. `"US"`), with a per-request timeout.
    pub fn new(storefront: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("encore/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            storefront: storefront.into(),
            http,
        })
    }

    fn search_url(&self) -> String {
        format!("{BASE_URL}/{}/search.json", self.storefront)
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "search API error");
            Err(SearchError::Api {
                status,
                message: body,
            })
        }
    }

    async fn search(&self, kind: &str, term: &str) -> Result<SearchResponse, SearchError> {
        let resp = self
            .http
            .get(self.search_url())
            .query(&[("types", kind), ("limit", "1"), ("term", term)])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

impl MetadataService for AppleMediaClient {
    type Error = SearchError;

    #[tracing::instrument(name = "search_song", skip(self))]
    async fn search_song(&self, term: &str) -> Result<Option<SongMatch>, SearchError> {
        Ok(self.search("songs", term).await?.first_song())
    }

    #[tracing::instrument(name = "search_artist", skip(self))]
    async fn search_artist(&self, term: &str) -> Result<Option<ArtistMatch>, SearchError> {
        Ok(self.search("artists", term).await?.first_artist())
    }
}
