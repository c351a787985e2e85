//! Collections namespace

use crate::client::Client;
use crate::errors::Result;
use crate::pagination::cursor_path;
use crate::resources::path_segment;
use crate::types::{Collection, Page};
use reqwest::Method;

/// Curated model collections
#[derive(Debug, Clone, Copy)]
pub struct CollectionsClient<'a> {
    client: &'a Client,
}

impl<'a> CollectionsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetch a collection and its models by slug
    pub async fn get(&self, slug: &str) -> Result<Collection> {
        let slug = path_segment("collection slug", slug)?;
        self.client
            .request_json(Method::GET, &format!("/v1/collections/{}", slug), None)
            .await
    }

    /// One page of collections; `None` starts from the first page
    pub async fn list(&self, cursor: Option<&str>) -> Result<Page<Collection>> {
        let path = cursor_path(self.client.base_url(), "/v1/collections", cursor)?;
        self.client.request_json(Method::GET, &path, None).await
    }
}
