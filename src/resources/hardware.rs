//! Hardware namespace: `GET /v1/hardware`

use crate::client::Client;
use crate::errors::Result;
use crate::types::Hardware;
use reqwest::Method;

/// Hardware SKU listing
#[derive(Debug, Clone, Copy)]
pub struct HardwareClient<'a> {
    client: &'a Client,
}

impl<'a> HardwareClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All hardware SKUs; this endpoint is not paginated
    pub async fn list(&self) -> Result<Vec<Hardware>> {
        self.client
            .request_json(Method::GET, "/v1/hardware", None)
            .await
    }
}
