//! Account namespace: `GET /v1/account`

use crate::client::Client;
use crate::errors::Result;
use crate::types::Account;
use reqwest::Method;

/// Account lookups
#[derive(Debug, Clone, Copy)]
pub struct AccountClient<'a> {
    client: &'a Client,
}

impl<'a> AccountClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// The account the API token belongs to
    pub async fn current(&self) -> Result<Account> {
        self.client
            .request_json(Method::GET, "/v1/account", None)
            .await
    }
}
