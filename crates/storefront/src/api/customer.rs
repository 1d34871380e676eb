//! Customer address endpoints (bearer-authenticated).

use reqwest::Method;
use threadline_core::AddressId;
use threadline_core::location::{Address, AddressDraft};
use tracing::instrument;

use super::{ApiClient, ApiError, TokenSet};

fn address_path(id: &AddressId) -> String {
    format!("customer-addresses/{}", urlencoding::encode(id.as_str()))
}

impl ApiClient {
    /// The shopper's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the tokens cannot be refreshed.
    #[instrument(skip(self, tokens))]
    pub async fn addresses(&self, tokens: &mut TokenSet) -> Result<Vec<Address>, ApiError> {
        self.authorized(tokens, Method::GET, "customer-addresses", None)
            .await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, tokens, draft))]
    pub async fn create_address(
        &self,
        tokens: &mut TokenSet,
        draft: &AddressDraft,
    ) -> Result<Address, ApiError> {
        let body = serde_json::to_value(draft)?;
        self.authorized(tokens, Method::POST, "customer-addresses", Some(&body))
            .await
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, tokens, draft), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        tokens: &mut TokenSet,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<Address, ApiError> {
        let body = serde_json::to_value(draft)?;
        self.authorized(tokens, Method::PUT, &address_path(id), Some(&body))
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, tokens), fields(address_id = %id))]
    pub async fn delete_address(&self, tokens: &mut TokenSet, id: &AddressId) -> Result<(), ApiError> {
        // The response body, if any, is ignored.
        let _: serde_json::Value = self
            .authorized(tokens, Method::DELETE, &address_path(id), None)
            .await?;
        Ok(())
    }

    /// Make a saved address the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, tokens), fields(address_id = %id))]
    pub async fn set_default_address(
        &self,
        tokens: &mut TokenSet,
        id: &AddressId,
    ) -> Result<(), ApiError> {
        let path = format!("{}/default", address_path(id));
        let _: serde_json::Value = self.authorized(tokens, Method::PUT, &path, None).await?;
        Ok(())
    }
}
