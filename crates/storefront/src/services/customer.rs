//! Customer API calls on behalf of the signed-in shopper.
//!
//! [`CustomerSession`] pairs the backend client with the shopper's session.
//! Refreshed tokens are written back to the session after every call, and a
//! rejected refresh wipes the shopper's tokens before surfacing
//! [`AppError::SessionExpired`].

use chrono::{DateTime, Utc};
use threadline_core::AddressId;
use threadline_core::location::{Address, AddressDraft};
use tower_sessions::Session;

use crate::api::{ApiClient, ApiError, TokenSet};
use crate::error::AppError;
use crate::stores::{self, tokens};

pub struct CustomerSession {
    api: ApiClient,
    session: Session,
    tokens: TokenSet,
    stored_expiry: DateTime<Utc>,
}

impl CustomerSession {
    /// Load the shopper's tokens from the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionExpired` if the session holds no tokens.
    pub async fn load(api: ApiClient, session: Session) -> Result<Self, AppError> {
        let Some(tokens) = tokens::load_tokens(&session).await? else {
            tracing::warn!("Signed-in shopper has no tokens");
            stores::clear_shopper(&session).await?;
            return Err(AppError::SessionExpired);
        };
        Ok(Self {
            api,
            session,
            stored_expiry: tokens.expires_at,
            tokens,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn addresses(&mut self) -> Result<Vec<Address>, AppError> {
        let result = self.api.addresses(&mut self.tokens).await;
        self.settle(result).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn create_address(&mut self, draft: &AddressDraft) -> Result<Address, AppError> {
        let result = self.api.create_address(&mut self.tokens, draft).await;
        self.settle(result).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn update_address(
        &mut self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<Address, AppError> {
        let result = self.api.update_address(&mut self.tokens, id, draft).await;
        self.settle(result).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn delete_address(&mut self, id: &AddressId) -> Result<(), AppError> {
        let result = self.api.delete_address(&mut self.tokens, id).await;
        self.settle(result).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn set_default_address(&mut self, id: &AddressId) -> Result<(), AppError> {
        let result = self.api.set_default_address(&mut self.tokens, id).await;
        self.settle(result).await
    }

    /// Persist refreshed tokens and translate an expired session.
    async fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, AppError> {
        if let Err(ApiError::SessionExpired(reason)) = &result {
            tracing::info!(%reason, "Refresh rejected, signing shopper out");
            stores::clear_shopper(&self.session).await?;
            return Err(AppError::SessionExpired);
        }

        if self.tokens.expires_at != self.stored_expiry {
            tokens::save_tokens(&self.session, &self.tokens).await?;
            self.stored_expiry = self.tokens.expires_at;
        }

        Ok(result?)
    }
}
