//! The shopper's cart.

use threadline_core::cart::Cart;
use tower_sessions::Session;

use crate::models::session_keys;

/// Load the cart. A missing or unreadable cart reads as empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            Cart::default()
        }
    }
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use threadline_core::ProductId;
    use threadline_core::cart::CartItem;

    use super::*;
    use crate::stores::test_session;

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = test_session();
        let mut cart = Cart::default();
        cart.add(CartItem {
            product_id: ProductId::new("p-1"),
            variant_id: None,
            name: "Kente Shirt".to_string(),
            size: None,
            color: None,
            image_url: None,
            price: dec!(120),
            quantity: 2,
        })
        .unwrap();

        save_cart(&session, &cart).await.unwrap();
        assert_eq!(load_cart(&session).await, cart);
    }

    #[tokio::test]
    async fn test_unreadable_cart_reads_as_empty() {
        let session = test_session();
        session.insert(session_keys::CART, 42).await.unwrap();
        assert!(load_cart(&session).await.is_empty());
    }
}
