use async_trait::async_trait;
use domain_orders::OrderStore;
use domain_products::ProductStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; a taken email is `DuplicateEmail`
    async fn create(&self, user: User) -> UserResult<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Get a user by (normalized) email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Get the user holding exactly this token
    async fn get_by_token(&self, token: &str) -> UserResult<Option<User>>;

    /// Save email, password hash and `updated_at`
    async fn update(&self, user: User) -> UserResult<User>;

    /// Check if a token is already held by someone
    async fn token_exists(&self, token: &str) -> UserResult<bool>;

    /// Store a new token; a concurrent duplicate is `TokenTaken`
    async fn set_token(&self, id: Uuid, token: &str) -> UserResult<()>;

    /// Ids of the products a user owns, oldest first
    async fn product_ids(&self, id: Uuid) -> UserResult<Vec<Uuid>>;

    /// Delete a user with their orders, products and every placement
    /// touching either, all or nothing
    async fn delete(&self, id: Uuid) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing).
///
/// Without [`with_cascade`](Self::with_cascade) the user owns no products
/// or orders.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    products: ProductStore,
    orders: OrderStore,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the product and order maps so deletes cascade into them
    pub fn with_cascade(mut self, products: ProductStore, orders: OrderStore) -> Self {
        self.products = products;
        self.orders = orders;
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_token(&self, token: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.auth_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        let stored = users.get_mut(&user.id).ok_or(UserError::NotFound(user.id))?;
        stored.email = user.email;
        stored.password_hash = user.password_hash;
        stored.updated_at = user.updated_at;

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(stored.clone())
    }

    async fn token_exists(&self, token: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.auth_token.as_deref() == Some(token)))
    }

    async fn set_token(&self, id: Uuid, token: &str) -> UserResult<()> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.id != id && u.auth_token.as_deref() == Some(token))
        {
            return Err(UserError::TokenTaken);
        }

        let user = users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        user.auth_token = Some(token.to_string());
        Ok(())
    }

    async fn product_ids(&self, id: Uuid) -> UserResult<Vec<Uuid>> {
        let products = self.products.read().await;

        let mut owned: Vec<_> = products.values().filter(|p| p.user_id == id).collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(owned.into_iter().map(|p| p.id).collect())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        // Same lock order as order placement: products, orders, then users
        let mut products = self.products.write().await;
        let mut orders = self.orders.write().await;
        let mut users = self.users.write().await;

        if !users.contains_key(&id) {
            return Ok(false);
        }

        let removed_products: HashSet<Uuid> = products
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        products.retain(|_, p| p.user_id != id);

        let orders_before = orders.len();
        orders.retain(|_, o| o.user_id != id);
        let removed_orders = orders_before - orders.len();

        for order in orders.values_mut() {
            order
                .placements
                .retain(|p| !removed_products.contains(&p.product_id));
        }

        users.remove(&id);

        tracing::info!(
            user_id = %id,
            products_removed = removed_products.len(),
            orders_removed = removed_orders,
            "Deleted user"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo.create(user("test@example.com")).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let by_email = repo.get_by_email("test@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();

        repo.create(user("test@example.com")).await.unwrap();
        let result = repo.create(user("test@example.com")).await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(user("alice@example.com")).await.unwrap();
        let bob = repo.create(user("bob@example.com")).await.unwrap();

        repo.set_token(alice.id, "abc").await.unwrap();
        assert!(repo.token_exists("abc").await.unwrap());
        assert!(matches!(
            repo.set_token(bob.id, "abc").await,
            Err(UserError::TokenTaken)
        ));

        let holder = repo.get_by_token("abc").await.unwrap().unwrap();
        assert_eq!(holder.id, alice.id);
        assert!(repo.get_by_token("abd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_token() {
        let repo = InMemoryUserRepository::new();
        let mut alice = repo.create(user("alice@example.com")).await.unwrap();
        repo.set_token(alice.id, "abc").await.unwrap();

        alice.apply_update(Some("new@example.com".to_string()), None);
        let updated = repo.update(alice).await.unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.auth_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let repo = InMemoryUserRepository::new();
        assert!(!repo.delete(Uuid::now_v7()).await.unwrap());
    }
}
