use crate::errors::Result;
use crate::users::users_model::{NewUser, User};
use async_trait::async_trait;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;
    /// Loads every user in `user_ids` that exists. Unknown ids are skipped.
    fn get_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>>;
    async fn insert_new_user(&self, new_user: NewUser) -> Result<User>;
}
