//! Account endpoints of the diary backend

use async_trait::async_trait;

use crate::domain::account::{Signup, UserProfile};

use super::DiaryApiError;

/// Port for registering and managing the backend user
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Register a new user; log in afterwards to get a token
    async fn signup(&self, signup: &Signup) -> Result<(), DiaryApiError>;

    /// The user the access token belongs to
    async fn current_user(&self) -> Result<UserProfile, DiaryApiError>;

    async fn change_password(&self, current: &str, new: &str) -> Result<(), DiaryApiError>;
}
