use crate::application_port::ApiError;
use crate::domain_model::{UpdatePasswordInput, UpdateUserInput, VerifyEmailInput};

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn update_user(&self, input: UpdateUserInput) -> Result<String, ApiError>;
    async fn update_password(&self, input: UpdatePasswordInput) -> Result<(), ApiError>;
    /// Deletes the account, then ends the local session.
    async fn delete_user(&self) -> Result<(), ApiError>;
    async fn verify_email(&self, input: VerifyEmailInput) -> Result<String, ApiError>;
}
