use crate::application_port::ApiError;
use crate::domain_model::{
    ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput, User,
};

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, input: RegisterInput) -> Result<String, ApiError>;
    /// Stores both issued tokens on success.
    async fn login(&self, input: LoginInput) -> Result<(), ApiError>;
    /// The signed-in user, or `None` when no credentials are stored.
    async fn get_auth_user(&self) -> Result<Option<User>, ApiError>;
    /// Clears both token classes. Purely local.
    async fn logout(&self);
    async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<String, ApiError>;
    async fn reset_password(&self, input: ResetPasswordInput) -> Result<String, ApiError>;
}
