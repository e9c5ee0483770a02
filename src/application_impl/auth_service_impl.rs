use crate::application_port::{ApiError, AuthService};
use crate::domain_model::{
    ForgotPasswordInput, LoginInput, LoginTokens, RegisterInput, ResetPasswordInput, User,
};
use crate::domain_port::ApiRequest;
use crate::session::AuthenticatedClient;
use std::sync::Arc;
use tracing::info;

pub struct RealAuthService {
    client: Arc<AuthenticatedClient>,
}

impl RealAuthService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealAuthService {
        RealAuthService { client }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, input: RegisterInput) -> Result<String, ApiError> {
        let request = ApiRequest::post("/auth/register").json(&input)?;
        self.client.message(request).await
    }

    async fn login(&self, input: LoginInput) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/login").json(&input)?;
        let tokens: LoginTokens = self.client.data(request).await?;
        self.client.coordinator().login(&tokens);
        info!(email = %input.email, "logged in");
        Ok(())
    }

    async fn get_auth_user(&self) -> Result<Option<User>, ApiError> {
        if self.client.credentials().snapshot().is_empty() {
            return Ok(None);
        }
        let user = self.client.data(ApiRequest::get("/auth/user")).await?;
        Ok(Some(user))
    }

    async fn logout(&self) {
        self.client.coordinator().logout();
    }

    async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<String, ApiError> {
        let request = ApiRequest::post("/auth/forgot-password").json(&input)?;
        self.client.message(request).await
    }

    async fn reset_password(&self, input: ResetPasswordInput) -> Result<String, ApiError> {
        let request = ApiRequest::post("/auth/reset-password").json(&input)?;
        self.client.message(request).await
    }
}
