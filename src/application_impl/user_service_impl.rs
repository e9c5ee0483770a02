use crate::application_port::{ApiError, UserService};
use crate::domain_model::{UpdatePasswordInput, UpdateUserInput, VerifyEmailInput};
use crate::domain_port::ApiRequest;
use crate::session::AuthenticatedClient;
use std::sync::Arc;

pub struct RealUserService {
    client: Arc<AuthenticatedClient>,
}

impl RealUserService {
    pub fn new(client: Arc<AuthenticatedClient>) -> RealUserService {
        RealUserService { client }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn update_user(&self, input: UpdateUserInput) -> Result<String, ApiError> {
        let request = ApiRequest::put("/user").json(&input)?;
        self.client.message(request).await
    }

    async fn update_password(&self, input: UpdatePasswordInput) -> Result<(), ApiError> {
        let request = ApiRequest::put("/user/password").json(&input)?;
        self.client.message(request).await?;
        Ok(())
    }

    async fn delete_user(&self) -> Result<(), ApiError> {
        self.client.message(ApiRequest::delete("/user")).await?;
        self.client.coordinator().logout();
        Ok(())
    }

    async fn verify_email(&self, input: VerifyEmailInput) -> Result<String, ApiError> {
        let request = ApiRequest::post("/user/verify-email").json(&input)?;
        self.client.message(request).await
    }
}
