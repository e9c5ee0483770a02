use crate::application_port::{ApiError, AuthService, UserService};
use crate::domain_model::{
    ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput, UpdatePasswordInput,
    UpdateUserInput, User, VerifyEmailInput,
};
use crate::domain_port::{Navigator, Notifier};
use crate::routing::RouteGuard;
use crate::store::report;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// The signed-in user and every account action.
pub struct UserStore {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    paths: RouteGuard,
    user: watch::Sender<Option<User>>,
}

impl UserStore {
    pub fn new(
        auth: Arc<dyn AuthService>,
        users: Arc<dyn UserService>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        paths: RouteGuard,
    ) -> Self {
        let (user, _) = watch::channel(None);
        UserStore {
            auth,
            users,
            notifier,
            navigator,
            paths,
            user,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    /// Reloads the signed-in user. Any failure, including a refresh that
    /// was denied, means "nobody is signed in" and is not reported.
    pub async fn fetch_user(&self) -> Option<User> {
        let user = match self.auth.get_auth_user().await {
            Ok(user) => user,
            Err(e) => {
                debug!(error = %e, "no authenticated user");
                None
            }
        };
        self.user.send_replace(user.clone());
        user
    }

    pub async fn register(&self, input: RegisterInput) -> Result<(), ApiError> {
        match self.auth.register(input).await {
            Ok(_) => {
                self.notifier.success("Sign up Successful! 🎉");
                self.navigator.navigate(&self.paths.login_path);
                Ok(())
            }
            Err(e) => {
                report(&*self.notifier, "register", &e);
                Err(e)
            }
        }
    }

    pub async fn login(&self, input: LoginInput) -> Result<(), ApiError> {
        if let Err(e) = self.auth.login(input).await {
            report(&*self.notifier, "login", &e);
            return Err(e);
        }
        self.notifier.success("Log In Successful! 🎉");
        self.fetch_user().await;
        self.navigator.navigate(&self.paths.landing_path);
        Ok(())
    }

    pub async fn logout(&self) {
        self.auth.logout().await;
        self.user.send_replace(None);
        self.navigator.navigate(&self.paths.login_path);
    }

    pub async fn update_user(&self, input: UpdateUserInput) -> Result<(), ApiError> {
        if let Err(e) = self.users.update_user(input).await {
            report(&*self.notifier, "update user", &e);
            return Err(e);
        }
        self.notifier.success("User Updated Successfully! 🎉");
        self.fetch_user().await;
        Ok(())
    }

    pub async fn update_password(&self, input: UpdatePasswordInput) -> Result<(), ApiError> {
        match self.users.update_password(input).await {
            Ok(()) => {
                self.notifier.success("Password Updated Successfully! 🎉");
                Ok(())
            }
            Err(e) => {
                report(&*self.notifier, "update password", &e);
                Err(e)
            }
        }
    }

    pub async fn delete_user(&self) -> Result<(), ApiError> {
        if let Err(e) = self.users.delete_user().await {
            report(&*self.notifier, "delete user", &e);
            return Err(e);
        }
        self.notifier.success("User Account Deleted Successfully! 🎉");
        self.user.send_replace(None);
        self.navigator.navigate(&self.paths.login_path);
        Ok(())
    }

    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<(), ApiError> {
        match self.auth.forgot_password(input).await {
            Ok(message) => {
                self.notifier.success(&message);
                Ok(())
            }
            Err(e) => {
                report(&*self.notifier, "forgot password", &e);
                Err(e)
            }
        }
    }

    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), ApiError> {
        match self.auth.reset_password(input).await {
            Ok(message) => {
                self.notifier.success(&message);
                self.navigator.navigate(&self.paths.login_path);
                Ok(())
            }
            Err(e) => {
                report(&*self.notifier, "reset password", &e);
                Err(e)
            }
        }
    }

    pub async fn verify_email(&self, input: VerifyEmailInput) -> Result<(), ApiError> {
        match self.users.verify_email(input).await {
            Ok(message) => {
                self.notifier.success(&message);
                if self.user.borrow().is_some() {
                    self.fetch_user().await;
                }
                Ok(())
            }
            Err(e) => {
                report(&*self.notifier, "verify email", &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain_model::{LoginInput, UpdateUserInput};
    use crate::domain_port::{Notification, NotificationLevel};
    use crate::infra_fake::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::store::test_support::{harness, signed_in};

    #[tokio::test]
    async fn login_loads_user_and_lands_on_dashboard() {
        let h = harness();
        h.client
            .users
            .login(LoginInput {
                email: DEMO_EMAIL.to_owned(),
                password: DEMO_PASSWORD.to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(h.client.users.user().unwrap().email, DEMO_EMAIL);
        assert_eq!(h.client.router.current(), "/dashboard");
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::success("Log In Successful! 🎉")]
        );
    }

    #[tokio::test]
    async fn bad_credentials_give_one_error_with_server_text() {
        let h = harness();
        let err = h
            .client
            .users
            .login(LoginInput {
                email: DEMO_EMAIL.to_owned(),
                password: "wrong-password".to_owned(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "invalid email or password");
        let notes = h.notifier.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "invalid email or password");
        assert!(h.client.users.user().is_none());
    }

    #[tokio::test]
    async fn failed_fetch_user_is_silent() {
        let h = harness();
        h.api.set_fail_refresh(true);
        let stale = crate::infra_fake::mint_token("nobody", chrono::Duration::seconds(-5));
        let refresh = crate::infra_fake::mint_token("nobody", chrono::Duration::days(1));
        h.client.http.coordinator().login(&crate::domain_model::LoginTokens {
            access_token: crate::domain_model::AccessToken::new(stale),
            refresh_token: crate::domain_model::RefreshToken::new(refresh),
        });

        assert!(h.client.users.fetch_user().await.is_none());
        assert!(h.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn update_reloads_user() {
        let h = signed_in().await;
        h.client
            .users
            .update_user(UpdateUserInput {
                firstname: Some("Ada".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(h.client.users.user().unwrap().firstname, "Ada");
    }

    #[tokio::test]
    async fn logout_clears_user_and_tokens() {
        let h = signed_in().await;
        h.client.users.logout().await;
        assert!(h.client.users.user().is_none());
        assert!(h.client.http.credentials().snapshot().is_empty());
        assert_eq!(h.client.router.current(), "/login");
    }
}
