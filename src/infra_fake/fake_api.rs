//! In-process stand-in for the bucket storage API.
//!
//! Speaks the same envelopes and status codes as the real server, keeps all
//! state in memory and records every request it receives. Refresh tokens
//! rotate: each one is accepted once.

use crate::domain_model::{
    ApiKey, ApiKeyIds, ApiKeyInput, ApiKeyPermission, Bucket, BucketDetails, BucketItem,
    BucketItemInput, BucketPermission, CreateBucketInput, CreatedApiKey, ForgotPasswordInput,
    LoginInput, LoginTokens, PageInfo, RefreshedTokens, RegisterInput, ResetPasswordInput,
    UpdatePasswordInput, UpdateUserInput, User, VerifyEmailInput,
};
use crate::domain_model::{AccessToken, RefreshToken};
use crate::domain_port::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use crate::infra_fake::{FakeTokenCodec, TokenKind};
use crate::session::{REFRESH_TOKEN_HEADER, REFRESH_TOKEN_PATH};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub const DEMO_EMAIL: &str = "demo@keeper.dev";
pub const DEMO_PASSWORD: &str = "keeper-demo";

const DEFAULT_PER_PAGE: usize = 20;

type Reply = Result<ApiResponse, ApiResponse>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

pub struct FakeKeeperApi {
    codec: FakeTokenCodec,
    accounts: DashMap<String, Account>,
    buckets: DashMap<String, Bucket>,
    items: DashMap<(String, String), BucketItem>,
    api_keys: DashMap<String, ApiKey>,
    refresh_jtis: DashMap<String, String>,
    reset_tokens: DashMap<String, String>,
    verification_tokens: DashMap<String, String>,
    access_ttl: Mutex<Duration>,
    refresh_ttl: Duration,
    refresh_delay: Mutex<std::time::Duration>,
    fail_refresh: AtomicBool,
    rotate_refresh: AtomicBool,
    refresh_calls: AtomicU64,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for FakeKeeperApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeKeeperApi {
    pub fn new() -> Self {
        FakeKeeperApi {
            codec: FakeTokenCodec,
            accounts: DashMap::new(),
            buckets: DashMap::new(),
            items: DashMap::new(),
            api_keys: DashMap::new(),
            refresh_jtis: DashMap::new(),
            reset_tokens: DashMap::new(),
            verification_tokens: DashMap::new(),
            access_ttl: Mutex::new(Duration::minutes(15)),
            refresh_ttl: Duration::days(7),
            refresh_delay: Mutex::new(std::time::Duration::ZERO),
            fail_refresh: AtomicBool::new(false),
            rotate_refresh: AtomicBool::new(true),
            refresh_calls: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A fake with the demo account already registered.
    pub fn with_demo_user() -> Self {
        let api = Self::new();
        api.seed_user("Demo", "User", DEMO_EMAIL, DEMO_PASSWORD);
        api
    }

    pub fn seed_user(&self, firstname: &str, lastname: &str, email: &str, password: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: user_id(email),
            firstname: firstname.to_owned(),
            lastname: lastname.to_owned(),
            username: String::new(),
            email: email.to_owned(),
            role: "user".to_owned(),
            email_verified: false,
            registration_provider: "email".to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(
            user.id.clone(),
            Account {
                user: user.clone(),
                password: password.to_owned(),
            },
        );
        self.verification_tokens
            .insert(nanoid::nanoid!(24), user.id.clone());
        user
    }

    pub fn set_access_ttl(&self, ttl: Duration) {
        *self.access_ttl.lock().unwrap_or_else(PoisonError::into_inner) = ttl;
    }

    /// Holds every refresh answer back for `delay`.
    pub fn set_refresh_delay(&self, delay: std::time::Duration) {
        *self.refresh_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Rejects every refresh token with 401 while set.
    pub fn set_fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// When off, refresh answers omit `refresh_token` and the old one stays
    /// valid.
    pub fn set_rotate_refresh(&self, rotate: bool) {
        self.rotate_refresh.store(rotate, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests other than refresh calls, in arrival order.
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != REFRESH_TOKEN_PATH)
            .collect()
    }

    /// A login pair for `email` whose access token lives for `access_ttl`.
    pub fn issue_tokens(&self, email: &str, access_ttl: Duration) -> Option<LoginTokens> {
        let id = user_id(email);
        if !self.accounts.contains_key(&id) {
            return None;
        }
        self.issue_pair(&id, access_ttl).ok().map(|(tokens, _)| tokens)
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.accounts.get(&user_id(email)).map(|a| a.user.clone())
    }

    pub fn reset_token_for(&self, email: &str) -> Option<String> {
        token_for(&self.reset_tokens, &user_id(email))
    }

    pub fn verification_token_for(&self, email: &str) -> Option<String> {
        token_for(&self.verification_tokens, &user_id(email))
    }

    fn issue_pair(&self, user_id: &str, access_ttl: Duration) -> Result<(LoginTokens, String), ApiResponse> {
        let (access, _, _) = self
            .codec
            .issue(user_id, TokenKind::Access, access_ttl)
            .map_err(internal)?;
        let (refresh, jti, _) = self
            .codec
            .issue(user_id, TokenKind::Refresh, self.refresh_ttl)
            .map_err(internal)?;
        self.refresh_jtis.insert(jti.clone(), user_id.to_owned());
        Ok((
            LoginTokens {
                access_token: AccessToken::new(access),
                refresh_token: RefreshToken::new(refresh),
            },
            jti,
        ))
    }

    fn access_ttl(&self) -> Duration {
        *self.access_ttl.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, request: &ApiRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: request.method.clone(),
                path: request.path.clone(),
                authorization: request.authorization().map(str::to_owned),
            });
    }

    /// The account behind the bearer credential: an access token or a live
    /// API key.
    fn authenticate(&self, request: &ApiRequest) -> Result<User, ApiResponse> {
        let bearer = request
            .authorization()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let user_id = match self.codec.verify(bearer, TokenKind::Access) {
            Ok(claims) => claims.sub,
            Err(_) => self
                .api_keys
                .iter()
                .find(|k| k.key == bearer && !k.revoked && k.expires_at > Utc::now())
                .map(|k| k.user_id.clone())
                .ok_or_else(unauthorized)?,
        };
        self.accounts
            .get(&user_id)
            .map(|a| a.user.clone())
            .ok_or_else(unauthorized)
    }

    async fn refresh(&self, request: &ApiRequest) -> Reply {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let presented = request
            .headers
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if presented.split('.').count() != 3 {
            return Err(respond(401, &json!({"message": "invalid refresh token structure"})));
        }
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(respond(401, &json!({"message": "refresh token revoked"})));
        }
        let claims = self
            .codec
            .verify(presented, TokenKind::Refresh)
            .map_err(|e| respond(401, &json!({"message": e.to_string()})))?;

        let rotate = self.rotate_refresh.load(Ordering::SeqCst);
        let known = if rotate {
            self.refresh_jtis.remove(&claims.jti).is_some()
        } else {
            self.refresh_jtis.contains_key(&claims.jti)
        };
        if !known {
            return Err(respond(401, &json!({"message": "refresh token already used"})));
        }

        let tokens = if rotate {
            let (pair, _) = self.issue_pair(&claims.sub, self.access_ttl())?;
            RefreshedTokens {
                access_token: pair.access_token,
                refresh_token: Some(pair.refresh_token),
            }
        } else {
            let (access, _, _) = self
                .codec
                .issue(&claims.sub, TokenKind::Access, self.access_ttl())
                .map_err(internal)?;
            RefreshedTokens {
                access_token: AccessToken::new(access),
                refresh_token: None,
            }
        };
        Ok(success(200, "Successfully refreshed token!", Some(tokens)))
    }

    fn route(&self, request: &ApiRequest) -> Reply {
        let decoded: Vec<String> = request
            .path
            .trim_matches('/')
            .split('/')
            .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_owned(), |d| d.into_owned()))
            .collect();
        let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();
        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "register"]) => self.register(request),
            ("POST", ["auth", "login"]) => self.login(request),
            ("GET", ["auth", "user"]) => {
                let user = self.authenticate(request)?;
                Ok(success(200, "Successfully fetched authenticated user.", Some(user)))
            }
            ("POST", ["auth", "forgot-password"]) => self.forgot_password(request),
            ("POST", ["auth", "reset-password"]) => self.reset_password(request),

            ("PUT", ["user"]) => self.update_user(request),
            ("PUT", ["user", "password"]) => self.update_password(request),
            ("DELETE", ["user"]) => self.delete_user(request),
            ("POST", ["user", "verify-email"]) => self.verify_email(request),

            ("POST", ["bucket"]) => self.create_bucket(request),
            ("GET", ["bucket", uid]) => self.find_bucket(request, uid),
            ("PUT", ["bucket", uid]) => self.update_bucket(request, uid),
            ("DELETE", ["bucket", uid]) => self.delete_bucket(request, uid),
            ("GET", ["buckets"]) => self.list_buckets(request),

            ("POST", ["item", uid]) => self.create_item(request, uid),
            ("GET", ["items", uid]) => self.list_items(request, uid),
            ("GET", ["item", uid, key]) => self.find_item(request, uid, key),
            ("PUT", ["item", uid, key]) => self.update_item(request, uid, key),
            ("DELETE", ["item", uid, key]) => self.delete_item(request, uid, key),

            ("POST", ["api_key"]) => self.create_api_key(request),
            ("GET", ["api_keys"]) => self.list_api_keys(request),
            ("PUT", ["api_keys", "revoke"]) => self.revoke_api_keys(request),
            ("DELETE", ["api_keys"]) => self.delete_api_keys(request),
            ("GET", ["api_key", id]) => self.find_api_key(request, id),
            ("PUT", ["api_key", id]) => self.update_api_key(request, id),
            ("PUT", ["api_key", id, "revoke"]) => self.revoke_api_key(request, id),
            ("DELETE", ["api_key", id]) => self.delete_api_key(request, id),

            ("GET", ["public", "apikey-permissions"]) => Ok(success(
                200,
                "Successfully fetched api key permissions",
                Some(ApiKeyPermission::ALL),
            )),
            ("GET", ["public", "bucket-permissions"]) => Ok(success(
                200,
                "Successfully fetched bucket permissions",
                Some(BucketPermission::ALL),
            )),

            _ => Err(respond(404, &json!({"message": "Not Found"}))),
        }
    }

    fn register(&self, request: &ApiRequest) -> Reply {
        let input: RegisterInput = body(request)?;
        if input.email.trim().is_empty() {
            return Err(failure(400, "This field is required"));
        }
        if input.firstname.chars().count() < 2 {
            return Err(failure(400, "Value must be at least 2 characters"));
        }
        if input.password.chars().count() < 8 {
            return Err(failure(400, "password must be at least 8 characters"));
        }
        if self.accounts.contains_key(&user_id(&input.email)) {
            return Err(failure(400, "user already exists"));
        }
        let user = self.seed_user(&input.firstname, &input.lastname, &input.email, &input.password);
        if let Some(username) = input.username {
            if let Some(mut account) = self.accounts.get_mut(&user.id) {
                account.user.username = username;
            }
        }
        Ok(success::<()>(201, "Successfully registered user!", None))
    }

    fn login(&self, request: &ApiRequest) -> Reply {
        let input: LoginInput = body(request)?;
        let id = user_id(&input.email);
        let matches = self
            .accounts
            .get(&id)
            .is_some_and(|a| a.password == input.password);
        if !matches {
            return Err(failure(400, "invalid email or password"));
        }
        let (tokens, _) = self.issue_pair(&id, self.access_ttl())?;
        Ok(success(200, "Successfully logged in user!", Some(tokens)))
    }

    fn forgot_password(&self, request: &ApiRequest) -> Reply {
        let input: ForgotPasswordInput = body(request)?;
        let id = user_id(&input.email);
        if !self.accounts.contains_key(&id) {
            return Err(failure(400, "user not found"));
        }
        self.reset_tokens.insert(nanoid::nanoid!(24), id);
        Ok(success::<()>(200, "Successfully sent reset password link!", None))
    }

    fn reset_password(&self, request: &ApiRequest) -> Reply {
        let input: ResetPasswordInput = body(request)?;
        let (_, id) = self
            .reset_tokens
            .remove(&input.token)
            .ok_or_else(|| failure(400, "invalid or expired reset token"))?;
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| failure(400, "user not found"))?;
        account.password = input.new_password;
        Ok(success::<()>(200, "Successfully reset password!", None))
    }

    fn update_user(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: UpdateUserInput = body(request)?;
        if let Some(mut account) = self.accounts.get_mut(&user.id) {
            let u = &mut account.user;
            if let Some(firstname) = input.firstname {
                u.firstname = firstname;
            }
            if let Some(lastname) = input.lastname {
                u.lastname = lastname;
            }
            if let Some(username) = input.username {
                u.username = username;
            }
            if let Some(email) = input.email {
                u.email = email;
            }
            u.updated_at = Utc::now();
        }
        Ok(success::<()>(200, "Successfully updated user!", None))
    }

    fn update_password(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: UpdatePasswordInput = body(request)?;
        if input.password.chars().count() < 8 {
            return Err(failure(400, "password must be at least 8 characters"));
        }
        if let Some(mut account) = self.accounts.get_mut(&user.id) {
            account.password = input.password;
        }
        Ok(success::<()>(200, "Successfully updated user password!", None))
    }

    fn delete_user(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        self.accounts.remove(&user.id);
        self.buckets.retain(|_, b| b.user_id != user.id);
        self.items.retain(|_, i| i.user_id != user.id);
        self.api_keys.retain(|_, k| k.user_id != user.id);
        self.refresh_jtis.retain(|_, owner| *owner != user.id);
        Ok(success::<()>(200, "Successfully deleted user!", None))
    }

    fn verify_email(&self, request: &ApiRequest) -> Reply {
        let input: VerifyEmailInput = body(request)?;
        let (_, id) = self
            .verification_tokens
            .remove(&input.token)
            .ok_or_else(|| failure(400, "invalid verification token"))?;
        if let Some(mut account) = self.accounts.get_mut(&id) {
            account.user.email_verified = true;
        }
        Ok(success::<()>(200, "Email verification successful!", None))
    }

    fn owned_bucket(&self, user: &User, uid: &str) -> Result<Bucket, ApiResponse> {
        self.buckets
            .get(uid)
            .filter(|b| b.user_id == user.id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| failure(404, "bucket not found"))
    }

    fn details(&self, bucket: Bucket) -> BucketDetails {
        let mut bucket_items = self.live_items(&bucket.uid);
        bucket_items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        BucketDetails {
            bucket,
            bucket_items,
        }
    }

    fn live_items(&self, uid: &str) -> Vec<BucketItem> {
        let now = Utc::now();
        self.items
            .iter()
            .filter(|i| i.bucket_uid == uid)
            .filter(|i| i.ttl <= 0 || i.created_at + Duration::seconds(i.ttl) > now)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn create_bucket(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: CreateBucketInput = body(request)?;
        if input.name.chars().count() < 2 {
            return Err(failure(400, "Value must be at least 2 characters"));
        }
        let now = Utc::now();
        let bucket = Bucket {
            id: uuid::Uuid::new_v4().to_string(),
            uid: nanoid::nanoid!(12),
            user_id: user.id,
            name: input.name,
            description: input.description.unwrap_or_default(),
            permissions: input.permissions,
            created_at: now,
            updated_at: now,
        };
        self.buckets.insert(bucket.uid.clone(), bucket.clone());
        if query_flag(request, "full") {
            Ok(success(201, "Successfully created a new bucket!", Some(bucket)))
        } else {
            Ok(respond(201, &bucket.uid))
        }
    }

    fn find_bucket(&self, request: &ApiRequest, uid: &str) -> Reply {
        let user = self.authenticate(request)?;
        let bucket = self.owned_bucket(&user, uid)?;
        Ok(success(200, "Successfully fetched bucket!", Some(self.details(bucket))))
    }

    fn update_bucket(&self, request: &ApiRequest, uid: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        let input: CreateBucketInput = body(request)?;
        if let Some(mut bucket) = self.buckets.get_mut(uid) {
            bucket.name = input.name;
            if let Some(description) = input.description {
                bucket.description = description;
            }
            bucket.permissions = input.permissions;
            bucket.updated_at = Utc::now();
        }
        Ok(success::<()>(200, "Successfully updated bucket!", None))
    }

    fn delete_bucket(&self, request: &ApiRequest, uid: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        self.buckets.remove(uid);
        self.items.retain(|_, i| i.bucket_uid != uid);
        Ok(success::<()>(200, "Successfully deleted bucket!", None))
    }

    fn list_buckets(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let mut buckets: Vec<Bucket> = self
            .buckets
            .iter()
            .filter(|b| b.user_id == user.id)
            .map(|entry| entry.value().clone())
            .collect();
        buckets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let details: Vec<BucketDetails> = buckets.into_iter().map(|b| self.details(b)).collect();
        let message = format!("Successfully fetched {} buckets!", details.len());
        Ok(success(200, &message, Some(details)))
    }

    fn create_item(&self, request: &ApiRequest, uid: &str) -> Reply {
        let user = self.authenticate(request)?;
        let bucket = self.owned_bucket(&user, uid)?;
        let input: BucketItemInput = body(request)?;
        if input.key.is_empty() {
            return Err(failure(400, "This field is required"));
        }
        let slot = (uid.to_owned(), input.key.clone());
        if self.items.contains_key(&slot) {
            return Err(failure(400, "item with this key already exists"));
        }
        let now = Utc::now();
        let item = BucketItem {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id,
            bucket_id: bucket.id,
            bucket_uid: uid.to_owned(),
            key: input.key,
            data: input.data,
            ttl: input.ttl,
            created_at: now,
            updated_at: now,
        };
        self.items.insert(slot, item.clone());
        let message = format!("Successfully created '{}' in bucket '{uid}'", item.key);
        if query_flag(request, "full") {
            Ok(success(201, &message, Some(item)))
        } else {
            Ok(respond(201, &message))
        }
    }

    fn list_items(&self, request: &ApiRequest, uid: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        let page = query_number(request, "page").unwrap_or(1).max(1);
        let per_page = query_number(request, "perPage")
            .unwrap_or(DEFAULT_PER_PAGE)
            .max(1);

        let mut items = self.live_items(uid);
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page);
        let data: Vec<BucketItem> = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        let page_info = PageInfo {
            total_items: total_items as u64,
            total_pages: total_pages as u64,
            has_next_page: page < total_pages,
            current_page: page as u64,
        };
        Ok(respond(
            200,
            &json!({
                "status": true,
                "message": "Successfully fetched bucket items!",
                "data": data,
                "page_info": page_info,
            }),
        ))
    }

    fn live_item(&self, uid: &str, key: &str) -> Result<BucketItem, ApiResponse> {
        self.live_items(uid)
            .into_iter()
            .find(|i| i.key == key)
            .ok_or_else(|| failure(404, "item not found"))
    }

    fn find_item(&self, request: &ApiRequest, uid: &str, key: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        let item = self.live_item(uid, key)?;
        Ok(success(200, &format!("Successfully fetched '{key}'!"), Some(item)))
    }

    fn update_item(&self, request: &ApiRequest, uid: &str, key: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        self.live_item(uid, key)?;
        let input: BucketItemInput = body(request)?;
        let slot = (uid.to_owned(), key.to_owned());
        if let Some(mut item) = self.items.get_mut(&slot) {
            item.data = input.data;
            item.ttl = input.ttl;
            item.updated_at = Utc::now();
        }
        Ok(success::<()>(200, &format!("Successfully updated '{key}'!"), None))
    }

    fn delete_item(&self, request: &ApiRequest, uid: &str, key: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_bucket(&user, uid)?;
        self.items
            .remove(&(uid.to_owned(), key.to_owned()))
            .ok_or_else(|| failure(404, "item not found"))?;
        Ok(success::<()>(200, &format!("Successfully deleted '{key}'"), None))
    }

    fn owned_key(&self, user: &User, id: &str) -> Result<ApiKey, ApiResponse> {
        self.api_keys
            .get(id)
            .filter(|k| k.user_id == user.id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| failure(404, "api key not found"))
    }

    fn create_api_key(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: ApiKeyInput = body(request)?;
        if input.name.is_empty() {
            return Err(failure(400, "This field is required"));
        }
        let now = Utc::now();
        let key = ApiKey {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id,
            name: input.name,
            revoked: false,
            key: format!("kp_{}", nanoid::nanoid!(32)),
            key_type: input.key_type.unwrap_or_default(),
            role: input.role.unwrap_or_else(|| "user".to_owned()),
            permissions: input.permissions,
            expires_at: input.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.api_keys.insert(key.id.clone(), key.clone());
        let created = CreatedApiKey {
            id: key.id,
            name: key.name,
            key: key.key,
            permissions: key.permissions,
            expires_at: key.expires_at,
            created_at: key.created_at,
        };
        Ok(success(201, "Successfully created a new API Key!", Some(created)))
    }

    fn find_api_key(&self, request: &ApiRequest, id: &str) -> Reply {
        let user = self.authenticate(request)?;
        let key = self.owned_key(&user, id)?;
        Ok(success(200, "Successfully found API Key!", Some(key)))
    }

    fn list_api_keys(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let mut keys: Vec<ApiKey> = self
            .api_keys
            .iter()
            .filter(|k| k.user_id == user.id)
            .map(|entry| entry.value().clone())
            .collect();
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(success(200, "Successfully fetched user's API Keys!", Some(keys)))
    }

    fn update_api_key(&self, request: &ApiRequest, id: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_key(&user, id)?;
        let input: ApiKeyInput = body(request)?;
        if let Some(mut key) = self.api_keys.get_mut(id) {
            key.name = input.name;
            if let Some(key_type) = input.key_type {
                key.key_type = key_type;
            }
            if let Some(role) = input.role {
                key.role = role;
            }
            key.permissions = input.permissions;
            key.expires_at = input.expires_at;
            key.updated_at = Utc::now();
        }
        Ok(success::<()>(200, "Successfully updated API key!", None))
    }

    fn revoke_api_key(&self, request: &ApiRequest, id: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_key(&user, id)?;
        if let Some(mut key) = self.api_keys.get_mut(id) {
            key.revoked = true;
        }
        Ok(success::<()>(200, "Successfully revoked API key!", None))
    }

    fn delete_api_key(&self, request: &ApiRequest, id: &str) -> Reply {
        let user = self.authenticate(request)?;
        self.owned_key(&user, id)?;
        self.api_keys.remove(id);
        Ok(success::<()>(200, "Successfully deleted API key!", None))
    }

    fn revoke_api_keys(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: ApiKeyIds = body(request)?;
        if input.ids.is_empty() {
            return Err(failure(400, "Value must contain at least 1 item"));
        }
        for id in &input.ids {
            if let Some(mut key) = self.api_keys.get_mut(id) {
                if key.user_id == user.id {
                    key.revoked = true;
                }
            }
        }
        Ok(success::<()>(200, "Successfully revoked API Key(s)!", None))
    }

    fn delete_api_keys(&self, request: &ApiRequest) -> Reply {
        let user = self.authenticate(request)?;
        let input: ApiKeyIds = body(request)?;
        if input.ids.is_empty() {
            return Err(failure(400, "Value must contain at least 1 item"));
        }
        self.api_keys
            .retain(|id, k| !(k.user_id == user.id && input.ids.contains(id)));
        Ok(success::<()>(200, "Successfully deleted API Key(s)!", None))
    }
}

#[async_trait::async_trait]
impl HttpTransport for FakeKeeperApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.record(&request);
        let reply = if request.method == Method::POST && request.path == REFRESH_TOKEN_PATH {
            self.refresh(&request).await
        } else {
            self.route(&request)
        };
        let response = reply.unwrap_or_else(|e| e);
        debug!(method = %request.method, path = %request.path, status = response.status, "fake api answered");
        Ok(response)
    }
}

fn user_id(email: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.to_lowercase().as_bytes()).to_string()
}

fn token_for(tokens: &DashMap<String, String>, user_id: &str) -> Option<String> {
    tokens
        .iter()
        .find(|entry| entry.value() == user_id)
        .map(|entry| entry.key().clone())
}

fn body<T: DeserializeOwned>(request: &ApiRequest) -> Result<T, ApiResponse> {
    let value = request.body.clone().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| failure(400, &e.to_string()))
}

fn query_value<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn query_flag(request: &ApiRequest, name: &str) -> bool {
    query_value(request, name).is_some_and(|v| v == "true" || v == "1")
}

fn query_number(request: &ApiRequest, name: &str) -> Option<usize> {
    query_value(request, name).and_then(|v| v.parse().ok())
}

fn respond<T: Serialize + ?Sized>(status: u16, body: &T) -> ApiResponse {
    ApiResponse::new(status, serde_json::to_vec(body).unwrap_or_default())
}

fn success<T: Serialize>(status: u16, message: &str, data: Option<T>) -> ApiResponse {
    match data {
        Some(data) => respond(status, &json!({"status": true, "message": message, "data": data})),
        None => respond(status, &json!({"status": true, "message": message})),
    }
}

fn failure(status: u16, error: &str) -> ApiResponse {
    respond(status, &json!({"status": false, "error": error}))
}

fn unauthorized() -> ApiResponse {
    respond(401, &json!({"message": "Unauthorized"}))
}

fn internal(err: impl std::fmt::Display) -> ApiResponse {
    failure(500, &err.to_string())
}
