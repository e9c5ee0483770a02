use chrono::{Duration, Utc};
use keeper_client::application_port::ApiError;
use keeper_client::client::{ConsoleNotifier, KeeperClient};
use keeper_client::domain_model::*;
use keeper_client::logger::*;
use keeper_client::settings::*;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let client = KeeperClient::try_new(&project_settings, Arc::new(ConsoleNotifier))?;
    run(&client, cli.command).await
}

async fn run(client: &KeeperClient, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Login { email, password } => {
            Ok(done(client.users.login(LoginInput { email, password }).await))
        }
        Command::Register {
            firstname,
            lastname,
            username,
            email,
            password,
        } => {
            let input = RegisterInput {
                firstname,
                lastname,
                username,
                email,
                password,
            };
            Ok(done(client.users.register(input).await))
        }
        Command::Logout => {
            client.users.logout().await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => match client.users.fetch_user().await {
            Some(user) => print_json(&user),
            None => {
                eprintln!("not signed in");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::ForgotPassword { email } => Ok(done(
            client
                .users
                .forgot_password(ForgotPasswordInput { email })
                .await,
        )),
        Command::ResetPassword {
            token,
            new_password,
        } => Ok(done(
            client
                .users
                .reset_password(ResetPasswordInput {
                    token,
                    new_password,
                })
                .await,
        )),
        Command::VerifyEmail { token } => Ok(done(
            client.users.verify_email(VerifyEmailInput { token }).await,
        )),
        Command::Bucket(command) => run_bucket(client, command).await,
        Command::Item(command) => run_item(client, command).await,
        Command::Key(command) => run_key(client, command).await,
        Command::User(command) => run_user(client, command).await,
        Command::Permissions => {
            let api_key = client.public_service.api_key_permissions().await;
            let bucket = client.public_service.bucket_permissions().await;
            match (api_key, bucket) {
                (Ok(api_key), Ok(bucket)) => print_json(&serde_json::json!({
                    "api_key": api_key,
                    "bucket": bucket,
                })),
                (Err(e), _) | (_, Err(e)) => {
                    eprintln!("✘ {}", e.user_message());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Navigate { path } => {
            println!("{}", client.router.push(&path));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_bucket(client: &KeeperClient, command: BucketCommand) -> anyhow::Result<ExitCode> {
    let store = &client.buckets;
    match command {
        BucketCommand::List => match store.fetch_buckets().await {
            Ok(buckets) => print_json(&buckets),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        BucketCommand::Show { uid } => match store.fetch_bucket(&uid).await {
            Ok(bucket) => print_json(&bucket),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        BucketCommand::Create {
            name,
            description,
            permissions,
        } => {
            let input = CreateBucketInput {
                name,
                description,
                permissions,
            };
            match store.create_bucket(input).await {
                Ok(bucket) => print_json(&bucket.bucket),
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
        BucketCommand::Update {
            uid,
            name,
            description,
            permissions,
        } => {
            let input = CreateBucketInput {
                name,
                description,
                permissions,
            };
            Ok(done(store.update_bucket(&uid, input).await))
        }
        BucketCommand::Delete { uid } => Ok(done(store.delete_bucket(&uid).await)),
    }
}

async fn run_item(client: &KeeperClient, command: ItemCommand) -> anyhow::Result<ExitCode> {
    let store = &client.items;
    match command {
        ItemCommand::List {
            bucket_uid,
            page,
            per_page,
        } => match store
            .fetch_items(&bucket_uid, PageQuery { page, per_page })
            .await
        {
            Ok(listing) => print_json(&listing),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        ItemCommand::Get { bucket_uid, key } => match store.fetch_item(&bucket_uid, &key).await {
            Ok(item) => print_json(&item),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        ItemCommand::Put {
            bucket_uid,
            key,
            data,
            ttl,
        } => {
            let data = serde_json::from_str(&data).unwrap_or(serde_json::Value::String(data));
            let input = BucketItemInput {
                key: key.clone(),
                data,
                ttl,
            };
            let exists = client
                .bucket_item_service
                .find_item(&bucket_uid, &key)
                .await
                .is_ok();
            if exists {
                Ok(done(store.update_item(&bucket_uid, &key, input).await))
            } else {
                Ok(done(store.create_item(&bucket_uid, input).await))
            }
        }
        ItemCommand::Delete { bucket_uid, key } => {
            Ok(done(store.delete_item(&bucket_uid, &key).await))
        }
    }
}

async fn run_key(client: &KeeperClient, command: KeyCommand) -> anyhow::Result<ExitCode> {
    let store = &client.api_keys;
    match command {
        KeyCommand::List => match store.fetch_api_keys().await {
            Ok(keys) => print_json(&keys),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        KeyCommand::Show { id } => match store.fetch_api_key(&id).await {
            Ok(key) => print_json(&key),
            Err(_) => Ok(ExitCode::FAILURE),
        },
        KeyCommand::Create {
            name,
            permissions,
            expires_in_days,
        } => {
            let input = api_key_input(name, permissions, expires_in_days);
            match store.create_api_key(input).await {
                Ok(created) => print_json(&created),
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
        KeyCommand::Update {
            id,
            name,
            permissions,
            expires_in_days,
        } => {
            let input = api_key_input(name, permissions, expires_in_days);
            Ok(done(store.update_api_key(&id, input).await))
        }
        KeyCommand::Revoke { mut ids } => {
            if ids.len() == 1 {
                let id = ids.remove(0);
                Ok(done(store.revoke_api_key(&id).await))
            } else {
                Ok(done(store.revoke_api_keys(ids).await))
            }
        }
        KeyCommand::Delete { mut ids } => {
            if ids.len() == 1 {
                let id = ids.remove(0);
                Ok(done(store.delete_api_key(&id).await))
            } else {
                Ok(done(store.delete_api_keys(ids).await))
            }
        }
    }
}

async fn run_user(client: &KeeperClient, command: UserCommand) -> anyhow::Result<ExitCode> {
    let store = &client.users;
    match command {
        UserCommand::Update {
            firstname,
            lastname,
            username,
            email,
        } => {
            let input = UpdateUserInput {
                firstname,
                lastname,
                username,
                email,
            };
            Ok(done(store.update_user(input).await))
        }
        UserCommand::Password { password } => Ok(done(
            store
                .update_password(UpdatePasswordInput { password })
                .await,
        )),
        UserCommand::Delete => Ok(done(store.delete_user().await)),
    }
}

fn api_key_input(
    name: String,
    permissions: Vec<ApiKeyPermission>,
    expires_in_days: i64,
) -> ApiKeyInput {
    ApiKeyInput {
        name,
        key_type: None,
        role: None,
        permissions,
        expires_at: Utc::now() + Duration::days(expires_in_days),
    }
}

// Stores have already notified the user of any failure.
fn done<T>(result: Result<T, ApiError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}
