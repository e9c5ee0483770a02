use super::Parser;
use crate::domain_model::{ApiKeyPermission, BucketPermission};
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "keeper", version, about = "Command-line client for the Keeper bucket storage API")]
pub struct Cli {
    #[arg(long, env = "KEEPER_SETTINGS")]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the issued tokens.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "KEEPER_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long, env = "KEEPER_PASSWORD")]
        password: String,
    },
    /// Forget both stored tokens.
    Logout,
    /// Show the signed-in user.
    Whoami,
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },
    VerifyEmail {
        #[arg(long)]
        token: String,
    },
    #[command(subcommand)]
    Bucket(BucketCommand),
    #[command(subcommand)]
    Item(ItemCommand),
    #[command(subcommand)]
    Key(KeyCommand),
    #[command(subcommand)]
    User(UserCommand),
    /// List the permission vocabularies accepted by the server.
    Permissions,
    /// Run the route guard for a location and print where it ends up.
    Navigate { path: String },
}

#[derive(Subcommand, Debug)]
pub enum BucketCommand {
    List,
    Show {
        uid: String,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "permission")]
        permissions: Vec<BucketPermission>,
    },
    Update {
        uid: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "permission")]
        permissions: Vec<BucketPermission>,
    },
    Delete {
        uid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    List {
        bucket_uid: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    Get {
        bucket_uid: String,
        key: String,
    },
    /// Create the item, or replace its data if the key exists.
    Put {
        bucket_uid: String,
        key: String,
        /// A JSON value; anything that does not parse is stored as a string.
        data: String,
        /// Seconds until the item expires, 0 for never.
        #[arg(long, default_value_t = 0)]
        ttl: i64,
    },
    Delete {
        bucket_uid: String,
        key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(long = "permission")]
        permissions: Vec<ApiKeyPermission>,
        #[arg(long, default_value_t = 30)]
        expires_in_days: i64,
    },
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long = "permission")]
        permissions: Vec<ApiKeyPermission>,
        #[arg(long, default_value_t = 30)]
        expires_in_days: i64,
    },
    Revoke {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Update {
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Password {
        #[arg(long, env = "KEEPER_NEW_PASSWORD")]
        password: String,
    },
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_permissions() {
        let cli = Cli::try_parse_from([
            "keeper",
            "bucket",
            "create",
            "photos",
            "--permission",
            "public:read",
            "--permission",
            "public:read:item",
        ])
        .unwrap();
        match cli.command {
            Command::Bucket(BucketCommand::Create { permissions, .. }) => assert_eq!(
                permissions,
                vec![BucketPermission::PublicRead, BucketPermission::PublicReadItem]
            ),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_permission() {
        let parsed = Cli::try_parse_from(["keeper", "key", "create", "ci", "--permission", "root"]);
        assert!(parsed.is_err());
    }
}
