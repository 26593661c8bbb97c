//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! shoebox users list --search usa
//! shoebox users create --name "Eve Adams" --email eve@example.com --city Berlin
//! shoebox users update 2 --points 500 --password hunter22
//! shoebox users award 2 --points 50
//! shoebox users delete 4
//! ```

use clap::{Args, Subcommand};
use secrecy::SecretString;
use shoebox_admin::listing::{Page, USERS_PAGE_SIZE, UserFilter};
use shoebox_admin::{DataError, DataLayer};
use shoebox_admin::services::users::DEFAULT_AWARD;
use shoebox_core::{NewUser, Role, UserId, UserPatch};

use crate::output;

#[derive(Subcommand)]
pub enum UserAction {
    /// List users, newest first
    List {
        /// Filter by name, email, city, country or phone
        #[arg(short, long, default_value = "")]
        search: String,

        /// Page number (7 users per page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Create a user
    Create(CreateUser),
    /// Update fields of a user
    Update(UpdateUser),
    /// Add loyalty points to a user
    Award {
        id: String,

        #[arg(short, long, default_value_t = DEFAULT_AWARD)]
        points: u32,
    },
    /// Delete a user
    Delete { id: String },
}

#[derive(Args)]
pub struct CreateUser {
    #[arg(short, long)]
    name: String,
    #[arg(short, long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    phone1: String,
    #[arg(long, default_value = "")]
    phone2: String,
    #[arg(long, default_value = "")]
    pin: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value_t = 0)]
    points: u32,
    /// `admin` or `user`
    #[arg(short, long, default_value = "user")]
    role: Role,
}

#[derive(Args)]
pub struct UpdateUser {
    id: String,
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long)]
    email: Option<String>,
    #[arg(long)]
    phone1: Option<String>,
    #[arg(long)]
    phone2: Option<String>,
    #[arg(long)]
    pin: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    points: Option<u32>,
    #[arg(short, long)]
    role: Option<Role>,
    /// New password, sent to the remote store only
    #[arg(long)]
    password: Option<String>,
}

pub async fn run(layer: &DataLayer, action: UserAction) -> Result<(), DataError> {
    let users = layer.users();
    match action {
        UserAction::List { search, page } => {
            let matching = UserFilter::new(&search).apply(users.list().await?);
            output::users(&Page::of(matching, page, USERS_PAGE_SIZE));
        }
        UserAction::Create(args) => {
            let user = users
                .create(NewUser {
                    email: args.email,
                    name: args.name,
                    phone1: args.phone1,
                    phone2: args.phone2,
                    pin: args.pin,
                    city: args.city,
                    country: args.country,
                    points: args.points,
                    role: args.role,
                })
                .await?;
            output::user(&user);
        }
        UserAction::Update(args) => {
            let id = UserId::new(args.id);
            let patch = UserPatch {
                email: args.email,
                name: args.name,
                phone1: args.phone1,
                phone2: args.phone2,
                pin: args.pin,
                city: args.city,
                country: args.country,
                points: args.points,
                role: args.role,
                password: args.password.map(SecretString::from),
            };
            match users.update(&id, &patch).await? {
                Some(user) => output::user(&user),
                None => output::line(&format!("No user {id}")),
            }
        }
        UserAction::Award { id, points } => {
            let user = users.award_points(&UserId::new(id), points).await?;
            output::line(&format!("{} now has {} points", user.name, user.points));
        }
        UserAction::Delete { id } => {
            let id = UserId::new(id);
            users.delete(&id).await?;
            output::line(&format!("Deleted user {id}"));
        }
    }
    Ok(())
}
