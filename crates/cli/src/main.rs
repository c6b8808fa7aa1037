//! Paratha CLI - drive the ordering client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in $PARATHA_DATA_DIR/session.json)
//! PARATHA_PASSWORD=secret paratha login -e asha@example.com
//!
//! # Register a business buyer
//! PARATHA_PASSWORD=secret paratha register business -n "Asha" -e asha@example.com \
//!     --phone 9999999999 --business-name "Asha Foods" --gst-number 29ABCDE1234F1Z5
//!
//! # Price a cart; business accounts get bulk quantities and prices
//! paratha quote --item 1:2 --item 3:1
//!
//! # Manage saved addresses
//! paratha addresses add --city Kochi --state KL --zip 682001 --default
//!
//! # Promote a user (admins only)
//! paratha users role 665f1c2e9b1e8a0012a4b001 business
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `register` - Create a customer, business or delivery account
//! - `profile` - Show or update the signed-in user's profile
//! - `password` - Change the account password
//! - `addresses` - List and edit saved addresses
//! - `menu` / `quote` - Browse the catalog and price a cart
//! - `users` - List users, change roles and delete accounts (admins only)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use paratha_client::api::AddressKind;
use paratha_client::{App, ClientConfig};
use paratha_core::Role;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "paratha_client=info,paratha_cli=info";

#[derive(Parser)]
#[command(name = "paratha")]
#[command(author, version, about = "Paratha ordering client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "PARATHA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[command(subcommand)]
        kind: RegisterKind,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or update the profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Change the account password
    Password {
        /// Current password
        #[arg(long, env = "PARATHA_PASSWORD", hide_env_values = true)]
        current: String,

        /// New password
        #[arg(long, env = "PARATHA_NEW_PASSWORD", hide_env_values = true)]
        new: String,
    },
    /// Manage saved addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// List the products on the menu
    Menu,
    /// Price a cart
    Quote {
        /// Cart entry as `PRODUCT_ID:QUANTITY`; repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,
    },
    /// Manage user accounts (admins only)
    Users {
        #[command(subcommand)]
        action: Option<UserAction>,
    },
}

#[derive(Args)]
struct SignupArgs {
    /// Full name
    #[arg(short, long)]
    name: String,

    /// Email address
    #[arg(short, long)]
    email: String,

    /// Password
    #[arg(long, env = "PARATHA_PASSWORD", hide_env_values = true)]
    password: String,

    /// Phone number
    #[arg(long)]
    phone: String,

    /// First delivery address
    #[arg(long, default_value = "")]
    address: String,
}

#[derive(Subcommand)]
enum RegisterKind {
    /// Retail customer
    Customer {
        #[command(flatten)]
        common: SignupArgs,
    },
    /// Business account ordering in bulk
    Business {
        #[command(flatten)]
        common: SignupArgs,

        #[arg(long)]
        business_name: String,

        #[arg(long)]
        gst_number: String,
    },
    /// Delivery partner
    Delivery {
        #[command(flatten)]
        common: SignupArgs,

        #[arg(long)]
        vehicle_type: String,

        #[arg(long)]
        license_number: String,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Fetch the latest profile from the server
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        /// Label (`home`, `work`, `other`)
        #[arg(long, default_value = "home")]
        kind: AddressKind,

        /// Street line
        #[arg(long, default_value = "")]
        street: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        state: String,

        #[arg(long)]
        zip: String,

        /// Make this the default address
        #[arg(long)]
        default: bool,
    },
    /// Delete a saved address
    Remove {
        /// Address ID
        id: String,
    },
    /// Make an address the default
    Default {
        /// Address ID
        id: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List user accounts
    List,
    /// Change a user's role
    Role {
        /// User ID
        id: String,

        /// New role (`customer`, `business`, `delivery`, `admin`)
        role: Role,
    },
    /// Delete a user account
    Remove {
        /// User ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let config = ClientConfig::from_env()?;
    let mut app = App::from_config(config).await?;
    app.start().await?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&app, &email, SecretString::from(password)).await?;
        }
        Commands::Register { kind } => match kind {
            RegisterKind::Customer { common } => {
                commands::session::register_customer(&app, common.into()).await?;
            }
            RegisterKind::Business {
                common,
                business_name,
                gst_number,
            } => {
                commands::session::register_business(&app, common.into(), business_name, gst_number)
                    .await?;
            }
            RegisterKind::Delivery {
                common,
                vehicle_type,
                license_number,
            } => {
                commands::session::register_delivery(
                    &app,
                    common.into(),
                    vehicle_type,
                    license_number,
                )
                .await?;
            }
        },
        Commands::Logout => commands::session::logout(&mut app).await?,
        Commands::Whoami => commands::session::whoami(&app)?,
        Commands::Profile { action } => match action.unwrap_or(ProfileAction::Show) {
            ProfileAction::Show => commands::session::show_profile(&app).await?,
            ProfileAction::Update {
                name,
                phone,
                address,
            } => commands::session::update_profile(&app, name, phone, address).await?,
        },
        Commands::Password { current, new } => {
            commands::session::change_password(
                &app,
                SecretString::from(current),
                SecretString::from(new),
            )
            .await?;
        }
        Commands::Addresses { action } => match action.unwrap_or(AddressAction::List) {
            AddressAction::List => commands::addresses::list(&mut app).await?,
            AddressAction::Add {
                kind,
                street,
                city,
                state,
                zip,
                default,
            } => {
                let draft = paratha_client::AddressDraft {
                    kind,
                    address: street,
                    city,
                    state,
                    zip_code: zip,
                    is_default: default,
                    ..paratha_client::AddressDraft::default()
                };
                commands::addresses::add(&mut app, draft).await?;
            }
            AddressAction::Remove { id } => commands::addresses::remove(&mut app, &id).await?,
            AddressAction::Default { id } => {
                commands::addresses::set_default(&mut app, &id).await?;
            }
        },
        Commands::Menu => commands::cart::menu(&app),
        Commands::Quote { items } => commands::cart::quote(&mut app, &items)?,
        Commands::Users { action } => match action.unwrap_or(UserAction::List) {
            UserAction::List => commands::users::list(&mut app).await?,
            UserAction::Role { id, role } => commands::users::set_role(&mut app, &id, role).await?,
            UserAction::Remove { id } => commands::users::remove(&mut app, &id).await?,
        },
    }
    Ok(())
}

impl From<SignupArgs> for commands::session::Signup {
    fn from(args: SignupArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            password: SecretString::from(args.password),
            phone: args.phone,
            address: args.address,
        }
    }
}
