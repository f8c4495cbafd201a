use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use admin_console::config::ConfigError;
use admin_console::current_user::CurrentUserProfile;
use admin_console::endpoints::Collection;
use admin_console::navigation::{MenuEntry, Navigator, Redirect, Route};
use admin_console::pagination::FetchedCollection;
use admin_console::store::FileStorage;
use admin_console::users::{NewUser, UserRecord, UserUpdate, row_actions};
use admin_console::{Console, ConsoleConfig, ConsoleError, Session, TokenStore};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Console(#[from] ConsoleError),
    /// A console error whose navigation has already been performed.
    #[error("{0}")]
    Reported(ConsoleError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("not allowed to open {0}")]
    Refused(&'static str),
    #[error("unknown route `{0}`")]
    UnknownRoute(String),
    #[error("no user with id {0}")]
    UnknownUser(String),
    #[error("password read failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "admin-console", about = "Admin console for the management API")]
struct Cli {
    /// Overrides `ADMIN_API_BASE_URL` from the environment or `.env`.
    #[arg(long)]
    base_url: Option<String>,

    /// Where the session token is persisted between runs.
    #[arg(long, env = "ADMIN_STATE_FILE", default_value = ".admin-console.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// Enter a route (`/`, `/home`, `/users`) through its gates.
    Open {
        path: String,
    },
    Menu,
    Users(UsersCommand),
    Inventory(InventoryCommand),
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Create {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        admin: Option<bool>,
    },
    ToggleAdmin {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct InventoryCommand {
    #[command(subcommand)]
    command: InventorySubcommand,
}

#[derive(Subcommand, Debug)]
enum InventorySubcommand {
    List {
        collection: CollectionArg,
        /// Devices only.
        #[arg(long)]
        monitoring: Option<bool>,
    },
    Count {
        collection: CollectionArg,
        /// Devices only.
        #[arg(long)]
        monitoring: Option<bool>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollectionArg {
    Devices,
    Circuits,
    Clients,
    Services,
}

impl From<CollectionArg> for Collection {
    fn from(value: CollectionArg) -> Self {
        match value {
            CollectionArg::Devices => Self::Devices,
            CollectionArg::Circuits => Self::Circuits,
            CollectionArg::Clients => Self::Clients,
            CollectionArg::Services => Self::Services,
        }
    }
}

/// Terminal stand-in for browser navigation: announce where the user ends up.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, redirect: &Redirect) {
        match &redirect.message {
            Some(message) => eprintln!("-> {} ({message})", redirect.to.path()),
            None => eprintln!("-> {}", redirect.to.path()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let cli = Cli::parse();
    let mut config = ConsoleConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
        config = config.validated()?;
    }

    let storage = FileStorage::new(cli.state_file);
    tracing::debug!(state_file = %storage.path().display(), "session state");
    let store = TokenStore::new(Arc::new(storage));
    let session = Session::new(&config, store)?;
    let console = Console::new(session, Arc::new(TerminalNavigator));

    if let Err(e) = run(&console, cli.command).await {
        let message = match &e {
            CliError::Console(inner) => console.handle_error(inner),
            CliError::Reported(inner) => inner.display_message(),
            other => Some(other.to_string()),
        };
        if let Some(message) = message {
            eprintln!("error: {message}");
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(console: &Console, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let profile = console.login(&username, &password).await.map_err(CliError::Reported)?;
            print_profile(console, profile.as_ref())
        }
        Command::Logout => {
            console.logout();
            Ok(())
        }
        Command::Whoami => {
            require(console, Route::Home).await?;
            let profile = console.current_user().resolve().await?;
            print_profile(console, profile.as_ref())
        }
        Command::Open { path } => {
            let route = Route::from_path(&path).ok_or(CliError::UnknownRoute(path))?;
            if let Some(entered) = console.enter(route).await {
                println!("{}", entered.path());
            }
            Ok(())
        }
        Command::Menu => {
            require(console, Route::Home).await?;
            console.current_user().resolve().await?;
            print_json(&Value::Array(console.menu().iter().map(menu_json).collect()))
        }
        Command::Users(users) => run_users(console, users).await,
        Command::Inventory(inventory) => run_inventory(console, inventory).await,
    }
}

async fn run_users(console: &Console, users: UsersCommand) -> Result<(), CliError> {
    require(console, Route::Users).await?;
    let current = console.current_user().resolve().await?;

    match users.command {
        UsersSubcommand::List => {
            let listed = console.users().list().await?;
            let rows = listed
                .items
                .iter()
                .map(|user| {
                    let actions = row_actions(user, current.as_ref());
                    json!({
                        "user": user,
                        "is_current_user": actions.is_current_user,
                        "can_delete": actions.can_delete,
                        "can_toggle_admin": actions.can_toggle_admin,
                    })
                })
                .collect();
            warn_if_truncated(&listed);
            print_json(&Value::Array(rows))
        }
        UsersSubcommand::Create { username, email, first_name, last_name, password, admin } => {
            let new_user = NewUser { username, email, first_name, last_name, password, is_admin: admin };
            let created = console.users().create(&new_user).await?;
            print_json(&serde_json::to_value(created)?)
        }
        UsersSubcommand::Update { id, email, first_name, last_name, password, admin } => {
            let existing = find_user(console, &id).await?;
            let update = UserUpdate {
                email: email.or(existing.email).unwrap_or_default(),
                first_name: first_name.or(existing.first_name).unwrap_or_default(),
                last_name: last_name.or(existing.last_name).unwrap_or_default(),
                password,
                is_admin: admin,
            };
            console.users().update(&existing.id, &update).await?;
            println!("updated {}", existing.username);
            Ok(())
        }
        UsersSubcommand::ToggleAdmin { id } => {
            let target = find_user(console, &id).await?;
            console.users().toggle_admin(&target).await?;
            println!("{}: is_admin = {}", target.username, !target.is_admin);
            Ok(())
        }
        UsersSubcommand::Delete { id } => {
            let target = find_user(console, &id).await?;
            console.users().delete(&target, current.as_ref()).await?;
            println!("deleted {}", target.username);
            Ok(())
        }
    }
}

async fn run_inventory(console: &Console, inventory: InventoryCommand) -> Result<(), CliError> {
    require(console, Route::Home).await?;
    let collections = console.inventory();

    match inventory.command {
        InventorySubcommand::List { collection, monitoring } => {
            let fetched = match collection {
                CollectionArg::Devices => collections.devices(monitoring).await?,
                CollectionArg::Circuits => collections.circuits().await?,
                CollectionArg::Clients => collections.clients().await?,
                CollectionArg::Services => collections.services().await?,
            };
            warn_if_truncated(&fetched);
            print_json(&Value::Array(fetched.items))
        }
        InventorySubcommand::Count { collection, monitoring } => {
            let count = match collection {
                CollectionArg::Devices => collections.devices_count(monitoring).await?,
                other => collections.count(other.into()).await?,
            };
            println!("{count}");
            Ok(())
        }
    }
}

async fn require(console: &Console, route: Route) -> Result<(), CliError> {
    console.enter(route).await.map(|_| ()).ok_or(CliError::Refused(route.path()))
}

async fn find_user(console: &Console, id: &str) -> Result<UserRecord, CliError> {
    let listed = console.users().list().await?;
    listed
        .items
        .into_iter()
        .find(|user| user.id.to_string() == id)
        .ok_or_else(|| CliError::UnknownUser(id.to_owned()))
}

fn warn_if_truncated<T>(fetched: &FetchedCollection<T>) {
    if fetched.truncated {
        eprintln!("warning: listing stopped after {} pages; results are incomplete", fetched.pages);
    }
}

fn read_password() -> Result<String, CliError> {
    eprint!("password: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn print_profile(console: &Console, profile: Option<&CurrentUserProfile>) -> Result<(), CliError> {
    print_json(&json!({
        "display_name": console.display_name(),
        "is_admin": console.is_admin(),
        "profile": profile,
    }))
}

fn menu_json(entry: &MenuEntry) -> Value {
    json!({
        "id": entry.id,
        "title": entry.title,
        "path": entry.route.map(Route::path),
        "children": entry.children.iter().map(menu_json).collect::<Vec<_>>(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
