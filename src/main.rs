use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use session_gate::api::HttpAuthApi;
use session_gate::config::GateConfig;
use session_gate::error::{AuthError, ConfigError, ErrorCode, StorageError};
use session_gate::guard::{GuardDecision, RouteGuard};
use session_gate::navigate::{NavigationMode, Navigator};
use session_gate::redirect;
use session_gate::session::SessionStore;
use session_gate::signin::{SignInError, SignInFlow};
use session_gate::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{code}: {source}")]
    Auth { code: &'static str, source: AuthError },
    #[error("{0}")]
    SignIn(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for CliError {
    fn from(source: AuthError) -> Self {
        Self::Auth { code: source.error_code(), source }
    }
}

impl From<SignInError> for CliError {
    fn from(e: SignInError) -> Self {
        Self::SignIn(e.form_message())
    }
}

#[derive(Parser, Debug)]
#[command(name = "session-gate", about = "Marketplace session gate: route checks, sign-in and logout")]
struct Cli {
    /// Backend base URL; overrides `GATE_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Persisted session file; overrides `GATE_STORAGE_PATH`.
    #[arg(long)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the route guard for a location such as `/routes/favorites?page=2`.
    Visit { location: String },
    /// Sign in and follow the redirect target.
    Signin {
        #[arg(long, env = "GATE_USERNAME")]
        username: String,
        #[arg(long, env = "GATE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Sign-in view location or query carrying `redirect=`.
        #[arg(long, default_value = "")]
        from: String,
    },
    /// Log out and clear the persisted session.
    Logout,
    /// Show the current user, verifying it against the backend.
    Whoami,
    /// List protected path patterns.
    Routes,
}

/// Prints navigations instead of performing them.
struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn navigate(&self, target: &str, mode: NavigationMode) {
        println!("navigate ({mode}) -> {target}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = GateConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }

    let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
    let api = Arc::new(HttpAuthApi::new(&config.api_base_url, config.timeouts.request(), config.timeouts.connect())?);
    let session = Arc::new(SessionStore::new(storage, api, config.policy, config.timeouts.request()));
    if let Err(e) = session.bootstrap() {
        tracing::warn!(error = %e, "persisted session unreadable; starting signed out");
    }
    let navigator: Arc<dyn Navigator> = Arc::new(StdoutNavigator);

    match cli.command {
        Command::Visit { location } => run_visit(&config, session, navigator, &location).await,
        Command::Signin { username, password, from } => {
            let flow = SignInFlow::new(session, navigator);
            let query = if from.contains('?') { redirect::query_of(&from) } else { from.as_str() };
            flow.submit(&username, &password, query).await?;
            Ok(())
        }
        Command::Logout => {
            session.logout().await?;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => match session.fetch_user().await? {
            Some(user) => {
                println!("{} <{}> (id {})", user.username, user.email, user.id);
                Ok(())
            }
            None => {
                println!("not signed in");
                Ok(())
            }
        },
        Command::Routes => {
            for pattern in config.protected.patterns() {
                println!("{pattern}");
            }
            Ok(())
        }
    }
}

async fn run_visit(
    config: &GateConfig,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    location: &str,
) -> Result<(), CliError> {
    let guard = RouteGuard::from_config(session, config, navigator);
    guard.mount();
    match guard.check(location).await {
        GuardDecision::Render => println!("allowed: {location}"),
        GuardDecision::Redirect(url) => println!("redirected: {url}"),
        GuardDecision::Retry(message) => return Err(CliError::Unavailable(message)),
        GuardDecision::NotReady | GuardDecision::Superseded => println!("no decision"),
    }
    Ok(())
}
