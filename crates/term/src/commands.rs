//! Subcommand execution.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use quorum_client::{
	Authenticator, CredentialStore, Credentials, FileCredentialStore, HttpAuthApi, HttpClient,
	HttpWidgetApi,
};
use quorum_config::Config;
use quorum_primitives::{Widget, WidgetDraft, WidgetId};
use quorum_sync::{Route, SyncError, WidgetEngine, route_for};

use crate::cli::{Account, Command};

const LOGIN_HINT: &str = "Not logged in. Run `quorum login <email>` first.";
const EXPIRED_HINT: &str = "Session expired. Run `quorum login <email>` again.";

/// Runs one subcommand against the configured endpoints.
pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
	let http = HttpClient::from_config(config)?;
	let store: Arc<dyn CredentialStore> =
		Arc::new(FileCredentialStore::at_or_default(config.credential_path.as_deref())?);
	let auth = Authenticator::new(Arc::new(HttpAuthApi::new(http.clone())), store);

	if !command.needs_session() {
		return run_account(command, &auth).await;
	}

	let credential = auth.current_credential()?;
	let credential = match (route_for(credential.as_ref()), credential) {
		(Route::Dashboard, Some(credential)) => credential,
		_ => {
			println!("{LOGIN_HINT}");
			return Ok(());
		}
	};

	let engine = WidgetEngine::new(Arc::new(HttpWidgetApi::new(http, credential)));
	match run_widgets(command, &engine).await {
		Err(err) if err.downcast_ref::<SyncError>().is_some_and(SyncError::is_auth) => {
			auth.logout()?;
			println!("{EXPIRED_HINT}");
			Ok(())
		}
		result => result,
	}
}

async fn run_account(command: Command, auth: &Authenticator) -> anyhow::Result<()> {
	match command {
		Command::Login(Account { email, password }) => {
			auth.login(&Credentials::new(&email, password))
				.await
				.context("login failed")?;
			println!("Logged in as {email}");
		}
		Command::Register(Account { email, password }) => {
			auth.register(&Credentials::new(&email, password))
				.await
				.context("registration failed")?;
			println!("Registered {email}. Run `quorum login {email}` to sign in.");
		}
		Command::Logout => {
			auth.logout()?;
			println!("Logged out");
		}
		Command::Whoami => match auth.verify().await? {
			Some(user) => println!(
				"{} ({})",
				user.email.as_deref().unwrap_or("unknown email"),
				user.id.as_deref().unwrap_or("unknown id"),
			),
			None => println!("{LOGIN_HINT}"),
		},
		other => return Err(anyhow!("{other:?} requires a session")),
	}
	Ok(())
}

async fn run_widgets(command: Command, engine: &WidgetEngine) -> anyhow::Result<()> {
	match command {
		Command::List => {
			let widgets = engine.load_all().await?;
			if widgets.is_empty() {
				println!("No widgets");
			}
			for widget in &widgets {
				println!("{}", render_row(widget));
			}
		}
		Command::Create(fields) => {
			let draft = fields.merge_into(WidgetDraft::default());
			let widget = engine.create_or_update(&draft, None).await?;
			println!("Created {}", render_row(&widget));
		}
		Command::Update { id, fields } => {
			let id = WidgetId::new(id);
			engine.load_all().await?;
			let current = engine
				.get(&id)
				.ok_or_else(|| anyhow!("no widget with id {id}"))?;
			let draft = fields.merge_into(current.to_draft());
			let widget = engine.create_or_update(&draft, Some(&id)).await?;
			println!("Updated {}", render_row(&widget));
		}
		Command::Delete { id } => {
			let id = WidgetId::new(id);
			engine.remove(&id).await?;
			println!("Deleted {id}");
		}
		other => return Err(anyhow!("{other:?} does not act on widgets")),
	}
	Ok(())
}

/// One tab-separated line per widget: id, type, title, description.
fn render_row(widget: &Widget) -> String {
	format!(
		"{}\t{}\t{}\t{}",
		widget.id, widget.kind, widget.title, widget.description
	)
}
