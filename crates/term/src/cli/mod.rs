//! CLI schema for the quorum binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quorum_config::LogLevel;
use quorum_primitives::WidgetDraft;
use tracing::Level;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "quorum")]
#[command(about = "Shared widget dashboard client")]
#[command(version)]
pub struct Cli {
	/// Configuration file (defaults to the platform config directory)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

impl Cli {
	/// Log level: `--verbose` wins over the configured level.
	pub fn log_level(&self, configured: LogLevel) -> Level {
		if self.verbose {
			return Level::DEBUG;
		}
		match configured {
			LogLevel::Error => Level::ERROR,
			LogLevel::Warn => Level::WARN,
			LogLevel::Info => Level::INFO,
			LogLevel::Debug => Level::DEBUG,
			LogLevel::Trace => Level::TRACE,
		}
	}
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Log in and store the session credential
	Login(Account),
	/// Create an account (does not log in)
	Register(Account),
	/// Discard the stored credential
	Logout,
	/// Show the account behind the stored credential
	Whoami,
	/// List widgets
	List,
	/// Create a widget
	Create(WidgetFields),
	/// Update a widget; omitted fields keep their current value
	Update {
		/// Widget identity.
		id: String,
		/// Fields to change.
		#[command(flatten)]
		fields: WidgetFields,
	},
	/// Delete a widget
	Delete {
		/// Widget identity.
		id: String,
	},
}

impl Command {
	/// Returns true for commands that act on the widget collection and so
	/// require a credential.
	pub fn needs_session(&self) -> bool {
		matches!(
			self,
			Self::List | Self::Create(_) | Self::Update { .. } | Self::Delete { .. }
		)
	}
}

/// Email/password pair.
#[derive(Args, Debug, Clone)]
pub struct Account {
	/// Account email
	pub email: String,

	/// Account password
	#[arg(long, env = "QUORUM_PASSWORD", hide_env_values = true)]
	pub password: String,
}

/// Widget fields given on the command line.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetFields {
	/// Display title
	#[arg(long)]
	pub title: Option<String>,

	/// Free text description
	#[arg(long)]
	pub description: Option<String>,

	/// Category tag
	#[arg(long = "type", value_name = "TYPE")]
	pub kind: Option<String>,
}

impl WidgetFields {
	/// Overlays the given fields on `base`.
	pub fn merge_into(&self, mut base: WidgetDraft) -> WidgetDraft {
		if let Some(title) = &self.title {
			base.title = title.clone();
		}
		if let Some(description) = &self.description {
			base.description = description.clone();
		}
		if let Some(kind) = &self.kind {
			base.kind = kind.clone();
		}
		base
	}
}
