use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use warden_domain::ResourcePermissions;
use warden_service::{
	AccessCheckRequest, DeleteRequest, ListRequest, SearchRequest, UpdateResourceRequest,
	WardenService,
};

#[derive(Debug, Parser)]
#[command(
	version = warden_cli::VERSION,
	rename_all = "kebab",
	styles = warden_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Index every file in the resources directory.
	Init,
	/// Similarity search restricted to what the principal may read.
	Search {
		query: String,
		#[arg(long, short = 'p')]
		principal: Option<String>,
		#[arg(long, short = 'n')]
		limit: Option<usize>,
		/// `filter_first` or `query_first`.
		#[arg(long, short = 's')]
		strategy: Option<String>,
		#[arg(long)]
		candidate_k: Option<usize>,
	},
	/// Re-read a resource file and rewrite its document.
	Update {
		path: String,
		/// Grants as JSON, for example `{"user1": ["read"]}`.
		#[arg(long, value_name = "JSON")]
		permissions: Option<String>,
		#[arg(long)]
		upsert_if_missing: bool,
	},
	/// Delete documents by id. Unknown ids are ignored.
	Delete {
		#[arg(required = true)]
		ids: Vec<String>,
	},
	/// List stored documents, optionally restricted to the given ids.
	List {
		ids: Vec<String>,
	},
	/// Check whether a principal may perform an action on a resource.
	CanAccess {
		principal: String,
		resource: String,
		#[arg(long, short = 'a')]
		action: Option<String>,
	},
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = warden_config::load(&args.config)?;
	init_tracing(&config)?;
	let service = WardenService::open(config)?;
	let output = execute(&service, args.command)?;

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

pub fn execute(service: &WardenService, command: Command) -> color_eyre::Result<Value> {
	let value = match command {
		Command::Init => serde_json::to_value(service.index_directory()?)?,
		Command::Search { query, principal, limit, strategy, candidate_k } =>
			serde_json::to_value(service.search(SearchRequest {
				query,
				principal,
				limit,
				strategy,
				candidate_k,
			})?)?,
		Command::Update { path, permissions, upsert_if_missing } => {
			let permissions = permissions.as_deref().map(parse_permissions).transpose()?;

			serde_json::to_value(service.update_resource(UpdateResourceRequest {
				path,
				permissions,
				upsert_if_missing,
			})?)?
		},
		Command::Delete { ids } =>
			serde_json::to_value(service.delete_documents(DeleteRequest { ids })?)?,
		Command::List { ids } => {
			let ids = if ids.is_empty() { None } else { Some(ids) };

			serde_json::to_value(service.list_documents(ListRequest { ids })?)?
		},
		Command::CanAccess { principal, resource, action } =>
			serde_json::to_value(service.can_access(AccessCheckRequest {
				principal,
				resource,
				action,
			})?)?,
	};

	Ok(value)
}

fn parse_permissions(raw: &str) -> color_eyre::Result<ResourcePermissions> {
	serde_json::from_str(raw).map_err(|err| {
		eyre::eyre!("permissions must be a JSON object of principal to actions: {err}.")
	})
}

fn init_tracing(config: &warden_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
	Ok(())
}
