use anyhow::Result;
use clap::{Parser, Subcommand};
use murmur_backend::accounts::AccountService;
use murmur_backend::api;
use murmur_backend::config::MurmurConfig;
use murmur_backend::database::Database;
use murmur_backend::groups::{CreateGroupInput, GroupService};
use murmur_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Murmur blogging backend and admin CLI")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Register an account without going through the HTTP form
    CreateUser { username: String, password: String },
    /// Create a topical group; groups are admin-managed
    CreateGroup {
        title: String,
        slug: String,
        #[arg(default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = MurmurConfig::from_env()?;
    let database = Database::connect(&config.paths)?;
    database.ensure_migrations()?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, database).await,
        Command::CreateUser { username, password } => {
            let user = AccountService::new(database).signup(&username, &password)?;
            println!("created user {} ({})", user.username, user.id);
            Ok(())
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = GroupService::new(database).create_group(CreateGroupInput {
                title,
                slug,
                description,
            })?;
            println!("created group {} at /group/{}/", group.title, group.slug);
            Ok(())
        }
    }
}
