use std::{borrow::Cow, net::SocketAddr};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    client::{table, ApiClient},
    database::DatabaseOptions,
    ledger::domain::{
        accounts::{AccountData, AccountId},
        balances::BalanceData,
        reports::SortKey,
    },
    server,
};

mod migrate;

#[derive(Parser)]
#[clap(version, about = "Track account balances over time.")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// DSN to tell Sentry where to send events.
    ///
    /// If provided, errors will be sent to Sentry.
    #[clap(long = "sentry-dsn", env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations.
    Migrate(MigrateOpts),
    /// Run the HTTP API.
    Serve(ServeOpts),
    /// List accounts.
    Accounts(AccountsOpts),
    /// Create an account.
    AddAccount(AddAccountOpts),
    /// Replace an account's details.
    UpdateAccount(UpdateAccountOpts),
    /// Delete an account. Its balances remain queryable.
    DeleteAccount(DeleteAccountOpts),
    /// Record a balance against an account.
    AddBalance(AddBalanceOpts),
    /// Show the balance history of an account.
    Balances(BalancesOpts),
    /// Show the balance of every open account at an instant.
    Report(ReportOpts),
}

#[derive(Args)]
struct DatabaseArgs {
    /// The number of connections to use for the database pool.
    #[clap(long = "database-pool-size", default_value = "16")]
    database_pool_size: u32,

    /// The number of seconds before a database connection times out.
    #[clap(long = "database-timeout", default_value = "5")]
    database_timeout: u8,

    /// Connection string for the application database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,
}

impl From<&DatabaseArgs> for DatabaseOptions {
    fn from(args: &DatabaseArgs) -> Self {
        Self {
            url: args.database_url.clone(),
            pool_size: args.database_pool_size,
            timeout_seconds: args.database_timeout,
        }
    }
}

#[derive(Args)]
struct MigrateOpts {
    /// Connection string for the database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,

    /// The number of seconds before the database connection times out.
    #[clap(long = "database-timeout", default_value = "5")]
    database_timeout: u8,
}

impl From<MigrateOpts> for migrate::MigrationOpts {
    fn from(opts: MigrateOpts) -> Self {
        Self {
            database: DatabaseOptions {
                url: opts.database_url,
                pool_size: 1,
                timeout_seconds: opts.database_timeout,
            },
        }
    }
}

#[derive(Args)]
struct ServeOpts {
    #[clap(flatten)]
    database: DatabaseArgs,

    /// Address to listen for HTTP requests on.
    #[clap(long = "bind-address", env = "BIND_ADDRESS", default_value = "0.0.0.0:8000")]
    bind_address: SocketAddr,
}

impl From<ServeOpts> for server::Options {
    fn from(opts: ServeOpts) -> Self {
        Self {
            database: (&opts.database).into(),
            bind_address: opts.bind_address,
        }
    }
}

#[derive(Args)]
struct ServerArgs {
    /// Base URL of the balance book API.
    #[clap(
        long = "server-url",
        env = "BALANCE_BOOK_URL",
        default_value = "http://localhost:8000"
    )]
    server_url: String,
}

impl ServerArgs {
    fn client(&self) -> anyhow::Result<ApiClient> {
        ApiClient::new(&self.server_url)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AccountOrder {
    Id,
    Name,
}

#[derive(Args)]
struct AccountsOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// Only list accounts open at this time (RFC 3339).
    #[clap(long = "open-at")]
    open_at: Option<DateTime<Utc>>,

    #[clap(long, value_enum, default_value = "id")]
    sort: AccountOrder,
}

#[derive(Args)]
struct AccountFields {
    /// Display name of the account.
    #[clap(long)]
    name: String,

    /// Three character currency code, for example GBP.
    #[clap(long)]
    currency: String,

    /// Time the account was opened (RFC 3339).
    #[clap(long)]
    opened: DateTime<Utc>,

    /// Time the account was closed (RFC 3339).
    #[clap(long)]
    closed: Option<DateTime<Utc>>,
}

impl From<AccountFields> for AccountData {
    fn from(fields: AccountFields) -> Self {
        Self {
            name: fields.name,
            currency: fields.currency,
            opened: fields.opened,
            closed: fields.closed,
            deleted_at: None,
        }
    }
}

#[derive(Args)]
struct AddAccountOpts {
    #[clap(flatten)]
    server: ServerArgs,

    #[clap(flatten)]
    account: AccountFields,
}

#[derive(Args)]
struct UpdateAccountOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// ID of the account to update.
    account: AccountId,

    #[clap(flatten)]
    fields: AccountFields,
}

#[derive(Args)]
struct DeleteAccountOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// ID of the account to delete.
    account: AccountId,
}

#[derive(Args)]
struct AddBalanceOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// ID of the account the balance belongs to.
    account: AccountId,

    /// Amount in minor units, for example pence.
    #[clap(long, allow_hyphen_values = true)]
    amount: i64,

    /// Time the amount was recorded at (RFC 3339). Defaults to now.
    #[clap(long)]
    date: Option<DateTime<Utc>>,

    /// Currency of the amount. Must match the account's currency.
    #[clap(long)]
    currency: Option<String>,
}

#[derive(Args)]
struct BalancesOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// ID of the account.
    account: AccountId,
}

#[derive(Args)]
struct ReportOpts {
    #[clap(flatten)]
    server: ServerArgs,

    /// Time to report balances at (RFC 3339). Defaults to now.
    #[clap(long)]
    at: Option<DateTime<Utc>>,

    /// One of: id, name, amount, magnitude.
    #[clap(long, default_value = "id")]
    sort: SortKey,
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();

    let sentry_config = cli.sentry_dsn.map(|dsn| {
        debug!("Enabled sentry.");

        let release_name = option_env!("GIT_SHA")
            .map(Cow::from)
            .or_else(|| sentry::release_name!());

        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: release_name,
                ..Default::default()
            },
        ))
    });

    let sentry_tracing_layer = if sentry_config.is_some() {
        Some(sentry_tracing::layer())
    } else {
        None
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sentry_tracing_layer)
        .init();

    match cli.command {
        Commands::Migrate(opts) => migrate::run_migrations(opts.into()).await,
        Commands::Serve(opts) => {
            let migrate_opts = migrate::MigrationOpts {
                database: (&opts.database).into(),
            };

            migrate::run_migrations(migrate_opts).await?;

            server::serve(opts.into()).await
        }
        Commands::Accounts(opts) => {
            let mut accounts = opts.server.client()?.accounts(opts.open_at).await?;
            match opts.sort {
                AccountOrder::Id => accounts.sort_by_key(|account| account.id),
                AccountOrder::Name => {
                    accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
                }
            }

            print!("{}", table::accounts_table(&accounts).render_or("No accounts."));

            Ok(())
        }
        Commands::AddAccount(opts) => {
            let account = opts
                .server
                .client()?
                .create_account(&opts.account.into())
                .await?;

            print!("{}", table::accounts_table(&[account]).render());

            Ok(())
        }
        Commands::UpdateAccount(opts) => {
            let account = opts
                .server
                .client()?
                .update_account(opts.account, &opts.fields.into())
                .await?;

            print!("{}", table::accounts_table(&[account]).render());

            Ok(())
        }
        Commands::DeleteAccount(opts) => {
            opts.server.client()?.delete_account(opts.account).await?;

            println!("Deleted account {}.", opts.account);

            Ok(())
        }
        Commands::AddBalance(opts) => {
            let client = opts.server.client()?;
            let data = BalanceData {
                date: opts.date.unwrap_or_else(Utc::now),
                amount: opts.amount,
                currency: opts.currency,
            };

            client.create_balance(opts.account, &data).await?;

            let history = client.account_balances(opts.account).await?;
            print!("{}", table::balances_table(&history).render_or("No balances."));

            Ok(())
        }
        Commands::Balances(opts) => {
            let history = opts.server.client()?.account_balances(opts.account).await?;

            println!("{} ({})", history.account.name, history.account.currency);
            print!("{}", table::balances_table(&history).render_or("No balances."));

            Ok(())
        }
        Commands::Report(opts) => {
            let report = opts.server.client()?.report(opts.at, opts.sort).await?;

            println!("Balances at {}", report.at.to_rfc3339());
            print!("{}", table::report_table(&report).render_or("No balances."));

            Ok(())
        }
    }
}
