//! Basic example of the joinery container.
//!
//! Run with `RUST_LOG=joinery_container=trace cargo run --example basic`.

use std::sync::Arc;

use joinery::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Define your types ===

#[derive(Injectable)]
struct ConsoleLogger;

impl ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Injectable)]
struct Database {
    url: String,
    logger: Arc<ConsoleLogger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Injectable)]
struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Injectable)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<ConsoleLogger>,
    #[inject(default = 3)]
    retries: u8,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id} (retries: {})", self.retries));
        self.repo.find_user(id)
    }
}

// === Group registrations in a provider ===

#[derive(Default)]
struct DatabaseProvider;

impl ServiceProvider for DatabaseProvider {
    fn register(&self, container: &Container, values: &ProviderValues) -> Result<()> {
        let url = values
            .get::<String>("database.url")?
            .map(|url| (*url).clone())
            .unwrap_or_else(|| String::from("sqlite::memory:"));

        container.singleton("ConsoleLogger", "ConsoleLogger");
        container.singleton("Database", "Database");
        container.when("Database").needs("$url").give(url);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joinery_container=debug")))
        .init();

    let container = Container::builder()
        .cache_policy(CachePolicy::SharedOnly)
        .provider_with(
            DatabaseProvider,
            ProviderValues::new().with("database.url", String::from("postgres://localhost/myapp")),
        )
        .build()?;

    // Nothing is constructed yet; check the graph first.
    container.verify(["UserService"])?;

    let service = container.make_type::<UserService>()?;
    println!("{}", service.get_user(42));

    // Shared bindings hand out the same instance.
    let db1: Arc<Database> = container.make("Database")?;
    let db2: Arc<Database> = container.make("Database")?;
    info!(same = Arc::ptr_eq(&db1, &db2), "Database is a singleton");

    // Unknown identifiers come back with suggestions.
    if let Err(err) = container.resolve("UserServise") {
        println!("{err}");
    }

    Ok(())
}
