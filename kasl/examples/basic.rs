//! Basic example of the Kasl DI container.

use std::sync::Arc;

use kasl::{Container, ContainerSettings, Lazy, Provider, Registration, Result, Service};

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
    debug: bool,
}

#[derive(Service)]
#[service(constructor = "Database::connect")]
struct Database {
    url: String,
    logger: Arc<Box<dyn Logger>>,
}

impl Database {
    fn connect(container: &Container) -> Result<Self> {
        let config = container.resolve::<Config>("config")?;
        let logger = container.resolve::<Box<dyn Logger>>("logger")?;
        logger.log("Opening database connection");
        Ok(Database {
            url: config.database_url.clone(),
            logger,
        })
    }

    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Service)]
#[service(name = "users")]
struct UserRepository {
    db: Lazy<Database>,
}

impl UserRepository {
    fn new(container: &Container) -> Result<Self> {
        // Keep the handle: the database connects on first query, not here
        Ok(UserRepository {
            db: container.get("database")?,
        })
    }

    fn find_user(&self, id: u64) -> Result<String> {
        self.db.with(|db| db.query(&format!("SELECT * FROM users WHERE id = {id}")))
    }
}

// === Group the infrastructure into a provider ===

struct InfrastructureProvider;

impl Provider for InfrastructureProvider {
    fn services(&self) -> Vec<Registration> {
        vec![
            Registration::factory("config", |_| {
                Ok(Config {
                    database_url: "postgres://localhost/myapp".to_string(),
                    debug: true,
                })
            }),
            Registration::factory("logger", |_| Ok(Box::new(ConsoleLogger) as Box<dyn Logger>)),
            Registration::service::<Database>(),
        ]
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("kasl_container=debug")
        .init();

    // Application services first: they only hold handles, so the order
    // relative to their dependencies does not matter
    let app = Container::with_settings(ContainerSettings::default().with_label("app"));
    app.inject_service::<UserRepository>()?;

    let infrastructure = Container::new();
    infrastructure.add_provider(&InfrastructureProvider)?;
    app.inject_container(&infrastructure)?;

    println!("✅ Container ready: {:?}", app.names());

    let config = app.resolve::<Config>("config")?;
    println!("📋 Config: database_url={}, debug={}", config.database_url, config.debug);

    let users = app.resolve::<UserRepository>("users")?;
    println!("💤 Database connected yet? {}", app.get::<Database>("database")?.is_initialized());

    println!("👤 {}", users.find_user(42)?);
    println!("👤 {}", users.find_user(7)?);

    // Registering the same name twice is rejected
    if let Err(err) = app.inject_fn("users", |_| Ok(())) {
        println!("🚫 {err}");
    }

    println!("\n🎉 Everything works!");
    Ok(())
}
