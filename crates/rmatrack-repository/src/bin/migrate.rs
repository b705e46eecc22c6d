use std::env;

use anyhow::Result;
use rmatrack_repository::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let database_url = env::var("DATABASE_URL")?;

    println!("Connecting to database...");
    let store = PgStore::connect(&database_url, 5).await?;

    println!("Running migrations...");
    store.run_migrations().await?;

    println!("Migrations complete.");
    Ok(())
}
