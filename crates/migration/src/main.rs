use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "usage: migration [up [N] | down [N] | fresh | refresh | reset | status]";

fn database_url() -> String {
    ["FINTRACK_DATABASE_URL", "DATABASE_URL"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| "sqlite:./fintrack.db?mode=rwc".to_string())
}

fn steps(arg: Option<String>) -> Result<Option<u32>, String> {
    arg.map(|n| n.parse::<u32>().map_err(|_| format!("invalid step count: {n}")))
        .transpose()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "up".to_string());
    let count = steps(args.next())?;

    let db = Database::connect(database_url()).await?;
    match command.as_str() {
        "up" => Migrator::up(&db, count).await?,
        "down" => Migrator::down(&db, Some(count.unwrap_or(1))).await?,
        "fresh" => Migrator::fresh(&db).await?,
        "refresh" => Migrator::refresh(&db).await?,
        "reset" => Migrator::reset(&db).await?,
        "status" => Migrator::status(&db).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}
