use crate::commands::{execute, open_store, CommandResult};

pub fn run() -> CommandResult {
    execute("migrate", |config| async move {
        let pool = open_store(&config).await?;
        pool.close().await;
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
