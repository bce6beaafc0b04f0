//! PostgreSQL CRUD 操作演示
//!
//! 依次演示建表、创建、查询、更新、删除，任何一步出错都直接退出。

use rust_sqlx_crud::infrastructure::{load_config, Logger};
use rust_sqlx_crud::{DatabaseManager, User, UserRepository};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    config.apply_env_overrides()?;
    config.validate()?;

    Logger::init(&config.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!("=== PostgreSQL CRUD 操作演示 ===");

    if let Err(e) = run(&config.database).await {
        error!("Demo failed: {}", e);
        return Err(e);
    }

    info!("=== CRUD 操作演示完成 ===");
    Ok(())
}

async fn run(
    cfg: &rust_sqlx_crud::PostgresConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化数据库连接，演示结束后无论成败都关闭
    let db = DatabaseManager::new(cfg).await?;
    let result = demo(&db).await;
    db.close().await;
    result
}

async fn demo(db: &DatabaseManager) -> Result<(), Box<dyn std::error::Error>> {
    // 2. 创建用户仓库
    let user_repo =
        UserRepository::new(db.get_pool().clone()).with_log_level(db.log_level());

    // 3. 创建表结构
    user_repo.create_table().await?;

    // 4. 创建用户操作
    info!("=== 创建用户操作 ===");
    let mut first = User::new("张三", "zhangsan@example.com", 25);
    user_repo.create(&mut first).await?;
    info!(
        "Created user: id={}, name={}, age={}",
        first.id, first.name, first.age
    );

    let mut user = User::new("李四", "lisi@example.com", 30);
    user_repo.create(&mut user).await?;
    info!(
        "Created user: id={}, name={}, age={}",
        user.id, user.name, user.age
    );

    let mut batch_users = vec![
        User::new("王五", "wangwu@example.com", 28),
        User::new("赵六", "zhaoliu@example.com", 35),
    ];
    user_repo.batch_create(&mut batch_users).await?;
    info!("Created {} users in batch", batch_users.len());

    // 5. 查询操作
    info!("=== 查询操作 ===");
    let user = user_repo.get_by_id(first.id).await?;
    info!("Fetched user: {}", serde_json::to_string(&user)?);

    let users = user_repo.list_all().await?;
    info!("Fetched {} users", users.len());

    let users = user_repo.get_user_by_age(26).await?;
    info!("Fetched {} users older than 26", users.len());

    let page = user_repo.list(0, 2).await?;
    info!(
        "Fetched page: {} of {} users",
        page.items.len(),
        page.total
    );

    // 6. 更新操作
    info!("=== 更新操作 ===");
    let mut user = user_repo.get_by_id(first.id).await?;
    user.age = 26;
    user_repo.update(&mut user).await?;

    user.name = "张三丰".to_string();
    user.age = 27;
    user_repo.update(&mut user).await?;

    let updated = user_repo.get_by_id(first.id).await?;
    info!(
        "Verified update: name={}, age={}, updated_at={}",
        updated.name, updated.age, updated.timestamps.updated_at
    );

    // 7. 删除操作
    info!("=== 删除操作 ===");
    let count_before = user_repo.count().await?;
    user_repo.delete(first.id).await?;
    let count_after = user_repo.count().await?;
    info!("User count before/after delete: {} -> {}", count_before, count_after);

    // 8. 最终查询验证
    info!("=== 最终结果验证 ===");
    let users = user_repo.list_all().await?;
    info!("Finally fetched {} users", users.len());

    Ok(())
}
