use chrono::Utc;
use order_placement_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use sea_orm::ActiveValue::NotSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_products(&orm).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = vec![
        ("Fresh Milk 1L", 6500, 50),
        ("Brown Eggs (12)", 9000, 100),
        ("Basmati Rice 5kg", 52000, 200),
        ("Filter Coffee 500g", 28000, 75),
    ];

    for (name, price, stock) in products {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(name))
            .count(orm)
            .await?
            > 0;
        if exists {
            println!("Skipped existing product {name}");
            continue;
        }

        let now = Utc::now().fixed_offset();
        let product = ProductActive {
            id: NotSet,
            name: Set(name.to_string()),
            price: Set(price),
            stock_quantity: Set(stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(orm)
        .await?;
        println!("Seeded product {} (id={})", product.name, product.id);
    }

    Ok(())
}
