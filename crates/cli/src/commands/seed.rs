//! Sample-data seeding for local development.

use chrono::{Duration, Utc};
use ecoshop_core::DiscountType;
use ecoshop_server::db::coupons::CouponInput;
use ecoshop_server::db::products::ProductInput;
use ecoshop_server::db::{CouponRepository, ProductRepository, RepositoryError};
use rust_decimal::Decimal;

use super::CommandError;

/// Seed a handful of products and coupons.
///
/// Safe to re-run: duplicate coupon codes are skipped.
///
/// # Errors
///
/// Returns `CommandError` on database failure.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let products = ProductRepository::new(&pool);
    for input in sample_products() {
        let product = products.create(&input).await.map_err(db_error)?;
        tracing::info!(id = %product.id, name = %product.name, "seeded product");
    }

    let coupons = CouponRepository::new(&pool);
    for input in sample_coupons() {
        match coupons.create(&input).await {
            Ok(coupon) => tracing::info!(code = %coupon.code, "seeded coupon"),
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(code = %input.code, "coupon already present, skipping");
            }
            Err(other) => return Err(db_error(other)),
        }
    }

    tracing::info!("Seeding complete");
    Ok(())
}

fn db_error(err: RepositoryError) -> CommandError {
    match err {
        RepositoryError::Database(e) => CommandError::Database(e),
        other => CommandError::Invalid(other.to_string()),
    }
}

fn sample_products() -> Vec<ProductInput> {
    vec![
        ProductInput {
            name: "Bamboo Toothbrush".to_owned(),
            description: "Biodegradable toothbrush with charcoal bristles.".to_owned(),
            price: Decimal::new(499, 2),
            category: "personal-care".to_owned(),
            stock: 120,
            image: None,
        },
        ProductInput {
            name: "Solar Lantern".to_owned(),
            description: "Foldable solar-charged lantern, 12h runtime.".to_owned(),
            price: Decimal::new(3999, 2),
            category: "outdoor".to_owned(),
            stock: 35,
            image: None,
        },
        ProductInput {
            name: "Reusable Produce Bags (5-pack)".to_owned(),
            description: "Mesh bags for fruit and veg, machine washable.".to_owned(),
            price: Decimal::new(1250, 2),
            category: "kitchen".to_owned(),
            stock: 80,
            image: None,
        },
        ProductInput {
            name: "Stainless Steel Bottle 750ml".to_owned(),
            description: "Double-walled, keeps drinks cold for 24h.".to_owned(),
            price: Decimal::new(2199, 2),
            category: "kitchen".to_owned(),
            stock: 60,
            image: None,
        },
    ]
}

fn sample_coupons() -> Vec<CouponInput> {
    vec![
        CouponInput {
            code: "WELCOME10".to_owned(),
            description: Some("10% off your first order".to_owned()),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(10),
            min_purchase: Decimal::ZERO,
            max_discount: Some(Decimal::from(20)),
            usage_limit: None,
            expiry_date: None,
            is_active: true,
        },
        CouponInput {
            code: "ECO5".to_owned(),
            description: Some("$5 off orders over $25".to_owned()),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(5),
            min_purchase: Decimal::from(25),
            max_discount: None,
            usage_limit: Some(500),
            expiry_date: Some(Utc::now() + Duration::days(90)),
            is_active: true,
        },
    ]
}
