//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};

use ecoshop_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductWithRating};

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    stock: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            stock: row.stock,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for product listing with rating aggregates.
#[derive(Debug, sqlx::FromRow)]
struct ProductWithRatingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    average_rating: f64,
    total_ratings: i64,
}

impl From<ProductWithRatingRow> for ProductWithRating {
    fn from(row: ProductWithRatingRow) -> Self {
        Self {
            product: row.product.into(),
            average_rating: row.average_rating,
            total_ratings: row.total_ratings,
        }
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl ProductSort {
    /// Parse the query-string value; unknown values fall back to newest.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name_asc") => Self::NameAsc,
            _ => Self::Newest,
        }
    }

    const fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC",
            Self::PriceAsc => "p.price ASC",
            Self::PriceDesc => "p.price DESC",
            Self::NameAsc => "p.name ASC",
        }
    }
}

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub in_stock: bool,
    pub sort: ProductSort,
}

/// Fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: Option<String>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, stock, image, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products with filters and rating aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductWithRating>, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "SELECT p.id, p.name, p.description, p.price, p.category, p.stock, p.image, \
                    p.created_at, p.updated_at, \
                    COALESCE(AVG(r.rating), 0)::float8 AS average_rating, \
                    COUNT(r.id) AS total_ratings \
             FROM products p \
             LEFT JOIN ratings r ON r.product_id = p.id \
             WHERE TRUE",
        );

        if let Some(category) = &filter.category {
            builder.push(" AND p.category = ").push_bind(category.clone());
        }
        if let Some(min_price) = filter.min_price {
            builder.push(" AND p.price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            builder.push(" AND p.price <= ").push_bind(max_price);
        }
        if filter.in_stock {
            builder.push(" AND p.stock > 0");
        }

        builder.push(" GROUP BY p.id");

        if let Some(min_rating) = filter.min_rating {
            builder
                .push(" HAVING COALESCE(AVG(r.rating), 0)::float8 >= ")
                .push_bind(min_rating);
        }

        builder.push(" ORDER BY ");
        builder.push(filter.sort.order_clause());

        let rows = builder
            .build_query_as::<ProductWithRatingRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, description, price, category, stock, image)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(input.stock)
        .bind(&input.image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = $1, description = $2, price = $3, category = $4,
                 stock = $5, image = $6, updated_at = now()
             WHERE id = $7
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(input.stock)
        .bind(&input.image)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_query() {
        assert_eq!(ProductSort::from_query(None), ProductSort::Newest);
        assert_eq!(ProductSort::from_query(Some("newest")), ProductSort::Newest);
        assert_eq!(
            ProductSort::from_query(Some("price_asc")),
            ProductSort::PriceAsc
        );
        assert_eq!(
            ProductSort::from_query(Some("price_desc")),
            ProductSort::PriceDesc
        );
        assert_eq!(
            ProductSort::from_query(Some("name_asc")),
            ProductSort::NameAsc
        );
        assert_eq!(ProductSort::from_query(Some("bogus")), ProductSort::Newest);
    }
}
