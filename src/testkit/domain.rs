//! Builders for domain values and CSV bodies used across tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{Product, ProductId, Trade};

/// Create a [`ProductId`] from a string.
pub fn pid(id: &str) -> ProductId {
    ProductId::from(id)
}

/// Create a [`Product`].
pub fn product(id: &str, name: &str) -> Product {
    Product::new(ProductId::from(id), name)
}

/// Generate `n` products `p0..p{n-1}` named `Product 0..`.
pub fn make_products(n: usize) -> Vec<Product> {
    (0..n)
        .map(|i| product(&format!("p{i}"), &format!("Product {i}")))
        .collect()
}

/// Create an unenriched [`Trade`] from a `YYYYMMDD` date and a decimal price.
///
/// Panics on malformed input.
pub fn trade(date: &str, id: &str, currency: &str, price: &str) -> Trade {
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").expect("valid YYYYMMDD date");
    let price: Decimal = price.parse().expect("valid decimal price");
    Trade::new(date, ProductId::from(id), currency, price)
}

/// Render a product CSV body with the standard header.
pub fn products_csv(rows: &[(&str, &str)]) -> String {
    let mut out = String::from("productId,productName\n");
    for (id, name) in rows {
        out.push_str(&format!("{id},{name}\n"));
    }
    out
}

/// Render a trade CSV body with the standard header.
///
/// Rows are `(date, product_id, currency, price)`.
pub fn trades_csv(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut out = String::from("date,productId,currency,price\n");
    for (date, id, currency, price) in rows {
        out.push_str(&format!("{date},{id},{currency},{price}\n"));
    }
    out
}
