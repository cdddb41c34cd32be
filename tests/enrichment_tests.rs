//! Trade enrichment against the product projection.

use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};
use rust_decimal_macros::dec;
use trade_enricher::adapter::inbound::decoder::{decode_products, decode_trades};
use trade_enricher::application::enrichment::{ProjectionState, TradeEnrichmentService};
use trade_enricher::domain::{Trade, MISSING_PRODUCT_NAME};
use trade_enricher::error::Error;
use trade_enricher::testkit::domain::{pid, product, products_csv, trade, trades_csv};

async fn loaded(rows: &[(&str, &str)]) -> Arc<TradeEnrichmentService> {
    let service = Arc::new(TradeEnrichmentService::new());
    let body = products_csv(rows);
    service
        .load_products(decode_products(body.as_bytes()))
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn enriches_trades_in_input_order() {
    let service = loaded(&[("1", "Treasury Bills Domestic"), ("2", "Corporate Bonds Domestic")]).await;
    let body = trades_csv(&[
        ("20160101", "2", "EUR", "20.1"),
        ("20160101", "1", "EUR", "10"),
        ("20160102", "2", "USD", "30.34"),
    ]);

    let enriched: Vec<Trade> = service
        .enrich_all(decode_trades(body.as_bytes()))
        .try_collect()
        .await
        .unwrap();

    let names: Vec<_> = enriched.iter().map(|t| t.product_name().unwrap()).collect();
    assert_eq!(
        names,
        [
            "Corporate Bonds Domestic",
            "Treasury Bills Domestic",
            "Corporate Bonds Domestic"
        ]
    );
    assert_eq!(enriched[2].price(), dec!(30.34));
    assert_eq!(enriched[2].currency(), "USD");
}

#[tokio::test]
async fn unknown_product_gets_placeholder_name() {
    let service = loaded(&[("1", "Widget")]).await;

    let enriched = service.enrich_one(&trade("20230101", "99", "EUR", "1.5"));

    assert_eq!(enriched.product_name(), Some(MISSING_PRODUCT_NAME));
    assert_eq!(enriched.product_id(), &pid("99"));
}

#[tokio::test]
async fn invalid_trade_rows_are_dropped() {
    let service = loaded(&[("1", "Widget")]).await;
    let body = trades_csv(&[
        ("20230101", "1", "EUR", "10.0"),
        ("2023-01-01", "1", "EUR", "11.0"),
        ("20230102", "1", "EUR", "abc"),
        ("20230103", "1", "EUR", "12.0"),
    ]);

    let enriched: Vec<Trade> = service
        .enrich_all(decode_trades(body.as_bytes()))
        .try_collect()
        .await
        .unwrap();

    let prices: Vec<_> = enriched.iter().map(Trade::price).collect();
    assert_eq!(prices, [dec!(10.0), dec!(12.0)]);
}

#[tokio::test]
async fn upstream_fault_passes_through_enrichment() {
    let service = loaded(&[("1", "Widget")]).await;
    let trades = stream::iter(vec![
        Ok(trade("20230101", "1", "EUR", "1")),
        Err(Error::Io(std::io::Error::other("socket closed"))),
    ]);

    let items: Vec<_> = service.enrich_all(trades).collect().await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(Error::Io(_))));
}

#[tokio::test]
async fn reload_replaces_projection() {
    let service = loaded(&[("1", "Widget"), ("2", "Gadget")]).await;

    let products = service
        .load_products(stream::iter(vec![Ok(product("2", "Gizmo"))]))
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(service.projection_len(), 1);
    assert_eq!(service.projection_state(), ProjectionState::Populated { loads: 2 });
    let enriched = service.enrich_one(&trade("20230101", "1", "EUR", "1"));
    assert_eq!(enriched.product_name(), Some(MISSING_PRODUCT_NAME));
    assert_eq!(service.product(&pid("2")).unwrap().product_name(), "Gizmo");
}

#[tokio::test]
async fn loading_the_same_batch_twice_is_idempotent() {
    let service = TradeEnrichmentService::new();
    let body = products_csv(&[("1", "Widget"), ("2", "Gadget"), ("1", "Widget")]);

    let first = service
        .load_products(decode_products(body.as_bytes()))
        .await
        .unwrap();
    let first_len = service.projection_len();
    let first_entries: Vec<_> = [pid("1"), pid("2")]
        .iter()
        .map(|id| service.product(id))
        .collect();

    let second = service
        .load_products(decode_products(body.as_bytes()))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first_len, 2);
    assert_eq!(service.projection_len(), first_len);
    for (id, before) in [pid("1"), pid("2")].iter().zip(first_entries) {
        assert_eq!(service.product(id), before);
        assert!(before.is_some());
    }
}

#[tokio::test]
async fn faulted_reload_keeps_previous_projection() {
    let service = loaded(&[("1", "Widget")]).await;

    let result = service
        .load_products(stream::iter(vec![
            Ok(product("3", "Thing")),
            Err(Error::Io(std::io::Error::other("truncated"))),
        ]))
        .await;

    assert!(result.is_err());
    assert_eq!(service.projection_state(), ProjectionState::Populated { loads: 1 });
    assert!(service.product(&pid("1")).is_some());
    assert!(service.product(&pid("3")).is_none());
}

#[tokio::test]
async fn empty_projection_marks_everything_missing() {
    let service = TradeEnrichmentService::new();

    assert_eq!(service.projection_state(), ProjectionState::Empty);
    let enriched = service.enrich_one(&trade("20230101", "1", "EUR", "1"));
    assert_eq!(enriched.product_name(), Some(MISSING_PRODUCT_NAME));
}
