//! Delimited-text record decoding.
//!
//! Turns comma-separated text into typed [`Product`] and [`Trade`] records as
//! a lazy stream. The first line of every input is a header and is skipped.
//! Rows that fail to parse are dropped with a warning and decoding carries
//! on; an I/O error on the source ends the stream with an `Err` item.
//!
//! Product rows: `productId,productName`
//!
//! Trade rows: `date,productId,currency,price`, with `date` as `YYYYMMDD`.

use std::str::FromStr;

use chrono::NaiveDate;
use futures_util::{stream, Stream};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::domain::{Product, ProductId, Trade};
use crate::error::{DecodeError, Error, Result};

/// Date layout used by trade files (basic ISO, e.g. `20230101`).
pub const TRADE_DATE_FORMAT: &str = "%Y%m%d";

/// Header written before encoded enriched trades.
pub const ENRICHED_TRADE_HEADER: &str = "date,productName,currency,price";

/// Decode a product file.
pub fn decode_products<R>(reader: R) -> impl Stream<Item = Result<Product>>
where
    R: AsyncBufRead + Unpin,
{
    decode(reader, "product", parse_product_line)
}

/// Decode a trade file.
pub fn decode_trades<R>(reader: R) -> impl Stream<Item = Result<Trade>>
where
    R: AsyncBufRead + Unpin,
{
    decode(reader, "trade", parse_trade_line)
}

struct DecodeState<R, F> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    finished: bool,
    parse: F,
}

/// Strip the line terminator (`\n` or `\r\n`) left by `read_until`.
fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn decode<R, T, F>(reader: R, kind: &'static str, parse: F) -> impl Stream<Item = Result<T>>
where
    R: AsyncBufRead + Unpin,
    F: Fn(&str) -> std::result::Result<T, DecodeError>,
{
    let state = DecodeState {
        reader,
        buf: Vec::new(),
        line_no: 0,
        finished: false,
        parse,
    };

    stream::unfold(state, move |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            state.buf.clear();
            match state.reader.read_until(b'\n', &mut state.buf).await {
                Ok(0) => return None,
                Ok(_) => {
                    state.line_no += 1;
                    let line = match std::str::from_utf8(trim_line_end(&state.buf)) {
                        Ok(line) => line,
                        Err(e) => {
                            let e = DecodeError::Malformed(format!("invalid UTF-8: {e}"));
                            warn!(kind, line = state.line_no, error = %e, "Dropping malformed record");
                            continue;
                        }
                    };
                    if state.line_no == 1 {
                        debug!(kind, header = %line, "Skipping header");
                        continue;
                    }
                    if line.trim().is_empty() {
                        continue;
                    }
                    match (state.parse)(line) {
                        Ok(record) => return Some((Ok(record), state)),
                        Err(e) => {
                            warn!(kind, line = state.line_no, error = %e, "Dropping malformed record");
                        }
                    }
                }
                Err(e) => {
                    warn!(kind, line = state.line_no, error = %e, "Record source failed");
                    state.finished = true;
                    return Some((Err(Error::Io(e)), state));
                }
            }
        }
    })
}

/// Split one delimited line into trimmed fields, honouring quotes.
fn split_fields(line: &str) -> std::result::Result<Vec<String>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(str::to_string).collect()),
        Some(Err(e)) => Err(DecodeError::Malformed(e.to_string())),
        None => Ok(Vec::new()),
    }
}

fn require<'a>(
    fields: &'a [String],
    index: usize,
    field: &'static str,
) -> std::result::Result<&'a str, DecodeError> {
    match fields.get(index).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DecodeError::EmptyField { field }),
    }
}

/// Parse a `productId,productName` row. Extra trailing fields are ignored.
pub fn parse_product_line(line: &str) -> std::result::Result<Product, DecodeError> {
    let fields = split_fields(line)?;
    if fields.len() < 2 {
        return Err(DecodeError::FieldCount {
            expected: 2,
            actual: fields.len(),
        });
    }
    let id = require(&fields, 0, "productId")?;
    let name = require(&fields, 1, "productName")?;
    Ok(Product::new(ProductId::new(id), name))
}

/// Parse a `date,productId,currency,price` row.
pub fn parse_trade_line(line: &str) -> std::result::Result<Trade, DecodeError> {
    let fields = split_fields(line)?;
    if fields.len() < 4 {
        return Err(DecodeError::FieldCount {
            expected: 4,
            actual: fields.len(),
        });
    }

    let raw_date = require(&fields, 0, "date")?;
    let date = NaiveDate::parse_from_str(raw_date, TRADE_DATE_FORMAT).map_err(|e| {
        DecodeError::InvalidDate {
            value: raw_date.to_string(),
            reason: e.to_string(),
        }
    })?;
    let product_id = require(&fields, 1, "productId")?;
    let currency = require(&fields, 2, "currency")?;
    let raw_price = require(&fields, 3, "price")?;
    let price = Decimal::from_str(raw_price).map_err(|e| DecodeError::InvalidPrice {
        value: raw_price.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Trade::new(date, ProductId::new(product_id), currency, price))
}

/// Encode an enriched trade as `date,productName,currency,price` plus newline.
///
/// A trade that was never enriched is written with an empty name.
pub fn encode_enriched_trade(trade: &Trade) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let date = trade.date().format(TRADE_DATE_FORMAT).to_string();
    let price = trade.price().to_string();
    writer
        .write_record([
            date.as_str(),
            trade.product_name().unwrap_or_default(),
            trade.currency(),
            price.as_str(),
        ])
        .map_err(|e| Error::Io(e.into()))?;

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use rust_decimal_macros::dec;

    async fn products(text: &str) -> Vec<Product> {
        decode_products(text.as_bytes())
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    async fn trades(text: &str) -> Vec<Trade> {
        decode_trades(text.as_bytes())
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn skips_header_and_decodes_products() {
        let decoded = products("productId,productName\n1,Bond A\n2,Bond B\n").await;
        assert_eq!(
            decoded,
            vec![
                Product::try_new("1", "Bond A").unwrap(),
                Product::try_new("2", "Bond B").unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn short_product_rows_are_dropped_without_stopping() {
        let decoded = products("productId,productName\n1\n,Nameless\n3,\n4,Bond D\n").await;
        assert_eq!(decoded, vec![Product::try_new("4", "Bond D").unwrap()]);
    }

    #[tokio::test]
    async fn header_only_input_is_empty() {
        assert!(trades("date,productId,currency,price\n").await.is_empty());
        assert!(products("").await.is_empty());
    }

    #[tokio::test]
    async fn decodes_trades() {
        let decoded =
            trades("date,productId,currency,price\n20230101,1,USD,100.25\n20230102,4,USD,150.75\n")
                .await;

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(decoded[0].product_id().as_str(), "1");
        assert_eq!(decoded[0].currency(), "USD");
        assert_eq!(decoded[0].price(), dec!(100.25));
        assert_eq!(decoded[1].price(), dec!(150.75));
        assert!(decoded.iter().all(|t| !t.is_enriched()));
    }

    #[tokio::test]
    async fn bad_dates_and_prices_are_dropped() {
        let decoded = trades(
            "date,productId,currency,price\ninvalidDate,1,EUR,1700.70\n20230102,4,USD,invalidPrice\n20230103,5,EUR,1.5\n",
        )
        .await;
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].product_id().as_str(), "5");
    }

    #[test]
    fn parse_errors_are_specific() {
        assert_eq!(
            parse_product_line("1"),
            Err(DecodeError::FieldCount {
                expected: 2,
                actual: 1
            })
        );
        assert!(matches!(
            parse_trade_line("2023-01-01,1,USD,1"),
            Err(DecodeError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_trade_line("20230101,1,USD,abc"),
            Err(DecodeError::InvalidPrice { .. })
        ));
        assert_eq!(
            parse_trade_line("20230101,,USD,1"),
            Err(DecodeError::EmptyField { field: "productId" })
        );
    }

    #[test]
    fn quoted_names_keep_commas() {
        let product = parse_product_line(r#"7,"Bonds, Corporate""#).unwrap();
        assert_eq!(product.product_name(), "Bonds, Corporate");
    }

    #[test]
    fn encodes_enriched_trade() {
        let trade = parse_trade_line("20230101,1,USD,100.25")
            .unwrap()
            .with_product_name("Bonds, Corporate");
        assert_eq!(
            encode_enriched_trade(&trade).unwrap(),
            "20230101,\"Bonds, Corporate\",USD,100.25\n"
        );
    }
}
