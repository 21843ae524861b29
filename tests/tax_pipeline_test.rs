use std::sync::Arc;

use rust_decimal_macros::dec;

use taxfolio_core::rates::{RateRepository, RateService};
use taxfolio_core::report::TaxReportService;
use taxfolio_core::transactions::{normalize_batch, TransactionDraft};

mod common;

fn draft(
    symbol: &str,
    action: &str,
    trade_date: &str,
    settlement_date: &str,
    quantity: &str,
    price: &str,
) -> TransactionDraft {
    TransactionDraft {
        id: None,
        broker: "IBKR".to_string(),
        symbol: symbol.to_string(),
        isin: None,
        country: None,
        description: None,
        trade_date: trade_date.to_string(),
        settlement_date: Some(settlement_date.to_string()),
        action: action.to_string(),
        quantity: quantity.to_string(),
        price: price.to_string(),
        commission: None,
        commission_currency: None,
        currency: "USD".to_string(),
    }
}

fn service(pool: Arc<taxfolio_core::db::DbPool>) -> TaxReportService {
    let repository = Arc::new(RateRepository::new(pool));
    let provider = Arc::new(common::FlatRateProvider { rate: dec!(4.00) });
    TaxReportService::new(Arc::new(RateService::new(repository, provider)))
}

#[test]
fn test_simple_fifo_report() {
    let (_dir, pool) = common::test_db_pool();
    let service = service(pool);

    let (transactions, warnings) = normalize_batch(vec![
        draft("AAPL", "BUY", "2023-01-10", "2023-01-12", "100", "10"),
        draft("AAPL", "SELL", "2023-06-10", "2023-06-13", "100", "15"),
    ]);
    assert!(warnings.is_empty());

    let report = tokio_test::block_on(service.generate(transactions, 2023, None)).unwrap();

    assert_eq!(report.tax_year, 2023);
    assert_eq!(report.capital_gains.revenue_pln, dec!(6000.00));
    assert_eq!(report.capital_gains.costs_pln, dec!(4000.00));
    assert_eq!(report.capital_gains.profit_pln, dec!(2000.00));
    assert_eq!(report.capital_gains.tax_due, dec!(380));
    assert_eq!(report.capital_gains.matches.len(), 1);
    assert!(report.open_positions.is_empty());
    assert!(report.open_short_positions.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_short_sale_taxed_in_covering_year() {
    let (_dir, pool) = common::test_db_pool();
    let service = service(pool);

    let (transactions, _) = normalize_batch(vec![
        draft("TSLA", "SELL", "2023-12-15", "2023-12-19", "10", "250"),
        draft("TSLA", "BUY", "2024-01-10", "2024-01-11", "10", "200"),
    ]);

    let report_2023 =
        tokio_test::block_on(service.generate(transactions.clone(), 2023, None)).unwrap();
    assert!(report_2023.capital_gains.matches.is_empty());
    assert_eq!(report_2023.capital_gains.tax_due, dec!(0));

    let report_2024 = tokio_test::block_on(service.generate(transactions, 2024, None)).unwrap();
    assert_eq!(report_2024.capital_gains.matches.len(), 1);
    let m = &report_2024.capital_gains.matches[0];
    assert!(m.is_short);
    assert_eq!(report_2024.capital_gains.revenue_pln, dec!(10000.00));
    assert_eq!(report_2024.capital_gains.costs_pln, dec!(8000.00));
    assert_eq!(report_2024.capital_gains.tax_due, dec!(380));
}

#[test]
fn test_aggregate_duplicate_rows_collapse() {
    // Broker statement carries both the partial fills (16 + 7 + 100) and the
    // aggregate row (123) for the same order. Only 123 shares really exist.
    let (_dir, pool) = common::test_db_pool();
    let service = service(pool);

    let (transactions, _) = normalize_batch(vec![
        draft("MSFT", "BUY", "2023-03-01T10:00:00", "2023-03-03", "16", "100"),
        draft("MSFT", "BUY", "2023-03-01T10:00:00", "2023-03-03", "7", "100"),
        draft("MSFT", "BUY", "2023-03-01T10:00:00", "2023-03-03", "100", "100"),
        draft("MSFT", "BUY", "2023-03-01T10:00:00", "2023-03-03", "123", "100"),
        draft("MSFT", "SELL", "2023-09-01", "2023-09-06", "123", "110"),
    ]);

    let report = tokio_test::block_on(service.generate(transactions, 2023, None)).unwrap();

    let total_sold: rust_decimal::Decimal = report
        .capital_gains
        .matches
        .iter()
        .map(|m| m.quantity)
        .sum();
    assert_eq!(total_sold, dec!(123));
    assert!(report.open_positions.is_empty());
    // 123 * (110 - 100) * 4.00
    assert_eq!(report.capital_gains.profit_pln, dec!(4920.00));
}

#[test]
fn test_orphan_sell_is_flagged() {
    let (_dir, pool) = common::test_db_pool();
    let service = service(pool);

    let (transactions, _) = normalize_batch(vec![draft(
        "NVDA", "SELL", "2023-05-10", "2023-05-12", "5", "400",
    )]);

    let report = tokio_test::block_on(service.generate(transactions, 2023, None)).unwrap();

    assert_eq!(report.capital_gains.matches.len(), 1);
    let m = &report.capital_gains.matches[0];
    assert!(m.is_orphan);
    assert_eq!(m.buy_cost_pln, dec!(0));
    assert_eq!(report.capital_gains.revenue_pln, dec!(8000.00));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("MISSING BUY") && w.contains("NVDA")));
    assert_eq!(report.open_short_positions.len(), 1);
}

#[test]
fn test_dividend_with_withholding() {
    let (_dir, pool) = common::test_db_pool();
    let service = service(pool);

    let mut dividend = draft("KO", "DIVIDEND", "2023-04-03", "2023-04-03", "100", "0.46");
    dividend.isin = Some("US1912161007".to_string());
    let wht = draft("KO", "TAX_WHT", "2023-04-03", "2023-04-03", "6.9", "1");

    let (transactions, _) = normalize_batch(vec![dividend, wht]);
    let report = tokio_test::block_on(service.generate(transactions, 2023, None)).unwrap();

    assert_eq!(report.dividends.items.len(), 1);
    // Gross 46 USD * 4.00 = 184 PLN, WHT 6.90 * 4.00 = 27.60 PLN
    assert_eq!(report.dividends.total_gross_pln, dec!(184.00));
    assert_eq!(report.dividends.total_wht_pln, dec!(27.60));
    // 19% of 184 = 34.96; residual 34.96 - 27.60 = 7.36
    assert_eq!(report.dividends.total_local_tax_pln, dec!(34.96));
    assert_eq!(report.dividends.total_to_pay_pln, dec!(7.36));

    let us = report
        .country_breakdown
        .iter()
        .find(|c| c.country_code == "US")
        .unwrap();
    assert_eq!(us.dividend_income_pln, dec!(184.00));
    assert_eq!(us.tax_paid_abroad_pln, dec!(27.60));
}
