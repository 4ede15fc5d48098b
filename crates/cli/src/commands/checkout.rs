use aislefinder_core::pricing::OrderSummary;
use aislefinder_core::{
    load_catalog, resolve, CartEntry, CartStore, FixedRateSummarizer, PartialProduct,
    PricingSummarizer, ProductId, ResolvedCartItem,
};
use aislefinder_db::SqlCatalogRepository;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{execute, open_store, CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct CheckoutReceipt {
    items: Vec<ResolvedCartItem>,
    dropped: Vec<ProductId>,
    summary: OrderSummary,
    subtotal: String,
    tax: String,
    total: String,
}

/// Prices a cart given as `ID`, `ID:NAME`, or `ID:NAME:PRICE` arguments.
pub fn run(items: Vec<String>) -> CommandResult {
    let parsed = items.iter().map(|item| parse_entry(item)).collect::<Result<Vec<_>, _>>();
    let entries = match parsed {
        Ok(entries) => entries,
        Err(message) => {
            return CommandResult::failure("checkout", "invalid_input", message, EXIT_CONFIG)
        }
    };

    execute("checkout", |config| async move {
        let pool = open_store(&config).await?;
        let catalog = load_catalog(&SqlCatalogRepository::new(pool.clone())).await;
        pool.close().await;

        let cart = CartStore::new();
        for entry in entries {
            cart.add(entry);
        }

        let resolution = resolve(&cart.list(), &catalog);
        let summarizer = FixedRateSummarizer::new(config.pricing.tax_rate);
        let summary = summarizer.summarize(&resolution.items);
        let mut message =
            format!("{} items, total {}", summary.item_count, summary.display_total());
        if !resolution.is_lossless() {
            let dropped =
                resolution.dropped.iter().map(ProductId::as_str).collect::<Vec<_>>().join(", ");
            message.push_str(&format!(" (not in catalog: {dropped})"));
        }

        let receipt = CheckoutReceipt {
            subtotal: summary.display_subtotal(),
            tax: summary.display_tax(),
            total: summary.display_total(),
            items: resolution.items,
            dropped: resolution.dropped,
            summary,
        };
        Ok(CommandResult::success_with_data("checkout", message, &receipt))
    })
}

fn parse_entry(raw: &str) -> Result<CartEntry, String> {
    let mut parts = raw.splitn(3, ':').map(str::trim);
    let id = parts.next().unwrap_or_default();
    if id.is_empty() {
        return Err(format!("cart item `{raw}` has no product id"));
    }

    let Some(name) = parts.next() else {
        return Ok(CartEntry::by_id(id));
    };
    if name.is_empty() {
        return Err(format!("cart item `{raw}` has an empty name"));
    }
    let mut partial = PartialProduct::new(id).with_name(name);
    if let Some(price) = parts.next() {
        let price = price
            .parse::<Decimal>()
            .map_err(|error| format!("cart item `{raw}` has an invalid price: {error}"))?;
        partial = partial.with_price(price);
    }

    let entry = CartEntry::from(partial);
    entry.validate().map_err(|error| error.to_string())?;
    Ok(entry)
}
