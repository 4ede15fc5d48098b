use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cart::ResolvedCartItem;

/// 8%, applied to the whole subtotal.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_count: usize,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    pub fn empty(tax_rate: Decimal) -> Self {
        Self {
            item_count: 0,
            subtotal: Decimal::ZERO,
            tax_rate,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    pub fn display_subtotal(&self) -> String {
        format_amount(self.subtotal)
    }

    pub fn display_tax(&self) -> String {
        format_amount(self.tax)
    }

    pub fn display_total(&self) -> String {
        format_amount(self.total)
    }
}

/// Renders a currency amount to cents, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${cents:.2}")
}

pub trait PricingSummarizer: Send + Sync {
    fn summarize(&self, items: &[ResolvedCartItem]) -> OrderSummary;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedRateSummarizer {
    tax_rate: Decimal,
}

impl FixedRateSummarizer {
    pub fn new(tax_rate: Decimal) -> Self {
        Self { tax_rate }
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }
}

impl Default for FixedRateSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAX_RATE)
    }
}

impl PricingSummarizer for FixedRateSummarizer {
    fn summarize(&self, items: &[ResolvedCartItem]) -> OrderSummary {
        let subtotal = items.iter().map(|item| item.product.price).sum::<Decimal>();
        let tax = subtotal * self.tax_rate;

        OrderSummary {
            item_count: items.len(),
            subtotal,
            tax_rate: self.tax_rate,
            tax,
            total: subtotal + tax,
        }
    }
}

pub fn summarize(items: &[ResolvedCartItem]) -> OrderSummary {
    FixedRateSummarizer::default().summarize(items)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{summarize, FixedRateSummarizer, OrderSummary, PricingSummarizer, DEFAULT_TAX_RATE};
    use crate::cart::{ResolutionSource, ResolvedCartItem};
    use crate::domain::product::Product;

    fn item(id: &str, price: Decimal) -> ResolvedCartItem {
        ResolvedCartItem {
            product: Product::new(id, format!("Item {id}"), price),
            source: ResolutionSource::Catalog,
        }
    }

    #[test]
    fn empty_cart_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, OrderSummary::empty(DEFAULT_TAX_RATE));
        assert_eq!(summary.display_total(), "$0.00");
    }

    #[test]
    fn eight_percent_tax_on_subtotal() {
        let summary = summarize(&[item("A", Decimal::new(10, 0)), item("B", Decimal::new(5, 0))]);

        assert_eq!(summary.subtotal, Decimal::new(1500, 2));
        assert_eq!(summary.tax, Decimal::new(120, 2));
        assert_eq!(summary.total, Decimal::new(1620, 2));
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.display_subtotal(), "$15.00");
        assert_eq!(summary.display_tax(), "$1.20");
        assert_eq!(summary.display_total(), "$16.20");
    }

    #[test]
    fn duplicates_count_twice() {
        let milk = item("P1", Decimal::new(299, 2));
        let summary = summarize(&[milk.clone(), milk]);
        assert_eq!(summary.subtotal, Decimal::new(598, 2));
    }

    #[test]
    fn zero_priced_items_do_not_fail() {
        let summary = summarize(&[item("FREE", Decimal::ZERO), item("A", Decimal::new(100, 2))]);
        assert_eq!(summary.subtotal, Decimal::new(100, 2));
        assert_eq!(summary.total, Decimal::new(108, 2));
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let summarizer = FixedRateSummarizer::default();
        let items = [item("A", Decimal::new(1099, 2))];
        assert_eq!(summarizer.summarize(&items), summarizer.summarize(&items));
    }

    #[test]
    fn display_rounds_half_cents_up() {
        let summary = summarize(&[item("A", Decimal::new(1, 2)), item("B", Decimal::new(18, 2))]);
        assert_eq!(summary.tax, Decimal::new(152, 4));
        assert_eq!(summary.display_tax(), "$0.02");
        assert_eq!(summary.display_total(), "$0.21");
    }

    #[test]
    fn custom_rate_is_applied() {
        let summarizer = FixedRateSummarizer::new(Decimal::new(5, 2));
        let summary = summarizer.summarize(&[item("A", Decimal::new(20, 0))]);
        assert_eq!(summary.tax, Decimal::ONE);
        assert_eq!(summarizer.tax_rate(), Decimal::new(5, 2));
    }
}
