use rust_decimal::Decimal;

use crate::fee::truncate8;
use crate::market::MarketPrice;
use crate::swap::SwapRequest;

/// Price implied by the amounts of a swap request.
///
/// The side carrying `quote_asset` decides the orientation. A zero amount
/// yields a zero price.
pub fn price_from_swap(request: &SwapRequest, quote_asset: &str) -> MarketPrice {
    if request.amount_p == 0 || request.amount_r == 0 {
        return MarketPrice::default();
    }

    let (base_amount, quote_amount) = if request.asset_p.eq_ignore_ascii_case(quote_asset) {
        (request.amount_r, request.amount_p)
    } else {
        (request.amount_p, request.amount_r)
    };
    let base_amount = Decimal::from(base_amount);
    let quote_amount = Decimal::from(quote_amount);

    MarketPrice::new(
        truncate8(base_amount / quote_amount),
        truncate8(quote_amount / base_amount),
    )
}
