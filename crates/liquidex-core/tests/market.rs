//! Market pricing properties and preview scenarios through the public API.

use liquidex_core::fee::to_amount;
use liquidex_core::{
    BalancedReserves, Decimal, Error, FIXED_FEE_UNCHANGED, Formula, FormulaOpts, Market, MarketPrice,
    StrategyType, market_name,
};
use rust_decimal_macros::dec;

const LBTC: &str = "5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225";
const USDT: &str = "d090c403610fe8a9e31967355929833bc8a8fe08429e630162d1ecbf29fdf28b";

// ── Helpers ─────────────────────────────────────────────────────────────

fn balanced_market() -> Market {
    let mut market = Market::new(LBTC, USDT, 100).unwrap();
    market.change_fixed_fee(650, 20_000_000).unwrap();
    market.make_tradable().unwrap();
    market
}

fn pluggable_market() -> Market {
    let mut market = Market::new(LBTC, USDT, 100).unwrap();
    market.make_strategy_pluggable().unwrap();
    market.change_fixed_fee(0, 20).unwrap();
    market
        .change_price(dec!(0.000028571429), dec!(35000))
        .unwrap();
    market.make_tradable().unwrap();
    market
}

// ── Construction ────────────────────────────────────────────────────────

#[test]
fn every_valid_fee_creates_market_with_stable_name() {
    for fee in [0, 1, 25, 100, 5_000, 9_999] {
        let a = Market::new(LBTC, USDT, fee).unwrap();
        let b = Market::new(LBTC, USDT, fee).unwrap();
        assert_eq!(a.name(), b.name());
        assert_eq!(a.name(), market_name(LBTC, USDT));
        assert_eq!(a.percentage_fee(), fee);
    }
}

// ── Open/closed discipline ──────────────────────────────────────────────

#[test]
fn open_market_rejects_every_closed_only_mutator() {
    let mut market = balanced_market();
    let before = market.clone();

    assert_eq!(market.change_percentage_fee(50), Err(Error::MarketMustBeClosed));
    assert_eq!(market.change_fixed_fee(1, 1), Err(Error::MarketMustBeClosed));
    assert_eq!(
        market.change_fixed_fee(FIXED_FEE_UNCHANGED, 1),
        Err(Error::MarketMustBeClosed)
    );
    assert_eq!(market.make_strategy_pluggable(), Err(Error::MarketMustBeClosed));
    assert_eq!(market.make_strategy_balanced(), Err(Error::MarketMustBeClosed));

    assert_eq!(market, before);
}

#[test]
fn close_then_reconfigure() {
    let mut market = balanced_market();
    market.make_not_tradable();
    market.change_percentage_fee(50).unwrap();
    market.make_strategy_pluggable().unwrap();
    assert_eq!(market.strategy_type(), StrategyType::Pluggable);
    assert_eq!(market.make_tradable(), Err(Error::MarketNotPriced));
}

#[test]
fn pluggable_price_can_move_while_open() {
    let mut market = pluggable_market();
    market.change_price(dec!(0.00003), dec!(33333.33)).unwrap();
    assert_eq!(
        market.price(),
        MarketPrice::new(dec!(0.00003), dec!(33333.33))
    );
}

// ── Formulas ────────────────────────────────────────────────────────────

#[test]
fn balanced_round_trip_approximates_input() {
    let opts = FormulaOpts {
        balance_in: 4_000_000_000,
        balance_out: 100_000_000,
        ..Default::default()
    };
    let amount_in = 1_000_000u64;
    let out = BalancedReserves.out_given_in(&opts, amount_in).unwrap();
    let back = BalancedReserves
        .in_given_out(&opts, to_amount(out))
        .unwrap();
    let diff = (back - Decimal::from(amount_in)).abs();
    // 1 output unit ~ 40 input units at this ratio.
    assert!(diff < dec!(50), "{back} vs {amount_in}");
}

// ── Preview scenarios ───────────────────────────────────────────────────

#[test]
fn balanced_preview_buy_base_with_quote() {
    let market = balanced_market();
    let preview = market
        .preview(100_000, 4_000_000_000, 100_000_000, false, true)
        .unwrap();

    assert_eq!(preview.price.base_price, dec!(0.000025));
    assert_eq!(preview.price.quote_price, dec!(40000));
    assert_eq!(preview.amount, 2_439);
    assert_eq!(preview.asset, LBTC);
    assert_eq!(preview.fee_asset, USDT);
    assert_eq!(preview.fee_amount, 21_000_000);
}

#[test]
fn balanced_preview_sell_base() {
    let market = balanced_market();
    // 4e9 * (1 - 1e5 / 1.01e5) = 39603960.39...
    let preview = market
        .preview(100_000, 4_000_000_000, 1_000, true, false)
        .unwrap();
    assert_eq!(preview.amount, 39_603_960);
    assert_eq!(preview.asset, USDT);
    assert_eq!(preview.fee_asset, LBTC);
    assert_eq!(preview.fee_amount, 10 + 650);
}

#[test]
fn pluggable_preview_buy_exact_base_charges_percentage_fee_only() {
    let market = pluggable_market();
    // Fee is in base, the asset named. The fixed fee is set on quote only,
    // so the 20 below is 1% of 2000 and the fixed fee adds nothing.
    let preview = market
        .preview(100_000, 4_000_000_000, 2_000, true, true)
        .unwrap();

    assert_eq!(
        preview.price,
        MarketPrice::new(dec!(0.000028571429), dec!(35000))
    );
    assert_eq!(preview.amount, 70_000_000);
    assert_eq!(preview.asset, USDT);
    assert_eq!(preview.fee_asset, LBTC);
    assert_eq!(preview.fee_amount, 20);
}

#[test]
fn pluggable_preview_dust_quote_is_too_low() {
    let market = pluggable_market();
    // 2000 quote units are worth 0.057 base units at this price.
    assert_eq!(
        market.preview(100_000, 4_000_000_000, 2_000, false, true),
        Err(Error::AmountTooLow)
    );
}

#[test]
fn preview_amount_at_or_below_fixed_fee_is_too_low() {
    let market = balanced_market();
    for amount in [0, 1, 649, 650] {
        assert_eq!(
            market.preview(100_000, 4_000_000_000, amount, true, true),
            Err(Error::AmountTooLow),
            "amount {amount}"
        );
    }
}

#[test]
fn preview_consuming_opposite_balance_is_too_big() {
    let market = balanced_market();
    assert_eq!(
        market.preview(100_000, 4_000_000_000, 100_000, true, true),
        Err(Error::AmountTooBig)
    );
    assert_eq!(
        market.preview(100_000, 4_000_000_000, 4_000_000_000, false, false),
        Err(Error::AmountTooBig)
    );

    let market = pluggable_market();
    // 10 base * 35000 >= 100_000 quote balance.
    assert_eq!(
        market.preview(100_000, 100_000, 10, true, false),
        Err(Error::AmountTooBig)
    );
}

#[test]
fn preview_with_empty_balance_fails() {
    let market = balanced_market();
    assert_eq!(
        market.preview(0, 4_000_000_000, 100_000_000, false, true),
        Err(Error::BalanceTooLow)
    );
}
