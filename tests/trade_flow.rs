use std::sync::Arc;
use std::time::Duration;

use liquidex_core::testing::MockSwapParser;
use liquidex_core::{
    Error, SwapError, SwapFailCode, SwapParser, SwapRequest, Trade, TradeStatusCode,
};
use liquidex_lib::chain::StaticChain;
use liquidex_lib::store::StaticBalances;
use liquidex_lib::{AcceptTrade, Daemon, DaemonConfig, DaemonError, UtxoLocker, WatcherEvent};

const LBTC: &str = "5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225";
const USDT: &str = "d090c403610fe8a9e31967355929833bc8a8fe08429e630162d1ecbf29fdf28b";

// ── Helpers ─────────────────────────────────────────────────────────────

fn daemon_with(parser: MockSwapParser, config: DaemonConfig) -> (Daemon, String) {
    let balances = Arc::new(StaticBalances::new());
    let daemon = Daemon::in_memory(config, Arc::new(parser), balances.clone()).unwrap();

    let market = daemon.operator.new_market(LBTC, USDT).unwrap();
    balances.set(market.name(), 100_000, 4_000_000_000);
    daemon
        .operator
        .update_fixed_fee(market.name(), 650, 20_000_000)
        .unwrap();
    daemon.operator.update_percentage_fee(market.name(), 100).unwrap();
    daemon.operator.open_market(market.name()).unwrap();
    (daemon, market.name().to_string())
}

fn daemon() -> (Daemon, String) {
    daemon_with(MockSwapParser::default(), DaemonConfig::default())
}

fn request(id: &str) -> SwapRequest {
    SwapRequest {
        id: id.into(),
        asset_p: USDT.into(),
        amount_p: 121_000_000,
        asset_r: LBTC.into(),
        amount_r: 2_439,
        transaction: "cHNldP8BAgQCAAAAAQMEAAAAAA==".into(),
    }
}

fn accept(trade: &Trade, utxos: &[&str]) -> AcceptTrade {
    AcceptTrade {
        trade_id: trade.id().to_string(),
        pset_base64: "cHNldP8BAgQCAAAAAQMEAAAAAAEEAQE=".into(),
        input_blinding_keys: vec![vec![1; 32]],
        output_blinding_keys: vec![vec![2; 32], vec![3; 32]],
        utxos: utxos.iter().map(|s| s.to_string()).collect(),
    }
}

fn accepted(daemon: &Daemon, id: &str, utxos: &[&str]) -> Trade {
    let trade = daemon.trades.propose_trade(&request(id), &[2; 33]).unwrap();
    assert!(!trade.is_rejected());
    let trade = daemon.trades.accept_trade(&accept(&trade, utxos)).unwrap();
    assert!(trade.is_accepted());
    trade
}

fn accept_id(trade: &Trade) -> String {
    trade.swap_accept().unwrap().id.clone()
}

// ── Flows ───────────────────────────────────────────────────────────────

#[test]
fn preview_then_full_swap() {
    let (daemon, market) = daemon();

    let preview = daemon
        .trades
        .preview(&market, 100_000_000, false, true)
        .unwrap();
    assert_eq!(preview.amount, 2_439);
    assert_eq!(preview.fee_amount, 21_000_000);

    let trade = accepted(&daemon, "req-1", &["aa:0", "aa:1"]);
    assert_eq!(daemon.locker.locked_by(trade.id()).len(), 2);

    let parser = MockSwapParser::default();
    let stored_accept = parser
        .deserialize_accept(&trade.swap_accept().unwrap().message)
        .unwrap();
    assert_eq!(stored_accept.request_id, "req-1");
    assert_eq!(stored_accept.output_blinding_keys.len(), 2);

    let completed = daemon
        .trades
        .complete_trade(&accept_id(&trade), "0200000001signed")
        .unwrap();
    assert!(completed.is_completed());
    assert_eq!(daemon.locker.locked_by(trade.id()).len(), 2);

    let chain = StaticChain::new();
    assert!(daemon
        .trades
        .settle_confirmed_trades(&chain)
        .unwrap()
        .is_empty());
    chain.confirm(completed.tx_id(), 1_700_000_000);
    let settled = daemon.trades.settle_confirmed_trades(&chain).unwrap();
    assert_eq!(settled.len(), 1);
    assert!(settled[0].is_settled());
    assert_eq!(settled[0].settlement_time(), 1_700_000_000);
    assert!(daemon.locker.locked_by(trade.id()).is_empty());
}

#[test]
fn closed_market_refuses_proposals() {
    let (daemon, market) = daemon();
    daemon.operator.close_market(&market).unwrap();
    assert!(matches!(
        daemon.trades.propose_trade(&request("req-1"), &[]),
        Err(DaemonError::Core(Error::MarketIsClosed))
    ));
    assert!(matches!(
        daemon.trades.preview(&market, 100_000_000, false, true),
        Err(DaemonError::Core(Error::MarketIsClosed))
    ));
}

#[test]
fn double_spend_blocked_until_release() {
    let (daemon, _) = daemon();
    let first = accepted(&daemon, "req-1", &["aa:0"]);

    let second = daemon.trades.propose_trade(&request("req-2"), &[]).unwrap();
    let err = daemon
        .trades
        .accept_trade(&accept(&second, &["aa:0"]))
        .unwrap_err();
    assert!(matches!(err, DaemonError::AlreadyLocked { .. }));
    assert!(daemon.trades.get_trade(second.id()).unwrap().is_rejected());

    daemon
        .trades
        .fail_trade(first.id(), SwapFailCode::Aborted, "operator abort")
        .unwrap();
    let third = accepted(&daemon, "req-3", &["aa:0"]);
    assert_eq!(daemon.locker.locked_by(third.id()), vec!["aa:0"]);
}

#[test]
fn bad_signature_rejects_completion_and_releases_utxos() {
    let parser = MockSwapParser::default()
        .fail_transaction(SwapError::new(SwapFailCode::InvalidTransaction, "bad sig"));
    let (daemon, _) = daemon_with(parser, DaemonConfig::default());
    let trade = accepted(&daemon, "req-1", &["aa:0"]);

    let trade = daemon
        .trades
        .complete_trade(&accept_id(&trade), "0200000001signed")
        .unwrap();
    assert!(trade.is_rejected());
    assert_eq!(trade.status().code, TradeStatusCode::Accepted);
    assert!(daemon.locker.locked_by(trade.id()).is_empty());
}

#[test]
fn expired_trades_release_utxos() {
    let config = DaemonConfig {
        trade_expiry_secs: 2,
        ..Default::default()
    };
    let (daemon, _) = daemon_with(MockSwapParser::default(), config);
    let late = accepted(&daemon, "req-1", &["aa:0"]);
    let idle = accepted(&daemon, "req-2", &["bb:0"]);
    assert!(daemon.trades.expire_trades().unwrap().is_empty());

    std::thread::sleep(Duration::from_millis(3_100));

    assert!(matches!(
        daemon
            .trades
            .complete_trade(&accept_id(&late), "0200000001signed"),
        Err(DaemonError::Core(Error::TradeExpired))
    ));
    let late = daemon.trades.get_trade(late.id()).unwrap();
    assert!(late.is_rejected());
    assert!(late.swap_complete().is_none());
    assert!(daemon.locker.locked_by(late.id()).is_empty());

    let expired = daemon.trades.expire_trades().unwrap();
    let ids: Vec<&str> = expired.iter().map(Trade::id).collect();
    assert!(ids.contains(&idle.id()));
    assert!(ids.contains(&late.id()));
    assert!(daemon.locker.locked_by(idle.id()).is_empty());
    assert_eq!(
        daemon.trades.get_trade(idle.id()).unwrap().status().code,
        TradeStatusCode::Expired
    );
}

#[test]
fn off_price_proposal_never_locks_utxos() {
    let (daemon, _) = daemon();

    let mut drain = request("req-1");
    drain.amount_p = 1;
    drain.amount_r = 99_999;
    let trade = daemon.trades.propose_trade(&drain, &[]).unwrap();
    assert!(trade.is_rejected());
    assert!(daemon
        .trades
        .accept_trade(&accept(&trade, &["aa:0"]))
        .is_err());
    assert!(daemon.locker.locked_by(trade.id()).is_empty());

    // 1% over the preview stays within the default 5% slippage.
    let mut near = request("req-2");
    near.amount_r = 2_463;
    let trade = daemon.trades.propose_trade(&near, &[]).unwrap();
    assert!(!trade.is_rejected());
}

#[test]
fn trades_are_listed_in_pages() {
    let (daemon, _) = daemon();
    for i in 0..3 {
        daemon
            .trades
            .propose_trade(&request(&format!("req-{i}")), &[])
            .unwrap();
    }
    let page = daemon
        .trades
        .list_trades(Some(liquidex_core::Page { number: 2, size: 2 }))
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(daemon.trades.list_trades(None).unwrap().len(), 3);
}

// ── Watcher ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn watcher_settles_confirmed_trades() {
    let config = DaemonConfig {
        watcher_interval_ms: 60_000,
        ..Default::default()
    };
    let (daemon, _) = daemon_with(MockSwapParser::default(), config);
    let trade = accepted(&daemon, "req-1", &["aa:0"]);
    let trade = daemon
        .trades
        .complete_trade(&accept_id(&trade), "0200000001signed")
        .unwrap();

    let chain = Arc::new(StaticChain::new());
    let (handle, mut events) = daemon.start_watcher(chain.clone());
    chain.confirm(trade.tx_id(), 1_700_000_000);
    handle.sweep();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert_eq!(
        event,
        Some(WatcherEvent::TradeSettled {
            trade_id: trade.id().to_string()
        })
    );
    assert!(daemon.trades.get_trade(trade.id()).unwrap().is_settled());

    handle.shutdown();
    let closed = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert_eq!(closed, None);
}

#[tokio::test]
async fn watcher_reports_chain_failures() {
    let config = DaemonConfig {
        watcher_interval_ms: 60_000,
        ..Default::default()
    };
    let (daemon, _) = daemon_with(MockSwapParser::default(), config);
    let trade = accepted(&daemon, "req-1", &["aa:0"]);
    daemon
        .trades
        .complete_trade(&accept_id(&trade), "0200000001signed")
        .unwrap();

    let chain = Arc::new(StaticChain::new());
    chain.set_offline(true);
    let (handle, mut events) = daemon.start_watcher(chain);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert!(matches!(event, Some(WatcherEvent::SweepFailed { .. })));
    handle.shutdown();
}

#[tokio::test]
async fn chain_outage_keeps_completed_trades_settleable() {
    let config = DaemonConfig {
        trade_expiry_secs: 2,
        watcher_interval_ms: 60_000,
        ..Default::default()
    };
    let (daemon, _) = daemon_with(MockSwapParser::default(), config);
    let trade = accepted(&daemon, "req-1", &["aa:0"]);
    let trade = daemon
        .trades
        .complete_trade(&accept_id(&trade), "0200000001signed")
        .unwrap();

    let chain = Arc::new(StaticChain::new());
    chain.confirm(trade.tx_id(), 1_700_000_000);
    chain.set_offline(true);
    tokio::time::sleep(Duration::from_millis(3_100)).await;

    let (handle, mut events) = daemon.start_watcher(chain.clone());
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert!(matches!(event, Some(WatcherEvent::SweepFailed { .. })));
    assert!(daemon.trades.get_trade(trade.id()).unwrap().is_completed());

    chain.set_offline(false);
    handle.sweep();
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert_eq!(
        event,
        Some(WatcherEvent::TradeSettled {
            trade_id: trade.id().to_string()
        })
    );
    let trade = daemon.trades.get_trade(trade.id()).unwrap();
    assert_eq!(trade.status().code, TradeStatusCode::Settled);
    assert!(daemon.locker.locked_by(trade.id()).is_empty());
    handle.shutdown();
}
