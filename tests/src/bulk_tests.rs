//! Premium bulk actions over the owner's listing.

use anyhow::Result;
use gift_farm::Error;

use crate::utils::{nft, raw_nft, session, COLLECTION_1_RAW, FOREIGN_COLLECTION, HOUR, T0};

#[tokio::test]
async fn test_bulk_actions_need_subscription() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_RAW)])?;
    assert!(matches!(
        s.engine.start_all_farming().await,
        Err(Error::PremiumRequired)
    ));
    assert!(matches!(
        s.engine.collect_all_rewards().await,
        Err(Error::PremiumRequired)
    ));
    // The gate is checked before touching the inventory.
    assert_eq!(s.inventory.calls(), 0);
    assert!(!s.engine.ledger().is_staking(&nft(1))?);
    Ok(())
}

#[tokio::test]
async fn test_start_all_leaves_staking_nfts_untouched() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_RAW), raw_nft(2, COLLECTION_1_RAW)])?;
    s.engine.purchase_subscription().await?;
    s.engine.start_farming(&nft(1))?;
    s.clock.advance(HOUR);

    let report = s.engine.start_all_farming().await?;
    assert_eq!(report.started, vec![nft(2)]);
    assert_eq!(report.already_staking, vec![nft(1)]);
    assert!(report.failures.is_empty());

    let a = s.engine.ledger().farming_state(&nft(1))?.expect("A staking");
    let b = s.engine.ledger().farming_state(&nft(2))?.expect("B staking");
    assert_eq!(a.start_time, Some(T0));
    assert_eq!(b.start_time, Some(T0 + 3_600_000));
    Ok(())
}

#[tokio::test]
async fn test_collect_all_sums_ready_nfts_only() -> Result<()> {
    let s = session(vec![
        raw_nft(1, COLLECTION_1_RAW),
        raw_nft(2, COLLECTION_1_RAW),
        raw_nft(3, COLLECTION_1_RAW),
        raw_nft(4, FOREIGN_COLLECTION),
    ])?;
    s.engine.purchase_subscription().await?;

    s.engine.start_farming(&nft(1))?;
    s.engine.start_farming(&nft(4))?;
    s.clock.advance(6 * HOUR);
    s.engine.start_farming(&nft(2))?;
    s.clock.advance(6 * HOUR);

    let report = s.engine.collect_all_rewards().await?;
    assert_eq!(report.collected, vec![(nft(1), 18.0)]);
    assert_eq!(report.total, 18.0);
    assert_eq!(report.skipped, vec![nft(2), nft(3)]);

    // Not allow-listed, so never part of the batch.
    assert!(s.engine.ledger().is_staking(&nft(4))?);
    assert!(s.engine.ledger().is_staking(&nft(2))?);
    assert!(!s.engine.ledger().is_staking(&nft(1))?);
    Ok(())
}

#[tokio::test]
async fn test_collect_all_with_nothing_ready_is_zero() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_RAW)])?;
    s.engine.purchase_subscription().await?;
    let report = s.engine.collect_all_rewards().await?;
    assert_eq!(report.total, 0.0);
    assert!(report.collected.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_bulk_propagates_inventory_failure() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_RAW)])?;
    s.engine.purchase_subscription().await?;
    s.inventory.set_failing(true);
    assert!(matches!(
        s.engine.start_all_farming().await,
        Err(Error::InventoryFetch(_))
    ));
    Ok(())
}
