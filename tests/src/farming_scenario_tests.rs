//! Single-NFT farming lifecycle through the session facade.

use anyhow::Result;
use gift_farm::Error;
use std::time::Duration;

use crate::utils::{nft, raw_nft, session, COLLECTION_1_BOUNCEABLE, HOUR, T0};

#[tokio::test]
async fn test_full_cycle_without_subscription() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_BOUNCEABLE)])?;
    let a1 = nft(1);

    assert_eq!(s.engine.ledger().accumulated(&a1)?, 0.0);
    assert!(s.engine.start_farming(&a1)?);

    s.clock.advance(6 * HOUR);
    assert_eq!(s.engine.ledger().accumulated(&a1)?, 6.0);
    assert!(!s.engine.ledger().can_collect(&a1)?);

    s.clock.advance(6 * HOUR);
    assert_eq!(s.engine.ledger().accumulated(&a1)?, 12.0);
    assert!(s.engine.ledger().can_collect(&a1)?);

    assert_eq!(s.engine.collect_reward(&a1)?, 12.0);
    assert_eq!(s.engine.ledger().accumulated(&a1)?, 0.0);
    assert!(!s.engine.ledger().is_staking(&a1)?);

    let listing = s.engine.list_farmable().await?;
    assert_eq!(listing.len(), 1);
    assert!(!listing[0].is_staking);
    assert_eq!(listing[0].metadata.name, "Gift #1");
    Ok(())
}

#[tokio::test]
async fn test_second_start_keeps_start_time() -> Result<()> {
    let s = session(Vec::new())?;
    let a1 = nft(1);

    assert!(s.engine.start_farming(&a1)?);
    s.clock.advance(3 * HOUR);
    assert!(!s.engine.start_farming(&a1)?);

    let record = s.engine.ledger().farming_state(&a1)?.expect("staking record");
    assert_eq!(record.start_time, Some(T0));
    assert_eq!(s.engine.ledger().accumulated(&a1)?, 3.0);
    Ok(())
}

#[tokio::test]
async fn test_accrual_never_exceeds_cap() -> Result<()> {
    let s = session(Vec::new())?;
    let a1 = nft(1);
    s.engine.start_farming(&a1)?;

    let mut previous = 0.0;
    for _ in 0..48 {
        s.clock.advance(Duration::from_secs(1_337));
        let now = s.engine.ledger().accumulated(&a1)?;
        assert!(now >= previous, "accrual went backwards: {previous} -> {now}");
        previous = now;
    }

    for extra in [12, 13, 24, 24 * 365] {
        s.clock.set(T0 + extra * 3_600_000);
        assert_eq!(s.engine.ledger().accumulated(&a1)?, 12.0);
    }
    Ok(())
}

#[tokio::test]
async fn test_early_collect_is_refused_and_state_kept() -> Result<()> {
    let s = session(Vec::new())?;
    let a1 = nft(1);
    s.engine.start_farming(&a1)?;
    s.clock.advance(11 * HOUR);

    match s.engine.collect_reward(&a1) {
        Err(Error::CollectNotReady(left)) => assert_eq!(left, HOUR),
        other => panic!("expected CollectNotReady, got {other:?}"),
    }
    assert!(s.engine.ledger().is_staking(&a1)?);
    assert_eq!(
        s.engine.ledger().time_until_collectable(&a1)?,
        Some(HOUR)
    );
    Ok(())
}

#[tokio::test]
async fn test_idle_collect_yields_zero() -> Result<()> {
    let s = session(Vec::new())?;
    assert_eq!(s.engine.collect_reward(&nft(9))?, 0.0);
    assert!(s.engine.ledger().farming_state(&nft(9))?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_nft_address_is_rejected() -> Result<()> {
    let s = session(Vec::new())?;
    assert!(matches!(
        s.engine.start_farming("not-an-address"),
        Err(Error::InvalidAddress(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_rapid_starts_from_many_threads() -> Result<()> {
    let s = session(Vec::new())?;
    let a1 = nft(1);

    let transitions = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| s.engine.start_farming(&a1)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect::<Result<Vec<bool>, Error>>()
    })?;

    assert_eq!(transitions.iter().filter(|started| **started).count(), 1);
    Ok(())
}
