use anyhow::Result;
use gift_farm::{Error, RawNft};

use crate::utils::{
    nft, raw_nft, session, COLLECTION_1_BOUNCEABLE, COLLECTION_1_NON_BOUNCEABLE, COLLECTION_1_RAW,
    COLLECTION_1_TESTNET, COLLECTION_2_RAW, COLLECTION_2_STANDARD, FOREIGN_COLLECTION, HOUR,
};

#[tokio::test]
async fn test_differently_encoded_collections_match_same_entry() -> Result<()> {
    let s = session(vec![
        raw_nft(1, COLLECTION_1_RAW),
        raw_nft(2, COLLECTION_1_BOUNCEABLE),
        raw_nft(3, COLLECTION_1_NON_BOUNCEABLE),
        raw_nft(4, COLLECTION_1_TESTNET),
        raw_nft(5, COLLECTION_2_STANDARD),
    ])?;

    let listing = s.engine.list_farmable().await?;
    assert_eq!(listing.len(), 5);
    for farm_nft in &listing[..4] {
        assert_eq!(farm_nft.collection_address, COLLECTION_1_RAW);
        assert_eq!(farm_nft.collection_name, "TON NFT Collection 1");
    }
    assert_eq!(listing[4].collection_address, COLLECTION_2_RAW);
    assert_eq!(listing[4].collection_name, "TON NFT Collection 2");
    Ok(())
}

#[tokio::test]
async fn test_listing_excludes_foreign_and_malformed() -> Result<()> {
    let s = session(vec![
        raw_nft(1, FOREIGN_COLLECTION),
        raw_nft(2, COLLECTION_1_BOUNCEABLE),
        raw_nft(3, "EQC6zjid8vJNEWqcXk10XjsdDLRKbcPZzbHusuEW6FokOWIn"),
        RawNft {
            address: nft(4),
            collection_address: None,
            metadata: None,
        },
        RawNft {
            address: "garbage".into(),
            collection_address: Some(COLLECTION_1_RAW.into()),
            metadata: None,
        },
        raw_nft(6, COLLECTION_1_RAW),
    ])?;

    let addresses: Vec<String> = s
        .engine
        .list_farmable()
        .await?
        .into_iter()
        .map(|n| n.address)
        .collect();
    assert_eq!(addresses, vec![nft(2), nft(6)]);
    Ok(())
}

#[tokio::test]
async fn test_friendly_nft_addresses_share_ledger_records() -> Result<()> {
    let friendly = gift_farm_types::TonAddress::new(0, [7; 32])
        .to_friendly(gift_farm_types::FriendlyFormat::default());
    let s = session(vec![RawNft {
        address: friendly.clone(),
        collection_address: Some(COLLECTION_1_RAW.into()),
        metadata: None,
    }])?;

    s.engine.start_farming(&nft(7))?;
    s.clock.advance(2 * HOUR);

    let listing = s.engine.list_farmable().await?;
    assert_eq!(listing[0].address, nft(7));
    assert!(listing[0].is_staking);
    assert_eq!(listing[0].accumulated, 2.0);
    assert_eq!(listing[0].metadata.name, "Unnamed NFT");
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_surfaces_as_retryable() -> Result<()> {
    let s = session(vec![raw_nft(1, COLLECTION_1_RAW)])?;
    s.inventory.set_failing(true);

    let err = s.engine.list_farmable().await.unwrap_err();
    assert!(matches!(err, Error::InventoryFetch(_)));
    assert!(err.is_retryable());

    // A caller-side retry succeeds once the provider recovers.
    s.inventory.set_failing(false);
    assert_eq!(s.engine.list_farmable().await?.len(), 1);
    assert_eq!(s.inventory.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_summary_totals() -> Result<()> {
    let s = session(vec![
        raw_nft(1, COLLECTION_1_RAW),
        raw_nft(2, COLLECTION_1_RAW),
        raw_nft(3, COLLECTION_2_RAW),
    ])?;
    s.engine.start_farming(&nft(1))?;
    s.clock.advance(4 * HOUR);
    s.engine.start_farming(&nft(3))?;
    s.clock.advance(HOUR);

    let summary = s.engine.summary().await?;
    assert_eq!(summary.total_nfts, 3);
    assert_eq!(summary.staking_nfts, 2);
    assert_eq!(summary.total_accumulated, 6.0);

    s.inventory.set_items(Vec::new());
    assert_eq!(s.engine.summary().await?.total_nfts, 0);
    Ok(())
}
