mod common;

use account_ledger::StateStore;
use account_ledger::application::AppError;
use anyhow::Result;
use common::{balance_of, memory_service};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_list_releases_cursor_on_success() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;

    assert_eq!(service.list_accounts().await?.len(), 6);
    assert_eq!(store.open_scans(), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_releases_cursor_on_decode_failure() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;
    store.put("account3", b"garbage").await?;

    let err = service.list_accounts().await.unwrap_err();
    assert!(matches!(err, AppError::Decoding { ref key, .. } if key == "account3"));
    assert_eq!(store.open_scans(), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_releases_cursor_on_read_failure_mid_scan() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;

    // Opening the scan and the first two entries succeed, the third fetch fails
    store.fail_reads_after(3)?;

    let err = service.list_accounts().await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
    assert_eq!(store.open_scans(), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_fails_when_scan_cannot_open() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;
    store.fail_reads(true);

    let err = service.list_accounts().await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
    assert_eq!(store.open_scans(), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_preserves_key_order() -> Result<()> {
    let (service, _store) = memory_service();
    for id in ["carol", "alice", "bob"] {
        service.create_account(id, id, dec!(1)).await?;
    }

    let ids: Vec<_> = service
        .list_accounts()
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, ["alice", "bob", "carol"]);

    Ok(())
}

#[tokio::test]
async fn test_empty_value_is_present_but_undecodable() -> Result<()> {
    let (service, store) = memory_service();
    store.put("blank", b"").await?;

    assert!(service.account_exists("blank").await?);
    let err = service.read_account("blank").await.unwrap_err();
    assert!(matches!(err, AppError::Decoding { .. }));

    Ok(())
}

#[tokio::test]
async fn test_initialize_keeps_writes_made_before_failure() -> Result<()> {
    let (service, store) = memory_service();
    store.fail_writes_after(2)?;

    let err = service.initialize_ledger().await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    assert!(service.account_exists("account1").await?);
    assert!(service.account_exists("account2").await?);
    assert!(!service.account_exists("account3").await?);

    Ok(())
}

#[tokio::test]
async fn test_gated_operations_do_not_write_on_rejection() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;
    let writes = store.write_count();

    assert!(matches!(
        service.create_account("account1", "X", dec!(1)).await,
        Err(AppError::AccountAlreadyExists(_))
    ));
    assert!(matches!(
        service.update_account("ghost", "X", dec!(1)).await,
        Err(AppError::AccountNotFound(_))
    ));
    assert!(matches!(
        service.delete_account("ghost").await,
        Err(AppError::AccountNotFound(_))
    ));
    assert!(matches!(
        service.transfer_funds("account1", "account2", dec!(5000)).await,
        Err(AppError::InsufficientFunds { .. })
    ));
    assert!(matches!(
        service.transfer_funds("account1", "account1", dec!(5)).await,
        Err(AppError::SelfTransfer(_))
    ));
    assert!(matches!(
        service.transfer_funds("account1", "account2", dec!(0)).await,
        Err(AppError::InvalidAmount(_))
    ));

    assert_eq!(store.write_count(), writes);

    Ok(())
}

#[tokio::test]
async fn test_store_read_failure_is_not_retried_or_hidden() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;
    store.fail_reads(true);

    assert!(matches!(
        service.account_exists("account1").await,
        Err(AppError::Store(_))
    ));
    assert!(matches!(
        service.read_account("account1").await,
        Err(AppError::Store(_))
    ));
    assert!(matches!(
        service.create_account("new", "X", dec!(1)).await,
        Err(AppError::Store(_))
    ));

    store.fail_reads(false);
    assert!(!service.account_exists("new").await?);

    Ok(())
}

#[tokio::test]
async fn test_transfer_write_failure_surfaces_store_error() -> Result<()> {
    let (service, store) = memory_service();
    service.initialize_ledger().await?;
    store.fail_writes(true);

    let err = service
        .transfer_funds("account1", "account2", dec!(100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    store.fail_writes(false);
    assert_eq!(balance_of(&service, "account1").await?, dec!(1000));
    assert_eq!(balance_of(&service, "account2").await?, dec!(2000));

    Ok(())
}

#[tokio::test]
async fn test_end_to_end_on_memory_store() -> Result<()> {
    let (service, _store) = memory_service();
    service.initialize_ledger().await?;

    service.transfer_funds("account1", "account2", dec!(300)).await?;
    assert_eq!(balance_of(&service, "account1").await?, dec!(700));
    assert_eq!(balance_of(&service, "account2").await?, dec!(2300));

    service.delete_account("account3").await?;
    assert!(matches!(
        service.read_account("account3").await,
        Err(AppError::AccountNotFound(_))
    ));
    assert!(!service.account_exists("account3").await?);

    Ok(())
}
