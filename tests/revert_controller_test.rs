// ==========================================
// 工程项目管理系统 - 批次回滚控制器集成测试
// ==========================================
// 覆盖: 软删除回滚、重复回滚显式拒绝、白名单、批次隔离
// ==========================================

mod test_helpers;

use pmis_import_engine::domain::batch::ImportBatch;
use pmis_import_engine::domain::record::ResolvedContact;
use pmis_import_engine::domain::types::{BatchStatus, EntityKind};
use pmis_import_engine::engine::revert::{RevertController, RevertError};
use pmis_import_engine::repository::{ImportRepository, ImportRepositoryImpl};
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::*;

fn contact(row_number: usize, name: &str, email: &str) -> ResolvedContact {
    ResolvedContact {
        row_number,
        name: name.to_string(),
        email: Some(email.to_string()),
        phone: None,
        position: None,
        address: None,
        note: None,
    }
}

/// 直接经由仓储预置一个已完成的联系人批次
async fn seed_contact_batch(
    repo: &ImportRepositoryImpl,
    batch_id: &str,
    contacts: Vec<ResolvedContact>,
) {
    let batch = ImportBatch {
        batch_id: batch_id.to_string(),
        organization_id: ORG.to_string(),
        entity_type: EntityKind::Contacts,
        record_count: contacts.len() as i64,
        status: BatchStatus::Completed,
        created_by: ACTOR.to_string(),
        created_at: Utc::now(),
    };

    repo.commit_contact_batch(batch, contacts)
        .await
        .expect("批次预置失败");
}

fn make_repo(conn: &Arc<Mutex<Connection>>) -> Arc<ImportRepositoryImpl> {
    Arc::new(ImportRepositoryImpl::from_connection(Arc::clone(conn)))
}

#[tokio::test]
async fn test_revert_soft_deletes_and_flips_status() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(
        repo.as_ref(),
        "batch-1",
        vec![
            contact(1, "甲", "a@acme.com"),
            contact(2, "乙", "b@acme.com"),
            contact(3, "丙", "c@acme.com"),
        ],
    )
    .await;

    let controller = RevertController::new(Arc::clone(&repo));
    let outcome = controller
        .revert("batch-1", "contacts")
        .await
        .expect("回滚应成功");

    assert!(outcome.success);
    assert_eq!(outcome.reverted_rows, 3);

    // 记录只软删除,审计痕迹保留
    let (live, deleted) = count_by_batch(&conn, "contacts", "batch-1");
    assert_eq!(live, 0);
    assert_eq!(deleted, 3);
    assert_eq!(batch_status(&conn, "batch-1"), BatchStatus::Reverted.as_str());
}

#[tokio::test]
async fn test_second_revert_explicitly_rejected() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(repo.as_ref(), "batch-1", vec![contact(1, "甲", "a@acme.com")]).await;

    let controller = RevertController::new(Arc::clone(&repo));
    controller
        .revert("batch-1", "contacts")
        .await
        .expect("首次回滚应成功");

    let err = controller
        .revert("batch-1", "contacts")
        .await
        .expect_err("重复回滚必须显式拒绝");

    assert!(matches!(err, RevertError::AlreadyReverted(_)));
    assert!(err.is_client_fault());

    // 记录状态未被二次触碰
    let (live, deleted) = count_by_batch(&conn, "contacts", "batch-1");
    assert_eq!(live, 0);
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn test_disallowed_table_touches_nothing() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(repo.as_ref(), "batch-1", vec![contact(1, "甲", "a@acme.com")]).await;

    let controller = RevertController::new(Arc::clone(&repo));
    let err = controller
        .revert("batch-1", "clients")
        .await
        .expect_err("参照表必须被白名单拒绝");

    assert!(matches!(err, RevertError::TableNotAllowed(_)));

    // 批次与记录完全未动
    let (live, deleted) = count_by_batch(&conn, "contacts", "batch-1");
    assert_eq!(live, 1);
    assert_eq!(deleted, 0);
    assert_eq!(batch_status(&conn, "batch-1"), BatchStatus::Completed.as_str());
}

#[tokio::test]
async fn test_table_mismatch_rejected() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(repo.as_ref(), "batch-1", vec![contact(1, "甲", "a@acme.com")]).await;

    let controller = RevertController::new(Arc::clone(&repo));
    let err = controller
        .revert("batch-1", "client_payments")
        .await
        .expect_err("实体种类不匹配必须拒绝");

    assert!(matches!(err, RevertError::TableMismatch { .. }));

    let (live, _) = count_by_batch(&conn, "contacts", "batch-1");
    assert_eq!(live, 1);
}

#[tokio::test]
async fn test_missing_batch_rejected() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);

    let controller = RevertController::new(repo);
    let err = controller
        .revert("no-such-batch", "contacts")
        .await
        .expect_err("不存在的批次必须拒绝");

    assert!(matches!(err, RevertError::BatchNotFound(_)));
}

#[tokio::test]
async fn test_revert_isolates_other_batches() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(
        repo.as_ref(),
        "batch-a",
        vec![contact(1, "甲", "a@acme.com"), contact(2, "乙", "b@acme.com")],
    )
    .await;
    seed_contact_batch(repo.as_ref(), "batch-b", vec![contact(1, "丙", "c@acme.com")]).await;

    let controller = RevertController::new(Arc::clone(&repo));
    let outcome = controller
        .revert("batch-a", "contacts")
        .await
        .expect("回滚应成功");
    assert_eq!(outcome.reverted_rows, 2);

    // 另一批次不受影响
    let (live_b, deleted_b) = count_by_batch(&conn, "contacts", "batch-b");
    assert_eq!(live_b, 1);
    assert_eq!(deleted_b, 0);
    assert_eq!(batch_status(&conn, "batch-b"), BatchStatus::Completed.as_str());
}

#[tokio::test]
async fn test_count_rows_by_batch_reflects_soft_delete() {
    let (_file, conn) = create_test_db();
    let repo = make_repo(&conn);
    seed_contact_batch(
        repo.as_ref(),
        "batch-1",
        vec![contact(1, "甲", "a@acme.com"), contact(2, "乙", "b@acme.com")],
    )
    .await;

    let (live, deleted) = repo
        .count_rows_by_batch("batch-1", EntityKind::Contacts)
        .await
        .expect("统计失败");
    assert_eq!((live, deleted), (2, 0));

    RevertController::new(Arc::clone(&repo))
        .revert("batch-1", "contacts")
        .await
        .expect("回滚应成功");

    let (live, deleted) = repo
        .count_rows_by_batch("batch-1", EntityKind::Contacts)
        .await
        .expect("统计失败");
    assert_eq!((live, deleted), (0, 2));
}
