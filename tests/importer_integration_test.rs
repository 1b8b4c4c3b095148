// ==========================================
// 订单导入集成测试
// ==========================================
// 职责: 验证 文件 → 字段映射 → DQ → 落库 全链路
// ==========================================


use shipment_window::domain::{DqLevel, ShippingStatus};
use shipment_window::importer::OrderImporter;
use std::path::Path;
use test_helpers::{build_api, create_test_db, insert_test_config, local, write_temp_file};

#[tokio::test]
async fn test_csv_import_with_source_aliases() {
    shipment_window::logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    let file = write_temp_file(
        ".csv",
        "id,data_venda,codigo_rastreio,status_envio,descricao_pacote,codigos_agrupados\n\
         P001,2026-01-29 15:30:00,,Pendente,Caneca,\"A1,A2\"\n\
         P002,2026-01-27 09:00:00,BR123,Enviado,Camiseta,\n\
         P003,,,Pendente,Sem data,\n",
    );

    let result = importer.import_file(file.path()).await.unwrap();

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.imported_rows, 2);
    assert_eq!(result.rejected_rows, 1);
    assert_eq!(result.dq_report.summary.errors, 1);
    let error = result
        .dq_report
        .violations
        .iter()
        .find(|v| v.level == DqLevel::Error)
        .unwrap();
    assert_eq!(error.order_id.as_deref(), Some("P003"));
    assert_eq!(error.field, "created_at");

    let p1 = repo.find_by_id("P001").unwrap().unwrap();
    assert_eq!(p1.created_at, local(2026, 1, 29, 15, 30));
    assert_eq!(p1.grouped_codes, vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(p1.shipping_status, ShippingStatus::Pending);

    let p2 = repo.find_by_id("P002").unwrap().unwrap();
    assert_eq!(p2.tracking_code.as_deref(), Some("BR123"));
    assert_eq!(p2.shipping_status, ShippingStatus::Shipped);

    assert!(repo.find_by_id("P003").unwrap().is_none());
}

#[tokio::test]
async fn test_json_import_converts_utc_to_local_weekday() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    // UTC 周五 01:30 = 圣保罗 周四 22:30
    let file = write_temp_file(
        ".json",
        r#"[
            {"id": "J1", "created_at": "2026-01-30T01:30:00+00:00", "codigos_agrupados": ["X1"]},
            {"id": "J2", "created_at": "2026-01-30 01:30:00+00", "codigo_rastreio": null}
        ]"#,
    );

    let result = importer.import_file(file.path()).await.unwrap();
    assert_eq!(result.imported_rows, 2);

    for id in ["J1", "J2"] {
        let order = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(order.created_at, local(2026, 1, 29, 22, 30), "order {}", id);
    }
}

#[tokio::test]
async fn test_configured_offset_is_applied() {
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, "local_utc_offset_minutes", "0").unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    let file = write_temp_file(
        ".json",
        r#"[{"order_id": "U1", "createdAt": "2026-01-30T01:30:00Z"}]"#,
    );
    importer.import_file(file.path()).await.unwrap();

    let order = repo.find_by_id("U1").unwrap().unwrap();
    assert_eq!(order.created_at, local(2026, 1, 30, 1, 30));
}

#[tokio::test]
async fn test_duplicates_and_reimport() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    let first = write_temp_file(
        ".csv",
        "order_id,created_at\nD1,2026-01-26\nD1,2026-01-27\nD2,2026-01-26\n",
    );
    let result = importer.import_file(first.path()).await.unwrap();
    assert_eq!(result.imported_rows, 2);
    assert_eq!(result.dq_report.summary.conflicts, 1);
    let conflict = result
        .dq_report
        .violations
        .iter()
        .find(|v| v.level == DqLevel::Conflict)
        .unwrap();
    assert_eq!(conflict.row_number, 2);
    assert_eq!(repo.find_by_id("D1").unwrap().unwrap().created_at, local(2026, 1, 26, 0, 0));

    // 再次导入覆盖同一订单
    let second = write_temp_file(".csv", "order_id,created_at,tracking_code\nD1,2026-01-26,BR9\n");
    importer.import_file(second.path()).await.unwrap();

    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(
        repo.find_by_id("D1").unwrap().unwrap().tracking_code.as_deref(),
        Some("BR9")
    );
}

#[tokio::test]
async fn test_valid_row_kept_when_earlier_duplicate_is_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    let file = write_temp_file(".csv", "order_id,created_at\nD1,\nD1,2026-01-27\n");
    let result = importer.import_file(file.path()).await.unwrap();

    assert_eq!(result.imported_rows, 1);
    assert_eq!(result.dq_report.summary.errors, 1);
    assert_eq!(result.dq_report.summary.conflicts, 0);
    assert_eq!(
        repo.find_by_id("D1").unwrap().unwrap().created_at,
        local(2026, 1, 27, 0, 0)
    );
}

#[tokio::test]
async fn test_reimport_does_not_clear_tracking() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo.clone());

    let file = write_temp_file(".csv", "order_id,created_at\nD1,2026-01-29 10:00:00\n");
    importer.import_file(file.path()).await.unwrap();
    api.update_tracking("D1", "BR1").await.unwrap();

    importer.import_file(file.path()).await.unwrap();

    let order = repo.find_by_id("D1").unwrap().unwrap();
    assert_eq!(order.tracking_code.as_deref(), Some("BR1"));
    assert!(order.shipped_at.is_some());
    assert_eq!(order.shipping_status, ShippingStatus::Shipped);

    let summary = api.get_bucket_summary("2026-01-29", None).await.unwrap();
    assert_eq!((summary.ready_count, summary.waiting_count), (1, 0));
}

#[tokio::test]
async fn test_unsupported_and_missing_files_fail() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (config, repo, _api) = build_api(&db_path);
    let importer = OrderImporter::new(config, repo);

    let txt = write_temp_file(".txt", "id\n1\n");
    assert!(importer.import_file(txt.path()).await.is_err());
    assert!(importer
        .import_file(Path::new("/nonexistent/orders.csv"))
        .await
        .is_err());
}
