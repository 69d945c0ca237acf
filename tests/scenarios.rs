// End-to-end flows through the configured inventory, backed by real files

use inventory_ledger::{
    Config, Flow, Inventory, LedgerError, ProductFilter, Registration, SessionContext,
    StoreBackend, Submission, Totals,
};
use std::fs;
use std::path::Path;

fn csv_inventory(dir: &Path) -> Inventory {
    let config = Config {
        store: StoreBackend::Csv {
            path: dir.join("movimentacoes.csv"),
        },
        ..Config::default()
    };
    Inventory::from_config(&config).unwrap()
}

#[test]
fn test_parafuso_register_move_and_reject() {
    let dir = tempfile::tempdir().unwrap();
    let inv = csv_inventory(dir.path());
    let session = SessionContext::authenticated("almoxarifado");
    let now = inv.now();
    let parafuso = ProductFilter::parse("PARAFUSO M8");

    assert!(inv.refresh(&session).unwrap().ledger.is_empty());

    let outcome = inv.register_product(&session, "PARAFUSO M8", now).unwrap();
    assert!(matches!(outcome, Registration::Created(_)));
    let view = inv.refresh(&session).unwrap();
    let names: Vec<&str> = view.products.iter().map(|p| p.as_str()).collect();
    assert_eq!(names, vec!["PARAFUSO M8"]);

    inv.submit_movement(&session, "PARAFUSO M8", Flow::Entry, 100.0, "", now)
        .unwrap();
    assert_eq!(
        inv.refresh(&session).unwrap().totals_for(&parafuso),
        Totals { inflow: 100.0, outflow: 0.0, net: 100.0 }
    );

    inv.submit_movement(&session, "PARAFUSO M8", Flow::Exit, 30.0, "", now)
        .unwrap();
    assert_eq!(inv.refresh(&session).unwrap().totals_for(&parafuso).net, 70.0);

    let before = inv.refresh(&session).unwrap().ledger;
    let outcome = inv
        .submit_movement(&session, "PARAFUSO M8", Flow::Exit, 0.0, "", now)
        .unwrap();
    assert_eq!(outcome, Submission::Rejected);

    let after = inv.refresh(&session).unwrap();
    assert_eq!(after.ledger, before);
    assert_eq!(after.totals_for(&parafuso).net, 70.0);
}

#[test]
fn test_empty_product_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let inv = csv_inventory(dir.path());
    let session = SessionContext::authenticated("almoxarifado");
    let now = inv.now();

    inv.submit_movement(&session, "CAL", Flow::Entry, 10.0, "", now).unwrap();
    let totals = inv.refresh(&session).unwrap().totals;

    let outcome = inv.submit_movement(&session, "", Flow::Entry, 50.0, "", now).unwrap();
    assert_eq!(outcome, Submission::Rejected);

    let view = inv.refresh(&session).unwrap();
    assert_eq!(view.ledger.len(), 1);
    assert_eq!(view.totals, totals);
}

#[test]
fn test_csv_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionContext::authenticated("almoxarifado");

    {
        let inv = csv_inventory(dir.path());
        let now = inv.now();
        inv.register_product(&session, "telha", now).unwrap();
        inv.submit_movement(&session, "TELHA", Flow::Entry, 12.5, "lote 7", now)
            .unwrap();
    }

    let text = fs::read_to_string(dir.path().join("movimentacoes.csv")).unwrap();
    assert!(text.starts_with("Data,Produto,Tipo,Quantidade,Motivo"));
    assert!(text.contains("TELHA,Cadastro,0,Novo Item"));
    assert!(text.contains("TELHA,Entrada,12.5,lote 7"));

    let inv = csv_inventory(dir.path());
    let view = inv.refresh(&session).unwrap();
    assert_eq!(view.ledger.len(), 2);
    assert_eq!(view.totals.net, 12.5);
}

#[test]
fn test_spreadsheet_export_with_blank_rows_loads() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("movimentacoes.csv"),
        "Data,Produto,Tipo,Quantidade,Motivo\n\
         01/03/2026 08:00,AREIA,Cadastro,,Novo Item\n\
         ,,,,\n\
         01/03/2026 08:05,AREIA,Entrada,\"2,5\",\n\
         02/03/2026 17:40,AREIA,Saida,1,obra\n",
    )
    .unwrap();

    let inv = csv_inventory(dir.path());
    let view = inv.refresh(&SessionContext::authenticated("almoxarifado")).unwrap();

    assert_eq!(view.ledger.len(), 3);
    assert_eq!(view.product_count(), 1);
    assert_eq!(view.totals, Totals { inflow: 2.5, outflow: 1.0, net: 1.5 });
}

#[test]
fn test_malformed_row_makes_store_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("movimentacoes.csv"),
        "Data,Produto,Tipo,Quantidade,Motivo\n\
         01/03/2026 08:00,AREIA,Entrada,muito,\n",
    )
    .unwrap();

    let inv = csv_inventory(dir.path());
    let err = inv
        .refresh(&SessionContext::authenticated("almoxarifado"))
        .unwrap_err();
    match err {
        LedgerError::StoreUnavailable { reason } => assert!(reason.contains("line 2")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_import_between_backends() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionContext::authenticated("almoxarifado");

    let csv = csv_inventory(dir.path());
    let now = csv.now();
    csv.register_product(&session, "BRITA", now).unwrap();
    csv.submit_movement(&session, "BRITA", Flow::Entry, 3.0, "", now).unwrap();
    let exported = csv.refresh(&session).unwrap().ledger;

    let config = Config {
        store: StoreBackend::Sqlite {
            path: dir.path().join("estoque.db"),
        },
        ..Config::default()
    };
    let sqlite = Inventory::from_config(&config).unwrap();
    sqlite.import(&session, &exported).unwrap();

    assert_eq!(sqlite.refresh(&session).unwrap().ledger, exported);
}

#[test]
fn test_import_from_missing_file_keeps_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionContext::authenticated("almoxarifado");
    let inv = csv_inventory(dir.path());
    let now = inv.now();

    inv.register_product(&session, "parafuso", now).unwrap();
    inv.submit_movement(&session, "PARAFUSO", Flow::Entry, 100.0, "", now).unwrap();

    let err = inv
        .import_csv(&session, &dir.path().join("typo.csv"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable { .. }));

    let view = inv.refresh(&session).unwrap();
    assert_eq!(view.ledger.len(), 2);
    assert_eq!(view.totals.net, 100.0);
    let text = fs::read_to_string(dir.path().join("movimentacoes.csv")).unwrap();
    assert!(text.contains("PARAFUSO,Entrada,100,"));
}
