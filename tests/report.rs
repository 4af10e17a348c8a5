use std::path::Path;
use std::sync::{Arc, Mutex};

use basket_report::{
    build_report, flatten_files, master_table, read_reference, run, transaction_files, Cell,
    Config, Error, TRANSACTIONS_FILE,
};
use tempfile::TempDir;

/// Lay out a run's inputs under a temporary folder: one sub-folder per transaction batch.
fn fixture(customers: &str, products: &str, batches: &[(&str, &str)]) -> (TempDir, Config) {
    let root = tempfile::tempdir().expect("tmp");
    let config = Config {
        customers_location: root.path().join("customers.csv"),
        products_location: root.path().join("products.csv"),
        transactions_location: root.path().join("transactions"),
        output_location: root.path().join("outputs"),
    };
    std::fs::write(&config.customers_location, customers).expect("customers");
    std::fs::write(&config.products_location, products).expect("products");
    std::fs::create_dir(&config.transactions_location).expect("transactions");
    for (batch, content) in batches {
        let folder = config.transactions_location.join(batch);
        std::fs::create_dir(&folder).expect("batch folder");
        std::fs::write(folder.join(TRANSACTIONS_FILE), content).expect("batch");
    }
    (root, config)
}

/// A log sink shared with the subscriber installed by [with_captured_logs].
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("logs").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8(logs.0.lock().expect("logs").clone()).expect("utf-8 logs");
    (result, output)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("output")
}

#[test]
fn single_customer_report() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\nC1,gold\n",
        "product_id,product_category,product_description\nP1,snacks,chips\n",
        &[(
            "C1",
            r#"{"customer_id":"C1","date_of_purchase":"2023-01-01","basket":[{"product_id":"P1"},{"product_id":"P1"}]}"#,
        )],
    );

    let (report, paths) = run(&config).expect("run");
    assert_eq!(report.aggregates.len(), 1);
    assert_eq!(report.aggregates.rows()[0].purchase_count, 2);

    assert_eq!(
        read(&paths.csv),
        ",customer_id,loyalty_score,product_id,product_category,product_description,purchase_count\n\
         0,C1,gold,P1,snacks,chips,2\n"
    );
    let json: serde_json::Value = serde_json::from_str(&read(&paths.json)).expect("json");
    assert_eq!(
        json,
        serde_json::json!({
            "C1": {
                "loyalty_score": "gold",
                "product_data": [{
                    "product_id": "P1",
                    "product_category": "snacks",
                    "product_description": "chips",
                    "purchase_count": 2
                }]
            }
        })
    );
    assert!(read(&paths.json).starts_with("{\n  \"C1\": {\n    \"loyalty_score\""));
}

#[test]
fn missing_batch_file_is_skipped() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\nC1,4\nC2,2\n",
        "product_id,product_category,product_description,price\nP1,snacks,chips,1.5\nP2,drinks,soda,2.0\n",
        &[
            (
                "a",
                r#"{"customer_id":"C1","date_of_purchase":"2023-01-01 10:12:00","basket":[{"product_id":"P1"},{"product_id":"P2"}]}"#,
            ),
            (
                "c",
                r#"{"customer_id":"C2","date_of_purchase":"2023-01-02 08:00:00","basket":[{"product_id":"P2"}]}"#,
            ),
        ],
    );
    // A batch folder without its transactions file
    std::fs::create_dir(config.transactions_location.join("b")).expect("empty batch");

    assert_eq!(
        transaction_files(&config.transactions_location)
            .expect("discover")
            .len(),
        3
    );
    let (report, logs) = with_captured_logs(|| build_report(&config));
    let report = report.expect("report");
    let missing = config.transactions_location.join("b").join(TRANSACTIONS_FILE);
    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("transaction file is not present"), "{}", logs);
    assert!(logs.contains(&missing.display().to_string()), "{}", logs);

    let customers: Vec<_> = report.documents.iter().map(|(id, _)| id).collect();
    assert_eq!(customers, ["C1", "C2"]);
    assert_eq!(
        report.documents.get("C1").expect("C1").loyalty_score,
        Cell::Int(4)
    );
    assert_eq!(report.aggregates.len(), 3);
}

#[test]
fn row_counts_are_preserved() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\nC1,4\n",
        "product_id,product_category,product_description\nP1,snacks,chips\n",
        &[(
            "batch",
            concat!(
                r#"{"customer_id":"C1","date_of_purchase":"2023-01-01","basket":[{"product_id":"P1"},{"product_id":"P9"},{"product_id":"P1"}]}"#,
                "\n",
                r#"{"customer_id":"C7","date_of_purchase":"2023-01-02","basket":[]}"#,
                "\n",
                r#"{"customer_id":"C7","date_of_purchase":"2023-01-03","basket":[{"product_id":"P1"}]}"#,
                "\n",
            ),
        )],
    );

    let files = transaction_files(&config.transactions_location).expect("discover");
    let transactions = flatten_files(&files).expect("flatten");
    assert_eq!(transactions.len(), 4);

    let customers = read_reference(read(&config.customers_location).as_bytes(), "customers")
        .expect("customers");
    let products =
        read_reference(read(&config.products_location).as_bytes(), "products").expect("products");
    let master = master_table(&transactions, &customers, &products).expect("master");
    assert_eq!(master.len(), transactions.len());

    let report = build_report(&config).expect("report");
    let total: u64 = report
        .aggregates
        .rows()
        .iter()
        .map(|row| row.purchase_count)
        .sum();
    assert_eq!(total, 4);
    assert_eq!(report.documents.get("C7").expect("C7").loyalty_score, Cell::Null);
}

#[test]
fn numeric_looking_ids_are_joined() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\n1001,gold\n007,silver\n",
        "product_id,product_category,product_description\n42,snacks,chips\n",
        &[
            (
                "a",
                r#"{"customer_id":"1001","date_of_purchase":"2023-01-01","basket":[{"product_id":"42"}]}"#,
            ),
            (
                "b",
                r#"{"customer_id":"007","date_of_purchase":"2023-01-02","basket":[{"product_id":42}]}"#,
            ),
        ],
    );

    let (report, paths) = run(&config).expect("run");
    let gold = report.documents.get("1001").expect("1001");
    assert_eq!(gold.loyalty_score, Cell::from("gold"));
    assert_eq!(gold.product_data[0].product_category, Cell::from("snacks"));
    let silver = report.documents.get("007").expect("007");
    assert_eq!(silver.loyalty_score, Cell::from("silver"));
    assert_eq!(silver.product_data[0].product_category, Cell::from("snacks"));
    assert_eq!(
        read(&paths.csv),
        ",customer_id,loyalty_score,product_id,product_category,product_description,purchase_count\n\
         0,007,silver,42,snacks,chips,1\n\
         1,1001,gold,42,snacks,chips,1\n"
    );
}

#[test]
fn run_without_purchases_writes_empty_outputs() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\nC1,4\n",
        "product_id,product_category,product_description\nP1,snacks,chips\n",
        &[(
            "a",
            r#"{"customer_id":"C1","date_of_purchase":"2023-01-01","basket":[]}"#,
        )],
    );
    // Only a folder without its transactions file besides the empty basket
    std::fs::create_dir(config.transactions_location.join("b")).expect("empty batch");

    let (report, paths) = run(&config).expect("run");
    assert!(report.aggregates.is_empty());
    assert!(report.documents.is_empty());
    assert_eq!(
        read(&paths.csv),
        ",customer_id,loyalty_score,product_id,product_category,product_description,purchase_count\n"
    );
    let json: serde_json::Value = serde_json::from_str(&read(&paths.json)).expect("json");
    assert_eq!(json, serde_json::json!({}));
}

#[test]
fn malformed_transaction_fails_the_run() {
    let (_root, config) = fixture(
        "customer_id,loyalty_score\nC1,4\n",
        "product_id,product_category,product_description\nP1,snacks,chips\n",
        &[("batch", "{\"customer_id\": \"C1\", \"basket\": [\n")],
    );

    let error = run(&config).unwrap_err();
    assert!(matches!(error, Error::Json { line: 1, .. }));
    assert!(!config.output_csv_path().exists());
}
