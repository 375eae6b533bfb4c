// tests/mock_mode.rs
use ludi_enrich::{EnrichConfig, EnrichRuntime};
use std::env;

#[tokio::test]
#[serial_test::serial]
async fn mock_mode_runs_without_api_key() {
    env::set_var("ENRICH_TEST_MODE", "mock");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(
        &input,
        "Name,City,State,Email,Phone Number 1,Phone Number 2\nMaria,Recife,PE,maria@x.com,111,\n",
    )
    .unwrap();

    let cfg = EnrichConfig {
        input_path: input,
        output_path: dir.path().join("nested/output.json"),
        ..EnrichConfig::default()
    };
    let rt = EnrichRuntime::from_config(cfg).unwrap();
    let report = rt.run().await.unwrap();
    env::remove_var("ENRICH_TEST_MODE");

    assert_eq!(report.written, 1);
    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(rt.output_path()).unwrap()).unwrap();
    assert_eq!(v[0]["artisan_profile"]["name"], "Maria");
    assert_eq!(v[0]["craft_details"]["craft_category"], "Handicraft (mock)");
}
