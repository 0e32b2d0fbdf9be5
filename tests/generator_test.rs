use assert_cmd::cargo_bin;
use std::process::Command;

mod common;

#[test]
fn test_generate_simple_csv() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_events_csv(file.path(), 5).expect("Failed to generate CSV");

    let content = std::fs::read_to_string(file.path()).expect("Failed to read file");
    // Header + 5 rows = 6 lines
    assert_eq!(content.lines().count(), 6);
}

#[test]
fn test_random_events_conserve_stock() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_events_csv(file.path(), 300).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("brewpay"))
        .arg(file.path())
        .arg("--stock")
        .arg("50=5,20=10,10=10,5=10")
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 300);

    let initial_value: i64 = 5 * 50 + 10 * 20 + 10 * 10 + 10 * 5;
    let mut committed: i64 = 0;
    for outcome in outcomes {
        let states = outcome["states"].as_array().unwrap();
        assert_eq!(states.last().unwrap(), "done");

        if outcome["brewed"] == true {
            assert!(outcome["rejection"].is_null());
        } else {
            assert!(outcome["delta"].as_object().unwrap().is_empty());
        }

        for (coin, count) in outcome["delta"].as_object().unwrap() {
            committed += coin.parse::<i64>().unwrap() * count.as_i64().unwrap();
        }

        let change: i64 = outcome["change"]
            .as_object()
            .unwrap()
            .iter()
            .map(|(coin, count)| coin.parse::<i64>().unwrap() * count.as_i64().unwrap())
            .sum();
        if outcome["method"] == "coins" && outcome["brewed"] == true && outcome["change_shortfall"].is_null() {
            assert_eq!(outcome["paid"].as_i64().unwrap() - change, 50);
        }
    }

    let final_value: i64 = report["stock"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(coin, count)| coin.parse::<i64>().unwrap() * count.as_i64().unwrap())
        .sum();
    assert_eq!(final_value, initial_value + committed);
}
