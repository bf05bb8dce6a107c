use super::*;

use crate::fixtures::{make_temp_dir, write_toy_inputs};
use crate::pipeline::run_export;

/// Re-reads an export with an independent CSV parser.
fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn wide_rows() -> Vec<(f64, f64, u8)> {
    vec![
        (0.0, 2.0, 0),
        (1.0, 1.0, 1),
        (1.0, 0.2, 0),
        (0.3, 5.0, 1),
        (7.0, 0.0, 0),
        (0.1, 0.1, 0),
    ]
}

/// Adds zero columns for the remaining default vs-score features.
fn write_wide_inputs(dir: &Path) -> crate::input::InputPaths {
    let paths = write_toy_inputs(dir, &wide_rows());
    let text = std::fs::read_to_string(&paths.features).unwrap();
    let mut out = String::new();
    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            out.push_str(&format!(
                "{},EXT_SOURCE_1,EXT_SOURCE_3,DAYS_BIRTH,DAYS_EMPLOYED,AMT_ANNUITY,AMT_GOODS_PRICE\n",
                line
            ));
        } else {
            out.push_str(&format!("{},0,0,0,0,0,0\n", line));
        }
    }
    std::fs::write(&paths.features, out).unwrap();
    paths
}

#[test]
fn test_writes_all_views_with_headers() {
    let dir = make_temp_dir("stage5");
    let paths = write_wide_inputs(&dir);
    let out_dir = dir.join("exports");

    let written = run_export(
        &paths,
        &ExportProfile::default_v1(),
        &out_dir,
        WriteOptions {
            combined_confusion: false,
        },
    )
    .unwrap();
    assert_eq!(written.len(), 7);
    assert!(!out_dir.join(CONFUSION_COMBINED_CSV).exists());

    let n = wide_rows().len();
    let expected: [(&str, &[&str], usize); 6] = [
        (
            GLOBAL_IMPORTANCE_CSV,
            &["feature_name", "mean_abs_shap_value"],
            9,
        ),
        (
            RISK_DISTRIBUTION_CSV,
            &["loan_default_proba", "actual_label", "label"],
            n,
        ),
        // Medium and High are observed, each with all nine features.
        (BANDED_CSV, &["risk_band", "feature", "shap_value"], 18),
        (
            VS_SCORE_CSV,
            &["loan_default_proba", "feature", "shap_value"],
            n * 8,
        ),
        (
            CONFUSION_DETAIL_CSV,
            &["loan_default_proba", "predicted_label", "actual_label"],
            n,
        ),
        (CONFUSION_SUMMARY_CSV, &CONFUSION_SUMMARY_HEADER, 4),
    ];
    for (name, header, rows) in expected {
        let (got_header, got_rows) = read_csv(&out_dir.join(name));
        assert_eq!(got_header, header, "{}", name);
        assert_eq!(got_rows.len(), rows, "{}", name);
        for row in &got_rows {
            assert_eq!(row.len(), header.len(), "{}", name);
        }
    }

    let (_, summary) = read_csv(&out_dir.join(CONFUSION_SUMMARY_CSV));
    let total: usize = summary.iter().map(|r| r[1].parse::<usize>().unwrap()).sum();
    assert_eq!(total, n);
    assert_eq!(summary[0][0], "True Positive");
    assert!(summary.iter().all(|r| r[2].is_empty() && r[3].is_empty() && r[4].is_empty()));
    assert!(summary.iter().all(|r| r[5] == "Summary"));

    let (_, importance) = read_csv(&out_dir.join(GLOBAL_IMPORTANCE_CSV));
    assert_eq!(importance[0][0], "EXT_SOURCE_2");
    let zero_features = importance
        .iter()
        .filter(|r| r[1].parse::<f64>().unwrap() == 0.0)
        .count();
    assert_eq!(zero_features, 7);
}

#[test]
fn test_round_trip_matches_views() {
    let dir = make_temp_dir("stage5_roundtrip");
    let paths = write_wide_inputs(&dir);
    let profile = ExportProfile::default_v1();

    let bundle = crate::input::load_input(&paths).unwrap();
    let scored = crate::pipeline::stage2_score::run_stage2(&bundle, 0.3);
    let explained = crate::pipeline::stage3_explain::run_stage3(&bundle, &scored);
    let views =
        crate::pipeline::stage4_aggregate::run_stage4(&scored, &explained.attributions, &profile)
            .unwrap();
    let input = Stage5Input {
        bundle: &bundle,
        profile: &profile,
        scored: &scored,
        explained: &explained,
        views: &views,
        tool_name: "credit-shap-export".to_string(),
        tool_version: "test".to_string(),
    };
    let out_dir = dir.join("out");
    write_reports(&input, &out_dir, WriteOptions::default()).unwrap();

    let (_, rows) = read_csv(&out_dir.join(BANDED_CSV));
    assert_eq!(rows.len(), views.banded.len());
    for (row, b) in rows.iter().zip(&views.banded) {
        assert_eq!(row[0], b.band.label());
        assert_eq!(row[1], b.feature);
        assert_eq!(row[2].parse::<f64>().unwrap(), b.mean_shap);
    }

    let (_, rows) = read_csv(&out_dir.join(RISK_DISTRIBUTION_CSV));
    for (row, r) in rows.iter().zip(&views.risk_distribution) {
        assert_eq!(row[0].parse::<f32>().unwrap(), r.proba as f32);
        assert_eq!(row[1], r.actual.to_string());
        assert_eq!(row[2], r.label);
    }

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join(RUN_SUMMARY_JSON)).unwrap())
            .unwrap();
    assert_eq!(summary["inputs"]["n_rows"], 6);
    assert_eq!(summary["model"]["n_trees"], 2);
    assert_eq!(summary["confusion"]["true_positive"].as_u64().unwrap() as usize, views.confusion.true_positive);
    assert_eq!(summary["outputs"].as_array().unwrap().len(), 7);
}

#[test]
fn test_combined_confusion_concatenates_under_summary_schema() {
    let dir = make_temp_dir("stage5_combined");
    let paths = write_wide_inputs(&dir);
    let out_dir = dir.join("exports");

    let written = run_export(
        &paths,
        &ExportProfile::default_v1(),
        &out_dir,
        WriteOptions {
            combined_confusion: true,
        },
    )
    .unwrap();
    assert_eq!(written.len(), 8);

    let (header, rows) = read_csv(&out_dir.join(CONFUSION_COMBINED_CSV));
    assert_eq!(header, CONFUSION_SUMMARY_HEADER);
    let n = wide_rows().len();
    assert_eq!(rows.len(), n + 4);
    assert!(rows[..n].iter().all(|r| r[5] == "Prediction" && r[0].is_empty()));
    assert!(rows[n..].iter().all(|r| r[5] == "Summary" && r[2].is_empty()));
}

#[test]
fn test_missing_vs_score_feature_fails_before_writing() {
    let dir = make_temp_dir("stage5_missing");
    let paths = write_toy_inputs(&dir, &wide_rows());
    let out_dir = dir.join("exports");

    let err = run_export(
        &paths,
        &ExportProfile::default_v1(),
        &out_dir,
        WriteOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, crate::pipeline::ExportError::Input(_)));
    assert!(!out_dir.exists());
}
