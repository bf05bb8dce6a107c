use super::*;
use std::io::Write;

use crate::fixtures::{make_temp_dir, two_tree_model, write_file, write_toy_inputs};
use crate::input::labels::parse_labels;
use crate::input::table::parse_feature_table;

#[test]
fn test_load_input_maps_by_name() {
    let dir = make_temp_dir("input");
    let paths = write_toy_inputs(&dir, &[(0.0, 2.0, 0), (1.0, 1.0, 1)]);
    let bundle = load_input(&paths).unwrap();

    assert_eq!(bundle.features.columns, vec!["AMT_CREDIT", "EXT_SOURCE_2", "FLAG_OWN_CAR"]);
    assert_eq!(bundle.mapping.table_col_by_model_feature, vec![1, 0]);
    assert_eq!(bundle.labels.values, vec![0, 1]);

    let mut row = Vec::new();
    bundle.mapping.model_row(bundle.features.row(0), &mut row);
    assert_eq!(row, vec![0.0, 2.0]);
}

#[test]
fn test_label_count_mismatch() {
    let dir = make_temp_dir("input_mismatch");
    let paths = write_toy_inputs(&dir, &[(0.0, 2.0, 0), (1.0, 1.0, 1)]);
    write_file(&paths.labels, "loan_default\n0\n1\n1\n");
    let err = load_input(&paths).unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}

#[test]
fn test_missing_model_file() {
    let dir = make_temp_dir("input_missing");
    let mut paths = write_toy_inputs(&dir, &[(0.0, 2.0, 0)]);
    paths.model = dir.join("nope.json");
    let err = load_input(&paths).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_table_lacking_model_feature() {
    let model = two_tree_model();
    let table = FeatureTable::from_rows(
        vec!["EXT_SOURCE_2".to_string(), "FLAG_OWN_CAR".to_string()],
        vec![vec![0.1, 1.0]],
    )
    .unwrap();
    let err = map_features(&model, &table).unwrap_err();
    assert!(err.to_string().contains("AMT_CREDIT"));
}

#[test]
fn test_positional_mapping_without_names() {
    let mut model = two_tree_model();
    model.feature_names.clear();
    let table = FeatureTable::from_rows(
        vec!["x".to_string(), "y".to_string(), "z".to_string()],
        vec![vec![0.0, 0.0, 0.0]],
    )
    .unwrap();
    let mapping = map_features(&model, &table).unwrap();
    assert_eq!(mapping.table_col_by_model_feature, vec![0, 1]);

    let narrow =
        FeatureTable::from_rows(vec!["x".to_string()], vec![vec![0.0]]).unwrap();
    assert!(map_features(&model, &narrow).is_err());
}

#[test]
fn test_feature_table_index_column_and_missing_cells() {
    let dir = make_temp_dir("table");
    let path = dir.join("X.csv");
    write_file(
        &path,
        "\u{feff},EXT_SOURCE_2,AMT_CREDIT,\"grade, encoded\"\n0,0.1,,3\n1,NaN,2.5,True\n\n",
    );
    let table = parse_feature_table(&path).unwrap();
    assert_eq!(table.columns, vec!["EXT_SOURCE_2", "AMT_CREDIT", "grade, encoded"]);
    assert_eq!(table.n_rows, 2);
    assert_eq!(table.row(0)[0], 0.1);
    assert!(table.row(0)[1].is_nan());
    assert!(table.row(1)[0].is_nan());
    assert_eq!(table.row(1)[2], 1.0);
}

#[test]
fn test_feature_table_rejects_text() {
    let dir = make_temp_dir("table_text");
    let path = dir.join("X.csv");
    write_file(&path, "EXT_SOURCE_2,grade\n0.1,B\n");
    let err = parse_feature_table(&path).unwrap_err();
    assert!(matches!(err, InputError::Parse(_)));
}

#[test]
fn test_feature_table_gz() {
    let dir = make_temp_dir("table_gz");
    let path = dir.join("X.csv.gz");
    let file = std::fs::File::create(&path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    enc.write_all(b"EXT_SOURCE_2,AMT_CREDIT\n0.5,1.5\n0.25,3\n").unwrap();
    enc.finish().unwrap();

    let table = parse_feature_table(&path).unwrap();
    assert_eq!(table.n_rows, 2);
    assert_eq!(table.row(1), &[0.25, 3.0]);
}

#[test]
fn test_labels_last_column_and_formats() {
    let dir = make_temp_dir("labels");
    let path = dir.join("y.csv");
    write_file(&path, ",loan_default\n0,1\n1,0.0\n2,True\n3,false\n");
    let labels = parse_labels(&path).unwrap();
    assert_eq!(labels.name, "loan_default");
    assert_eq!(labels.values, vec![1, 0, 1, 0]);
    assert_eq!(labels.positives(), 2);

    write_file(&path, "loan_default\n2\n");
    assert!(parse_labels(&path).is_err());
}

#[test]
fn test_feature_table_quoted_header_spans_lines() {
    let dir = make_temp_dir("table_multiline");
    let path = dir.join("X.csv");
    write_file(&path, "EXT_SOURCE_2,\"AMT_CREDIT\nratio\"\n0.1,0.2\n");
    let table = parse_feature_table(&path).unwrap();
    assert_eq!(table.columns, vec!["EXT_SOURCE_2", "AMT_CREDIT\nratio"]);
    assert_eq!(table.n_rows, 1);
    assert_eq!(table.row(0), &[0.1, 0.2]);
}

#[test]
fn test_feature_table_rejects_ragged_rows() {
    let dir = make_temp_dir("table_ragged");
    let path = dir.join("X.csv");
    write_file(&path, "EXT_SOURCE_2,AMT_CREDIT\n0.1,0.2\n0.3\n");
    let err = parse_feature_table(&path).unwrap_err();
    assert!(matches!(err, InputError::Csv(_)));
}
