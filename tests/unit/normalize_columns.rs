//! Column and value properties shared by every normalizer

use econ_data_collector::decode::{decode, DecodedPayload};
use econ_data_collector::normalize::{normalize, DatasetContext, NormalizeError};
use econ_data_collector::{Cell, ProviderKind};
use serde_json::json;

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn bls_payload() -> DecodedPayload {
    DecodedPayload::Json(json!({
        "status": "REQUEST_SUCCEEDED",
        "Results": {"series": [{
            "seriesID": "CUUR0000SA0",
            "catalog": {"series_title": "All items in U.S. city average"},
            "data": [
                {"year": "2024", "period": "M02", "periodName": "February", "latest": "true",
                 "value": "310.326", "footnotes": [{}]},
                {"year": "2024", "period": "M01", "periodName": "January",
                 "value": "308.417", "footnotes": [{"code": "P", "text": "preliminary"}]}
            ]
        }]}
    }))
}

#[test]
fn columns_equal_required_fields_in_order() {
    let ctx = DatasetContext::default();
    for required in [
        fields(&["year", "periodName", "value"]),
        fields(&["value", "year"]),
        fields(&["period"]),
    ] {
        let table = normalize(ProviderKind::Bls, &bls_payload(), &required, &ctx).unwrap();
        assert_eq!(table.columns(), required.as_slice());
        assert!(table.rows().iter().all(|row| row.len() == required.len()));
    }
}

#[test]
fn value_column_is_numeric_for_every_row() {
    let table = normalize(
        ProviderKind::Bls,
        &bls_payload(),
        &fields(&["year", "value"]),
        &DatasetContext::default(),
    )
    .unwrap();

    for row in table.iter() {
        assert!(row.get("value").unwrap().as_f64().is_some());
    }
}

#[test]
fn fred_values_numeric_or_null() {
    let payload = decode(
        &json!({"observations": [
            {"date": "2020-01-01", "value": "3.5"},
            {"date": "2020-04-01", "value": "."},
            {"date": "2020-07-01", "value": ""},
            {"date": "2020-10-01", "value": "-1.25"}
        ]})
        .to_string(),
    )
    .unwrap();

    let table = normalize(
        ProviderKind::FredJson,
        &payload,
        &fields(&["date", "value"]),
        &DatasetContext::default(),
    )
    .unwrap();

    let values: Vec<&Cell> = table.iter().map(|row| row.get("value").unwrap()).collect();
    assert_eq!(
        values,
        vec![&Cell::Number(3.5), &Cell::Null, &Cell::Null, &Cell::Number(-1.25)]
    );
}

#[test]
fn empty_inputs_keep_required_columns() {
    let required = fields(&["date", "value"]);
    let ctx = DatasetContext::default();

    let fred = normalize(
        ProviderKind::FredJson,
        &DecodedPayload::Json(json!({"observations": []})),
        &required,
        &ctx,
    )
    .unwrap();
    assert!(fred.is_empty());
    assert_eq!(fred.columns(), required.as_slice());

    let bls = normalize(
        ProviderKind::Bls,
        &DecodedPayload::Json(json!({"Results": {"series": [{"seriesID": "X", "data": []}]}})),
        &required,
        &ctx,
    )
    .unwrap();
    assert!(bls.is_empty());
    assert_eq!(bls.columns(), required.as_slice());
}

#[test]
fn unknown_required_column_is_error() {
    let err = normalize(
        ProviderKind::Bls,
        &bls_payload(),
        &fields(&["year", "quarter"]),
        &DatasetContext::default(),
    )
    .unwrap_err();
    assert_eq!(err, NormalizeError::MissingColumn("quarter".to_string()));
}

#[test]
fn xml_payload_for_json_kind_is_structure_error() {
    let payload = decode(r#"<observations count="0"/>"#).unwrap();
    let err = normalize(
        ProviderKind::Bls,
        &payload,
        &fields(&["value"]),
        &DatasetContext::default(),
    )
    .unwrap_err();
    assert!(matches!(err, NormalizeError::Structure(_)));
}
