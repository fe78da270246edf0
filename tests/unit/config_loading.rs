use econ_data_collector::config::{CollectorConfig, ConfigError};
use econ_data_collector::{ProviderKind, RequestMethod};
use serde_json::json;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

#[test]
fn load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &json!({
            "BLS": {
                "api_url": "https://api.bls.gov/publicAPI/v2/timeseries/data/",
                "api_key_env_var": "BLS_API_KEY",
                "provider_kind": "bls",
                "datasets": {
                    "CPI": {
                        "payload": {"seriesid": ["CUUR0000SA0"], "startyear": "2020", "endyear": "2024"},
                        "required_fields": ["year", "periodName", "value"]
                    }
                }
            }
        }),
    );

    let config = CollectorConfig::load(&path).unwrap();
    let (endpoint, cpi) = config.dataset("CPI").unwrap();

    assert_eq!(endpoint.credential_env_var, "BLS_API_KEY");
    assert_eq!(endpoint.credential_field_name, "registrationkey");
    assert_eq!(cpi.request_method, RequestMethod::Post);
    assert_eq!(cpi.provider_kind, ProviderKind::Bls);
    assert_eq!(cpi.output_file_name(), "cpi_data.csv");
}

#[test]
fn fred_apis_send_api_key() {
    let config = CollectorConfig::from_json_str(
        &json!({
            "FRED": {
                "api_url": "https://api.stlouisfed.org/fred/series/observations",
                "api_key_env_var": "FRED_API_KEY",
                "method": "GET",
                "datasets": {
                    "GDP": {
                        "provider_kind": "fred_xml",
                        "payload": {"series_id": "GDP", "file_type": "xml"},
                        "required_fields": ["date", "value"]
                    }
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let (endpoint, gdp) = config.dataset("GDP").unwrap();
    assert_eq!(endpoint.credential_field_name, "api_key");
    assert_eq!(gdp.provider_kind, ProviderKind::FredXml);
}

#[test]
fn explicit_credential_field_wins() {
    let config = CollectorConfig::from_json_str(
        &json!({
            "Mixed": {
                "api_url": "https://example.test/api",
                "api_key_env_var": "MIXED_KEY",
                "credential_field": "token",
                "datasets": {
                    "A": {"provider_kind": "bls", "payload": {}, "required_fields": ["value"]},
                    "B": {"provider_kind": "fred_json", "payload": {}, "required_fields": ["value"]}
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    assert_eq!(config.apis()[0].endpoint.credential_field_name, "token");
}

#[test]
fn mixed_families_need_explicit_field() {
    let err = CollectorConfig::from_json_str(
        &json!({
            "Mixed": {
                "api_url": "https://example.test/api",
                "api_key_env_var": "MIXED_KEY",
                "datasets": {
                    "A": {"provider_kind": "bls", "payload": {}, "required_fields": ["value"]},
                    "B": {"provider_kind": "fred_json", "payload": {}, "required_fields": ["value"]}
                }
            }
        })
        .to_string(),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn missing_required_fields_rejected() {
    let err = CollectorConfig::from_json_str(
        &json!({
            "BLS": {
                "api_url": "https://api.bls.gov/publicAPI/v2/timeseries/data/",
                "api_key_env_var": "BLS_API_KEY",
                "provider_kind": "bls",
                "datasets": {"CPI": {"payload": {}, "required_fields": []}}
            }
        })
        .to_string(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::MissingKey { key: "required_fields", .. }
    ));
}

#[test]
fn unknown_provider_kind_rejected() {
    let err = CollectorConfig::from_json_str(
        &json!({
            "WB": {
                "api_url": "https://api.worldbank.org/v2",
                "api_key_env_var": "WB_KEY",
                "provider_kind": "worldbank",
                "datasets": {"GNI": {"payload": {}, "required_fields": ["value"]}}
            }
        })
        .to_string(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("worldbank"));
}

#[test]
fn duplicate_output_files_rejected() {
    let err = CollectorConfig::from_json_str(
        &json!({
            "BLS": {
                "api_url": "https://api.bls.gov/publicAPI/v2/timeseries/data/",
                "api_key_env_var": "BLS_API_KEY",
                "provider_kind": "bls",
                "datasets": {"CPI": {"payload": {}, "required_fields": ["value"]}}
            },
            "FRED": {
                "api_url": "https://api.stlouisfed.org/fred/series/observations",
                "api_key_env_var": "FRED_API_KEY",
                "provider_kind": "fred_json",
                "datasets": {"cpi": {"payload": {}, "required_fields": ["value"]}}
            }
        })
        .to_string(),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::DuplicateDataset { .. }));
}

#[test]
fn missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = CollectorConfig::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_json_is_parse_error() {
    let err = CollectorConfig::from_json_str("{\"BLS\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
