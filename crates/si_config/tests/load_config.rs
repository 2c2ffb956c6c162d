// crates/si_config/tests/load_config.rs

//! 配置文件加载测试

use std::io::Write;

use si_config::{ConfigError, EvalConfig};
use si_interp::{InterpolationMethod, VariogramModel};

#[test]
fn test_load_full_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "name": "kriging-6h",
            "target": "wave_height",
            "interpolator": {{
                "kind": "kriging",
                "dimensions": ["lon", "lat", "time_step"],
                "latlon": true,
                "variogram": {{ "model": "exponential", "nugget": 0.1, "sill": 1.0, "range": 300.0 }}
            }},
            "window": "6h",
            "n_jobs": 4,
            "eval_frac": 0.25,
            "seed": 7,
            "support": {{ "min_instant_rows": 5 }},
            "eval_set": {{
                "locations": ["41001", "41002"],
                "partial": {{
                    "storm": {{
                        "locations": ["41001"],
                        "time": {{ "start": "2021-01-01T00:00:00Z", "end": "2021-01-03T00:00:00Z" }}
                    }}
                }}
            }}
        }}"#
    )
    .unwrap();

    let cfg = EvalConfig::from_json_file(file.path()).unwrap();
    assert_eq!(cfg.name, "kriging-6h");
    assert_eq!(cfg.n_jobs, 4);
    assert_eq!(cfg.seed, 7);
    assert_eq!(cfg.support.min_instant_rows, 5);
    assert_eq!(cfg.support.min_slice_rows, 3);
    assert_eq!(cfg.window().unwrap().map(|d| d.num_hours()), Some(6));
    assert!(cfg.interpolator.latlon);
    assert_eq!(
        cfg.interpolator.method,
        InterpolationMethod::Kriging {
            variogram: VariogramModel::exponential(0.1, 1.0, 300.0)
        }
    );
    assert_eq!(cfg.eval_set.location_set().len(), 2);
    assert_eq!(cfg.eval_set.partial["storm"].locations, vec!["41001".to_string()]);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EvalConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"target\": ").unwrap();
    let err = EvalConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
