//! logloom.toml 통합 설정 테스트
//!
//! - logloom.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logloom_core::config::LogloomConfig;
use logloom_core::error::{ConfigError, LogloomError};

// =============================================================================
// logloom.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("example config should parse");

    // general 기본값 확인
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.general.state_path, "logloom_state.bin");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_correct_miner_defaults() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");

    assert_eq!(config.miner.sim_threshold, 0.5);
    assert_eq!(config.miner.max_depth, 4);
    assert_eq!(config.miner.max_children, 100);
    assert_eq!(config.miner.max_examples, 5);
    assert!(config.miner.parametrize_numeric_tokens);
    // 마스킹 예시는 주석 처리되어 있어야 한다
    assert!(config.miner.masking.is_empty());
}

#[test]
fn example_config_has_correct_strata_defaults() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");

    assert_eq!(config.strata.rare_count_threshold, 2);
    assert_eq!(config.strata.frequency_threshold_percent, 5.0);
}

#[test]
fn example_config_has_correct_llm_defaults() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");

    assert!(config.llm.enabled);
    // 키는 파일이 아닌 환경변수로
    assert!(config.llm.api_key.is_none());
    assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert_eq!(config.llm.temperature, 0.1);
    assert_eq!(config.llm.max_output_tokens, 500);
    assert_eq!(config.llm.timeout_secs, 30);
    assert_eq!(config.llm.max_retries, 2);
    assert_eq!(config.llm.retry_backoff_ms, 500);

    assert!(!config.llm.stages.pre_clustering);
    assert!(config.llm.stages.post_clustering);
    assert!(!config.llm.stages.realtime_classification);
    assert!(!config.llm.stages.semantic_merging);
    assert!(!config.llm.stages.anomaly_explanation);

    assert_eq!(config.llm.limits.max_clusters_to_refine, 2);
    assert_eq!(config.llm.limits.max_clusters_for_merging, 5);
    assert_eq!(config.llm.limits.max_anomalies_to_explain, 1);
    assert_eq!(config.llm.limits.preprocessing_sample_lines, 10);
    assert_eq!(config.llm.limits.realtime_classify_first, 5);
    assert_eq!(config.llm.limits.rare_patterns_in_prompt, 5);
}

#[test]
fn example_config_has_correct_export_defaults() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");

    assert_eq!(config.export.path, "structured_logs.json");
    assert_eq!(config.export.examples_per_template, 3);
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../logloom.toml.example");
    let from_file = LogloomConfig::parse(content).expect("should parse");
    let from_code = LogloomConfig::default();

    // 모든 기본값이 코드 Default 구현과 일치하는지 확인
    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.general.state_path, from_code.general.state_path);

    assert_eq!(from_file.miner.sim_threshold, from_code.miner.sim_threshold);
    assert_eq!(from_file.miner.max_depth, from_code.miner.max_depth);
    assert_eq!(from_file.miner.max_children, from_code.miner.max_children);
    assert_eq!(from_file.miner.max_examples, from_code.miner.max_examples);
    assert_eq!(
        from_file.miner.parametrize_numeric_tokens,
        from_code.miner.parametrize_numeric_tokens
    );

    assert_eq!(
        from_file.strata.rare_count_threshold,
        from_code.strata.rare_count_threshold
    );
    assert_eq!(
        from_file.strata.frequency_threshold_percent,
        from_code.strata.frequency_threshold_percent
    );

    assert_eq!(from_file.llm.enabled, from_code.llm.enabled);
    assert_eq!(from_file.llm.api_key_env, from_code.llm.api_key_env);
    assert_eq!(from_file.llm.model, from_code.llm.model);
    assert_eq!(from_file.llm.temperature, from_code.llm.temperature);
    assert_eq!(from_file.llm.endpoint, from_code.llm.endpoint);
    assert_eq!(
        from_file.llm.stages.post_clustering,
        from_code.llm.stages.post_clustering
    );
    assert_eq!(
        from_file.llm.limits.rare_patterns_in_prompt,
        from_code.llm.limits.rare_patterns_in_prompt
    );

    assert_eq!(from_file.export.path, from_code.export.path);
    assert_eq!(
        from_file.export.examples_per_template,
        from_code.export.examples_per_template
    );
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "pretty"
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "pretty");
    // 나머지 섹션은 기본값
    assert_eq!(config.miner.sim_threshold, 0.5);
    assert_eq!(config.strata.rare_count_threshold, 2);
    assert!(config.llm.enabled);
}

#[test]
fn partial_config_miner_with_masking() {
    let toml = r#"
[miner]
sim_threshold = 0.7
max_depth = 6

[[miner.masking]]
pattern = '\d+\.\d+\.\d+\.\d+'
replacement = "<IP>"

[[miner.masking]]
pattern = '0x[0-9a-fA-F]+'
replacement = "<HEX>"
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.miner.sim_threshold, 0.7);
    assert_eq!(config.miner.max_depth, 6);
    assert_eq!(config.miner.masking.len(), 2);
    assert_eq!(config.miner.masking[0].replacement, "<IP>");
    assert_eq!(config.miner.masking[1].replacement, "<HEX>");
    // 지정하지 않은 필드는 기본값
    assert_eq!(config.miner.max_children, 100);
}

#[test]
fn partial_config_strata_only() {
    let toml = r#"
[strata]
rare_count_threshold = 5
frequency_threshold_percent = 1.0
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.strata.rare_count_threshold, 5);
    assert_eq!(config.strata.frequency_threshold_percent, 1.0);
    // general은 기본값
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn partial_config_stages_section_only() {
    let toml = r#"
[llm.stages]
realtime_classification = true
anomaly_explanation = true
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert!(config.llm.stages.realtime_classification);
    assert!(config.llm.stages.anomaly_explanation);
    // 같은 섹션의 다른 토글과 상위 llm 필드는 기본값
    assert!(config.llm.stages.post_clustering);
    assert!(config.llm.enabled);
    assert_eq!(config.llm.model, "gemini-2.5-pro");
}

#[test]
fn partial_config_limits_section_only() {
    let toml = r#"
[llm.limits]
max_clusters_to_refine = 8
rare_patterns_in_prompt = 12
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.llm.limits.max_clusters_to_refine, 8);
    assert_eq!(config.llm.limits.rare_patterns_in_prompt, 12);
    assert_eq!(config.llm.limits.max_clusters_for_merging, 5);
}

#[test]
fn partial_config_export_only() {
    let toml = r#"
[export]
path = "out/report.json"
examples_per_template = 10
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.export.path, "out/report.json");
    assert_eq!(config.export.examples_per_template, 10);
}

#[test]
fn partial_config_two_sections() {
    let toml = r#"
[general]
log_level = "warn"

[llm]
enabled = false
"#;
    let config = LogloomConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "warn");
    assert!(!config.llm.enabled);
    // 생략된 섹션은 기본값
    assert_eq!(config.miner.max_depth, 4);
    assert_eq!(config.export.examples_per_template, 3);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("LOGLOOM_GENERAL_LOG_LEVEL").ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGLOOM_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = LogloomConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGLOOM_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("LOGLOOM_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let original = std::env::var("LOGLOOM_LLM_MODEL").ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGLOOM_LLM_MODEL", "gemini-2.5-flash");
    }

    let mut config = LogloomConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.llm.model.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGLOOM_LLM_MODEL", val),
            None => std::env::remove_var("LOGLOOM_LLM_MODEL"),
        }
    }

    assert_eq!(result, "gemini-2.5-flash");
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let original = std::env::var("LOGLOOM_STAGES_SEMANTIC_MERGING").ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGLOOM_STAGES_SEMANTIC_MERGING", "true");
    }

    let mut config = LogloomConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.llm.stages.semantic_merging;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGLOOM_STAGES_SEMANTIC_MERGING", val),
            None => std::env::remove_var("LOGLOOM_STAGES_SEMANTIC_MERGING"),
        }
    }

    assert!(result);
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let original = std::env::var("LOGLOOM_EXPORT_EXAMPLES_PER_TEMPLATE").ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGLOOM_EXPORT_EXAMPLES_PER_TEMPLATE", "7");
    }

    let mut config = LogloomConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.export.examples_per_template;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGLOOM_EXPORT_EXAMPLES_PER_TEMPLATE", val),
            None => std::env::remove_var("LOGLOOM_EXPORT_EXAMPLES_PER_TEMPLATE"),
        }
    }

    assert_eq!(result, 7);
}

#[test]
#[serial_test::serial]
fn env_override_nested_limits_section() {
    let toml = r#"
[llm.limits]
max_anomalies_to_explain = 1
"#;

    let original = std::env::var("LOGLOOM_LIMITS_MAX_ANOMALIES_TO_EXPLAIN").ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGLOOM_LIMITS_MAX_ANOMALIES_TO_EXPLAIN", "4");
    }

    let mut config = LogloomConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.llm.limits.max_anomalies_to_explain;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGLOOM_LIMITS_MAX_ANOMALIES_TO_EXPLAIN", val),
            None => std::env::remove_var("LOGLOOM_LIMITS_MAX_ANOMALIES_TO_EXPLAIN"),
        }
    }

    assert_eq!(result, 4);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    let toml = r#"
[general]
log_level = "warn"
"#;

    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("LOGLOOM_GENERAL_LOG_LEVEL");
    }

    let mut config = LogloomConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = LogloomConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.miner.sim_threshold, 0.5);
    assert!(config.llm.enabled);
}

#[test]
fn whitespace_only_parses_with_defaults() {
    let config = LogloomConfig::parse("   \n\n  \t  ").expect("whitespace should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 이것은 주석입니다
# 모든 줄이 주석입니다
"#;
    let config = LogloomConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn malformed_toml_returns_parse_error() {
    let result = LogloomConfig::parse("[invalid toml");
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        LogloomError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn invalid_type_returns_parse_error() {
    let toml = r#"
[llm]
enabled = "not_a_bool"
"#;
    let result = LogloomConfig::parse(toml);
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        LogloomError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[miner]
max_depth = "four"
"#;
    let result = LogloomConfig::parse(toml);
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        LogloomError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_section_is_ignored() {
    // deny_unknown_fields를 쓰지 않으므로 모르는 섹션은 무시된다
    let toml = r#"
[general]
log_level = "info"

[unknown_section]
foo = "bar"
"#;
    let config = LogloomConfig::parse(toml).expect("unknown section should be ignored");
    assert_eq!(config.general.log_level, "info");
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = LogloomConfig::from_file("/tmp/logloom_test_nonexistent_12345.toml").await;
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        LogloomError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn load_example_config_from_disk() {
    // logloom.toml.example이 프로젝트 루트에 존재한다고 가정
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let example_path = format!("{}/../../logloom.toml.example", manifest_dir);

    let result = LogloomConfig::from_file(&example_path).await;
    match result {
        Ok(config) => {
            config.validate().expect("loaded example should validate");
            assert_eq!(config.general.log_level, "info");
        }
        Err(LogloomError::Config(ConfigError::FileNotFound { .. })) => {
            // CI 환경에서 파일이 없을 수 있음
            eprintln!(
                "skipped: logloom.toml.example not found at {}",
                example_path
            );
        }
        Err(e) => panic!("unexpected error: {}", e),
    }
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn serialize_and_reparse_roundtrip() {
    let original = LogloomConfig::default();
    let toml_str = toml::to_string_pretty(&original).expect("should serialize");
    let parsed = LogloomConfig::parse(&toml_str).expect("should reparse");
    parsed.validate().expect("reparsed should validate");

    assert_eq!(original.general.log_level, parsed.general.log_level);
    assert_eq!(original.miner.sim_threshold, parsed.miner.sim_threshold);
    assert_eq!(
        original.strata.rare_count_threshold,
        parsed.strata.rare_count_threshold
    );
    assert_eq!(original.llm.model, parsed.llm.model);
    assert_eq!(original.export.path, parsed.export.path);
}

#[test]
fn example_config_serialize_roundtrip() {
    let content = include_str!("../../../logloom.toml.example");
    let config = LogloomConfig::parse(content).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = LogloomConfig::parse(&serialized).expect("should reparse");
    reparsed.validate().expect("should validate");

    assert_eq!(config.general.log_level, reparsed.general.log_level);
    assert_eq!(config.miner.max_children, reparsed.miner.max_children);
}
