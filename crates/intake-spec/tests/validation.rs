use serde_json::json;

use intake_spec::{Registry, catalog, parse_record, registry_schema, validate};

fn three_step() -> Registry {
    catalog::from_json_str(include_str!("fixtures/three_step.json")).expect("fixture registry")
}

#[test]
fn validation_reports_missing() {
    let registry = three_step();
    let result = validate(&registry, &json!({}));
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["a", "c"]);
}

#[test]
fn validation_accepts_complete_answers() {
    let registry = three_step();
    let result = validate(&registry, &json!({ "a": "Yes", "c": 4 }));
    assert!(result.valid, "{result:?}");
}

#[test]
fn validation_reports_shape_errors_without_double_counting_missing() {
    let registry = three_step();
    let result = validate(&registry, &json!({ "a": "Maybe", "c": 7 }));
    assert!(!result.valid);
    let codes: Vec<_> = result
        .errors
        .iter()
        .filter_map(|error| error.code.as_deref())
        .collect();
    assert_eq!(codes, vec!["option_mismatch", "scale_range"]);
    assert!(result.missing_required.is_empty());
}

#[test]
fn validation_flags_unknown_fields() {
    let registry = three_step();
    let result = validate(&registry, &json!({ "a": "No", "c": 1, "z": true }));
    assert!(!result.valid);
    assert_eq!(result.unknown_fields, vec!["z"]);
}

#[test]
fn blank_text_for_optional_question_is_fine() {
    let registry = three_step();
    let result = validate(&registry, &json!({ "a": "No", "b": "", "c": "2" }));
    assert!(result.valid);
}

#[test]
fn parse_record_keeps_missing_required_for_the_wizard() {
    let registry = three_step();
    let record = parse_record(&registry, &json!({ "a": "Yes" })).expect("record");
    assert!(record.is_answered("a"));
    assert!(!record.is_answered("c"));

    let err = parse_record(&registry, &json!({ "a": 1 })).unwrap_err();
    assert_eq!(err.errors[0].code.as_deref(), Some("type_mismatch"));
}

#[test]
fn schema_describes_questions() {
    let schema = registry_schema();
    let props = schema["properties"].as_object().expect("properties");
    assert!(props.contains_key("questions"));
    assert!(props.contains_key("version"));
}
