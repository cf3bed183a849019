//! Property tests for search argument classification

use super::*;
use proptest::prelude::*;

fn arb_non_numeric_term() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 _-]{0,30}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Non-negative integers always classify as identifiers
    #[test]
    fn prop_integers_are_identifiers(id in 0i64..i64::MAX) {
        prop_assert_eq!(classify(&json!(id)), Ok(Some(Lookup::Identifier(id))));
    }

    // Digit strings normalize to the same id as the number itself
    #[test]
    fn prop_digit_strings_are_identifiers(id in 0i64..1_000_000_000_000) {
        let args = normalize(
            "search_ghostwriter_reports",
            ArgumentRule::SearchTerm,
            json!({ "search_term": id.to_string() }),
            &ArgumentMemory::default(),
        );
        prop_assert_eq!(args.ok(), Some(json!({ "id": id })));
    }

    // Any string with a non-digit character is passed through as a search term
    #[test]
    fn prop_text_is_search_term(term in arb_non_numeric_term()) {
        let args = normalize(
            "search_ghostwriter_clients",
            ArgumentRule::SearchTerm,
            json!({ "__arg1": term.clone() }),
            &ArgumentMemory::default(),
        );
        prop_assert_eq!(args.ok(), Some(json!({ "search_term": term })));
    }

    // Normalized search arguments always carry exactly one key
    #[test]
    fn prop_search_output_has_single_key(
        term in proptest::option::of(arb_non_numeric_term()),
        id in proptest::option::of(0i64..100_000),
    ) {
        let mut input = serde_json::Map::new();
        if let Some(term) = &term {
            input.insert("search_term".to_string(), json!(term));
        }
        if let Some(id) = id {
            input.insert("id".to_string(), json!(id));
        }

        let result = normalize(
            "search_ghostwriter_projects",
            ArgumentRule::SearchTerm,
            Value::Object(input),
            &ArgumentMemory::default(),
        );
        match (term, id) {
            (None, None) => prop_assert!(result.is_err()),
            _ => {
                let args = result.unwrap();
                prop_assert_eq!(args.as_object().map(Map::len), Some(1));
            }
        }
    }

    // Recovery never invents a codename
    #[test]
    fn prop_recovery_only_uses_memory(client_id in 1i64..10_000, remembered in proptest::option::of("[A-Z0-9]{4,10}")) {
        let memory = ArgumentMemory { last_known_codename: remembered.clone() };
        let args = normalize(
            "create_ghostwriter_project",
            ArgumentRule::RecoverCodename,
            json!({ "clientId": client_id }),
            &memory,
        ).unwrap();
        prop_assert_eq!(args.get("codename").and_then(Value::as_str), remembered.as_deref());
    }
}
