//! Property-based tests for the mock layer.
//!
//! Uses proptest to check lookup identity, value overwrite and headless
//! detection over arbitrary inputs.

use proptest::prelude::*;
use webdouble::prelude::*;
use webdouble::{MapEnv, CI_INDICATOR_VARS};

fn by_strategy() -> impl Strategy<Value = By> {
    prop_oneof![Just(By::Id), Just(By::CssSelector), Just(By::TagName)]
}

fn locator_strategy() -> impl Strategy<Value = Locator> {
    (by_strategy(), "[a-zA-Z#.][a-zA-Z0-9_ -]{0,24}").prop_map(|(by, value)| Locator::new(by, value))
}

proptest! {
    /// Repeated single lookups with the same locator hit the same node.
    #[test]
    fn prop_single_lookup_is_identity_stable(
        locators in prop::collection::vec(locator_strategy(), 1..12)
    ) {
        let mut driver = MockDriver::with_sink(TraceSink::silent());
        let first: Vec<MockElement> = locators.iter().map(|l| driver.find_element(l)).collect();
        for (locator, element) in locators.iter().zip(&first) {
            prop_assert!(driver.find_element(locator).same_node(element));
        }
        let distinct: std::collections::HashSet<&Locator> = locators.iter().collect();
        prop_assert_eq!(driver.cached_elements(), distinct.len());
    }

    /// Plural lookups always yield three nodes never seen before.
    #[test]
    fn prop_plural_lookup_never_cached(locator in locator_strategy(), calls in 1usize..5) {
        let mut driver = MockDriver::with_sink(TraceSink::silent());
        let mut seen = std::collections::HashSet::new();
        for _ in 0..calls {
            let batch = driver.find_elements(&locator);
            prop_assert_eq!(batch.len(), 3);
            for element in batch {
                prop_assert!(seen.insert(element.id()));
            }
        }
    }

    /// The stored value is whatever the last send_keys call typed.
    #[test]
    fn prop_send_keys_overwrites(
        calls in prop::collection::vec(prop::collection::vec("[a-z@.]{0,6}", 0..4), 1..6)
    ) {
        let element = MockElement::new("input", "field", TraceSink::silent());
        for parts in &calls {
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            let _ = element.send_keys(&parts);
        }
        let expected = calls.last().map(|p| p.concat()).unwrap_or_default();
        prop_assert_eq!(element.get_attribute("value"), expected);
        let _ = element.clear();
        prop_assert_eq!(element.get_attribute("value"), "");
    }

    /// Any non-empty CI indicator forces headless, display or not.
    #[test]
    fn prop_ci_variable_forces_headless(
        index in 0..CI_INDICATOR_VARS.len(),
        value in "[a-zA-Z0-9]{1,8}",
        display in prop::option::of(":[0-9]"),
    ) {
        let mut env = MapEnv::new().with(CI_INDICATOR_VARS[index], value);
        if let Some(display) = display {
            env = env.with("DISPLAY", display);
        }
        prop_assert!(EnvironmentDetector::new(env).is_headless());
    }

    /// Script traces keep at most fifty characters of the source.
    #[test]
    fn prop_script_trace_is_truncated(script in ".{0,120}") {
        let mut driver = MockDriver::with_sink(TraceSink::silent());
        let result = driver.execute_script(&script, &[]).unwrap();
        prop_assert_eq!(result, serde_json::Value::Null);
        let detail = driver.history().pop().unwrap().detail;
        let preview: String = script.chars().take(50).collect();
        prop_assert_eq!(detail, format!("Executed script: {preview}..."));
    }
}
