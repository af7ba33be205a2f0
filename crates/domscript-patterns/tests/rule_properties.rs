use domscript_patterns::{
    extract_color, CompletionValidator, RuleEngine, COLOR_VOCABULARY, DEFAULT_COLOR,
};
use proptest::prelude::*;

fn command_words() -> impl Strategy<Value = Vec<String>> {
    let words = prop::sample::select(vec![
        "make", "the", "buttons", "button", "hide", "show", "images", "img", "text", "color",
        "background", "bigger", "smaller", "bold", "italic", "please", "all", "links",
    ]);
    prop::collection::vec(words.prop_map(str::to_string), 0..6)
}

proptest! {
    #[test]
    fn extraction_is_total_and_in_vocabulary(text in ".*") {
        let color = extract_color(&text);
        prop_assert!(COLOR_VOCABULARY.contains(&color.as_str()));
    }

    #[test]
    fn extraction_prefers_longest_present_color(text in "[a-z ]{0,40}") {
        let color = extract_color(&text);
        let lower = text.to_lowercase();
        if color != DEFAULT_COLOR || lower.contains("blue") {
            prop_assert!(lower.contains(color.as_str()));
        }
        for candidate in COLOR_VOCABULARY {
            if lower.contains(candidate) {
                prop_assert!(candidate.len() <= color.as_str().len());
            }
        }
    }

    #[test]
    fn extraction_ignores_word_order(
        mut words in command_words(),
        color in prop::sample::select(COLOR_VOCABULARY.to_vec()),
    ) {
        words.push(color.to_string());
        let forward = words.join(" ");
        words.reverse();
        let backward = words.join(" ");
        prop_assert_eq!(extract_color(&forward), extract_color(&backward));
        prop_assert_eq!(extract_color(&forward).as_str(), color);
    }

    #[test]
    fn rule_engine_output_always_validates(command in ".*") {
        let engine = RuleEngine::default();
        let validator = CompletionValidator::default();
        let code = engine.render(&command);

        prop_assert!(!code.is_empty());
        prop_assert!(code.ends_with(';'));
        prop_assert!(validator.accept(&code).is_ok(), "rejected: {}", code);
    }

    #[test]
    fn rule_engine_validates_for_phrase_commands(words in command_words()) {
        let engine = RuleEngine::default();
        let validator = CompletionValidator::default();
        let code = engine.render(&words.join(" "));
        prop_assert!(validator.is_acceptable(&code), "rejected: {}", code);
    }
}

#[test]
fn extraction_matches_documented_example() {
    assert_eq!(extract_color("make it lightpink").as_str(), "lightpink");
}

#[test]
fn rule_engine_survives_hostile_commands() {
    let engine = RuleEngine::default();
    let validator = CompletionValidator::default();
    for command in [
        "</script><script>alert(1)</script>",
        "def f(): print('x')",
        "class Foo extends HTMLElement",
        "\u{2028}line\u{2029}separators\0",
        "'); window.location = 'evil",
    ] {
        let code = engine.render(command);
        assert!(validator.is_acceptable(&code), "rejected: {code}");
    }
}
