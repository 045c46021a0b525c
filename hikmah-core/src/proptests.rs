//! Property-based tests using proptest.
//!
//! Covered invariants:
//!
//! - Text that is mostly Arabic script is always detected as Arabic
//! - Detection is a total function that never panics
//! - The numbered-item count matches the number of list lines
//! - Streamed fragments reassemble to the same text, whatever non-text
//!   events are interleaved with them

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use crate::completeness::CompletenessGuard;
    use crate::language::{arabic_ratio, detect_language, Language};
    use crate::llm::{ClaudeStream, OpenAIStream};

    fn arabic_word() -> impl Strategy<Value = String> {
        "[\u{0621}-\u{064A}]{2,8}"
    }

    fn latin_word() -> impl Strategy<Value = String> {
        "[a-z]{2,8}"
    }

    /// Text fragments a model could emit, including newlines and quotes.
    fn fragment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,:\"\\n\u{0621}-\u{064A}éèà]{1,12}"
    }

    /// Event payloads a provider sends between text deltas.
    fn noise() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(r#"{"type":"ping"}"#.to_string()),
            Just(r#"{"type":"content_block_stop","index":0}"#.to_string()),
            Just(r#"{"type":"content_block_delta","delta":{"type":"input_json_delta","partial_json":"{"}}"#.to_string()),
            "[a-z{}\\[\\]:,\"]{0,20}",
        ]
    }

    // =========================================================================
    // Language detection
    // =========================================================================

    proptest! {
        /// A query whose words are mostly Arabic is always Arabic.
        #[test]
        fn mostly_arabic_is_arabic(
            arabic in prop::collection::vec(arabic_word(), 3..12),
            latin in prop::collection::vec(latin_word(), 0..2),
        ) {
            let text = arabic.iter().chain(latin.iter()).cloned().collect::<Vec<_>>().join(" ");
            prop_assume!(arabic_ratio(&text) > 0.30);
            prop_assert_eq!(detect_language(&text), Language::Arabic);
        }

        /// Detection never panics and script-free text is never Arabic.
        #[test]
        fn latin_text_is_never_arabic(text in "[ -~]{0,80}") {
            prop_assert_ne!(detect_language(&text), Language::Arabic);
        }

        #[test]
        fn ratio_is_a_fraction(text in "\\PC{0,60}") {
            let ratio = arabic_ratio(&text);
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }

    // =========================================================================
    // Completeness verification
    // =========================================================================

    proptest! {
        /// Each "N. item" line counts once; completeness compares against
        /// the expected count.
        #[test]
        fn verify_counts_numbered_lines(
            present in 0usize..120,
            expected in 1u32..120,
            indent in "[ \t]{0,3}",
        ) {
            let text = (1..=present)
                .map(|i| format!("{indent}{i}. item {i}"))
                .collect::<Vec<_>>()
                .join("\n");
            let verification = CompletenessGuard::new().verify(&text, Some(expected));

            prop_assert_eq!(verification.item_count, present);
            prop_assert_eq!(verification.is_complete, present >= expected as usize);
        }

        /// Without an expected count every answer is complete.
        #[test]
        fn verify_without_count_is_complete(text in "\\PC{0,200}") {
            prop_assert!(CompletenessGuard::new().verify(&text, None).is_complete);
        }
    }

    // =========================================================================
    // Stream reconstruction
    // =========================================================================

    proptest! {
        /// Claude text deltas reassemble in order; other events are ignored.
        #[test]
        fn claude_stream_reassembles(
            fragments in prop::collection::vec((fragment(), prop::option::of(noise())), 1..30),
        ) {
            let mut payloads = vec![
                json!({"type": "message_start", "message": {"model": "claude-test", "usage": {"input_tokens": 3}}}).to_string(),
            ];
            for (fragment, noise) in &fragments {
                payloads.extend(noise.clone());
                payloads.push(
                    json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": fragment}}).to_string(),
                );
            }
            payloads.push(r#"{"type":"message_stop"}"#.to_string());

            let mut seen = Vec::new();
            let mut stream = ClaudeStream::default();
            for data in &payloads {
                stream.apply_data(data, &mut |t: &str| seen.push(t.to_string())).unwrap();
            }
            let response = stream.finish("fallback").unwrap();

            let expected: Vec<String> = fragments.iter().map(|(f, _)| f.clone()).collect();
            prop_assert_eq!(&seen, &expected);
            prop_assert_eq!(response.text, expected.concat());
            prop_assert_eq!(response.model, "claude-test");
        }

        /// OpenAI content deltas reassemble and nothing after [DONE] is applied.
        #[test]
        fn openai_stream_reassembles(fragments in prop::collection::vec(fragment(), 1..30)) {
            let mut payloads: Vec<String> = fragments
                .iter()
                .map(|fragment| {
                    json!({"model": "gpt-test", "choices": [{"index": 0, "delta": {"content": fragment}, "finish_reason": null}]})
                        .to_string()
                })
                .collect();
            payloads.push("[DONE]".to_string());
            payloads.push(json!({"model": "gpt-test", "choices": [{"index": 0, "delta": {"content": "late"}}]}).to_string());

            let mut seen = String::new();
            let mut stream = OpenAIStream::default();
            for data in &payloads {
                stream.apply_data(data, &mut |t: &str| seen.push_str(t)).unwrap();
            }
            let response = stream.finish("fallback").unwrap();

            prop_assert_eq!(&response.text, &fragments.concat());
            prop_assert_eq!(response.text, seen);
            prop_assert_eq!(response.model, "gpt-test");
        }
    }
}
