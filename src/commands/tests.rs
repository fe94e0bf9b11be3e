//! Orchestration action tests
//!
//! All tests run against an in-process completion client stub so they cover
//! the pipeline end to end without network access.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::ai::credentials::ApiKey;
    use crate::ai::prompts::{CHAT_SYSTEM_PROMPT, DOCUMENT_MATERIAL_BUDGET};
    use crate::ai::types::{GenerationOptions, StudyPackage, SummaryLength};
    use crate::ai::{ChatMessage, ChatRole, CompletionClient, CompletionRequest, ModelTier};
    use crate::commands::{
        chat, document_context, from_document, from_topic, ActionContext, ActionResult,
        FALLBACK_CHAT_REPLY,
    };
    use crate::documents::document_parser::fixtures::{docx_with_paragraphs, pdf_with_content};
    use crate::documents::Upload;
    use crate::error::{CompletionError, ErrorKind};

    /// Completion client returning a canned response and recording requests
    struct StubClient {
        response: Result<String, CompletionError>,
        requests: Mutex<Vec<CompletionRequest>>,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn replying(content: impl Into<String>) -> Self {
            Self::with(Ok(content.into()))
        }

        fn failing(error: CompletionError) -> Self {
            Self::with(Err(error))
        }

        fn with(response: Result<String, CompletionError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn last_user_prompt(&self) -> String {
            self.last_request()
                .messages
                .into_iter()
                .rev()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content)
                .unwrap()
        }
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn bst_package() -> String {
        json!({
            "summary": "A binary search tree stores keys so that in-order traversal is sorted.",
            "keyPoints": ["Left subtree keys are smaller", "Right subtree keys are larger"],
            "flashcards": [{"question": "What is the BST property?", "answer": "left < node < right"}],
            "quiz": [{
                "question": "Worst-case search in an unbalanced BST?",
                "options": ["O(1)", "O(log n)", "O(n)", "O(n^2)"],
                "answer": "C",
                "explanation": "A degenerate tree is a linked list.",
                "difficulty": "Medium"
            }],
            "fillInTheGaps": [{"sentence": "In-order traversal of a BST yields keys in sorted order.", "answer": "sorted"}],
            "examQuestions": ["Describe deletion of a node with two children."],
            "funFacts": ["BSTs were described independently by several researchers around 1960."]
        })
        .to_string()
    }

    fn context() -> ActionContext {
        ActionContext::default()
    }

    #[tokio::test]
    async fn test_from_topic_returns_full_package() {
        let client = StubClient::replying(bst_package());
        let result = from_topic(
            &client,
            &context(),
            "Data Structures",
            "Binary Search Trees",
            GenerationOptions::default(),
        )
        .await;

        assert!(result.success, "unexpected failure: {:?}", result.error);
        let package = result.data.unwrap();
        assert!(!package.summary.is_empty());
        assert!(!package.key_points.is_empty());
        assert!(!package.flashcards.is_empty());
        assert_eq!(package.quiz[0].correct_index(), Some(2));
        assert!(!package.fill_in_the_gaps.is_empty());
        assert!(!package.exam_questions.is_empty());
        assert!(!package.fun_facts.is_empty());

        let request = client.last_request();
        assert_eq!(request.tier, ModelTier::Generation);
        assert!(request.json_mode);
        let prompt = client.last_user_prompt();
        assert!(prompt.contains("Binary Search Trees"));
        assert!(prompt.contains("Data Structures"));
    }

    #[tokio::test]
    async fn test_from_topic_passes_package_through_unchanged() {
        const REPLY: &str = r#"{"summary":"...","keyPoints":["..."],"flashcards":[{"question":"Q","answer":"A"}],"quiz":[{"question":"Q","options":["a","b","c","d"],"answer":"A","explanation":"...","difficulty":"Easy"}],"fillInTheGaps":[{"sentence":"A ___ tree.","answer":"binary"}],"examQuestions":["..."],"funFacts":["..."]}"#;

        let client = StubClient::replying(REPLY);
        let result = from_topic(
            &client,
            &context(),
            "Data Structures",
            "Binary Search Trees",
            GenerationOptions::default(),
        )
        .await;

        assert!(result.success, "unexpected failure: {:?}", result.error);
        assert!(result.error_kind.is_none());
        let expected: StudyPackage = serde_json::from_str(REPLY).unwrap();
        assert_eq!(result.data, Some(expected));

        let envelope = serde_json::to_value(&result).unwrap();
        let raw: serde_json::Value = serde_json::from_str(REPLY).unwrap();
        assert_eq!(envelope["data"], raw);
        assert_eq!(envelope["success"], json!(true));
    }

    #[tokio::test]
    async fn test_from_topic_is_idempotent() {
        let client = StubClient::replying(bst_package());
        let options = GenerationOptions {
            summary_length: SummaryLength::Long,
            ..Default::default()
        };
        let first = from_topic(&client, &context(), "Data Structures", "Binary Search Trees", options.clone()).await;
        let first_prompt = client.last_user_prompt();
        let second = from_topic(&client, &context(), "Data Structures", "Binary Search Trees", options).await;

        assert_eq!(first, second);
        assert_eq!(first_prompt, client.last_user_prompt());
    }

    #[tokio::test]
    async fn test_non_json_response_is_decode_failure() {
        let client = StubClient::replying("Sure! Here are some notes about trees.");
        let result = from_topic(&client, &context(), "Data Structures", "Binary Search Trees", GenerationOptions::default()).await;

        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::Decode));
        assert!(result.error.unwrap().starts_with("invalid JSON"));
    }

    #[tokio::test]
    async fn test_completion_failure_does_not_leak_key() {
        let secret = "gsk_live_0123456789";
        let client = StubClient::failing(CompletionError::Transport(format!(
            "connection reset while sending Authorization: Bearer {}",
            secret
        )));
        let context = ActionContext {
            api_key: ApiKey::new(secret),
            ..ActionContext::default()
        };

        let result = from_topic(&client, &context, "Data Structures", "Binary Search Trees", GenerationOptions::default()).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Completion));
        let message = result.error.unwrap();
        assert!(!message.contains(secret));
        assert!(message.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_missing_credential_message() {
        let client = StubClient::failing(CompletionError::MissingCredential);
        let result = from_topic(&client, &context(), "Data Structures", "Binary Search Trees", GenerationOptions::default()).await;
        assert_eq!(result.error.as_deref(), Some("missing or invalid credential"));
    }

    #[tokio::test]
    async fn test_blank_topic_is_rejected_before_completion() {
        let client = StubClient::replying(bst_package());
        let result = from_topic(&client, &context(), "Data Structures", "   ", GenerationOptions::default()).await;
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));

        let result = from_topic(&client, &context(), "", "Binary Search Trees", GenerationOptions::default()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));
        assert_eq!(result.error.as_deref(), Some(FALLBACK_CHAT_REPLY));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_file_never_calls_client() {
        let client = StubClient::replying(bst_package());
        let upload = Upload::new("setup.exe", vec![0x4d, 0x5a, 0x90, 0x00]);
        let result = from_document(&client, &context(), upload, GenerationOptions::default()).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Extraction));
        assert!(result.error.unwrap().contains(".exe"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_never_calls_client() {
        let client = StubClient::replying(bst_package());
        let context = ActionContext {
            max_upload_bytes: 16,
            ..ActionContext::default()
        };
        let upload = Upload::new("notes.txt", b"this text is longer than sixteen bytes".to_vec());
        let result = from_document(&client, &context, upload, GenerationOptions::default()).await;

        assert_eq!(result.error_kind, Some(ErrorKind::Extraction));
        assert!(result.error.unwrap().contains("too large"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_image_only_pdf_is_extraction_failure() {
        let client = StubClient::replying(bst_package());
        let upload = Upload::new("scan.pdf", pdf_with_content("0 0 m 100 100 l S"));
        let result = from_document(&client, &context(), upload, GenerationOptions::default()).await;

        assert_eq!(result.error_kind, Some(ErrorKind::Extraction));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_document_embeds_extracted_text() {
        let client = StubClient::replying(bst_package());
        let upload = Upload::new(
            "lecture.docx",
            docx_with_paragraphs(&["Binary search trees", "Rotations restore balance."]),
        );
        let options = GenerationOptions {
            custom_instructions: Some("Explain like I'm five".to_string()),
            chapter_by_chapter: true,
            ..Default::default()
        };
        let result = from_document(&client, &context(), upload, options).await;

        assert!(result.success, "unexpected failure: {:?}", result.error);
        let prompt = client.last_user_prompt();
        assert!(prompt.contains("Rotations restore balance."));
        let material = prompt.find("Rotations restore balance.").unwrap();
        let instructions = prompt.find("Explain like I'm five").unwrap();
        assert!(instructions > material);
        assert!(prompt.contains("chapter by chapter"));
    }

    #[tokio::test]
    async fn test_long_document_is_truncated() {
        let client = StubClient::replying(bst_package());
        let text = "a".repeat(DOCUMENT_MATERIAL_BUDGET * 3);
        let upload = Upload::new("notes.txt", text.into_bytes());
        let result = from_document(&client, &context(), upload, GenerationOptions::default()).await;

        assert!(result.success);
        let prompt = client.last_user_prompt();
        let longest_run = prompt
            .split(|c: char| c != 'a')
            .map(str::len)
            .max()
            .unwrap_or(0);
        assert_eq!(longest_run, DOCUMENT_MATERIAL_BUDGET);
    }

    #[tokio::test]
    async fn test_chat_prepends_persona_and_windows_history() {
        let client = StubClient::replying("A BST keeps keys ordered.");
        let context = ActionContext {
            chat_history_limit: 2,
            ..ActionContext::default()
        };
        let history = vec![
            ChatMessage::system("Context from uploaded file \"bst.pdf\""),
            ChatMessage::user("first question"),
            ChatMessage::assistant("first answer"),
            ChatMessage::user("what is a BST?"),
        ];

        let result = chat(&client, &context, &history).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap().content, "A BST keeps keys ordered.");

        let request = client.last_request();
        assert_eq!(request.tier, ModelTier::Chat);
        assert!(!request.json_mode);
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                CHAT_SYSTEM_PROMPT,
                "Context from uploaded file \"bst.pdf\"",
                "first answer",
                "what is a BST?",
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_failure_uses_fallback_reply() {
        let client = StubClient::failing(CompletionError::Api {
            status: 500,
            message: "internal".to_string(),
        });
        let result = chat(&client, &context(), &[ChatMessage::user("hello")]).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(FALLBACK_CHAT_REPLY));
        assert_eq!(result.error_kind, Some(ErrorKind::Completion));
    }

    #[tokio::test]
    async fn test_chat_without_messages_is_invalid_input() {
        let client = StubClient::replying("unused");
        let result = chat(&client, &context(), &[ChatMessage::system("ctx")]).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));
        assert_eq!(result.error.as_deref(), Some(FALLBACK_CHAT_REPLY));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_document_context_message() {
        let upload = Upload::new("notes.txt", b"Heaps are complete binary trees.".to_vec());
        let result = document_context(&context(), upload).await;

        let message = result.data.unwrap();
        assert_eq!(message.role, ChatRole::System);
        assert!(message.content.starts_with("Context from uploaded file \"notes.txt\""));
        assert!(message.content.contains("Heaps are complete binary trees."));
    }

    #[tokio::test]
    async fn test_document_context_unsupported() {
        let result = document_context(&context(), Upload::new("movie.mp4", vec![1, 2, 3])).await;
        assert_eq!(result.error_kind, Some(ErrorKind::Extraction));
    }

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ActionResult::ok(7)).unwrap();
        assert_eq!(ok, json!({"success": true, "data": 7}));

        let failed = serde_json::to_value(ActionResult::<u8>::failure(
            ErrorKind::InvalidInput,
            "topic must not be empty",
        ))
        .unwrap();
        assert_eq!(
            failed,
            json!({"success": false, "error": "topic must not be empty", "errorKind": "invalid_input"})
        );
    }
}
