//! Integration tests for the extraction orchestrator

#[cfg(test)]
mod tests {
    use crate::{
        ExtractionOrchestrator, ExtractionRequest, ExtractorConfig, ExtractorError, NoProgress,
        PcaCatalog, ProgressEvent, ProgressSink,
    };
    use pcascan_domain::{CancellationToken, ExtractedRow, PageText};
    use pcascan_llm::MockGateway;
    use serde_json::Value;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const COMPILE_KEY: &str = "RAW ROWS TO DEDUPLICATE";
    const REPAIR_KEY: &str = "meant to be strict JSON";

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn on_event(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Cancels the job as soon as the first chunk completes
    struct CancelAfterFirstChunk {
        token: CancellationToken,
    }

    impl ProgressSink for CancelAfterFirstChunk {
        fn on_event(&self, event: ProgressEvent) {
            if matches!(event, ProgressEvent::ChunkCompleted { .. }) {
                self.token.cancel();
            }
        }
    }

    fn config(output: &Path) -> ExtractorConfig {
        ExtractorConfig {
            chunk_word_limit: 5,
            model: "mock-model".to_string(),
            output_dir: output.to_path_buf(),
            ..ExtractorConfig::default()
        }
    }

    /// Two pages of four words each: one chunk per page at a limit of 5
    fn request() -> ExtractionRequest {
        ExtractionRequest::new(
            vec![
                PageText::new(1, "100 Main St gas"),
                PageText::new(2, "10 Oak Ave cleaners"),
            ],
            PcaCatalog::parse("28. Gasoline Storage\n37. Dry Cleaning"),
        )
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response(
            "(Pages 1-1)",
            r#"{"rows": [{"address": "100 Main St", "pca_number": 28, "pca_name": "Gasoline Storage"}]}"#,
        );
        gateway.add_response(
            "(Pages 2-2)",
            "```json\n{\"rows\": [{\"address\": \"10 Oak Ave\", \"pca_number\": 37, \"source_pages\": \"2\"}, \"junk\"]}\n```",
        );
        gateway.add_response(
            COMPILE_KEY,
            r#"{"rows": [
                {"address": "100 Main St", "location_relation_to_site": "On-Site", "pca_number": 28},
                {"address": "Somewhere", "pca_number": null},
                {"address": "10 Oak Ave", "location_relation_to_site": "Off-Site", "pca_number": 37}
            ]}"#,
        );

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let sink = RecordingSink::default();
        let outcome = orchestrator
            .run(request(), &sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(gateway.call_count(), 3);
        assert_eq!(outcome.chunk_results.len(), 2);
        assert_eq!(outcome.raw_row_count, 2);
        assert!(!outcome.compile_fallback);
        assert_eq!(outcome.removed_count, 1);

        let ids: Vec<_> = outcome.rows.iter().map(|r| r.pca_identifier).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);

        let exp = &outcome.experiment_dir;
        assert!(exp.ends_with("exp_001"));
        assert!(exp.join("experiment_config.json").is_file());
        assert!(exp.join("chunks/chunk_001_pages_001-001.txt").is_file());
        assert!(exp.join("chunks/chunk_002_raw.txt").is_file());
        assert!(!exp.join("chunks/chunk_001_fixed.txt").exists());
        assert!(exp.join("final/compiled_raw.txt").is_file());
        assert!(exp.join("raw_llm_outputs.log").is_file());

        // Missing source_pages defaults to the chunk range; given ones are kept
        let raw = read_json(&exp.join("final/all_rows_raw.json"));
        assert_eq!(raw[0]["source_pages"], "1-1");
        assert_eq!(raw[1]["source_pages"], "2");

        let finals = read_json(&exp.join("final/final_rows_compiled.json"));
        assert_eq!(finals.as_array().unwrap().len(), 2);

        let csv = std::fs::read_to_string(exp.join("final/final_rows_compiled.csv")).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,100 Main St,On-Site,28,"));
        assert!(lines[2].starts_with("2,10 Oak Ave,Off-Site,37,"));

        let log = std::fs::read_to_string(exp.join("raw_llm_outputs.log")).unwrap();
        assert!(log.contains("CHUNK 1/2 | PAGES 1-1 | MODEL: mock-model"));
        assert!(log.contains("COMPILE STEP"));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let output = TempDir::new().unwrap();
        let orchestrator = ExtractionOrchestrator::new(MockGateway::default(), config(output.path()));
        let sink = RecordingSink::default();

        orchestrator
            .run(request(), &sink, &CancellationToken::new())
            .await
            .unwrap();

        let events = sink.events();
        assert!(matches!(events[0], ProgressEvent::ExperimentCreated { .. }));
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { total_rows: 0 })));

        let percents: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Step { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.first(), Some(&20.0));
        assert_eq!(percents.last(), Some(&95.0));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));

        let completed = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::ChunkCompleted { .. }))
            .count();
        assert_eq!(completed, 2);
    }

    #[tokio::test]
    async fn test_repair_recovers_chunk() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response("(Pages 1-1)", r#"{"rows": [{"address": "100 Main St", "pca_number": 28"#);
        gateway.add_response(
            REPAIR_KEY,
            r#"{"rows": [{"address": "100 Main St", "pca_number": 28}]}"#,
        );

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let outcome = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        // chunk 1, repair, chunk 2, compile
        assert_eq!(gateway.call_count(), 4);
        assert!(gateway.calls()[1].contains(REPAIR_KEY));
        assert_eq!(outcome.chunk_results[0].row_count, 1);
        assert!(outcome
            .experiment_dir
            .join("chunks/chunk_001_fixed.txt")
            .is_file());

        let log = std::fs::read_to_string(outcome.experiment_dir.join("raw_llm_outputs.log")).unwrap();
        assert!(log.contains("JSON FIX ATTEMPT"));
    }

    #[tokio::test]
    async fn test_failed_repair_yields_zero_rows() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response("(Pages 1-1)", "I could not find anything");
        gateway.add_response(REPAIR_KEY, "still not json");

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let outcome = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.chunk_results[0].row_count, 0);
        assert_eq!(outcome.chunk_results.len(), 2);
        // Exactly one repair attempt for the failing chunk
        let repairs = gateway.calls().iter().filter(|c| c.contains(REPAIR_KEY)).count();
        assert_eq!(repairs, 1);
    }

    #[tokio::test]
    async fn test_compile_fallback_to_raw_rows() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response(
            "(Pages 1-1)",
            r#"{"rows": [{"address": "100 Main St", "pca_number": 28}, {"address": "5 Elm St", "pca_number": "n/a"}]}"#,
        );
        gateway.add_response(COMPILE_KEY, "the model rambled");
        gateway.add_response(REPAIR_KEY, r#"{"no_rows_here": true}"#);

        let orchestrator = ExtractionOrchestrator::new(gateway, config(output.path()));
        let outcome = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.compile_fallback);
        assert_eq!(outcome.raw_row_count, 2);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].address, "100 Main St");
        assert_eq!(outcome.rows[0].pca_identifier, Some(1));
        assert!(outcome
            .experiment_dir
            .join("final/compiled_fixed.txt")
            .is_file());
    }

    #[tokio::test]
    async fn test_null_pca_number_removed() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response(
            COMPILE_KEY,
            r#"{"rows": [{"address": "1 King St", "pca_number": null}]}"#,
        );

        let orchestrator = ExtractionOrchestrator::new(gateway, config(output.path()));
        let outcome = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.removed_count, 1);

        let csv = std::fs::read_to_string(
            outcome.experiment_dir.join("final/final_rows_compiled.csv"),
        )
        .unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_fatal_and_keeps_partial_artifacts() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response(
            "(Pages 1-1)",
            r#"{"rows": [{"address": "100 Main St", "pca_number": 28}]}"#,
        );
        gateway.add_error("(Pages 2-2)", "quota exhausted");

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let result = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await;

        match result {
            Err(ExtractorError::Gateway(msg)) => assert!(msg.contains("quota exhausted")),
            other => panic!("Expected gateway error, got {:?}", other.map(|o| o.rows.len())),
        }
        // No retry, no compile call
        assert_eq!(gateway.call_count(), 2);

        let raw = read_json(&output.path().join("exp_001/final/all_rows_raw.json"));
        assert_eq!(raw.as_array().unwrap().len(), 1);
        assert!(!output
            .path()
            .join("exp_001/final/final_rows_compiled.csv")
            .exists());
    }

    #[tokio::test]
    async fn test_cancellation_between_chunks() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        let token = CancellationToken::new();
        let sink = CancelAfterFirstChunk {
            token: token.clone(),
        };

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let result = orchestrator.run(request(), &sink, &token).await;

        assert!(matches!(result, Err(ExtractorError::Cancelled)));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_calls() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        let token = CancellationToken::new();
        token.cancel();

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        let result = orchestrator.run(request(), &NoProgress, &token).await;

        assert!(matches!(result, Err(ExtractorError::Cancelled)));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_prompt_template() {
        let output = TempDir::new().unwrap();
        let template = output.path().join("v2_extract.txt");
        std::fs::write(&template, "CUSTOM INSTRUCTIONS").unwrap();

        let gateway = MockGateway::default();
        let orchestrator = ExtractionOrchestrator::new(
            gateway.clone(),
            ExtractorConfig {
                prompt_template: Some(template),
                ..config(output.path())
            },
        );
        orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert!(gateway.calls()[0].starts_with("CUSTOM INSTRUCTIONS"));
    }

    #[tokio::test]
    async fn test_missing_prompt_template() {
        let output = TempDir::new().unwrap();
        let orchestrator = ExtractionOrchestrator::new(
            MockGateway::default(),
            ExtractorConfig {
                prompt_template: Some(output.path().join("missing.txt")),
                ..config(output.path())
            },
        );
        let result = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ExtractorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let output = TempDir::new().unwrap();
        let orchestrator = ExtractionOrchestrator::new(MockGateway::default(), config(output.path()));
        let request = ExtractionRequest::new(Vec::new(), PcaCatalog::default());

        let result = orchestrator
            .run(request, &NoProgress, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ExtractorError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let output = TempDir::new().unwrap();
        let orchestrator = ExtractionOrchestrator::new(
            MockGateway::default(),
            ExtractorConfig {
                chunk_word_limit: 0,
                ..config(output.path())
            },
        );
        let result = orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_compile_prompt_receives_raw_rows() {
        let output = TempDir::new().unwrap();
        let gateway = MockGateway::default();
        gateway.add_response(
            "(Pages 2-2)",
            r#"{"rows": [{"address": "10 Oak Ave", "pca_number": 37}]}"#,
        );

        let orchestrator = ExtractionOrchestrator::new(gateway.clone(), config(output.path()));
        orchestrator
            .run(request(), &NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        let compile_prompt = gateway.calls().pop().unwrap();
        assert!(compile_prompt.contains(COMPILE_KEY));
        assert!(compile_prompt.contains("10 Oak Ave"));
        assert!(compile_prompt.contains("37. Dry Cleaning"));

        let rows: Vec<ExtractedRow> = serde_json::from_value(read_json(
            &output.path().join("exp_001/chunks/chunk_002_rows.json"),
        ))
        .unwrap();
        assert_eq!(rows[0].source_pages.as_deref(), Some("2-2"));
    }
}
