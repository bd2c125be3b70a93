use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use voynich_analysis::{
    ContextAssembler, RandomSimilarity, ReferenceLibrary, RefinementOrchestrator, ResponseLog,
    SectionTracker, RAW_RESPONSE_KEY,
};
use voynich_services::{ReasoningClient, Result as ServiceResult};

/// Reasoning stub that replays scripted replies and records every prompt
#[derive(Clone)]
struct ScriptedClient {
    replies: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    fn new(replies: &[&str]) -> Self {
        let mut replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
        replies.reverse();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> ServiceResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| r#"{"updated_hypothesis": "default"}"#.to_string()))
    }
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

#[tokio::test]
async fn single_shot_appends_exactly_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResponseLog::new(dir.path().join("responses.jsonl"));
    let client = ScriptedClient::new(&[r#"{"confidence": 0.7}"#]);
    let orchestrator = RefinementOrchestrator::new(Box::new(client), log.clone());

    let before = line_count(log.path());
    let result = orchestrator.analyze("describe the token structure").await.unwrap();
    assert_eq!(result["confidence"], 0.7);
    assert_eq!(line_count(log.path()), before + 1);
}

#[tokio::test]
async fn malformed_reply_is_wrapped_and_still_logged() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResponseLog::new(dir.path().join("responses.jsonl"));
    let client = ScriptedClient::new(&["not json at all"]);
    let orchestrator = RefinementOrchestrator::new(Box::new(client), log.clone());

    let result = orchestrator.analyze("prompt").await.unwrap();
    assert_eq!(result[RAW_RESPONSE_KEY], "not json at all");

    let entries = log.read_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].response[RAW_RESPONSE_KEY], "not json at all");
}

#[tokio::test]
async fn refinement_runs_exactly_the_requested_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResponseLog::new(dir.path().join("responses.jsonl"));
    // Seed one single-shot exchange so the first round has history.
    let seed = ScriptedClient::new(&[r#"{"observation": "repeating prefixes"}"#]);
    RefinementOrchestrator::new(Box::new(seed), log.clone())
        .analyze("seed")
        .await
        .unwrap();

    let client = ScriptedClient::new(&[
        r#"{"updated_hypothesis": "round one"}"#,
        "round two is not json",
        r#"{"updated_hypothesis": "round three", "confidence": 0.5}"#,
    ]);
    let orchestrator = RefinementOrchestrator::new(Box::new(client), log.clone());

    let before = line_count(log.path());
    let final_reply = orchestrator.refine(3).await.unwrap();
    assert_eq!(line_count(log.path()), before + 3);
    assert!(final_reply.contains("round three"));

    // The malformed middle round degraded to the fallback but did not
    // abort the run.
    let entries = log.read_entries().await.unwrap();
    assert_eq!(entries[2].response[RAW_RESPONSE_KEY], "round two is not json");
}

#[tokio::test]
async fn each_round_observes_the_previous_append() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResponseLog::new(dir.path().join("responses.jsonl"));
    let seed = ScriptedClient::new(&[r#"{"observation": "gallows characters"}"#]);
    RefinementOrchestrator::new(Box::new(seed), log.clone())
        .analyze("seed")
        .await
        .unwrap();

    let client = ScriptedClient::new(&[
        r#"{"updated_hypothesis": "alpha-alpha"}"#,
        r#"{"updated_hypothesis": "beta-beta"}"#,
    ]);
    let orchestrator = RefinementOrchestrator::new(Box::new(client.clone()), log.clone());
    orchestrator.refine(2).await.unwrap();

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);
    // Round 1 sees the seed observation; round 2 additionally sees
    // round 1's hypothesis because the log was re-read from disk.
    assert!(prompts[0].contains("gallows characters"));
    assert!(!prompts[0].contains("alpha-alpha"));
    assert!(prompts[1].contains("alpha-alpha"));
}

#[tokio::test]
async fn pipeline_marks_analyzed_sections_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    let embeddings_path = dir.path().join("embeddings.jsonl");
    std::fs::write(
        &embeddings_path,
        concat!(
            "{\"page\":\"f1r\",\"paragraph\":\"P1\",\"raw\":\"daiin chedy\",\"tokens\":[\"daiin\",\"chedy\"],\"embedding\":[0.5,0.5]}\n",
            "{\"page\":\"f1v\",\"paragraph\":\"P1\",\"raw\":\"otedy\",\"tokens\":[\"otedy\"],\"embedding\":[0.2,0.8]}\n",
        ),
    )
    .unwrap();

    let reference_path = dir.path().join("greek.jsonl");
    std::fs::write(
        &reference_path,
        "{\"language\":\"Greek\",\"source\":\"hermetica_chunk_1\",\"text\":\"en arche\"}\n",
    )
    .unwrap();
    let processed_path = dir.path().join("processed_sections.json");

    let mut tracker = SectionTracker::new(&embeddings_path, &processed_path).await.unwrap();
    let reference_paths = BTreeMap::from([("Greek".to_string(), reference_path)]);
    let library = ReferenceLibrary::load(&reference_paths).await.unwrap();
    let assembler = ContextAssembler::new(library, Box::new(RandomSimilarity));

    let ids = tracker.choose(1, false).unwrap();
    let payloads = assembler
        .build_payloads(&mut tracker, &ids, "Return JSON.")
        .await
        .unwrap();

    let log = ResponseLog::new(dir.path().join("responses.jsonl"));
    let client = ScriptedClient::new(&[r#"{"confidence": 0.9}"#]);
    let orchestrator = RefinementOrchestrator::new(Box::new(client), log.clone());
    orchestrator.analyze(&payloads[0].prompt).await.unwrap();

    // A fresh tracker (new process) must not re-offer the analyzed id.
    let restarted = SectionTracker::new(&embeddings_path, &processed_path).await.unwrap();
    let second = restarted.choose(1, false).unwrap();
    assert_ne!(second, ids);
    assert!(matches!(
        restarted.choose(2, false),
        Err(voynich_analysis::AnalysisError::InsufficientPool {
            available: 1,
            requested: 2
        })
    ));
}
