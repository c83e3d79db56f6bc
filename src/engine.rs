//! Chat engine orchestrating ingestion, retrieval, routing, and generation
//!
//! One engine instance owns the vector index for the process. Mutations
//! (`ingest_files`, `rebuild_index`) are serialized by an internal writer
//! lock and publish a fresh immutable index only after it has been
//! persisted; `chat` reads whatever index is current without blocking
//! writers or other readers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use walkdir::WalkDir;

use crate::config::{RagConfig, RetrievalConfig, RouterStrategy, RoutingConfig};
use crate::error::Result;
use crate::generation::{PromptBuilder, NO_CONTEXT_FALLBACK};
use crate::ingestion::{DocumentLoader, LoadOutcome, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{ScoredChunk, VectorIndex};
use crate::routing::{self, ChatMode, IntentLabel, Route};
use crate::types::{ChatOutcome, ChatTurn, Chunk, Document};

/// RAG chat orchestrator
pub struct ChatEngine {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    retrieval: RetrievalConfig,
    routing: RoutingConfig,
    docs_dir: PathBuf,
    index_dir: PathBuf,
    index: RwLock<Option<Arc<VectorIndex>>>,
    write_lock: Mutex<()>,
}

impl ChatEngine {
    /// Construct an engine, loading any previously persisted index. Provider
    /// credentials have already been validated by provider construction.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let index = VectorIndex::load(&config.storage.index_dir)?;
        match &index {
            Some(index) => tracing::info!(
                "Loaded persisted index with {} chunks from {}",
                index.len(),
                config.storage.index_dir.display()
            ),
            None => tracing::info!(
                "No persisted index found in {}",
                config.storage.index_dir.display()
            ),
        }

        Ok(Self {
            chunker: TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            embedder,
            llm,
            retrieval: config.retrieval.clone(),
            routing: config.routing.clone(),
            docs_dir: config.storage.docs_dir.clone(),
            index_dir: config.storage.index_dir.clone(),
            index: RwLock::new(index.map(Arc::new)),
            write_lock: Mutex::new(()),
        })
    }

    /// Whether an index is currently available for retrieval
    pub fn has_index(&self) -> bool {
        self.index.read().is_some()
    }

    /// Snapshot of the current index
    pub fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().clone()
    }

    /// Regular files under the configured documents directory, sorted
    pub fn scan_docs_dir(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.docs_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();
        paths
    }

    /// First-run initialization: when no index was loaded, ingest everything
    /// already sitting in the documents directory.
    pub async fn bootstrap(&self) -> Result<()> {
        if self.has_index() {
            return Ok(());
        }
        let paths = self.scan_docs_dir();
        if paths.is_empty() {
            tracing::info!("No persisted index and no documents to build one from");
            return Ok(());
        }
        tracing::info!(
            "Building initial index from {} files in {}",
            paths.len(),
            self.docs_dir.display()
        );
        self.ingest_files(&paths).await?;
        Ok(())
    }

    /// Load, chunk, embed, and index the given files. Returns the sorted
    /// distinct source identifiers that were actually ingested. Paths that
    /// produce no chunks are skipped with a warning; if nothing at all is
    /// produced, the index and its persisted form are left untouched.
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        let _guard = self.write_lock.lock().await;

        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut sources: BTreeSet<String> = BTreeSet::new();

        for path in paths {
            tracing::info!("Ingesting {}", path.display());
            let Some(documents) = load_path(path) else {
                continue;
            };
            let chunks = self.chunker.split(&documents);
            if chunks.is_empty() {
                tracing::warn!("No chunks produced from {}", path.display());
                continue;
            }
            sources.extend(documents.iter().map(|doc| doc.metadata.source.clone()));
            all_chunks.extend(chunks);
        }

        if all_chunks.is_empty() {
            tracing::warn!("Nothing ingested, index left untouched");
            return Ok(Vec::new());
        }

        let embeddings = self.embed_chunks(&all_chunks).await?;
        let next = match self.current_index() {
            Some(index) => index.with_added(embeddings, all_chunks)?,
            None => VectorIndex::build(embeddings, all_chunks)?,
        };
        next.save(&self.index_dir)?;

        let next = Arc::new(next);
        tracing::info!(
            "Index now holds {} chunks, persisted to {}",
            next.len(),
            self.index_dir.display()
        );
        *self.index.write() = Some(next);

        Ok(sources.into_iter().collect())
    }

    /// Rebuild the index from scratch from the authoritative path list. The
    /// only way to remove a document's influence: deleted sources leave no
    /// residue. An empty result removes the index entirely, on disk included.
    pub async fn rebuild_index(&self, paths: &[PathBuf]) -> Result<Option<Arc<VectorIndex>>> {
        let _guard = self.write_lock.lock().await;

        let mut all_chunks: Vec<Chunk> = Vec::new();
        for path in paths {
            let Some(documents) = load_path(path) else {
                continue;
            };
            all_chunks.extend(self.chunker.split(&documents));
        }

        if all_chunks.is_empty() {
            VectorIndex::remove_saved(&self.index_dir)?;
            *self.index.write() = None;
            tracing::info!("Rebuild produced no chunks, index is now absent");
            return Ok(None);
        }

        let embeddings = self.embed_chunks(&all_chunks).await?;
        let index = VectorIndex::build(embeddings, all_chunks)?;
        index.save(&self.index_dir)?;

        let index = Arc::new(index);
        tracing::info!("Rebuilt index with {} chunks", index.len());
        *self.index.write() = Some(Arc::clone(&index));
        Ok(Some(index))
    }

    /// Answer a message: route, retrieve when the route calls for it,
    /// compose the prompt, and invoke the model.
    pub async fn chat(
        &self,
        message: &str,
        mode: Option<&str>,
        history: &[ChatTurn],
    ) -> Result<ChatOutcome> {
        tracing::info!("Chat message received ({} chars)", message.len());

        // An empty mode string is the same as no mode at all
        let explicit_mode = mode
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ChatMode::parse)
            .transpose()?;

        let label = match (explicit_mode, self.routing.strategy) {
            (None, RouterStrategy::Inferred) => Some(self.classify(message).await?),
            _ => None,
        };

        let route = routing::decide(explicit_mode, label);
        tracing::debug!("Route selected: {}", route);

        let history_text = PromptBuilder::render_history(history);

        if !route.retrieves() {
            let prompt = PromptBuilder::build_direct_prompt(message, &history_text);
            let answer = self.llm.complete(&prompt).await?;
            return Ok(ChatOutcome {
                answer,
                route,
                sources: Vec::new(),
            });
        }

        let retrieved = self.retrieve(message).await?;
        let context = PromptBuilder::build_context(&retrieved);

        // Classifier-routed calls require substantial context; explicit rag
        // only requires that retrieval found anything at all.
        let min_chars = if label.is_some() {
            self.retrieval.min_context_chars
        } else {
            0
        };
        if !routing::context_is_sufficient(&context, min_chars) {
            tracing::warn!("Insufficient retrieved context, answering with the fixed fallback");
            return Ok(ChatOutcome {
                answer: NO_CONTEXT_FALLBACK.to_string(),
                route,
                sources: Vec::new(),
            });
        }

        let sources = dedup_sources(&retrieved);
        let prompt = match route {
            Route::Playbook => PromptBuilder::build_playbook_prompt(
                message,
                &context,
                &self.routing.playbook_reference,
            ),
            _ => PromptBuilder::build_grounded_prompt(message, &context, &history_text),
        };
        let answer = self.llm.complete(&prompt).await?;
        tracing::debug!("Generated {} answer citing {} sources", route, sources.len());

        Ok(ChatOutcome {
            answer,
            route,
            sources,
        })
    }

    async fn retrieve(&self, message: &str) -> Result<Vec<ScoredChunk>> {
        let Some(index) = self.current_index() else {
            return Ok(Vec::new());
        };
        let embedding = self.embedder.embed(message).await?;
        let results = index.search(&embedding, self.retrieval.top_k)?;
        tracing::debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    async fn classify(&self, message: &str) -> Result<IntentLabel> {
        let prompt = PromptBuilder::build_classifier_prompt(message);
        let raw = self.llm.complete(&prompt).await?;
        let label = IntentLabel::parse(&raw);
        tracing::debug!("Classifier said '{}', label {}", raw.trim(), label.token());
        Ok(label)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        self.embedder.embed_batch(&texts).await
    }
}

/// Load one path, mapping every non-productive outcome to a logged skip
fn load_path(path: &Path) -> Option<Vec<Document>> {
    match DocumentLoader::load(path) {
        LoadOutcome::Loaded(documents) if !documents.is_empty() => Some(documents),
        LoadOutcome::Loaded(_) => {
            tracing::warn!("No documents loaded from {}", path.display());
            None
        }
        LoadOutcome::Unsupported => {
            tracing::warn!("Skipping {}: unsupported extension", path.display());
            None
        }
        LoadOutcome::Missing => {
            tracing::warn!("Skipping {}: file does not exist", path.display());
            None
        }
        LoadOutcome::Failed(err) => {
            tracing::warn!("Skipping {}: {}", path.display(), err);
            None
        }
    }
}

/// Source identifiers of retrieved chunks, first occurrence kept, order kept
fn dedup_sources(results: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for result in results {
        let source = &result.chunk.metadata.source;
        if !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::tempdir;

    /// Deterministic embedder: byte-bucket frequencies, normalized
    struct MockEmbedder;

    fn mock_embedding(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; 8];
        for byte in text.bytes() {
            vector[(byte % 8) as usize] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }
        vector
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(mock_embedding(text))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Canned LLM recording every prompt it receives
    struct MockLlm {
        replies: parking_lot::Mutex<VecDeque<String>>,
        default_reply: String,
        prompts: parking_lot::Mutex<Vec<String>>,
    }

    impl MockLlm {
        fn canned(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                replies: parking_lot::Mutex::new(VecDeque::new()),
                default_reply: reply.to_string(),
                prompts: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn scripted(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: parking_lot::Mutex::new(
                    replies.iter().map(|r| r.to_string()).collect(),
                ),
                default_reply: "done".to_string(),
                prompts: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }

        fn call_count(&self) -> usize {
            self.prompts.lock().len()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            let reply = self.replies.lock().pop_front();
            Ok(reply.unwrap_or_else(|| self.default_reply.clone()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn test_config(root: &Path) -> RagConfig {
        let mut config = RagConfig::default();
        config.storage.docs_dir = root.join("docs");
        config.storage.index_dir = root.join("index");
        config
    }

    fn engine_with(config: &RagConfig, llm: Arc<MockLlm>) -> ChatEngine {
        ChatEngine::new(config, Arc::new(MockEmbedder), llm).unwrap()
    }

    fn write_doc(root: &Path, name: &str, content: &str) -> PathBuf {
        let docs = root.join("docs");
        fs::create_dir_all(&docs).unwrap();
        let path = docs.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn index_file(config: &RagConfig) -> PathBuf {
        config.storage.index_dir.join("index.json")
    }

    const LONG_DOC: &str = "Deployments follow a fixed sequence. First drain traffic from the \
node. Then apply the new release and run the smoke checks. Finally restore traffic and watch \
the error rate for ten minutes before closing the change.";

    #[tokio::test]
    async fn test_ingest_empty_list_builds_nothing() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let engine = engine_with(&config, MockLlm::canned("unused"));

        let sources = engine.ingest_files(&[]).await.unwrap();
        assert!(sources.is_empty());
        assert!(!engine.has_index());
        assert!(!index_file(&config).exists());
    }

    #[tokio::test]
    async fn test_ingest_failing_paths_leaves_persisted_index_unchanged() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let engine = engine_with(&config, MockLlm::canned("unused"));

        let sky = write_doc(dir.path(), "sky.txt", "The sky is blue.");
        engine.ingest_files(&[sky]).await.unwrap();
        let before = fs::read(index_file(&config)).unwrap();

        let bad = write_doc(dir.path(), "binary.exe", "not a document");
        let sources = engine
            .ingest_files(&[bad, dir.path().join("docs/nothing-here.txt")])
            .await
            .unwrap();

        assert!(sources.is_empty());
        let after = fs::read(index_file(&config)).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_ingest_returns_sorted_distinct_sources() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let engine = engine_with(&config, MockLlm::canned("unused"));

        let b = write_doc(dir.path(), "b.txt", "Beta facts live here.");
        let a = write_doc(dir.path(), "a.csv", "name,role\nweb-1,frontend\ndb-1,database\n");

        let sources = engine.ingest_files(&[b.clone(), a.clone()]).await.unwrap();
        assert_eq!(
            sources,
            vec![
                a.to_string_lossy().into_owned(),
                b.to_string_lossy().into_owned()
            ]
        );
    }

    #[tokio::test]
    async fn test_grounded_chat_cites_ingested_file() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("The sky is blue, according to the document.");
        let engine = engine_with(&config, llm.clone());

        let sky = write_doc(dir.path(), "sky.txt", "The sky is blue.");
        engine.ingest_files(&[sky.clone()]).await.unwrap();

        let outcome = engine
            .chat("What color is the sky?", None, &[])
            .await
            .unwrap();

        assert_eq!(outcome.route, Route::Grounded);
        assert_eq!(outcome.sources, vec![sky.to_string_lossy().into_owned()]);
        assert_eq!(llm.call_count(), 1);
        assert!(llm.prompts()[0].contains("The sky is blue."));
        assert!(llm.prompts()[0].contains("What color is the sky?"));
    }

    #[tokio::test]
    async fn test_direct_mode_with_no_index_answers_without_sources() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("Hello there.");
        let engine = engine_with(&config, llm.clone());

        let outcome = engine.chat("Hello", Some("direct"), &[]).await.unwrap();

        assert_eq!(outcome.answer, "Hello there.");
        assert_eq!(outcome.route, Route::Direct);
        assert!(outcome.sources.is_empty());
        assert!(!llm.prompts()[0].contains("excerpts"));
    }

    #[tokio::test]
    async fn test_invalid_mode_is_rejected_before_any_model_call() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("unused");
        let engine = engine_with(&config, llm.clone());

        let result = engine.chat("Hello", Some("banana"), &[]).await;
        assert!(result.is_err());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_mode_defaults_to_rag_and_falls_back_without_index() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("unused");
        let engine = engine_with(&config, llm.clone());

        let outcome = engine.chat("Anything there?", Some(""), &[]).await.unwrap();

        assert_eq!(outcome.answer, NO_CONTEXT_FALLBACK);
        assert_eq!(outcome.route, Route::Grounded);
        assert!(outcome.sources.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_to_empty_removes_index_and_grounded_falls_back() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("unused");
        let engine = engine_with(&config, llm.clone());

        let sky = write_doc(dir.path(), "sky.txt", "The sky is blue.");
        engine.ingest_files(&[sky]).await.unwrap();
        assert!(engine.has_index());

        let rebuilt = engine.rebuild_index(&[]).await.unwrap();
        assert!(rebuilt.is_none());
        assert!(!engine.has_index());
        assert!(!index_file(&config).exists());

        let outcome = engine.chat("What color is the sky?", None, &[]).await.unwrap();
        assert_eq!(outcome.answer, NO_CONTEXT_FALLBACK);
        assert!(outcome.sources.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_drops_removed_sources() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let engine = engine_with(&config, MockLlm::canned("unused"));

        let alpha = write_doc(dir.path(), "alpha.txt", "Alpha keeps its own facts.");
        let beta = write_doc(dir.path(), "beta.txt", "Beta keeps different facts.");
        engine.ingest_files(&[alpha, beta.clone()]).await.unwrap();
        assert_eq!(engine.current_index().unwrap().len(), 2);

        engine.rebuild_index(&[beta.clone()]).await.unwrap();

        let index = engine.current_index().unwrap();
        assert_eq!(index.len(), 1);
        let results = index.search(&mock_embedding("facts"), 10).unwrap();
        for result in &results {
            assert_eq!(result.chunk.metadata.source, beta.to_string_lossy());
        }

        // The persisted form matches the swapped-in index
        let loaded = VectorIndex::load(&config.storage.index_dir).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_inferred_gate_blocks_generation_on_thin_context() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        let llm = MockLlm::scripted(&["question"]);
        let engine = engine_with(&config, llm.clone());

        let tiny = write_doc(dir.path(), "tiny.txt", "Short note.");
        engine.ingest_files(&[tiny]).await.unwrap();

        let outcome = engine.chat("What does the note say?", None, &[]).await.unwrap();

        assert_eq!(outcome.answer, NO_CONTEXT_FALLBACK);
        assert!(outcome.sources.is_empty());
        // Only the classification call went out; no generation happened
        assert_eq!(llm.call_count(), 1);
        assert!(llm.prompts()[0].contains("Classify"));
    }

    #[tokio::test]
    async fn test_inferred_gate_passes_with_substantial_context() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        let llm = MockLlm::scripted(&["question", "Drain, release, verify."]);
        let engine = engine_with(&config, llm.clone());

        let doc = write_doc(dir.path(), "deploy.txt", LONG_DOC);
        engine.ingest_files(&[doc.clone()]).await.unwrap();

        let outcome = engine.chat("How do deployments work?", None, &[]).await.unwrap();

        assert_eq!(outcome.answer, "Drain, release, verify.");
        assert_eq!(outcome.route, Route::Grounded);
        assert_eq!(outcome.sources, vec![doc.to_string_lossy().into_owned()]);
        assert_eq!(llm.call_count(), 2);
        assert!(llm.prompts()[1].contains("only these excerpts"));
    }

    #[tokio::test]
    async fn test_inferred_playbook_route_uses_playbook_prompt() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        config.routing.playbook_reference = "the ops playbook template".to_string();
        let llm = MockLlm::scripted(&["playbook_writing", "# Playbook\n..."]);
        let engine = engine_with(&config, llm.clone());

        let doc = write_doc(dir.path(), "deploy.txt", LONG_DOC);
        engine.ingest_files(&[doc.clone()]).await.unwrap();

        let outcome = engine
            .chat("Write a deployment playbook", None, &[])
            .await
            .unwrap();

        assert_eq!(outcome.route, Route::Playbook);
        assert_eq!(outcome.sources, vec![doc.to_string_lossy().into_owned()]);
        assert!(llm.prompts()[1].contains("the ops playbook template"));
        assert!(llm.prompts()[1].contains("no surrounding commentary"));
    }

    #[tokio::test]
    async fn test_inferred_autre_label_routes_direct() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        let llm = MockLlm::scripted(&["autre", "You're welcome!"]);
        let engine = engine_with(&config, llm.clone());

        let outcome = engine.chat("thanks!", None, &[]).await.unwrap();

        assert_eq!(outcome.route, Route::Direct);
        assert_eq!(outcome.answer, "You're welcome!");
        assert!(outcome.sources.is_empty());
        assert!(!llm.prompts()[1].contains("excerpts"));
    }

    #[tokio::test]
    async fn test_unparseable_classifier_output_defaults_to_question() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        let llm = MockLlm::scripted(&["no idea, sorry", "Grounded reply."]);
        let engine = engine_with(&config, llm.clone());

        let doc = write_doc(dir.path(), "deploy.txt", LONG_DOC);
        engine.ingest_files(&[doc]).await.unwrap();

        let outcome = engine.chat("How do deployments work?", None, &[]).await.unwrap();

        assert_eq!(outcome.route, Route::Grounded);
        assert_eq!(outcome.answer, "Grounded reply.");
    }

    #[tokio::test]
    async fn test_explicit_mode_skips_classification_under_inferred_strategy() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.routing.strategy = RouterStrategy::Inferred;
        let llm = MockLlm::canned("Direct answer.");
        let engine = engine_with(&config, llm.clone());

        let outcome = engine.chat("Hello", Some("direct"), &[]).await.unwrap();

        assert_eq!(outcome.route, Route::Direct);
        assert_eq!(llm.call_count(), 1);
        assert!(!llm.prompts()[0].contains("Classify"));
    }

    #[tokio::test]
    async fn test_bootstrap_ingests_docs_dir_once() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        write_doc(dir.path(), "seed.txt", "Seed content for the first index.");

        let engine = engine_with(&config, MockLlm::canned("unused"));
        assert!(!engine.has_index());
        engine.bootstrap().await.unwrap();
        assert!(engine.has_index());
        let built = engine.current_index().unwrap().len();

        // A second engine loads the persisted index; bootstrap is a no-op
        let engine2 = engine_with(&config, MockLlm::canned("unused"));
        assert!(engine2.has_index());
        engine2.bootstrap().await.unwrap();
        assert_eq!(engine2.current_index().unwrap().len(), built);
    }

    #[tokio::test]
    async fn test_history_is_rendered_into_the_prompt() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("Nice to meet you, Ana.");
        let engine = engine_with(&config, llm.clone());

        let history = vec![
            ChatTurn::user("My name is Ana"),
            ChatTurn::assistant("Noted."),
        ];
        engine
            .chat("What is my name?", Some("direct"), &history)
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Conversation history:"));
        assert!(prompt.contains("User: My name is Ana"));
        assert!(prompt.contains("Assistant: Noted."));
    }

    #[tokio::test]
    async fn test_routing_is_deterministic_across_repeated_calls() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = MockLlm::canned("answer");
        let engine = engine_with(&config, llm.clone());

        for _ in 0..5 {
            let outcome = engine.chat("Hello", Some("direct"), &[]).await.unwrap();
            assert_eq!(outcome.route, Route::Direct);
        }
    }
}
