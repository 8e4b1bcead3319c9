//! Shared mock capabilities for integration tests.
//!
//! `RegisterModel` answers every analysis prompt from two fixed registers: a
//! formal business memo and a casual chat. Prompts mentioning a casual marker
//! get casual answers, everything else formal ones. Rewrite prompts are
//! answered from a queue.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use scrivener_rs::providers::{CompletionOptions, EmbeddingCapability, HashingEmbedder, LanguageModel};
use scrivener_rs::{Result, ScrivenerError};

pub const FORMAL_TEXT: &str = "本公司将于下周召开季度商务会议。会议将审议合同条款，并确定项目预算。\
因此，请各部门负责人提前准备专业报告，确保数据严谨。";

pub const CASUAL_TEXT: &str = "嗨！今天心情超级好！和朋友聊天到半夜，哈哈，太开心了！周末去海边吧？";

pub const FORMAL_UNITS: [&str; 4] = ["商务会议", "合同条款", "项目预算", "专业报告"];

pub const CASUAL_UNITS: [&str; 4] = ["心情", "朋友", "海边", "开心"];

const CASUAL_MARKERS: [&str; 3] = ["嗨", "哈哈", "聊天"];

const EMBEDDING_DIMENSION: usize = 8;

fn is_casual(prompt: &str) -> bool {
    CASUAL_MARKERS
        .iter()
        .chain(CASUAL_UNITS.iter())
        .any(|marker| prompt.contains(marker))
}

fn formal_units_reply() -> String {
    let mut units: Vec<String> = FORMAL_UNITS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let role = if i == 0 { "core-concept" } else { "related-concept" };
            format!(
                r#"{{"text": "{text}", "role": "{role}", "importance": {}, "sentiment": "neutral", "intensity": 1}}"#,
                5 - i.min(2)
            )
        })
        .collect();
    // Same span under a second role: kept as a unit, embedded once.
    units.push(format!(
        r#"{{"text": "{}", "role": "named-entity", "importance": 2, "sentiment": "neutral", "intensity": 1}}"#,
        FORMAL_UNITS[0]
    ));
    format!(r#"{{"units": [{}]}}"#, units.join(", "))
}

fn casual_units_reply() -> String {
    let units: Vec<String> = CASUAL_UNITS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let role = match i {
                0 => "core-concept",
                3 => "key-adjective",
                _ => "related-concept",
            };
            format!(
                r#"{{"text": "{text}", "role": "{role}", "importance": 4, "sentiment": "positive", "intensity": 5}}"#
            )
        })
        .collect();
    format!(r#"{{"units": [{}]}}"#, units.join(", "))
}

const GENERIC_UNITS_REPLY: &str = r#"{"units": [
    {"text": "notes", "role": "core-concept", "importance": 4, "sentiment": "neutral", "intensity": 1},
    {"text": "ideas", "role": "related-concept", "importance": 3, "sentiment": "positive", "intensity": 3},
    {"text": "weather", "role": "related-concept", "importance": 2, "sentiment": "negative", "intensity": 2}
]}"#;

const FORMAL_RATINGS: &str = r#"{"concept-organization": 5, "semantic-coherence": 5,
    "innovative-association": 1, "emotional-expressiveness": 1,
    "cognitive-complexity": 4, "thematic-focus": 5}"#;

const CASUAL_RATINGS: &str = r#"{"concept-organization": 1, "semantic-coherence": 1,
    "innovative-association": 4, "emotional-expressiveness": 5,
    "cognitive-complexity": 1, "thematic-focus": 1}"#;

/// Prompt-routed language model over the formal and casual registers.
#[derive(Default)]
pub struct RegisterModel {
    rewrites: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl RegisterModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue replies for rewrite prompts.
    pub fn with_rewrites(replies: &[&str]) -> Arc<Self> {
        let model = Self::default();
        model
            .rewrites
            .lock()
            .extend(replies.iter().map(|reply| (*reply).to_string()));
        Arc::new(model)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received that start with `prefix`.
    pub fn prompts_starting_with(&self, prefix: &str) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|prompt| prompt.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn route(&self, prompt: &str) -> Option<String> {
        if prompt.starts_with("Rewrite the text below") || prompt.starts_with("Adjust the style") {
            return self.rewrites.lock().pop_front();
        }
        let casual = is_casual(prompt);
        let generic = !casual && !FORMAL_UNITS.iter().any(|unit| prompt.contains(unit))
            && !prompt.contains("商务");

        let reply = if prompt.contains("Extract the semantic units") {
            if casual {
                casual_units_reply()
            } else if generic {
                GENERIC_UNITS_REPLY.to_string()
            } else {
                formal_units_reply()
            }
        } else if prompt.contains("Rate the writing style") {
            let ratings = if casual { CASUAL_RATINGS } else { FORMAL_RATINGS };
            ratings.to_string()
        } else if prompt.contains("The following concepts were grouped together") {
            let score = if casual { 1 } else { 5 };
            format!(r#"{{"coherence": {score}, "theme": "主题"}}"#)
        } else if prompt.contains("Classify the association") {
            let class = if casual {
                "creative-association"
            } else {
                "meaningless-juxtaposition"
            };
            format!(r#"{{"class": "{class}"}}"#)
        } else {
            return None;
        };
        Some(reply)
    }
}

#[async_trait]
impl LanguageModel for RegisterModel {
    fn name(&self) -> &str {
        "register-mock"
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        self.route(prompt)
            .ok_or_else(|| ScrivenerError::provider("register-mock", "no scripted reply"))
    }
}

/// Embedder placing formal units in one tight bundle and casual units on
/// orthogonal axes; other texts are feature-hashed. Records every batch.
pub struct ConceptEmbedder {
    hashing: HashingEmbedder,
    batches: Mutex<Vec<Vec<String>>>,
}

impl Default for ConceptEmbedder {
    fn default() -> Self {
        Self {
            hashing: HashingEmbedder::new(EMBEDDING_DIMENSION),
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl ConceptEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    /// Every text ever sent, in order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        if let Some(i) = FORMAL_UNITS.iter().position(|unit| *unit == text) {
            let mut vector = vec![0.0; EMBEDDING_DIMENSION];
            vector[0] = 1.0;
            vector[1] = 0.02 * i as f32;
            return vector;
        }
        if let Some(i) = CASUAL_UNITS.iter().position(|unit| *unit == text) {
            let mut vector = vec![0.0; EMBEDDING_DIMENSION];
            vector[2 + i] = 1.0;
            return vector;
        }
        self.hashing.embed_text(text)
    }
}

#[async_trait]
impl EmbeddingCapability for ConceptEmbedder {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().push(texts.to_vec());
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}
