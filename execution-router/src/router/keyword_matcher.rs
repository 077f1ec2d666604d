//! Keyword-based knowledge-document matching.
//!
//! Maps a query to ranked candidate document ids using a static
//! keyword-to-document table, with no vector database involved. The table
//! carries keywords in both Korean and English; a YAML override lets
//! operators ship their own catalogue.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;

/// Score for a full keyword contained in the query
const EXACT_MATCH_SCORE: f64 = 10.0;

/// Score per shared token between a keyword and the query
const WORD_MATCH_SCORE: f64 = 3.0;

/// Built-in document-to-keyword table; entry order breaks score ties
fn default_keyword_table() -> Vec<(String, Vec<String>)> {
    let entry = |id: &str, keywords: &[&str]| {
        (
            id.to_string(),
            keywords.iter().map(|k| k.to_string()).collect(),
        )
    };

    vec![
        entry("01-model-architecture", &[
            "transformer", "llama", "mamba", "ssm", "attention", "architecture",
            "모델", "아키텍처", "트랜스포머",
        ]),
        entry("02-tokenization", &[
            "tokenizer", "bpe", "sentencepiece", "vocabulary", "토크나이저", "토큰",
        ]),
        entry("03-fine-tuning", &[
            "fine-tuning", "finetune", "lora", "qlora", "peft", "axolotl",
            "adapter", "instruction", "sft", "파인튜닝", "미세조정", "학습",
        ]),
        entry("05-data-processing", &[
            "data", "dataset", "dedup", "filtering", "ray", "preprocessing",
            "데이터", "전처리", "정제",
        ]),
        entry("06-post-training", &[
            "dpo", "rlhf", "grpo", "ppo", "rloo", "preference", "reward",
            "포스트트레이닝", "강화학습", "선호도",
        ]),
        entry("07-safety-alignment", &[
            "guardrails", "redteaming", "safety", "alignment", "jailbreak",
            "안전", "정렬", "가드레일",
        ]),
        entry("08-distributed-training", &[
            "deepspeed", "fsdp", "ddp", "distributed", "multi-gpu", "multi-node",
            "분산학습", "분산", "멀티gpu",
        ]),
        entry("10-optimization", &[
            "quantization", "pruning", "distillation", "compression", "4bit", "8bit",
            "양자화", "최적화", "경량화",
        ]),
        entry("11-evaluation", &[
            "lm-eval", "benchmark", "evaluation", "metrics", "harness",
            "평가", "벤치마크", "성능측정",
        ]),
        entry("12-inference-serving", &[
            "vllm", "tgi", "triton", "inference", "serving", "deploy",
            "추론", "서빙", "배포", "deployment",
        ]),
        entry("13-mlops", &[
            "wandb", "mlflow", "experiment", "tracking", "logging",
            "mlops", "실험관리",
        ]),
        entry("14-agents", &[
            "agent", "langchain", "crewai", "autogen", "tool", "function",
            "에이전트", "도구",
        ]),
        entry("15-rag", &[
            "rag", "retrieval", "vector", "embedding", "chroma", "faiss", "pinecone",
            "검색", "벡터", "임베딩", "지식베이스",
        ]),
        entry("16-prompt-engineering", &[
            "prompt", "dspy", "instructor", "structured", "few-shot",
            "프롬프트", "엔지니어링",
        ]),
        entry("17-observability", &[
            "observability", "logging", "tracing", "monitoring", "langsmith",
            "관측성", "모니터링", "로깅",
        ]),
        entry("18-multimodal", &[
            "multimodal", "clip", "whisper", "llava", "vision", "audio",
            "멀티모달", "비전", "음성",
        ]),
        entry("19-emerging-techniques", &[
            "moe", "mixture", "ssm", "state-space", "emerging",
            "신기술", "최신기술",
        ]),
        entry("20-trading", &[
            "trading", "ta-lib", "vectorbt", "backtest", "quant", "finance",
            "트레이딩", "퀀트", "금융", "주식",
        ]),
        entry("23-frontend-design-architect", &[
            "frontend", "ui", "ux", "react", "design", "component",
            "프론트엔드", "디자인", "ui/ux",
        ]),
        entry("24-spec-driven-planner", &[
            "spec", "specification", "planning", "task", "requirement",
            "스펙", "기획", "요구사항", "계획",
        ]),
    ]
}

/// Keyword-based document matcher with a reverse index for keyword lookup
pub struct KeywordMatcher {
    table: Vec<(String, Vec<String>)>,
    reverse_index: HashMap<String, Vec<String>>,
    token_re: Regex,
}

impl KeywordMatcher {
    /// Matcher over the built-in table
    pub fn new() -> Self {
        Self::with_table(default_keyword_table())
    }

    /// Matcher over a caller-supplied table; entry order is preserved and
    /// breaks score ties.
    pub fn with_table(table: Vec<(String, Vec<String>)>) -> Self {
        let mut reverse_index: HashMap<String, Vec<String>> = HashMap::new();
        for (document_id, keywords) in &table {
            for keyword in keywords {
                reverse_index
                    .entry(keyword.to_lowercase())
                    .or_default()
                    .push(document_id.clone());
            }
        }

        Self {
            table,
            reverse_index,
            token_re: Regex::new(r"\w+").expect("static regex"),
        }
    }

    /// Load a table from YAML: a sequence of `id: [keywords]` single-entry
    /// maps, so file order is authoritative.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let entries: Vec<HashMap<String, Vec<String>>> =
            serde_yaml::from_str(yaml).context("Failed to parse keyword table YAML")?;

        let mut table = Vec::new();
        for entry in entries {
            for (id, keywords) in entry {
                table.push((id, keywords));
            }
        }
        Ok(Self::with_table(table))
    }

    /// Rank documents against the query, best first.
    ///
    /// A keyword contained verbatim in the query scores 10; otherwise each
    /// token shared between keyword and query scores 3. Zero-score documents
    /// are dropped, ties keep table order, and the result is truncated to
    /// `max_results`.
    pub fn matches(&self, query: &str, max_results: usize) -> Vec<(String, f64)> {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = self
            .token_re
            .find_iter(&query_lower)
            .map(|m| m.as_str())
            .collect();

        let mut scored = Vec::new();
        for (document_id, keywords) in &self.table {
            let mut score = 0.0;

            for keyword in keywords {
                let keyword_lower = keyword.to_lowercase();

                if query_lower.contains(&keyword_lower) {
                    score += EXACT_MATCH_SCORE;
                    continue;
                }

                let keyword_words: HashSet<&str> = self
                    .token_re
                    .find_iter(&keyword_lower)
                    .map(|m| m.as_str())
                    .collect();
                let common = keyword_words.intersection(&query_words).count();
                if common > 0 {
                    score += common as f64 * WORD_MATCH_SCORE;
                }
            }

            if score > 0.0 {
                scored.push((document_id.clone(), score));
            }
        }

        // Stable sort: equal scores keep table order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);
        scored
    }

    /// Ranked document ids only
    pub fn match_ids(&self, query: &str, max_results: usize) -> Vec<String> {
        self.matches(query, max_results)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Keywords registered for a document
    pub fn keywords_for(&self, document_id: &str) -> Option<&[String]> {
        self.table
            .iter()
            .find(|(id, _)| id == document_id)
            .map(|(_, keywords)| keywords.as_slice())
    }

    /// Documents registered for a keyword, via the reverse index
    pub fn documents_for_keyword(&self, keyword: &str) -> &[String] {
        self.reverse_index
            .get(&keyword.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The full table, in order
    pub fn table(&self) -> &[(String, Vec<String>)] {
        &self.table
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new()
    }
}
