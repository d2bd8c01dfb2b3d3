//! Claims producer implementations.
//!
//! Concrete implementations of the [`ClaimsProducer`] trait:
//! - **[`DisabledProducer`]**: returns errors; used when no producer is
//!   configured.
//! - **[`LlmProducer`]**: calls an OpenAI-compatible chat-completions
//!   endpoint with a forced function tool call for structured output,
//!   with retry and backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! The structured output from the model is claims, nothing more: every
//! tree it returns goes through [`verify_tree`](ghostcut_core::verify::verify_tree)
//! before any number reaches a client.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use ghostcut_core::audit::AuditReport;
use ghostcut_core::models::Chunk;
use ghostcut_core::producer::{ClaimsProducer, ClaimsResponse};

use crate::config::ProducerConfig;

/// A no-op producer that always returns errors.
///
/// Used when `producer.provider = "disabled"` in the configuration.
pub struct DisabledProducer;

#[async_trait]
impl ClaimsProducer for DisabledProducer {
    async fn produce_claims(&self, _file_name: &str, _chunks: &[Chunk]) -> Result<ClaimsResponse> {
        bail!("Claims producer is disabled; set producer.provider in the config")
    }

    async fn audit_retrieval(
        &self,
        _query: &str,
        _source_excerpt: &str,
        _chunks: &[Chunk],
    ) -> Result<AuditReport> {
        bail!("Claims producer is disabled; set producer.provider in the config")
    }
}

/// Producer backed by an OpenAI-compatible chat-completions API.
///
/// Requires the `GHOSTCUT_API_KEY` environment variable.
pub struct LlmProducer {
    config: ProducerConfig,
}

impl LlmProducer {
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        if std::env::var("GHOSTCUT_API_KEY").is_err() {
            bail!("GHOSTCUT_API_KEY environment variable not set");
        }
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Call the chat-completions endpoint forcing a tool call, with
    /// retry/backoff, and return the parsed tool-call arguments.
    async fn call_tool(&self, messages: Value, tool: Value, tool_name: &str) -> Result<Value> {
        let api_key = std::env::var("GHOSTCUT_API_KEY")
            .map_err(|_| anyhow::anyhow!("GHOSTCUT_API_KEY not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;

        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "tools": [tool],
            "tool_choice": { "type": "function", "function": { "name": tool_name } },
        });

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&self.config.base_url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let payload: Value = response.json().await?;
                        return extract_tool_arguments(&payload);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Producer API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Producer API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("Rate limit exceeded, please try again later")))
    }
}

/// Pull the first tool call's arguments out of a chat-completions response.
fn extract_tool_arguments(payload: &Value) -> Result<Value> {
    let arguments = payload
        .pointer("/choices/0/message/tool_calls/0/function/arguments")
        .and_then(|a| a.as_str())
        .ok_or_else(|| anyhow::anyhow!("Producer did not return structured tool output"))?;
    serde_json::from_str(arguments)
        .map_err(|e| anyhow::anyhow!("Producer returned unparseable tool arguments: {}", e))
}

#[async_trait]
impl ClaimsProducer for LlmProducer {
    async fn produce_claims(&self, file_name: &str, chunks: &[Chunk]) -> Result<ClaimsResponse> {
        let chunked_text = chunks
            .iter()
            .map(|c| format!("[{}]\n{}", c.source_ref, c.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let messages = json!([
            { "role": "system", "content": COMPRESS_SYSTEM_PROMPT },
            {
                "role": "user",
                "content": format!(
                    "Analyze and compress this document titled \"{}\". Produce a 3-level \
hierarchical summary with executive alerts and importance detection.\n\n\
SOURCE DOCUMENT ({} chunks):\n{}",
                    file_name,
                    chunks.len(),
                    chunked_text
                ),
            },
        ]);

        let arguments = self
            .call_tool(messages, compression_tool(), "hierarchical_compression")
            .await?;

        let response: ClaimsResponse = serde_json::from_value(arguments)
            .map_err(|e| anyhow::anyhow!("Producer compression output did not match schema: {}", e))?;
        Ok(response)
    }

    async fn audit_retrieval(
        &self,
        query: &str,
        source_excerpt: &str,
        chunks: &[Chunk],
    ) -> Result<AuditReport> {
        let chunks_text = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[Chunk {}] {}", i + 1, c.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = json!([
            { "role": "system", "content": AUDIT_SYSTEM_PROMPT },
            {
                "role": "user",
                "content": format!(
                    "Query: \"{}\"\n\nDocument text excerpt:\n{}\n\nRetrieved chunks:\n{}",
                    query, source_excerpt, chunks_text
                ),
            },
        ]);

        let arguments = self
            .call_tool(messages, audit_tool(), "retrieval_audit")
            .await?;

        let report: AuditReport = serde_json::from_value(arguments)
            .map_err(|e| anyhow::anyhow!("Producer audit output did not match schema: {}", e))?;
        Ok(report)
    }
}

const COMPRESS_SYSTEM_PROMPT: &str = "\
You are an expert document intelligence AI that produces MULTI-LEVEL HIERARCHICAL \
COMPRESSION with executive alerts and importance detection.

CRITICAL RULES:
1. ONLY use text directly present in the source document. NEVER invent or infer.
2. Every claim MUST have exact source evidence quotes.
3. Preserve original wording, names, dates, numbers EXACTLY.
4. If information is missing, output \"Not present in source document\".

YOUR TASK - Generate THREE levels of compression PLUS executive alerts and importance scores:

LEVEL 1 - EXECUTIVE SUMMARY (id prefix: \"exec-\"): ONE document-level summary node with \
level=\"document\". The summary field is 3-5 concise bullet points capturing the most \
important facts, cross-referencing all chunks and deduplicating repeated information. \
The evidence field is key supporting quotes concatenated.

LEVEL 2 - SECTION SUMMARIES (id prefix: \"sec-\"): children of the executive node, each \
with level=\"chapter\". Group related chunks into thematic sections; each is one short \
paragraph that abstracts and synthesizes.

LEVEL 3 - EVIDENCE DETAILS (id prefix: \"ev-\"): children of each section, each with \
level=\"section\". Individual facts with exact original wording.

EXECUTIVE ALERTS: detect deadlines, risks, financial impacts, policy or compliance \
issues, and critical decisions. Each alert needs category, severity, title, description, \
evidence, and a recommendation.

AI DECISIONS: for each major compression decision, explain the action taken, the reason, \
supporting evidence, and a 0-100 confidence.

ENTITIES: extract numbers, dates, risks, constraints, and exceptions from source text only.";

const AUDIT_SYSTEM_PROMPT: &str = "\
You are a retrieval integrity auditor. Given a user query and document chunks, analyze \
retrieval quality using the provided tool.

Rules:
- Evaluate each chunk's relevance to the query (assign similarity 0.0-1.0)
- Mark chunks as relevant (isRelevant: true) or noise (isNoise: true)
- Compute an integrity score 0-100 based on coverage, relevance, and completeness
- Identify missing important evidence and irrelevant noise chunks
- Generate coverage data for different query aspects
- Provide specific improvement suggestions (query rewriting, re-chunking, hybrid retrieval)
- Explain why the retrieval is sufficient or insufficient";

fn importance_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "level": { "type": "string", "enum": ["critical", "important", "supporting"] },
            "score": { "type": "number", "description": "0-100 importance score" },
            "reason": { "type": "string" },
        },
        "required": ["level", "score", "reason"],
        "additionalProperties": false,
    })
}

fn entities_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "numbers": { "type": "array", "items": { "type": "string" } },
            "dates": { "type": "array", "items": { "type": "string" } },
            "risks": { "type": "array", "items": { "type": "string" } },
            "constraints": { "type": "array", "items": { "type": "string" } },
            "exceptions": { "type": "array", "items": { "type": "string" } },
        },
        "required": ["numbers", "dates", "risks", "constraints", "exceptions"],
        "additionalProperties": false,
    })
}

/// One claims-tree node level. `levels` restricts the `level` enum and
/// `children` nests the next depth (section nodes are leaves).
fn claim_node_schema(levels: &[&str], children: Option<Value>) -> Value {
    let mut properties = json!({
        "id": { "type": "string" },
        "title": { "type": "string" },
        "level": { "type": "string", "enum": levels },
        "summary": { "type": "string" },
        "evidence": { "type": "string", "description": "Exact quote(s) from source text" },
        "sourceRef": { "type": "string", "description": "Line range reference e.g. 'Lines 1-50'" },
        "importance": importance_schema(),
        "extractedEntities": entities_schema(),
    });
    if let Some(child) = children {
        properties["children"] = json!({ "type": "array", "items": child });
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["id", "title", "level", "summary", "evidence"],
        "additionalProperties": false,
    })
}

/// Function-call schema for the 3-level compression output.
fn compression_tool() -> Value {
    let section = claim_node_schema(&["section"], None);
    let chapter = claim_node_schema(&["chapter"], Some(section));
    let document = claim_node_schema(&["document"], Some(chapter));

    json!({
        "type": "function",
        "function": {
            "name": "hierarchical_compression",
            "description": "Return multi-level hierarchical document compression with alerts and explainability",
            "parameters": {
                "type": "object",
                "properties": {
                    "summaries": {
                        "type": "array",
                        "description": "ONE document-level executive summary with section children, each with evidence children",
                        "items": document,
                    },
                    "executiveAlerts": {
                        "type": "array",
                        "description": "Auto-detected deadlines, risks, financial impacts, policy issues",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "category": { "type": "string", "enum": ["deadline", "risk", "financial", "policy", "critical"] },
                                "severity": { "type": "string", "enum": ["high", "medium", "low"] },
                                "title": { "type": "string" },
                                "description": { "type": "string" },
                                "evidence": { "type": "string" },
                                "recommendation": { "type": "string" },
                            },
                            "required": ["id", "category", "severity", "title", "description", "evidence"],
                            "additionalProperties": false,
                        },
                    },
                    "aiDecisions": {
                        "type": "array",
                        "description": "Explain each major AI decision made during compression",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "action": { "type": "string" },
                                "reason": { "type": "string" },
                                "evidence": { "type": "string" },
                                "confidence": { "type": "number" },
                            },
                            "required": ["id", "action", "reason", "evidence", "confidence"],
                            "additionalProperties": false,
                        },
                    },
                },
                "required": ["summaries", "executiveAlerts", "aiDecisions"],
                "additionalProperties": false,
            },
        },
    })
}

/// Function-call schema for the retrieval audit output.
fn audit_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": "retrieval_audit",
            "description": "Return retrieval audit results with scores, coverage, and recommendations",
            "parameters": {
                "type": "object",
                "properties": {
                    "retrievedChunks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "text": { "type": "string" },
                                "similarity": { "type": "number" },
                                "isRelevant": { "type": "boolean" },
                                "isNoise": { "type": "boolean" },
                                "sourceRef": { "type": "string" },
                            },
                            "required": ["id", "text", "similarity", "isRelevant", "isNoise"],
                            "additionalProperties": false,
                        },
                    },
                    "integrityScore": { "type": "number" },
                    "coverageData": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string" },
                                "coverage": { "type": "number" },
                            },
                            "required": ["label", "coverage"],
                            "additionalProperties": false,
                        },
                    },
                    "alerts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "type": { "type": "string", "enum": ["missing", "noise", "info"] },
                                "title": { "type": "string" },
                                "description": { "type": "string" },
                                "suggestion": { "type": "string" },
                            },
                            "required": ["id", "type", "title", "description"],
                            "additionalProperties": false,
                        },
                    },
                    "explanation": { "type": "string" },
                    "suggestions": { "type": "array", "items": { "type": "string" } },
                },
                "required": ["retrievedChunks", "integrityScore", "coverageData", "alerts", "explanation", "suggestions"],
                "additionalProperties": false,
            },
        },
    })
}

/// Create the appropriate [`ClaimsProducer`] based on configuration.
///
/// | Config Value | Producer |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProducer`] |
/// | `"openai"` | [`LlmProducer`] |
pub fn create_producer(config: &ProducerConfig) -> Result<Box<dyn ClaimsProducer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProducer)),
        "openai" => Ok(Box::new(LlmProducer::new(config)?)),
        other => bail!("Unknown claims producer: {}", other),
    }
}
