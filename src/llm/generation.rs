//! Generation client: prompt construction, the remote call, and recovery of
//! a structured summary from free-text replies.

use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use serde::Deserialize;
use tracing::{Instrument, debug, warn};

use super::Completer;
use crate::error::{Error, Result};
use crate::model::Summary;
use crate::model::category;
use crate::telemetry::{genai, metrics};

/// Produces a [`Summary`] for one topic via a remote completion.
pub struct GenerationClient<C> {
    completer: C,
    timeout: Duration,
}

impl<C: Completer> GenerationClient<C> {
    pub fn new(completer: C, timeout: Duration) -> Self {
        Self { completer, timeout }
    }

    pub fn completer(&self) -> &C {
        &self.completer
    }

    /// Generate the content fields for `topic`.
    ///
    /// A reply without any JSON object yields [`fallback_summary`]. A failed
    /// or timed-out call, or a JSON object that is not a usable summary,
    /// is an [`Error::Generation`].
    pub async fn generate(&self, topic: &str) -> Result<Summary> {
        let prompt = build_prompt(topic);
        let span = genai::start_chat_span(self.completer.model(), self.completer.provider());
        let start = Instant::now();

        let reply = tokio::time::timeout(self.timeout, self.completer.complete(&prompt))
            .instrument(span)
            .await;

        metrics::generation_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("model", self.completer.model().to_string())],
        );

        let text = match reply {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(topic, error = %e, "remote generation call failed");
                return Err(e);
            }
            Err(_) => {
                warn!(topic, timeout_secs = self.timeout.as_secs(), "remote generation call timed out");
                return Err(Error::Generation(format!(
                    "no reply within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        parse_reply(&text)
    }
}

/// Deterministic prompt embedding the topic and the category enumeration.
pub fn build_prompt(topic: &str) -> String {
    format!(
        "Создай краткое содержание (до 10 предложений) для реферата по теме: \"{topic}\".\n\
         Пиши так, как если бы это был фрагмент основной части реферата, а не аннотация или описание. \
         Не используй фразы вроде 'в данном реферате', 'рассматривается', 'анализируется' и т.п. \
         Текст должен быть информативным, по существу, как будто это часть готового реферата.\n\
         Определи, к какой из следующих категорий относится тема реферата. \
         Используй только одну из категорий из списка ниже (категории перечислены полностью):\n\
         {categories}\n\
         Верни результат в формате JSON со следующими полями:\n\
         {{\n\
         \x20 \"summary\": \"краткое содержание реферата (до 10 предложений, как фрагмент реферата)\",\n\
         \x20 \"category\": \"категория из списка\",\n\
         \x20 \"product\": \"описание продукта/решения\",\n\
         \x20 \"problem\": \"описание проблемы\",\n\
         \x20 \"relevance\": \"актуальность темы\",\n\
         \x20 \"goal\": \"цель работы\",\n\
         \x20 \"resources\": \"необходимые ресурсы\",\n\
         \x20 \"roles\": \"роли в проекте\",\n\
         \x20 \"target_audience\": \"целевая аудитория\"\n\
         }}\n\
         Поле summary — только содержательная часть, без вводных фраз и описаний структуры работы. \
         Поле category — только одна категория из списка. \
         Для остальных полей (product, problem, relevance, goal, resources, roles, target_audience) \
         дай развернутый, но лаконичный ответ — 2-3 предложения.",
        categories = category::prompt_list(),
    )
}

/// Placeholder content used when a reply contains no JSON object at all.
pub fn fallback_summary() -> Summary {
    Summary {
        summary: "Краткое содержание реферата по данной теме. Основные положения и выводы исследования."
            .to_string(),
        category: category::OTHER.to_string(),
        product: "Продукт по теме реферата".to_string(),
        problem: "Проблема, которую решает данная тема".to_string(),
        relevance: "Актуальность темы в современном мире".to_string(),
        goal: "Цель исследования".to_string(),
        resources: "Необходимые ресурсы для реализации".to_string(),
        roles: "Роли участников проекта".to_string(),
        target_audience: "Целевая аудитория".to_string(),
    }
}

/// Reply shape. `category` may be omitted; it is normalised afterwards.
#[derive(Deserialize)]
struct Reply {
    summary: String,
    #[serde(default)]
    category: String,
    product: String,
    problem: String,
    relevance: String,
    goal: String,
    resources: String,
    roles: String,
    target_audience: String,
}

fn parse_reply(text: &str) -> Result<Summary> {
    let Some(object) = find_json_object(text) else {
        debug!(reply_len = text.len(), "reply has no JSON object, using fallback");
        return Ok(fallback_summary());
    };

    let reply: Reply = serde_json::from_str(object)
        .map_err(|e| Error::Generation(format!("malformed summary in reply: {e}")))?;

    Ok(Summary {
        summary: reply.summary,
        category: category::normalize(&reply.category),
        product: reply.product,
        problem: reply.problem,
        relevance: reply.relevance,
        goal: reply.goal,
        resources: reply.resources,
        roles: reply.roles,
        target_audience: reply.target_audience,
    })
}

/// Locate the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals are ignored. If an opening brace
/// never closes, scanning resumes at the next opening brace.
pub fn find_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut from = 0;

    while let Some(offset) = bytes[from..].iter().position(|b| *b == b'{') {
        let start = from + offset;
        if let Some(end) = balanced_end(&bytes[start..]) {
            return Some(&text[start..=start + end]);
        }
        from = start + 1;
    }
    None
}

/// Index of the brace closing the one at `bytes[0]`, if any.
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
