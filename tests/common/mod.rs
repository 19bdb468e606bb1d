//! Shared fixtures: scripted completers, temp stores, sample items.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use essaygen::engine::{BatchConfig, BatchProcessor};
use essaygen::error::{Error, Result};
use essaygen::event::ProgressEvent;
use essaygen::llm::{Completer, GenerationClient};
use essaygen::model::{Item, ItemId, Summary};
use essaygen::progress::ProgressSink;
use essaygen::storage::ItemStore;

/// A fresh, not-yet-created directory under the system temp dir.
pub fn temp_data_dir() -> PathBuf {
    std::env::temp_dir()
        .join("essaygen-test")
        .join(uuid::Uuid::new_v4().to_string())
}

/// How the scripted remote service answers one topic.
#[derive(Clone)]
pub enum Script {
    Text(String),
    Fail(String),
    Hang,
}

/// Completer that answers by topic. Unscripted topics get a well-formed
/// JSON reply wrapped in prose.
#[derive(Default)]
pub struct ScriptedCompleter {
    scripts: HashMap<String, Script>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, topic: &str, script: Script) -> Self {
        self.scripts.insert(topic.to_string(), script);
        self
    }

    pub fn fail(self, topic: &str, message: &str) -> Self {
        self.with(topic, Script::Fail(message.to_string()))
    }

    fn script_for(&self, prompt: &str) -> Option<Script> {
        self.scripts
            .iter()
            .find(|(topic, _)| prompt.contains(&format!("\"{topic}\"")))
            .map(|(_, script)| script.clone())
    }
}

impl Completer for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.script_for(prompt) {
            Some(Script::Text(text)) => Ok(text),
            Some(Script::Fail(message)) => Err(Error::Generation(message)),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(format!(
                "Конечно! Вот ответ:\n{}\nНадеюсь, это поможет.",
                reply_json("Медицина")
            )),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// A complete reply object with the given category.
pub fn reply_json(category: &str) -> String {
    serde_json::json!({
        "summary": "Телемедицина сокращает расстояние между врачом и пациентом.",
        "category": category,
        "product": "Платформа удалённых консультаций",
        "problem": "Нехватка специалистов в сельских районах",
        "relevance": "Рост цифровизации здравоохранения",
        "goal": "Повысить доступность медицинской помощи",
        "resources": "Серверы, врачи, каналы связи",
        "roles": "Врач, администратор, пациент",
        "target_audience": "Жители удалённых населённых пунктов"
    })
    .to_string()
}

pub fn sample_summary() -> Summary {
    Summary {
        summary: "Краткое содержание".to_string(),
        category: "Медицина".to_string(),
        product: "Продукт".to_string(),
        problem: "Проблема".to_string(),
        relevance: "Актуальность".to_string(),
        goal: "Цель".to_string(),
        resources: "Ресурсы".to_string(),
        roles: "Роли".to_string(),
        target_audience: "Аудитория".to_string(),
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn generated(id: i64, topic: &str) -> Item {
    Item::generated(ItemId(id), topic, sample_summary(), at(id))
}

pub fn failed(id: i64, topic: &str) -> Item {
    Item::failed(ItemId(id), topic, "generation failed: upstream 503", at(id))
}

/// Sink that keeps every event it sees.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ProgressEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Processor with no inter-request delay, over a fresh temp store.
pub fn processor<C: Completer>(
    completer: C,
    sink: Arc<dyn ProgressSink>,
    flush_every: usize,
    chunk_size: usize,
) -> BatchProcessor<C> {
    let store = Arc::new(ItemStore::new(temp_data_dir(), chunk_size));
    BatchProcessor::new(
        GenerationClient::new(completer, Duration::from_secs(5)),
        store,
        sink,
        BatchConfig {
            request_delay: Duration::ZERO,
            flush_every,
        },
    )
}
