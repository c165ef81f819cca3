//! Port doubles shared by use-case tests.

use crate::domain::DomainError;
use crate::ports::{Notice, NoticeLevel, NoticePort, PromptPort, SessionStorePort};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    last_group: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn with_group(code: &str) -> Self {
        Self {
            last_group: Mutex::new(Some(code.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl SessionStorePort for MemoryStore {
    async fn last_group(&self) -> Result<Option<String>, DomainError> {
        Ok(self.last_group.lock().unwrap().clone())
    }

    async fn set_last_group(&self, code: &str) -> Result<(), DomainError> {
        *self.last_group.lock().unwrap() = Some(code.to_string());
        Ok(())
    }
}

/// A store whose disk is gone: reads find nothing, writes fail.
pub struct FailingStore;

#[async_trait::async_trait]
impl SessionStorePort for FailingStore {
    async fn last_group(&self) -> Result<Option<String>, DomainError> {
        Ok(None)
    }

    async fn set_last_group(&self, _code: &str) -> Result<(), DomainError> {
        Err(DomainError::State("read-only file system".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotices {
    seen: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub fn all(&self) -> Vec<Notice> {
        self.seen.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.text)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Info)
            .map(|n| n.text)
            .collect()
    }
}

impl NoticePort for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.seen.lock().unwrap().push(notice);
    }
}

/// Answers prompts from a script; an exhausted script cancels / declines.
#[derive(Default)]
pub struct ScriptedPrompt {
    texts: Mutex<VecDeque<Option<String>>>,
    confirms: Mutex<VecDeque<bool>>,
}

impl ScriptedPrompt {
    pub fn answering_text(answer: Option<&str>) -> Self {
        let p = Self::default();
        p.texts.lock().unwrap().push_back(answer.map(String::from));
        p
    }

    pub fn answering_confirm(answer: bool) -> Self {
        let p = Self::default();
        p.confirms.lock().unwrap().push_back(answer);
        p
    }
}

impl PromptPort for ScriptedPrompt {
    fn text(&self, _message: &str) -> Result<Option<String>, DomainError> {
        Ok(self.texts.lock().unwrap().pop_front().flatten())
    }

    fn confirm(&self, _message: &str) -> Result<bool, DomainError> {
        Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(false))
    }
}
