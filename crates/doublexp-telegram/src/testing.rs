//! Fakes shared by the unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use doublexp_core::{parse_report, MissionError, MissionReport, MissionSource};
use doublexp_models::{Selector, SubscriberId};

use crate::error::{Result, TelegramError};
use crate::gateway::{Markup, MessageGateway};

/// One Double XP mission in Crystalline Caverns, outside the running season.
pub const SCENARIO: &str = r#"{
    "Biomes": {
        "Crystalline Caverns": [
            {
                "MissionMutator": "Double XP",
                "CodeName": "X1",
                "Complexity": "C",
                "Length": "Short",
                "PrimaryObjective": "A",
                "SecondaryObjective": "B",
                "MissionWarnings": [],
                "included_in": ["s1"]
            }
        ]
    },
    "timestamp": "2024-05-02T15:30:00Z"
}"#;

pub const NO_MATCH: &str = r#"{
    "Biomes": { "Magma Core": [] },
    "timestamp": "2024-05-02T15:30:00Z"
}"#;

pub enum Response {
    Body(&'static str),
    Down,
}

/// Mission source answering every fetch with a fixed response.
pub struct FakeSource {
    response: Response,
    delay: Duration,
    calls: Mutex<Vec<Selector>>,
}

impl FakeSource {
    pub fn new(response: Response) -> Arc<Self> {
        Self::slow(response, Duration::ZERO)
    }

    /// Source that takes `delay` (tokio time) to answer.
    pub fn slow(response: Response, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response,
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Selectors fetched so far, recorded when each fetch starts.
    pub fn calls(&self) -> Vec<Selector> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MissionSource for FakeSource {
    async fn fetch(&self, selector: Selector) -> doublexp_core::Result<MissionReport> {
        self.calls.lock().unwrap().push(selector);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.response {
            Response::Body(body) => parse_report(body),
            Response::Down => Err(MissionError::Transport("connection refused".to_string())),
        }
    }
}

/// Gateway recording every send; sends to `failing` chats are recorded and
/// then rejected.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(SubscriberId, String, Markup)>>,
    failing: HashSet<SubscriberId>,
}

impl RecordingGateway {
    pub fn failing(ids: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: ids.iter().map(|&id| SubscriberId(id)).collect(),
        })
    }

    pub fn sent(&self) -> Vec<(SubscriberId, String, Markup)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send(&self, chat: SubscriberId, text: &str, markup: Markup) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat, text.to_string(), markup));
        if self.failing.contains(&chat) {
            return Err(TelegramError::Delivery {
                chat_id: chat,
                reason: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        Ok(())
    }
}
