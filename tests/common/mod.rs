#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI32, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use quizbot::{
    error::QuizError,
    messenger::{Messenger, QuizPoll},
    providers::{Quote, QuestionSource, QuoteSource},
    state::{Question, QuizFilter},
};
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Sent {
    Text { chat: ChatId, text: String },
    Html { chat: ChatId, text: String },
    Keyboard { chat: ChatId, text: String, keyboard: InlineKeyboardMarkup },
    EditKeyboard { chat: ChatId, message: MessageId, keyboard: InlineKeyboardMarkup },
    Delete { chat: ChatId, message: MessageId },
    Poll { chat: ChatId, poll: QuizPoll, poll_id: String },
}

/// Records every call instead of talking to Telegram.
#[derive(Debug, Default)]
pub struct FakeMessenger {
    log: Mutex<Vec<Sent>>,
    next_message: AtomicI32,
    next_poll: AtomicUsize,
    failing_chats: Mutex<HashSet<ChatId>>,
    rejected_questions: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<Instant>>,
}

fn refused() -> QuizError {
    QuizError::Telegram(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked))
}

fn bad_poll() -> QuizError {
    QuizError::Telegram(teloxide::RequestError::Api(teloxide::ApiError::Unknown(
        "Bad Request: poll question length must not exceed 300".into(),
    )))
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later call targeting `chat` fails.
    pub fn fail_for(&self, chat: ChatId) {
        self.failing_chats.lock().unwrap().insert(chat);
    }

    /// Polls with this question text are refused by "Telegram".
    pub fn reject_poll(&self, question: &str) {
        self.rejected_questions.lock().unwrap().insert(question.to_owned());
    }

    /// When each call was made, failed ones included.
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn polls(&self) -> Vec<(ChatId, QuizPoll, String)> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Poll { chat, poll, poll_id } => Some((chat, poll, poll_id)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self, to: ChatId) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { chat, text } | Sent::Html { chat, text } if chat == to => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn keyboards(&self) -> Vec<(ChatId, String)> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Keyboard { chat, text, .. } => Some((chat, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, chat: ChatId, sent: Sent) -> Result<MessageId, QuizError> {
        self.attempts.lock().unwrap().push(Instant::now());
        if self.failing_chats.lock().unwrap().contains(&chat) {
            return Err(refused());
        }
        self.log.lock().unwrap().push(sent);
        Ok(MessageId(self.next_message.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, QuizError> {
        self.record(chat, Sent::Text { chat, text: text.to_owned() })
    }

    async fn send_html(&self, chat: ChatId, html: &str) -> Result<MessageId, QuizError> {
        self.record(chat, Sent::Html { chat, text: html.to_owned() })
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<MessageId, QuizError> {
        self.record(chat, Sent::Keyboard { chat, text: text.to_owned(), keyboard })
    }

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), QuizError> {
        self.record(chat, Sent::EditKeyboard { chat, message, keyboard })?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), QuizError> {
        self.record(chat, Sent::Delete { chat, message })?;
        Ok(())
    }

    async fn send_quiz_poll(&self, chat: ChatId, poll: &QuizPoll) -> Result<String, QuizError> {
        if self.rejected_questions.lock().unwrap().contains(&poll.question) {
            return Err(bad_poll());
        }
        let poll_id = format!("poll-{}", self.next_poll.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(chat, Sent::Poll { chat, poll: poll.clone(), poll_id: poll_id.clone() })?;
        Ok(poll_id)
    }
}

pub fn questions(count: usize) -> Vec<Question> {
    (1..=count)
        .map(|n| Question {
            text: format!("Question {n}?"),
            correct_answer: format!("right {n}"),
            incorrect_answers: vec![format!("wrong {n}a"), format!("wrong {n}b"), format!("wrong {n}c")],
        })
        .collect()
}

/// Hands out a fixed question list, or fails when built with `failing`.
#[derive(Debug, Default)]
pub struct FakeQuestions {
    questions: Option<Vec<Question>>,
    pub filters: Mutex<Vec<QuizFilter>>,
}

impl FakeQuestions {
    pub fn with(questions: Vec<Question>) -> Self {
        Self {
            questions: Some(questions),
            filters: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionSource for FakeQuestions {
    async fn fetch(&self, filter: &QuizFilter) -> Result<Vec<Question>, QuizError> {
        self.filters.lock().unwrap().push(filter.clone());
        self.questions
            .clone()
            .ok_or_else(|| QuizError::QuestionFetch("provider unreachable".into()))
    }
}

#[derive(Debug, Default)]
pub struct FakeQuotes {
    quotes: Option<Vec<Quote>>,
}

impl FakeQuotes {
    pub fn with(texts: &[&str]) -> Self {
        Self {
            quotes: Some(
                texts
                    .iter()
                    .map(|text| Quote {
                        text: text.to_string(),
                        author: "Anon".into(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn fetch(&self) -> Result<Vec<Quote>, QuizError> {
        self.quotes
            .clone()
            .ok_or_else(|| QuizError::QuoteFetch("provider unreachable".into()))
    }
}
