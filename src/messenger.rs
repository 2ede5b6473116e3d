use async_trait::async_trait;
use teloxide::{
    payloads::{EditMessageReplyMarkupSetters, SendMessageSetters, SendPollSetters},
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode, PollType},
    Bot,
};

use crate::error::QuizError;

/// A quiz poll ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPoll {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub explanation: String,
    pub open_period: u16,
}

/// The Bot API calls the bot makes.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, QuizError>;

    async fn send_html(&self, chat: ChatId, html: &str) -> Result<MessageId, QuizError>;

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<MessageId, QuizError>;

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), QuizError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), QuizError>;

    /// Sends the poll and returns the id Telegram assigned to it.
    async fn send_quiz_poll(&self, chat: ChatId, poll: &QuizPoll) -> Result<String, QuizError>;
}

#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, QuizError> {
        let msg = self.bot.send_message(chat, text).await?;
        Ok(msg.id)
    }

    async fn send_html(&self, chat: ChatId, html: &str) -> Result<MessageId, QuizError> {
        let msg = self
            .bot
            .send_message(chat, html)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(msg.id)
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<MessageId, QuizError> {
        let msg = self
            .bot
            .send_message(chat, text)
            .reply_markup(keyboard)
            .await?;
        Ok(msg.id)
    }

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), QuizError> {
        self.bot
            .edit_message_reply_markup(chat, message)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), QuizError> {
        self.bot.delete_message(chat, message).await?;
        Ok(())
    }

    async fn send_quiz_poll(&self, chat: ChatId, poll: &QuizPoll) -> Result<String, QuizError> {
        let msg = self
            .bot
            .send_poll(chat, poll.question.clone(), poll.options.clone())
            .type_(PollType::Quiz)
            .is_anonymous(false)
            .allows_multiple_answers(false)
            .correct_option_id(poll.correct_option as u8)
            .explanation(poll.explanation.clone())
            .open_period(poll.open_period)
            .protect_content(true)
            .await?;

        msg.poll()
            .map(|sent| sent.id.to_string())
            .ok_or_else(|| QuizError::UnknownPoll(format!("message {} carries no poll", msg.id.0)))
    }
}
