use std::sync::Arc;

use teloxide::{
    types::{Chat, ChatId, Message, User},
    utils::{command::BotCommands, html},
};
use tracing::{info, instrument, warn};

use crate::{
    database::{fetch_all, remember_chat, remember_user, ChatRecord, ChatStore, Collection},
    error::QuizError,
    messenger::Messenger,
    providers::{quotes::pick, QuoteSource},
    runner::{Dispatch, QuizController},
    state::ChatRef,
    waiter::with_placeholder,
    HandlerResult,
};

pub const NO_QUIZ_MESSAGE: &str = "No quiz has been run in this chat yet. Send /quiz to start one.";
pub const NOTHING_QUEUED_MESSAGE: &str = "There is no question left to send. Send /quiz to start a new quiz.";
pub const NO_QUOTE_MESSAGE: &str = "Sorry, no quote could be fetched right now. Please try again later.";

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message.")]
    Start,
    #[command(description = "start a new quiz in this chat.")]
    Quiz,
    #[command(description = "send the next question of the running quiz.")]
    Next,
    #[command(description = "get a random motivational quote.")]
    Motivation,
    #[command(description = "display help.")]
    Help,
    #[command(description = "show how many users the bot has.")]
    Stats,
    #[command(description = "show the results of the current quiz.")]
    QuizStats,
}

pub fn welcome_message(user_id: i64, name: &str) -> String {
    format!(
        "Welcome <a href=\"tg://user?id={user_id}\">{}</a> to the Quiz &amp; Motivation bot!\n\n\
         To use this bot:\n\
         \u{2022} send /quiz to play a trivia quiz\n\
         \u{2022} send /motivation to get a motivational quote\n\n\
         Every day the bot also sends you a motivational quote.\n\n\
         For more info send /help",
        html::escape(name)
    )
}

fn display_name(msg: &Message) -> &str {
    msg.chat
        .first_name()
        .or_else(|| msg.chat.title())
        .or_else(|| msg.chat.username())
        .unwrap_or("there")
}

/// The record kept for whoever sent `/start`: the sender when known,
/// otherwise the chat itself if it is private.
pub fn user_record(chat: &Chat, from: Option<&User>) -> Result<Option<ChatRecord>, QuizError> {
    match from {
        Some(user) => ChatRecord::from_metadata(user.id.0 as i64, user).map(Some),
        None if chat.is_private() => ChatRecord::from_chat(chat).map(Some),
        None => Ok(None),
    }
}

/// Greets the chat and remembers first-time users.
pub async fn greet(
    messenger: &dyn Messenger,
    store: &dyn ChatStore,
    chat: ChatId,
    name: &str,
    user: Option<ChatRecord>,
) -> Result<(), QuizError> {
    messenger
        .send_html(chat, &welcome_message(chat.0, name))
        .await?;
    if let Some(record) = user {
        if remember_user(store, record).await? {
            info!("new user in {chat}");
        }
    }
    Ok(())
}

/// Sends one random quote with its author.
pub async fn send_motivation(
    messenger: &dyn Messenger,
    quotes: &dyn QuoteSource,
    chat: ChatId,
) -> Result<(), QuizError> {
    let quotes = match quotes.fetch().await {
        Ok(quotes) => quotes,
        Err(e) => {
            messenger.send_text(chat, NO_QUOTE_MESSAGE).await?;
            return Err(e);
        }
    };
    let Some(text) = pick(&quotes).map(|quote| quote.attributed()) else {
        messenger.send_text(chat, NO_QUOTE_MESSAGE).await?;
        return Err(QuizError::NoQuotes);
    };
    messenger.send_text(chat, &text).await?;
    Ok(())
}

/// Reports how many users the bot knows. Returns the count.
pub async fn send_stats(
    messenger: &dyn Messenger,
    store: &dyn ChatStore,
    chat: ChatId,
) -> Result<usize, QuizError> {
    let users = fetch_all(store, Collection::Users).await?.len();
    messenger
        .send_text(chat, &format!("Total users: {users}"))
        .await?;
    Ok(users)
}

pub async fn send_leaderboard(
    messenger: &dyn Messenger,
    controller: &QuizController,
    chat: ChatId,
) -> Result<(), QuizError> {
    match controller.leaderboard(chat).await {
        Some(board) => messenger.send_text(chat, &board.to_string()).await?,
        None => messenger.send_text(chat, NO_QUIZ_MESSAGE).await?,
    };
    Ok(())
}

#[instrument(level = "info", skip(messenger, store))]
pub(crate) async fn start(
    msg: Message,
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn ChatStore>,
) -> HandlerResult {
    let user = user_record(&msg.chat, msg.from.as_ref())?;
    with_placeholder(
        Arc::clone(&messenger),
        msg.chat.id,
        greet(
            messenger.as_ref(),
            store.as_ref(),
            msg.chat.id,
            display_name(&msg),
            user,
        ),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(messenger))]
pub(crate) async fn help(msg: Message, messenger: Arc<dyn Messenger>) -> HandlerResult {
    let text = format!(
        "{}\n\n{}",
        welcome_message(msg.chat.id.0, display_name(&msg)),
        html::escape(&Command::descriptions().to_string())
    );
    with_placeholder(
        Arc::clone(&messenger),
        msg.chat.id,
        messenger.send_html(msg.chat.id, &text),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(store, controller))]
pub(crate) async fn quiz(
    msg: Message,
    store: Arc<dyn ChatStore>,
    controller: Arc<QuizController>,
) -> HandlerResult {
    let chat = ChatRef::from_chat(&msg.chat);
    let record = ChatRecord::from_chat(&msg.chat)?;
    if let Err(e) = remember_chat(store.as_ref(), chat, record).await {
        warn!("could not record chat {}: {e}", chat.id);
    }
    controller.start(chat).await?;
    Ok(())
}

#[instrument(level = "info", skip(messenger, controller))]
pub(crate) async fn next(
    msg: Message,
    messenger: Arc<dyn Messenger>,
    controller: Arc<QuizController>,
) -> HandlerResult {
    let dispatched = match controller.next(msg.chat.id).await {
        Ok(dispatched) => dispatched,
        Err(QuizError::NoSession(_)) => Dispatch::Nothing,
        Err(e) => return Err(e.into()),
    };
    if dispatched == Dispatch::Nothing {
        messenger
            .send_text(msg.chat.id, NOTHING_QUEUED_MESSAGE)
            .await?;
    }
    Ok(())
}

#[instrument(level = "info", skip(messenger, quotes))]
pub(crate) async fn motivation(
    msg: Message,
    messenger: Arc<dyn Messenger>,
    quotes: Arc<dyn QuoteSource>,
) -> HandlerResult {
    with_placeholder(
        Arc::clone(&messenger),
        msg.chat.id,
        send_motivation(messenger.as_ref(), quotes.as_ref(), msg.chat.id),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(messenger, store))]
pub(crate) async fn stats(
    msg: Message,
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn ChatStore>,
) -> HandlerResult {
    with_placeholder(
        Arc::clone(&messenger),
        msg.chat.id,
        send_stats(messenger.as_ref(), store.as_ref(), msg.chat.id),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(messenger, controller))]
pub(crate) async fn quiz_stats(
    msg: Message,
    messenger: Arc<dyn Messenger>,
    controller: Arc<QuizController>,
) -> HandlerResult {
    with_placeholder(
        Arc::clone(&messenger),
        msg.chat.id,
        send_leaderboard(messenger.as_ref(), controller.as_ref(), msg.chat.id),
    )
    .await?;
    Ok(())
}
