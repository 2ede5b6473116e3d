use std::sync::Arc;

use rand::{seq::SliceRandom, Rng};
use teloxide::{
    dispatching::dialogue::GetChatId,
    prelude::Requester,
    types::{CallbackQuery, ChatId, MessageId, Poll, PollAnswer, Voter},
    ApiError, Bot, RequestError,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::QuizError,
    keyboard::{
        category_keyboard, count_keyboard, difficulty_keyboard, Selection, CATEGORY_PROMPT,
        COUNT_PROMPT, DIFFICULTY_PROMPT,
    },
    leaderboard::Leaderboard,
    messenger::{Messenger, QuizPoll},
    providers::QuestionSource,
    state::{ActivePoll, ChatRef, Question, QuizState, Session, SessionRegistry},
    waiter::with_placeholder,
    HandlerResult,
};

pub const QUIZ_ENDED_MESSAGE: &str =
    "The quiz has ended, you can send /quiz_stats to get the statistics for the quiz :)";
pub const FETCH_FAILED_MESSAGE: &str =
    "Sorry, no questions could be fetched for this quiz. Please send /quiz to try again.";

/// Result of trying to send the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A poll went out; `remaining` questions are still queued.
    Sent { remaining: usize },
    /// Nothing to send.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub score: u32,
    pub advanced: bool,
}

/// Puts the correct answer at a uniformly random position among the
/// shuffled incorrect ones. Returns the options and the correct index.
pub fn shuffle_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> (Vec<String>, usize) {
    let mut options = question.incorrect_answers.clone();
    options.shuffle(rng);
    let correct = rng.gen_range(0..=options.len());
    options.insert(correct, question.correct_answer.clone());
    (options, correct)
}

/// Drives quiz sessions: set-up prompts, poll dispatch and scoring.
pub struct QuizController {
    messenger: Arc<dyn Messenger>,
    questions: Arc<dyn QuestionSource>,
    sessions: SessionRegistry,
}

impl QuizController {
    pub fn new(messenger: Arc<dyn Messenger>, questions: Arc<dyn QuestionSource>) -> Self {
        Self {
            messenger,
            questions,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Discards whatever quiz the chat had and asks for categories.
    #[instrument(level = "info", skip(self))]
    pub async fn start(&self, chat: ChatRef) -> Result<(), QuizError> {
        let shared = self.sessions.reset(chat).await;
        let session = shared.lock().await;
        info!(session = %session.id, "quiz set-up started");

        self.messenger
            .send_keyboard(
                chat.id,
                CATEGORY_PROMPT,
                category_keyboard(&session.config.categories),
            )
            .await?;
        Ok(())
    }

    /// Applies a set-up button press to the chat's session.
    #[instrument(level = "info", skip(self))]
    pub async fn select(&self, chat: ChatId, message: MessageId, data: &str) -> Result<(), QuizError> {
        let shared = self
            .sessions
            .get(chat)
            .await
            .ok_or(QuizError::NoSession(chat))?;
        let mut session = shared.lock().await;

        match (session.state, Selection::parse(data)) {
            (QuizState::SelectingCategories, Some(Selection::Category(category))) => {
                let selected = session.config.categories.toggle(category);
                debug!(session = %session.id, "{} selected: {}", category.id(), selected);
                self.messenger
                    .edit_keyboard(chat, message, category_keyboard(&session.config.categories))
                    .await?;
            }
            (QuizState::SelectingCategories, Some(Selection::CategoriesDone)) => {
                self.remove_prompt(chat, message).await;
                self.messenger
                    .send_keyboard(chat, DIFFICULTY_PROMPT, difficulty_keyboard())
                    .await?;
                session.state = QuizState::SelectingDifficulty;
            }
            (QuizState::SelectingDifficulty, Some(Selection::Difficulty(difficulty))) => {
                session.config.difficulty = Some(difficulty);
                self.remove_prompt(chat, message).await;
                self.messenger
                    .send_keyboard(chat, COUNT_PROMPT, count_keyboard())
                    .await?;
                session.state = QuizState::SelectingQuestionCount;
            }
            (QuizState::SelectingQuestionCount, Some(Selection::QuestionCount(count))) => {
                session.config.question_count = count;
                self.remove_prompt(chat, message).await;
                self.load_questions(&mut session).await?;
                self.dispatch_locked(&mut session).await?;
            }
            (state, _) => {
                return Err(QuizError::UnexpectedSelection {
                    state,
                    data: data.to_owned(),
                })
            }
        }
        Ok(())
    }

    /// Sends the next question of a running quiz, if any.
    #[instrument(level = "info", skip(self))]
    pub async fn next(&self, chat: ChatId) -> Result<Dispatch, QuizError> {
        let shared = self
            .sessions
            .get(chat)
            .await
            .ok_or(QuizError::NoSession(chat))?;
        let mut session = shared.lock().await;
        if session.state != QuizState::Dispatching {
            return Ok(Dispatch::Nothing);
        }
        self.dispatch_locked(&mut session).await
    }

    /// Scores one answer. Private chats move on to the next question at once.
    #[instrument(level = "info", skip(self))]
    pub async fn record_answer(
        &self,
        poll_id: &str,
        username: &str,
        option: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        let unknown = || QuizError::UnknownPoll(poll_id.to_owned());
        let chat = self.sessions.chat_for_poll(poll_id).await.ok_or_else(unknown)?;
        let shared = self.sessions.get(chat).await.ok_or_else(unknown)?;
        let mut session = shared.lock().await;

        let poll = session.poll(poll_id).cloned().ok_or_else(unknown)?;
        let correct = option == poll.correct_option;
        let score = session.score(username, correct);

        let advance = session.target().is_private()
            && session.state == QuizState::Dispatching
            && session.latest_poll.as_deref() == Some(poll_id)
            && !session.queue.is_empty();
        if advance {
            self.dispatch_locked(&mut session).await?;
        }

        Ok(AnswerOutcome {
            correct,
            score,
            advanced: advance,
        })
    }

    /// Moves a quiz on when its latest poll closes. Polls the bot does not
    /// track are ignored.
    #[instrument(level = "info", skip(self))]
    pub async fn poll_closed(&self, poll_id: &str) -> Result<Dispatch, QuizError> {
        let Some(chat) = self.sessions.chat_for_poll(poll_id).await else {
            debug!("closed poll is not ours");
            return Ok(Dispatch::Nothing);
        };
        let Some(shared) = self.sessions.get(chat).await else {
            return Ok(Dispatch::Nothing);
        };
        let mut session = shared.lock().await;
        if session.state != QuizState::Dispatching
            || session.latest_poll.as_deref() != Some(poll_id)
        {
            return Ok(Dispatch::Nothing);
        }
        self.dispatch_locked(&mut session).await
    }

    pub async fn leaderboard(&self, chat: ChatId) -> Option<Leaderboard> {
        let shared = self.sessions.get(chat).await?;
        let session = shared.lock().await;
        Some(Leaderboard::from_session(&session))
    }

    async fn remove_prompt(&self, chat: ChatId, message: MessageId) {
        if let Err(e) = self.messenger.delete_message(chat, message).await {
            warn!("could not delete prompt {} in {chat}: {e}", message.0);
        }
    }

    async fn load_questions(&self, session: &mut Session) -> Result<(), QuizError> {
        let chat = session.target().id;
        let filter = session.config.filter();

        let placeholder = Arc::clone(&self.messenger);
        let fetched = with_placeholder(placeholder, chat, self.questions.fetch(&filter))
            .await
            .and_then(|questions| {
                if questions.is_empty() {
                    Err(QuizError::NoQuestions)
                } else {
                    Ok(questions)
                }
            });

        match fetched {
            Ok(mut questions) => {
                questions.truncate(filter.limit as usize);
                info!(session = %session.id, "loaded {} questions", questions.len());
                session.queue = questions.into();
                session.state = QuizState::Dispatching;
                Ok(())
            }
            Err(e) => {
                error!(session = %session.id, "quiz could not start: {e}");
                session.state = QuizState::Idle;
                self.messenger.send_text(chat, FETCH_FAILED_MESSAGE).await?;
                Err(e)
            }
        }
    }

    /// Sends the front question as a poll. The caller holds the session lock.
    ///
    /// Questions Telegram refuses as polls are dropped and the next one is
    /// tried. Any other send failure leaves the question queued.
    async fn dispatch_locked(&self, session: &mut Session) -> Result<Dispatch, QuizError> {
        let chat = session.target().id;
        let open_period = session.config.open_period();
        let mut dropped = 0;

        while let Some(question) = session.queue.pop_front() {
            let (options, correct_option) = shuffle_options(&question, &mut rand::thread_rng());
            let poll = QuizPoll {
                question: question.text.clone(),
                options,
                correct_option,
                explanation: format!("Correct Answer: {}", question.correct_answer),
                open_period,
            };

            let poll_id = match self.messenger.send_quiz_poll(chat, &poll).await {
                Ok(poll_id) => poll_id,
                Err(QuizError::Telegram(RequestError::Api(e))) if rejects_poll(&e) => {
                    warn!(session = %session.id, "dropping question {:?}: {e}", question.text);
                    dropped += 1;
                    continue;
                }
                Err(e) => {
                    session.queue.push_front(question);
                    return Err(e);
                }
            };
            debug!(session = %session.id, "sent poll {poll_id}");

            session.polls.push(ActivePoll {
                poll_id: poll_id.clone(),
                correct_option,
                open_period,
            });
            session.latest_poll = Some(poll_id.clone());
            self.sessions.index_poll(poll_id, chat).await;

            let remaining = session.queue.len();
            if remaining == 0 {
                self.finish(session).await?;
            }
            return Ok(Dispatch::Sent { remaining });
        }

        if dropped > 0 {
            self.finish(session).await?;
        }
        Ok(Dispatch::Nothing)
    }

    async fn finish(&self, session: &mut Session) -> Result<(), QuizError> {
        info!(session = %session.id, "last question sent");
        session.state = QuizState::Idle;
        self.messenger
            .send_text(session.target().id, QUIZ_ENDED_MESSAGE)
            .await?;
        Ok(())
    }
}

/// Whether Telegram refused the poll itself rather than the chat.
fn rejects_poll(error: &ApiError) -> bool {
    !matches!(
        error,
        ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
    )
}

fn voter_name(answer: &PollAnswer) -> String {
    match &answer.voter {
        Voter::User(user) => user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone()),
        Voter::Chat(chat) => chat
            .username()
            .or_else(|| chat.title())
            .unwrap_or("anonymous")
            .to_owned(),
    }
}

#[instrument(level = "info", skip(bot, controller))]
pub(crate) async fn selection(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<QuizController>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let message = q.message.as_ref().map(|message| message.id());
    match (q.chat_id(), message, q.data.as_deref()) {
        (Some(chat), Some(message), Some(data)) => {
            controller.select(chat, message, data).await?;
        }
        _ => warn!("callback query without chat, message or data"),
    }
    Ok(())
}

#[instrument(level = "info", skip(controller))]
pub(crate) async fn take_answer(answer: PollAnswer, controller: Arc<QuizController>) -> HandlerResult {
    let Some(option) = answer.option_ids.first() else {
        debug!("vote retracted");
        return Ok(());
    };
    let username = voter_name(&answer);
    let outcome = controller
        .record_answer(&answer.poll_id.to_string(), &username, *option as usize)
        .await?;
    info!(
        "{} answered poll {}: correct {}, score {}",
        username, answer.poll_id, outcome.correct, outcome.score
    );
    Ok(())
}

#[instrument(level = "info", skip(controller))]
pub(crate) async fn poll_closed(poll: Poll, controller: Arc<QuizController>) -> HandlerResult {
    controller.poll_closed(&poll.id.to_string()).await?;
    Ok(())
}
