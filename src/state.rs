use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use serde::Deserialize;
use teloxide::types::{Chat, ChatId};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const DEFAULT_OPEN_PERIOD: u16 = 60;
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    ArtsAndLiterature,
    FilmAndTv,
    FoodAndDrink,
    GeneralKnowledge,
    Geography,
    History,
    Music,
    Science,
    SocietyAndCulture,
    SportAndLeisure,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::ArtsAndLiterature,
        Category::FilmAndTv,
        Category::FoodAndDrink,
        Category::GeneralKnowledge,
        Category::Geography,
        Category::History,
        Category::Music,
        Category::Science,
        Category::SocietyAndCulture,
        Category::SportAndLeisure,
    ];

    /// Identifier understood by the trivia API.
    pub fn id(self) -> &'static str {
        match self {
            Category::ArtsAndLiterature => "arts_and_literature",
            Category::FilmAndTv => "film_and_tv",
            Category::FoodAndDrink => "food_and_drink",
            Category::GeneralKnowledge => "general_knowledge",
            Category::Geography => "geography",
            Category::History => "history",
            Category::Music => "music",
            Category::Science => "science",
            Category::SocietyAndCulture => "society_and_culture",
            Category::SportAndLeisure => "sport_and_leisure",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::ArtsAndLiterature => "Art and Literature",
            Category::FilmAndTv => "Film and TV",
            Category::FoodAndDrink => "Food and Drink",
            Category::GeneralKnowledge => "General Knowledge",
            Category::Geography => "Geography",
            Category::History => "History",
            Category::Music => "Music",
            Category::Science => "Science",
            Category::SocietyAndCulture => "Society and Culture",
            Category::SportAndLeisure => "Sport and Leisure",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.id() == id)
    }
}

/// Category choice with an explicit flag per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPicker {
    selected: [bool; Category::ALL.len()],
}

impl CategoryPicker {
    /// Flips the flag and returns whether the category is now selected.
    pub fn toggle(&mut self, category: Category) -> bool {
        let flag = &mut self.selected[category as usize];
        *flag = !*flag;
        *flag
    }

    pub fn is_selected(&self, category: Category) -> bool {
        self.selected[category as usize]
    }

    pub fn selected(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.is_selected(*category))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn id(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Seconds a poll of this difficulty stays open.
    pub fn open_period(self) -> u16 {
        match self {
            Difficulty::Easy => 45,
            Difficulty::Medium => 60,
            Difficulty::Hard => 90,
        }
    }
}

pub fn open_period(difficulty: Option<Difficulty>) -> u16 {
    difficulty.map_or(DEFAULT_OPEN_PERIOD, Difficulty::open_period)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// The chat a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub id: ChatId,
    pub kind: ChatKind,
}

impl ChatRef {
    pub fn new(id: ChatId, kind: ChatKind) -> Self {
        Self { id, kind }
    }

    pub fn from_chat(chat: &Chat) -> Self {
        let kind = if chat.is_private() {
            ChatKind::Private
        } else if chat.is_channel() {
            ChatKind::Channel
        } else {
            ChatKind::Group
        };
        Self::new(chat.id, kind)
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// What to ask the quiz provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizFilter {
    pub categories: Vec<Category>,
    pub difficulty: Option<Difficulty>,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub target: ChatRef,
    pub categories: CategoryPicker,
    pub difficulty: Option<Difficulty>,
    pub question_count: u32,
}

impl SessionConfig {
    pub fn new(target: ChatRef) -> Self {
        Self {
            target,
            categories: CategoryPicker::default(),
            difficulty: None,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }

    pub fn filter(&self) -> QuizFilter {
        QuizFilter {
            categories: self.categories.selected(),
            difficulty: self.difficulty,
            limit: self.question_count,
        }
    }

    pub fn open_period(&self) -> u16 {
        open_period(self.difficulty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePoll {
    pub poll_id: String,
    pub correct_option: usize,
    pub open_period: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantScore {
    pub username: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuizState {
    #[default]
    Idle,
    SelectingCategories,
    SelectingDifficulty,
    SelectingQuestionCount,
    Dispatching,
}

/// One configured run of a quiz in one chat.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub config: SessionConfig,
    pub state: QuizState,
    pub queue: VecDeque<Question>,
    pub polls: Vec<ActivePoll>,
    pub scores: Vec<ParticipantScore>,
    pub latest_poll: Option<String>,
}

impl Session {
    pub fn new(target: ChatRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            config: SessionConfig::new(target),
            state: QuizState::SelectingCategories,
            queue: VecDeque::new(),
            polls: Vec::new(),
            scores: Vec::new(),
            latest_poll: None,
        }
    }

    pub fn target(&self) -> ChatRef {
        self.config.target
    }

    pub fn poll(&self, poll_id: &str) -> Option<&ActivePoll> {
        self.polls.iter().find(|poll| poll.poll_id == poll_id)
    }

    /// Finds or creates the participant, adds a point if `correct`,
    /// and returns the participant's score.
    pub fn score(&mut self, username: &str, correct: bool) -> u32 {
        let idx = match self.scores.iter().position(|entry| entry.username == username) {
            Some(idx) => idx,
            None => {
                self.scores.push(ParticipantScore {
                    username: username.to_owned(),
                    score: 0,
                });
                self.scores.len() - 1
            }
        };
        let entry = &mut self.scores[idx];
        if correct {
            entry.score += 1;
        }
        entry.score
    }

    /// Questions this quiz actually has: sent plus queued. Before anything is
    /// loaded this is the requested count.
    pub fn question_total(&self) -> u32 {
        match self.polls.len() + self.queue.len() {
            0 => self.config.question_count,
            loaded => loaded as u32,
        }
    }

    /// Seconds per question as shown on the leaderboard.
    pub fn seconds_per_question(&self) -> u16 {
        self.polls
            .first()
            .map_or_else(|| self.config.open_period(), |poll| poll.open_period)
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Sessions keyed by chat, plus the poll ids each chat has dispatched.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChatId, SharedSession>>,
    polls: Mutex<HashMap<String, ChatId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the chat's session with a fresh one. Polls of the old
    /// session are forgotten.
    pub async fn reset(&self, target: ChatRef) -> SharedSession {
        let session = Arc::new(Mutex::new(Session::new(target)));
        self.sessions
            .lock()
            .await
            .insert(target.id, Arc::clone(&session));
        self.polls.lock().await.retain(|_, chat| *chat != target.id);
        session
    }

    pub async fn get(&self, chat: ChatId) -> Option<SharedSession> {
        self.sessions.lock().await.get(&chat).cloned()
    }

    pub async fn index_poll(&self, poll_id: String, chat: ChatId) {
        self.polls.lock().await.insert(poll_id, chat);
    }

    pub async fn chat_for_poll(&self, poll_id: &str) -> Option<ChatId> {
        self.polls.lock().await.get(poll_id).copied()
    }
}
