use std::{sync::Arc, time::Duration};

use quizbot::{
    commands::{greet, send_leaderboard, send_motivation, send_stats, NO_QUIZ_MESSAGE, NO_QUOTE_MESSAGE},
    database::{fetch_all, ChatRecord, ChatStore, Collection, MemoryStore},
    error::QuizError,
    runner::QuizController,
    state::{ChatKind, ChatRef},
    waiter::{with_placeholder, PLACEHOLDER},
};
use serde_json::json;
use teloxide::types::{ChatId, MessageId};

mod common;
use common::{questions, FakeMessenger, FakeQuestions, FakeQuotes, Sent};

const CHAT: ChatId = ChatId(500);

#[tokio::test]
async fn placeholder_is_removed_after_success() {
    let messenger = Arc::new(FakeMessenger::new());
    let value = with_placeholder(messenger.clone(), CHAT, async { 7 }).await;

    assert_eq!(value, 7);
    let events = messenger.events();
    assert!(matches!(&events[0], Sent::Text { text, .. } if text == PLACEHOLDER));
    assert!(matches!(events[1], Sent::Delete { message: MessageId(1), .. }));
}

#[tokio::test]
async fn placeholder_is_removed_after_failure() {
    let messenger = Arc::new(FakeMessenger::new());
    let result: Result<(), QuizError> =
        with_placeholder(messenger.clone(), CHAT, async { Err(QuizError::NoQuotes) }).await;

    assert!(result.is_err());
    assert_eq!(messenger.events().len(), 2);
    assert!(matches!(messenger.events()[1], Sent::Delete { .. }));
}

#[tokio::test]
async fn placeholder_is_removed_when_abandoned() {
    let messenger = Arc::new(FakeMessenger::new());
    let waiting = with_placeholder(messenger.clone(), CHAT, std::future::pending::<()>());
    assert!(tokio::time::timeout(Duration::from_millis(20), waiting).await.is_err());

    // the delete runs on a spawned task
    for _ in 0..10 {
        if messenger.events().len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(matches!(messenger.events()[1], Sent::Delete { message: MessageId(1), .. }));
}

#[tokio::test]
async fn operation_runs_when_placeholder_cannot_be_sent() {
    let messenger = Arc::new(FakeMessenger::new());
    messenger.fail_for(CHAT);
    let value = with_placeholder(messenger.clone(), CHAT, async { "done" }).await;
    assert_eq!(value, "done");
}

#[tokio::test]
async fn greeting_remembers_private_users_once() {
    let messenger = FakeMessenger::new();
    let store = MemoryStore::new();
    let user = || Some(ChatRecord::new("500", json!({ "first_name": "Ann" })));

    greet(&messenger, &store, CHAT, "Ann", user()).await.unwrap();
    greet(&messenger, &store, CHAT, "Ann", user()).await.unwrap();
    greet(&messenger, &store, ChatId(-9), "Group", None).await.unwrap();

    assert_eq!(messenger.texts(CHAT).len(), 2);
    assert!(messenger.texts(CHAT)[0].contains("tg://user?id=500"));
    let users = fetch_all(&store, Collection::Users).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn stats_count_users_only() {
    let messenger = FakeMessenger::new();
    let store = MemoryStore::new();
    for key in ["1", "2", "3"] {
        store
            .put(Collection::Users, ChatRecord::new(key, json!({})))
            .await
            .unwrap();
    }
    store
        .put(Collection::Groups, ChatRecord::new("-4", json!({})))
        .await
        .unwrap();

    assert_eq!(send_stats(&messenger, &store, CHAT).await.unwrap(), 3);
    assert_eq!(messenger.texts(CHAT), vec!["Total users: 3".to_owned()]);
}

#[tokio::test]
async fn motivation_sends_an_attributed_quote() {
    let messenger = FakeMessenger::new();
    send_motivation(&messenger, &FakeQuotes::with(&["Stay curious."]), CHAT)
        .await
        .unwrap();
    assert_eq!(messenger.texts(CHAT), vec!["Stay curious.\n\nAnon".to_owned()]);
}

#[tokio::test]
async fn motivation_failure_is_reported_to_the_chat() {
    let messenger = FakeMessenger::new();
    let err = send_motivation(&messenger, &FakeQuotes::failing(), CHAT)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::QuoteFetch(_)));
    assert_eq!(messenger.texts(CHAT), vec![NO_QUOTE_MESSAGE.to_owned()]);
}

#[tokio::test]
async fn leaderboard_before_any_quiz() {
    let messenger = Arc::new(FakeMessenger::new());
    let controller = QuizController::new(messenger.clone(), Arc::new(FakeQuestions::with(questions(1))));

    send_leaderboard(messenger.as_ref(), &controller, CHAT).await.unwrap();
    assert_eq!(messenger.texts(CHAT), vec![NO_QUIZ_MESSAGE.to_owned()]);

    controller
        .start(ChatRef::new(CHAT, ChatKind::Private))
        .await
        .unwrap();
    send_leaderboard(messenger.as_ref(), &controller, CHAT).await.unwrap();
    let board = messenger.texts(CHAT).pop().unwrap();
    assert!(board.starts_with("🏆 Top results in the quiz"));
    assert!(board.ends_with("🤓 0 took the quiz"));
}
