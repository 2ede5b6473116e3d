use std::{borrow::Cow, error::Error, sync::Arc};

use quizbot::{
    broadcast::Pacing,
    config::Config,
    database::{ChatStore, Connection, MemoryStore},
    http::{self, AppState},
    messenger::{Messenger, TelegramMessenger},
    providers::{http_client, QuestionSource, QuoteSource, TriviaApi, ZenQuotes},
    runner::QuizController,
    schema::schema,
};
use teloxide::{
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};
use tracing::{error, info, level_filters::LevelFilter, warn, Level};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

type BoxError = Box<dyn Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("quizbot stopped: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(level: Level) -> Result<(), BoxError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    // teloxide logs through `log`
    LogTracer::init()?;
    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn ChatStore>, BoxError> {
    match &config.database_url {
        Some(url) => {
            let connection = Connection::connect(Cow::Borrowed(url)).await?;
            connection.run_migrations().await?;
            Ok(Arc::new(connection))
        }
        None => {
            warn!("DATABASE_URL is not set, chats are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(listener: tokio::net::TcpListener, app: axum::Router) {
    if let Err(e) = axum::serve(listener, app).await {
        error!("http server failed: {e}");
    }
}

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    init_tracing(config.log_level)?;

    let store = open_store(&config).await?;
    let bot = Bot::new(&config.bot_token);
    let client = http_client(config.http_timeout)?;

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
    let questions: Arc<dyn QuestionSource> =
        Arc::new(TriviaApi::new(client.clone(), config.trivia_url.clone()));
    let quotes: Arc<dyn QuoteSource> = Arc::new(ZenQuotes::new(client, config.quotes_url.clone()));
    let controller = Arc::new(QuizController::new(Arc::clone(&messenger), questions));

    let app_state = AppState {
        store: Arc::clone(&store),
        quotes: Arc::clone(&quotes),
        messenger: Arc::clone(&messenger),
        pacing: Pacing {
            batch: config.broadcast_batch,
            pause: config.broadcast_pause,
        },
    };

    info!("Starting bot...");
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![controller, store, quotes, messenger])
        .enable_ctrlc_handler()
        .build();

    match (config.webhook_url.clone(), config.bind_addr) {
        (Some(url), Some(addr)) => {
            info!("receiving updates on {url}");
            let (listener, stop_flag, webhook_router) =
                webhooks::axum_to_router(bot, Options::new(addr, url)).await?;
            let app = webhook_router.merge(http::router(app_state));
            let tcp = tokio::net::TcpListener::bind(addr).await?;
            tokio::spawn(async move {
                if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
                    error!("http server failed: {e}");
                }
            });
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        (_, bind_addr) => {
            if let Some(addr) = bind_addr {
                info!("serving http on {addr}");
                let tcp = tokio::net::TcpListener::bind(addr).await?;
                tokio::spawn(serve(tcp, http::router(app_state)));
            }
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}
