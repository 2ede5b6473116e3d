use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    dptree,
    types::{Message, Poll, Update},
};

use crate::{
    commands::{self, Command},
    runner,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(commands::start))
        .branch(case![Command::Quiz].endpoint(commands::quiz))
        .branch(case![Command::Next].endpoint(commands::next))
        .branch(case![Command::Motivation].endpoint(commands::motivation))
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Stats].endpoint(commands::stats))
        .branch(case![Command::QuizStats].endpoint(commands::quiz_stats));

    // free text in a private chat gets the welcome message
    let text_handler = dptree::filter(|msg: Message| msg.chat.is_private() && msg.text().is_some())
        .endpoint(commands::start);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(text_handler);

    dptree::entry()
        .branch(message_handler)
        .branch(Update::filter_callback_query().endpoint(runner::selection))
        .branch(Update::filter_poll_answer().endpoint(runner::take_answer))
        .branch(
            Update::filter_poll()
                .filter(|poll: Poll| poll.is_closed)
                .endpoint(runner::poll_closed),
        )
}
