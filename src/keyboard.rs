use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::state::{Category, CategoryPicker, Difficulty};

pub const CATEGORY_PROMPT: &str = "Please choose quiz type";
pub const DIFFICULTY_PROMPT: &str = "Please choose quiz difficulty";
pub const COUNT_PROMPT: &str = "Please choose the number of questions";

pub const QUESTION_COUNTS: [u32; 4] = [5, 10, 15, 20];

const SELECTED_MARK: &str = "✅ ";

/// A button press from one of the quiz set-up keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Category(Category),
    CategoriesDone,
    Difficulty(Difficulty),
    QuestionCount(u32),
}

impl Selection {
    pub fn parse(data: &str) -> Option<Self> {
        let (kind, value) = data.split_once(':')?;
        match kind {
            "cat" if value == "done" => Some(Selection::CategoriesDone),
            "cat" => Category::from_id(value).map(Selection::Category),
            "diff" => Difficulty::from_id(value).map(Selection::Difficulty),
            "count" => value
                .parse()
                .ok()
                .filter(|count| QUESTION_COUNTS.contains(count))
                .map(Selection::QuestionCount),
            _ => None,
        }
    }

    pub fn data(self) -> String {
        match self {
            Selection::Category(category) => format!("cat:{}", category.id()),
            Selection::CategoriesDone => "cat:done".to_owned(),
            Selection::Difficulty(difficulty) => format!("diff:{}", difficulty.id()),
            Selection::QuestionCount(count) => format!("count:{count}"),
        }
    }
}

fn button(text: impl Into<String>, selection: Selection) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, selection.data())
}

pub(crate) fn category_keyboard(picker: &CategoryPicker) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Category::ALL
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|category| {
                    let text = if picker.is_selected(*category) {
                        format!("{SELECTED_MARK}{}", category.label())
                    } else {
                        category.label().to_owned()
                    };
                    button(text, Selection::Category(*category))
                })
                .collect()
        })
        .collect();
    keyboard.push(vec![button("Done", Selection::CategoriesDone)]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn difficulty_keyboard() -> InlineKeyboardMarkup {
    let keyboard = vec![
        vec![
            button(Difficulty::Easy.label(), Selection::Difficulty(Difficulty::Easy)),
            button(Difficulty::Medium.label(), Selection::Difficulty(Difficulty::Medium)),
        ],
        vec![button(Difficulty::Hard.label(), Selection::Difficulty(Difficulty::Hard))],
    ];

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn count_keyboard() -> InlineKeyboardMarkup {
    let keyboard = QUESTION_COUNTS.chunks(2).map(|row| {
        row.iter()
            .map(|count| button(count.to_string(), Selection::QuestionCount(*count)))
            .collect::<Vec<_>>()
    });

    InlineKeyboardMarkup::new(keyboard)
}
