use std::fmt;

use crate::state::{ParticipantScore, Session};

/// Standings of one quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub question_count: u32,
    pub seconds_per_question: u16,
    pub entries: Vec<ParticipantScore>,
}

impl Leaderboard {
    pub fn new(
        question_count: u32,
        seconds_per_question: u16,
        mut entries: Vec<ParticipantScore>,
    ) -> Self {
        // stable: equal scores keep the order participants first answered in
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        Self {
            question_count,
            seconds_per_question,
            entries,
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(
            session.question_total(),
            session.seconds_per_question(),
            session.scores.clone(),
        )
    }
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🏆 Top results in the quiz")?;
        writeln!(f)?;
        writeln!(f, "🖊 {} questions", self.question_count)?;
        writeln!(f, "⏱ {} seconds per question", self.seconds_per_question)?;
        write!(f, "🤓 {} took the quiz", self.entries.len())?;
        if !self.entries.is_empty() {
            writeln!(f)?;
        }
        for (rank, entry) in self.entries.iter().enumerate() {
            write!(
                f,
                "\n{}. @{} --- {} / {}",
                rank + 1,
                entry.username,
                entry.score,
                self.question_count
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, score: u32) -> ParticipantScore {
        ParticipantScore {
            username: username.to_owned(),
            score,
        }
    }

    #[test]
    fn sorts_descending_and_keeps_ties_in_order() {
        let board = Leaderboard::new(
            5,
            45,
            vec![entry("ann", 2), entry("bob", 4), entry("cid", 2), entry("dee", 4)],
        );
        let order: Vec<_> = board.entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(order, vec!["bob", "dee", "ann", "cid"]);
    }

    #[test]
    fn renders_ranks() {
        let board = Leaderboard::new(5, 45, vec![entry("ann", 2), entry("bob", 4)]);
        assert_eq!(
            board.to_string(),
            "🏆 Top results in the quiz\n\n🖊 5 questions\n⏱ 45 seconds per question\n🤓 2 took the quiz\n\n1. @bob --- 4 / 5\n2. @ann --- 2 / 5"
        );
    }

    #[test]
    fn empty_board_is_header_only() {
        let board = Leaderboard::new(10, 60, vec![]);
        assert_eq!(
            board.to_string(),
            "🏆 Top results in the quiz\n\n🖊 10 questions\n⏱ 60 seconds per question\n🤓 0 took the quiz"
        );
    }
}
