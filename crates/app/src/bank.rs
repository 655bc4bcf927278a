use quiz_core::model::{AnswerOption, Question, QuestionId};

/// Built-in question bank used by the terminal front end.
pub fn sample_bank() -> Result<Vec<Question>, quiz_core::Error> {
    Ok(vec![
        Question::new(
            QuestionId::new(1),
            "Which keyword declares an immutable binding in Rust?",
            [
                AnswerOption::text("let"),
                AnswerOption::text("var"),
                AnswerOption::text("const mut"),
                AnswerOption::text("static mut"),
            ],
            0,
        )?,
        Question::new(
            QuestionId::new(2),
            "What does the `?` operator do on an `Err` value?",
            [
                AnswerOption::text("Panics"),
                AnswerOption::text("Returns it from the enclosing function"),
                AnswerOption::text("Ignores it"),
                AnswerOption::text("Converts it to `None`"),
            ],
            1,
        )?,
        Question::new(
            QuestionId::new(3),
            "Which trait lets a value be shared across threads by reference?",
            [
                AnswerOption::text("Send"),
                AnswerOption::text("Copy"),
                AnswerOption::text("Sync"),
                AnswerOption::text("Unpin"),
            ],
            2,
        )?,
        Question::new(
            QuestionId::new(4),
            "Which mascot is this?",
            [
                AnswerOption::with_image("Gopher", "images/gopher.png"),
                AnswerOption::with_image("Duke", "images/duke.png"),
                AnswerOption::with_image("Tux", "images/tux.png"),
                AnswerOption::with_image("Ferris", "images/ferris.png"),
            ],
            3,
        )?,
    ])
}
