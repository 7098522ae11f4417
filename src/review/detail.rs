use std::fmt::Write;

use crate::domain::question::FlaggedQuestion;

/// Read-only text rendering of a question for moderation review.
pub fn render(question: &FlaggedQuestion) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{}] {} / {} / {}",
        question.id,
        question.domain,
        question.difficulty.as_str(),
        question.flag_status
    );
    let _ = writeln!(out, "{}", question.question);

    for (index, option) in question.options.iter().enumerate() {
        let marker = if index == question.correct_answer { '*' } else { ' ' };
        let _ = writeln!(out, " {} {}. {}", marker, option_label(index), option);
    }

    if !question.explanation.is_empty() {
        let _ = writeln!(out, "Explanation: {}", question.explanation);
    }
    if !question.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", question.tags.join(", "));
    }

    let _ = writeln!(
        out,
        "Flags: {} from {} reporter(s)",
        question.flag_count,
        question.flagged_by.len()
    );
    for reason in &question.flag_reasons {
        let _ = writeln!(out, "  - {}", reason);
    }

    out
}

fn option_label(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        (index + 1).to_string()
    }
}
