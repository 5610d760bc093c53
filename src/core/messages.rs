//! 使用者看到的文字訊息

use crate::domain::model::{LeaderboardEntry, Question, UserStats};
use std::collections::BTreeMap;

pub const HELP_TEXT: &str = "🔍 *Quiz Bot Help*\n\n\
*Quiz commands:*\n\
• /quiz - Start a quiz with random questions\n\
• /quiz 3 - Start a quiz with 3 random questions\n\
• /quiz id=42 - Play every question saved under ID 42\n\
• /quiz start=10 - Start from question #10 and continue\n\
• /category - Choose questions from a specific category\n\n\
*Managing questions:*\n\
• /add - Add a new question\n\
• /edit - Edit an existing question\n\
• /delete - Delete a question\n\
• /list - List all questions by category\n\
• /clone - Import a quiz from a Telegram URL or create one manually\n\
• /poll2q - Reply to a poll to save it as a question\n\n\
*Your progress:*\n\
• /stats - View your quiz statistics\n\
• /leaderboard - Show the top players\n\n\
Use /cancel at any time to stop the current operation.";

pub const NO_QUESTIONS: &str = "There are no questions available. Add some using /add command.";
pub const CANCELLED: &str = "Operation cancelled. Use /help to see available commands.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel. Use /help to see available commands.";
pub const QUIZ_ALREADY_RUNNING: &str =
    "⚠️ A quiz is already running in this chat. Wait for it to finish before starting another.";
pub const UNSUPPORTED_TIMER: &str = "❌ That timer is no longer offered. Use /quiz to pick again.";
pub const SAVE_FAILED: &str = "❌ There was an error saving the question. Please try again.";
pub const PENDING_POLL_MISSING: &str = "❌ Error: Question data not found. Please try again.";

pub const ASK_QUESTION_TEXT: &str = "Let's add a new question. Please enter the question text:";
pub const ASK_CLONE_QUESTION_TEXT: &str =
    "Let's create a question manually.\n\nFirst, please enter the question text:";
pub const ASK_OPTIONS: &str = "Great! Now please enter the answer options, one per line.\n\
For example:\nParis\nLondon\nBerlin\nRome";
pub const TOO_FEW_OPTIONS: &str =
    "You need to provide at least 2 options. Please try again, with each option on a new line:";
pub const ASK_CATEGORY: &str = "Almost done! Please select a category for this question (or type your own):";

pub const CLONE_MENU: &str = "How would you like to import questions?\n\n\
1. From a Telegram quiz URL\n\
2. Create manually";
pub const CLONE_URL_PROMPT: &str = "Please send me a Telegram URL containing a quiz or poll.\n\n\
I'll try to extract the question and options automatically.";
pub const URL_FORMAT_HELP: &str = "❌ The URL format appears to be incorrect.\n\n\
Please provide a valid Telegram URL like:\n\
• https://t.me/channel_name/message_id\n\
• t.me/channel_name/message_id";
pub const IMPORT_PROGRESS: &str = "🔍 Analyzing quiz URL...\n\n\
This may take a moment as I attempt to extract the quiz content.\nPlease wait...";
pub const IMPORT_FAILED: &str = "❌ Unable to Extract Quiz\n\n\
I couldn't extract a quiz from that URL. This could be because:\n\
• The URL doesn't point to a valid Telegram quiz/poll\n\
• The message is in a private channel I can't access\n\
• The message format isn't recognized\n\n\
Please try:\n\
• Using a different quiz URL\n\
• Replying to the poll with /poll2q instead\n\
• Creating it manually with /add";

pub const POLL2Q_USAGE: &str = "❌ This command must be used as a reply to a poll message.\n\n\
Usage:\n\
• Reply to a poll with /poll2q\n\
• /poll2q id=123 - Save under ID #123\n\
• /poll2q start=50 - Number saved polls from ID #50\n\
• /poll2q batch - Keep converting several polls";
pub const ASK_CUSTOM_ID: &str =
    "🔢 Enter Your Custom ID\n\nPlease type a positive integer as the ID number for your question.";
pub const INVALID_CUSTOM_ID: &str = "❌ Please enter a valid positive integer as the ID. Try again:";

/// 超過 limit 個字元時截斷並加上 "..."
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Telegram 單則訊息的字元上限
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// 依行切割過長的訊息，每段最多 `limit` 個字元；單行超過上限時直接硬切
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for mut line in text.split_inclusive('\n') {
        let mut line_len = line.chars().count();
        while line_len > limit {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let cut = line.char_indices().nth(limit).map_or(line.len(), |(i, _)| i);
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
            line_len -= limit;
        }
        if current_len + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current_len += line_len;
    }
    chunks.push(current);

    chunks
        .into_iter()
        .map(|chunk| chunk.trim_end_matches('\n').to_string())
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

pub fn welcome(first_name: &str) -> String {
    format!(
        "👋 Hello {}! Welcome to the Quiz Bot.\n\n\
I can help you create and take quizzes. Here are my commands:\n\n\
/quiz - Start a quiz with random questions\n\
/category - Start a quiz from a specific category\n\
/add - Add a new quiz question\n\
/edit - Edit an existing question\n\
/delete - Delete a question\n\
/list - List all questions\n\
/clone - Import a quiz from a Telegram URL or manually\n\
/poll2q - Convert a poll to a quiz question\n\
/stats - View your quiz statistics\n\
/leaderboard - Show the top players\n\
/help - Show detailed help\n\n\
Let's get started!",
        first_name
    )
}

pub fn numbered_options(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn ask_answer(options: &[String]) -> String {
    format!(
        "Options added:\n{}\n\nWhich option is the correct answer? Enter the number (1-{}):",
        numbered_options(options),
        options.len()
    )
}

pub fn answer_out_of_range(count: usize) -> String {
    format!("Please enter a valid number between 1 and {}:", count)
}

pub fn question_saved(question: &Question, cloned: bool) -> String {
    let verb = if cloned { "cloned" } else { "added" };
    format!(
        "✅ Question {} successfully!\n\nID: {}\nQuestion: {}\nCategory: {}\n\n\
Use /quiz or /category to start playing.",
        verb, question.id, question.question, question.category
    )
}

pub fn imported(question: &str, options: &[String]) -> String {
    format!(
        "✅ Quiz Successfully Extracted!\n\n📝 Question:\n{}\n\n🔢 Options:\n{}\n\n\
⚠️ Please enter the number of the correct answer (1-{}):",
        question,
        numbered_options(options),
        options.len()
    )
}

pub fn stats(first_name: &str, stats: &UserStats) -> String {
    let accuracy = stats.accuracy();
    let mut text = format!(
        "📊 Quiz Statistics for {}\n\n\
🎮 Quizzes taken: {}\n\
✅ Correct answers: {}\n\
📝 Total questions answered: {}\n\
🎯 Accuracy: {:.1}%\n\
⭐ Score: {:.2}\n\n",
        first_name,
        stats.quizzes_taken,
        stats.correct_answers,
        stats.total_answers,
        accuracy,
        stats.score
    );

    text.push_str(if stats.total_answers == 0 {
        "Try taking a quiz with /quiz to start building your stats!"
    } else if accuracy < 50.0 {
        "Keep practicing! Try focusing on specific categories with /category"
    } else if accuracy < 80.0 {
        "Good job! You're doing well, but there's room for improvement."
    } else {
        "Amazing! You're a quiz master! 🏆"
    });
    text
}

pub fn leaderboard(entries: &[LeaderboardEntry], total_users: usize) -> String {
    if entries.is_empty() {
        return "No quiz data available yet.\nBe the first to play with /quiz!".to_string();
    }

    let mut text = String::from("🏆 Global Leaderboard 🏆\n\n");
    for (i, entry) in entries.iter().enumerate() {
        let medal = match i {
            0 => "🥇 ",
            1 => "🥈 ",
            2 => "🥉 ",
            _ => "",
        };
        text.push_str(&format!(
            "{}#{}: {} - {:.2} points ({} questions)\n",
            medal,
            i + 1,
            entry.name,
            entry.score,
            entry.total_answers
        ));
    }
    if total_users > entries.len() {
        text.push_str(&format!("\n...and {} more users.", total_users - entries.len()));
    }
    text
}

pub fn question_list(questions: &[Question]) -> String {
    if questions.is_empty() {
        return "No questions available. Add some with /add first!".to_string();
    }

    let mut by_category: BTreeMap<&str, Vec<&Question>> = BTreeMap::new();
    for question in questions {
        by_category.entry(question.category.as_str()).or_default().push(question);
    }

    let mut text = String::from("📚 Available Questions:\n\n");
    for (category, items) in by_category {
        text.push_str(&format!("📂 {} ({})\n", category, items.len()));
        for question in items {
            text.push_str(&format!(
                "  ID {}: {}\n",
                question.id,
                truncate(&question.question, 30)
            ));
        }
        text.push('\n');
    }
    text.push_str("Use /quiz to start a random quiz\nUse /quiz id=N to play a question set\nUse /edit to change a question");
    text
}

pub fn edit_list(questions: &[Question]) -> String {
    let mut text = String::from("Select a question to edit:\n\n");
    for (i, question) in questions.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, truncate(&question.question, 50)));
    }
    text
}

pub fn edit_menu(question: &Question) -> String {
    format!(
        "Question: {}\n\nOptions:\n{}\n\nCorrect answer: {}\nCategory: {}\n\n\
What would you like to edit?\n\n1. Question text\n2. Options\n3. Correct answer\n4. Category",
        question.question,
        numbered_options(&question.options),
        question.correct_option().unwrap_or("Unknown"),
        question.category
    )
}

/// 1️⃣..🔟，超過十個改用數字
pub fn option_marker(index: usize) -> String {
    const MARKERS: [&str; 10] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟"];
    MARKERS
        .get(index)
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{}.", index + 1))
}

pub fn poll_analysis(question: &str, options: &[String], correct: Option<usize>) -> String {
    let mut text = format!(
        "✨ QUIZ CREATOR WIZARD ✨\n\n📋 Question:\n{}\n\n📊 Options: {}\n",
        question,
        options.len()
    );
    for (i, option) in options.iter().enumerate() {
        text.push_str(&format!("{} {}\n", option_marker(i), option));
    }
    match correct.and_then(|i| options.get(i)) {
        Some(answer) => text.push_str(&format!(
            "\n✅ Quiz Type: Official Quiz Poll\n🎯 Correct Answer: {}",
            answer
        )),
        None => text.push_str(
            "\n❓ Quiz Type: Regular Poll (needs answer)\n\n🎲 Select the correct answer from below:",
        ),
    }
    text
}

pub fn poll_category_prompt(question: &str, options: &[String], answer: usize) -> String {
    format!(
        "📋 Select a Category\n\nQuestion: {}\n\nOptions: {}\nCorrect: {}\n\nChoose a category from below:",
        truncate(question, 53),
        options.len(),
        truncate(options.get(answer).map(String::as_str).unwrap_or(""), 33)
    )
}

pub fn poll_saved(question: &Question, sharing: usize, batch: bool) -> String {
    let header = if sharing > 1 {
        format!(
            "✅ Question Successfully Added!\n\n🆔 Added to ID #{}\n📊 Now {} questions with this ID\n\n",
            question.id, sharing
        )
    } else {
        format!("✅ New Question Created!\n\n🆔 Assigned ID #{}\n\n", question.id)
    };
    let mut text = format!(
        "{}📝 Question: {}\n🏷️ Category: {}\n📋 Options: {}\n✓ Correct answer: {}\n\n\
Use /quiz id={} to start a quiz with this question!",
        header,
        question.question,
        question.category,
        question.options.len(),
        question.correct_option().unwrap_or("Unknown"),
        question.id
    );
    if batch {
        text.push_str("\n\n🔄 Batch mode is active. Reply to another poll with /poll2q to add it.");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, text: &str, category: &str) -> Question {
        Question {
            id,
            question: text.to_string(),
            options: vec!["x".to_string(), "y".to_string()],
            answer: 1,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 30), "short");
        let long = "é".repeat(40);
        let cut = truncate(&long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_split_message_keeps_lines_whole() {
        let questions: Vec<_> = (1..=200)
            .map(|id| question(id, &format!("Question {} about a fairly long topic that needs truncating", id), "General"))
            .collect();
        let text = edit_list(&questions);
        assert!(text.chars().count() > MAX_MESSAGE_CHARS);

        let chunks = split_message(&text, MAX_MESSAGE_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert!(chunks[1].starts_with(|c: char| c.is_ascii_digit()));
        assert_eq!(chunks.join("\n"), text.trim_end());
    }

    #[test]
    fn test_split_message_hard_splits_long_line() {
        let chunks = split_message(&format!("head\n{}\ntail", "é".repeat(25)), 10);
        assert_eq!(chunks, vec!["head", "éééééééééé", "éééééééééé", "ééééé\ntail"]);
        assert_eq!(split_message("short", MAX_MESSAGE_CHARS), vec!["short"]);
        assert!(split_message("", 10).is_empty());
    }

    #[test]
    fn test_question_list_groups_by_category() {
        let text = question_list(&[
            question(2, "Why is the sky blue?", "Science"),
            question(1, "Capital of Peru?", "Geography"),
        ]);
        let geo = text.find("📂 Geography (1)").unwrap();
        let sci = text.find("📂 Science (1)").unwrap();
        assert!(geo < sci);
        assert!(text.contains("  ID 2: Why is the sky blue?"));
    }

    #[test]
    fn test_leaderboard_mentions_remaining_users() {
        let entries = vec![LeaderboardEntry {
            user_id: 1,
            name: "Ada".to_string(),
            score: 3.5,
            correct_answers: 4,
            total_answers: 6,
        }];
        let text = leaderboard(&entries, 4);
        assert!(text.contains("🥇 #1: Ada - 3.50 points (6 questions)"));
        assert!(text.ends_with("...and 3 more users."));
    }

    #[test]
    fn test_stats_accuracy_one_decimal() {
        let stats = UserStats {
            correct_answers: 2,
            total_answers: 3,
            ..UserStats::default()
        };
        assert!(stats_text_contains(&stats, "🎯 Accuracy: 66.7%"));
    }

    fn stats_text_contains(stats: &UserStats, needle: &str) -> bool {
        super::stats("Ada", stats).contains(needle)
    }

    #[test]
    fn test_poll_saved_mentions_shared_id() {
        let text = poll_saved(&question(5, "Q", "Quiz"), 3, true);
        assert!(text.contains("Added to ID #5"));
        assert!(text.contains("Now 3 questions"));
        assert!(text.contains("Batch mode"));
    }
}
