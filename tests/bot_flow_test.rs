mod common;

use common::*;
use quiz_bot::core::messages;

#[tokio::test]
async fn test_start_registers_user_and_welcomes() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/start")).await;

    assert!(api.last_text().starts_with("👋 Hello Ada!"));
    let users = storage.json("users.json").await;
    assert_eq!(users["10"]["name"], "Ada");
    assert_eq!(users["10"]["quizzes_taken"], 0);
}

#[tokio::test]
async fn test_help_is_sent_as_markdown() {
    let (bot, api, _storage) = test_bot();
    bot.handle_update(text_update(-100, &user(10, "Ada"), "/help@QuizBot")).await;

    let sent = api.last_sent();
    assert_eq!(sent.text, messages::HELP_TEXT);
    assert!(sent.parse_mode.is_some());
}

#[tokio::test]
async fn test_add_question_dialog() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/add")).await;
    assert_eq!(api.last_text(), messages::ASK_QUESTION_TEXT);

    bot.handle_update(text_update(-100, &ada, "Largest ocean?")).await;
    assert_eq!(api.last_text(), messages::ASK_OPTIONS);

    bot.handle_update(text_update(-100, &ada, "Atlantic")).await;
    assert_eq!(api.last_text(), messages::TOO_FEW_OPTIONS);

    bot.handle_update(text_update(-100, &ada, "Atlantic\n\n Pacific \nIndian")).await;
    assert!(api.last_text().contains("2. Pacific"));

    bot.handle_update(text_update(-100, &ada, "7")).await;
    assert_eq!(api.last_text(), messages::answer_out_of_range(3));

    bot.handle_update(text_update(-100, &ada, "2")).await;
    assert_eq!(api.last_text(), messages::ASK_CATEGORY);
    let menu = api.last_sent();
    assert!(menu.reply_markup.is_some());

    bot.handle_update(callback_update(-100, &ada, 42, "category_Geography")).await;
    assert!(api.last_text().contains("✅ Question added successfully!"));
    assert!(api.last_text().contains("ID: 3"));
    assert_eq!(api.answered_callbacks.lock().unwrap().len(), 1);

    let questions = storage.json("questions.json").await;
    let saved = &questions[2];
    assert_eq!(saved["id"], 3);
    assert_eq!(saved["question"], "Largest ocean?");
    assert_eq!(saved["answer"], 1);
    assert_eq!(saved["category"], "Geography");
    assert_eq!(saved["options"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_dialogs_are_per_user() {
    let (bot, api, _storage) = test_bot();
    let ada = user(10, "Ada");
    let bob = user(11, "Bob");

    bot.handle_update(text_update(-100, &ada, "/add")).await;
    let before = api.texts().len();

    // Bob 沒有進行中的對話，一般文字不會有回應
    bot.handle_update(text_update(-100, &bob, "Random chatter")).await;
    assert_eq!(api.texts().len(), before);

    bot.handle_update(text_update(-100, &ada, "My question?")).await;
    assert_eq!(api.last_text(), messages::ASK_OPTIONS);
}

#[tokio::test]
async fn test_cancel_resets_dialog() {
    let (bot, api, _storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/add")).await;
    bot.handle_update(text_update(-100, &ada, "/cancel")).await;
    assert_eq!(api.last_text(), messages::CANCELLED);

    bot.handle_update(text_update(-100, &ada, "/cancel")).await;
    assert_eq!(api.last_text(), messages::NOTHING_TO_CANCEL);

    let before = api.texts().len();
    bot.handle_update(text_update(-100, &ada, "Not a question anymore")).await;
    assert_eq!(api.texts().len(), before);
}

#[tokio::test]
async fn test_delete_removes_question_set() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/delete")).await;
    let keyboard = api.last_sent().reply_markup.unwrap();
    let data: Vec<_> = keyboard.buttons().map(|b| b.callback_data.clone()).collect();
    assert_eq!(data, vec!["delete_1", "delete_2", "delete_cancel"]);

    bot.handle_update(callback_update(-100, &ada, 5, "delete_1")).await;
    assert_eq!(api.last_edit().text, "✅ Question deleted successfully.");

    let questions = storage.json("questions.json").await;
    assert_eq!(questions.as_array().unwrap().len(), 1);
    assert_eq!(questions[0]["id"], 2);

    bot.handle_update(callback_update(-100, &ada, 5, "delete_1")).await;
    assert_eq!(api.last_edit().text, "❌ Question not found.");
}

#[tokio::test]
async fn test_edit_question_answer() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/edit")).await;
    assert!(api.last_text().contains("1. What is the capital of France?"));

    bot.handle_update(text_update(-100, &ada, "1")).await;
    assert!(api.last_text().contains("Correct answer: Paris"));

    bot.handle_update(text_update(-100, &ada, "3")).await;
    bot.handle_update(text_update(-100, &ada, "1")).await;
    assert_eq!(api.last_text(), "✅ Question updated successfully!");

    let questions = storage.json("questions.json").await;
    assert_eq!(questions[0]["answer"], 0);
}

#[tokio::test]
async fn test_list_and_leaderboard_without_players() {
    let (bot, api, _storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/list")).await;
    assert!(api.last_text().contains("📂 Geography (1)"));

    bot.handle_update(text_update(-100, &ada, "/leaderboard")).await;
    assert!(api.last_text().starts_with("No quiz data available yet."));
}

#[tokio::test]
async fn test_unknown_callback_is_acknowledged_and_ignored() {
    let (bot, api, _storage) = test_bot();
    bot.handle_update(callback_update(-100, &user(10, "Ada"), 5, "launch_rockets")).await;

    assert_eq!(api.answered_callbacks.lock().unwrap().len(), 1);
    assert!(api.texts().is_empty());
    assert!(api.edits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clone_url_rejects_bad_format() {
    let (bot, api, _storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(text_update(-100, &ada, "/clone")).await;
    bot.handle_update(callback_update(-100, &ada, 3, "clone_url")).await;
    assert_eq!(api.last_edit().text, messages::CLONE_URL_PROMPT);

    bot.handle_update(text_update(-100, &ada, "t.me/justachannel")).await;
    assert_eq!(api.last_text(), messages::URL_FORMAT_HELP);
}

#[tokio::test]
async fn test_poll2q_requires_reply() {
    let (bot, api, _storage) = test_bot();
    bot.handle_update(text_update(-100, &user(10, "Ada"), "/poll2q")).await;
    assert_eq!(api.last_text(), messages::POLL2Q_USAGE);
}

#[tokio::test]
async fn test_poll2q_quiz_poll_with_preset_id_saves_immediately() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");
    let poll = poll_message(-100, "Fastest land animal?", &["Lion", "Cheetah"], Some(1));

    bot.handle_update(reply_update(-100, &ada, "/poll2q id=7", poll)).await;

    let text = api.last_text();
    assert!(text.contains("🆔 Assigned ID #7"));
    assert!(text.contains("✓ Correct answer: Cheetah"));

    let questions = storage.json("questions.json").await;
    let saved = &questions[2];
    assert_eq!(saved["id"], 7);
    assert_eq!(saved["category"], "Poll Quiz");
}

#[tokio::test]
async fn test_poll2q_regular_poll_wizard() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");
    let poll = poll_message(-100, "Best pet?", &["Cat", "Dog", "Fish"], None);

    bot.handle_update(reply_update(-100, &ada, "/poll2q", poll)).await;
    let wizard = api.last_sent();
    assert!(wizard.text.contains("Regular Poll (needs answer)"));
    let answers: Vec<_> = wizard
        .reply_markup
        .unwrap()
        .buttons()
        .map(|b| b.callback_data.clone())
        .collect();
    assert_eq!(answers, vec!["pollans_0", "pollans_1", "pollans_2"]);

    bot.handle_update(callback_update(-100, &ada, 8, "pollans_1")).await;
    assert!(api.last_edit().text.contains("Correct: Dog"));

    bot.handle_update(callback_update(-100, &ada, 8, "pollcat_0")).await;
    let method = api.last_edit();
    assert!(method.text.contains("Category: Quiz"));

    bot.handle_update(callback_update(-100, &ada, 8, "pollid_auto")).await;
    assert!(api.last_text().contains("🆔 Assigned ID #3"));

    let questions = storage.json("questions.json").await;
    assert_eq!(questions[2]["answer"], 1);
    assert_eq!(questions[2]["category"], "Quiz");

    // 已儲存後再次按下按鈕
    bot.handle_update(callback_update(-100, &ada, 8, "pollid_auto")).await;
    assert_eq!(api.last_text(), messages::PENDING_POLL_MISSING);
}

#[tokio::test]
async fn test_poll2q_batch_counter_increments() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");

    let first = poll_message(-100, "One?", &["a", "b"], Some(0));
    bot.handle_update(reply_update(-100, &ada, "/poll2q start=50 batch", first)).await;
    assert!(api.last_text().contains("Assigned ID #50"));
    assert!(api.last_text().contains("Batch mode is active"));

    let second = poll_message(-100, "Two?", &["a", "b"], Some(1));
    bot.handle_update(reply_update(-100, &ada, "/poll2q", second)).await;
    assert!(api.last_text().contains("Assigned ID #51"));

    let questions = storage.json("questions.json").await;
    let ids: Vec<u64> = questions
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 50, 51]);
}

#[tokio::test]
async fn test_poll2q_custom_id_dialog() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");
    let poll = poll_message(-100, "Sky colour?", &["Blue", "Green"], Some(0));

    bot.handle_update(reply_update(-100, &ada, "/poll2q", poll)).await;
    let choices: Vec<_> = api
        .last_sent()
        .reply_markup
        .unwrap()
        .buttons()
        .map(|b| b.text.clone())
        .collect();
    assert_eq!(choices[2], "🔬 Science");
    bot.handle_update(callback_update(-100, &ada, 8, "pollcat_2")).await;
    bot.handle_update(callback_update(-100, &ada, 8, "pollid_custom")).await;
    let menu = api.last_edit().reply_markup.unwrap();
    assert!(menu.buttons().any(|b| b.callback_data == "pollid_next_3"));

    bot.handle_update(callback_update(-100, &ada, 8, "pollid_input")).await;
    assert_eq!(api.last_edit().text, messages::ASK_CUSTOM_ID);

    bot.handle_update(text_update(-100, &ada, "zero")).await;
    assert_eq!(api.last_text(), messages::INVALID_CUSTOM_ID);

    bot.handle_update(text_update(-100, &ada, "2")).await;
    let text = api.last_text();
    assert!(text.contains("Added to ID #2"));
    assert!(text.contains("Now 2 questions with this ID"));

    let questions = storage.json("questions.json").await;
    assert_eq!(questions[2]["id"], 2);
    assert_eq!(questions[2]["category"], "Science");
}

#[tokio::test]
async fn test_long_typed_category_keeps_callback_data_short() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");
    let long_category = format!("Zoology {}", "x".repeat(55));

    bot.handle_update(text_update(-100, &ada, "/add")).await;
    bot.handle_update(text_update(-100, &ada, "Which?")).await;
    bot.handle_update(text_update(-100, &ada, "a\nb")).await;
    bot.handle_update(text_update(-100, &ada, "1")).await;
    bot.handle_update(text_update(-100, &ada, &long_category)).await;
    assert!(api.last_text().contains("✅ Question added successfully!"));

    bot.handle_update(text_update(-100, &ada, "/category")).await;
    let markup = api.last_sent().reply_markup.unwrap();
    assert!(markup.buttons().all(|b| b.callback_data.len() <= 64));
    let button = markup.buttons().find(|b| b.text == long_category).unwrap();

    bot.handle_update(callback_update(-100, &ada, 5, &button.callback_data)).await;
    assert!(api.last_edit().text.contains(&long_category));

    let poll = poll_message(-100, "Fastest bird?", &["Falcon", "Owl"], Some(0));
    bot.handle_update(reply_update(-100, &ada, "/poll2q", poll)).await;
    let markup = api.last_sent().reply_markup.unwrap();
    assert!(markup.buttons().all(|b| b.callback_data.len() <= 64));
    let button = markup
        .buttons()
        .find(|b| b.text.ends_with(&long_category))
        .unwrap();

    bot.handle_update(callback_update(-100, &ada, 8, &button.callback_data)).await;
    bot.handle_update(callback_update(-100, &ada, 8, "pollid_auto")).await;
    let questions = storage.json("questions.json").await;
    assert_eq!(questions[3]["question"], "Fastest bird?");
    assert_eq!(questions[3]["category"], long_category.as_str());
}

#[tokio::test]
async fn test_stale_category_button_is_rejected() {
    let (bot, api, _storage) = test_bot();
    let ada = user(10, "Ada");

    bot.handle_update(callback_update(-100, &ada, 5, "cat_9")).await;
    assert!(api.last_edit().text.contains("Category not found"));
    assert!(api.sent_polls().is_empty());
}

#[tokio::test]
async fn test_large_question_bank_is_listed_in_several_messages() {
    let (bot, api, storage) = test_bot();
    let ada = user(10, "Ada");
    let questions: Vec<_> = (1..=200)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "question": format!("Question number {} about a topic long enough to be truncated", id),
                "options": ["a", "b"],
                "answer": 0,
                "category": format!("Category {}", id % 7),
            })
        })
        .collect();
    storage
        .put("questions.json", &serde_json::to_vec(&questions).unwrap())
        .await;

    bot.handle_update(text_update(-100, &ada, "/edit")).await;
    let edit_texts = api.texts();
    assert!(edit_texts.len() > 1);
    assert!(edit_texts.iter().all(|t| t.chars().count() <= 4096));
    assert!(edit_texts.last().unwrap().contains("200. Question number 200"));

    bot.handle_update(text_update(-100, &ada, "150")).await;
    assert!(api.last_text().contains("Question: Question number 150"));

    bot.handle_update(text_update(-100, &ada, "/list")).await;
    let list_texts = &api.texts()[edit_texts.len() + 1..];
    assert!(list_texts.len() > 1);
    assert!(list_texts.iter().all(|t| t.chars().count() <= 4096));
    assert!(list_texts.last().unwrap().contains("Use /quiz to start a random quiz"));
    let listed = list_texts.iter().map(|t| t.matches("  ID ").count()).sum::<usize>();
    assert_eq!(listed, 200);
}
