//! Integration tests for the Telegram handlers
//!
//! Both the Bot API and the extraction API are served by wiremock; the
//! handlers run unchanged against them.

use std::sync::Arc;
use tempfile::TempDir;
use teloxide::prelude::*;
use teloxide::types::Message;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use reelbot::telegram::admin::{handle_broadcast_command, handle_stats_command};
use reelbot::telegram::handlers::{handle_link_message, handle_start_command};
use reelbot::telegram::{replies, HandlerDeps};
use reelcore::storage::db::{stats, upsert_user};
use reelcore::{create_pool, get_connection, Config, ExtractionClient, ProxyPool, UserInfo};

const ADMIN_ID: u64 = 1000;
const USER_ID: u64 = 2000;
const CHAT_ID: i64 = 2000;

struct RealHandlerTest {
    telegram: MockServer,
    api: MockServer,
    bot: Bot,
    deps: HandlerDeps,
    _dir: TempDir,
}

impl RealHandlerTest {
    async fn new() -> Self {
        let telegram = MockServer::start().await;
        let api = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        let endpoint = format!("{}/extract", api.uri());
        let db_path = dir.path().join("test.sqlite3").to_string_lossy().to_string();
        let config = Config::from_lookup(|key| match key {
            "API_ENDPOINT" => Some(endpoint.clone()),
            "API_TIMEOUT_MS" => Some("2000".to_string()),
            "ADMIN_IDS" => Some(ADMIN_ID.to_string()),
            "DB_PATH" => Some(db_path.clone()),
            _ => None,
        });

        let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(telegram.uri().parse().unwrap());
        let db_pool = Arc::new(create_pool(&config.database_path).unwrap());
        let extractor = Arc::new(ExtractionClient::new(&config, Arc::new(ProxyPool::empty())).unwrap());
        let deps = HandlerDeps::new(db_pool, extractor, Arc::new(config));

        let test = Self {
            telegram,
            api,
            bot,
            deps,
            _dir: dir,
        };
        test.mock_telegram_api().await;
        test
    }

    async fn mock_telegram_api(&self) {
        let sent = serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 42,
                "from": { "id": 987654321, "is_bot": true, "first_name": "TestBot" },
                "chat": { "id": CHAT_ID, "type": "private" },
                "date": 1735992000,
                "text": "Response"
            }
        });
        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/sendMessage$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent))
            .mount(&self.telegram)
            .await;

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/sendChatAction$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true, "result": true })))
            .mount(&self.telegram)
            .await;

        let video = serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 43,
                "from": { "id": 987654321, "is_bot": true, "first_name": "TestBot" },
                "chat": { "id": CHAT_ID, "type": "private" },
                "date": 1735992000,
                "video": {
                    "file_id": "video_id",
                    "file_unique_id": "video_uid",
                    "width": 720,
                    "height": 1280,
                    "duration": 15
                }
            }
        });
        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/sendVideo$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(video))
            .mount(&self.telegram)
            .await;
    }

    fn message(text: &str, user_id: u64) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1735992000,
            "chat": {
                "id": CHAT_ID,
                "type": "private",
                "first_name": "Test",
                "username": "testuser"
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
                "username": "testuser"
            },
            "text": text
        });
        serde_json::from_value(json).expect("Failed to deserialize message")
    }

    async fn telegram_calls(&self, method_name: &str) -> Vec<Request> {
        let suffix = format!("/{}", method_name.to_lowercase());
        self.telegram
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().to_lowercase().ends_with(&suffix))
            .collect()
    }

    async fn sent_texts(&self) -> Vec<String> {
        self.telegram_calls("sendMessage")
            .await
            .iter()
            .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }

    fn usage(&self) -> reelcore::UsageStats {
        let conn = get_connection(&self.deps.db_pool).unwrap();
        stats(&conn).unwrap()
    }
}

#[tokio::test]
async fn test_supported_link_is_delivered_and_recorded() {
    let test = RealHandlerTest::new().await;
    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "redirect",
            "url": "https://cdn.example.com/clip.mp4"
        })))
        .expect(1)
        .mount(&test.api)
        .await;

    let msg = RealHandlerTest::message("look at this https://www.tiktok.com/@user/video/123", USER_ID);
    handle_link_message(&test.bot, &msg, &test.deps).await.unwrap();

    let videos = test.telegram_calls("sendVideo").await;
    assert_eq!(videos.len(), 1);
    let body = String::from_utf8_lossy(&videos[0].body);
    assert!(body.contains("https://cdn.example.com/clip.mp4"));
    assert!(body.contains("Source: TikTok"));

    assert!(test.sent_texts().await.iter().any(|t| t.contains("TikTok")));

    let usage = test.usage();
    assert_eq!(usage.users, 1);
    assert_eq!(usage.videos, 1);
}

#[tokio::test]
async fn test_upstream_error_is_explained_to_user() {
    let test = RealHandlerTest::new().await;
    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "error": { "code": "error.api.fetch.rate-limit" }
        })))
        .mount(&test.api)
        .await;

    let msg = RealHandlerTest::message("https://www.instagram.com/reel/abc/", USER_ID);
    handle_link_message(&test.bot, &msg, &test.deps).await.unwrap();

    assert!(test.telegram_calls("sendVideo").await.is_empty());
    assert!(test
        .sent_texts()
        .await
        .iter()
        .any(|t| t.contains("currently blocking requests")));
    assert_eq!(test.usage().videos, 0);
}

#[tokio::test]
async fn test_unsupported_link_never_reaches_api() {
    let test = RealHandlerTest::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test.api)
        .await;

    let msg = RealHandlerTest::message("https://example.org/some/page", USER_ID);
    handle_link_message(&test.bot, &msg, &test.deps).await.unwrap();

    assert_eq!(test.sent_texts().await, vec![replies::UNSUPPORTED_LINK_TEXT.to_string()]);
}

#[tokio::test]
async fn test_text_without_link_is_ignored() {
    let test = RealHandlerTest::new().await;

    let msg = RealHandlerTest::message("hello there", USER_ID);
    handle_link_message(&test.bot, &msg, &test.deps).await.unwrap();

    assert!(test.sent_texts().await.is_empty());
}

#[tokio::test]
async fn test_start_registers_user() {
    let test = RealHandlerTest::new().await;

    let msg = RealHandlerTest::message("/start", USER_ID);
    handle_start_command(&test.bot, &msg, &test.deps).await.unwrap();

    assert_eq!(test.sent_texts().await, vec![replies::WELCOME_TEXT.to_string()]);
    assert_eq!(test.usage().users, 1);
}

#[tokio::test]
async fn test_stats_requires_admin() {
    let test = RealHandlerTest::new().await;

    let msg = RealHandlerTest::message("/stats", USER_ID);
    handle_stats_command(&test.bot, &msg, &test.deps).await.unwrap();
    assert_eq!(test.sent_texts().await, vec![replies::NO_PERMISSION_TEXT.to_string()]);

    let msg = RealHandlerTest::message("/stats", ADMIN_ID);
    handle_stats_command(&test.bot, &msg, &test.deps).await.unwrap();
    let texts = test.sent_texts().await;
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("direct connection"));
}

#[tokio::test]
async fn test_broadcast_counts_delivered_and_failed() {
    let test = RealHandlerTest::new().await;
    {
        let conn = get_connection(&test.deps.db_pool).unwrap();
        upsert_user(&conn, &UserInfo::new(3001, Some("reachable".into()), "Ann", None)).unwrap();
        upsert_user(&conn, &UserInfo::new(3002, Some("blocked".into()), "Bob", None)).unwrap();
    }
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bot[^/]+/sendMessage$"))
        .and(body_partial_json(serde_json::json!({ "chat_id": 3002 })))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .with_priority(1)
        .mount(&test.telegram)
        .await;

    let msg = RealHandlerTest::message("/broadcast hello everyone", ADMIN_ID);
    handle_broadcast_command(&test.bot, &msg, &test.deps, "  hello everyone ").await.unwrap();

    let texts = test.sent_texts().await;
    assert_eq!(texts.iter().filter(|t| t.as_str() == "hello everyone").count(), 2);
    assert_eq!(texts.last().map(String::as_str), Some(replies::broadcast_summary(1, 1).as_str()));
    assert!(texts.last().unwrap().contains("1 delivered, 1 failed"));

    let conn = get_connection(&test.deps.db_pool).unwrap();
    let (admin_id, message, sent, failed): (i64, String, i64, i64) = conn
        .query_row(
            "SELECT admin_id, message, sent_count, failed_count FROM broadcasts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(admin_id, ADMIN_ID as i64);
    assert_eq!(message, "hello everyone");
    assert_eq!((sent, failed), (1, 1));
}

#[tokio::test]
async fn test_broadcast_rejects_non_admin_and_empty_text() {
    let test = RealHandlerTest::new().await;

    let msg = RealHandlerTest::message("/broadcast hi", USER_ID);
    handle_broadcast_command(&test.bot, &msg, &test.deps, "hi").await.unwrap();

    let msg = RealHandlerTest::message("/broadcast", ADMIN_ID);
    handle_broadcast_command(&test.bot, &msg, &test.deps, "   ").await.unwrap();

    assert_eq!(
        test.sent_texts().await,
        vec![
            replies::NO_PERMISSION_TEXT.to_string(),
            replies::BROADCAST_USAGE_TEXT.to_string()
        ]
    );
    assert_eq!(test.usage().broadcasts, 0);
}
