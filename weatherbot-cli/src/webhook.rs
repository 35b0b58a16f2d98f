//! Webhook delivery: Telegram POSTs each update to us over HTTP.
//!
//! Routes:
//! - GET  /         - liveness check
//! - POST /webhook  - update delivery (path configurable)

use std::{future::Future, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use tracing::{debug, info, warn};
use weatherbot_core::{ChatTransport, Config, MessageDispatcher, TelegramClient, Update};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<MessageDispatcher>,
    transport: Arc<dyn ChatTransport>,
    secret_token: Option<Arc<str>>,
}

impl WebhookState {
    pub fn new(
        dispatcher: MessageDispatcher,
        transport: Arc<dyn ChatTransport>,
        secret_token: Option<&str>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            transport,
            secret_token: secret_token
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Arc::from),
        }
    }
}

pub fn router(state: WebhookState, webhook_path: &str) -> Router {
    let webhook_path = format!("/{}", webhook_path.trim_start_matches('/'));

    Router::new()
        .route("/", get(health))
        .route(&webhook_path, post(receive_update))
        .with_state(state)
}

async fn health() -> &'static str {
    "Bot is running!"
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> (StatusCode, &'static str) {
    if let Some(expected) = state.secret_token.as_deref() {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!(update_id = update.update_id, "rejecting update with wrong secret token");
            return (StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let update_id = update.update_id;
    match update.into_incoming() {
        Some(message) => {
            debug!(update_id, chat_id = message.chat_id, "handling message");
            state.dispatcher.dispatch(message, state.transport.as_ref()).await;
        }
        None => debug!(update_id, "skipping update without text"),
    }

    // Telegram redelivers anything that is not a 2xx, so failures are acknowledged too.
    (StatusCode::OK, "OK")
}

pub async fn serve(
    cfg: &Config,
    dispatcher: MessageDispatcher,
    telegram: TelegramClient,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let secret = cfg.server.secret_token.as_deref();

    if let Some(url) = cfg.webhook_url() {
        telegram
            .set_webhook(&url, secret)
            .await
            .context("Failed to register webhook with Telegram")?;
        info!(%url, "Webhook registered");
    }

    let state = WebhookState::new(dispatcher, Arc::new(telegram), secret);
    let app = router(state, &cfg.server.webhook_path);

    let bind_address = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!("Webhook server listening on http://{}{}", bind_address, cfg.server.webhook_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webhook server failed")?;

    info!("Webhook server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use weatherbot_core::{
        IntentParser, OutgoingMessage, TelegramError, WeatherError, WeatherProvider,
        WeatherResult,
    };

    #[derive(Debug, Default)]
    struct CountingWeather(Mutex<Vec<String>>);

    #[async_trait]
    impl WeatherProvider for CountingWeather {
        async fn fetch(&self, city: &str) -> Result<WeatherResult, WeatherError> {
            self.0.lock().unwrap().push(city.to_string());
            Ok(WeatherResult {
                description: "Ясно".into(),
                temperature_c: Some(21.4),
                feels_like_c: Some(20.9),
                humidity_pct: Some(50),
                wind_speed_mps: Some(2.0),
            })
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<OutgoingMessage>>);

    #[async_trait]
    impl ChatTransport for Outbox {
        async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError> {
            self.0.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        weather: Arc<CountingWeather>,
        outbox: Arc<Outbox>,
    }

    fn harness(secret: Option<&str>) -> Harness {
        let weather = Arc::new(CountingWeather::default());
        let outbox = Arc::new(Outbox::default());
        let dispatcher = MessageDispatcher::new(IntentParser::new("Odessa"), weather.clone());
        let state = WebhookState::new(dispatcher, outbox.clone(), secret);

        Harness {
            app: router(state, "/webhook"),
            weather,
            outbox,
        }
    }

    fn update_request(text: &str, secret: Option<&str>) -> Request<Body> {
        let body = serde_json::json!({
            "update_id": 100,
            "message": { "message_id": 1, "chat": { "id": 77, "type": "private" }, "text": text }
        });

        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_route_answers() {
        let h = harness(None);

        let response = h
            .app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Bot is running!");
    }

    #[tokio::test]
    async fn weather_update_sends_reply_to_same_chat() {
        let h = harness(None);

        let response = h.app.oneshot(update_request("/weather Одесса", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*h.weather.0.lock().unwrap(), vec!["Одесса".to_string()]);

        let sent = h.outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 77);
        assert!(sent[0].text.contains("Одесса"));
        assert!(sent[0].text.contains("21°C"));
    }

    #[tokio::test]
    async fn start_update_skips_weather_lookup() {
        let h = harness(None);

        let response = h.app.oneshot(update_request("/start", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.weather.0.lock().unwrap().is_empty());
        assert_eq!(h.outbox.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected_without_reply() {
        let h = harness(Some("s3cret"));

        let response = h.app.oneshot(update_request("Kyiv", Some("guess"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.weather.0.lock().unwrap().is_empty());
        assert!(h.outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn matching_secret_is_accepted() {
        let h = harness(Some("s3cret"));

        let response = h.app.oneshot(update_request("Kyiv", Some("s3cret"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.outbox.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_without_message_is_acknowledged() {
        let h = harness(None);

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"update_id": 3, "edited_message": {}}"#))
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.outbox.0.lock().unwrap().is_empty());
    }
}
