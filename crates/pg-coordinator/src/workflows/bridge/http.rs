use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{BridgeError, ChaplaincyBridge, VisitInvite};

/// Posts visit invites as JSON to the chaplaincy system's intake endpoint.
#[derive(Debug, Clone)]
pub struct HttpChaplaincyBridge {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpChaplaincyBridge {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(BridgeError::Configuration("endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BridgeError::Configuration(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim().to_string(),
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(err: reqwest::Error) -> BridgeError {
        if err.is_timeout() {
            BridgeError::Timeout
        } else {
            BridgeError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ChaplaincyBridge for HttpChaplaincyBridge {
    async fn send_visit_invite(&self, invite: &VisitInvite) -> Result<(), BridgeError> {
        let mut request = self.client.post(&self.endpoint).json(invite);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(Self::map_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(BridgeError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invite() -> VisitInvite {
        VisitInvite {
            group_name: "PG Esperança".to_string(),
            leader_name: "Lúcia Ramos".to_string(),
            leader_contact: "lucia@hospital.org".to_string(),
            unit_code: "Belém".to_string(),
            date: "2025-03-12T19:00:00".to_string(),
            notes: None,
            preferred_chaplain_id: None,
        }
    }

    #[tokio::test]
    async fn posts_invite_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/visits"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_partial_json(serde_json::json!({
                "group_name": "PG Esperança",
                "date": "2025-03-12T19:00:00",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = HttpChaplaincyBridge::new(
            format!("{}/visits", server.uri()),
            Some("secret-token".to_string()),
            Duration::from_secs(5),
        )
        .expect("client builds");

        bridge
            .send_visit_invite(&invite())
            .await
            .expect("invite delivered");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate visit"))
            .mount(&server)
            .await;

        let bridge = HttpChaplaincyBridge::new(server.uri(), None, Duration::from_secs(5))
            .expect("client builds");

        match bridge.send_visit_invite(&invite()).await {
            Err(BridgeError::Rejected { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "duplicate visit");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let bridge = HttpChaplaincyBridge::new(server.uri(), None, Duration::from_millis(50))
            .expect("client builds");

        assert!(matches!(
            bridge.send_visit_invite(&invite()).await,
            Err(BridgeError::Timeout)
        ));
    }

    #[test]
    fn empty_endpoint_is_a_configuration_error() {
        assert!(matches!(
            HttpChaplaincyBridge::new("  ", None, Duration::from_secs(1)),
            Err(BridgeError::Configuration(_))
        ));
    }
}
