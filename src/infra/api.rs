use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::filter::FilterCriteria;
use crate::domain::stats::StatsSnapshot;
use crate::domain::ticket::{ClassificationSuggestion, Status, Ticket, TicketDraft};
use crate::error::{AppError, AppResult};
use crate::services::{ClassifierService, TicketStoreService};
use crate::session::Session;

/// REST client for the ticket backend.
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match self.session.bearer() {
            Some(bearer) => request.header(AUTHORIZATION, bearer),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call backend: {err}")))?;

        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Transport(format!("failed to parse backend response: {err}")))
    }

    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail);
        tracing::debug!(status = status.as_u16(), body = %body, "backend rejected request");
        Err(AppError::Backend {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl ClassifierService for ApiClient {
    async fn classify(&self, description: &str) -> AppResult<ClassificationSuggestion> {
        let request = self
            .http
            .post(self.endpoint("tickets/classify/"))
            .json(&ClassifyRequest { description });
        self.send(request).await
    }
}

#[async_trait]
impl TicketStoreService for ApiClient {
    async fn create_ticket(&self, draft: &TicketDraft) -> AppResult<Ticket> {
        let request = self.http.post(self.endpoint("tickets/")).json(draft);
        self.send(request).await
    }

    async fn list_tickets(&self, filters: &FilterCriteria) -> AppResult<Vec<Ticket>> {
        let request = self
            .http
            .get(self.endpoint("tickets/"))
            .query(&filters.query_pairs());
        let payload: TicketListPayload = self.send(request).await?;
        Ok(payload.into_tickets())
    }

    async fn update_ticket_status(&self, id: u64, status: Status) -> AppResult<Ticket> {
        let request = self
            .http
            .patch(self.endpoint(&format!("tickets/{id}/")))
            .json(&StatusPatch { status });
        self.send(request).await
    }

    async fn stats(&self) -> AppResult<StatsSnapshot> {
        let request = self.http.get(self.endpoint("tickets/stats/"));
        self.send(request).await
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    description: &'a str,
}

#[derive(Serialize)]
struct StatusPatch {
    status: Status,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Listing responses arrive either bare or wrapped in a pagination envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum TicketListPayload {
    Paged { results: Vec<Ticket> },
    Bare(Vec<Ticket>),
}

impl TicketListPayload {
    fn into_tickets(self) -> Vec<Ticket> {
        match self {
            TicketListPayload::Paged { results } => results,
            TicketListPayload::Bare(tickets) => tickets,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{
        body_json, header, method, path, query_param, query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::domain::filter::FilterUpdate;
    use crate::domain::ticket::{Category, Priority};

    fn ticket_json(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "VPN drops",
            "description": "The VPN disconnects every ten minutes.",
            "category": "technical",
            "priority": "high",
            "status": status,
            "created_at": "2024-05-01T09:00:00Z"
        })
    }

    fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
        ApiClient::new(
            server.uri(),
            Arc::new(Session::init(token.map(str::to_string))),
        )
    }

    #[tokio::test]
    async fn list_sends_only_populated_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tickets/"))
            .and(query_param("category", "technical"))
            .and(query_param("status", "open"))
            .and(query_param_is_missing("priority"))
            .and(query_param_is_missing("search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([ticket_json(1, "open")])))
            .expect(1)
            .mount(&server)
            .await;

        let mut filters = FilterCriteria::default();
        filters.apply(
            FilterUpdate::default()
                .category(Some(Category::Technical))
                .status(Some(Status::Open)),
        );

        let tickets = client(&server, None).list_tickets(&filters).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn list_accepts_paginated_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tickets/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "next": null,
                "results": [ticket_json(1, "open"), ticket_json(2, "closed")]
            })))
            .mount(&server)
            .await;

        let tickets = client(&server, None)
            .list_tickets(&FilterCriteria::default())
            .await
            .unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[1].status, Status::Closed);
    }

    #[tokio::test]
    async fn attaches_bearer_when_session_has_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tickets/stats/"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_tickets": 0,
                "open_tickets": 0,
                "avg_tickets_per_day": 0.0,
                "priority_breakdown": {},
                "category_breakdown": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client(&server, Some("s3cret")).stats().await.unwrap();
        assert_eq!(stats.total_tickets, 0);
    }

    #[tokio::test]
    async fn omits_authorization_without_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tickets/classify/"))
            .and(body_json(json!({"description": "I was charged twice for my plan"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggested_category": "billing",
                "suggested_priority": "high"
            })))
            .mount(&server)
            .await;

        let suggestion = client(&server, None)
            .classify("I was charged twice for my plan")
            .await
            .unwrap();
        assert_eq!(suggestion.category, Category::Billing);

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn patches_status_on_ticket_path() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/tickets/42/"))
            .and(body_json(json!({"status": "in_progress"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ticket_json(42, "in_progress")))
            .expect(1)
            .mount(&server)
            .await;

        let ticket = client(&server, None)
            .update_ticket_status(42, Status::InProgress)
            .await
            .unwrap();
        assert_eq!(ticket.status, Status::InProgress);
    }

    #[tokio::test]
    async fn surfaces_server_detail_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tickets/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Title is too long."})),
            )
            .mount(&server)
            .await;

        let err = client(&server, None)
            .create_ticket(&TicketDraft::default())
            .await
            .unwrap_err();
        match err {
            AppError::Backend { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("Title is too long."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
