// ABOUTME: Fire-and-forget security audit logging
// ABOUTME: Records protocol outcomes to the database; failures are logged and never fail the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::oauth2_server::models::AuditEvent;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Audit event kinds
pub mod events {
    /// Outcome of a token exchange attempt
    pub const TOKEN_EXCHANGE: &str = "token_exchange";
}

/// Audit logger writing to the shared database
///
/// Every write is best-effort: an audit insert that fails must never fail
/// the flow being audited.
pub struct AuditLogger {
    database: Arc<Database>,
}

impl AuditLogger {
    /// Creates a new audit logger
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Record an audit event, swallowing storage failures
    pub async fn record(
        &self,
        event_kind: &str,
        success: bool,
        client_id: Option<&str>,
        error_message: Option<&str>,
    ) {
        let event = AuditEvent {
            id: Uuid::new_v4().to_string(),
            event_kind: event_kind.to_owned(),
            success,
            client_id: client_id.map(std::borrow::ToOwned::to_owned),
            error_message: error_message.map(std::borrow::ToOwned::to_owned),
            created_at: Utc::now(),
        };

        if let Err(e) = self.database.record_audit_event(&event).await {
            tracing::warn!(error = %e, event_kind = %event_kind, "Failed to record audit event");
        }
    }
}
