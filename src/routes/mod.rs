// ABOUTME: Service-level HTTP routes outside the OAuth protocol surface
// ABOUTME: Currently health and readiness endpoints for monitoring infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

/// Health check routes for service monitoring
pub mod health;

pub use health::HealthRoutes;
