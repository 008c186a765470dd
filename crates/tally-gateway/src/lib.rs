// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Tally.
//!
//! Exposes invoice CRUD, payment marking, auto-send control, expenses, and
//! the dispatch scheduler over a bearer-authenticated JSON API.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, ServerConfig, router, start_server};
