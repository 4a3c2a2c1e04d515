// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business (Cloud API) provider for Courier.
//!
//! [`WabaSessionProvider`] plugs into the platform checkers and the sender
//! as the `waba` [`SessionProvider`](courier_core::SessionProvider).

pub mod client;
pub mod provider;
pub mod types;

pub use client::WabaClient;
pub use provider::WabaSessionProvider;
