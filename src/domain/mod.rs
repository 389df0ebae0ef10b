// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod constants;
pub mod error;
pub mod pool;
pub mod route;
pub mod trade;
