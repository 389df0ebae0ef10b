// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod engine;
pub mod execution;
pub mod planning;
pub mod pricing;
pub mod search;
pub mod selector;
pub mod validation;
