// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod builder;
pub mod guard;
pub mod records;

pub use builder::{BuiltTx, ExecutionPlan, TransactionBuilder};
pub use guard::{GuardPolicy, Submission, SubmissionGuard};
