// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod aggregation;
pub mod assembler;
pub mod curves;
pub mod encode;
pub mod native;
pub mod ordering;

pub use assembler::{AssembledRoute, RouteAssembler};
pub use encode::RouteEncoder;
