// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the two tables the signature lifecycle touches.

pub mod agreements;
pub mod events;
