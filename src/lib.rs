// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod catalog;    // node types + builtin catalog
pub mod engine;     // execution core
pub mod errors;     // error handling
pub mod model;      // workflow definitions + runtime values
pub mod observability;
pub mod planner;    // validation + level planning
pub mod services;   // external collaborators
