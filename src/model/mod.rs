// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod trigger;
mod value;
mod workflow;

pub use loader::{load_and_validate_workflow, load_workflow};
pub use trigger::TriggerPayload;
pub use value::{InlineBlob, ObjectReference, Value};
pub use workflow::{Edge, InputPort, Node, OutputPort, PortType, Trigger, Workflow};
