// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Input collection for a single node.
//!
//! Assembles the `port name -> value` map passed into a node's `execute`
//! from two sources, in order:
//!
//! 1. **Static seed**: declared input ports with a static `value`
//! 2. **Fan-in gather**: values published by upstream nodes on incoming
//!    edges, grouped by target port, iterated in edge declaration order
//!
//! Per-port finalization:
//! - nothing gathered leaves the static seed (possibly nothing)
//! - a `repeated` port takes the whole gathered list
//! - any other port takes the **last** gathered value; last-writer-wins in
//!   declaration order is documented, deliberate, and tested
//!
//! When an upstream output port is declared `repeated` and published a
//! list, its items are spliced individually into the gathered list rather
//! than nested as one value.
//!
//! This function is pure: it reads the workflow and the outputs map and
//! writes nothing.

use crate::model::{Value, Workflow};
use std::collections::{BTreeMap, HashMap};

/// Assemble the input map for `node_id`.
pub fn collect_inputs(
    workflow: &Workflow,
    node_outputs: &HashMap<String, BTreeMap<String, Value>>,
    node_id: &str,
) -> BTreeMap<String, Value> {
    let mut inputs = BTreeMap::new();

    let node = match workflow.node(node_id) {
        Some(node) => node,
        None => return inputs,
    };

    // Static seed
    for port in &node.inputs {
        if let Some(value) = &port.value {
            inputs.insert(port.name.clone(), value.clone());
        }
    }

    // Fan-in gather, edge declaration order within each port group
    let mut gathered: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
    for edge in workflow.incoming_edges(node_id) {
        let published = node_outputs
            .get(&edge.source)
            .and_then(|outputs| outputs.get(&edge.source_output));

        let value = match published {
            Some(value) => value,
            // Branch not taken upstream; this edge contributes nothing
            None => continue,
        };

        let bucket = gathered.entry(edge.target_input.as_str()).or_default();

        let source_repeated = workflow
            .node(&edge.source)
            .and_then(|source| source.output(&edge.source_output))
            .map(|port| port.repeated)
            .unwrap_or(false);

        match value {
            Value::Array(items) if source_repeated => bucket.extend(items.iter().cloned()),
            other => bucket.push(other.clone()),
        }
    }

    // Finalize: gathered values override the seed only for ports that
    // received at least one value
    for (port_name, mut values) in gathered {
        if values.is_empty() {
            continue;
        }

        let repeated = node
            .input(port_name)
            .map(|port| port.repeated)
            .unwrap_or(false);

        let value = if repeated {
            Value::Array(values)
        } else {
            match values.pop() {
                Some(last) => last,
                None => continue,
            }
        };
        inputs.insert(port_name.to_string(), value);
    }

    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, InputPort, Node, OutputPort, PortType, Trigger};

    fn source_node(id: &str, repeated_output: bool) -> Node {
        let mut output = OutputPort::new("value", PortType::Any);
        if repeated_output {
            output = output.repeated();
        }
        Node {
            id: id.to_string(),
            node_type: "num".to_string(),
            inputs: vec![],
            outputs: vec![output],
        }
    }

    fn sink_node(id: &str, ports: Vec<InputPort>) -> Node {
        Node {
            id: id.to_string(),
            node_type: "sink".to_string(),
            inputs: ports,
            outputs: vec![],
        }
    }

    fn edge(source: &str, target: &str, target_input: &str) -> Edge {
        Edge {
            source: source.to_string(),
            source_output: "value".to_string(),
            target: target.to_string(),
            target_input: target_input.to_string(),
        }
    }

    fn workflow(nodes: Vec<Node>, edges: Vec<Edge>) -> Workflow {
        Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes,
            edges,
        }
    }

    fn published(entries: &[(&str, Value)]) -> HashMap<String, BTreeMap<String, Value>> {
        entries
            .iter()
            .map(|(node_id, value)| {
                let mut outputs = BTreeMap::new();
                outputs.insert("value".to_string(), value.clone());
                (node_id.to_string(), outputs)
            })
            .collect()
    }

    #[test]
    fn test_static_seed_only() {
        let wf = workflow(
            vec![sink_node(
                "sink",
                vec![InputPort::new("a", PortType::Number).with_value(Value::Number(7.0))],
            )],
            vec![],
        );
        let inputs = collect_inputs(&wf, &HashMap::new(), "sink");
        assert_eq!(inputs.get("a"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn test_gathered_value_overrides_seed() {
        let wf = workflow(
            vec![
                source_node("up", false),
                sink_node(
                    "sink",
                    vec![InputPort::new("a", PortType::Number).with_value(Value::Number(7.0))],
                ),
            ],
            vec![edge("up", "sink", "a")],
        );
        let outputs = published(&[("up", Value::Number(42.0))]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        assert_eq!(inputs.get("a"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn test_unpublished_upstream_leaves_seed() {
        let wf = workflow(
            vec![
                source_node("up", false),
                sink_node(
                    "sink",
                    vec![InputPort::new("a", PortType::Number).with_value(Value::Number(7.0))],
                ),
            ],
            vec![edge("up", "sink", "a")],
        );
        // Upstream executed but published nothing on that output
        let outputs: HashMap<String, BTreeMap<String, Value>> =
            HashMap::from([("up".to_string(), BTreeMap::new())]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        assert_eq!(inputs.get("a"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn test_last_writer_wins_on_plain_port() {
        let wf = workflow(
            vec![
                source_node("n1", false),
                source_node("n2", false),
                source_node("n3", false),
                sink_node("sink", vec![InputPort::new("a", PortType::Number)]),
            ],
            vec![
                edge("n1", "sink", "a"),
                edge("n2", "sink", "a"),
                edge("n3", "sink", "a"),
            ],
        );
        let outputs = published(&[
            ("n1", Value::Number(1.0)),
            ("n2", Value::Number(2.0)),
            ("n3", Value::Number(3.0)),
        ]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        // Last edge in declaration order wins
        assert_eq!(inputs.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_repeated_port_preserves_declaration_order() {
        let wf = workflow(
            vec![
                source_node("n1", false),
                source_node("n2", false),
                sink_node("sink", vec![InputPort::new("items", PortType::Any).repeated()]),
            ],
            vec![edge("n2", "sink", "items"), edge("n1", "sink", "items")],
        );
        let outputs = published(&[("n1", Value::Number(1.0)), ("n2", Value::Number(2.0))]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        assert_eq!(
            inputs.get("items"),
            Some(&Value::Array(vec![Value::Number(2.0), Value::Number(1.0)]))
        );
    }

    #[test]
    fn test_repeated_output_splices_into_gathered_list() {
        let wf = workflow(
            vec![
                source_node("many", true),
                source_node("one", false),
                sink_node("sink", vec![InputPort::new("items", PortType::Any).repeated()]),
            ],
            vec![edge("many", "sink", "items"), edge("one", "sink", "items")],
        );
        let outputs = published(&[
            (
                "many",
                Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            ),
            ("one", Value::Number(3.0)),
        ]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        assert_eq!(
            inputs.get("items"),
            Some(&Value::Array(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0)
            ]))
        );
    }

    #[test]
    fn test_array_from_plain_output_is_not_spliced() {
        let wf = workflow(
            vec![
                source_node("arr", false),
                sink_node("sink", vec![InputPort::new("items", PortType::Any).repeated()]),
            ],
            vec![edge("arr", "sink", "items")],
        );
        let array = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let outputs = published(&[("arr", array.clone())]);

        let inputs = collect_inputs(&wf, &outputs, "sink");
        // A non-repeated output publishing an array stays one nested value
        assert_eq!(inputs.get("items"), Some(&Value::Array(vec![array])));
    }

    #[test]
    fn test_collect_is_pure() {
        let wf = workflow(
            vec![
                source_node("up", false),
                sink_node("sink", vec![InputPort::new("a", PortType::Number)]),
            ],
            vec![edge("up", "sink", "a")],
        );
        let outputs = published(&[("up", Value::Number(42.0))]);

        let first = collect_inputs(&wf, &outputs, "sink");
        let second = collect_inputs(&wf, &outputs, "sink");
        assert_eq!(first, second);
        // The outputs map is untouched
        assert_eq!(outputs["up"]["value"], Value::Number(42.0));
    }

    #[test]
    fn test_unknown_node_collects_nothing() {
        let wf = workflow(vec![], vec![]);
        assert!(collect_inputs(&wf, &HashMap::new(), "ghost").is_empty());
    }
}
