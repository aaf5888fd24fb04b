use loomboard::board::{Board, Edge, NodeDescriptor};
use serde_json::json;

#[allow(dead_code)]
pub fn text_schema() -> serde_json::Value {
    json!({"properties": {"text": {"type": "string"}}})
}

/// `ask` (input) -> `greet` (upcase) -> `show` (output).
#[allow(dead_code)]
pub fn hello_board() -> Board {
    Board::new()
        .add_node(NodeDescriptor::new("ask", "input").with_config("schema", text_schema()))
        .add_node(NodeDescriptor::new("greet", "upcase"))
        .add_node(NodeDescriptor::new("show", "output"))
        .add_edge(Edge::wire("ask", "text", "greet", "text"))
        .add_edge(Edge::wire("greet", "text", "show", "text"))
}

/// Root `ask` -> `call` (invoke `#shout`) -> `show`; the subgraph's own
/// input node is satisfied by the values the invoke passes down, so the
/// nested frame runs without pausing.
#[allow(dead_code)]
pub fn invoke_board() -> Board {
    let shout = Board::new()
        .add_node(NodeDescriptor::new("s-in", "input").with_config("schema", text_schema()))
        .add_node(NodeDescriptor::new("s-up", "upcase"))
        .add_node(NodeDescriptor::new("s-out", "output"))
        .add_edge(Edge::wire("s-in", "text", "s-up", "text"))
        .add_edge(Edge::wire("s-up", "text", "s-out", "text"));
    Board::new()
        .add_node(NodeDescriptor::new("ask", "input").with_config("schema", text_schema()))
        .add_node(NodeDescriptor::new("call", "invoke").with_config("graph", json!("#shout")))
        .add_node(NodeDescriptor::new("show", "output"))
        .add_edge(Edge::wire("ask", "text", "call", "text"))
        .add_edge(Edge::wire("call", "text", "show", "text"))
        .add_subgraph("shout", shout)
}

/// Like [`invoke_board`], but the subgraph's input node asks for an `extra`
/// field the invoke never delivers, so the run pauses one level deep.
#[allow(dead_code)]
pub fn nested_pause_board() -> Board {
    let sub = Board::new()
        .add_node(NodeDescriptor::new("s-in", "input").with_config(
            "schema",
            json!({"properties": {
                "text": {"type": "string"},
                "extra": {"type": "string"}
            }}),
        ))
        .add_node(NodeDescriptor::new("s-out", "output"))
        .add_edge(Edge::wire_all("s-in", "s-out"));
    Board::new()
        .add_node(NodeDescriptor::new("ask", "input").with_config("schema", text_schema()))
        .add_node(NodeDescriptor::new("call", "invoke").with_config("graph", json!("#sub")))
        .add_node(NodeDescriptor::new("show", "output"))
        .add_edge(Edge::wire("ask", "text", "call", "text"))
        .add_edge(Edge::wire("call", "extra", "show", "text"))
        .add_subgraph("sub", sub)
}

/// One source fanning out to two output nodes.
#[allow(dead_code)]
pub fn many_outputs_board() -> Board {
    Board::new()
        .add_node(NodeDescriptor::new("ask", "input").with_config("schema", text_schema()))
        .add_node(NodeDescriptor::new("first", "output"))
        .add_node(NodeDescriptor::new("second", "output"))
        .add_edge(Edge::wire("ask", "text", "first", "text"))
        .add_edge(Edge::wire("ask", "text", "second", "text"))
}

/// A board whose only handler node fails.
#[allow(dead_code)]
pub fn failing_board(node_type: &str) -> Board {
    Board::new()
        .add_node(NodeDescriptor::new("boom", node_type))
        .add_node(NodeDescriptor::new("show", "output"))
        .add_edge(Edge::wire_all("boom", "show"))
}
