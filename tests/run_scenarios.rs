use loomboard::board::{Board, Edge, NodeDescriptor};
use loomboard::errors::BoardError;
use loomboard::runtimes::{
    run_board, AbortSignal, BoardLoader, InMemoryRunStateStore, RunBoardArguments, RunStateStore,
    RunStatus, StaticBoardLoader,
};
use loomboard::protocol::{RunMessage, VecWriter};
use loomboard::types::{DiagnosticsLevel, InputValues};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::*;

#[tokio::test]
async fn linear_board_pauses_then_completes() {
    let run = scripted_run(
        hello_board(),
        test_registry(),
        InputValues::new(),
        vec![values(&[("text", json!("hi"))])],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["input", "output", "end"]);
    assert_eq!(run.result.unwrap(), RunStatus::Done);
    assert_eq!(outputs_of(&run.messages), vec![values(&[("text", json!("HI"))])]);
}

#[tokio::test]
async fn satisfying_inputs_skip_the_pause() {
    let run = scripted_run(
        hello_board(),
        test_registry(),
        values(&[("text", json!("hey"))]),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["output", "end"]);
    assert_eq!(
        outputs_of(&run.messages),
        vec![values(&[("text", json!("HEY"))])]
    );
}

#[tokio::test]
async fn invoke_emits_output_from_the_root_frame_only() {
    let run = scripted_run(
        invoke_board(),
        test_registry(),
        InputValues::new(),
        vec![values(&[("text", json!("hi"))])],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["input", "output", "end"]);
    assert_eq!(
        outputs_of(&run.messages),
        vec![values(&[("text", json!("HI"))])]
    );
}

#[tokio::test]
async fn nested_output_nodes_do_not_reach_the_client() {
    // Same board, entry values already satisfying the root input node: the
    // subgraph's own output node stays internal, so the stream carries a
    // single output.
    let run = scripted_run(
        invoke_board(),
        test_registry(),
        values(&[("text", json!("hi"))]),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["output", "end"]);
    assert_eq!(
        outputs_of(&run.messages),
        vec![values(&[("text", json!("HI"))])]
    );
}

#[tokio::test]
async fn nested_input_pauses_one_level_deep_and_resumes() {
    let run = scripted_run(
        nested_pause_board(),
        test_registry(),
        InputValues::new(),
        vec![
            values(&[("text", json!("hi"))]),
            values(&[("extra", json!("bonus"))]),
        ],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["input", "input", "output", "end"]);
    // The subgraph's output feeds the invoke node; the client only sees the
    // root's output, carrying the renamed `extra`.
    assert_eq!(
        outputs_of(&run.messages),
        vec![values(&[("text", json!("bonus"))])]
    );
    assert_eq!(run.result.unwrap(), RunStatus::Done);
}

#[tokio::test]
async fn two_input_nodes_pause_twice_then_merge() {
    let board = Board::new()
        .add_node(NodeDescriptor::new("first", "input").with_config(
            "schema",
            json!({"properties": {"a": {"type": "string"}}}),
        ))
        .add_node(NodeDescriptor::new("second", "input").with_config(
            "schema",
            json!({"properties": {"b": {"type": "string"}}}),
        ))
        .add_node(NodeDescriptor::new("merge", "output"))
        .add_edge(Edge::wire("first", "a", "merge", "a"))
        .add_edge(Edge::wire("second", "b", "merge", "b"));

    let run = scripted_run(
        board,
        test_registry(),
        InputValues::new(),
        vec![values(&[("a", json!("one"))]), values(&[("b", json!("two"))])],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["input", "input", "output", "end"]);
    assert_eq!(
        outputs_of(&run.messages),
        vec![values(&[("a", json!("one")), ("b", json!("two"))])]
    );
}

#[tokio::test]
async fn fan_out_emits_every_output_in_edge_order() {
    let run = scripted_run(
        many_outputs_board(),
        test_registry(),
        values(&[("text", json!("x"))]),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["output", "output", "end"]);
    assert_eq!(outputs_of(&run.messages).len(), 2);
}

#[tokio::test]
async fn handler_failure_halts_with_error_message() {
    let run = scripted_run(
        failing_board("explode"),
        test_registry(),
        InputValues::new(),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["error"]);
    assert_eq!(final_error_code(&run.messages), None);
    // The payload names the offending node by full descriptor, with the
    // inputs it was invoked with.
    match run.messages.last() {
        Some(RunMessage::Error { error, .. }) => {
            assert_eq!(error["descriptor"]["id"], json!("boom"));
            assert_eq!(error["descriptor"]["type"], json!("explode"));
            assert!(error["inputs"].is_object());
        }
        other => panic!("expected trailing error message, got {other:?}"),
    }
    assert!(matches!(run.result, Err(BoardError::Handler { .. })));
}

#[tokio::test]
async fn failure_two_levels_deep_halts_the_whole_run() {
    let leaf = Board::new()
        .add_node(NodeDescriptor::new("boom", "explode"))
        .add_node(NodeDescriptor::new("out", "output"))
        .add_edge(Edge::wire_all("boom", "out"));
    let middle = Board::new()
        .add_node(NodeDescriptor::new("down", "invoke").with_config("graph", json!("#leaf")))
        .add_node(NodeDescriptor::new("out", "output"))
        .add_edge(Edge::wire_all("down", "out"));
    let board = Board::new()
        .add_node(NodeDescriptor::new("enter", "invoke").with_config("graph", json!("#middle")))
        .add_node(NodeDescriptor::new("show", "output"))
        .add_edge(Edge::wire_all("enter", "show"))
        .add_subgraph("middle", middle)
        .add_subgraph("leaf", leaf);

    let run = scripted_run(
        board,
        test_registry(),
        InputValues::new(),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["error"]);
    assert!(matches!(run.result, Err(BoardError::Handler { .. })));
}

#[tokio::test]
async fn error_output_field_halts_the_run() {
    let run = scripted_run(
        failing_board("soft-explode"),
        test_registry(),
        InputValues::new(),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["error"]);
    match run.result {
        Err(BoardError::Handler { source, .. }) => {
            assert_eq!(source.to_string(), "soft failure");
        }
        other => panic!("expected handler error, got {other:?}"),
    }
}

#[tokio::test]
async fn unregistered_node_type_is_reported() {
    let run = scripted_run(
        failing_board("nonesuch"),
        test_registry(),
        InputValues::new(),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(run.tags(), vec!["error"]);
    assert_eq!(
        final_error_code(&run.messages),
        Some("unknown_node_type".into())
    );
}

#[tokio::test]
async fn invalid_board_never_starts() {
    let board = Board::new()
        .add_node(NodeDescriptor::new("a", "output"))
        .add_edge(Edge::wire_all("a", "ghost"));
    let run = scripted_run(
        board,
        test_registry(),
        InputValues::new(),
        vec![],
        DiagnosticsLevel::Full,
    )
    .await;
    // Even with full diagnostics the stream is the lone error: validation
    // fails before the opening graphstart.
    assert_eq!(run.tags(), vec!["error"]);
    assert_eq!(final_error_code(&run.messages), Some("config".into()));
    assert!(matches!(run.result, Err(BoardError::Configuration(_))));
}

#[tokio::test]
async fn repeated_runs_emit_identical_streams() {
    let mut streams = Vec::new();
    for _ in 0..2 {
        let run = scripted_run(
            invoke_board(),
            test_registry(),
            InputValues::new(),
            vec![values(&[("text", json!("hi"))])],
            DiagnosticsLevel::Full,
        )
        .await;
        streams.push(normalized_stream(&run.messages));
    }
    assert_eq!(streams[0], streams[1]);
}

#[tokio::test]
async fn pausing_is_invisible_in_the_output_stream() {
    let paused = scripted_run(
        hello_board(),
        test_registry(),
        InputValues::new(),
        vec![values(&[("text", json!("foo"))])],
        DiagnosticsLevel::Off,
    )
    .await;
    let direct = scripted_run(
        hello_board(),
        test_registry(),
        values(&[("text", json!("foo"))]),
        vec![],
        DiagnosticsLevel::Off,
    )
    .await;
    assert_eq!(outputs_of(&paused.messages), outputs_of(&direct.messages));
    assert_eq!(paused.tags().last(), Some(&"end"));
    assert_eq!(direct.tags().last(), Some(&"end"));
}

#[tokio::test]
async fn aborted_run_cancels_without_checkpoint() {
    let abort = AbortSignal::new();
    abort.abort();
    let mut writer = VecWriter::new();
    let loader: Arc<dyn BoardLoader> = Arc::new(StaticBoardLoader::new(hello_board()));
    let store: Arc<dyn RunStateStore> = InMemoryRunStateStore::shared();
    let result = run_board(RunBoardArguments {
        user: "tester".into(),
        loader,
        registry: test_registry(),
        inputs: InputValues::new(),
        next: None,
        writer: &mut writer,
        state_store: store,
        diagnostics: Some(DiagnosticsLevel::Off),
        abort: Some(abort),
    })
    .await;
    assert!(matches!(result, Err(BoardError::Cancelled)));
    assert_eq!(tags(writer.messages()), vec!["error"]);
    assert_eq!(final_error_code(writer.messages()), Some("cancelled".into()));
}
