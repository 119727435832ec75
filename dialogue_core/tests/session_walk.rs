use std::cell::RefCell;
use std::rc::Rc;

use dialogue_core::{
    DialogueContext, DialogueGraph, DialogueSession, NodeId, SessionState, TraversalConfig,
    WidgetCommand,
};
use dialogue_data::{Blackboard, DialogueTable, TableRegistry};

const INN_TABLE: &str = r#"
[[row]]
name = "greeting"
participant = "Innkeeper"

[[row.data]]
text = "Welcome to the Prancing Pony."
duration = 2.0

[[row.data]]
text = "What'll it be?"
duration_mode = "from_text"
duration = 0.5

[[row]]
name = "ask_rumors"
title = "Heard anything interesting?"
participant = "Player"

[[row.data]]
text = "Heard anything interesting?"

[[row]]
name = "ask_room"
title = "I need a room."
participant = "Player"

[[row.data]]
text = "I need a room."

[[row]]
name = "room"
participant = "Innkeeper"

[[row.data]]
text = "Second door on the left."

[[row]]
name = "leave"
title = "Goodbye."
participant = "Player"

[[row.data]]
text = "Goodbye."
"#;

const GOSSIP_TABLE: &str = r#"
[[row]]
name = "rumors"
participant = "Innkeeper"

[[row.data]]
text = "Strange folk on the road lately."
duration_mode = "sound"
duration = 3.0
sound = { path = "vo/rumors.ogg", duration = 2.5 }
"#;

const INN_GRAPH: &str = r#"
[graph]
name = "innkeeper"
table = "inn"

[[node]]
name = "start"
kind = "start"
next = ["greeting"]

[[node]]
name = "greeting"
kind = "lead"
row = "greeting"
next = ["ask_rumors", "ask_room", "leave"]

[[node]]
name = "ask_rumors"
kind = "answer"
row = "ask_rumors"
conditions = [{ type = "not_visited" }]
next = ["rumors"]

[[node]]
name = "rumors"
kind = "lead"
table = "gossip"
row = "rumors"
next = ["back"]

[[node]]
name = "back"
kind = "return"
target = "greeting"

[[node]]
name = "ask_room"
kind = "answer"
row = "ask_room"
conditions = [{ type = "flag_set", key = "has_gold" }]
next = ["room"]

[[node]]
name = "room"
kind = "lead"
row = "room"
next = ["end"]

[[node]]
name = "leave"
kind = "answer"
row = "leave"
next = ["end"]

[[node]]
name = "end"
kind = "complete"
"#;

fn registry() -> TableRegistry {
    let mut registry = TableRegistry::new();
    registry.add_table(DialogueTable::from_toml_str("inn", INN_TABLE).unwrap());
    registry.add_table(DialogueTable::from_toml_str("gossip", GOSSIP_TABLE).unwrap());
    registry
}

fn id(name: &str) -> NodeId {
    NodeId::from_name("innkeeper", name)
}

fn option_names(session: &DialogueSession<'_, TableRegistry>) -> Vec<String> {
    session.options().iter().map(|n| n.name.clone()).collect()
}

/// Play every sub-entry of the active row.
fn play_row(session: &mut DialogueSession<'_, TableRegistry>) {
    let node = session.context().active_node();
    while session.state() == SessionState::PlayingRow && session.context().active_node() == node {
        session.row_data_finished().unwrap();
    }
}

#[test]
fn test_loaded_graph_validates() {
    let graph = DialogueGraph::from_toml_str(INN_GRAPH).unwrap();
    let messages = graph.validate(&registry());
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn test_full_walk() {
    let graph = DialogueGraph::from_toml_str(INN_GRAPH).unwrap();
    let registry = registry();
    let log: Rc<RefCell<Vec<(WidgetCommand, Option<NodeId>)>>> = Rc::default();

    let mut session = DialogueSession::new(&graph, &registry, Blackboard::new(), TraversalConfig::default());
    let sink = log.clone();
    session.add_widget(Box::new(move |context: &DialogueContext, command: WidgetCommand| {
        sink.borrow_mut().push((command, context.active_node()));
    }));

    session.start().unwrap();
    assert_eq!(session.context().active_node(), Some(id("greeting")));
    assert_eq!(session.current_row_duration(), Some(2.0));

    // "What'll it be?" is 14 chars at 15 chars/s, above the 0.5s floor
    session.row_data_finished().unwrap();
    let duration = session.current_row_duration().unwrap();
    assert!((duration - 14.0 / 15.0).abs() < 0.001);

    session.row_data_finished().unwrap();
    assert_eq!(session.state(), SessionState::AwaitingSelection);
    // No gold, so no room
    assert_eq!(option_names(&session), vec!["ask_rumors", "leave"]);

    session.select_node(id("ask_rumors")).unwrap();
    play_row(&mut session);
    assert_eq!(session.context().active_node(), Some(id("rumors")));
    assert_eq!(session.context().active_dialogue_row().participant, "Innkeeper");
    assert_eq!(session.current_row_duration(), Some(2.5));

    // Host grants gold while the innkeeper talks
    session.blackboard_mut().set_flag("has_gold", true);

    // Rumors -> back -> greeting, the rumors option is spent
    play_row(&mut session);
    assert_eq!(session.context().active_node(), Some(id("greeting")));
    play_row(&mut session);
    assert_eq!(option_names(&session), vec!["ask_room", "leave"]);

    session.select_option(0).unwrap();
    play_row(&mut session);
    assert_eq!(session.context().active_node(), Some(id("room")));
    play_row(&mut session);

    assert!(session.is_finished());
    assert!(!session.context().is_valid());
    assert_eq!(session.visits(id("greeting")), 2);
    assert_eq!(session.visits(id("ask_rumors")), 1);

    let log = log.borrow();
    assert_eq!(log.first(), Some(&(WidgetCommand::CreateDialogueWidget, None)));
    // Close is sent before the context is recycled
    assert_eq!(
        log.last(),
        Some(&(WidgetCommand::CloseDialogueWidget, Some(id("end"))))
    );
    let shows = log
        .iter()
        .filter(|(command, _)| *command == WidgetCommand::ShowDialogueRow)
        .count();
    // greeting, ask_rumors, rumors, greeting, ask_room, room
    assert_eq!(shows, 6);
}

#[test]
fn test_blackboard_survives_sessions() {
    let graph = DialogueGraph::from_toml_str(INN_GRAPH).unwrap();
    let registry = registry();

    let mut board = Blackboard::new();
    board.set_flag("has_gold", true);

    let mut session = DialogueSession::new(&graph, &registry, board, TraversalConfig::default());
    session.start().unwrap();
    play_row(&mut session);
    assert_eq!(option_names(&session), vec!["ask_rumors", "ask_room", "leave"]);
    session.select_node(id("leave")).unwrap();
    play_row(&mut session);
    assert!(session.is_finished());

    // Visit counts are per session, flags are not
    let board = session.into_blackboard();
    assert!(board.is_set("has_gold"));

    let mut session = DialogueSession::new(&graph, &registry, board, TraversalConfig::default());
    session.start().unwrap();
    play_row(&mut session);
    assert_eq!(option_names(&session), vec!["ask_rumors", "ask_room", "leave"]);
}
