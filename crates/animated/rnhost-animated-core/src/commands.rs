//! Inbound graph commands as sent by the declarative layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::driver::AnimationId;
use crate::events::EventMapping;
use rnhost_api_core::Tag;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphCommand {
    CreateNode {
        tag: Tag,
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        config: Map<String, JsonValue>,
    },
    DropNode {
        tag: Tag,
    },
    #[serde(rename_all = "camelCase")]
    ConnectNodes { parent_tag: Tag, child_tag: Tag },
    #[serde(rename_all = "camelCase")]
    DisconnectNodes { parent_tag: Tag, child_tag: Tag },
    #[serde(rename_all = "camelCase")]
    ConnectToView { node_tag: Tag, view_tag: Tag },
    #[serde(rename_all = "camelCase")]
    DisconnectFromView { node_tag: Tag, view_tag: Tag },
    SetValue {
        tag: Tag,
        value: f64,
    },
    SetOffset {
        tag: Tag,
        offset: f64,
    },
    FlattenOffset {
        tag: Tag,
    },
    ExtractOffset {
        tag: Tag,
    },
    #[serde(rename_all = "camelCase")]
    StartAnimation {
        animation_id: AnimationId,
        node_tag: Tag,
        config: JsonValue,
    },
    #[serde(rename_all = "camelCase")]
    StopAnimation { animation_id: AnimationId },
    StartListening {
        tag: Tag,
    },
    StopListening {
        tag: Tag,
    },
    #[serde(rename_all = "camelCase")]
    AddEventMapping {
        view_tag: Tag,
        event_name: String,
        mapping: EventMapping,
    },
    #[serde(rename_all = "camelCase")]
    RemoveEventMapping {
        view_tag: Tag,
        event_name: String,
        animated_value_tag: Tag,
    },
}

impl GraphCommand {
    /// Short name used in log lines.
    pub fn op(&self) -> &'static str {
        match self {
            GraphCommand::CreateNode { .. } => "create_node",
            GraphCommand::DropNode { .. } => "drop_node",
            GraphCommand::ConnectNodes { .. } => "connect_nodes",
            GraphCommand::DisconnectNodes { .. } => "disconnect_nodes",
            GraphCommand::ConnectToView { .. } => "connect_to_view",
            GraphCommand::DisconnectFromView { .. } => "disconnect_from_view",
            GraphCommand::SetValue { .. } => "set_value",
            GraphCommand::SetOffset { .. } => "set_offset",
            GraphCommand::FlattenOffset { .. } => "flatten_offset",
            GraphCommand::ExtractOffset { .. } => "extract_offset",
            GraphCommand::StartAnimation { .. } => "start_animation",
            GraphCommand::StopAnimation { .. } => "stop_animation",
            GraphCommand::StartListening { .. } => "start_listening",
            GraphCommand::StopListening { .. } => "stop_listening",
            GraphCommand::AddEventMapping { .. } => "add_event_mapping",
            GraphCommand::RemoveEventMapping { .. } => "remove_event_mapping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_commands() {
        let cmds: Vec<GraphCommand> = serde_json::from_value(json!([
            { "op": "create_node", "tag": 1, "type": "value", "config": { "value": 0.5 } },
            { "op": "connect_nodes", "parentTag": 1, "childTag": 2 },
            { "op": "connect_to_view", "nodeTag": 3, "viewTag": 100 },
            { "op": "start_animation", "animationId": 7, "nodeTag": 1,
              "config": { "type": "frames", "frames": [0.0, 1.0], "toValue": 1.0 } },
            { "op": "drop_node", "tag": 2 }
        ]))
        .unwrap();
        assert_eq!(cmds.len(), 5);
        assert_eq!(
            cmds[1],
            GraphCommand::ConnectNodes {
                parent_tag: Tag(1),
                child_tag: Tag(2)
            }
        );
        assert_eq!(cmds[3].op(), "start_animation");
        match &cmds[0] {
            GraphCommand::CreateNode { kind, config, .. } => {
                assert_eq!(kind, "value");
                assert_eq!(config["value"], json!(0.5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(serde_json::from_value::<GraphCommand>(json!({ "op": "explode", "tag": 1 })).is_err());
    }
}
