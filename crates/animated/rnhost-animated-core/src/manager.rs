//! NodesManager: owns the animated graph, its drivers and listeners, and
//! turns them into one [`Frame`] of view updates per tick.
//!
//! Methods:
//! - graph mutation: create/drop/connect/disconnect nodes, connect props to views
//! - value writes: set value/offset, flatten/extract offset, native events
//! - animation: start/stop drivers, listeners
//! - `run_updates`: tick drivers in start order, then evaluate the affected subgraph

use hashbrown::HashSet;
use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};
use serde_json::{Map, Value as JsonValue};

use crate::commands::GraphCommand;
use crate::config::ManagerConfig;
use crate::driver::{AnimationConfig, AnimationDriver, AnimationId, DriverState};
use crate::error::{AnimatedError, Result};
use crate::events::{EventMapping, EventMappings};
use crate::node::{AnimatedNode, Evaluation, Graph, NodeEntry, ValueNode};
use crate::outputs::{AnimatedEvent, Frame};
use crate::topo;
use rnhost_api_core::{Tag, ViewUpdate};

#[derive(Debug)]
pub struct NodesManager {
    config: ManagerConfig,
    graph: Graph,
    /// Running drivers in start order.
    drivers: IndexMap<AnimationId, AnimationDriver>,
    /// Nodes changed since the last evaluation.
    updated: IndexSet<Tag>,
    listeners: IndexSet<Tag>,
    event_mappings: EventMappings,
    /// Output produced by commands between cycles (view resets, cancelled drivers).
    pending: Frame,
}

impl Default for NodesManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl NodesManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            graph: Graph::with_capacity(config.node_capacity),
            config,
            drivers: IndexMap::new(),
            updated: IndexSet::new(),
            listeners: IndexSet::new(),
            event_mappings: EventMappings::default(),
            pending: Frame::default(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, tag: Tag) -> Result<&AnimatedNode> {
        Ok(&self.graph.get(tag)?.node)
    }

    /// Current resolved value of a scalar node.
    pub fn value(&self, tag: Tag) -> Result<f64> {
        let node = self.node(tag)?;
        node.scalar().ok_or(AnimatedError::UnsupportedNodeType {
            tag,
            expected: "a value node",
            actual: node.kind().as_str(),
        })
    }

    pub fn has_active_animations(&self) -> bool {
        !self.drivers.is_empty()
    }

    pub fn driver_state(&self, id: AnimationId) -> Option<DriverState> {
        self.drivers.get(&id).map(AnimationDriver::state)
    }

    // ----- graph mutation -----

    pub fn create_node(&mut self, tag: Tag, kind: &str, config: &Map<String, JsonValue>) -> Result<()> {
        if self.graph.contains(tag) {
            return Err(AnimatedError::DuplicateTag { tag });
        }
        let node = AnimatedNode::from_config(tag, kind, config)?;
        for (reference, requirement) in node.references() {
            let target = self.graph.get(reference)?;
            let actual = target.node.kind();
            if !requirement.accepts(actual) {
                return Err(AnimatedError::invalid_config(
                    tag,
                    format!(
                        "node {reference} is of type '{}', expected {}",
                        actual.as_str(),
                        requirement.describe()
                    ),
                ));
            }
        }
        self.graph.create(tag, NodeEntry::new(node))?;
        self.updated.insert(tag);
        debug!("create_node: {tag} ({kind})");
        Ok(())
    }

    /// Remove a node. Edges pointing at it are left to fail on the next evaluation.
    pub fn drop_node(&mut self, tag: Tag) -> Result<()> {
        self.graph.remove(tag)?;
        self.updated.shift_remove(&tag);
        self.listeners.shift_remove(&tag);
        self.cancel_drivers_for(tag);
        debug!("drop_node: {tag}");
        Ok(())
    }

    /// Add the edge `parent -> child`: `child` reads from `parent`.
    pub fn connect_nodes(&mut self, parent: Tag, child: Tag) -> Result<()> {
        self.graph.get(child)?;
        if self.graph.get(parent)?.children.contains(&child) {
            return Ok(());
        }
        if topo::would_create_cycle(&self.graph, parent, child) {
            return Err(AnimatedError::CycleDetected { parent, child });
        }
        self.graph.get_mut(child)?.node.on_attached(child, parent)?;
        self.graph.get_mut(parent)?.children.push(child);
        self.updated.insert(child);
        debug!("connect_nodes: {parent} -> {child}");
        Ok(())
    }

    pub fn disconnect_nodes(&mut self, parent: Tag, child: Tag) -> Result<()> {
        let entry = self.graph.get_mut(parent)?;
        let before = entry.children.len();
        entry.children.retain(|c| *c != child);
        if entry.children.len() == before {
            return Ok(());
        }
        if let Ok(child_entry) = self.graph.get_mut(child) {
            child_entry.node.on_detached(parent);
            self.updated.insert(child);
        }
        debug!("disconnect_nodes: {parent} -> {child}");
        Ok(())
    }

    pub fn connect_to_view(&mut self, tag: Tag, view_tag: Tag) -> Result<()> {
        let entry = self.graph.get_mut(tag)?;
        let actual = entry.node.kind();
        let props = entry
            .node
            .as_props_mut()
            .ok_or(AnimatedError::UnsupportedNodeType {
                tag,
                expected: "a props node",
                actual: actual.as_str(),
            })?;
        props.connect_to_view(tag, view_tag)?;
        self.updated.insert(tag);
        debug!("connect_to_view: {tag} -> view {view_tag}");
        Ok(())
    }

    /// Detach a props node from its view. The view receives `null` for every
    /// property the node last wrote, on the next [`NodesManager::run_updates`].
    pub fn disconnect_from_view(&mut self, tag: Tag, view_tag: Tag) -> Result<()> {
        let entry = self.graph.get_mut(tag)?;
        let actual = entry.node.kind();
        let props = entry
            .node
            .as_props_mut()
            .ok_or(AnimatedError::UnsupportedNodeType {
                tag,
                expected: "a props node",
                actual: actual.as_str(),
            })?;
        let reset = props.disconnect_from_view(tag, view_tag)?;
        if !reset.is_empty() {
            self.pending.push_update(ViewUpdate::new(view_tag, reset));
        }
        debug!("disconnect_from_view: {tag} -x- view {view_tag}");
        Ok(())
    }

    // ----- value writes -----

    fn value_node_mut(&mut self, tag: Tag) -> Result<&mut ValueNode> {
        let entry = self.graph.get_mut(tag)?;
        let actual = entry.node.kind();
        entry
            .node
            .as_value_mut()
            .ok_or(AnimatedError::UnsupportedNodeType {
                tag,
                expected: "a value node",
                actual: actual.as_str(),
            })
    }

    /// Write a raw value. Animations running on the node are cancelled first.
    pub fn set_value(&mut self, tag: Tag, value: f64) -> Result<()> {
        self.value_node_mut(tag)?;
        self.cancel_drivers_for(tag);
        self.value_node_mut(tag)?.value = value;
        self.updated.insert(tag);
        Ok(())
    }

    pub fn set_offset(&mut self, tag: Tag, offset: f64) -> Result<()> {
        self.value_node_mut(tag)?.offset = offset;
        self.updated.insert(tag);
        Ok(())
    }

    pub fn flatten_offset(&mut self, tag: Tag) -> Result<()> {
        self.value_node_mut(tag)?.flatten_offset();
        Ok(())
    }

    pub fn extract_offset(&mut self, tag: Tag) -> Result<()> {
        self.value_node_mut(tag)?.extract_offset();
        Ok(())
    }

    pub fn start_listening(&mut self, tag: Tag) -> Result<()> {
        let node = &self.graph.get(tag)?.node;
        if !node.kind().is_scalar() {
            return Err(AnimatedError::UnsupportedNodeType {
                tag,
                expected: "a value node",
                actual: node.kind().as_str(),
            });
        }
        self.listeners.insert(tag);
        self.updated.insert(tag);
        Ok(())
    }

    pub fn stop_listening(&mut self, tag: Tag) -> Result<()> {
        self.listeners.shift_remove(&tag);
        Ok(())
    }

    pub fn is_listening(&self, tag: Tag) -> bool {
        self.listeners.contains(&tag)
    }

    // ----- animations -----

    /// Start driving `tag` with the animation described by `config`.
    /// An animation already running under `id` is cancelled and replaced.
    pub fn start_animation(&mut self, id: AnimationId, tag: Tag, config: &JsonValue) -> Result<()> {
        self.value_node_mut(tag)?;
        let config: AnimationConfig =
            serde_json::from_value(config.clone()).map_err(|e| AnimatedError::InvalidAnimation {
                tag,
                reason: e.to_string(),
            })?;
        let driver = AnimationDriver::new(id, tag, config, &self.config)?;
        if self.drivers.contains_key(&id) {
            self.cancel_driver(id);
        }
        self.drivers.insert(id, driver);
        debug!("start_animation: {id} on node {tag}");
        Ok(())
    }

    pub fn stop_animation(&mut self, id: AnimationId) -> Result<()> {
        if !self.drivers.contains_key(&id) {
            return Err(AnimatedError::UnknownAnimation { id });
        }
        self.cancel_driver(id);
        Ok(())
    }

    fn cancel_drivers_for(&mut self, tag: Tag) {
        let ids: Vec<AnimationId> = self
            .drivers
            .values()
            .filter(|d| d.node == tag)
            .map(|d| d.id)
            .collect();
        for id in ids {
            self.cancel_driver(id);
        }
    }

    fn cancel_driver(&mut self, id: AnimationId) {
        if let Some(mut driver) = self.drivers.shift_remove(&id) {
            driver.cancel();
            debug!("animation {id} cancelled on node {}", driver.node);
            self.pending.push_event(AnimatedEvent::AnimationFinished {
                animation_id: id,
                finished: false,
            });
        }
    }

    // ----- native events -----

    pub fn add_event_mapping(&mut self, view_tag: Tag, event_name: &str, mapping: EventMapping) -> Result<()> {
        self.value_node_mut(mapping.animated_value_tag)?;
        debug!(
            "add_event_mapping: view {view_tag} '{event_name}' -> node {}",
            mapping.animated_value_tag
        );
        self.event_mappings.add(view_tag, event_name, mapping);
        Ok(())
    }

    pub fn remove_event_mapping(&mut self, view_tag: Tag, event_name: &str, value_tag: Tag) -> Result<()> {
        if self.event_mappings.remove(view_tag, event_name, value_tag) {
            debug!("remove_event_mapping: view {view_tag} '{event_name}' -x- node {value_tag}");
        }
        Ok(())
    }

    /// Feed a native event through its mappings and evaluate right away.
    pub fn handle_event(&mut self, view_tag: Tag, event_name: &str, payload: &JsonValue) -> Frame {
        let mut frame = Frame::default();
        let writes: Vec<(Tag, f64)> = self
            .event_mappings
            .get(view_tag, event_name)
            .iter()
            .filter_map(|m| m.extract(payload).map(|v| (m.animated_value_tag, v)))
            .collect();
        if writes.is_empty() {
            return frame;
        }
        for (tag, value) in writes {
            match self.value_node_mut(tag) {
                Ok(node) => {
                    node.value = value;
                    self.updated.insert(tag);
                }
                Err(error) => {
                    warn!("event '{event_name}' on view {view_tag}: {error}");
                    frame.push_failure(tag, error);
                }
            }
        }
        self.update_nodes(&mut frame);
        frame
    }

    // ----- commands -----

    pub fn apply(&mut self, command: &GraphCommand) -> Result<()> {
        match command {
            GraphCommand::CreateNode { tag, kind, config } => self.create_node(*tag, kind, config),
            GraphCommand::DropNode { tag } => self.drop_node(*tag),
            GraphCommand::ConnectNodes {
                parent_tag,
                child_tag,
            } => self.connect_nodes(*parent_tag, *child_tag),
            GraphCommand::DisconnectNodes {
                parent_tag,
                child_tag,
            } => self.disconnect_nodes(*parent_tag, *child_tag),
            GraphCommand::ConnectToView { node_tag, view_tag } => {
                self.connect_to_view(*node_tag, *view_tag)
            }
            GraphCommand::DisconnectFromView { node_tag, view_tag } => {
                self.disconnect_from_view(*node_tag, *view_tag)
            }
            GraphCommand::SetValue { tag, value } => self.set_value(*tag, *value),
            GraphCommand::SetOffset { tag, offset } => self.set_offset(*tag, *offset),
            GraphCommand::FlattenOffset { tag } => self.flatten_offset(*tag),
            GraphCommand::ExtractOffset { tag } => self.extract_offset(*tag),
            GraphCommand::StartAnimation {
                animation_id,
                node_tag,
                config,
            } => self.start_animation(*animation_id, *node_tag, config),
            GraphCommand::StopAnimation { animation_id } => self.stop_animation(*animation_id),
            GraphCommand::StartListening { tag } => self.start_listening(*tag),
            GraphCommand::StopListening { tag } => self.stop_listening(*tag),
            GraphCommand::AddEventMapping {
                view_tag,
                event_name,
                mapping,
            } => self.add_event_mapping(*view_tag, event_name, mapping.clone()),
            GraphCommand::RemoveEventMapping {
                view_tag,
                event_name,
                animated_value_tag,
            } => self.remove_event_mapping(*view_tag, event_name, *animated_value_tag),
        }
    }

    /// Apply commands in order. A failed command is logged and skipped; the
    /// rest still run. Returns one result per command.
    pub fn apply_batch<'a>(&mut self, commands: impl IntoIterator<Item = &'a GraphCommand>) -> Vec<Result<()>> {
        commands
            .into_iter()
            .enumerate()
            .map(|(i, command)| {
                let result = self.apply(command);
                if let Err(error) = &result {
                    warn!("command #{i} ({}) rejected: {error}", command.op());
                }
                result
            })
            .collect()
    }

    // ----- frame -----

    /// Tick every driver at `frame_time_ms`, then evaluate everything that changed.
    pub fn run_updates(&mut self, frame_time_ms: f64) -> Frame {
        let mut frame = std::mem::take(&mut self.pending);

        let mut done: Vec<(AnimationId, bool)> = Vec::new();
        for (id, driver) in self.drivers.iter_mut() {
            let value_node = match self.graph.get_mut(driver.node) {
                Ok(entry) => entry.node.as_value_mut(),
                Err(_) => None,
            };
            let Some(value_node) = value_node else {
                driver.cancel();
                done.push((*id, false));
                continue;
            };
            if let Some(value) = driver.step(frame_time_ms, value_node.value) {
                value_node.value = value;
                self.updated.insert(driver.node);
            }
            match driver.state() {
                DriverState::Completed => done.push((*id, true)),
                DriverState::Cancelled => done.push((*id, false)),
                DriverState::Idle | DriverState::Running => {}
            }
        }
        for (id, finished) in done {
            self.drivers.shift_remove(&id);
            debug!("animation {id} finished (completed: {finished})");
            frame.push_event(AnimatedEvent::AnimationFinished {
                animation_id: id,
                finished,
            });
        }

        self.update_nodes(&mut frame);
        trace!(
            "run_updates @{frame_time_ms}: {} node(s), {} view update(s), {} event(s), {} failure(s), {} driver(s) running",
            self.graph.len(),
            frame.updates.len(),
            frame.events.len(),
            frame.failures.len(),
            self.drivers.len()
        );
        frame
    }

    /// Evaluate the attached part of the subgraph reachable from the updated nodes.
    fn update_nodes(&mut self, frame: &mut Frame) {
        if self.graph.is_empty() {
            self.updated.clear();
        }
        if self.updated.is_empty() {
            return;
        }
        let changed: Vec<Tag> = self.updated.drain(..).collect();
        let listeners = &self.listeners;
        let plan = topo::plan_updates(&self.graph, changed, |tag, node| {
            listeners.contains(&tag)
                || matches!(node, AnimatedNode::Props(p) if p.view_tag.is_some())
        });

        for error in plan.errors {
            match error {
                AnimatedError::DanglingReference { from, .. } => {
                    warn!("evaluation: {error}");
                    frame.push_failure(from, error);
                }
                other => warn!("evaluation: {other}"),
            }
        }

        let mut failed: HashSet<Tag> = HashSet::new();
        for tag in plan.order {
            let upstream_failed = plan
                .parents
                .get(&tag)
                .map_or(false, |ps| ps.iter().any(|p| failed.contains(p)));
            if upstream_failed {
                failed.insert(tag);
                continue;
            }
            let Ok(entry) = self.graph.get(tag) else {
                continue;
            };
            let evaluation = match entry.node.evaluate(tag, &self.graph) {
                Ok(evaluation) => evaluation,
                Err(error) => {
                    warn!("evaluation of node {tag} failed: {error}");
                    failed.insert(tag);
                    frame.push_failure(tag, error);
                    continue;
                }
            };
            let Ok(entry) = self.graph.get_mut(tag) else {
                continue;
            };
            entry.node.apply(&evaluation);
            if self.listeners.contains(&tag) {
                if let Some(value) = entry.node.scalar() {
                    frame.push_event(AnimatedEvent::ValueChanged { tag, value });
                }
            }
            if let Evaluation::View { view_tag, props } = evaluation {
                if !props.is_empty() {
                    frame.push_update(ViewUpdate::new(view_tag, props));
                }
            }
        }
    }
}
