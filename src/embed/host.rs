//! Host document abstraction and its in-memory implementation

use crate::embed::config::{Length, Position, Theme};
use crate::embed::message::OutboundMessage;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Container,
    Header,
    CloseButton,
    Frame,
    ToggleButton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub role: NodeRole,
    pub parent: Option<NodeId>,
    pub text: Option<String>,
    pub src: Option<String>,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub theme: Option<Theme>,
    pub position: Option<Position>,
    pub visible: bool,
}

impl NodeSpec {
    pub fn new(role: NodeRole) -> Self {
        Self {
            role,
            parent: None,
            text: None,
            src: None,
            width: None,
            height: None,
            theme: None,
            position: None,
            visible: true,
        }
    }

    pub fn parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn size(mut self, width: Length, height: Length) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn styled(mut self, theme: Theme, position: Option<Position>) -> Self {
        self.theme = Some(theme);
        self.position = position;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenTarget {
    Click(NodeId),
    KeyDown,
    Message,
}

/// Events delivered by the host to an embed
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Click(NodeId),
    KeyDown(String),
    Message { origin: String, data: Value },
}

/// Everything an embed needs from the page it lives on
pub trait EmbedHost {
    /// Origin of the host page, passed to the iframe as `origin=`
    fn page_origin(&self) -> String;
    fn create_node(&mut self, spec: NodeSpec) -> NodeId;
    /// Removes the node and its descendants. Unknown ids are ignored.
    fn remove_node(&mut self, node: NodeId);
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn set_height(&mut self, node: NodeId, height: Length);
    fn listen(&mut self, target: ListenTarget) -> ListenerId;
    fn unlisten(&mut self, listener: ListenerId);
    fn post_message(&mut self, frame: NodeId, target_origin: &str, message: &OutboundMessage);
    fn show_notification(&mut self, text: &str, dismiss_after: Duration);
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualNode {
    pub spec: NodeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub frame: NodeId,
    pub target_origin: String,
    pub message: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub dismiss_after: Duration,
}

/// In-memory document. Records everything so it can be inspected or rendered.
#[derive(Debug)]
pub struct VirtualDocument {
    origin: String,
    next_id: u64,
    nodes: BTreeMap<NodeId, VirtualNode>,
    listeners: BTreeMap<ListenerId, ListenTarget>,
    posted: Vec<PostedMessage>,
    toasts: Vec<Toast>,
}

impl VirtualDocument {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            next_id: 0,
            nodes: BTreeMap::new(),
            listeners: BTreeMap::new(),
            posted: Vec::new(),
            toasts: Vec::new(),
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn node(&self, id: NodeId) -> Option<&VirtualNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.spec.role == role)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn posted_messages(&self) -> &[PostedMessage] {
        &self.posted
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Indented text tree of the current nodes, one per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, node) in &self.nodes {
            if node.spec.parent.is_none() {
                self.render_node(*id, 0, &mut out);
            }
        }
        out
    }

    fn render_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let spec = &node.spec;

        let mut line = format!("{}{:?}", "  ".repeat(depth), spec.role);
        if let Some(text) = &spec.text {
            line.push_str(&format!(" \"{}\"", text));
        }
        if let (Some(w), Some(h)) = (spec.width, spec.height) {
            line.push_str(&format!(" width={} height={}", w, h));
        } else if let Some(h) = spec.height {
            line.push_str(&format!(" height={}", h));
        }
        if let Some(theme) = spec.theme {
            line.push_str(&format!(" theme={}", theme));
        }
        if let Some(position) = spec.position {
            line.push_str(&format!(" position={}", position));
        }
        if !spec.visible {
            line.push_str(" (hidden)");
        }
        if let Some(src) = &spec.src {
            line.push_str(&format!(" src={}", src));
        }
        out.push_str(&line);
        out.push('\n');

        for (child, n) in &self.nodes {
            if n.spec.parent == Some(id) {
                self.render_node(*child, depth + 1, out);
            }
        }
    }
}

impl EmbedHost for VirtualDocument {
    fn page_origin(&self) -> String {
        self.origin.clone()
    }

    fn create_node(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next());
        self.nodes.insert(id, VirtualNode { spec });
        id
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_none() {
            return;
        }
        let children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.spec.parent == Some(node))
            .map(|(id, _)| *id)
            .collect();
        for child in children {
            self.remove_node(child);
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.visible = visible;
        }
    }

    fn set_height(&mut self, node: NodeId, height: Length) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.height = Some(height);
        }
    }

    fn listen(&mut self, target: ListenTarget) -> ListenerId {
        let id = ListenerId(self.next());
        self.listeners.insert(id, target);
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn post_message(&mut self, frame: NodeId, target_origin: &str, message: &OutboundMessage) {
        self.posted.push(PostedMessage {
            frame,
            target_origin: target_origin.to_string(),
            message: message.to_value(),
        });
    }

    fn show_notification(&mut self, text: &str, dismiss_after: Duration) {
        self.toasts.push(Toast {
            text: text.to_string(),
            dismiss_after,
        });
    }
}
