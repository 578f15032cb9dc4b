//! Floating chat widget, inline embeds and the page-global widget slot.
//!
//! Every embed renders a single iframe pointed at the vendor's embed endpoint
//! and talks to it over origin-restricted messages. Inbound messages are only
//! accepted from the API origin, and outbound messages are only ever targeted
//! at it.

use crate::api::connection::RequestGate;
use crate::embed::config::{
    EmbedKind, Length, WidgetConfig, build_embed_url, parse_api_url,
};
use crate::embed::host::{EmbedHost, HostEvent, ListenTarget, ListenerId, NodeId, NodeRole, NodeSpec};
use crate::embed::message::{InboundMessage, OriginAllowList, OutboundMessage};
use crate::error::EmbedError;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// How long a notification toast stays on screen
pub const NOTIFICATION_DISMISS: Duration = Duration::from_secs(3);

const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy)]
struct WidgetNodes {
    container: NodeId,
    close_button: NodeId,
    frame: NodeId,
    toggle: NodeId,
}

/// Floating launcher button plus a pane holding the chat iframe
#[derive(Debug)]
pub struct EmbedWidget {
    config: WidgetConfig,
    iframe_url: Url,
    allow_list: OriginAllowList,
    state: WidgetState,
    nodes: Option<WidgetNodes>,
    listeners: Vec<ListenerId>,
    gate: RequestGate,
}

impl EmbedWidget {
    /// Build the widget on `host`. Starts closed.
    ///
    /// Nothing is created on the host when the configuration is rejected.
    pub fn mount<H: EmbedHost + ?Sized>(
        config: WidgetConfig,
        api_url: &str,
        host: &mut H,
    ) -> Result<Self, EmbedError> {
        let kind = EmbedKind::ChatWidget;
        config
            .validate(kind)
            .inspect_err(|e| log::error!("ModStack widget not created: {}", e))?;
        let api = parse_api_url(api_url)
            .inspect_err(|e| log::error!("ModStack widget not created: {}", e))?;

        let iframe_url = build_embed_url(
            &api,
            kind,
            &config.resource_id,
            config.theme,
            &host.page_origin(),
        );

        let container = host.create_node(
            NodeSpec::new(NodeRole::Container)
                .size(config.dimensions.width, config.dimensions.height)
                .styled(config.theme, Some(config.position))
                .hidden(),
        );
        let header = host.create_node(
            NodeSpec::new(NodeRole::Header)
                .parent(Some(container))
                .text(config.title.as_str()),
        );
        let close_button = host.create_node(
            NodeSpec::new(NodeRole::CloseButton)
                .parent(Some(header))
                .text("×"),
        );
        let frame = host.create_node(
            NodeSpec::new(NodeRole::Frame)
                .parent(Some(container))
                .src(iframe_url.as_str())
                .size(Length::Percent(100), Length::Percent(100)),
        );
        let toggle = host.create_node(
            NodeSpec::new(NodeRole::ToggleButton)
                .styled(config.theme, Some(config.position))
                .text("Chat"),
        );

        let listeners = vec![
            host.listen(ListenTarget::Click(toggle)),
            host.listen(ListenTarget::Click(close_button)),
            host.listen(ListenTarget::KeyDown),
            host.listen(ListenTarget::Message),
        ];

        log::debug!("mounted chat widget for modbot {}", config.resource_id);

        Ok(Self {
            allow_list: OriginAllowList::from_api_url(&api),
            config,
            iframe_url,
            state: WidgetState::Closed,
            nodes: Some(WidgetNodes {
                container,
                close_button,
                frame,
                toggle,
            }),
            listeners,
            gate: RequestGate::new(),
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn iframe_url(&self) -> &Url {
        &self.iframe_url
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == WidgetState::Open
    }

    pub fn is_destroyed(&self) -> bool {
        self.nodes.is_none()
    }

    pub fn frame(&self) -> Result<NodeId, EmbedError> {
        self.nodes.map(|n| n.frame).ok_or(EmbedError::Destroyed)
    }

    /// Gate for requests issued on behalf of this widget; closed on destroy
    pub fn request_gate(&self) -> RequestGate {
        self.gate.clone()
    }

    pub fn open<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        self.transition(WidgetState::Open, host);
    }

    pub fn close<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        self.transition(WidgetState::Closed, host);
    }

    pub fn toggle<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        match self.state {
            WidgetState::Closed => self.open(host),
            WidgetState::Open => self.close(host),
        }
    }

    fn transition<H: EmbedHost + ?Sized>(&mut self, next: WidgetState, host: &mut H) {
        let Some(nodes) = self.nodes else {
            return;
        };
        if self.state == next {
            return;
        }

        host.set_visible(nodes.container, next == WidgetState::Open);
        self.state = next;

        let message = match next {
            WidgetState::Open => OutboundMessage::WidgetOpened,
            WidgetState::Closed => OutboundMessage::WidgetClosed,
        };
        host.post_message(nodes.frame, self.allow_list.primary(), &message);
    }

    /// Route a host event to the widget. Returns whether it was handled.
    pub fn handle_event<H: EmbedHost + ?Sized>(&mut self, event: &HostEvent, host: &mut H) -> bool {
        let Some(nodes) = self.nodes else {
            return false;
        };

        match event {
            HostEvent::Click(node) if *node == nodes.toggle => {
                self.toggle(host);
                true
            }
            HostEvent::Click(node) if *node == nodes.close_button => {
                self.close(host);
                true
            }
            HostEvent::KeyDown(key) if key == ESCAPE_KEY && self.is_open() => {
                self.close(host);
                true
            }
            HostEvent::Message { origin, data } => self.on_message(origin, data, host),
            _ => false,
        }
    }

    pub fn on_message<H: EmbedHost + ?Sized>(&mut self, origin: &str, data: &Value, host: &mut H) -> bool {
        let Some(nodes) = self.nodes else {
            return false;
        };
        if !self.allow_list.allows(origin) {
            log::warn!("ignored embed message from untrusted origin '{}'", origin);
            return false;
        }
        let Some(message) = InboundMessage::parse(data) else {
            log::debug!("ignored unrecognized embed message: {}", data);
            return false;
        };

        match message {
            InboundMessage::Resize { height } => host.set_height(nodes.container, Length::Px(height)),
            InboundMessage::Close => self.close(host),
            InboundMessage::Notification { message } => {
                host.show_notification(&message, NOTIFICATION_DISMISS)
            }
        }
        true
    }

    /// Remove every node and listener this widget created. Safe to call twice.
    pub fn destroy<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        self.gate.close();
        for listener in self.listeners.drain(..) {
            host.unlisten(listener);
        }
        if let Some(nodes) = self.nodes.take() {
            host.remove_node(nodes.container);
            host.remove_node(nodes.toggle);
            log::debug!("destroyed chat widget for modbot {}", self.config.resource_id);
        }
        self.state = WidgetState::Closed;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    Chatbot,
    TicketForm,
}

impl InlineKind {
    pub fn embed_kind(&self) -> EmbedKind {
        match self {
            InlineKind::Chatbot => EmbedKind::InlineChatbot,
            InlineKind::TicketForm => EmbedKind::InlineTicketForm,
        }
    }
}

/// An iframe rendered in place (shortcode output). No toggle, no open state.
#[derive(Debug)]
pub struct InlineEmbed {
    kind: InlineKind,
    iframe_url: Url,
    allow_list: OriginAllowList,
    frame: Option<NodeId>,
    listener: Option<ListenerId>,
}

impl InlineEmbed {
    pub fn mount<H: EmbedHost + ?Sized>(
        kind: InlineKind,
        config: WidgetConfig,
        api_url: &str,
        host: &mut H,
        parent: Option<NodeId>,
    ) -> Result<Self, EmbedError> {
        let embed_kind = kind.embed_kind();
        config
            .validate(embed_kind)
            .inspect_err(|e| log::error!("ModStack embed not created: {}", e))?;
        let api = parse_api_url(api_url)
            .inspect_err(|e| log::error!("ModStack embed not created: {}", e))?;

        let iframe_url = build_embed_url(
            &api,
            embed_kind,
            &config.resource_id,
            config.theme,
            &host.page_origin(),
        );
        let frame = host.create_node(
            NodeSpec::new(NodeRole::Frame)
                .parent(parent)
                .src(iframe_url.as_str())
                .size(config.dimensions.width, config.dimensions.height)
                .styled(config.theme, None),
        );
        let listener = host.listen(ListenTarget::Message);

        Ok(Self {
            kind,
            iframe_url,
            allow_list: OriginAllowList::from_api_url(&api),
            frame: Some(frame),
            listener: Some(listener),
        })
    }

    pub fn kind(&self) -> InlineKind {
        self.kind
    }

    pub fn iframe_url(&self) -> &Url {
        &self.iframe_url
    }

    pub fn frame(&self) -> Result<NodeId, EmbedError> {
        self.frame.ok_or(EmbedError::Destroyed)
    }

    /// Resize and notification only; `close` means nothing without open state
    pub fn on_message<H: EmbedHost + ?Sized>(&mut self, origin: &str, data: &Value, host: &mut H) -> bool {
        let Some(frame) = self.frame else {
            return false;
        };
        if !self.allow_list.allows(origin) {
            log::warn!("ignored embed message from untrusted origin '{}'", origin);
            return false;
        }

        match InboundMessage::parse(data) {
            Some(InboundMessage::Resize { height }) => {
                host.set_height(frame, Length::Px(height));
                true
            }
            Some(InboundMessage::Notification { message }) => {
                host.show_notification(&message, NOTIFICATION_DISMISS);
                true
            }
            Some(InboundMessage::Close) | None => false,
        }
    }

    pub fn destroy<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(listener) = self.listener.take() {
            host.unlisten(listener);
        }
        if let Some(frame) = self.frame.take() {
            host.remove_node(frame);
        }
    }
}

/// The single page-wide chat widget
#[derive(Debug, Default)]
pub struct GlobalWidget {
    current: Option<EmbedWidget>,
}

impl GlobalWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy any previous widget, then mount a new one in its place
    pub fn install<H: EmbedHost + ?Sized>(
        &mut self,
        config: WidgetConfig,
        api_url: &str,
        host: &mut H,
    ) -> Result<&mut EmbedWidget, EmbedError> {
        self.teardown(host);
        let widget = EmbedWidget::mount(config, api_url, host)?;
        Ok(self.current.insert(widget))
    }

    pub fn current(&self) -> Option<&EmbedWidget> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut EmbedWidget> {
        self.current.as_mut()
    }

    pub fn teardown<H: EmbedHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(mut previous) = self.current.take() {
            previous.destroy(host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::config::Theme;
    use crate::embed::host::VirtualDocument;
    use serde_json::json;

    const API: &str = "https://api.modstack.ai";
    const SITE: &str = "https://site.example";

    fn mounted() -> (EmbedWidget, VirtualDocument) {
        let mut doc = VirtualDocument::new(SITE);
        let widget = EmbedWidget::mount(WidgetConfig::new("bot-1"), API, &mut doc).unwrap();
        (widget, doc)
    }

    fn container(doc: &VirtualDocument) -> NodeId {
        doc.nodes_with_role(NodeRole::Container)[0]
    }

    fn posted_types(doc: &VirtualDocument) -> Vec<String> {
        doc.posted_messages()
            .iter()
            .map(|m| m.message["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_mount_creates_nodes_and_listeners() {
        let (widget, doc) = mounted();

        assert_eq!(doc.node_count(), 5);
        assert_eq!(doc.listener_count(), 4);
        assert_eq!(widget.state(), WidgetState::Closed);
        assert!(!doc.node(container(&doc)).unwrap().spec.visible);
        assert_eq!(
            widget.iframe_url().as_str(),
            "https://api.modstack.ai/embed/chat?modbot_id=bot-1&theme=light&embedded=true&origin=https%3A%2F%2Fsite.example"
        );

        let header = doc.nodes_with_role(NodeRole::Header)[0];
        assert_eq!(doc.node(header).unwrap().spec.text.as_deref(), Some("Chat Support"));
    }

    #[test]
    fn test_mount_with_empty_id_creates_nothing() {
        let mut doc = VirtualDocument::new(SITE);
        let err = EmbedWidget::mount(WidgetConfig::new(""), API, &mut doc).unwrap_err();

        assert_eq!(err.to_string(), "Modbot ID is required");
        assert_eq!(doc.node_count(), 0);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_mount_with_bad_api_url_creates_nothing() {
        let mut doc = VirtualDocument::new(SITE);
        let err = EmbedWidget::mount(WidgetConfig::new("bot-1"), "not a url", &mut doc).unwrap_err();

        assert!(matches!(err, EmbedError::InvalidApiUrl { .. }));
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_toggle_sends_one_message_per_transition() {
        let (mut widget, mut doc) = mounted();
        let toggle = doc.nodes_with_role(NodeRole::ToggleButton)[0];

        assert!(widget.handle_event(&HostEvent::Click(toggle), &mut doc));
        assert!(widget.is_open());
        assert!(doc.node(container(&doc)).unwrap().spec.visible);

        // already open: no duplicate
        widget.open(&mut doc);
        assert_eq!(posted_types(&doc), vec!["widget_opened"]);

        widget.handle_event(&HostEvent::Click(toggle), &mut doc);
        assert!(!widget.is_open());
        assert_eq!(posted_types(&doc), vec!["widget_opened", "widget_closed"]);

        for message in doc.posted_messages() {
            assert_eq!(message.target_origin, API);
            assert_ne!(message.target_origin, "*");
        }
    }

    #[test]
    fn test_close_button_and_escape() {
        let (mut widget, mut doc) = mounted();
        let close_button = doc.nodes_with_role(NodeRole::CloseButton)[0];

        // escape while closed does nothing
        assert!(!widget.handle_event(&HostEvent::KeyDown("Escape".into()), &mut doc));
        assert!(doc.posted_messages().is_empty());

        widget.open(&mut doc);
        assert!(!widget.handle_event(&HostEvent::KeyDown("Enter".into()), &mut doc));
        assert!(widget.handle_event(&HostEvent::KeyDown("Escape".into()), &mut doc));
        assert_eq!(widget.state(), WidgetState::Closed);

        widget.open(&mut doc);
        assert!(widget.handle_event(&HostEvent::Click(close_button), &mut doc));
        assert_eq!(widget.state(), WidgetState::Closed);
        assert_eq!(
            posted_types(&doc),
            vec!["widget_opened", "widget_closed", "widget_opened", "widget_closed"]
        );
    }

    #[test]
    fn test_resize_nested_and_flat() {
        let (mut widget, mut doc) = mounted();

        assert!(widget.on_message(API, &json!({"type": "resize", "payload": {"height": 650}}), &mut doc));
        assert_eq!(doc.node(container(&doc)).unwrap().spec.height, Some(Length::Px(650)));

        assert!(widget.on_message(API, &json!({"type": "resize", "height": 480}), &mut doc));
        assert_eq!(doc.node(container(&doc)).unwrap().spec.height, Some(Length::Px(480)));
    }

    #[test]
    fn test_messages_from_other_origins_are_ignored() {
        let (mut widget, mut doc) = mounted();
        widget.open(&mut doc);

        let event = HostEvent::Message {
            origin: "https://evil.example".to_string(),
            data: json!({"type": "close"}),
        };
        assert!(!widget.handle_event(&event, &mut doc));
        assert!(widget.is_open());

        assert!(!widget.on_message(SITE, &json!({"type": "resize", "height": 10}), &mut doc));
        assert_eq!(doc.node(container(&doc)).unwrap().spec.height, Some(Length::Px(600)));
    }

    #[test]
    fn test_inbound_close_and_notification() {
        let (mut widget, mut doc) = mounted();
        widget.open(&mut doc);

        let event = HostEvent::Message {
            origin: API.to_string(),
            data: json!({"type": "close"}),
        };
        assert!(widget.handle_event(&event, &mut doc));
        assert!(!widget.is_open());

        assert!(widget.on_message(
            API,
            &json!({"type": "notification", "payload": {"message": "Ticket created"}}),
            &mut doc
        ));
        assert_eq!(doc.toasts().len(), 1);
        assert_eq!(doc.toasts()[0].text, "Ticket created");
        assert_eq!(doc.toasts()[0].dismiss_after, Duration::from_secs(3));

        assert!(!widget.on_message(API, &json!({"type": "dance"}), &mut doc));
    }

    #[test]
    fn test_destroy_is_complete_and_idempotent() {
        let (mut widget, mut doc) = mounted();
        let gate = widget.request_gate();
        let ticket = gate.issue();
        widget.open(&mut doc);

        widget.destroy(&mut doc);
        assert_eq!(doc.node_count(), 0);
        assert_eq!(doc.listener_count(), 0);
        assert!(widget.is_destroyed());
        assert!(!gate.is_current(&ticket));
        assert_eq!(widget.frame(), Err(EmbedError::Destroyed));

        widget.destroy(&mut doc);
        assert_eq!(doc.node_count(), 0);

        // late events after teardown are no-ops
        let posted = doc.posted_messages().len();
        widget.open(&mut doc);
        assert!(!widget.on_message(API, &json!({"type": "close"}), &mut doc));
        assert_eq!(doc.posted_messages().len(), posted);
    }

    #[test]
    fn test_inline_form_embed() {
        let mut doc = VirtualDocument::new(SITE);
        let config = WidgetConfig::for_kind(EmbedKind::InlineTicketForm, "form-9").with_theme(Theme::Dark);
        let mut embed = InlineEmbed::mount(InlineKind::TicketForm, config, API, &mut doc, None).unwrap();

        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.listener_count(), 1);
        assert_eq!(embed.iframe_url().path(), "/embed/form");
        assert!(embed.iframe_url().as_str().contains("form_id=form-9"));

        let frame = embed.frame().unwrap();
        assert_eq!(doc.node(frame).unwrap().spec.height, Some(Length::Px(400)));

        assert!(embed.on_message(API, &json!({"type": "resize", "height": 720}), &mut doc));
        assert_eq!(doc.node(frame).unwrap().spec.height, Some(Length::Px(720)));
        assert!(!embed.on_message(API, &json!({"type": "close"}), &mut doc));
        assert!(!embed.on_message("https://evil.example", &json!({"type": "resize", "height": 1}), &mut doc));

        embed.destroy(&mut doc);
        embed.destroy(&mut doc);
        assert_eq!(doc.node_count(), 0);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_inline_with_empty_id_creates_nothing() {
        let mut doc = VirtualDocument::new(SITE);
        let config = WidgetConfig::for_kind(EmbedKind::InlineTicketForm, " ");
        let err = InlineEmbed::mount(InlineKind::TicketForm, config, API, &mut doc, None).unwrap_err();

        assert_eq!(err.to_string(), "Form ID is required");
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_global_widget_replaces_previous() {
        let mut doc = VirtualDocument::new(SITE);
        let mut global = GlobalWidget::new();

        global.install(WidgetConfig::new("bot-1"), API, &mut doc).unwrap();
        let widget = global.install(WidgetConfig::new("bot-2"), API, &mut doc).unwrap();
        assert_eq!(widget.config().resource_id, "bot-2");

        assert_eq!(doc.nodes_with_role(NodeRole::ToggleButton).len(), 1);
        assert_eq!(doc.node_count(), 5);
        assert_eq!(doc.listener_count(), 4);

        if let Some(widget) = global.current_mut() {
            widget.open(&mut doc);
        }
        assert!(global.current().is_some_and(|w| w.is_open()));

        global.teardown(&mut doc);
        assert!(global.current().is_none());
        assert_eq!(doc.node_count(), 0);
    }
}
