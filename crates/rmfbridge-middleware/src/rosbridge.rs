//! `rosbridge_server` WebSocket client.
//!
//! [`RosbridgeClient`] is the bridge's only contact with the ROS graph. It
//! speaks the rosbridge v2 JSON protocol over a single WebSocket:
//!
//! 1. **Inbound** – `subscribe` ops for the odometry and battery topics.
//!    Every `publish` frame that comes back is decoded into a
//!    [`nav_msgs::Odometry`][Odometry] or
//!    [`sensor_msgs::BatteryState`][BatteryState] and pushed onto the
//!    [`EventBus`].
//!
//! 2. **Outbound** – an `advertise` op for the robot-state topic, then one
//!    `publish` frame per [`RobotState`] event seen on
//!    [`Topic::RobotState`].
//!
//! The client holds no state beyond the socket and never reconnects.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use rmfbridge_types::{BatteryState, BridgeError, Event, EventPayload, Odometry, RobotState};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::bus::{EventBus, Topic};

/// ROS type name of the odometry stream.
pub const ODOMETRY_TYPE: &str = "nav_msgs/msg/Odometry";
/// ROS type name of the battery stream.
pub const BATTERY_STATE_TYPE: &str = "sensor_msgs/msg/BatteryState";
/// ROS type name of the status stream.
pub const ROBOT_STATE_TYPE: &str = "rmf_fleet_msgs/msg/RobotState";

const ODOM_SOURCE: &str = "rmfbridge-middleware::rosbridge/odom";
const BATTERY_SOURCE: &str = "rmfbridge-middleware::rosbridge/battery_state";

/// Where to connect and which topics to bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct RosbridgeConfig {
    /// `ws://host:port` of the `rosbridge_server` endpoint.
    pub url: String,
    pub odom_topic: String,
    pub battery_topic: String,
    pub robot_state_topic: String,
    /// Depth requested for each inbound subscription.
    pub queue_length: u32,
}

impl Default for RosbridgeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:9090".to_string(),
            odom_topic: "/base_controller/odom".to_string(),
            battery_topic: "/battery_state".to_string(),
            robot_state_topic: "/robot_state".to_string(),
            queue_length: 10,
        }
    }
}

/// The subset of a rosbridge frame the client routes on.
#[derive(Debug, Deserialize)]
struct IncomingFrame {
    op: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    msg: Value,
}

/// WebSocket client bridging ROS topics to the internal [`EventBus`].
#[derive(Clone)]
pub struct RosbridgeClient {
    bus: Arc<EventBus>,
    config: RosbridgeConfig,
}

impl RosbridgeClient {
    /// Create a client backed by `bus`.
    pub fn new(bus: Arc<EventBus>, config: RosbridgeConfig) -> Self {
        Self { bus, config }
    }

    pub fn config(&self) -> &RosbridgeConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Frame builders
    // -----------------------------------------------------------------------

    /// `subscribe` op for `topic`.
    pub fn build_subscribe_frame(topic: &str, msg_type: &str, queue_length: u32) -> String {
        json!({
            "op": "subscribe",
            "topic": topic,
            "type": msg_type,
            "queue_length": queue_length
        })
        .to_string()
    }

    /// `advertise` op announcing that this client publishes on `topic`.
    pub fn build_advertise_frame(topic: &str, msg_type: &str) -> String {
        json!({
            "op": "advertise",
            "topic": topic,
            "type": msg_type
        })
        .to_string()
    }

    /// `unadvertise` op withdrawing a previous advertisement.
    pub fn build_unadvertise_frame(topic: &str) -> String {
        json!({
            "op": "unadvertise",
            "topic": topic
        })
        .to_string()
    }

    /// `publish` op carrying one [`RobotState`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] if the state cannot be encoded.
    pub fn build_publish_frame(topic: &str, state: &RobotState) -> Result<String, BridgeError> {
        let msg = serde_json::to_value(state)
            .map_err(|e| BridgeError::Serialization(e.to_string()))?;
        Ok(json!({
            "op": "publish",
            "topic": topic,
            "msg": msg
        })
        .to_string())
    }

    /// The frames sent right after the handshake, in order.
    pub fn handshake_frames(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            Self::build_subscribe_frame(&c.odom_topic, ODOMETRY_TYPE, c.queue_length),
            Self::build_subscribe_frame(&c.battery_topic, BATTERY_STATE_TYPE, c.queue_length),
            Self::build_advertise_frame(&c.robot_state_topic, ROBOT_STATE_TYPE),
        ]
    }

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    /// Publish an odometry sample onto [`Topic::Odometry`].
    pub fn ingest_odometry(&self, odom: Odometry) -> Result<usize, BridgeError> {
        self.bus
            .publish_to(Topic::Odometry, Event::new(ODOM_SOURCE, EventPayload::Odometry(odom)))
    }

    /// Publish a battery sample onto [`Topic::Battery`].
    pub fn ingest_battery(&self, battery: BatteryState) -> Result<usize, BridgeError> {
        self.bus
            .publish_to(Topic::Battery, Event::new(BATTERY_SOURCE, EventPayload::Battery(battery)))
    }

    /// Route one text frame received from `rosbridge_server`.
    ///
    /// Returns the bus topic the frame was delivered to. Frames that are not
    /// `publish` ops, name an unbridged topic, or fail to decode are dropped
    /// and yield `None`.
    pub fn handle_incoming_frame(&self, text: &str) -> Option<Topic> {
        let frame: IncomingFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "ignoring undecodable rosbridge frame");
                return None;
            }
        };

        if frame.op != "publish" {
            debug!(op = %frame.op, "ignoring non-publish rosbridge op");
            return None;
        }

        let delivered = if frame.topic == self.config.odom_topic {
            serde_json::from_value::<Odometry>(frame.msg)
                .map_err(|e| BridgeError::Serialization(e.to_string()))
                .and_then(|odom| self.ingest_odometry(odom))
                .map(|_| Topic::Odometry)
        } else if frame.topic == self.config.battery_topic {
            serde_json::from_value::<BatteryState>(frame.msg)
                .map_err(|e| BridgeError::Serialization(e.to_string()))
                .and_then(|battery| self.ingest_battery(battery))
                .map(|_| Topic::Battery)
        } else {
            debug!(topic = %frame.topic, "ignoring frame on unbridged topic");
            return None;
        };

        match delivered {
            Ok(topic) => Some(topic),
            Err(e) => {
                debug!(topic = %frame.topic, error = %e, "rosbridge frame not delivered");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Connection loop
    // -----------------------------------------------------------------------

    /// Connect to `rosbridge_server` and pump frames until shutdown.
    ///
    /// Returns `Ok(())` when `shutdown` flips to `true` or the server closes
    /// the socket.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the connection or the initial
    /// subscribe/advertise exchange fails.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), BridgeError> {
        let url = self.config.url.clone();
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| BridgeError::Transport(format!("connect to {url}: {e}")))?;
        info!(url = %url, "connected to rosbridge");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        for frame in self.handshake_frames() {
            ws_tx
                .send(Message::Text(frame.into()))
                .await
                .map_err(|e| BridgeError::Transport(format!("handshake with {url}: {e}")))?;
        }

        let mut states = self.bus.subscribe_to(Topic::RobotState);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                result = states.recv() => {
                    match result {
                        Ok(Event { payload: EventPayload::RobotState(state), .. }) => {
                            let frame = Self::build_publish_frame(&self.config.robot_state_topic, &state)?;
                            if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                                warn!(error = %e, "rosbridge send failed");
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(lagged_by = n, "robot state forwarder lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_incoming_frame(text.as_str());
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(url = %url, "rosbridge closed the connection");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "rosbridge receive failed");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }

        // Best effort: the socket may already be gone.
        let _ = ws_tx
            .send(Message::Text(
                Self::build_unadvertise_frame(&self.config.robot_state_topic).into(),
            ))
            .await;
        let _ = ws_tx.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::{WebSocketStream, accept_async};

    fn make_client() -> (Arc<EventBus>, RosbridgeClient) {
        let bus = Arc::new(EventBus::default());
        let client = RosbridgeClient::new(Arc::clone(&bus), RosbridgeConfig::default());
        (bus, client)
    }

    #[test]
    fn handshake_subscribes_then_advertises() -> Result<(), Box<dyn std::error::Error>> {
        let (_bus, client) = make_client();
        let frames = client.handshake_frames();
        assert_eq!(frames.len(), 3);

        let odom: Value = serde_json::from_str(&frames[0])?;
        assert_eq!(odom["op"], "subscribe");
        assert_eq!(odom["topic"], "/base_controller/odom");
        assert_eq!(odom["type"], ODOMETRY_TYPE);
        assert_eq!(odom["queue_length"], 10);

        let battery: Value = serde_json::from_str(&frames[1])?;
        assert_eq!(battery["topic"], "/battery_state");
        assert_eq!(battery["type"], BATTERY_STATE_TYPE);

        let advertise: Value = serde_json::from_str(&frames[2])?;
        assert_eq!(advertise["op"], "advertise");
        assert_eq!(advertise["topic"], "/robot_state");
        assert_eq!(advertise["type"], ROBOT_STATE_TYPE);
        Ok(())
    }

    #[test]
    fn publish_frame_wraps_robot_state() -> Result<(), Box<dyn std::error::Error>> {
        let state = RobotState {
            name: "minibot_1".to_string(),
            seq: 11,
            battery_percent: 55.0,
            ..RobotState::default()
        };
        let frame: Value =
            serde_json::from_str(&RosbridgeClient::build_publish_frame("/robot_state", &state)?)?;
        assert_eq!(frame["op"], "publish");
        assert_eq!(frame["topic"], "/robot_state");
        assert_eq!(frame["msg"]["name"], "minibot_1");
        assert_eq!(frame["msg"]["seq"], 11);
        assert_eq!(frame["msg"]["battery_percent"], 55.0);
        Ok(())
    }

    #[test]
    fn unadvertise_frame_names_topic() {
        let frame = RosbridgeClient::build_unadvertise_frame("/robot_state");
        assert!(frame.contains("unadvertise"));
        assert!(frame.contains("/robot_state"));
    }

    #[tokio::test]
    async fn odom_publish_frame_lands_on_odometry_topic() -> Result<(), Box<dyn std::error::Error>> {
        let (bus, client) = make_client();
        let mut rx = bus.subscribe_to(Topic::Odometry);

        let frame = r#"{"op":"publish","topic":"/base_controller/odom","msg":{
            "pose":{"pose":{"position":{"x":3.0,"y":4.0,"z":0.0},
                            "orientation":{"x":0.0,"y":0.0,"z":0.0,"w":1.0}}},
            "twist":{"twist":{"linear":{"x":0.5,"y":0.0,"z":0.0},
                              "angular":{"x":0.0,"y":0.0,"z":0.0}}}}}"#;
        assert_eq!(client.handle_incoming_frame(frame), Some(Topic::Odometry));

        let event = rx.recv().await?;
        assert_eq!(event.source, ODOM_SOURCE);
        match event.payload {
            EventPayload::Odometry(odom) => {
                assert_eq!(odom.pose.pose.position.x, 3.0);
                assert_eq!(odom.twist.twist.linear.x, 0.5);
            }
            other => panic!("expected Odometry, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn battery_publish_frame_lands_on_battery_topic() -> Result<(), Box<dyn std::error::Error>> {
        let (bus, client) = make_client();
        let mut rx = bus.subscribe_to(Topic::Battery);

        let frame = r#"{"op":"publish","topic":"/battery_state","msg":{"percentage":0.42,"voltage":null}}"#;
        assert_eq!(client.handle_incoming_frame(frame), Some(Topic::Battery));

        match rx.recv().await?.payload {
            EventPayload::Battery(b) => assert!((b.percentage - 0.42).abs() < f32::EPSILON),
            other => panic!("expected Battery, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn null_cell_voltage_still_reaches_battery_topic() -> Result<(), Box<dyn std::error::Error>> {
        let (bus, client) = make_client();
        let mut rx = bus.subscribe_to(Topic::Battery);

        let frame = r#"{"op":"publish","topic":"/battery_state","msg":{"percentage":0.42,"voltage":null,"cell_voltage":[null,3.7]}}"#;
        assert_eq!(client.handle_incoming_frame(frame), Some(Topic::Battery));

        match rx.recv().await?.payload {
            EventPayload::Battery(b) => {
                assert!((b.percentage - 0.42).abs() < f32::EPSILON);
                assert!(b.cell_voltage[0].is_nan());
            }
            other => panic!("expected Battery, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn null_covariance_still_reaches_odometry_topic() {
        let (bus, client) = make_client();
        let _rx = bus.subscribe_to(Topic::Odometry);
        let frame = r#"{"op":"publish","topic":"/base_controller/odom","msg":{"pose":{"covariance":[null,0.0]}}}"#;
        assert_eq!(client.handle_incoming_frame(frame), Some(Topic::Odometry));
    }

    #[test]
    fn frames_on_other_topics_are_ignored() {
        let (bus, client) = make_client();
        let mut rx = bus.subscribe_to(Topic::Odometry);
        let frame = r#"{"op":"publish","topic":"/scan","msg":{}}"#;
        assert_eq!(client.handle_incoming_frame(frame), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_publish_ops_and_garbage_are_ignored() {
        let (bus, client) = make_client();
        let _rx = bus.subscribe_to(Topic::Odometry);
        assert_eq!(
            client.handle_incoming_frame(r#"{"op":"status","level":"error","msg":"oops"}"#),
            None
        );
        assert_eq!(client.handle_incoming_frame("not json"), None);
    }

    #[test]
    fn malformed_message_body_is_dropped() {
        let (bus, client) = make_client();
        let mut rx = bus.subscribe_to(Topic::Battery);
        let frame = r#"{"op":"publish","topic":"/battery_state","msg":{"percentage":"full"}}"#;
        assert_eq!(client.handle_incoming_frame(frame), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn custom_topic_names_are_honoured() {
        let bus = Arc::new(EventBus::default());
        let _rx = bus.subscribe_to(Topic::Battery);
        let client = RosbridgeClient::new(
            Arc::clone(&bus),
            RosbridgeConfig {
                battery_topic: "/power/battery".to_string(),
                ..RosbridgeConfig::default()
            },
        );
        let frame = r#"{"op":"publish","topic":"/power/battery","msg":{"percentage":1.0}}"#;
        assert_eq!(client.handle_incoming_frame(frame), Some(Topic::Battery));
        assert_eq!(client.config().battery_topic, "/power/battery");
    }

    #[tokio::test]
    async fn run_reports_transport_error_when_unreachable() {
        let bus = Arc::new(EventBus::default());
        let client = RosbridgeClient::new(
            bus,
            RosbridgeConfig {
                // Port 1 on loopback is never a rosbridge server.
                url: "ws://127.0.0.1:1".to_string(),
                ..RosbridgeConfig::default()
            },
        );
        let (_tx, rx) = watch::channel(false);
        let result = client.run(rx).await;
        assert!(matches!(result, Err(BridgeError::Transport(_))));
    }

    type ServerSocket = WebSocketStream<TcpStream>;

    /// Next text frame from the client, skipping control frames.
    async fn next_text(ws: &mut ServerSocket) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            match timeout(Duration::from_secs(5), ws.next()).await? {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(text.as_str())?),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err("client closed the socket".into()),
            }
        }
    }

    async fn loopback_client(
        bus: &Arc<EventBus>,
    ) -> Result<(TcpListener, RosbridgeClient), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let client = RosbridgeClient::new(
            Arc::clone(bus),
            RosbridgeConfig {
                url: format!("ws://{addr}"),
                ..RosbridgeConfig::default()
            },
        );
        Ok((listener, client))
    }

    #[tokio::test]
    async fn run_handshakes_forwards_state_and_unadvertises() -> Result<(), Box<dyn std::error::Error>> {
        let bus = Arc::new(EventBus::default());
        let mut odom_rx = bus.subscribe_to(Topic::Odometry);
        let (listener, client) = loopback_client(&bus).await?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let client_task = tokio::spawn(client.run(shutdown_rx));

        let (stream, _) = timeout(Duration::from_secs(5), listener.accept()).await??;
        let mut ws = accept_async(stream).await?;

        let mut handshake = Vec::new();
        for _ in 0..3 {
            let frame = next_text(&mut ws).await?;
            handshake.push((frame["op"].clone(), frame["topic"].clone()));
        }
        assert_eq!(
            handshake,
            [
                (json!("subscribe"), json!("/base_controller/odom")),
                (json!("subscribe"), json!("/battery_state")),
                (json!("advertise"), json!("/robot_state")),
            ]
        );

        // The forwarder subscribes right after the handshake; retry until it has.
        let state = RobotState {
            name: "minibot_1".to_string(),
            seq: 7,
            ..RobotState::default()
        };
        let event = Event::new("test", EventPayload::RobotState(state));
        timeout(Duration::from_secs(5), async {
            while bus.publish_to(Topic::RobotState, event.clone()).is_err() {
                tokio::task::yield_now().await;
            }
        })
        .await?;

        let publish = next_text(&mut ws).await?;
        assert_eq!(publish["op"], "publish");
        assert_eq!(publish["topic"], "/robot_state");
        assert_eq!(publish["msg"]["name"], "minibot_1");
        assert_eq!(publish["msg"]["seq"], 7);

        let inbound = r#"{"op":"publish","topic":"/base_controller/odom","msg":{"pose":{"pose":{"position":{"x":2.0,"y":0.0,"z":0.0}}}}}"#;
        ws.send(Message::Text(inbound.to_string().into())).await?;
        match timeout(Duration::from_secs(5), odom_rx.recv()).await??.payload {
            EventPayload::Odometry(odom) => assert_eq!(odom.pose.pose.position.x, 2.0),
            other => panic!("expected Odometry, got {other:?}"),
        }

        shutdown.send(true)?;
        let unadvertise = next_text(&mut ws).await?;
        assert_eq!(unadvertise["op"], "unadvertise");
        assert_eq!(unadvertise["topic"], "/robot_state");

        // Drain so the server answers the client's close frame.
        while let Ok(Some(Ok(_))) = timeout(Duration::from_secs(5), ws.next()).await {}

        timeout(Duration::from_secs(5), client_task).await???;
        Ok(())
    }

    #[tokio::test]
    async fn run_returns_ok_when_server_closes() -> Result<(), Box<dyn std::error::Error>> {
        let bus = Arc::new(EventBus::default());
        let (listener, client) = loopback_client(&bus).await?;
        let (_shutdown, shutdown_rx) = watch::channel(false);
        let client_task = tokio::spawn(client.run(shutdown_rx));

        let (stream, _) = timeout(Duration::from_secs(5), listener.accept()).await??;
        let mut ws = accept_async(stream).await?;
        for _ in 0..3 {
            next_text(&mut ws).await?;
        }
        ws.close(None).await?;

        timeout(Duration::from_secs(5), client_task).await???;
        Ok(())
    }
}
