//! Outbound commands for the desktop automation helper.
//!
//! Commands are constructed by the inference core and serialized only at the
//! actuator boundary, as tagged JSON objects like
//! `{"type":"switch_desktop","direction":"left"}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskViewAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeDirection {
    Up,
    Down,
}

/// One discrete action for the automation helper. Immutable; constructed,
/// handed to the dispatcher, never retained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Move { x: f64, y: f64 },
    Click { button: MouseButton },
    Drag { state: DragPhase },
    SwitchDesktop { direction: SwipeDirection },
    TaskView { action: TaskViewAction },
    Volume { direction: VolumeDirection },
}

impl Command {
    /// Pointer moves fire every frame; logging them individually would
    /// drown the activity feed.
    pub fn is_move(&self) -> bool {
        matches!(self, Command::Move { .. })
    }

    /// Short human-readable description for the activity feed.
    pub fn describe(&self) -> String {
        match self {
            Command::Move { x, y } => format!("move to ({x:.3}, {y:.3})"),
            Command::Click { button } => format!("click {:?}", button).to_lowercase(),
            Command::Drag { state: DragPhase::Start } => "drag started".to_string(),
            Command::Drag { state: DragPhase::End } => "drag ended".to_string(),
            Command::SwitchDesktop { direction } => {
                format!("switch desktop {:?}", direction).to_lowercase()
            }
            Command::TaskView { action: TaskViewAction::Open } => "task view opened".to_string(),
            Command::TaskView { action: TaskViewAction::Close } => "task view closed".to_string(),
            Command::Volume { direction: VolumeDirection::Up } => "volume up".to_string(),
            Command::Volume { direction: VolumeDirection::Down } => "volume down".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_wire_shape() {
        let json = serde_json::to_value(Command::Move { x: 0.25, y: 0.75 }).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["x"], 0.25);
        assert_eq!(json["y"], 0.75);
    }

    #[test]
    fn test_click_wire_shape() {
        let json = serde_json::to_value(Command::Click { button: MouseButton::Left }).unwrap();
        assert_eq!(json["type"], "click");
        assert_eq!(json["button"], "left");
    }

    #[test]
    fn test_drag_wire_shape() {
        let json = serde_json::to_value(Command::Drag { state: DragPhase::Start }).unwrap();
        assert_eq!(json["type"], "drag");
        assert_eq!(json["state"], "start");
    }

    #[test]
    fn test_switch_desktop_wire_shape() {
        let json = serde_json::to_value(Command::SwitchDesktop {
            direction: SwipeDirection::Right,
        })
        .unwrap();
        assert_eq!(json["type"], "switch_desktop");
        assert_eq!(json["direction"], "right");
    }

    #[test]
    fn test_task_view_and_volume_wire_shapes() {
        let json = serde_json::to_value(Command::TaskView { action: TaskViewAction::Open }).unwrap();
        assert_eq!(json["type"], "task_view");
        assert_eq!(json["action"], "open");

        let json = serde_json::to_value(Command::Volume {
            direction: VolumeDirection::Down,
        })
        .unwrap();
        assert_eq!(json["type"], "volume");
        assert_eq!(json["direction"], "down");
    }

    #[test]
    fn test_only_moves_skip_logging() {
        assert!(Command::Move { x: 0.0, y: 0.0 }.is_move());
        assert!(!Command::Click { button: MouseButton::Left }.is_move());
    }
}
