use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A robot record as published by the fleet management API.
///
/// Only the fields the application reads are typed; everything else the
/// backend sends is carried through untouched in `extra` so an upsert never
/// loses attributes this component does not interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    pub id: String,
    pub model: RobotModel,
    pub current_installation: Installation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Robot classification. The type is nullable on the wire: some update
/// events are published with a partial payload that omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotModel {
    #[serde(rename = "type", default)]
    pub model_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The installation (site) a robot currently belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub installation_code: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal view of a robot payload. Delete events only need the id to be
/// valid; every other field is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RobotRef {
    pub id: String,
}

impl Robot {
    pub fn from_payload(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl RobotRef {
    pub fn from_payload(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn test_robot_from_payload() {
        let payload = r#"{
            "id": "r-1",
            "prettyName": "Inspector 1",
            "model": {"type": "TaurobInspector"},
            "currentInstallation": {"installationCode": "KAA"},
            "batteryLevel": 87.5,
            "status": "Available"
        }"#;

        let robot = Robot::from_payload(payload).unwrap();
        assert_eq!(robot.id, "r-1");
        assert_eq!(robot.pretty_name.as_deref(), Some("Inspector 1"));
        assert_eq!(robot.model.model_type.as_deref(), Some("TaurobInspector"));
        assert_eq!(robot.current_installation.installation_code, "KAA");
        assert_eq!(robot.battery_level, Some(87.5));
    }

    #[test]
    fn test_robot_null_model_type() {
        let payload = r#"{
            "id": "r-1",
            "model": {"type": null},
            "currentInstallation": {"installationCode": "KAA"}
        }"#;

        let robot = Robot::from_payload(payload).unwrap();
        assert!(robot.model.model_type.is_none());
    }

    #[test]
    fn test_robot_absent_model_type() {
        let payload = r#"{
            "id": "r-1",
            "model": {},
            "currentInstallation": {"installationCode": "KAA"}
        }"#;

        let robot = Robot::from_payload(payload).unwrap();
        assert!(robot.model.model_type.is_none());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let payload = r#"{
            "id": "r-1",
            "model": {"type": "ExR2"},
            "currentInstallation": {"installationCode": "JSV", "name": "Johan Sverdrup"},
            "pose": {"x": 1.0, "y": 2.0},
            "isarId": "abc-123"
        }"#;

        let robot = Robot::from_payload(payload).unwrap();
        assert!(robot.extra.contains_key("pose"));
        assert!(robot.extra.contains_key("isarId"));
        assert!(robot.current_installation.extra.contains_key("name"));

        // Round-trip keeps the opaque attributes
        let serialized = serde_json::to_string(&robot).unwrap();
        let reparsed = Robot::from_payload(&serialized).unwrap();
        assert_eq!(reparsed, robot);
    }

    #[test]
    fn test_robot_ref_only_needs_id() {
        let robot_ref = RobotRef::from_payload(r#"{"id": "r-9", "status": "Offline"}"#).unwrap();
        assert_eq!(robot_ref.id, "r-9");
    }

    #[test]
    fn test_malformed_payload() {
        let result = Robot::from_payload("{not json");
        assert!(matches!(result, Err(RegistryError::MalformedPayload(_))));
    }
}
