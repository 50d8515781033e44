use crate::core::paths::ResolvedPathPrefix;
use crate::core::structs::SpawnRequest;

/// Ordered `key: "value"` pairs of a `SpawnUrdfRobot` request. Fields are
/// only recorded when they carry something, `serialize` renders them once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnMessage {
    fields: Vec<(&'static str, String)>,
}

impl SpawnMessage {
    pub fn new() -> Self {
        SpawnMessage { fields: vec![] }
    }

    /// Builds the message for `request`, with `relative_path_prefix` already
    /// reconciled with the Webots side.
    pub fn from_request(request: &SpawnRequest, relative_path_prefix: &ResolvedPathPrefix) -> Self {
        let mut message = SpawnMessage::new();
        message.push_opt("name", request.name.as_deref());

        if is_set(request.urdf_path.as_deref()) {
            message.push_opt("urdf_path", request.urdf_path.as_deref());
        } else {
            message.push_opt("robot_description", request.robot_description.as_deref());
            message.push_opt("relative_path_prefix", relative_path_prefix.as_deref());
        }

        message.push_opt("translation", Some(request.translation.as_str()));
        message.push_opt("rotation", Some(request.rotation.as_str()));
        message.push_flag("normal", request.normal);
        message.push_flag("box_collision", request.box_collision);
        message.push_opt("init_pos", request.init_pos.as_deref());
        message
    }

    pub fn push_opt(&mut self, key: &'static str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.fields.push((key, value.to_string()));
        }
    }

    pub fn push_flag(&mut self, key: &'static str, value: bool) {
        if value {
            self.fields.push((key, "True".to_string()));
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(key, _)| *key).collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{robot: {name: "r1", rotation: "0 0 1 0"}}`, the YAML form
    /// `ros2 service call` expects for the request.
    pub fn serialize(&self) -> String {
        let body = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}: {}", key, quote(value)))
            .collect::<Vec<String>>()
            .join(", ");
        format!("{{robot: {{{}}}}}", body)
    }
}

impl std::fmt::Display for SpawnMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.serialize())
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.map_or(false, |v| !v.is_empty())
}

/// YAML double-quoted scalar. URDF content is full of quotes and newlines.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_only() -> SpawnRequest {
        SpawnRequest {
            name: Some("robot1".to_string()),
            translation: String::new(),
            rotation: String::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_only_request() {
        let message = SpawnMessage::from_request(&name_only(), &None);
        assert_eq!(message.keys(), vec!["name"]);
        assert_eq!(message.serialize(), r#"{robot: {name: "robot1"}}"#);
    }

    #[test]
    fn test_defaults_are_emitted() {
        let request = SpawnRequest {
            name: Some("robot1".to_string()),
            translation: "1 0 0".to_string(),
            ..Default::default()
        };
        let message = SpawnMessage::from_request(&request, &None);
        assert_eq!(
            message.serialize(),
            r#"{robot: {name: "robot1", translation: "1 0 0", rotation: "0 0 1 0"}}"#
        );
    }

    #[test]
    fn test_urdf_path_suppresses_description() {
        let request = SpawnRequest {
            name: Some("tesla".to_string()),
            urdf_path: Some("/opt/tesla.urdf".to_string()),
            robot_description: Some("<robot/>".to_string()),
            relative_path_prefix: Some("/opt/tesla".to_string()),
            ..Default::default()
        };
        let message = SpawnMessage::from_request(&request, &Some("C:/shared/tesla".to_string()));

        assert_eq!(
            message.keys(),
            vec!["name", "urdf_path", "translation", "rotation"]
        );
        let serialized = message.serialize();
        assert!(!serialized.contains("robot_description"));
        assert!(!serialized.contains("relative_path_prefix"));
    }

    #[test]
    fn test_description_with_prefix() {
        let request = SpawnRequest {
            robot_description: Some("<robot name=\"tesla\">\n</robot>".to_string()),
            ..Default::default()
        };
        let message =
            SpawnMessage::from_request(&request, &Some("/home/host/shared/tesla".to_string()));

        assert_eq!(
            message.keys(),
            vec!["robot_description", "relative_path_prefix", "translation", "rotation"]
        );
        assert_eq!(
            message.serialize(),
            r#"{robot: {robot_description: "<robot name=\"tesla\">\n</robot>", relative_path_prefix: "/home/host/shared/tesla", translation: "0 0 0", rotation: "0 0 1 0"}}"#
        );
    }

    #[test]
    fn test_prefix_without_content_is_emitted() {
        let message = SpawnMessage::from_request(
            &SpawnRequest::default(),
            &Some("/opt/tesla".to_string()),
        );
        assert_eq!(message.get("relative_path_prefix"), Some("/opt/tesla"));
    }

    #[test]
    fn test_quotes_stay_inside_one_literal() {
        let quoted = quote(r#"<mesh filename="it's.stl"/>"#);
        assert_eq!(quoted, r#""<mesh filename=\"it's.stl\"/>""#);

        // Only the outer quotes are unescaped.
        let inner = &quoted[1..quoted.len() - 1];
        let mut escaped = false;
        for c in inner.chars() {
            assert!(escaped || c != '"');
            escaped = !escaped && c == '\\';
        }
    }

    #[test]
    fn test_flags_and_init_pos() {
        let request = SpawnRequest {
            name: Some("tesla".to_string()),
            normal: true,
            box_collision: true,
            init_pos: Some("[[0.0, 1.0], [2.0]]".to_string()),
            ..Default::default()
        };
        let message = SpawnMessage::from_request(&request, &None);

        assert_eq!(
            message.keys(),
            vec!["name", "translation", "rotation", "normal", "box_collision", "init_pos"]
        );
        assert_eq!(message.get("normal"), Some("True"));
        assert_eq!(message.get("box_collision"), Some("True"));
        assert_eq!(message.get("init_pos"), Some("[[0.0, 1.0], [2.0]]"));
    }

    #[test]
    fn test_values_are_not_validated() {
        let request = SpawnRequest {
            translation: "1 2".to_string(),
            rotation: "nope".to_string(),
            ..Default::default()
        };
        let message = SpawnMessage::from_request(&request, &None);
        assert_eq!(message.serialize(), r#"{robot: {translation: "1 2", rotation: "nope"}}"#);
    }

    #[test]
    fn test_empty_message() {
        let message = SpawnMessage::new();
        assert!(message.is_empty());
        assert_eq!(message.to_string(), "{robot: {}}");
    }
}
