//! WebSocket message DTOs for the chat protocol.
//!
//! Every frame is a JSON object `{ "msgid": int, "msgtype": int, ...fields }`.
//! [`Envelope`] keeps the type-specific fields as an untyped map so frames
//! can be routed without knowing their schema; the typed payload structs
//! below are decoded on demand.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::domain::{GroupId, MsgId, MsgType, UserId};
use crate::infrastructure::error::ProtocolError;

/// Out-of-band keepalive frame. Never parsed as an envelope.
pub const HEARTBEAT_FRAME: &str = "ping";

const MSG_ID_KEY: &str = "msgid";
const MSG_TYPE_KEY: &str = "msgtype";

/// A typed, JSON-encoded message unit.
///
/// `msg_id` is optional because server acknowledgements do not echo it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub msg_id: Option<MsgId>,
    pub msg_type: MsgType,
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Create an envelope with an empty payload.
    pub fn new(msg_id: Option<MsgId>, msg_type: MsgType) -> Self {
        Self {
            msg_id,
            msg_type,
            payload: Map::new(),
        }
    }

    /// Create an envelope from a typed payload.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidPayload` if the payload does not
    /// serialize to a JSON object.
    pub fn from_payload<T: Serialize>(
        msg_id: Option<MsgId>,
        msg_type: MsgType,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let value = serde_json::to_value(payload).map_err(|e| ProtocolError::InvalidPayload {
            msg_type,
            reason: e.to_string(),
        })?;
        let Value::Object(mut payload) = value else {
            return Err(ProtocolError::InvalidPayload {
                msg_type,
                reason: "payload is not an object".to_string(),
            });
        };
        payload.remove(MSG_ID_KEY);
        payload.remove(MSG_TYPE_KEY);
        Ok(Self {
            msg_id,
            msg_type,
            payload,
        })
    }

    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns a `ProtocolError` when the frame is not a JSON object with a
    /// known integer `msgtype`.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build an envelope from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Envelope::parse`], minus the JSON syntax check.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut payload) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let raw_type = payload
            .get(MSG_TYPE_KEY)
            .and_then(Value::as_i64)
            .ok_or(ProtocolError::MissingMsgType)?;
        let msg_type =
            MsgType::try_from(raw_type).map_err(|_| ProtocolError::UnknownMsgType(raw_type))?;
        payload.remove(MSG_TYPE_KEY);

        // A non-integer msgid stays in the payload untouched.
        let msg_id = match payload.get(MSG_ID_KEY).and_then(Value::as_i64) {
            Some(id) => {
                payload.remove(MSG_ID_KEY);
                Some(MsgId::new(id))
            }
            None => None,
        };

        Ok(Self {
            msg_id,
            msg_type,
            payload,
        })
    }

    /// The envelope as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = self.payload.clone();
        if let Some(id) = self.msg_id {
            object.insert(MSG_ID_KEY.to_string(), Value::from(id.value()));
        }
        object.insert(MSG_TYPE_KEY.to_string(), Value::from(self.msg_type.as_i64()));
        Value::Object(object)
    }

    /// Serialize to a text frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidPayload` if a payload value cannot be
    /// encoded.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(&self.to_value()).map_err(|e| ProtocolError::InvalidPayload {
            msg_type: self.msg_type,
            reason: e.to_string(),
        })
    }

    /// Decode the payload into its typed form.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidPayload` if required fields are missing
    /// or have the wrong type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|e| {
            ProtocolError::InvalidPayload {
                msg_type: self.msg_type,
                reason: e.to_string(),
            }
        })
    }

    /// Look up a single payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// The `error` field of an acknowledgement, if present.
    pub fn error_code(&self) -> Option<i64> {
        self.field("error").and_then(Value::as_i64)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Envelope::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Server acknowledgement carrying an `error` code.
///
/// `0` means success; any other value is a server-reported failure whose
/// magnitude is not interpreted here.
pub trait Acknowledgement {
    fn error_code(&self) -> i64;

    fn is_success(&self) -> bool {
        self.error_code() == 0
    }
}

/// LOGIN_REQUEST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: UserId,
    pub password: String,
}

/// Friend entry of a login or add-friend acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInfo {
    pub userid: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "onlineStatus", default)]
    pub online_status: bool,
}

/// Group entry of a login or create-group acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub groupid: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// LOGIN_RESPONSE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub error: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub friends: Vec<FriendInfo>,
    #[serde(default)]
    pub groups: Vec<GroupInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offlinemessages: Vec<Value>,
}

impl LoginResponse {
    /// Messages queued by the server while the user was offline.
    ///
    /// Entries may be JSON objects or JSON-encoded strings. Entries that do
    /// not form a valid envelope are skipped.
    pub fn offline_envelopes(&self) -> Vec<Envelope> {
        self.offlinemessages
            .iter()
            .filter_map(|entry| {
                let parsed = match entry {
                    Value::String(text) => Envelope::parse(text),
                    other => Envelope::from_value(other.clone()),
                };
                match parsed {
                    Ok(envelope) => Some(envelope),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed offline message");
                        None
                    }
                }
            })
            .collect()
    }
}

impl Acknowledgement for LoginResponse {
    fn error_code(&self) -> i64 {
        self.error
    }
}

/// LOGOUT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub id: UserId,
}

/// REGISTER_REQUEST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: UserId,
    pub name: String,
    pub password: String,
}

/// REGISTER_RESPONSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub error: i64,
    /// Id assigned by the server, when it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
}

impl Acknowledgement for RegisterResponse {
    fn error_code(&self) -> i64 {
        self.error
    }
}

/// ONE_TO_ONE_CHAT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneToOneChat {
    pub fromid: UserId,
    pub toid: UserId,
    pub content: String,
}

/// GROUP_CHAT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChat {
    pub fromid: UserId,
    pub groupid: GroupId,
    pub content: String,
}

/// ADD_FRIEND_REQUEST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFriendRequest {
    pub userid: UserId,
    pub friendid: UserId,
}

/// ADD_FRIEND_RESPONSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFriendResponse {
    pub error: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend: Option<FriendInfo>,
}

impl Acknowledgement for AddFriendResponse {
    fn error_code(&self) -> i64 {
        self.error
    }
}

/// CREATE_GROUP_REQUEST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub userid: UserId,
    pub name: String,
    pub desc: String,
    pub useridlist: Vec<UserId>,
}

/// JOIN_GROUP_REQUEST (reserved, no acknowledgement defined)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGroupRequest {
    pub userid: UserId,
    pub groupid: GroupId,
}

/// CREATE_GROUP_RESPONSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupResponse {
    pub error: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupInfo>,
}

impl Acknowledgement for CreateGroupResponse {
    fn error_code(&self) -> i64 {
        self.error
    }
}
